//! 实例注册表
//!
//! 组件名称到单例实例的映射，每个容器独占一个注册表

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use ioc_common::{HookKind, HookMethod, Instance, LifecycleHook, TypeInfo};
use parking_lot::RwLock;
use std::any::TypeId;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// 注册表条目
pub struct RegistryEntry {
    name: String,
    type_info: TypeInfo,
    instance: Instance,
    post_construct: Vec<HookMethod>,
    activated: AtomicBool,
    registered_at: DateTime<Utc>,
}

impl RegistryEntry {
    /// 创建条目，`hooks` 中只保留 post-construct 方法
    pub fn new(name: impl Into<String>, type_info: TypeInfo, instance: Instance, hooks: &[HookMethod]) -> Self {
        Self {
            name: name.into(),
            type_info,
            instance,
            post_construct: hooks
                .iter()
                .filter(|hook| hook.kind == HookKind::PostConstruct)
                .cloned()
                .collect(),
            activated: AtomicBool::new(false),
            registered_at: Utc::now(),
        }
    }

    /// 组件名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 组件类型
    pub fn type_info(&self) -> &TypeInfo {
        &self.type_info
    }

    /// 组件实例
    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    /// 发布时间
    pub fn registered_at(&self) -> DateTime<Utc> {
        self.registered_at
    }

    /// post-construct 方法是否已执行过
    pub fn is_activated(&self) -> bool {
        self.activated.load(Ordering::Acquire)
    }

    /// 执行 post-construct 方法并标记为已激活
    ///
    /// `force` 为 `false` 时已激活的条目不会再次执行；返回是否执行了激活
    pub fn activate(&self, force: bool) -> bool {
        let already = self.activated.swap(true, Ordering::AcqRel);
        if already && !force {
            return false;
        }

        for method in &self.post_construct {
            LifecycleHook::new(self.name.clone(), method.clone(), Arc::clone(&self.instance)).invoke();
        }
        true
    }
}

impl fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryEntry")
            .field("name", &self.name)
            .field("type_info", &self.type_info)
            .field("post_construct", &self.post_construct.len())
            .field("activated", &self.is_activated())
            .field("registered_at", &self.registered_at)
            .finish()
    }
}

/// 实例注册表
#[derive(Default)]
pub struct InstanceRegistry {
    entries: DashMap<String, Arc<RegistryEntry>>,
    /// 按类型的索引，保持发布顺序
    by_type: DashMap<TypeId, Vec<String>>,
    order: RwLock<Vec<String>>,
}

impl InstanceRegistry {
    /// 创建空注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 是否已注册
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// 发布条目并返回已发布的条目；同名条目已存在时返回 `None`，原条目保持不变
    pub fn publish(&self, entry: RegistryEntry) -> Option<Arc<RegistryEntry>> {
        let entry = Arc::new(entry);
        match self.entries.entry(entry.name.clone()) {
            Entry::Occupied(_) => return None,
            Entry::Vacant(slot) => {
                slot.insert(Arc::clone(&entry));
            }
        }

        self.by_type
            .entry(entry.type_info.id)
            .or_default()
            .push(entry.name.clone());
        self.order.write().push(entry.name.clone());
        Some(entry)
    }

    /// 按名称查找
    pub fn get(&self, name: &str) -> Option<Arc<RegistryEntry>> {
        self.entries.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// 按类型查找
    ///
    /// 名称等于完整类型名的条目优先，否则取该类型第一个发布的条目
    pub fn find_by_type(&self, type_info: &TypeInfo) -> Option<Arc<RegistryEntry>> {
        if let Some(entry) = self.get(type_info.type_name) {
            if entry.type_info.id == type_info.id {
                return Some(entry);
            }
        }

        let first = self.by_type.get(&type_info.id)?.first().cloned()?;
        self.get(&first)
    }

    /// 按发布顺序列出名称
    pub fn names(&self) -> Vec<String> {
        self.order.read().clone()
    }

    /// 按发布顺序列出条目
    pub fn entries(&self) -> Vec<Arc<RegistryEntry>> {
        self.names().iter().filter_map(|name| self.get(name)).collect()
    }

    /// 条目数量
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for InstanceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceRegistry")
            .field("order", &*self.order.read())
            .finish()
    }
}
