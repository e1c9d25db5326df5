//! 组件发现机制
//!
//! 提供命名空间到组件描述符的解析，以及按依赖关系排序的依赖图

use crate::component::{ComponentDescriptor, Discoverable};
use crate::errors::{ComponentError, ComponentResult};
use crate::metadata::{is_valid_namespace, namespace_contains};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use tracing::debug;

/// 组件发现器 trait
///
/// 给定命名空间，返回其下（递归）所有可实例化的组件描述符，顺序稳定
pub trait TypeDiscovery: Send + Sync {
    /// 发现命名空间下的组件
    fn discover(&self, namespace: &str) -> ComponentResult<Vec<ComponentDescriptor>>;
}

/// 组件目录条目
///
/// 由 `#[component]` 宏在程序启动时提交
#[derive(Clone, Copy)]
pub struct CatalogEntry {
    /// 声明组件的模块路径
    pub module_path: &'static str,
    /// 源码中的类型名称
    pub type_name: &'static str,
    /// 声明所在行
    pub line: u32,
    /// 描述符工厂
    pub describe: fn() -> ComponentDescriptor,
}

impl CatalogEntry {
    /// 创建目录条目
    pub const fn new(
        module_path: &'static str,
        type_name: &'static str,
        line: u32,
        describe: fn() -> ComponentDescriptor,
    ) -> Self {
        Self {
            module_path,
            type_name,
            line,
            describe,
        }
    }

    /// 为可发现类型创建目录条目
    pub fn of<T: Discoverable>(module_path: &'static str, type_name: &'static str, line: u32) -> Self {
        Self::new(module_path, type_name, line, T::component_descriptor)
    }
}

impl fmt::Debug for CatalogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogEntry")
            .field("module_path", &self.module_path)
            .field("type_name", &self.type_name)
            .field("line", &self.line)
            .finish()
    }
}

/// 全局组件目录
static COMPONENT_CATALOG: Lazy<RwLock<Vec<CatalogEntry>>> = Lazy::new(|| RwLock::new(Vec::new()));

/// 提交组件目录条目
pub fn submit_component(entry: CatalogEntry) {
    COMPONENT_CATALOG.write().push(entry);
}

/// 获取全部目录条目，按（模块路径，行号）排序
pub fn catalog_entries() -> Vec<CatalogEntry> {
    let mut entries = COMPONENT_CATALOG.read().clone();
    entries.sort_by(|a, b| (a.module_path, a.line).cmp(&(b.module_path, b.line)));
    entries
}

fn validate_namespace(namespace: &str) -> ComponentResult<()> {
    if is_valid_namespace(namespace) {
        Ok(())
    } else {
        Err(ComponentError::scan_error(namespace, "命名空间格式无效"))
    }
}

/// 过滤不可实例化的描述符
fn instantiable_only(namespace: &str, descriptors: Vec<ComponentDescriptor>) -> Vec<ComponentDescriptor> {
    descriptors
        .into_iter()
        .filter(|descriptor| {
            if !descriptor.instantiable {
                debug!("跳过不可实例化的类型: {} (命名空间: {})", descriptor.name, namespace);
            }
            descriptor.instantiable
        })
        .collect()
}

/// 基于全局组件目录的发现器
#[derive(Debug, Clone, Copy, Default)]
pub struct CatalogDiscovery;

impl CatalogDiscovery {
    /// 创建目录发现器
    pub fn new() -> Self {
        Self
    }
}

impl TypeDiscovery for CatalogDiscovery {
    fn discover(&self, namespace: &str) -> ComponentResult<Vec<ComponentDescriptor>> {
        validate_namespace(namespace)?;

        let descriptors: Vec<ComponentDescriptor> = catalog_entries()
            .into_iter()
            .filter(|entry| namespace_contains(namespace, entry.module_path))
            .map(|entry| (entry.describe)())
            .collect();

        if descriptors.is_empty() {
            return Err(ComponentError::scan_error(namespace, "命名空间下没有已登记的组件"));
        }

        debug!("组件目录在 {} 下发现 {} 个类型", namespace, descriptors.len());
        Ok(instantiable_only(namespace, descriptors))
    }
}

/// 显式描述符表
///
/// 在组装阶段按命名空间登记描述符，保持登记顺序
#[derive(Debug, Clone, Default)]
pub struct DescriptorTable {
    entries: Vec<(String, ComponentDescriptor)>,
}

impl DescriptorTable {
    /// 创建空表
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记描述符
    pub fn insert(&mut self, namespace: impl Into<String>, descriptor: ComponentDescriptor) {
        self.entries.push((namespace.into(), descriptor));
    }

    /// 登记描述符（链式）
    pub fn with(mut self, namespace: impl Into<String>, descriptor: ComponentDescriptor) -> Self {
        self.insert(namespace, descriptor);
        self
    }

    /// 登记可发现类型（链式）
    pub fn with_type<T: Discoverable>(self, namespace: impl Into<String>) -> Self {
        self.with(namespace, T::component_descriptor())
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

impl TypeDiscovery for DescriptorTable {
    fn discover(&self, namespace: &str) -> ComponentResult<Vec<ComponentDescriptor>> {
        validate_namespace(namespace)?;

        let descriptors: Vec<ComponentDescriptor> = self
            .entries
            .iter()
            .filter(|(entry_namespace, _)| namespace_contains(namespace, entry_namespace))
            .map(|(_, descriptor)| descriptor.clone())
            .collect();

        if descriptors.is_empty() {
            return Err(ComponentError::scan_error(namespace, "描述符表中没有该命名空间"));
        }

        Ok(instantiable_only(namespace, descriptors))
    }
}

/// 依赖关系图
///
/// 节点为组件名称，边从依赖者指向被依赖者；节点保持加入顺序
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    nodes: Vec<String>,
    index: HashMap<String, usize>,
    /// 邻接表：依赖者 -> 被依赖者
    adjacency_list: Vec<Vec<usize>>,
    /// 反向邻接表：被依赖者 -> 依赖者
    reverse_adjacency_list: Vec<Vec<usize>>,
}

impl DependencyGraph {
    /// 创建新的依赖关系图
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加组件节点，重复添加无效果
    pub fn add_component(&mut self, name: impl Into<String>) {
        let name = name.into();
        if self.index.contains_key(&name) {
            return;
        }
        self.index.insert(name.clone(), self.nodes.len());
        self.nodes.push(name);
        self.adjacency_list.push(Vec::new());
        self.reverse_adjacency_list.push(Vec::new());
    }

    /// 添加依赖关系，未知的节点会先加入图中
    pub fn add_dependency(&mut self, dependent: &str, dependency: &str) {
        self.add_component(dependent);
        self.add_component(dependency);
        let (from, to) = (self.index[dependent], self.index[dependency]);
        if !self.adjacency_list[from].contains(&to) {
            self.adjacency_list[from].push(to);
            self.reverse_adjacency_list[to].push(from);
        }
    }

    /// 节点数量
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// 获取组件的直接依赖
    pub fn get_dependencies(&self, component: &str) -> Vec<&str> {
        self.neighbours(component, &self.adjacency_list)
    }

    /// 获取依赖于指定组件的组件列表
    pub fn get_dependents(&self, component: &str) -> Vec<&str> {
        self.neighbours(component, &self.reverse_adjacency_list)
    }

    fn neighbours<'a>(&'a self, component: &str, edges: &[Vec<usize>]) -> Vec<&'a str> {
        self.index
            .get(component)
            .map(|&node| edges[node].iter().map(|&n| self.nodes[n].as_str()).collect())
            .unwrap_or_default()
    }

    /// 检测循环依赖，返回第一个循环链（首尾为同一节点）
    pub fn detect_cycle(&self) -> Option<Vec<String>> {
        let mut visited = HashSet::new();
        let mut rec_stack = HashSet::new();
        let mut path = Vec::new();

        for node in 0..self.nodes.len() {
            if !visited.contains(&node) {
                if let Some(cycle) = self.dfs_detect_cycle(node, &mut visited, &mut rec_stack, &mut path) {
                    return Some(cycle.into_iter().map(|n| self.nodes[n].clone()).collect());
                }
            }
        }
        None
    }

    fn dfs_detect_cycle(
        &self,
        node: usize,
        visited: &mut HashSet<usize>,
        rec_stack: &mut HashSet<usize>,
        path: &mut Vec<usize>,
    ) -> Option<Vec<usize>> {
        visited.insert(node);
        rec_stack.insert(node);
        path.push(node);

        for &dep in &self.adjacency_list[node] {
            if rec_stack.contains(&dep) {
                let start = path.iter().position(|&n| n == dep).unwrap_or(0);
                let mut cycle = path[start..].to_vec();
                cycle.push(dep);
                return Some(cycle);
            }
            if !visited.contains(&dep) {
                if let Some(cycle) = self.dfs_detect_cycle(dep, visited, rec_stack, path) {
                    return Some(cycle);
                }
            }
        }

        path.pop();
        rec_stack.remove(&node);
        None
    }

    /// 拓扑排序，被依赖者在前
    ///
    /// 同时就绪的节点按加入顺序排列，结果是确定的
    pub fn topological_sort(&self) -> ComponentResult<Vec<String>> {
        let mut in_degree: Vec<usize> = self.adjacency_list.iter().map(Vec::len).collect();
        let mut ready: BTreeSet<usize> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, degree)| **degree == 0)
            .map(|(node, _)| node)
            .collect();
        let mut result = Vec::with_capacity(self.nodes.len());

        // Kahn算法
        while let Some(node) = ready.pop_first() {
            result.push(self.nodes[node].clone());
            for &dependent in &self.reverse_adjacency_list[node] {
                in_degree[dependent] -= 1;
                if in_degree[dependent] == 0 {
                    ready.insert(dependent);
                }
            }
        }

        if result.len() == self.nodes.len() {
            return Ok(result);
        }

        let cycle = self
            .detect_cycle()
            .map(|cycle| cycle.join(" -> "))
            .unwrap_or_else(|| "未知".to_string());
        Err(ComponentError::CircularDependency { cycle })
    }
}
