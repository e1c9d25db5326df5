//! 控制反转容器
//!
//! 负责组件注册、构造参数解析、实例化与钩子调用

use crate::hooks::{HookChain, HookPhase, HookReport};
use crate::registry::{InstanceRegistry, RegistryEntry};
use ioc_common::{
    panic_message, CatalogDiscovery, ComponentDescriptor, ComponentError, ComponentProcessor, ComponentRef,
    ComponentResult, ContainerConfig, DependencyError, Dependencies, Discoverable, HookChainMode, HookKind,
    Instance, LifecycleHook, Lifetime, ParameterDescriptor, ResolvedParameter, TypeDiscovery, TypeInfo,
};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// 单次注册的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// 实例已创建并发布
    Registered,
    /// 同名组件已存在，未做任何事
    AlreadyRegistered,
    /// 描述符没有组件标记，未做任何事
    NotAComponent,
}

/// 命名空间扫描结果
#[derive(Debug, Default)]
pub struct ScanReport {
    /// 本次新注册的组件
    pub registered: Vec<String>,
    /// 跳过的组件（已注册或无组件标记）
    pub skipped: Vec<String>,
    /// 注册失败的组件
    pub failed: Vec<(String, ComponentError)>,
}

impl ScanReport {
    /// 是否全部成功
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// 控制反转容器
///
/// 每个容器独占自己的注册表和钩子链，实例不会在容器之间共享
pub struct Container {
    id: Uuid,
    config: ContainerConfig,
    discovery: Arc<dyn TypeDiscovery>,
    registry: InstanceRegistry,
    /// `PerType` 模式下只含外部处理器；`Accumulated` 模式下还含所有已注册组件的前置钩子
    pre_chain: RwLock<HookChain>,
    post_chain: RwLock<HookChain>,
}

impl Container {
    /// 使用默认配置创建容器
    pub fn new() -> Self {
        Self::with_config(ContainerConfig::default())
    }

    /// 使用指定配置创建容器
    pub fn with_config(config: ContainerConfig) -> Self {
        let id = Uuid::new_v4();
        debug!("创建容器: {} ({:?})", id, config);
        Self {
            id,
            config,
            discovery: Arc::new(CatalogDiscovery::new()),
            registry: InstanceRegistry::new(),
            pre_chain: RwLock::new(HookChain::new()),
            post_chain: RwLock::new(HookChain::new()),
        }
    }

    /// 替换组件发现器
    pub fn with_discovery(mut self, discovery: Arc<dyn TypeDiscovery>) -> Self {
        self.discovery = discovery;
        self
    }

    /// 容器ID
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// 容器配置
    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    /// 组件发现器
    pub fn discovery(&self) -> &Arc<dyn TypeDiscovery> {
        &self.discovery
    }

    /// 扫描命名空间并注册其中的组件
    ///
    /// 命名空间无法解析时返回 [`ComponentError::ScanError`]；单个组件失败只记录在报告中，
    /// 其余组件继续注册
    pub fn scan_and_register_components(&self, namespace: &str) -> ComponentResult<ScanReport> {
        info!("[{}] 扫描命名空间: {}", self.id, namespace);
        let descriptors = self.discovery.discover(namespace)?;

        let mut report = ScanReport::default();
        for descriptor in descriptors {
            let name = descriptor.name.clone();
            match self.register(descriptor) {
                Ok(Registration::Registered) => report.registered.push(name),
                Ok(_) => report.skipped.push(name),
                Err(e) => {
                    warn!("[{}] 组件注册失败，继续扫描: {}", self.id, e);
                    report.failed.push((name, e));
                }
            }
        }

        info!(
            "[{}] 扫描完成: {}, 注册 {} 个, 跳过 {} 个, 失败 {} 个",
            self.id,
            namespace,
            report.registered.len(),
            report.skipped.len(),
            report.failed.len()
        );
        Ok(report)
    }

    /// 注册组件
    ///
    /// 没有组件标记或已注册时不做任何事
    pub fn register(&self, descriptor: ComponentDescriptor) -> ComponentResult<Registration> {
        if !descriptor.component {
            debug!("跳过未标记为组件的类型: {}", descriptor.name);
            return Ok(Registration::NotAComponent);
        }
        if self.registry.contains(&descriptor.name) {
            debug!("组件已注册: {}", descriptor.name);
            return Ok(Registration::AlreadyRegistered);
        }

        let instance = self.instantiate(&descriptor)?;
        Ok(self.install(&descriptor, instance))
    }

    /// 注册组件，没有组件标记时返回错误
    pub fn register_strict(&self, descriptor: ComponentDescriptor) -> ComponentResult<Registration> {
        if !descriptor.component {
            return Err(ComponentError::NotAComponent {
                type_name: descriptor.name,
            });
        }
        self.register(descriptor)
    }

    /// 注册可发现类型
    pub fn register_type<T: Discoverable>(&self) -> ComponentResult<Registration> {
        self.register(T::component_descriptor())
    }

    /// 直接发布已构造好的实例
    ///
    /// 不经过构造和钩子链；post-construct 方法在 [`Container::initialize`] 中执行
    pub fn register_instance<T: Send + Sync + 'static>(
        &self,
        descriptor: ComponentDescriptor,
        instance: Arc<T>,
    ) -> ComponentResult<Registration> {
        if !descriptor.type_info.is::<T>() {
            return Err(ComponentError::TypeMismatch {
                name: descriptor.name,
                expected: descriptor.type_info.type_name,
                actual: std::any::type_name::<T>(),
            });
        }

        let entry = RegistryEntry::new(descriptor.name.clone(), descriptor.type_info, instance, &descriptor.hooks);
        let Some(entry) = self.registry.publish(entry) else {
            debug!("组件已注册: {}", descriptor.name);
            return Ok(Registration::AlreadyRegistered);
        };
        info!("发布预构造实例: {} (发布于 {})", descriptor.name, entry.registered_at());
        Ok(Registration::Registered)
    }

    /// 按类型获取实例
    ///
    /// 名称等于完整类型名的组件优先，否则取该类型第一个注册的组件
    pub fn get_instance<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        let entry = self.registry.find_by_type(&TypeInfo::of::<T>())?;
        Arc::clone(entry.instance()).downcast::<T>().ok()
    }

    /// 按名称获取实例，类型不符时为 `None`
    pub fn get_named<T: Send + Sync + 'static>(&self, name: &str) -> Option<Arc<T>> {
        self.get_instance_by_name(name)?.downcast::<T>().ok()
    }

    /// 按名称获取类型擦除的实例
    pub fn get_instance_by_name(&self, name: &str) -> Option<Instance> {
        self.registry.get(name).map(|entry| Arc::clone(entry.instance()))
    }

    /// 组件的发布时间，未注册时为 `None`
    pub fn registered_at(&self, name: &str) -> Option<DateTime<Utc>> {
        self.registry.get(name).map(|entry| entry.registered_at())
    }

    /// 是否已注册
    pub fn contains(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    /// 已注册组件数量
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// 是否没有组件
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// 按发布顺序列出已注册组件名称
    pub fn get_instance_class_names(&self) -> Vec<String> {
        self.registry.names()
    }

    /// 最终激活：对尚未激活的实例执行 post-construct 方法
    ///
    /// 返回本次激活的实例数
    pub fn initialize(&self) -> usize {
        let force = self.config.reactivate_on_initialize;
        let activated = self
            .registry
            .entries()
            .iter()
            .filter(|entry| entry.activate(force))
            .count();

        info!("[{}] 容器初始化完成，激活 {} 个实例", self.id, activated);
        activated
    }

    /// 添加外部前置处理器，之后每次注册都会触发
    pub fn add_component_pre_processor(&self, processor: Arc<dyn ComponentProcessor>) {
        debug!("添加前置处理器: {}", processor.name());
        self.pre_chain.write().push_processor(processor);
    }

    /// 添加外部后置处理器，之后每次注册都会触发
    pub fn add_component_post_processor(&self, processor: Arc<dyn ComponentProcessor>) {
        debug!("添加后置处理器: {}", processor.name());
        self.post_chain.write().push_processor(processor);
    }

    fn instantiate(&self, descriptor: &ComponentDescriptor) -> ComponentResult<Instance> {
        if descriptor.lifetime != Lifetime::Singleton {
            return Err(ComponentError::UnsupportedLifetime {
                type_name: descriptor.name.clone(),
                lifetime: descriptor.lifetime.to_string(),
            });
        }
        if !descriptor.instantiable {
            return Err(ComponentError::NotInstantiable {
                type_name: descriptor.name.clone(),
            });
        }

        let constructor = descriptor.select_constructor()?;
        let parameters = constructor
            .parameters
            .iter()
            .map(|parameter| self.resolve(descriptor, parameter))
            .collect::<ComponentResult<Vec<_>>>()?;
        let dependencies = Dependencies::new(parameters);

        debug!("实例化组件: {} (构造函数: {})", descriptor.name, constructor.name);
        let instance = match panic::catch_unwind(AssertUnwindSafe(|| constructor.instantiate(&dependencies))) {
            Ok(Ok(instance)) => instance,
            Ok(Err(e)) => return Err(ComponentError::instantiation(descriptor.name.clone(), e)),
            Err(payload) => {
                return Err(ComponentError::instantiation(
                    descriptor.name.clone(),
                    panic_message(payload.as_ref()),
                ))
            }
        };

        let concrete: &(dyn Any + Send + Sync) = &*instance;
        if concrete.type_id() != descriptor.type_info.id {
            return Err(ComponentError::TypeMismatch {
                name: descriptor.name.clone(),
                expected: descriptor.type_info.type_name,
                actual: "<构造函数返回的其他类型>",
            });
        }
        Ok(instance)
    }

    /// 单次、非递归的注册表查找
    fn resolve(
        &self,
        descriptor: &ComponentDescriptor,
        parameter: &ParameterDescriptor,
    ) -> ComponentResult<ResolvedParameter> {
        let entry = match parameter.qualifier() {
            Some(name) => self.registry.get(name),
            None => self.registry.find_by_type(parameter.type_info()),
        };

        if entry.is_none() {
            if self.config.strict_dependencies {
                return Err(ComponentError::UnresolvedDependency {
                    type_name: descriptor.name.clone(),
                    source: DependencyError::Unresolved {
                        dependency: parameter.to_string(),
                    },
                });
            }
            warn!("组件 {} 的依赖未解析: {}", descriptor.name, parameter);
        }

        Ok(ResolvedParameter {
            parameter: parameter.clone(),
            actual_type: entry.as_ref().map(|entry| entry.type_info().type_name),
            instance: entry.map(|entry| Arc::clone(entry.instance())),
        })
    }

    /// 运行钩子链并发布实例
    fn install(&self, descriptor: &ComponentDescriptor, instance: Instance) -> Registration {
        let bind = |kind: HookKind| {
            let mut chain = HookChain::new();
            for method in descriptor.hooks_of(kind) {
                chain.push_hook(LifecycleHook::new(descriptor.name.clone(), method.clone(), Arc::clone(&instance)));
            }
            chain
        };
        let own_pre = bind(HookKind::PreHook);
        let own_post = bind(HookKind::PostHook);

        // 钩子链快照后再执行，钩子运行时不持有锁
        let (pre_chains, post_chains) = match self.config.hook_chain_mode {
            HookChainMode::PerType => (
                [self.pre_chain.read().clone(), own_pre],
                [self.post_chain.read().clone(), own_post],
            ),
            HookChainMode::Accumulated => {
                let pre = {
                    let mut chain = self.pre_chain.write();
                    chain.append(own_pre);
                    chain.clone()
                };
                let post = {
                    let mut chain = self.post_chain.write();
                    chain.append(own_post);
                    chain.clone()
                };
                ([pre, HookChain::new()], [post, HookChain::new()])
            }
        };

        let subject = ComponentRef {
            name: &descriptor.name,
            type_info: &descriptor.type_info,
            instance: &instance,
        };

        let pre_report = run_all(&pre_chains, HookPhase::Pre, &subject);

        let entry = RegistryEntry::new(
            descriptor.name.clone(),
            descriptor.type_info,
            Arc::clone(&instance),
            &descriptor.hooks,
        );
        let Some(entry) = self.registry.publish(entry) else {
            debug!("组件已被并发注册: {}", descriptor.name);
            return Registration::AlreadyRegistered;
        };

        let post_report = run_all(&post_chains, HookPhase::Post, &subject);
        entry.activate(false);

        let hooks = pre_report.merge(post_report);
        info!(
            "注册组件: {} ({}), 发布于 {}, 钩子 {} 个, 失败 {} 个",
            descriptor.name,
            descriptor.type_info,
            entry.registered_at(),
            hooks.invoked,
            hooks.failed
        );
        Registration::Registered
    }
}

fn run_all(chains: &[HookChain], phase: HookPhase, subject: &ComponentRef<'_>) -> HookReport {
    chains
        .iter()
        .fold(HookReport::default(), |report, chain| report.merge(chain.run(phase, subject)))
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("registry", &self.registry)
            .finish()
    }
}
