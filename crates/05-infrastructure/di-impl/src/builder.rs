//! 容器构建器
//!
//! 两阶段构建：先收集全部描述符并按依赖关系排序，再按顺序注册

use crate::container::Container;
use ioc_common::{
    ComponentDescriptor, ComponentError, ComponentProcessor, ComponentResult, ContainerConfig, DependencyError,
    DependencyGraph, Discoverable, ParameterDescriptor, TypeDiscovery,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// 容器构建器
#[derive(Default)]
pub struct ContainerBuilder {
    config: ContainerConfig,
    discovery: Option<Arc<dyn TypeDiscovery>>,
    descriptors: Vec<ComponentDescriptor>,
    namespaces: Vec<String>,
    pre_processors: Vec<Arc<dyn ComponentProcessor>>,
    post_processors: Vec<Arc<dyn ComponentProcessor>>,
}

impl ContainerBuilder {
    /// 创建构建器
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置容器配置
    pub fn with_config(mut self, config: ContainerConfig) -> Self {
        self.config = config;
        self
    }

    /// 设置组件发现器
    pub fn with_discovery(mut self, discovery: Arc<dyn TypeDiscovery>) -> Self {
        self.discovery = Some(discovery);
        self
    }

    /// 添加描述符
    pub fn add_descriptor(mut self, descriptor: ComponentDescriptor) -> Self {
        self.descriptors.push(descriptor);
        self
    }

    /// 添加可发现类型
    pub fn add_type<T: Discoverable>(self) -> Self {
        self.add_descriptor(T::component_descriptor())
    }

    /// 添加要扫描的命名空间
    pub fn scan(mut self, namespace: impl Into<String>) -> Self {
        self.namespaces.push(namespace.into());
        self
    }

    /// 添加外部前置处理器
    pub fn pre_processor(mut self, processor: Arc<dyn ComponentProcessor>) -> Self {
        self.pre_processors.push(processor);
        self
    }

    /// 添加外部后置处理器
    pub fn post_processor(mut self, processor: Arc<dyn ComponentProcessor>) -> Self {
        self.post_processors.push(processor);
        self
    }

    /// 构建容器
    ///
    /// 循环依赖、未解析的依赖或任何组件注册失败都会中止构建
    pub fn build(self) -> ComponentResult<Container> {
        let mut container = Container::with_config(self.config);
        if let Some(discovery) = self.discovery {
            container = container.with_discovery(discovery);
        }
        for processor in self.pre_processors {
            container.add_component_pre_processor(processor);
        }
        for processor in self.post_processors {
            container.add_component_post_processor(processor);
        }

        let mut collected = self.descriptors;
        for namespace in &self.namespaces {
            collected.extend(container.discovery().discover(namespace)?);
        }

        let ordered = order_descriptors(collected)?;
        let count = ordered.len();
        for descriptor in ordered {
            container.register(descriptor)?;
        }
        container.initialize();

        info!("[{}] 构建容器完成，注册了 {} 个组件", container.id(), count);
        Ok(container)
    }
}

/// 按依赖关系排序描述符，被依赖者在前
fn order_descriptors(collected: Vec<ComponentDescriptor>) -> ComponentResult<Vec<ComponentDescriptor>> {
    let mut descriptors: Vec<ComponentDescriptor> = Vec::with_capacity(collected.len());
    for descriptor in collected {
        if !descriptor.component {
            debug!("跳过未标记为组件的类型: {}", descriptor.name);
        } else if descriptors.iter().any(|d| d.name == descriptor.name) {
            debug!("忽略重复的描述符: {}", descriptor.name);
        } else {
            descriptors.push(descriptor);
        }
    }

    let mut graph = DependencyGraph::new();
    for descriptor in &descriptors {
        graph.add_component(descriptor.name.clone());
    }
    for descriptor in &descriptors {
        if !descriptor.instantiable {
            continue;
        }
        let constructor = descriptor.select_constructor()?;
        for parameter in &constructor.parameters {
            let target = resolve_target(&descriptors, parameter).ok_or_else(|| {
                ComponentError::UnresolvedDependency {
                    type_name: descriptor.name.clone(),
                    source: DependencyError::Unresolved {
                        dependency: parameter.to_string(),
                    },
                }
            })?;
            graph.add_dependency(&descriptor.name, target);
        }
    }

    let order = graph.topological_sort()?;
    debug!("组件注册顺序: {:?}", order);

    let mut by_name: HashMap<String, ComponentDescriptor> =
        descriptors.into_iter().map(|d| (d.name.clone(), d)).collect();
    Ok(order.iter().filter_map(|name| by_name.remove(name)).collect())
}

/// 参数对应的组件名称，规则与容器运行时查找一致
fn resolve_target<'a>(descriptors: &'a [ComponentDescriptor], parameter: &ParameterDescriptor) -> Option<&'a str> {
    let found = match parameter.qualifier() {
        Some(name) => descriptors.iter().find(|d| d.name == name),
        None => {
            let type_info = parameter.type_info();
            descriptors
                .iter()
                .find(|d| d.name == type_info.type_name && d.type_info.id == type_info.id)
                .or_else(|| descriptors.iter().find(|d| d.type_info.id == type_info.id))
        }
    };
    found.map(|d| d.name.as_str())
}
