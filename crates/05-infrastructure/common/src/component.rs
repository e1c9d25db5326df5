//! 组件描述符定义
//!
//! 描述符是容器唯一的元数据来源：标记、构造函数、限定参数与钩子方法
//! 都以显式数据的形式登记在描述符中

use crate::errors::{ComponentError, DynError};
use crate::injection::{Dependencies, Instance, ParameterDescriptor};
use crate::lifecycle::{HookKind, HookMethod, HookOutcome, Lifetime};
use crate::metadata::TypeInfo;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// 可发现的组件 trait
///
/// 由 `#[component]` 宏生成，也可以手动实现
pub trait Discoverable: Send + Sync + 'static {
    /// 获取组件描述符
    fn component_descriptor() -> ComponentDescriptor
    where
        Self: Sized;
}

/// 类型擦除后的构造函数
pub type ConstructorFn = Arc<dyn Fn(&Dependencies) -> Result<Instance, DynError> + Send + Sync>;

/// 构造函数描述
#[derive(Clone)]
pub struct ConstructorDescriptor {
    /// 构造函数名称
    pub name: String,
    /// 是否标记为可注入构造函数
    pub injectable: bool,
    /// 构造参数
    pub parameters: Vec<ParameterDescriptor>,
    factory: ConstructorFn,
}

impl ConstructorDescriptor {
    /// 创建构造函数描述
    pub fn new(
        name: impl Into<String>,
        injectable: bool,
        parameters: Vec<ParameterDescriptor>,
        factory: ConstructorFn,
    ) -> Self {
        Self {
            name: name.into(),
            injectable,
            parameters,
            factory,
        }
    }

    /// 调用构造函数
    pub fn instantiate(&self, dependencies: &Dependencies) -> Result<Instance, DynError> {
        (self.factory)(dependencies)
    }
}

impl fmt::Debug for ConstructorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorDescriptor")
            .field("name", &self.name)
            .field("injectable", &self.injectable)
            .field("parameters", &self.parameters)
            .field("factory", &"<function>")
            .finish()
    }
}

/// 组件描述符
#[derive(Debug, Clone)]
pub struct ComponentDescriptor {
    /// 组件名称（注册表键），默认为完整类型名
    pub name: String,
    /// 组件类型
    pub type_info: TypeInfo,
    /// 组件生命周期
    pub lifetime: Lifetime,
    /// 是否带有组件标记
    pub component: bool,
    /// 是否可实例化（抽象描述符为 `false`）
    pub instantiable: bool,
    /// 按声明顺序排列的构造函数
    pub constructors: Vec<ConstructorDescriptor>,
    /// 钩子方法
    pub hooks: Vec<HookMethod>,
}

impl ComponentDescriptor {
    /// 创建新的组件描述符
    pub fn new(type_info: TypeInfo) -> Self {
        Self {
            name: type_info.type_name.to_string(),
            type_info,
            lifetime: Lifetime::Singleton,
            component: true,
            instantiable: true,
            constructors: Vec::new(),
            hooks: Vec::new(),
        }
    }

    /// 创建类型化的描述符构建器
    pub fn builder<T: Send + Sync + 'static>() -> ComponentDescriptorBuilder<T> {
        ComponentDescriptorBuilder::new()
    }

    /// 从可发现类型获取描述符
    pub fn of<T: Discoverable>() -> Self {
        T::component_descriptor()
    }

    /// 是否使用默认名称（完整类型名）
    pub fn has_canonical_name(&self) -> bool {
        self.name == self.type_info.type_name
    }

    /// 选择构造函数
    ///
    /// 唯一的可注入构造函数优先；没有标记时回退到第一个声明的构造函数
    pub fn select_constructor(&self) -> Result<&ConstructorDescriptor, ComponentError> {
        let mut injectable = self.constructors.iter().filter(|c| c.injectable);
        match (injectable.next(), injectable.count()) {
            (Some(constructor), 0) => Ok(constructor),
            (Some(_), more) => Err(ComponentError::AmbiguousConstructor {
                type_name: self.name.clone(),
                count: more + 1,
            }),
            (None, _) => self
                .constructors
                .first()
                .ok_or_else(|| ComponentError::NoConstructor {
                    type_name: self.name.clone(),
                }),
        }
    }

    /// 指定标记的钩子方法，按声明顺序
    pub fn hooks_of(&self, kind: HookKind) -> impl Iterator<Item = &HookMethod> {
        self.hooks.iter().filter(move |hook| hook.kind == kind)
    }
}

/// 类型化的描述符构建器
pub struct ComponentDescriptorBuilder<T> {
    descriptor: ComponentDescriptor,
    _component: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> ComponentDescriptorBuilder<T> {
    /// 创建构建器
    pub fn new() -> Self {
        Self {
            descriptor: ComponentDescriptor::new(TypeInfo::of::<T>()),
            _component: PhantomData,
        }
    }

    /// 设置组件名称
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.descriptor.name = name.into();
        self
    }

    /// 设置生命周期
    pub fn with_lifetime(mut self, lifetime: Lifetime) -> Self {
        self.descriptor.lifetime = lifetime;
        self
    }

    /// 去掉组件标记
    pub fn not_component(mut self) -> Self {
        self.descriptor.component = false;
        self
    }

    /// 标记为不可实例化
    pub fn abstract_type(mut self) -> Self {
        self.descriptor.instantiable = false;
        self
    }

    /// 添加构造函数
    pub fn constructor(mut self, constructor: Constructor<T>) -> Self {
        self.descriptor.constructors.push(constructor.into_descriptor());
        self
    }

    /// 添加 post-construct 方法
    pub fn post_construct<F, R>(self, name: impl Into<String>, method: F) -> Self
    where
        F: Fn(&T) -> R + Send + Sync + 'static,
        R: HookOutcome,
    {
        self.hook(HookMethod::new(name, HookKind::PostConstruct, method))
    }

    /// 添加前置钩子
    pub fn pre_hook<F, R>(self, name: impl Into<String>, method: F) -> Self
    where
        F: Fn(&T) -> R + Send + Sync + 'static,
        R: HookOutcome,
    {
        self.hook(HookMethod::new(name, HookKind::PreHook, method))
    }

    /// 添加后置钩子
    pub fn post_hook<F, R>(self, name: impl Into<String>, method: F) -> Self
    where
        F: Fn(&T) -> R + Send + Sync + 'static,
        R: HookOutcome,
    {
        self.hook(HookMethod::new(name, HookKind::PostHook, method))
    }

    /// 构建描述符
    pub fn build(self) -> ComponentDescriptor {
        self.descriptor
    }

    fn hook(mut self, hook: HookMethod) -> Self {
        self.descriptor.hooks.push(hook);
        self
    }
}

impl<T: Send + Sync + 'static> Default for ComponentDescriptorBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// 类型化的构造函数构建器
pub struct Constructor<T> {
    name: String,
    injectable: bool,
    parameters: Vec<ParameterDescriptor>,
    factory: Option<ConstructorFn>,
    _component: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> Constructor<T> {
    /// 创建构造函数构建器
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            injectable: false,
            parameters: Vec::new(),
            factory: None,
            _component: PhantomData,
        }
    }

    /// 标记为可注入构造函数
    pub fn injectable(mut self) -> Self {
        self.injectable = true;
        self
    }

    /// 添加按类型解析的参数
    pub fn param<D: 'static>(mut self) -> Self {
        self.parameters.push(ParameterDescriptor::of::<D>());
        self
    }

    /// 添加按限定名解析的参数
    pub fn qualified<D: 'static>(mut self, name: impl Into<String>) -> Self {
        self.parameters.push(ParameterDescriptor::qualified::<D>(name));
        self
    }

    /// 设置构造逻辑
    pub fn build<F>(mut self, factory: F) -> Self
    where
        F: Fn(&Dependencies) -> Result<T, DynError> + Send + Sync + 'static,
    {
        self.factory = Some(Arc::new(move |dependencies: &Dependencies| {
            factory(dependencies).map(|component| Arc::new(component) as Instance)
        }));
        self
    }

    fn into_descriptor(self) -> ConstructorDescriptor {
        let name = self.name;
        let factory = self.factory.unwrap_or_else(|| {
            let constructor = name.clone();
            let missing: ConstructorFn = Arc::new(move |_: &Dependencies| -> Result<Instance, DynError> {
                Err(format!("构造函数 {constructor} 没有提供构造逻辑").into())
            });
            missing
        });
        ConstructorDescriptor::new(name, self.injectable, self.parameters, factory)
    }
}
