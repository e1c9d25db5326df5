//! 组件生命周期管理
//!
//! 生命周期钩子处理器把一个实例绑定到一个无参钩子方法，调用失败只记录不传播

use crate::errors::{DynError, HookInvocationError};
use crate::injection::Instance;
use crate::metadata::TypeInfo;
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error};

/// 组件生命周期类型
///
/// 容器目前只支持单例，保留其余取值以便后续扩展作用域
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Lifetime {
    /// 单例模式 - 每个容器内只创建一个实例
    #[default]
    Singleton,
    /// 作用域模式 - 在同一作用域内共享实例
    Scoped,
    /// 瞬时模式 - 每次请求都创建新实例
    Transient,
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Singleton => "singleton",
            Self::Scoped => "scoped",
            Self::Transient => "transient",
        };
        f.write_str(name)
    }
}

/// 钩子方法标记
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    /// 实例装配并发布后调用
    PostConstruct,
    /// 注册时加入前置钩子链
    PreHook,
    /// 注册时加入后置钩子链
    PostHook,
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PostConstruct => "post-construct",
            Self::PreHook => "pre-hook",
            Self::PostHook => "post-hook",
        };
        f.write_str(name)
    }
}

/// 钩子返回值
///
/// 允许钩子方法返回 `()` 或 `Result<(), E>`
pub trait HookOutcome {
    /// 转换为统一的结果
    fn into_result(self) -> Result<(), DynError>;
}

impl HookOutcome for () {
    fn into_result(self) -> Result<(), DynError> {
        Ok(())
    }
}

impl<E: Into<DynError>> HookOutcome for Result<(), E> {
    fn into_result(self) -> Result<(), DynError> {
        self.map_err(Into::into)
    }
}

/// 类型擦除后的钩子函数
pub type HookFn = Arc<dyn Fn(&(dyn Any + Send + Sync)) -> Result<(), DynError> + Send + Sync>;

/// 钩子方法描述
#[derive(Clone)]
pub struct HookMethod {
    /// 方法名称
    pub name: String,
    /// 钩子标记
    pub kind: HookKind,
    invoke: HookFn,
}

impl HookMethod {
    /// 从类型化的方法创建钩子
    pub fn new<T, F, R>(name: impl Into<String>, kind: HookKind, method: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&T) -> R + Send + Sync + 'static,
        R: HookOutcome,
    {
        let name = name.into();
        let method_name = name.clone();
        let invoke: HookFn = Arc::new(move |instance: &(dyn Any + Send + Sync)| {
            let target = instance.downcast_ref::<T>().ok_or_else(|| -> DynError {
                format!(
                    "钩子 {method_name} 期望实例类型 {}",
                    std::any::type_name::<T>()
                )
                .into()
            })?;
            method(target).into_result()
        });

        Self { name, kind, invoke }
    }

    /// 在实例上调用钩子
    pub fn call(&self, instance: &(dyn Any + Send + Sync)) -> Result<(), DynError> {
        (self.invoke)(instance)
    }
}

impl fmt::Debug for HookMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookMethod")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

/// 生命周期钩子处理器
///
/// 一个实例绑定一个钩子方法
#[derive(Clone)]
pub struct LifecycleHook {
    owner: String,
    method: HookMethod,
    instance: Instance,
}

impl LifecycleHook {
    /// 创建新的钩子处理器
    pub fn new(owner: impl Into<String>, method: HookMethod, instance: Instance) -> Self {
        Self {
            owner: owner.into(),
            method,
            instance,
        }
    }

    /// 所属组件名称
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// 钩子方法
    pub fn method(&self) -> &HookMethod {
        &self.method
    }

    /// 调用钩子，错误与 panic 都转换为 [`HookInvocationError`]
    pub fn try_invoke(&self) -> Result<(), HookInvocationError> {
        debug!("调用钩子: {}::{} ({})", self.owner, self.method.name, self.method.kind);

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.method.call(self.instance.as_ref())));
        let message = match outcome {
            Ok(Ok(())) => return Ok(()),
            Ok(Err(e)) => e.to_string(),
            Err(payload) => panic_message(payload.as_ref()),
        };

        Err(HookInvocationError {
            component: self.owner.clone(),
            hook: self.method.name.clone(),
            phase: self.method.kind.to_string(),
            message,
        })
    }

    /// 调用钩子，失败时记录日志并吞掉错误
    ///
    /// 返回钩子是否成功
    pub fn invoke(&self) -> bool {
        match self.try_invoke() {
            Ok(()) => true,
            Err(e) => {
                error!("{}", e);
                false
            }
        }
    }
}

impl fmt::Debug for LifecycleHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleHook")
            .field("owner", &self.owner)
            .field("method", &self.method)
            .finish()
    }
}

/// 正在注册的组件
#[derive(Clone, Copy)]
pub struct ComponentRef<'a> {
    /// 组件名称
    pub name: &'a str,
    /// 组件类型
    pub type_info: &'a TypeInfo,
    /// 组件实例
    pub instance: &'a Instance,
}

impl<'a> ComponentRef<'a> {
    /// 按具体类型查看实例
    pub fn downcast_ref<T: 'static>(&self) -> Option<&'a T> {
        self.instance.as_ref().downcast_ref::<T>()
    }
}

impl fmt::Debug for ComponentRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRef")
            .field("name", &self.name)
            .field("type_info", &self.type_info)
            .finish()
    }
}

/// 外部组件处理器
///
/// 通过容器加入全局前置/后置处理链后，对之后的每一次注册都会触发
pub trait ComponentProcessor: Send + Sync {
    /// 处理器名称
    fn name(&self) -> &str;

    /// 处理正在注册的组件
    fn process(&self, component: &ComponentRef<'_>) -> Result<(), DynError>;
}

/// 调用外部处理器，错误与 panic 都转换为 [`HookInvocationError`]
pub fn invoke_processor(
    processor: &dyn ComponentProcessor,
    phase: &str,
    component: &ComponentRef<'_>,
) -> Result<(), HookInvocationError> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| processor.process(component)));
    let message = match outcome {
        Ok(Ok(())) => return Ok(()),
        Ok(Err(e)) => e.to_string(),
        Err(payload) => panic_message(payload.as_ref()),
    };

    Err(HookInvocationError {
        component: component.name.to_string(),
        hook: processor.name().to_string(),
        phase: phase.to_string(),
        message,
    })
}

/// 提取 panic 信息
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic".to_string()
    }
}
