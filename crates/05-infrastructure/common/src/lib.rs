//! # IoC Common
//!
//! 这个 crate 提供了控制反转容器的元数据模型和公共工具。
//!
//! ## 核心组件
//!
//! - [`ComponentDescriptor`] - 组件描述符，容器唯一的元数据来源
//! - [`Dependencies`] / [`Injected`] - 构造参数与依赖引用
//! - [`LifecycleHook`] - 生命周期钩子处理器
//! - [`TypeDiscovery`] - 命名空间到组件描述符的发现契约
//! - [`DependencyGraph`] - 依赖关系图与拓扑排序
//! - [`ContainerConfig`] - 容器配置
//!
//! ## 设计原则
//!
//! - 描述符是显式数据，属性宏只是描述符之上的语法糖
//! - 钩子失败只记录，不中断批量注册
//! - 同步执行，注册完成后允许并发读取

pub mod component;
pub mod configuration;
pub mod discovery;
pub mod errors;
pub mod injection;
pub mod lifecycle;
pub mod metadata;

pub use component::*;
pub use configuration::*;
pub use discovery::*;
pub use errors::*;
pub use injection::*;
pub use lifecycle::*;
pub use metadata::*;
