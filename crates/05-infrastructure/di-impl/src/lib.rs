//! # 控制反转容器实现
//!
//! 提供容器、实例注册表、钩子链和两阶段构建器

pub mod builder;
pub mod container;
pub mod hooks;
pub mod registry;

pub use builder::ContainerBuilder;
pub use container::{Container, Registration, ScanReport};
pub use hooks::{HookBinding, HookChain, HookPhase, HookReport};
pub use registry::{InstanceRegistry, RegistryEntry};
