//! 错误类型定义

use thiserror::Error;

/// 用户构造函数和钩子返回的通用错误类型
pub type DynError = Box<dyn std::error::Error + Send + Sync>;

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    #[error("配置文件读取失败: {source}")]
    FileReadError {
        #[from]
        source: std::io::Error,
    },

    #[error("配置解析失败: {message}")]
    ParseError { message: String },

    #[error("不支持的配置文件格式: {extension}")]
    UnsupportedFormat { extension: String },
}

/// 依赖解析错误类型
///
/// 描述单个构造参数在解析或取用时的失败
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DependencyError {
    #[error("依赖未解析: {dependency}")]
    Unresolved { dependency: String },

    #[error("依赖类型不匹配: 期望 {expected}, 实际 {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("构造参数索引越界: {index} (共 {len} 个参数)")]
    ParameterOutOfRange { index: usize, len: usize },
}

/// 组件错误类型
#[derive(Error, Debug)]
pub enum ComponentError {
    #[error("组件扫描失败: {namespace}, 原因: {message}")]
    ScanError { namespace: String, message: String },

    #[error("类型未标记为组件: {type_name}")]
    NotAComponent { type_name: String },

    #[error("组件实例化失败: {type_name}, 原因: {source}")]
    InstantiationFailed {
        type_name: String,
        #[source]
        source: DynError,
    },

    #[error("组件没有可用的构造函数: {type_name}")]
    NoConstructor { type_name: String },

    #[error("组件存在 {count} 个可注入构造函数: {type_name}")]
    AmbiguousConstructor { type_name: String, count: usize },

    #[error("组件不可实例化: {type_name}")]
    NotInstantiable { type_name: String },

    #[error("不支持的组件生命周期: {type_name}, 生命周期: {lifetime}")]
    UnsupportedLifetime { type_name: String, lifetime: String },

    #[error("组件依赖未解析: {type_name}, 原因: {source}")]
    UnresolvedDependency {
        type_name: String,
        #[source]
        source: DependencyError,
    },

    #[error("检测到循环依赖: {cycle}")]
    CircularDependency { cycle: String },

    #[error("组件类型不匹配: {name}, 期望 {expected}, 实际 {actual}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },
}

impl ComponentError {
    /// 创建扫描错误
    pub fn scan_error(namespace: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ScanError {
            namespace: namespace.into(),
            message: message.into(),
        }
    }

    /// 创建实例化错误
    pub fn instantiation(type_name: impl Into<String>, source: impl Into<DynError>) -> Self {
        Self::InstantiationFailed {
            type_name: type_name.into(),
            source: source.into(),
        }
    }

    /// 是否为扫描错误
    pub fn is_scan_error(&self) -> bool {
        matches!(self, Self::ScanError { .. })
    }
}

/// 生命周期钩子调用错误
///
/// 只会被记录，不会向外传播
#[derive(Error, Debug)]
#[error("生命周期钩子调用失败: {component}::{hook} ({phase}), 原因: {message}")]
pub struct HookInvocationError {
    pub component: String,
    pub hook: String,
    pub phase: String,
    pub message: String,
}

/// 结果类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type DependencyResult<T> = Result<T, DependencyError>;
pub type ComponentResult<T> = Result<T, ComponentError>;
