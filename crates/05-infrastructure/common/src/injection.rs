//! 构造参数与依赖引用
//!
//! 容器在实例化时把每个构造参数解析为一次注册表查找的结果，
//! 并以 [`Dependencies`] 的形式交给构造函数

use crate::errors::DependencyError;
use crate::metadata::TypeInfo;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// 容器中保存的组件实例
pub type Instance = Arc<dyn Any + Send + Sync>;

/// 构造参数描述
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterDescriptor {
    /// 按参数的静态类型解析
    ByType(TypeInfo),
    /// 按限定名解析，优先于静态类型
    ByQualifier {
        /// 限定名（目标组件名称）
        name: String,
        /// 参数的静态类型
        type_info: TypeInfo,
    },
}

impl ParameterDescriptor {
    /// 按类型解析的参数
    pub fn of<T: 'static>() -> Self {
        Self::ByType(TypeInfo::of::<T>())
    }

    /// 按限定名解析的参数
    pub fn qualified<T: 'static>(name: impl Into<String>) -> Self {
        Self::ByQualifier {
            name: name.into(),
            type_info: TypeInfo::of::<T>(),
        }
    }

    /// 参数的静态类型
    pub fn type_info(&self) -> &TypeInfo {
        match self {
            Self::ByType(type_info) | Self::ByQualifier { type_info, .. } => type_info,
        }
    }

    /// 限定名（如果有）
    pub fn qualifier(&self) -> Option<&str> {
        match self {
            Self::ByType(_) => None,
            Self::ByQualifier { name, .. } => Some(name),
        }
    }
}

impl fmt::Display for ParameterDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ByType(type_info) => write!(f, "{type_info}"),
            Self::ByQualifier { name, type_info } => write!(f, "{type_info} @qualifier(\"{name}\")"),
        }
    }
}

/// 已解析的构造参数
#[derive(Clone)]
pub struct ResolvedParameter {
    /// 参数描述
    pub parameter: ParameterDescriptor,
    /// 查找结果，未注册时为 `None`
    pub instance: Option<Instance>,
    /// 命中实例的实际类型
    pub actual_type: Option<&'static str>,
}

impl fmt::Debug for ResolvedParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedParameter")
            .field("parameter", &self.parameter)
            .field("resolved", &self.instance.is_some())
            .field("actual_type", &self.actual_type)
            .finish()
    }
}

/// 交给构造函数的依赖列表
#[derive(Debug, Clone, Default)]
pub struct Dependencies {
    parameters: Vec<ResolvedParameter>,
}

impl Dependencies {
    /// 创建依赖列表
    pub fn new(parameters: Vec<ResolvedParameter>) -> Self {
        Self { parameters }
    }

    /// 参数个数
    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    /// 是否没有参数
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// 未解析参数列表
    pub fn unresolved(&self) -> impl Iterator<Item = &ParameterDescriptor> {
        self.parameters
            .iter()
            .filter(|resolved| resolved.instance.is_none())
            .map(|resolved| &resolved.parameter)
    }

    /// 取得第 `index` 个参数；缺失的依赖以 [`Injected`] 的缺失状态携带
    pub fn inject<T: Send + Sync + 'static>(&self, index: usize) -> Result<Injected<T>, DependencyError> {
        let resolved = self.slot(index)?;
        let instance = downcast::<T>(resolved)?;
        Ok(Injected {
            target: resolved.parameter.to_string(),
            instance,
        })
    }

    /// 取得第 `index` 个参数；缺失时为 `None`
    pub fn optional<T: Send + Sync + 'static>(&self, index: usize) -> Result<Option<Arc<T>>, DependencyError> {
        let resolved = self.slot(index)?;
        downcast::<T>(resolved)
    }

    /// 取得第 `index` 个参数；缺失时立即失败
    pub fn require<T: Send + Sync + 'static>(&self, index: usize) -> Result<Arc<T>, DependencyError> {
        let resolved = self.slot(index)?;
        downcast::<T>(resolved)?.ok_or_else(|| DependencyError::Unresolved {
            dependency: resolved.parameter.to_string(),
        })
    }

    fn slot(&self, index: usize) -> Result<&ResolvedParameter, DependencyError> {
        self.parameters
            .get(index)
            .ok_or(DependencyError::ParameterOutOfRange {
                index,
                len: self.parameters.len(),
            })
    }
}

fn downcast<T: Send + Sync + 'static>(
    resolved: &ResolvedParameter,
) -> Result<Option<Arc<T>>, DependencyError> {
    match &resolved.instance {
        None => Ok(None),
        Some(instance) => Arc::clone(instance)
            .downcast::<T>()
            .map(Some)
            .map_err(|_| DependencyError::TypeMismatch {
                expected: std::any::type_name::<T>(),
                actual: resolved.actual_type.unwrap_or("unknown"),
            }),
    }
}

/// 依赖引用
///
/// 未解析的依赖不会在构造时报错，而是在第一次 [`Injected::get`] 时返回
/// [`DependencyError::Unresolved`]
pub struct Injected<T> {
    target: String,
    instance: Option<Arc<T>>,
}

impl<T> Injected<T> {
    /// 已解析的依赖
    pub fn resolved(instance: Arc<T>) -> Self {
        Self {
            target: std::any::type_name::<T>().to_string(),
            instance: Some(instance),
        }
    }

    /// 缺失的依赖
    pub fn absent(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            instance: None,
        }
    }

    /// 取用依赖
    pub fn get(&self) -> Result<&Arc<T>, DependencyError> {
        self.instance.as_ref().ok_or_else(|| DependencyError::Unresolved {
            dependency: self.target.clone(),
        })
    }

    /// 是否已解析
    pub fn is_resolved(&self) -> bool {
        self.instance.is_some()
    }

    /// 以 `Option` 形式查看
    pub fn as_option(&self) -> Option<&Arc<T>> {
        self.instance.as_ref()
    }

    /// 转换为 `Option`
    pub fn into_option(self) -> Option<Arc<T>> {
        self.instance
    }

    /// 依赖目标描述
    pub fn target(&self) -> &str {
        &self.target
    }
}

impl<T> Clone for Injected<T> {
    fn clone(&self) -> Self {
        Self {
            target: self.target.clone(),
            instance: self.instance.clone(),
        }
    }
}

impl<T> fmt::Debug for Injected<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Injected")
            .field("target", &self.target)
            .field("resolved", &self.instance.is_some())
            .finish()
    }
}
