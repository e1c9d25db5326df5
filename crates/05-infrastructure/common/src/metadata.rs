//! 元数据定义
//!
//! 提供组件类型的稳定标识

use std::any::TypeId;
use std::fmt;

/// 类型信息
///
/// 组件类型的稳定句柄，`type_name` 为完整限定名
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeInfo {
    /// 类型ID
    pub id: TypeId,
    /// 完整类型名称
    pub type_name: &'static str,
}

impl TypeInfo {
    /// 从类型获取类型信息
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// 获取简短的类型名称（不包含模块路径）
    pub fn short_name(&self) -> &'static str {
        let (path, _) = split_generics(self.type_name);
        match path.rfind("::") {
            Some(index) => &self.type_name[index + 2..],
            None => self.type_name,
        }
    }

    /// 获取类型所在的模块路径
    pub fn module_path(&self) -> &'static str {
        let (path, _) = split_generics(self.type_name);
        match path.rfind("::") {
            Some(index) => &path[..index],
            None => "",
        }
    }

    /// 判断是否为指定类型
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name)
    }
}

/// 拆分泛型参数，避免 `Vec<a::B>` 之类的名称被错误截断
fn split_generics(type_name: &'static str) -> (&'static str, &'static str) {
    match type_name.find('<') {
        Some(index) => type_name.split_at(index),
        None => (type_name, ""),
    }
}

/// 判断模块路径是否位于命名空间之下（按 `::` 分段匹配）
pub fn namespace_contains(namespace: &str, module_path: &str) -> bool {
    match module_path.strip_prefix(namespace) {
        Some("") => true,
        Some(rest) => rest.starts_with("::"),
        None => false,
    }
}

/// 校验命名空间格式
pub fn is_valid_namespace(namespace: &str) -> bool {
    !namespace.is_empty()
        && namespace.split("::").all(|segment| {
            let mut chars = segment.chars();
            matches!(chars.next(), Some(c) if c == '_' || c.is_alphabetic())
                && chars.all(|c| c == '_' || c.is_alphanumeric())
        })
}
