//! 宏工具函数

use syn::{Attribute, GenericArgument, PathArguments, ReturnType, Type};

/// 类型路径的最后一段名称
pub fn last_segment_name(ty: &Type) -> Option<String> {
    match ty {
        Type::Path(type_path) if type_path.qself.is_none() => {
            type_path.path.segments.last().map(|segment| segment.ident.to_string())
        }
        _ => None,
    }
}

/// 若类型形如 `Wrapper<T>`，返回其中的 `T`
pub fn generic_argument<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    if segment.ident != wrapper {
        return None;
    }
    match &segment.arguments {
        PathArguments::AngleBracketed(args) => args.args.iter().find_map(|arg| match arg {
            GenericArgument::Type(inner) => Some(inner),
            _ => None,
        }),
        _ => None,
    }
}

/// 判断类型是否指向 impl 块的自身类型
pub fn is_self_type(ty: &Type, self_ty: &Type) -> bool {
    if let Type::Path(type_path) = ty {
        if type_path.qself.is_none() && type_path.path.is_ident("Self") {
            return true;
        }
    }
    last_segment_name(ty).is_some() && last_segment_name(ty) == last_segment_name(self_ty)
}

/// 构造函数的返回形式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnShape {
    /// 返回自身类型
    Plain,
    /// 返回 `Result<Self, E>`
    Fallible,
}

/// 识别构造函数的返回形式，不是构造函数时为 `None`
pub fn return_shape(output: &ReturnType, self_ty: &Type) -> Option<ReturnShape> {
    let ReturnType::Type(_, ty) = output else {
        return None;
    };
    if is_self_type(ty, self_ty) {
        return Some(ReturnShape::Plain);
    }
    match generic_argument(ty, "Result") {
        Some(inner) if is_self_type(inner, self_ty) => Some(ReturnShape::Fallible),
        _ => None,
    }
}

/// 是否带有指定名称的属性
pub fn has_attribute(attrs: &[Attribute], name: &str) -> bool {
    attrs.iter().any(|attr| attr.path().is_ident(name))
}

/// 移除指定名称的属性
pub fn strip_attributes(attrs: &mut Vec<Attribute>, names: &[&str]) {
    attrs.retain(|attr| !names.iter().any(|name| attr.path().is_ident(name)));
}
