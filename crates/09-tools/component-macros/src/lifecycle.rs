//! 生命周期钩子标记解析

use crate::utils::has_attribute;
use proc_macro2::TokenStream;
use quote::quote;
use syn::{Error, FnArg, Ident, ImplItemFn, Result, Type};

/// 钩子标记属性名称
pub const HOOK_ATTRIBUTES: [&str; 3] = ["post_construct", "pre_hook", "post_hook"];

/// 钩子标记
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookMarker {
    PostConstruct,
    PreHook,
    PostHook,
}

impl HookMarker {
    fn from_attribute(name: &str) -> Option<Self> {
        match name {
            "post_construct" => Some(Self::PostConstruct),
            "pre_hook" => Some(Self::PreHook),
            "post_hook" => Some(Self::PostHook),
            _ => None,
        }
    }

    /// 对应的描述符构建器方法
    fn builder_method(self) -> Ident {
        let name = match self {
            Self::PostConstruct => "post_construct",
            Self::PreHook => "pre_hook",
            Self::PostHook => "post_hook",
        };
        Ident::new(name, proc_macro2::Span::call_site())
    }
}

/// 钩子方法
#[derive(Debug, Clone)]
pub struct HookSpec {
    pub marker: HookMarker,
    pub method: Ident,
}

impl HookSpec {
    /// 生成描述符构建器调用
    pub fn to_builder_call(&self, self_ty: &Type) -> TokenStream {
        let builder_method = self.marker.builder_method();
        let method = &self.method;
        let method_name = method.to_string();
        quote! {
            .#builder_method(#method_name, <#self_ty>::#method)
        }
    }
}

/// 提取方法上的钩子标记
///
/// 钩子方法必须以 `&self` 为唯一参数；一个方法可以带多个标记
pub fn extract_hooks(method: &ImplItemFn) -> Result<Vec<HookSpec>> {
    let markers: Vec<HookMarker> = method
        .attrs
        .iter()
        .filter_map(|attr| attr.path().get_ident())
        .filter_map(|ident| HookMarker::from_attribute(&ident.to_string()))
        .collect();
    if markers.is_empty() {
        return Ok(Vec::new());
    }

    let signature = &method.sig;
    if has_attribute(&method.attrs, "inject") {
        return Err(Error::new_spanned(&signature.ident, "构造函数不能同时是生命周期钩子"));
    }
    let shared_receiver = matches!(
        signature.inputs.first(),
        Some(FnArg::Receiver(receiver)) if receiver.reference.is_some() && receiver.mutability.is_none()
    );
    if !shared_receiver || signature.inputs.len() != 1 {
        return Err(Error::new_spanned(
            &signature.inputs,
            "生命周期钩子必须是只接收 `&self` 的无参方法",
        ));
    }
    if signature.asyncness.is_some() || !signature.generics.params.is_empty() {
        return Err(Error::new_spanned(&signature.ident, "生命周期钩子不能是 async 或泛型方法"));
    }

    Ok(markers
        .into_iter()
        .map(|marker| HookSpec {
            marker,
            method: signature.ident.clone(),
        })
        .collect())
}
