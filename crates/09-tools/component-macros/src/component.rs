//! 组件注册宏实现

use crate::lifecycle::{extract_hooks, HookSpec, HOOK_ATTRIBUTES};
use crate::utils::{generic_argument, has_attribute, last_segment_name, return_shape, strip_attributes, ReturnShape};
use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::{format_ident, quote};
use syn::{
    parse::Parse, parse::ParseStream, parse_macro_input, punctuated::Punctuated, Error, Expr, FnArg, Ident,
    ImplItem, ImplItemFn, ItemImpl, Lit, LitStr, Meta, Result, Signature, Token, Type,
};

/// 组件配置参数
#[derive(Debug, Clone, Default)]
pub struct ComponentArgs {
    /// 生命周期类型
    pub lifetime: ComponentLifetime,
    /// 自定义组件名称
    pub name: Option<String>,
}

/// 组件生命周期类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComponentLifetime {
    #[default]
    Singleton,
    Scoped,
    Transient,
}

impl Parse for ComponentArgs {
    fn parse(input: ParseStream<'_>) -> Result<Self> {
        let mut args = ComponentArgs::default();

        let parsed = Punctuated::<Meta, Token![,]>::parse_terminated(input)?;

        for meta in parsed {
            match meta {
                Meta::Path(path) if path.is_ident("singleton") => args.lifetime = ComponentLifetime::Singleton,
                Meta::Path(path) if path.is_ident("scoped") => args.lifetime = ComponentLifetime::Scoped,
                Meta::Path(path) if path.is_ident("transient") => args.lifetime = ComponentLifetime::Transient,
                Meta::NameValue(nv) if nv.path.is_ident("name") => match nv.value {
                    Expr::Lit(expr_lit) => match expr_lit.lit {
                        Lit::Str(lit_str) => args.name = Some(lit_str.value()),
                        other => return Err(Error::new_spanned(other, "组件名称必须是字符串")),
                    },
                    other => return Err(Error::new_spanned(other, "组件名称必须是字符串")),
                },
                other => return Err(Error::new_spanned(other, "未知的组件参数")),
            }
        }

        Ok(args)
    }
}

/// 构造参数的接收形式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParameterShape {
    /// `Injected<T>`，缺失的依赖在使用时报错
    Injected,
    /// `Option<Arc<T>>`，缺失为 `None`
    Optional,
    /// `Arc<T>`，缺失时构造失败
    Required,
}

impl ParameterShape {
    /// 识别参数形态，返回形态和依赖的目标类型
    fn classify(ty: &Type) -> Option<(Self, &Type)> {
        if let Some(inner) = generic_argument(ty, "Injected") {
            Some((Self::Injected, inner))
        } else if let Some(inner) = generic_argument(ty, "Option").and_then(|option| generic_argument(option, "Arc")) {
            Some((Self::Optional, inner))
        } else {
            generic_argument(ty, "Arc").map(|inner| (Self::Required, inner))
        }
    }
}

/// 构造参数
struct ParameterSpec {
    shape: ParameterShape,
    target: Type,
    qualifier: Option<LitStr>,
}

impl ParameterSpec {
    fn parse(arg: &mut FnArg) -> Result<Self> {
        let FnArg::Typed(typed) = arg else {
            return Err(Error::new_spanned(arg, "构造函数不能带有 self 参数"));
        };

        let mut qualifier = None;
        for attr in &typed.attrs {
            if attr.path().is_ident("qualifier") {
                qualifier = Some(attr.parse_args::<LitStr>()?);
            }
        }
        strip_attributes(&mut typed.attrs, &["qualifier"]);

        let ty = typed.ty.as_ref();
        let Some((shape, target)) = ParameterShape::classify(ty) else {
            return Err(Error::new_spanned(
                ty,
                "构造参数必须是 `Injected<T>`、`Option<Arc<T>>` 或 `Arc<T>`",
            ));
        };

        Ok(Self {
            shape,
            target: target.clone(),
            qualifier,
        })
    }

    fn descriptor_call(&self) -> proc_macro2::TokenStream {
        let target = &self.target;
        match &self.qualifier {
            Some(name) => quote! { .qualified::<#target>(#name) },
            None => quote! { .param::<#target>() },
        }
    }

    fn argument(&self, index: usize) -> proc_macro2::TokenStream {
        let target = &self.target;
        let accessor = match self.shape {
            ParameterShape::Injected => quote! { inject },
            ParameterShape::Optional => quote! { optional },
            ParameterShape::Required => quote! { require },
        };
        quote! { __deps.#accessor::<#target>(#index)? }
    }
}

/// 构造函数
struct ConstructorSpec {
    method: Ident,
    injectable: bool,
    shape: ReturnShape,
    parameters: Vec<ParameterSpec>,
}

impl ConstructorSpec {
    fn parse(method: &mut ImplItemFn, self_ty: &Type) -> Result<Option<Self>> {
        let Some(shape) = return_shape(&method.sig.output, self_ty) else {
            return Ok(None);
        };
        if method.sig.receiver().is_some() {
            return Ok(None);
        }
        let injectable = has_attribute(&method.attrs, "inject");
        // 未标记 #[inject] 且签名无法注入的关联函数是普通辅助函数
        if !injectable && !Self::is_injectable_signature(&method.sig) {
            return Ok(None);
        }
        if method.sig.asyncness.is_some() || !method.sig.generics.params.is_empty() {
            return Err(Error::new_spanned(&method.sig.ident, "构造函数不能是 async 或泛型函数"));
        }

        let parameters = method
            .sig
            .inputs
            .iter_mut()
            .map(ParameterSpec::parse)
            .collect::<Result<Vec<_>>>()?;

        Ok(Some(Self {
            method: method.sig.ident.clone(),
            injectable,
            shape,
            parameters,
        }))
    }

    fn is_injectable_signature(sig: &Signature) -> bool {
        sig.asyncness.is_none()
            && sig.generics.params.is_empty()
            && sig.inputs.iter().all(|arg| match arg {
                FnArg::Typed(typed) => ParameterShape::classify(&typed.ty).is_some(),
                FnArg::Receiver(_) => false,
            })
    }

    fn to_builder_call(&self, self_ty: &Type) -> proc_macro2::TokenStream {
        let method = &self.method;
        let method_name = method.to_string();
        let injectable = self.injectable.then(|| quote! { .injectable() });
        let parameters = self.parameters.iter().map(ParameterSpec::descriptor_call);
        let arguments = self.parameters.iter().enumerate().map(|(index, p)| p.argument(index));
        let call = quote! { <#self_ty>::#method(#(#arguments),*) };
        let body = match self.shape {
            ReturnShape::Plain => quote! { ::std::result::Result::Ok(#call) },
            ReturnShape::Fallible => quote! { #call.map_err(::std::convert::Into::into) },
        };

        quote! {
            .constructor(
                ::ioc_common::Constructor::<#self_ty>::new(#method_name)
                    #injectable
                    #(#parameters)*
                    .build(|__deps: &::ioc_common::Dependencies| { #body })
            )
        }
    }
}

/// 实现 #[component] 宏
pub fn component_impl(args: TokenStream, input: TokenStream) -> TokenStream {
    let component_args = if args.is_empty() {
        ComponentArgs::default()
    } else {
        match syn::parse::<ComponentArgs>(args) {
            Ok(args) => args,
            Err(e) => return e.to_compile_error().into(),
        }
    };

    let item_impl = parse_macro_input!(input as ItemImpl);
    match expand(component_args, item_impl) {
        Ok(expanded) => expanded.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

fn expand(args: ComponentArgs, mut item_impl: ItemImpl) -> Result<proc_macro2::TokenStream> {
    if let Some((_, path, _)) = &item_impl.trait_ {
        return Err(Error::new_spanned(path, "#[component] 只能用在固有 impl 块上"));
    }
    if !item_impl.generics.params.is_empty() {
        return Err(Error::new_spanned(&item_impl.generics, "组件类型不能带有泛型参数"));
    }

    let self_ty = item_impl.self_ty.as_ref().clone();
    let type_name = last_segment_name(&self_ty)
        .ok_or_else(|| Error::new_spanned(&self_ty, "无法识别组件类型"))?;

    let mut constructors = Vec::new();
    let mut hooks: Vec<HookSpec> = Vec::new();
    for item in &mut item_impl.items {
        let ImplItem::Fn(method) = item else {
            continue;
        };
        hooks.extend(extract_hooks(method)?);
        let marked = has_attribute(&method.attrs, "inject");
        match ConstructorSpec::parse(method, &self_ty)? {
            Some(constructor) => constructors.push(constructor),
            None if marked => {
                return Err(Error::new_spanned(
                    &method.sig,
                    "#[inject] 只能标记返回 `Self` 或 `Result<Self, E>` 的关联函数",
                ))
            }
            None => {}
        }
        strip_attributes(&mut method.attrs, &["inject"]);
        strip_attributes(&mut method.attrs, &HOOK_ATTRIBUTES);
    }

    let injectable: Vec<&ConstructorSpec> = constructors.iter().filter(|c| c.injectable).collect();
    if let Some(extra) = injectable.get(1) {
        return Err(Error::new_spanned(&extra.method, "一个组件只能有一个 #[inject] 构造函数"));
    }
    if constructors.is_empty() {
        return Err(Error::new(
            Span::call_site(),
            "组件至少需要一个返回 `Self` 且参数均可注入的关联函数作为构造函数",
        ));
    }

    let named = args.name.map(|name| quote! { .named(#name) });
    let lifetime = match args.lifetime {
        ComponentLifetime::Singleton => quote! { ::ioc_common::Lifetime::Singleton },
        ComponentLifetime::Scoped => quote! { ::ioc_common::Lifetime::Scoped },
        ComponentLifetime::Transient => quote! { ::ioc_common::Lifetime::Transient },
    };
    let constructor_calls = constructors.iter().map(|c| c.to_builder_call(&self_ty));
    let hook_calls = hooks.iter().map(|h| h.to_builder_call(&self_ty));
    let registration_code = generate_registration_code(&self_ty, &type_name);

    Ok(quote! {
        #item_impl

        impl ::ioc_common::Discoverable for #self_ty {
            fn component_descriptor() -> ::ioc_common::ComponentDescriptor {
                ::ioc_common::ComponentDescriptor::builder::<#self_ty>()
                    #named
                    .with_lifetime(#lifetime)
                    #(#constructor_calls)*
                    #(#hook_calls)*
                    .build()
            }
        }

        #registration_code
    })
}

/// 生成组件目录登记代码
fn generate_registration_code(self_ty: &Type, type_name: &str) -> proc_macro2::TokenStream {
    let registration_fn_name = format_ident!("__register_component_{}", type_name.to_lowercase());

    quote! {
        // 使用 ctor 在程序启动时登记组件
        #[::ctor::ctor]
        fn #registration_fn_name() {
            ::ioc_common::submit_component(::ioc_common::CatalogEntry::new(
                ::std::module_path!(),
                #type_name,
                ::std::line!(),
                <#self_ty as ::ioc_common::Discoverable>::component_descriptor,
            ));
        }
    }
}
