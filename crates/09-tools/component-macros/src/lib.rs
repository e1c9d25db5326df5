//! # Component Macros
//!
//! 这个 crate 提供了 `#[component]` 属性宏，它是组件描述符之上的语法糖。
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! use ioc_common::Injected;
//! use ioc_macros::component;
//! use std::sync::Arc;
//!
//! pub struct Repository;
//!
//! #[component]
//! impl Repository {
//!     pub fn new() -> Self {
//!         Self
//!     }
//! }
//!
//! pub struct Service {
//!     repository: Injected<Repository>,
//! }
//!
//! #[component(name = "service")]
//! impl Service {
//!     #[inject]
//!     pub fn new(repository: Injected<Repository>) -> Self {
//!         Self { repository }
//!     }
//!
//!     #[post_construct]
//!     fn start(&self) {}
//! }
//! ```
//!
//! 使用方需要依赖 `ioc-common` 和 `ctor`。

use proc_macro::TokenStream;

mod component;
mod lifecycle;
mod utils;

/// 组件登记宏
///
/// 用在组件类型的固有 impl 块上，生成 `Discoverable` 实现，并在程序启动时
/// 把组件登记到全局组件目录。
///
/// # 参数
///
/// - `singleton` - 单例生命周期（默认）
/// - `scoped` - 作用域生命周期
/// - `transient` - 瞬态生命周期
/// - `name = "custom_name"` - 自定义组件名称，默认为完整类型名
///
/// # 标记
///
/// - `#[inject]` - 可注入构造函数，最多一个；没有时使用第一个声明的构造函数
/// - `#[qualifier("name")]` - 构造参数按组件名称解析
/// - `#[post_construct]` / `#[pre_hook]` / `#[post_hook]` - 只接收 `&self` 的钩子方法
///
/// 构造参数支持 `Injected<T>`、`Option<Arc<T>>` 和 `Arc<T>` 三种形式。
#[proc_macro_attribute]
pub fn component(args: TokenStream, input: TokenStream) -> TokenStream {
    component::component_impl(args, input)
}
