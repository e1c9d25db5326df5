//! `#[component]` 宏与组件目录扫描的集成测试

use ioc_common::{ComponentDescriptor, ComponentError, DependencyError, Lifetime};
use ioc_di::{Container, ContainerBuilder};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

mod shop {
    use super::*;
    use ioc_common::Injected;
    use ioc_macros::component;

    pub struct Inventory {
        pub restocks: AtomicUsize,
    }

    #[component]
    impl Inventory {
        pub fn new() -> Self {
            Self {
                restocks: AtomicUsize::new(0),
            }
        }

        #[post_construct]
        fn restock(&self) {
            self.restocks.fetch_add(1, Ordering::SeqCst);
        }
    }

    pub struct Pricing {
        pub currency: &'static str,
    }

    #[component(name = "pricing")]
    impl Pricing {
        pub fn new() -> Self {
            Self::with_currency("CNY")
        }

        pub fn with_currency(currency: &'static str) -> Self {
            Self { currency }
        }
    }

    pub struct Checkout {
        pub inventory: Injected<Inventory>,
        pub pricing: Arc<Pricing>,
        pub coupons: Option<Arc<Coupons>>,
        pub built_by: &'static str,
    }

    /// 从未注册的组件
    pub struct Coupons;

    #[component]
    impl Checkout {
        pub fn offline() -> Result<Self, String> {
            Err("离线模式不可用".to_string())
        }

        #[inject]
        pub fn new(
            inventory: Injected<Inventory>,
            #[qualifier("pricing")] pricing: Arc<Pricing>,
            coupons: Option<Arc<Coupons>>,
        ) -> Self {
            Self {
                inventory,
                pricing,
                coupons,
                built_by: "new",
            }
        }
    }

    pub mod legacy {
        use super::*;

        pub struct Ledger;

        #[component(transient)]
        impl Ledger {
            pub fn new() -> Self {
                Self
            }
        }
    }
}

mod broken {
    use ioc_macros::component;

    pub struct Unreachable;

    #[component]
    impl Unreachable {
        pub fn new() -> Result<Self, std::io::Error> {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "缺少资源"))
        }
    }
}

fn namespace(module: &str) -> String {
    format!("{}::{}", module_path!(), module)
}

#[test]
fn test_macro_generates_descriptor() {
    let descriptor = ComponentDescriptor::of::<shop::Checkout>();

    assert_eq!(descriptor.name, std::any::type_name::<shop::Checkout>());
    assert_eq!(descriptor.lifetime, Lifetime::Singleton);
    assert_eq!(descriptor.constructors.len(), 2);

    let constructor = descriptor.select_constructor().unwrap();
    assert_eq!(constructor.name, "new");
    assert_eq!(constructor.parameters.len(), 3);
    assert_eq!(constructor.parameters[1].qualifier(), Some("pricing"));

    let pricing = ComponentDescriptor::of::<shop::Pricing>();
    assert_eq!(pricing.name, "pricing");
    // with_currency 的参数无法注入，是普通辅助函数
    assert_eq!(pricing.constructors.len(), 1);
    assert_eq!(pricing.select_constructor().unwrap().name, "new");
    assert_eq!(
        ComponentDescriptor::of::<shop::legacy::Ledger>().lifetime,
        Lifetime::Transient
    );
}

#[test]
fn test_scan_registers_annotated_components() {
    let container = Container::new();
    let report = container.scan_and_register_components(&namespace("shop")).unwrap();

    // Ledger 是瞬态组件，容器只支持单例
    assert_eq!(report.registered.len(), 3);
    assert_eq!(report.failed.len(), 1);

    let checkout = container.get_instance::<shop::Checkout>().unwrap();
    let inventory = container.get_instance::<shop::Inventory>().unwrap();
    let pricing = container.get_named::<shop::Pricing>("pricing").unwrap();

    assert_eq!(checkout.built_by, "new");
    assert!(Arc::ptr_eq(checkout.inventory.get().unwrap(), &inventory));
    assert!(Arc::ptr_eq(&checkout.pricing, &pricing));
    assert_eq!(pricing.currency, "CNY");
    assert!(checkout.coupons.is_none());

    container.initialize();
    assert_eq!(inventory.restocks.load(Ordering::SeqCst), 1);
}

#[test]
fn test_nested_namespace_scan() {
    let container = Container::new();
    let report = container
        .scan_and_register_components(&namespace("shop::legacy"))
        .unwrap();

    assert!(report.registered.is_empty());
    assert_eq!(report.failed.len(), 1);
}

#[test]
fn test_failing_constructor_from_macro() {
    let container = Container::new();
    let report = container.scan_and_register_components(&namespace("broken")).unwrap();

    assert!(container.is_empty());
    assert_eq!(report.failed.len(), 1);
    assert!(report.failed[0].1.to_string().contains("Unreachable"));
}

#[test]
fn test_unknown_namespace_is_scan_error() {
    let container = Container::new();
    assert!(container
        .scan_and_register_components(&namespace("nowhere"))
        .unwrap_err()
        .is_scan_error());
}

#[test]
fn test_required_dependency_missing() {
    let container = Container::new();
    container.register_type::<shop::Inventory>().unwrap();

    // Pricing 未注册时 Arc<Pricing> 参数让构造失败
    let error = container.register_type::<shop::Checkout>().unwrap_err();
    assert!(error.to_string().contains("Checkout"));

    let source = std::error::Error::source(&error).map(ToString::to_string);
    assert_eq!(
        source,
        Some(
            DependencyError::Unresolved {
                dependency: format!("{} @qualifier(\"pricing\")", std::any::type_name::<shop::Pricing>())
            }
            .to_string()
        )
    );
}

#[test]
fn test_builder_requires_every_parameter() {
    // 构建器在排序阶段要求所有参数都能找到目标，Option 参数也不例外
    let result = ContainerBuilder::new()
        .add_type::<shop::Checkout>()
        .add_type::<shop::Pricing>()
        .add_type::<shop::Inventory>()
        .build();

    match result {
        Err(ComponentError::UnresolvedDependency { type_name, source }) => {
            assert_eq!(type_name, std::any::type_name::<shop::Checkout>());
            assert!(source.to_string().contains("Coupons"));
        }
        Err(other) => panic!("unexpected: {other}"),
        Ok(_) => panic!("构建不应成功"),
    }
}

#[test]
fn test_builder_orders_macro_components() {
    let container = ContainerBuilder::new()
        .add_type::<shop::Pricing>()
        .add_type::<shop::Inventory>()
        .build()
        .unwrap();

    let inventory = container.get_instance::<shop::Inventory>().unwrap();
    assert_eq!(inventory.restocks.load(Ordering::SeqCst), 1);
    assert_eq!(container.len(), 2);
}
