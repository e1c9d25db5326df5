//! 两阶段构建器的集成测试


use common::*;
use ioc_common::{ComponentDescriptor, ComponentError, Constructor, ContainerConfig, DescriptorTable};
use ioc_di::ContainerBuilder;
use std::sync::Arc;

#[test]
fn test_builder_eliminates_ordering_hazard() {
    init_tracing();
    // Beta 先于 Alpha 登记，构建器仍然先注册 Alpha
    let container = ContainerBuilder::new()
        .add_descriptor(beta())
        .add_descriptor(alpha())
        .build()
        .unwrap();

    let alpha = container.get_instance::<Alpha>().unwrap();
    let beta = container.get_instance::<Beta>().unwrap();
    assert!(Arc::ptr_eq(beta.alpha.get().unwrap(), &alpha));
    assert_eq!(
        container.get_instance_class_names(),
        vec![
            std::any::type_name::<Alpha>().to_string(),
            std::any::type_name::<Beta>().to_string(),
        ]
    );
    assert_eq!(alpha.starts(), 1);
}

#[test]
fn test_builder_combines_scanned_and_explicit_descriptors() {
    init_tracing();
    let table = DescriptorTable::new().with("app::services", beta());
    let log = EventLog::default();

    let container = ContainerBuilder::new()
        .with_discovery(Arc::new(table))
        .scan("app")
        .add_descriptor(alpha())
        .add_descriptor(alpha())
        .post_processor(Arc::new(Recorder {
            label: "built",
            log: log.clone(),
        }))
        .build()
        .unwrap();

    assert_eq!(container.len(), 2);
    assert_eq!(log.events().len(), 2);
    assert!(container.get_instance::<Beta>().unwrap().alpha.is_resolved());
}

#[test]
fn test_builder_resolves_qualifiers() {
    init_tracing();
    let container = ContainerBuilder::new()
        .add_descriptor(reader("replica"))
        .add_descriptor(repo(Some("replica"), "replica"))
        .add_descriptor(repo(None, "default"))
        .build()
        .unwrap();

    let reader = container.get_instance::<Reader>().unwrap();
    assert_eq!(reader.repo.as_ref().unwrap().label, "replica");
}

#[test]
fn test_builder_reports_cycle_chain() {
    init_tracing();
    let node = |name: &'static str, next: &'static str| {
        ComponentDescriptor::builder::<Gamma>()
            .named(name)
            .constructor(
                Constructor::new("new")
                    .qualified::<Gamma>(next)
                    .build(|_| Ok(Gamma { built_by: "cycle" })),
            )
            .build()
    };

    let result = ContainerBuilder::new()
        .add_descriptor(alpha())
        .add_descriptor(node("a", "b"))
        .add_descriptor(node("b", "c"))
        .add_descriptor(node("c", "a"))
        .build();

    match result {
        Err(ComponentError::CircularDependency { cycle }) => assert_eq!(cycle, "a -> b -> c -> a"),
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn test_builder_fails_fast() {
    init_tracing();
    assert!(matches!(
        ContainerBuilder::new().add_descriptor(beta()).build(),
        Err(ComponentError::UnresolvedDependency { .. })
    ));
    assert!(matches!(
        ContainerBuilder::new().add_descriptor(alpha()).add_descriptor(broken()).build(),
        Err(ComponentError::InstantiationFailed { .. })
    ));
    assert!(ContainerBuilder::new().scan("nowhere").build().unwrap_err().is_scan_error());
}

#[test]
fn test_builder_applies_config() {
    init_tracing();
    let config = ContainerConfig::default().with_strict_dependencies(true);
    let container = ContainerBuilder::new()
        .with_config(config.clone())
        .add_descriptor(gamma())
        .build()
        .unwrap();

    assert_eq!(container.config(), &config);
    assert_eq!(container.get_instance::<Gamma>().unwrap().built_by, "primary");
}
