//! 容器注册与解析的集成测试


use common::*;
use ioc_common::{ComponentError, ContainerConfig, DependencyError, DescriptorTable};
use ioc_di::{Container, Registration};
use std::sync::Arc;

fn app_table() -> DescriptorTable {
    DescriptorTable::new()
        .with("app::core", alpha())
        .with("app::services", beta())
        .with("app::services", gamma())
}

fn scanned(table: DescriptorTable) -> Container {
    init_tracing();
    let container = Container::new().with_discovery(Arc::new(table));
    let report = container.scan_and_register_components("app").unwrap();
    assert!(report.is_success());
    container
}

#[test]
fn test_forward_order_resolves_same_instance() {
    let container = scanned(app_table());

    let alpha = container.get_instance::<Alpha>().unwrap();
    let beta = container.get_instance::<Beta>().unwrap();

    assert_eq!(beta.built_by, "new");
    assert!(Arc::ptr_eq(beta.alpha.get().unwrap(), &alpha));
}

#[test]
fn test_reversed_manual_order_leaves_absent_reference() {
    init_tracing();
    let container = Container::new();

    container.register(beta()).unwrap();
    container.register(alpha()).unwrap();

    let beta = container.get_instance::<Beta>().unwrap();
    assert!(!beta.alpha.is_resolved());
    assert!(matches!(beta.alpha.get(), Err(DependencyError::Unresolved { .. })));
    assert!(container.get_instance::<Alpha>().is_some());
}

#[test]
fn test_batch_continues_after_instantiation_failure() {
    init_tracing();
    let table = DescriptorTable::new()
        .with("batch", alpha())
        .with("batch", broken())
        .with("batch", gamma());
    let container = Container::new().with_discovery(Arc::new(table));

    let report = container.scan_and_register_components("batch").unwrap();

    assert_eq!(report.failed.len(), 1);
    assert!(matches!(
        report.failed[0].1,
        ComponentError::InstantiationFailed { .. }
    ));
    assert_eq!(
        container.get_instance_class_names(),
        vec![
            std::any::type_name::<Alpha>().to_string(),
            std::any::type_name::<Gamma>().to_string(),
        ]
    );
}

#[test]
fn test_containers_are_isolated() {
    let first = scanned(app_table());
    let second = scanned(app_table());

    assert!(!Arc::ptr_eq(
        &first.get_instance::<Alpha>().unwrap(),
        &second.get_instance::<Alpha>().unwrap()
    ));
    assert!(!Arc::ptr_eq(
        &first.get_instance::<Beta>().unwrap(),
        &second.get_instance::<Beta>().unwrap()
    ));
    assert!(!Arc::ptr_eq(
        &first.get_instance::<Gamma>().unwrap(),
        &second.get_instance::<Gamma>().unwrap()
    ));
    assert_ne!(first.id(), second.id());
}

#[test]
fn test_registration_is_idempotent() {
    let container = scanned(app_table());
    let first = container.get_instance::<Alpha>().unwrap();

    assert_eq!(container.register(alpha()).unwrap(), Registration::AlreadyRegistered);

    let report = container.scan_and_register_components("app").unwrap();
    assert!(report.registered.is_empty());
    assert_eq!(report.skipped.len(), 3);

    assert_eq!(container.len(), 3);
    assert_eq!(first.starts(), 1);
    assert!(Arc::ptr_eq(&first, &container.get_instance::<Alpha>().unwrap()));
}

#[test]
fn test_constructor_preference_is_stable() {
    for _ in 0..5 {
        let container = scanned(app_table());
        assert_eq!(container.get_instance::<Beta>().unwrap().built_by, "new");
        assert_eq!(container.get_instance::<Gamma>().unwrap().built_by, "primary");
    }
}

#[test]
fn test_qualifier_overrides_static_type() {
    init_tracing();
    let container = Container::new();
    container.register(repo(None, "default")).unwrap();
    container.register(repo(Some("replica"), "replica")).unwrap();
    container.register(reader("replica")).unwrap();

    let reader = container.get_instance::<Reader>().unwrap();
    let replica = container.get_named::<Repo>("replica").unwrap();

    assert_eq!(reader.repo.as_ref().unwrap().label, "replica");
    assert!(Arc::ptr_eq(reader.repo.as_ref().unwrap(), &replica));
    assert_eq!(container.get_instance::<Repo>().unwrap().label, "default");
}

#[test]
fn test_unknown_qualifier_is_absent() {
    init_tracing();
    let container = Container::new();
    container.register(repo(None, "default")).unwrap();
    container.register(reader("missing")).unwrap();

    assert!(container.get_instance::<Reader>().unwrap().repo.is_none());
}

#[test]
fn test_post_construct_runs_once_after_initialize() {
    let container = scanned(app_table());
    let alpha = container.get_instance::<Alpha>().unwrap();
    assert_eq!(alpha.starts(), 1);

    assert_eq!(container.initialize(), 0);
    assert_eq!(container.initialize(), 0);
    assert_eq!(alpha.starts(), 1);
}

#[test]
fn test_reactivate_on_initialize_restores_double_activation() {
    init_tracing();
    let config = ContainerConfig::default().with_reactivate_on_initialize(true);
    let container = Container::with_config(config).with_discovery(Arc::new(app_table()));
    container.scan_and_register_components("app").unwrap();

    container.initialize();
    assert_eq!(container.get_instance::<Alpha>().unwrap().starts(), 2);
}

#[test]
fn test_strict_dependencies_reject_missing_dependency() {
    init_tracing();
    let config = ContainerConfig::default().with_strict_dependencies(true);
    let container = Container::with_config(config);

    match container.register(beta()) {
        Err(ComponentError::UnresolvedDependency { type_name, source }) => {
            assert_eq!(type_name, std::any::type_name::<Beta>());
            assert!(matches!(source, DependencyError::Unresolved { .. }));
        }
        other => panic!("unexpected: {other:?}"),
    }
    assert!(!container.contains(std::any::type_name::<Beta>()));
}

#[test]
fn test_unmarked_type_lenient_and_strict() {
    init_tracing();
    let container = Container::new();
    let unmarked = || {
        ioc_common::ComponentDescriptor::builder::<Gamma>()
            .not_component()
            .build()
    };

    assert_eq!(container.register(unmarked()).unwrap(), Registration::NotAComponent);
    assert!(matches!(
        container.register_strict(unmarked()),
        Err(ComponentError::NotAComponent { .. })
    ));
    assert!(container.is_empty());
}

#[test]
fn test_scan_errors() {
    init_tracing();
    let container = Container::new().with_discovery(Arc::new(app_table()));

    for namespace in ["", "app..core", "elsewhere"] {
        let error = container.scan_and_register_components(namespace).unwrap_err();
        assert!(error.is_scan_error(), "{namespace}: {error}");
    }
}

#[test]
fn test_get_instance_never_instantiates() {
    init_tracing();
    let container = Container::new();

    assert!(container.get_instance::<Alpha>().is_none());
    assert!(container.get_instance_by_name("anything").is_none());
    assert!(container.is_empty());
    assert!(container.get_instance_class_names().is_empty());
}

#[test]
fn test_concurrent_reads_after_startup() {
    let container = Arc::new(scanned(app_table()));
    let expected = container.get_instance::<Alpha>().unwrap();

    std::thread::scope(|scope| {
        for _ in 0..8 {
            let container = Arc::clone(&container);
            let expected = Arc::clone(&expected);
            scope.spawn(move || {
                for _ in 0..100 {
                    let alpha = container.get_instance::<Alpha>().unwrap();
                    assert!(Arc::ptr_eq(&alpha, &expected));
                    let beta = container.get_instance::<Beta>().unwrap();
                    assert!(Arc::ptr_eq(beta.alpha.get().unwrap(), &expected));
                }
            });
        }
    });
}

#[test]
fn test_config_loaded_from_file() -> anyhow::Result<()> {
    use std::io::Write;

    init_tracing();
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile()?;
    writeln!(file, "strict_dependencies = true")?;

    let config = ContainerConfig::from_file(file.path())?;
    let container = Container::with_config(config);
    assert!(container.config().strict_dependencies);
    assert!(container.register(beta()).is_err());
    Ok(())
}
