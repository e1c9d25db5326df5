//! 钩子链与外部处理器的集成测试


use common::*;
use ioc_common::{ComponentProcessor, ComponentRef, ContainerConfig, DescriptorTable, DynError, HookChainMode};
use ioc_di::Container;
use std::sync::Arc;

fn container(mode: HookChainMode) -> Container {
    init_tracing();
    Container::with_config(ContainerConfig::default().with_hook_chain_mode(mode))
}

#[test]
fn test_per_type_hooks_run_only_for_their_owner() {
    let log = EventLog::default();
    let container = container(HookChainMode::PerType);

    container.register(hooked("x", &log)).unwrap();
    container.register(hooked("y", &log)).unwrap();

    assert_eq!(
        log.events(),
        vec!["x.pre", "x.post", "x.init", "y.pre", "y.post", "y.init"]
    );
}

#[test]
fn test_accumulated_hooks_rerun_on_every_registration() {
    let log = EventLog::default();
    let container = container(HookChainMode::Accumulated);

    container.register(hooked("x", &log)).unwrap();
    container.register(hooked("y", &log)).unwrap();

    assert_eq!(
        log.events(),
        vec!["x.pre", "x.post", "x.init", "x.pre", "y.pre", "x.post", "y.post", "y.init"]
    );
}

#[test]
fn test_processors_run_before_own_hooks() {
    let log = EventLog::default();
    let container = container(HookChainMode::PerType);
    container.add_component_pre_processor(Arc::new(Recorder {
        label: "pre",
        log: log.clone(),
    }));
    container.add_component_post_processor(Arc::new(Recorder {
        label: "post",
        log: log.clone(),
    }));

    container.register(hooked("x", &log)).unwrap();

    assert_eq!(log.events(), vec!["pre:x", "x.pre", "post:x", "x.post", "x.init"]);
}

#[test]
fn test_processor_fires_on_every_later_registration() {
    let log = EventLog::default();
    let container = container(HookChainMode::PerType);

    container.register(hooked("x", &log)).unwrap();
    container.add_component_post_processor(Arc::new(Recorder {
        label: "audit",
        log: log.clone(),
    }));
    container.register(hooked("y", &log)).unwrap();
    container.register(hooked("z", &log)).unwrap();

    assert_eq!(log.count("audit:x"), 0);
    assert_eq!(log.count("audit:y"), 1);
    assert_eq!(log.count("audit:z"), 1);
}

#[test]
fn test_failing_hooks_do_not_abort_registration() {
    let log = EventLog::default();
    let table = DescriptorTable::new()
        .with("fragile", fragile(&log))
        .with("fragile", alpha());
    let container = container(HookChainMode::PerType).with_discovery(Arc::new(table));

    let report = container.scan_and_register_components("fragile").unwrap();

    assert!(report.is_success());
    assert_eq!(report.registered.len(), 2);
    assert!(container.get_instance::<Fragile>().is_some());
    assert_eq!(log.events(), vec!["fragile.init"]);
    assert_eq!(container.get_instance::<Alpha>().unwrap().starts(), 1);
}

#[test]
fn test_failing_post_construct_is_not_retried() {
    let table = DescriptorTable::new()
        .with("stubborn", stubborn())
        .with("stubborn", alpha());
    let container = container(HookChainMode::PerType).with_discovery(Arc::new(table));

    let report = container.scan_and_register_components("stubborn").unwrap();

    assert!(report.is_success());
    assert_eq!(report.registered.len(), 2);
    let stubborn = container.get_instance::<Stubborn>().unwrap();
    assert_eq!(stubborn.attempts(), 2);
    assert_eq!(container.get_instance::<Alpha>().unwrap().starts(), 1);

    // 已经执行过（即使失败）的实例不会在初始化时重试
    assert_eq!(container.initialize(), 0);
    assert_eq!(stubborn.attempts(), 2);
}

struct Grumpy;

impl ComponentProcessor for Grumpy {
    fn name(&self) -> &str {
        "grumpy"
    }

    fn process(&self, component: &ComponentRef<'_>) -> Result<(), DynError> {
        if component.downcast_ref::<Alpha>().is_some() {
            panic!("不处理 Alpha");
        }
        Err(format!("拒绝 {}", component.name).into())
    }
}

#[test]
fn test_failing_processor_is_isolated() {
    let log = EventLog::default();
    let container = container(HookChainMode::Accumulated);
    container.add_component_pre_processor(Arc::new(Grumpy));
    container.add_component_pre_processor(Arc::new(Recorder {
        label: "after-grumpy",
        log: log.clone(),
    }));

    container.register(alpha()).unwrap();
    container.register(gamma()).unwrap();

    assert_eq!(container.len(), 2);
    assert_eq!(log.count(&format!("after-grumpy:{}", std::any::type_name::<Alpha>())), 1);
    assert_eq!(log.count(&format!("after-grumpy:{}", std::any::type_name::<Gamma>())), 1);
}

#[test]
fn test_register_instance_skips_hook_chains() {
    let log = EventLog::default();
    let container = container(HookChainMode::PerType);
    container.add_component_pre_processor(Arc::new(Recorder {
        label: "pre",
        log: log.clone(),
    }));

    let prebuilt = Arc::new(Hooked {
        tag: "manual",
        log: log.clone(),
    });
    container
        .register_instance(hooked("manual", &log), Arc::clone(&prebuilt))
        .unwrap();
    assert!(log.events().is_empty());

    assert_eq!(container.initialize(), 1);
    assert_eq!(log.events(), vec!["manual.init"]);
    assert!(Arc::ptr_eq(&container.get_named::<Hooked>("manual").unwrap(), &prebuilt));
}
