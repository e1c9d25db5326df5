//! # 组件扫描演示
//!
//! 扫描一个命名空间下的 `#[component]` 类型，初始化容器并列出已注册的组件

mod components;

use anyhow::Context;
use clap::Parser;
use components::CheckoutService;
use ioc_common::ContainerConfig;
use ioc_di::Container;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "component-scan-demo")]
#[command(about = "Lorn IoC 组件扫描演示")]
struct Args {
    /// 要扫描的命名空间
    #[arg(short, long, default_value = "component_scan_demo::components")]
    namespace: String,

    /// 容器配置文件路径（.toml 或 .json）
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 日志级别，`RUST_LOG` 优先
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 初始化日志
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = match &args.config {
        Some(path) => ContainerConfig::from_file(path)
            .with_context(|| format!("加载容器配置失败: {}", path.display()))?,
        None => ContainerConfig::default(),
    };

    let container = Container::with_config(config);
    let report = container
        .scan_and_register_components(&args.namespace)
        .with_context(|| format!("扫描命名空间失败: {}", args.namespace))?;
    for (name, error) in &report.failed {
        warn!("组件 {} 注册失败: {}", name, error);
    }

    let activated = container.initialize();
    info!("容器 {} 就绪，最终激活 {} 个实例", container.id(), activated);

    for name in container.get_instance_class_names() {
        println!("{name}");
    }

    if let Some(checkout) = container.get_instance::<CheckoutService>() {
        let order = checkout.checkout("示例商品")?;
        info!("演示下单完成，订单号 {}", order);
    }

    Ok(())
}
