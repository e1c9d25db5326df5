//! 演示组件

use ioc_common::Injected;
use ioc_macros::component;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::info;

/// 序号生成器
pub struct SequenceGenerator {
    next: AtomicU64,
}

#[component]
impl SequenceGenerator {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// 取下一个序号
    pub fn next(&self) -> u64 {
        self.next.fetch_add(1, Ordering::SeqCst)
    }

    #[post_construct]
    fn ready(&self) {
        info!("序号生成器已就绪");
    }
}

/// 订单仓储
pub struct OrderRepository {
    sequence: Arc<SequenceGenerator>,
}

#[component(name = "orders")]
impl OrderRepository {
    #[inject]
    pub fn new(sequence: Arc<SequenceGenerator>) -> Self {
        Self { sequence }
    }

    /// 保存订单，返回订单号
    pub fn save(&self, item: &str) -> u64 {
        let id = self.sequence.next();
        info!("保存订单 #{}: {}", id, item);
        id
    }
}

/// 结算服务
pub struct CheckoutService {
    orders: Injected<OrderRepository>,
}

#[component]
impl CheckoutService {
    #[inject]
    pub fn new(#[qualifier("orders")] orders: Injected<OrderRepository>) -> Self {
        Self { orders }
    }

    /// 下单
    pub fn checkout(&self, item: &str) -> Result<u64, ioc_common::DependencyError> {
        Ok(self.orders.get()?.save(item))
    }

    #[pre_hook]
    fn announce(&self) {
        info!("结算服务即将发布");
    }

    #[post_construct]
    fn warm_up(&self) -> Result<(), ioc_common::DependencyError> {
        self.orders.get().map(|_| ())
    }
}
