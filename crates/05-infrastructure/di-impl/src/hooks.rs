//! 钩子链
//!
//! 有序的钩子绑定列表；每个绑定独立调用，单个失败不影响其余绑定

use ioc_common::{invoke_processor, ComponentProcessor, ComponentRef, LifecycleHook};
use std::fmt;
use std::sync::Arc;
use tracing::error;

/// 钩子链阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPhase {
    /// 发布实例之前
    Pre,
    /// 发布实例之后
    Post,
}

impl HookPhase {
    fn processor_label(self) -> &'static str {
        match self {
            Self::Pre => "pre-processor",
            Self::Post => "post-processor",
        }
    }
}

impl fmt::Display for HookPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pre => f.write_str("pre"),
            Self::Post => f.write_str("post"),
        }
    }
}

/// 钩子绑定
#[derive(Clone)]
pub enum HookBinding {
    /// 组件自身声明的钩子方法
    Method(LifecycleHook),
    /// 外部处理器
    Processor(Arc<dyn ComponentProcessor>),
}

impl fmt::Debug for HookBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Method(hook) => write!(f, "Method({}::{})", hook.owner(), hook.method().name),
            Self::Processor(processor) => write!(f, "Processor({})", processor.name()),
        }
    }
}

/// 钩子链执行结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HookReport {
    /// 调用的绑定数
    pub invoked: usize,
    /// 失败的绑定数
    pub failed: usize,
}

impl HookReport {
    /// 合并两次执行结果
    pub fn merge(self, other: Self) -> Self {
        Self {
            invoked: self.invoked + other.invoked,
            failed: self.failed + other.failed,
        }
    }
}

/// 钩子链
#[derive(Debug, Clone, Default)]
pub struct HookChain {
    bindings: Vec<HookBinding>,
}

impl HookChain {
    /// 创建空钩子链
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加钩子方法
    pub fn push_hook(&mut self, hook: LifecycleHook) {
        self.bindings.push(HookBinding::Method(hook));
    }

    /// 追加外部处理器
    pub fn push_processor(&mut self, processor: Arc<dyn ComponentProcessor>) {
        self.bindings.push(HookBinding::Processor(processor));
    }

    /// 把另一条链的绑定追加到末尾
    pub fn append(&mut self, other: HookChain) {
        self.bindings.extend(other.bindings);
    }

    /// 绑定数量
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// 绑定列表
    pub fn bindings(&self) -> &[HookBinding] {
        &self.bindings
    }

    /// 依次调用所有绑定
    ///
    /// 钩子方法绑定的是各自的实例；外部处理器收到正在注册的组件
    pub fn run(&self, phase: HookPhase, subject: &ComponentRef<'_>) -> HookReport {
        let mut report = HookReport::default();
        for binding in &self.bindings {
            report.invoked += 1;
            let succeeded = match binding {
                HookBinding::Method(hook) => hook.invoke(),
                HookBinding::Processor(processor) => {
                    match invoke_processor(processor.as_ref(), phase.processor_label(), subject) {
                        Ok(()) => true,
                        Err(e) => {
                            error!("{}", e);
                            false
                        }
                    }
                }
            };
            if !succeeded {
                report.failed += 1;
            }
        }
        report
    }
}
