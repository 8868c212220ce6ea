#![deny(unsafe_code)]
#![doc = "kiln-core: 异步网络 IO 支撑层的运行时无关核心契约。"]
#![doc = ""]
#![doc = "== 组成 =="]
#![doc = "1. [`buffer`]：按上一次读取的填充情况在固定尺寸表上逐级爬坡的接收缓冲尺寸策略。"]
#![doc = "2. [`context`]：工作线程本地的上下文槽位，以及按“每次恢复执行”安装/清理上下文的 Future 包装。"]
#![doc = "3. [`interceptor`]：显式恢复原语（continuation）层面的拦截器，委托方决定由哪个工作线程执行恢复。"]
#![doc = "4. [`runtime`]：任务执行器契约与 [`InterceptingExecutor`]，把上下文括号挂到每个被提交的任务上。"]
#![doc = ""]
#![doc = "本 crate 不创建线程、不实现传输协议，也不解释上下文数据的含义；宿主运行时适配位于 `kiln-rt-tokio`。"]

pub mod buffer;
pub mod config;
pub mod context;
pub mod error;
pub mod interceptor;
pub mod runtime;

pub use async_trait::async_trait;

pub use buffer::{AdaptiveBufferSizer, BufferSizeTable, BufferTableError, DEFAULT_BUFFER_SIZES};
pub use config::{AdaptiveBufferConfig, ConfigError};
pub use context::{ContextCell, ContextFuture, ContextGuard, WithContext};
pub use error::{CoreError, ErrorCategory, ErrorCause, Result, codes};
pub use interceptor::{
    BoxContinuation, BracketedContinuation, Continuation, ContinuationInterceptor,
    InlineInterceptor, InterceptingContext,
};
pub use runtime::{
    InterceptingExecutor, JoinHandle, TaskCancellationStrategy, TaskError, TaskExecutor,
    TaskHandle, TaskResult,
};

use core::{future::Future, pin::Pin};

/// `BoxFuture` 是执行器契约在对象安全路径上使用的通用 Future 包装。
///
/// # 契约说明（What）
/// - 约束 Future 为 `Send + 'a`，可安全跨线程迁移，满足“恢复可能发生在任意工作线程”的前提。
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
