//! 委托调度器契约与上下文拦截执行器。
//!
//! # 设计综述（Why）
//! - kiln 只对宿主调度器派发的恢复事件做出反应，不创建、不管理工作线程；
//! - 因此本模块只定义宿主需要实现的 [`TaskExecutor`]/[`TaskHandle`] 契约，
//!   并在其上提供 [`InterceptingExecutor`]：把上下文括号挂到每个被提交任务的每一次恢复上。
//!
//! # 模块结构（How）
//! - `task`：任务句柄、取消策略与错误语义；
//! - `executor`：任务提交契约；
//! - `intercepting`：包装委托执行器的上下文拦截实现。
//!
//! # 风险提示（Trade-offs）
//! - 若宿主直接使用第三方执行器的裸 `spawn` 而绕过本契约，上下文括号不会生效；
//!   宿主适配层（如 `kiln-rt-tokio`）需要以 [`TaskExecutor`] 的形式暴露执行器。

mod executor;
mod intercepting;
mod task;

pub use executor::TaskExecutor;
pub use intercepting::InterceptingExecutor;
pub use task::{JoinHandle, TaskCancellationStrategy, TaskError, TaskHandle, TaskResult};
