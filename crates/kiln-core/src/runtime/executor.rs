use std::{any::Any, borrow::Cow, future::Future, sync::Arc};

use super::task::{JoinHandle, TaskError, TaskResult};
use crate::BoxFuture;

/// `TaskExecutor` 定义委托调度器的任务提交契约。
///
/// # 设计背景（Why）
/// - kiln 不创建也不管理工作线程；真正决定“由哪个线程恢复任务”的是宿主执行器。
///   本 trait 是宿主执行器暴露给核心层的唯一入口，[`InterceptingExecutor`](super::InterceptingExecutor)
///   正是包在它外面完成上下文括号。
///
/// # 逻辑解析（How）
/// - `spawn_dyn` 为对象安全入口，返回值以 `Box<dyn Any + Send>` 擦除；
/// - `spawn` 为泛型默认实现，通过 [`JoinHandle::map`] 在完成时 `downcast` 回原始类型。
///
/// # 契约说明（What）
/// - **前置条件**：`fut` 满足 `Send + 'static`，可在任意工作线程上被轮询；
/// - **后置条件**：`JoinHandle::join` 返回时任务已经结束；派发失败（如执行器已关闭）
///   以 [`TaskError::ExecutorTerminated`] 经由句柄原样交还调用方。
pub trait TaskExecutor: Send + Sync + 'static {
    /// 对象安全的任务提交接口。
    fn spawn_dyn(
        &self,
        fut: BoxFuture<'static, TaskResult<Box<dyn Any + Send>>>,
    ) -> JoinHandle<Box<dyn Any + Send>>;

    /// 泛型化的任务提交入口，直接获得带类型的 [`JoinHandle`]。
    fn spawn<F>(&self, fut: F) -> JoinHandle<F::Output>
    where
        Self: Sized,
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let erased = async move {
            let value = fut.await;
            Ok::<Box<dyn Any + Send>, TaskError>(Box::new(value))
        };
        let handle = self.spawn_dyn(Box::pin(erased));
        handle.map(|result| {
            result.and_then(|boxed| {
                boxed
                    .downcast::<F::Output>()
                    .map(|value| *value)
                    .map_err(|_| TaskError::Failed(Cow::from("join handle type mismatch")))
            })
        })
    }
}

impl<E> TaskExecutor for Arc<E>
where
    E: TaskExecutor + ?Sized,
{
    fn spawn_dyn(
        &self,
        fut: BoxFuture<'static, TaskResult<Box<dyn Any + Send>>>,
    ) -> JoinHandle<Box<dyn Any + Send>> {
        (**self).spawn_dyn(fut)
    }
}
