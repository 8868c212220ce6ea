use std::{any::Any, fmt, sync::Arc};

use super::{
    executor::TaskExecutor,
    task::{JoinHandle, TaskResult},
};
use crate::{
    BoxFuture,
    context::{ContextCell, ContextFuture},
};

/// 为每个提交的任务附加上下文括号的执行器包装。
///
/// # 教案式注释
///
/// ## 意图 (Why)
/// - 调度层只需把原有执行器、上下文值与目标槽位交给本类型，即可得到一个新的执行器：
///   其上运行的任务在每次被恢复时都能通过 [`ContextCell::current`] 读到绑定值。
///
/// ## 逻辑 (How)
/// - `spawn_dyn` 把任务包装为 [`ContextFuture`] 后原样交给委托执行器；
/// - 选择工作线程、排队与唤醒全部由委托执行器负责，本类型不做任何调度决策。
///
/// ## 契约 (What)
/// - 同一执行器提交的所有任务共享同一绑定值；需要不同值时使用 [`rebind`](Self::rebind)
///   派生共享委托的兄弟执行器；
/// - 任务失败（`Err` 输出或 panic）与委托执行器的派发失败均经由 [`JoinHandle`] 原样返回。
pub struct InterceptingExecutor<E: ?Sized, D: 'static> {
    delegate: Arc<E>,
    cell: &'static ContextCell<D>,
    data: D,
}

impl<E: ?Sized, D: 'static> InterceptingExecutor<E, D> {
    pub fn new(delegate: Arc<E>, cell: &'static ContextCell<D>, data: D) -> Self {
        Self {
            delegate,
            cell,
            data,
        }
    }

    /// 派生一个绑定到新值、共享同一委托执行器的兄弟执行器。
    pub fn rebind(&self, data: D) -> Self {
        Self {
            delegate: Arc::clone(&self.delegate),
            cell: self.cell,
            data,
        }
    }

    pub fn delegate(&self) -> &Arc<E> {
        &self.delegate
    }

    pub fn data(&self) -> &D {
        &self.data
    }
}

impl<E, D> TaskExecutor for InterceptingExecutor<E, D>
where
    E: TaskExecutor + ?Sized,
    D: Clone + Send + Sync + 'static,
{
    fn spawn_dyn(
        &self,
        fut: BoxFuture<'static, TaskResult<Box<dyn Any + Send>>>,
    ) -> JoinHandle<Box<dyn Any + Send>> {
        let bracketed = ContextFuture::new(fut, self.cell, self.data.clone());
        self.delegate.spawn_dyn(Box::pin(bracketed))
    }
}

impl<E: ?Sized, D: fmt::Debug + 'static> fmt::Debug for InterceptingExecutor<E, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptingExecutor")
            .field("data", &self.data)
            .finish_non_exhaustive()
    }
}
