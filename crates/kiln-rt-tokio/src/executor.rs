use std::{
    any::Any,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
};

use async_trait::async_trait;
use kiln_core::{
    BoxFuture, CoreError, ErrorCategory, JoinHandle, TaskCancellationStrategy, TaskError,
    TaskExecutor, TaskHandle, TaskResult,
};
use tokio::runtime::Handle;

use crate::error::codes;

/// 以 Tokio 运行时句柄实现的委托执行器。
///
/// # 教案式注释
///
/// ## 意图 (Why)
/// - Tokio 多线程调度器会在工作线程之间窃取任务，同一任务的相邻两次轮询可能落在不同线程上，
///   这正是上下文括号需要覆盖的场景；
/// - 把运行时句柄包装为 [`TaskExecutor`]，即可直接作为 `InterceptingExecutor` 的委托方。
///
/// ## 逻辑 (How)
/// - `spawn_dyn` 直接调用 [`Handle::spawn`]，不做额外排队；
/// - 句柄把 Tokio `JoinError` 翻译为 [`TaskError`]：panic → `Panicked`，abort → `Cancelled`，
///   运行时关闭导致的取消同样表现为 `Cancelled`。
///
/// ## 契约 (What)
/// - `Forceful` 取消仅对尚未结束的任务生效：调用 `abort` 并记录取消标记，任务在下一个挂起点被丢弃；
/// - Tokio 没有协作式取消，`Cooperative` 为空操作，`is_cancelled` 保持 `false`；
/// - `id` 为进程内递增编号，仅用于调试输出。
#[derive(Clone, Debug)]
pub struct TokioExecutor {
    handle: Handle,
}

impl TokioExecutor {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// 从当前线程所在的 Tokio 运行时构造执行器。
    ///
    /// 不在运行时上下文中调用时返回 `kiln.rt.no_runtime`。
    pub fn try_current() -> kiln_core::Result<Self> {
        Handle::try_current().map(Self::new).map_err(|err| {
            CoreError::new(codes::NO_RUNTIME, "not inside a tokio runtime")
                .with_category(ErrorCategory::NonRetryable)
                .with_cause(err)
        })
    }
}

impl TaskExecutor for TokioExecutor {
    fn spawn_dyn(
        &self,
        fut: BoxFuture<'static, TaskResult<Box<dyn Any + Send>>>,
    ) -> JoinHandle<Box<dyn Any + Send>> {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        let id = format!("tokio-{}", NEXT_ID.fetch_add(1, Ordering::Relaxed));
        let task = self.handle.spawn(fut);
        tracing::trace!(target: "kiln::rt", task = %id, "spawned");
        JoinHandle::from_task_handle(Box::new(TokioTaskHandle {
            id,
            task,
            cancelled: Arc::new(AtomicBool::new(false)),
        }))
    }
}

struct TokioTaskHandle {
    id: String,
    task: tokio::task::JoinHandle<TaskResult<Box<dyn Any + Send>>>,
    cancelled: Arc<AtomicBool>,
}

#[async_trait]
impl TaskHandle for TokioTaskHandle {
    type Output = Box<dyn Any + Send>;

    fn cancel(&self, strategy: TaskCancellationStrategy) {
        if strategy != TaskCancellationStrategy::Forceful || self.task.is_finished() {
            return;
        }
        self.cancelled.store(true, Ordering::Release);
        self.task.abort();
    }

    fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    fn id(&self) -> Option<&str> {
        Some(&self.id)
    }

    fn detach(self: Box<Self>) {}

    async fn join(self: Box<Self>) -> TaskResult<Self::Output> {
        let this = *self;
        match this.task.await {
            Ok(result) => result,
            Err(err) if err.is_panic() => Err(TaskError::Panicked),
            Err(err) if err.is_cancelled() => Err(TaskError::Cancelled),
            Err(_) => Err(TaskError::ExecutorTerminated),
        }
    }
}
