//! 契约测试共享的委托执行器与挂起原语。
#![allow(dead_code)]

use std::{
    any::Any,
    future::Future,
    panic::AssertUnwindSafe,
    pin::Pin,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    task::{Context, Poll},
};

use futures::{
    FutureExt,
    channel::oneshot,
    executor::ThreadPool,
    future::{AbortHandle, Abortable},
};
use kiln_core::{
    BoxFuture, JoinHandle, TaskCancellationStrategy, TaskError, TaskExecutor, TaskHandle,
    TaskResult, async_trait,
};

/// 基于 `futures` 线程池的最小委托执行器。
///
/// 被唤醒的任务会重新进入线程池队列，由任意空闲工作线程继续轮询，
/// 因而同一任务的多次恢复可能落在不同线程上。
pub struct PoolExecutor {
    pool: ThreadPool,
}

impl PoolExecutor {
    pub fn new(workers: usize) -> Self {
        let pool = ThreadPool::builder()
            .pool_size(workers)
            .name_prefix("kiln-test-worker-")
            .create()
            .expect("线程池应创建成功");
        Self { pool }
    }
}

impl TaskExecutor for PoolExecutor {
    fn spawn_dyn(
        &self,
        fut: BoxFuture<'static, TaskResult<Box<dyn Any + Send>>>,
    ) -> JoinHandle<Box<dyn Any + Send>> {
        let state = Arc::new(PoolTaskState::default());
        let (abort, registration) = AbortHandle::new_pair();
        let (tx, rx) = oneshot::channel();

        let task_state = Arc::clone(&state);
        let task = async move {
            let outcome = Abortable::new(AssertUnwindSafe(fut).catch_unwind(), registration).await;
            let result = match outcome {
                Ok(Ok(result)) => result,
                Ok(Err(_)) => Err(TaskError::Panicked),
                Err(_) => Err(TaskError::Cancelled),
            };
            task_state.finished.store(true, Ordering::Release);
            let _ = tx.send(result);
        };
        self.pool.spawn_ok(task);

        JoinHandle::from_task_handle(Box::new(PoolTaskHandle {
            state,
            abort,
            rx: Mutex::new(Some(rx)),
        }))
    }
}

#[derive(Default)]
struct PoolTaskState {
    finished: AtomicBool,
    cancelled: AtomicBool,
}

struct PoolTaskHandle {
    state: Arc<PoolTaskState>,
    abort: AbortHandle,
    rx: Mutex<Option<oneshot::Receiver<TaskResult<Box<dyn Any + Send>>>>>,
}

#[async_trait]
impl TaskHandle for PoolTaskHandle {
    type Output = Box<dyn Any + Send>;

    fn cancel(&self, strategy: TaskCancellationStrategy) {
        if strategy != TaskCancellationStrategy::Forceful
            || self.state.finished.load(Ordering::Acquire)
        {
            return;
        }
        self.state.cancelled.store(true, Ordering::Release);
        self.abort.abort();
    }

    fn is_finished(&self) -> bool {
        self.state.finished.load(Ordering::Acquire)
    }

    fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::Acquire)
    }

    fn id(&self) -> Option<&str> {
        None
    }

    fn detach(self: Box<Self>) {}

    async fn join(self: Box<Self>) -> TaskResult<Self::Output> {
        let rx = self.rx.lock().unwrap().take();
        match rx {
            Some(rx) => rx.await.unwrap_or(Err(TaskError::ExecutorTerminated)),
            None => Err(TaskError::ExecutorTerminated),
        }
    }
}

/// 已关闭的执行器：拒绝所有任务，用于验证派发失败原样透传。
pub struct ClosedExecutor;

impl TaskExecutor for ClosedExecutor {
    fn spawn_dyn(
        &self,
        fut: BoxFuture<'static, TaskResult<Box<dyn Any + Send>>>,
    ) -> JoinHandle<Box<dyn Any + Send>> {
        drop(fut);
        JoinHandle::from_task_handle(Box::new(RejectedHandle))
    }
}

struct RejectedHandle;

#[async_trait]
impl TaskHandle for RejectedHandle {
    type Output = Box<dyn Any + Send>;

    fn cancel(&self, _strategy: TaskCancellationStrategy) {}

    fn is_finished(&self) -> bool {
        true
    }

    fn is_cancelled(&self) -> bool {
        false
    }

    fn id(&self) -> Option<&str> {
        Some("rejected")
    }

    fn detach(self: Box<Self>) {}

    async fn join(self: Box<Self>) -> TaskResult<Self::Output> {
        Err(TaskError::ExecutorTerminated)
    }
}

/// 让出一次执行权：首次轮询返回 `Pending` 并立即唤醒自身。
pub fn yield_now() -> YieldNow {
    YieldNow { yielded: false }
}

pub struct YieldNow {
    yielded: bool,
}

impl Future for YieldNow {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.yielded {
            Poll::Ready(())
        } else {
            self.yielded = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}

/// 当前线程名，线程池线程带 `kiln-test-worker-` 前缀。
pub fn thread_name() -> String {
    std::thread::current().name().unwrap_or("<unnamed>").to_owned()
}
