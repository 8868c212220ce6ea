use std::{borrow::Cow, fmt};

use crate::async_trait;

/// `TaskCancellationStrategy` 表达取消行为的强度。
///
/// # 契约说明（What）
/// - `Cooperative` 要求任务自行检查取消信号；`Forceful` 则允许运行时在下一个挂起点直接丢弃任务。
///
/// # 风险提示（Trade-offs）
/// - 被丢弃的任务不会再次被恢复，因此不会再触发上下文括号；已在执行中的那一步仍会按守卫语义完成清理。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum TaskCancellationStrategy {
    #[default]
    Cooperative,
    Forceful,
}

/// `TaskResult` 统一表示任务执行结果。
pub type TaskResult<T = ()> = crate::Result<T, TaskError>;

/// `TaskError` 枚举任务失败原因。
///
/// # 设计背景（Why）
/// - 区分取消、执行期 panic、执行器关闭等常见情况，与 Tokio `JoinError` 的语义对齐。
///
/// # 风险提示（Trade-offs）
/// - `Panicked` 仅包含静态信息；若需 panic payload，需在宿主实现层自行捕获。
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TaskError {
    Cancelled,
    Panicked,
    ExecutorTerminated,
    Failed(Cow<'static, str>),
}

impl fmt::Display for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskError::Cancelled => write!(f, "task cancelled"),
            TaskError::Panicked => write!(f, "task panicked"),
            TaskError::ExecutorTerminated => write!(f, "executor terminated"),
            TaskError::Failed(reason) => write!(f, "task failed: {reason}"),
        }
    }
}

impl std::error::Error for TaskError {}

/// `TaskHandle` 定义运行时返回的任务控制句柄。
///
/// # 教案式注释
///
/// ## 意图 (Why)
/// - 执行器（委托方）决定任务在哪个工作线程上被恢复；调用方只通过句柄观测状态、注入取消与等待结果。
///
/// ## 逻辑 (How)
/// - 关联类型 `Output` 表达任务成功完成时的返回值；
/// - 同步方法 `cancel`/`is_finished`/`is_cancelled`/`id` 无需 `await` 即可观测或注入信号；
/// - `detach` 释放控制权，`join` 以异步方式返回 [`TaskResult<Self::Output>`]。
///
/// ## 契约 (What)
/// - **前置条件**：实现者需持有任务生命周期的引用，保证 `detach` 后任务仍可继续运行；
/// - **后置条件**：`join` 返回后句柄即被消费。
#[async_trait]
pub trait TaskHandle: Send + Sync {
    /// 任务完成时返回的值类型。
    type Output: Send + 'static;

    /// 注入取消信号。
    fn cancel(&self, strategy: TaskCancellationStrategy);

    /// 查询任务是否已完成。
    fn is_finished(&self) -> bool;

    /// 查询任务是否因取消而结束；对已结束的任务发出的取消不计入。
    fn is_cancelled(&self) -> bool;

    /// 返回调试用的标识符。
    fn id(&self) -> Option<&str>;

    /// 在不等待结果的情况下释放控制权。
    fn detach(self: Box<Self>);

    /// 等待任务完成并返回统一的执行结果。
    async fn join(self: Box<Self>) -> TaskResult<Self::Output>;
}

/// `JoinHandle` 为 [`TaskExecutor::spawn`](super::TaskExecutor::spawn) 的标准返回类型。
///
/// # 契约说明（What）
/// - 只能由执行器实现构造；
/// - 调用 `join` 或 `detach` 后句柄即失效，`map` 同样会消费内部句柄。
pub struct JoinHandle<T> {
    handle: Option<Box<dyn TaskHandle<Output = T>>>,
}

impl<T: Send + 'static> JoinHandle<T> {
    /// 供执行器实现将内部 [`TaskHandle`] 封装为通用句柄。
    pub fn from_task_handle(handle: Box<dyn TaskHandle<Output = T>>) -> Self {
        Self {
            handle: Some(handle),
        }
    }

    /// 请求运行时取消任务。
    pub fn cancel(&self, strategy: TaskCancellationStrategy) {
        if let Some(handle) = self.handle.as_deref() {
            handle.cancel(strategy);
        }
    }

    /// 查询任务是否已完成；句柄已被消费时视为完成。
    pub fn is_finished(&self) -> bool {
        self.handle
            .as_deref()
            .map(|handle| handle.is_finished())
            .unwrap_or(true)
    }

    /// 查询任务是否因取消而结束。
    pub fn is_cancelled(&self) -> bool {
        self.handle
            .as_deref()
            .map(|handle| handle.is_cancelled())
            .unwrap_or(false)
    }

    /// 返回运行时分配的任务标识。
    pub fn id(&self) -> Option<&str> {
        self.handle.as_deref().and_then(|handle| handle.id())
    }

    /// 分离控制权，允许任务在后台继续运行。
    pub fn detach(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.detach();
        }
    }

    /// 等待任务完成并返回统一的执行结果。
    pub async fn join(mut self) -> TaskResult<T> {
        match self.handle.take() {
            Some(handle) => handle.join().await,
            None => Err(TaskError::ExecutorTerminated),
        }
    }

    /// 将任务结果映射为另一种输出类型，便于在类型擦除后恢复具体值。
    pub fn map<U, F>(mut self, mapper: F) -> JoinHandle<U>
    where
        U: Send + 'static,
        F: FnOnce(TaskResult<T>) -> TaskResult<U> + Send + Sync + 'static,
    {
        JoinHandle::from_task_handle(Box::new(MappedHandle {
            inner: self.handle.take(),
            mapper: Some(mapper),
        }))
    }
}

impl<T> fmt::Debug for JoinHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JoinHandle")
            .field("consumed", &self.handle.is_none())
            .finish()
    }
}

struct MappedHandle<T, U, F>
where
    F: FnOnce(TaskResult<T>) -> TaskResult<U> + Send + Sync + 'static,
{
    inner: Option<Box<dyn TaskHandle<Output = T>>>,
    mapper: Option<F>,
}

#[async_trait]
impl<T, U, F> TaskHandle for MappedHandle<T, U, F>
where
    T: Send + 'static,
    U: Send + 'static,
    F: FnOnce(TaskResult<T>) -> TaskResult<U> + Send + Sync + 'static,
{
    type Output = U;

    fn cancel(&self, strategy: TaskCancellationStrategy) {
        if let Some(inner) = self.inner.as_ref() {
            inner.cancel(strategy);
        }
    }

    fn is_finished(&self) -> bool {
        self.inner
            .as_ref()
            .map(|handle| handle.is_finished())
            .unwrap_or(true)
    }

    fn is_cancelled(&self) -> bool {
        self.inner
            .as_ref()
            .map(|handle| handle.is_cancelled())
            .unwrap_or(false)
    }

    fn id(&self) -> Option<&str> {
        self.inner.as_ref().and_then(|handle| handle.id())
    }

    fn detach(mut self: Box<Self>) {
        if let Some(inner) = self.inner.take() {
            inner.detach();
        }
    }

    async fn join(mut self: Box<Self>) -> TaskResult<Self::Output> {
        let result = match self.inner.take() {
            Some(inner) => inner.join().await,
            None => Err(TaskError::ExecutorTerminated),
        };
        match self.mapper.take() {
            Some(mapper) => mapper(result),
            None => Err(TaskError::Failed(Cow::Borrowed("join mapper already consumed"))),
        }
    }
}
