//! 显式恢复原语层面的上下文拦截。
//!
//! # 设计综述（Why）
//! - 并非所有宿主都以 Future 表达挂起计算：回调式事件循环、协程桥接层往往直接暴露
//!   “以某个值恢复 / 以某个失败恢复”两种原语，并由调度器决定在哪个工作线程调用。
//! - [`InterceptingContext`] 把“安装 → 恢复一步 → 清理”的括号附着在恢复事件本身上，
//!   再把包装后的恢复原语交回委托方，因此委托方把恢复派发到哪个线程，括号就在哪个线程上执行。
//!
//! # 使用契约（What）
//! - 宿主实现 [`Continuation`] 表达一步恢复，实现 [`ContinuationInterceptor`] 表达派发策略；
//! - [`InterceptingContext::intercept_continuation`] 返回的恢复原语在每次恢复时都会重新安装同一个绑定值；
//! - 恢复步骤的失败（`Err` 或 panic）不属于本层的失败：清理完成后原样交还调用方。

use crate::context::ContextCell;

/// 一个可被多次恢复的挂起计算。
///
/// # 契约说明（What）
/// - `resume`：以正常值恢复下一步；
/// - `resume_with_error`：以失败恢复下一步，由计算体决定是否处理；
/// - 返回 `Err` 表示该步骤以失败结束，调用方负责处置；实现也可以通过 panic 表达不可恢复的故障。
pub trait Continuation<T, E>: Send {
    fn resume(&mut self, value: T) -> Result<(), E>;

    fn resume_with_error(&mut self, error: E) -> Result<(), E>;
}

/// 类型擦除后的恢复原语。
pub type BoxContinuation<T, E> = Box<dyn Continuation<T, E>>;

/// 决定恢复由谁、在哪个工作线程执行的委托方。
///
/// 实现可以原样返回（就地恢复），也可以返回一个把恢复派发到线程池的包装。
pub trait ContinuationInterceptor: Send + Sync {
    fn intercept_continuation<T, E>(
        &self,
        continuation: BoxContinuation<T, E>,
    ) -> BoxContinuation<T, E>
    where
        T: Send + 'static,
        E: Send + 'static;
}

/// 就地恢复的委托方：恢复发生在调用 `resume` 的线程上。
#[derive(Clone, Copy, Debug, Default)]
pub struct InlineInterceptor;

impl ContinuationInterceptor for InlineInterceptor {
    fn intercept_continuation<T, E>(
        &self,
        continuation: BoxContinuation<T, E>,
    ) -> BoxContinuation<T, E>
    where
        T: Send + 'static,
        E: Send + 'static,
    {
        continuation
    }
}

/// 将委托方、上下文值与目标槽位绑定在一起的拦截上下文。
///
/// # 教案式注释
///
/// ## 意图 (Why)
/// - 一个 `InterceptingContext` 对应一个逻辑计算；该计算可能多次挂起与恢复，
///   每次恢复都需要重新安装同一个绑定值。
///
/// ## 逻辑 (How)
/// - 先用 [`BracketedContinuation`] 包住原始恢复原语，再交给委托方拦截；
///   委托方返回的包装在恢复时最终调用到括号层，因而括号总在真正执行这一步的线程上展开。
///
/// ## 契约 (What)
/// - 本类型不选择工作线程，完全服从委托方；
/// - 绑定值在计算的所有挂起点之间保持不变，变化的只是它在槽位中的“在场”状态；
/// - 委托方自身的派发失败原样返回给调用方。
#[derive(Debug)]
pub struct InterceptingContext<I, D: 'static> {
    delegate: I,
    data: D,
    cell: &'static ContextCell<D>,
}

impl<I, D: 'static> InterceptingContext<I, D> {
    pub fn new(delegate: I, data: D, cell: &'static ContextCell<D>) -> Self {
        Self {
            delegate,
            data,
            cell,
        }
    }

    pub fn data(&self) -> &D {
        &self.data
    }
}

impl<I, D> ContinuationInterceptor for InterceptingContext<I, D>
where
    I: ContinuationInterceptor,
    D: Clone + Send + Sync + 'static,
{
    fn intercept_continuation<T, E>(
        &self,
        continuation: BoxContinuation<T, E>,
    ) -> BoxContinuation<T, E>
    where
        T: Send + 'static,
        E: Send + 'static,
    {
        let bracketed = BracketedContinuation::new(continuation, self.cell, self.data.clone());
        self.delegate.intercept_continuation(Box::new(bracketed))
    }
}

/// 在每次恢复前安装、恢复后清理上下文的恢复原语包装。
///
/// 清理由作用域守卫完成，正常返回、返回 `Err` 与 panic 展开三条路径都恰好执行一次。
pub struct BracketedContinuation<T, E, D: 'static> {
    inner: BoxContinuation<T, E>,
    cell: &'static ContextCell<D>,
    data: D,
}

impl<T, E, D: 'static> BracketedContinuation<T, E, D> {
    pub fn new(inner: BoxContinuation<T, E>, cell: &'static ContextCell<D>, data: D) -> Self {
        Self { inner, cell, data }
    }
}

impl<T, E, D> Continuation<T, E> for BracketedContinuation<T, E, D>
where
    D: Clone + Send + 'static,
{
    fn resume(&mut self, value: T) -> Result<(), E> {
        tracing::debug!(target: "kiln::context", "resume");
        let _guard = self.cell.enter(self.data.clone());
        self.inner.resume(value)
    }

    fn resume_with_error(&mut self, error: E) -> Result<(), E> {
        tracing::debug!(target: "kiln::context", "resume with error");
        let _guard = self.cell.enter(self.data.clone());
        self.inner.resume_with_error(error)
    }
}

impl<T, E, D: 'static> std::fmt::Debug for BracketedContinuation<T, E, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BracketedContinuation").finish_non_exhaustive()
    }
}
