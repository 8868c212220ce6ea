use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use pin_project::pin_project;

use crate::context::ContextCell;

/// 在每一次 `poll` 周围安装/清理上下文的 Future 包装。
///
/// # 教案式注释
///
/// ## 意图 (Why)
/// - 对 Rust Future 而言，一次 `poll` 就是一次“恢复执行”：挂起点之间的代码在某个工作线程上运行一步。
///   执行器可能把下一次 `poll` 交给另一个线程，所以括号必须跟着 `poll` 走，而不能绑定到线程。
///
/// ## 逻辑 (How)
/// - `poll` 开始时以绑定值进入 [`ContextCell::enter`]，随后轮询内部 Future；
/// - 守卫在 `poll` 返回（`Ready`/`Pending`）或 panic 展开时析构，槽位被清空；
/// - 内部 Future 的输出（包括 `Err`）原样返回，panic 原样继续展开。
///
/// ## 契约 (What)
/// - 每次 `poll` 期间 `cell.current()` 等于绑定值；`poll` 返回后该线程槽位为空，轮询前残留的值同样被清除；
/// - 未被轮询即被丢弃的 Future 不会触发任何安装/清理；
/// - 同一计算的各次括号严格串行：`poll` 需要独占的 `Pin<&mut Self>`。
#[pin_project]
#[derive(Debug)]
#[must_use = "futures do nothing unless polled"]
pub struct ContextFuture<F, D: 'static> {
    #[pin]
    inner: F,
    cell: &'static ContextCell<D>,
    data: D,
}

impl<F, D: 'static> ContextFuture<F, D> {
    pub fn new(inner: F, cell: &'static ContextCell<D>, data: D) -> Self {
        Self { inner, cell, data }
    }

    /// 绑定的上下文值。
    pub fn data(&self) -> &D {
        &self.data
    }
}

impl<F, D> Future for ContextFuture<F, D>
where
    F: Future,
    D: Clone + 'static,
{
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        tracing::trace!(target: "kiln::context", "resume");
        let _guard = this.cell.enter(this.data.clone());
        this.inner.poll(cx)
    }
}

/// 为任意 Future 提供 `.with_context(cell, value)` 组合子。
pub trait WithContext: Future + Sized {
    fn with_context<D: Clone + 'static>(
        self,
        cell: &'static ContextCell<D>,
        data: D,
    ) -> ContextFuture<Self, D> {
        ContextFuture::new(self, cell, data)
    }
}

impl<F: Future> WithContext for F {}
