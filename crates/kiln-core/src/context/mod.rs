//! 工作线程本地的上下文槽位与“每次恢复执行”的上下文括号。
//!
//! # 设计综述（Why）
//! - 异步计算可能在任意挂起点让出执行权，并在另一个工作线程上恢复；
//!   若请求级数据只存放在线程本地槽位里，恢复后的代码将读到错误的值或空值。
//! - 本模块把“安装 → 执行一步 → 清理”这一括号挂到每一次恢复事件（`poll`）上，
//!   而不是挂到某个固定线程上，因此无论由哪个工作线程执行，这一步都能读到绑定值，
//!   执行结束后该线程上也不会残留数据。
//!
//! # 模块结构（How）
//! - `cell`：[`ContextCell`] 与作用域守卫 [`ContextGuard`]，以及声明槽位的 [`context_cell!`](crate::context_cell) 宏；
//! - `future`：[`ContextFuture`] 与扩展 trait [`WithContext`]。
//!
//! # 使用契约（What）
//! - 槽位通过 `context_cell!` 声明为 `static`，以 `&'static ContextCell<D>` 的形式传递；
//! - 应用代码只读访问：[`ContextCell::current`] / [`ContextCell::with_current`]。

mod cell;
mod future;

pub use cell::{ContextCell, ContextGuard};
pub use future::{ContextFuture, WithContext};
