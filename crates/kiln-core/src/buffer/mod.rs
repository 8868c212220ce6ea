//! 自适应接收缓冲尺寸。
//!
//! # 设计综述（Why）
//! - 固定大小的读缓冲要么在高吞吐连接上造成大量短读，要么在空闲连接上浪费内存；
//! - 因此每条连接持有一个 [`AdaptiveBufferSizer`]，依据上一次读取的填充情况在
//!   [`BufferSizeTable`] 上逐级爬坡：读满（或超出）则增大一级，未读满则缩小一级。
//!
//! # 模块结构（How）
//! - `table`：不可变、跨连接共享的候选尺寸表及其校验；
//! - `sizer`：每连接独占的索引状态机。
//!
//! # 使用契约（What）
//! - IO 层在发起读取前调用 [`AdaptiveBufferSizer::current_size`] 分配缓冲；
//! - 读取完成后以实际字节数调用 [`AdaptiveBufferSizer::on_read_completed`]。

mod sizer;
mod table;

pub use sizer::AdaptiveBufferSizer;
pub use table::{BufferSizeTable, BufferTableError, DEFAULT_BUFFER_SIZES};
