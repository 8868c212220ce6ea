use std::sync::Arc;

use crate::{
    buffer::BufferSizeTable,
    error::{CoreError, ErrorCategory, codes},
};

/// 每连接独占的自适应缓冲尺寸状态机。
///
/// # 教案式注释
///
/// ## 意图 (Why)
/// - 让连接的读缓冲追踪实际流量：持续读满说明通道里还有更多数据，应扩大缓冲以减少短读；
///   持续读不满说明缓冲过剩，应收缩以节省空闲连接的内存。
///
/// ## 逻辑 (How)
/// - 仅维护一个指向 [`BufferSizeTable`] 的索引；
/// - `bytes_read >= current_size()` 时索引加一（饱和于表尾），否则减一（饱和于 0）；
/// - 每次只移动一格，方向只由这一次比较决定，避免在两端之间来回跳变。
///
/// ## 契约 (What)
/// - **不变式**：`index ∈ [0, table.len() - 1]`，`current_size()` 恒为表中的某一项；
/// - **边界**：`bytes_read == 0` 视为未读满（收缩）；恰好读满视为“还想要更多”（增长），
///   因为恰好读满无法区分“刚好够”与“还有剩余”；
/// - **并发**：只通过 `&mut self` 修改，由所属连接单写者访问，不做内部加锁。
///
/// ## 注意事项 (Trade-offs)
/// - 连接关闭即丢弃，不跨连接持久化；新连接总是从最小尺寸起步。
#[derive(Debug, Clone)]
pub struct AdaptiveBufferSizer {
    table: Arc<BufferSizeTable>,
    index: usize,
}

impl AdaptiveBufferSizer {
    /// 以表中最小尺寸为起点构造。
    pub fn new(table: Arc<BufferSizeTable>) -> Self {
        Self { table, index: 0 }
    }

    /// 以指定索引为起点构造，越界时钳制到最大索引。
    pub fn with_initial_index(table: Arc<BufferSizeTable>, index: usize) -> Self {
        let index = index.min(table.last_index());
        Self { table, index }
    }

    /// 下一次读取应分配的缓冲字节数。
    pub fn current_size(&self) -> usize {
        self.table.as_slice()[self.index]
    }

    /// 根据上一次读取实际填充的字节数调整下一次的缓冲尺寸。
    pub fn on_read_completed(&mut self, bytes_read: usize) {
        let previous = self.index;
        self.index = if bytes_read >= self.current_size() {
            (self.index + 1).min(self.table.last_index())
        } else {
            self.index.saturating_sub(1)
        };
        if previous != self.index {
            tracing::trace!(
                target: "kiln::buffer",
                bytes_read,
                from = self.table.as_slice()[previous],
                to = self.current_size(),
                "adaptive buffer resized"
            );
        }
    }

    /// 面向有符号计数来源（如系统调用返回值）的入口。
    ///
    /// 负数属于调用方契约违例：返回 `InvalidArgument` 分类的 [`CoreError`]，索引保持不变。
    pub fn try_on_read_completed(&mut self, bytes_read: i64) -> crate::Result<()> {
        match usize::try_from(bytes_read) {
            Ok(bytes_read) => {
                self.on_read_completed(bytes_read);
                Ok(())
            }
            Err(_) => {
                tracing::warn!(
                    target: "kiln::buffer",
                    bytes_read,
                    "rejected negative read size"
                );
                Err(CoreError::new(
                    codes::BUFFER_NEGATIVE_READ,
                    format!("bytes_read must be non-negative, got {bytes_read}"),
                )
                .with_category(ErrorCategory::InvalidArgument))
            }
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn table(&self) -> &Arc<BufferSizeTable> {
        &self.table
    }

    /// 回到最小尺寸。
    pub fn reset(&mut self) {
        self.index = 0;
    }
}

impl Default for AdaptiveBufferSizer {
    fn default() -> Self {
        Self::new(BufferSizeTable::shared_default())
    }
}
