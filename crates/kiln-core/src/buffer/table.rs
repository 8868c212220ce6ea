use std::sync::{Arc, OnceLock};

use thiserror::Error;

use crate::error::{CoreError, ErrorCategory, codes};

const KIB: usize = 1024;

/// 默认的候选缓冲尺寸（字节）。
///
/// 小尺寸段按倍数增长以便快速脱离 1 KiB 起点，16 KiB 之后改为 4/8 KiB 的线性步长，
/// 避免在大缓冲区间出现一次翻倍带来的内存跳变。
pub const DEFAULT_BUFFER_SIZES: [usize; 13] = [
    KIB,
    2 * KIB,
    4 * KIB,
    8 * KIB,
    16 * KIB,
    20 * KIB,
    24 * KIB,
    28 * KIB,
    32 * KIB,
    40 * KIB,
    48 * KIB,
    56 * KIB,
    64 * KIB,
];

/// 尺寸表构造失败的原因。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BufferTableError {
    /// 候选尺寸少于两个，无法形成“增长/收缩”的爬坡区间。
    #[error("buffer size table needs at least 2 entries, got {len}")]
    TooShort { len: usize },
    /// 出现了零字节的候选尺寸。
    #[error("buffer size at index {index} is zero")]
    ZeroSize { index: usize },
    /// 候选尺寸未严格递增。
    #[error(
        "buffer sizes must be strictly increasing: index {index} has {current} after {previous}"
    )]
    NotIncreasing {
        index: usize,
        previous: usize,
        current: usize,
    },
}

impl From<BufferTableError> for CoreError {
    fn from(value: BufferTableError) -> Self {
        CoreError::new(codes::BUFFER_INVALID_TABLE, value.to_string())
            .with_category(ErrorCategory::InvalidArgument)
            .with_cause(value)
    }
}

/// 有序、不可变的候选缓冲尺寸表。
///
/// # 设计背景（Why）
/// - 尺寸策略只在离散的候选值之间移动，表本身是部署时的调优参数而非正确性要求，
///   因此以可注入参数的形式提供，默认值见 [`DEFAULT_BUFFER_SIZES`]。
///
/// # 契约说明（What）
/// - **不变式**：长度 ≥ 2，每项 > 0，严格递增；构造后不可修改；
/// - **共享方式**：通常包裹在 `Arc` 中由所有连接只读共享，见 [`shared_default`](Self::shared_default)。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferSizeTable {
    sizes: Box<[usize]>,
}

impl BufferSizeTable {
    /// 校验并构造尺寸表。
    pub fn new(sizes: impl Into<Vec<usize>>) -> Result<Self, BufferTableError> {
        let sizes = sizes.into();
        if sizes.len() < 2 {
            return Err(BufferTableError::TooShort { len: sizes.len() });
        }
        for (index, &current) in sizes.iter().enumerate() {
            if current == 0 {
                return Err(BufferTableError::ZeroSize { index });
            }
            if index > 0 {
                let previous = sizes[index - 1];
                if current <= previous {
                    return Err(BufferTableError::NotIncreasing {
                        index,
                        previous,
                        current,
                    });
                }
            }
        }
        Ok(Self {
            sizes: sizes.into_boxed_slice(),
        })
    }

    /// 以 [`DEFAULT_BUFFER_SIZES`] 构造一份新的尺寸表。
    pub fn default_table() -> Self {
        Self {
            sizes: Box::new(DEFAULT_BUFFER_SIZES),
        }
    }

    /// 返回进程级共享的默认尺寸表。
    pub fn shared_default() -> Arc<Self> {
        static DEFAULT: OnceLock<Arc<BufferSizeTable>> = OnceLock::new();
        Arc::clone(DEFAULT.get_or_init(|| Arc::new(BufferSizeTable::default_table())))
    }

    /// 候选尺寸数量，恒 ≥ 2。
    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    /// 尺寸表永不为空，保留此方法以满足集合类型的惯例。
    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    /// 最大合法索引。
    pub fn last_index(&self) -> usize {
        self.sizes.len() - 1
    }

    pub fn get(&self, index: usize) -> Option<usize> {
        self.sizes.get(index).copied()
    }

    pub fn min(&self) -> usize {
        self.sizes[0]
    }

    pub fn max(&self) -> usize {
        self.sizes[self.last_index()]
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.sizes
    }

    /// 返回某个精确尺寸在表中的位置。
    pub fn index_of(&self, size: usize) -> Option<usize> {
        self.sizes.binary_search(&size).ok()
    }
}

impl Default for BufferSizeTable {
    fn default() -> Self {
        Self::default_table()
    }
}
