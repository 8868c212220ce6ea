use std::{borrow::Cow, error::Error, fmt, time::Duration};

/// 稳定错误码集中登记处。
///
/// 所有码值遵循 `kiln.<领域>.<语义>` 命名，供日志聚合与自动化处置精确匹配。
pub mod codes {
    /// 向缓冲尺寸策略报告了负数的读取字节数。
    pub const BUFFER_NEGATIVE_READ: &str = "kiln.buffer.negative_read";
    /// 缓冲尺寸表不满足“长度 ≥ 2、严格递增、全为正数”的约束。
    pub const BUFFER_INVALID_TABLE: &str = "kiln.buffer.invalid_table";
    /// 配置文本无法解析或解析结果不合法。
    pub const CONFIG_INVALID: &str = "kiln.config.invalid";
}

/// `CoreError` 表示 kiln 跨层共享的稳定错误域。
///
/// # 设计背景（Why）
/// - 尺寸策略的前置条件违例、配置错误与宿主 IO 故障需要合流为统一的错误码，
///   以便日志与告警按码值而非字符串聚合。
///
/// # 契约说明（What）
/// - `code`：稳定的 `'static` 字符串，参见 [`codes`]；
/// - `message`：面向排障人员的描述，不含敏感信息；
/// - `cause`：可选底层原因，通过 [`Error::source`] 暴露；
/// - `category`：可选的结构化分类，未设置时 [`category`](Self::category) 回退为 `NonRetryable`。
///
/// # 风险提示（Trade-offs）
/// - 结构体仅承载信息，不做任何上报；上报策略由调用方决定。
#[derive(Debug)]
pub struct CoreError {
    code: &'static str,
    message: Cow<'static, str>,
    cause: Option<ErrorCause>,
    category: Option<ErrorCategory>,
}

impl CoreError {
    /// 构造核心错误。
    ///
    /// # 示例（Examples）
    /// ```rust
    /// use kiln_core::error::{CoreError, ErrorCategory, codes};
    ///
    /// let err = CoreError::new(codes::BUFFER_NEGATIVE_READ, "bytes_read = -1")
    ///     .with_category(ErrorCategory::InvalidArgument);
    /// assert_eq!(err.code(), codes::BUFFER_NEGATIVE_READ);
    /// assert_eq!(err.category(), ErrorCategory::InvalidArgument);
    /// ```
    pub fn new(code: &'static str, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            code,
            message: message.into(),
            cause: None,
            category: None,
        }
    }

    /// 附带底层原因并返回新的核心错误。
    pub fn with_cause(mut self, cause: impl Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// 标记结构化分类，驱动调用方的重试或关闭策略。
    pub fn with_category(mut self, category: ErrorCategory) -> Self {
        self.category = Some(category);
        self
    }

    /// 就地更新分类信息。
    pub fn set_category(&mut self, category: ErrorCategory) {
        self.category = Some(category);
    }

    /// 获取结构化分类；未显式设置时返回 [`ErrorCategory::NonRetryable`]。
    pub fn category(&self) -> ErrorCategory {
        self.category.clone().unwrap_or(ErrorCategory::NonRetryable)
    }

    /// 获取稳定错误码。
    pub fn code(&self) -> &'static str {
        self.code
    }

    /// 获取描述。
    pub fn message(&self) -> &str {
        &self.message
    }

    /// 获取底层原因。
    pub fn cause(&self) -> Option<&ErrorCause> {
        self.cause.as_ref()
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl Error for CoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause
            .as_ref()
            .map(|boxed| boxed.as_ref() as &(dyn Error + 'static))
    }
}

/// 错误分类枚举。
///
/// # 契约说明（What）
/// - `InvalidArgument`：调用方违反前置条件（例如报告负数读取量），组件状态保持不变；
/// - `Retryable`：携带建议的退避时长；
/// - `Timeout`：由宿主 IO 层在读取超过截止时间时给出；
/// - `NonRetryable`：默认分类，不触发自动策略。
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorCategory {
    InvalidArgument,
    Retryable(Duration),
    NonRetryable,
    Timeout,
}

/// `ErrorCause` 封装底层原因，保持 `Send + Sync` 以便跨线程传递。
pub type ErrorCause = Box<dyn Error + Send + Sync + 'static>;

/// 框架统一的返回值别名，默认错误类型为 [`CoreError`]。
pub type Result<T, E = CoreError> = core::result::Result<T, E>;
