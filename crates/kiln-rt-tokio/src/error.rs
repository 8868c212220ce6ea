use std::{borrow::Cow, io, time::Duration};

use kiln_core::{CoreError, ErrorCategory};

/// 适配层对外暴露的稳定错误码。
pub mod codes {
    /// 底层读取返回 IO 错误。
    pub const READ_FAILED: &str = "kiln.io.read_failed";
    /// 读取在配置的超时内未完成。
    pub const TIMEOUT: &str = "kiln.io.timeout";
    /// 调用方不在 Tokio 运行时上下文中。
    pub const NO_RUNTIME: &str = "kiln.rt.no_runtime";
}

/// 描述一次底层操作对应的稳定错误码与默认文案。
#[derive(Clone, Copy)]
pub(crate) struct OperationKind {
    pub code: &'static str,
    pub message: &'static str,
}

pub(crate) const READ: OperationKind = OperationKind {
    code: codes::READ_FAILED,
    message: "adaptive read",
};

/// 将 IO 错误映射为 CoreError，并附带错误分类与原始错误。
pub(crate) fn map_io_error(kind: OperationKind, error: io::Error) -> CoreError {
    let category = categorize_io_error(&error);
    CoreError::new(
        kind.code,
        Cow::Owned(format!("{}: {}", kind.message, error)),
    )
    .with_category(category)
    .with_cause(error)
}

/// 构造超时错误。
pub(crate) fn timeout_error(kind: OperationKind, limit: Duration) -> CoreError {
    let message = format!("{} timed out after {:?}", kind.message, limit);
    CoreError::new(codes::TIMEOUT, message).with_category(ErrorCategory::Timeout)
}

fn categorize_io_error(error: &io::Error) -> ErrorCategory {
    use io::ErrorKind;
    match error.kind() {
        ErrorKind::TimedOut => ErrorCategory::Timeout,
        ErrorKind::WouldBlock | ErrorKind::Interrupted => {
            ErrorCategory::Retryable(Duration::from_millis(5))
        }
        ErrorKind::ConnectionRefused
        | ErrorKind::ConnectionReset
        | ErrorKind::ConnectionAborted
        | ErrorKind::NotConnected
        | ErrorKind::BrokenPipe => ErrorCategory::Retryable(Duration::from_millis(50)),
        ErrorKind::InvalidInput | ErrorKind::InvalidData => ErrorCategory::InvalidArgument,
        _ => ErrorCategory::NonRetryable,
    }
}
