//! 进程级日志安装入口。
//!
//! kiln 的各组件只通过 `tracing` 宏输出事件（`kiln::buffer`、`kiln::context`、`kiln::rt` 三个 target），
//! 是否输出、输出到哪里由宿主决定。没有自己日志栈的宿主可以调用 [`install_tracing`] 获得
//! `EnvFilter + fmt` 的默认组合；`RUST_LOG` 存在时优先生效。

use std::sync::OnceLock;

use tracing::dispatcher;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt};

/// 日志安装过程可能出现的错误。
#[derive(Debug)]
pub enum InstallError {
    /// `install_tracing` 被重复调用。
    AlreadyInstalled,
    /// 外部提前设置了全局 `tracing` Subscriber。
    SubscriberAlreadySet,
    /// 设置全局 Subscriber 失败的底层错误。
    SetGlobalSubscriber(tracing::dispatcher::SetGlobalDefaultError),
}

impl core::fmt::Display for InstallError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            InstallError::AlreadyInstalled => {
                f.write_str("kiln tracing 已完成安装，禁止重复调用 install_tracing")
            }
            InstallError::SubscriberAlreadySet => {
                f.write_str("全局 tracing Subscriber 已存在，kiln 无法覆盖")
            }
            InstallError::SetGlobalSubscriber(err) => {
                write!(f, "设置 tracing 全局 Subscriber 失败: {err}")
            }
        }
    }
}

impl std::error::Error for InstallError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InstallError::SetGlobalSubscriber(err) => Some(err),
            _ => None,
        }
    }
}

static INSTALLED: OnceLock<()> = OnceLock::new();

/// 以 `info` 为默认级别安装全局订阅者。
pub fn install_tracing() -> Result<(), InstallError> {
    install_tracing_with_default("info")
}

/// 安装全局订阅者，`RUST_LOG` 缺失或非法时使用 `default_directive`。
///
/// # 契约说明（What）
/// - 多次调用返回 [`InstallError::AlreadyInstalled`]；
/// - 调用前若外部已配置 Subscriber，返回 [`InstallError::SubscriberAlreadySet`]。
pub fn install_tracing_with_default(default_directive: &str) -> Result<(), InstallError> {
    if INSTALLED.get().is_some() {
        return Err(InstallError::AlreadyInstalled);
    }
    if dispatcher::has_been_set() {
        return Err(InstallError::SubscriberAlreadySet);
    }

    let subscriber = tracing_subscriber::registry()
        .with(build_env_filter(default_directive))
        .with(tracing_subscriber::fmt::layer());
    tracing::subscriber::set_global_default(subscriber)
        .map_err(InstallError::SetGlobalSubscriber)?;

    INSTALLED
        .set(())
        .map_err(|_| InstallError::AlreadyInstalled)
}

fn build_env_filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive))
}
