use std::{sync::Arc, time::Duration};

use bytes::{Bytes, BytesMut};
#[cfg(feature = "config-toml")]
use kiln_core::ConfigError;
use kiln_core::{AdaptiveBufferConfig, AdaptiveBufferSizer, BufferSizeTable};
use serde::Deserialize;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::{READ, map_io_error, timeout_error};

/// 读取器的部署期配置。
///
/// ```toml
/// read_timeout_ms = 3000
///
/// [buffer]
/// sizes = [1024, 4096, 16384]
/// initial_index = 0
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReaderConfig {
    /// 缓冲尺寸策略。
    pub buffer: AdaptiveBufferConfig,
    /// 单次读取的超时；缺省表示不限时。
    #[serde(rename = "read_timeout_ms", with = "millis")]
    pub read_timeout: Option<Duration>,
}

impl ReaderConfig {
    /// 从 TOML 文本解析配置并立即校验尺寸表。
    #[cfg(feature = "config-toml")]
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input)?;
        config.buffer.build_table()?;
        Ok(config)
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
    }
}

/// 按自适应尺寸策略分配接收缓冲的读取器。
///
/// # 教案式注释
///
/// ## 意图 (Why)
/// - 尺寸策略本身不做 IO，需要一个协作方在每次读取前询问尺寸、读取后回报实际字节数；
///   本类型就是这个协作方在 Tokio `AsyncRead` 上的参考实现。
///
/// ## 逻辑 (How)
/// - `read_chunk` 按 `current_size()` 分配恰好容量的 `BytesMut`，只调用一次底层读取；
/// - 读取完成后把实际字节数交给 `on_read_completed`，再把缓冲冻结为 `Bytes` 返回；
/// - 若配置了超时，超时的那次读取不回报给尺寸策略。
///
/// ## 契约 (What)
/// - 返回空 `Bytes` 表示对端已关闭（EOF），此时尺寸策略按零字节读取收缩；
/// - IO 失败以带分类的 `CoreError` 返回，尺寸策略保持不变；
/// - 读取器独占其尺寸策略，不跨连接共享；尺寸表可通过 `Arc` 在连接之间共享。
#[derive(Debug)]
pub struct AdaptiveReader<R> {
    inner: R,
    sizer: AdaptiveBufferSizer,
    read_timeout: Option<Duration>,
}

impl<R> AdaptiveReader<R>
where
    R: AsyncRead + Unpin,
{
    pub fn new(inner: R, sizer: AdaptiveBufferSizer) -> Self {
        Self {
            inner,
            sizer,
            read_timeout: None,
        }
    }

    /// 以配置与共享尺寸表构造读取器。
    pub fn with_config(inner: R, config: &ReaderConfig, table: Arc<BufferSizeTable>) -> Self {
        Self {
            inner,
            sizer: config.buffer.new_sizer(table),
            read_timeout: config.read_timeout,
        }
    }

    /// 读取一次并返回本次收到的数据。
    pub async fn read_chunk(&mut self) -> kiln_core::Result<Bytes> {
        let mut buf = BytesMut::with_capacity(self.sizer.current_size());
        let read = self.inner.read_buf(&mut buf);
        let outcome = match self.read_timeout {
            Some(limit) => match tokio::time::timeout(limit, read).await {
                Ok(outcome) => outcome,
                Err(_) => return Err(timeout_error(READ, limit)),
            },
            None => read.await,
        };
        let bytes_read = outcome.map_err(|err| map_io_error(READ, err))?;
        self.sizer.on_read_completed(bytes_read);
        Ok(buf.freeze())
    }

    pub fn sizer(&self) -> &AdaptiveBufferSizer {
        &self.sizer
    }
}
