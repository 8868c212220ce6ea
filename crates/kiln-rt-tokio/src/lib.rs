#![deny(unsafe_code)]
#![doc = "kiln-rt-tokio: kiln 核心契约在 Tokio 运行时上的宿主适配。"]
#![doc = ""]
#![doc = "== 组成 =="]
#![doc = "1. [`TokioExecutor`]：以 Tokio 运行时句柄实现 [`kiln_core::TaskExecutor`]，可直接作为 `InterceptingExecutor` 的委托方。"]
#![doc = "2. [`AdaptiveReader`]：按 [`kiln_core::AdaptiveBufferSizer`] 的建议分配接收缓冲，并在每次读取后回报实际字节数。"]
#![doc = "3. [`observability`]：一次性安装 `tracing-subscriber` 全局订阅者（`EnvFilter` + fmt）。"]
#![doc = ""]
#![doc = "IO 失败统一映射为带分类的 [`kiln_core::CoreError`]，错误码见 [`codes`]。"]

mod error;
mod executor;
pub mod observability;
mod read;

pub use error::codes;
pub use executor::TokioExecutor;
pub use read::{AdaptiveReader, ReaderConfig};
