//! swell-socket：基于 Tokio 的客户端 TCP/TLS 套接字实现。
//!
//! # 教案式说明
//!
//! ## 意图（Why）
//! - 为 `swell-core` 定义的契约（状态机、事件、错误分类、注册表）提供
//!   生产级实现：明文与 TLS 传输、有序发送队列、输入泵与背压信号。
//!
//! ## 架构定位（Architecture）
//! - [`TransportFactory`]（`factory`）：地址解析、建连与 TLS 握手；
//! - `queue` / `pump`：输出与输入两个方向的最小步进原语；
//! - `driver`：独占传输的驱动任务，所有事件的唯一投递者；
//! - [`TcpSocket`]（`socket`）：应用层句柄，方法全部立即返回；
//! - `error`：`io::Error` 与 `rustls::Error` 到稳定错误类别的映射。
//!
//! ## 契约（What）
//! - 每个套接字的事件序列固定为：至多一次 `open`，随后 `data`/`drain`
//!   交错，最后（可选 `error` 紧邻）唯一一次 `close`；
//! - 所有传输与安全故障都折算为 `swell-core` 的稳定错误类别，调用方
//!   永远不需要下探 `io::ErrorKind`。

mod driver;
mod error;
mod factory;
mod pump;
mod queue;
mod socket;

pub use factory::{Transport, TransportFactory};
pub use socket::TcpSocket;
