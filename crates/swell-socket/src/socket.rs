//! 客户端套接字的公开句柄。
//!
//! # 教案式说明
//!
//! ## 意图（Why）
//! - 对应用层暴露 `open/send/suspend/resume/close` 契约与
//!   `readyState`/`bufferedAmount` 访问器；所有方法立即返回，真实 I/O
//!   全部发生在驱动任务上。
//!
//! ## 架构定位（Architecture）
//! - 句柄与驱动任务共享 [`SocketShared`]（状态单元、积压计数、排空
//!   标志）；命令经无界通道单向流入驱动任务；
//! - 注册表只持有 [`SocketControl`] 的弱引用，宿主销毁时可经
//!   `close_all` 请求优雅关闭而不延长实例寿命。
//!
//! ## 契约（What）
//! - 用法错误（状态不符、参数越界、载荷形态不匹配）同步返回
//!   [`SocketError`]；传输/安全故障一律异步经事件投递；
//! - `send` 的布尔返回是建议性背压信号：`false` 表示本次入队后积压
//!   已达高水位，调用方应等待 `drain` 再继续灌入；
//! - `close` 幂等；`suspend`/`resume` 任何状态下可调用，终止后为空操作。

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use bytes::Bytes;
use swell_core::prelude::{
    BinaryType, ReadyState, SEND_BUFFER_THRESHOLD, SocketControl, SocketError, SocketErrorKind,
    SocketId, SocketListener, SocketMeta, SocketOptions, SocketRegistry, StateCell,
};
use tokio::sync::mpsc;

use crate::driver::{Command, Driver};
use crate::factory::TransportFactory;

/// 句柄与驱动任务共享的状态。
#[derive(Debug)]
pub(crate) struct SocketShared {
    pub(crate) host: String,
    pub(crate) port: u16,
    pub(crate) use_tls: bool,
    pub(crate) binary_type: BinaryType,
    pub(crate) state: Arc<StateCell>,
    pub(crate) buffered: AtomicUsize,
    pub(crate) waiting_for_drain: AtomicBool,
    pub(crate) registry: Arc<SocketRegistry>,
    pub(crate) id: SocketId,
}

/// 注册表可见的关闭控制柄；`request_close` 与 [`TcpSocket::close`] 同义。
#[derive(Debug)]
struct CloseControl {
    state: Arc<StateCell>,
    cmd_tx: mpsc::UnboundedSender<Command>,
}

impl SocketControl for CloseControl {
    fn request_close(&self) {
        // 仅首个成功推进到 closing 的调用会下发命令，幂等由状态单元保证。
        if self.state.advance(ReadyState::Closing) {
            let _ = self.cmd_tx.send(Command::Close);
        }
    }
}

/// 客户端 TCP/TLS 套接字句柄。
///
/// 实例一经 `closed` 永久失效；重试应重新 `open` 一个新实例。
#[derive(Debug)]
pub struct TcpSocket {
    shared: Arc<SocketShared>,
    control: Arc<CloseControl>,
}

impl TcpSocket {
    /// 打开到 `(host, port)` 的客户端连接。
    ///
    /// 同步校验参数并登记注册表后立即返回 `connecting` 状态的句柄，
    /// 建连与后续事件全部异步发生。必须在 Tokio 运行时上下文内调用。
    pub fn open(
        registry: &Arc<SocketRegistry>,
        factory: Arc<TransportFactory>,
        listener: Arc<dyn SocketListener>,
        host: &str,
        port: u16,
        options: SocketOptions,
    ) -> Result<TcpSocket, SocketError> {
        if host.is_empty() {
            return Err(SocketError::new(
                SocketErrorKind::InvalidHost,
                "host must not be empty",
            ));
        }
        if port == 0 {
            return Err(SocketError::new(
                SocketErrorKind::InvalidPort,
                "port must be in [1, 65535]",
            ));
        }
        if options.use_tls() && !factory.supports_tls() {
            return Err(SocketError::new(
                SocketErrorKind::TlsNotConfigured,
                "options request tls but the factory has no client config",
            ));
        }

        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let state = Arc::new(StateCell::new(ReadyState::Connecting));
        let control = Arc::new(CloseControl {
            state: Arc::clone(&state),
            cmd_tx,
        });
        let meta = SocketMeta {
            host: host.to_owned(),
            port,
            use_tls: options.use_tls(),
        };
        let id = registry.register(
            meta,
            Arc::downgrade(&control) as std::sync::Weak<dyn SocketControl>,
        );

        let shared = Arc::new(SocketShared {
            host: host.to_owned(),
            port,
            use_tls: options.use_tls(),
            binary_type: options.binary_type(),
            state,
            buffered: AtomicUsize::new(0),
            waiting_for_drain: AtomicBool::new(false),
            registry: Arc::clone(registry),
            id,
        });

        let driver = Driver::new(Arc::clone(&shared), factory, listener, cmd_rx);
        tokio::spawn(driver.run());

        Ok(TcpSocket { shared, control })
    }

    /// 文本模式下发送一段字符串。
    pub fn send_text(&self, data: &str) -> Result<bool, SocketError> {
        if self.shared.binary_type != BinaryType::Text {
            return Err(SocketError::new(
                SocketErrorKind::PayloadMismatch,
                "socket is in arraybuffer mode; use send_bytes",
            ));
        }
        self.enqueue(Bytes::copy_from_slice(data.as_bytes()))
    }

    /// 二进制模式下发送 `data[byte_offset..]` 的前 `byte_length` 字节。
    ///
    /// `byte_length` 为 `None` 时发送至缓冲末尾；越界为同步用法错误。
    pub fn send_bytes(
        &self,
        data: &[u8],
        byte_offset: usize,
        byte_length: Option<usize>,
    ) -> Result<bool, SocketError> {
        if self.shared.binary_type != BinaryType::Binary {
            return Err(SocketError::new(
                SocketErrorKind::PayloadMismatch,
                "socket is in string mode; use send_text",
            ));
        }
        let total = data.len();
        if byte_offset > total {
            return Err(SocketError::new(
                SocketErrorKind::InvalidRange,
                format!("byte_offset {byte_offset} exceeds buffer length {total}"),
            ));
        }
        let end = match byte_length {
            Some(len) => byte_offset.checked_add(len).ok_or_else(|| {
                SocketError::new(SocketErrorKind::InvalidRange, "byte range overflows")
            })?,
            None => total,
        };
        if end > total {
            return Err(SocketError::new(
                SocketErrorKind::InvalidRange,
                format!("byte range end {end} exceeds buffer length {total}"),
            ));
        }
        self.enqueue(Bytes::copy_from_slice(&data[byte_offset..end]))
    }

    /// 暂停 `data` 事件投递；建连完成前到达的请求会被暂存。
    pub fn suspend(&self) {
        let _ = self.control.cmd_tx.send(Command::Suspend);
    }

    /// 恢复 `data` 事件投递。
    pub fn resume(&self) {
        let _ = self.control.cmd_tx.send(Command::Resume);
    }

    /// 发起优雅关闭：读侧立即停止，写侧排空后关断；幂等。
    pub fn close(&self) {
        self.control.request_close();
    }

    /// 当前生命周期状态。
    pub fn ready_state(&self) -> ReadyState {
        self.shared.state.load()
    }

    /// 仍在排队待写的字节数。
    pub fn buffered_amount(&self) -> usize {
        self.shared.buffered.load(Ordering::Acquire)
    }

    /// 目标主机名。
    pub fn host(&self) -> &str {
        &self.shared.host
    }

    /// 目标端口。
    pub fn port(&self) -> u16 {
        self.shared.port
    }

    /// 是否以 TLS 包装。
    pub fn use_tls(&self) -> bool {
        self.shared.use_tls
    }

    /// 入站载荷形态。
    pub fn binary_type(&self) -> BinaryType {
        self.shared.binary_type
    }

    /// 注册表分配的标识。
    pub fn id(&self) -> SocketId {
        self.shared.id
    }

    fn enqueue(&self, payload: Bytes) -> Result<bool, SocketError> {
        if self.shared.state.load() != ReadyState::Open {
            return Err(SocketError::new(
                SocketErrorKind::InvalidState,
                format!("send requires open state, socket is {}", self.ready_state()),
            ));
        }

        let len = payload.len();
        let after = self.shared.buffered.fetch_add(len, Ordering::AcqRel) + len;
        let buffer_not_full = after < SEND_BUFFER_THRESHOLD;
        if !buffer_not_full {
            self.shared.waiting_for_drain.store(true, Ordering::Release);
        }

        if self.control.cmd_tx.send(Command::Send(payload)).is_err() {
            // 驱动任务已终止：回滚计数并按用法错误上报。
            self.shared.buffered.fetch_sub(len, Ordering::AcqRel);
            return Err(SocketError::new(
                SocketErrorKind::InvalidState,
                "socket task has terminated",
            ));
        }
        Ok(buffer_not_full)
    }
}
