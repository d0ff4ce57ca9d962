//! 类型化事件联合与监听器接口。
//!
//! # 教案式说明
//! - **Why**：原生实现以字符串键的属性包（`type`/`target`/`data`）投递
//!   事件，消费方只能靠鸭子类型约定；这里将每类事件固化为独立结构，
//!   经由带类型的监听器接口分发，编译期即可发现契约误用。
//! - **How**：[`SocketEvent`] 是五类事件的带标签联合；驱动方统一构造
//!   联合值，再经 [`SocketEvent::dispatch`] 路由到 [`SocketListener`]
//!   对应的方法，保证"单一分发点、有序投递"。
//! - **What**：对任一套接字实例，投递序列满足：至多一次 `open`，随后
//!   `data`/`drain` 任意交错，最后以一次 `close` 结束（若发生故障则
//!   `error` 紧邻其前）。`close` 之后不再有任何事件。

use bytes::Bytes;

use crate::error::SocketError;

/// `data` 事件的载荷，形态由 `binaryType` 在打开时一次性决定。
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DataPayload {
    /// 文本模式：字节按 UTF-8 宽松解码为字符串。
    Text(String),
    /// 二进制模式：独立所有权的定长字节缓冲。
    Binary(Bytes),
}

impl DataPayload {
    /// 载荷的字节长度（文本模式按解码后的字节数计）。
    pub fn len(&self) -> usize {
        match self {
            DataPayload::Text(text) => text.len(),
            DataPayload::Binary(bytes) => bytes.len(),
        }
    }

    /// 载荷是否为空。
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 连接建立完成。
#[derive(Clone, Copy, Debug, Default)]
pub struct OpenEvent;

/// 一段入站数据。
#[derive(Debug)]
pub struct DataEvent {
    pub payload: DataPayload,
}

/// 输出积压曾越过高水位，现已全部排空。
#[derive(Clone, Copy, Debug, Default)]
pub struct DrainEvent;

/// 分类完成的致命故障；其后必然紧跟一次 [`CloseEvent`]。
#[derive(Debug)]
pub struct ErrorEvent {
    pub error: SocketError,
}

/// 双向均已关断，本实例的终止事件。
#[derive(Clone, Copy, Debug, Default)]
pub struct CloseEvent;

/// 五类事件的带标签联合。
#[derive(Debug)]
pub enum SocketEvent {
    Open(OpenEvent),
    Data(DataEvent),
    Drain(DrainEvent),
    Error(ErrorEvent),
    Close(CloseEvent),
}

impl SocketEvent {
    /// 事件的静态名称，供日志使用。
    pub const fn name(&self) -> &'static str {
        match self {
            SocketEvent::Open(_) => "open",
            SocketEvent::Data(_) => "data",
            SocketEvent::Drain(_) => "drain",
            SocketEvent::Error(_) => "error",
            SocketEvent::Close(_) => "close",
        }
    }

    /// 把联合值路由到监听器对应的方法。
    pub fn dispatch(self, listener: &dyn SocketListener) {
        match self {
            SocketEvent::Open(event) => listener.on_open(event),
            SocketEvent::Data(event) => listener.on_data(event),
            SocketEvent::Drain(event) => listener.on_drain(event),
            SocketEvent::Error(event) => listener.on_error(event),
            SocketEvent::Close(event) => listener.on_close(event),
        }
    }
}

/// 套接字事件的消费方接口。
///
/// 所有方法默认空实现，消费方按需覆写；方法在套接字的驱动任务上被
/// 串行调用，实现内不应执行阻塞操作。
pub trait SocketListener: Send + Sync + 'static {
    fn on_open(&self, _event: OpenEvent) {}
    fn on_data(&self, _event: DataEvent) {}
    fn on_drain(&self, _event: DrainEvent) {}
    fn on_error(&self, _event: ErrorEvent) {}
    fn on_close(&self, _event: CloseEvent) {}
}
