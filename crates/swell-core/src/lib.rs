//! # swell-core
//!
//! 客户端 TCP 套接字状态机的共享契约层：不含任何 I/O，只定义各实现
//! crate 与应用层之间必须一致的类型。
//!
//! ## 模块导览
//! - [`state`]：`connecting → open → closing → closed` 的单调状态机原语；
//! - [`options`]：打开时一次性锁定的配置（TLS 开关、载荷形态）与输出
//!   积压高水位常量；
//! - [`event`]：类型化事件联合与监听器接口，承载有序投递契约；
//! - [`error`]：稳定错误码 + 语义种类的错误域，安全/网络双类分类法；
//! - [`registry`]：显式的存活套接字注册表，替代环境全局表。

pub mod error;
pub mod event;
pub mod options;
pub mod registry;
pub mod state;

/// 常用类型的统一出口。
pub mod prelude {
    pub use crate::error::{ErrorClass, SocketError, SocketErrorKind};
    pub use crate::event::{
        CloseEvent, DataEvent, DataPayload, DrainEvent, ErrorEvent, OpenEvent, SocketEvent,
        SocketListener,
    };
    pub use crate::options::{BinaryType, SEND_BUFFER_THRESHOLD, SocketOptions};
    pub use crate::registry::{SocketControl, SocketId, SocketMeta, SocketRegistry};
    pub use crate::state::{ReadyState, StateCell};
}
