//! 套接字驱动任务：以单循环串联命令处理、输出拷贝与输入泵。
//!
//! # 教案式说明
//!
//! ## 意图（Why）
//! - 原生实现以层层嵌套的回调（拷贝完成、泵停止、传输状态）拼出生命
//!   周期，时序契约散落各处；这里改为**单驱动任务 + 命令通道**：公开
//!   句柄把 `send/close/suspend/resume` 投递到通道，驱动任务独占传输
//!   与队列，所有事件由它按序投递——"单写者、有序交付"由结构保证。
//!
//! ## 逻辑（How）
//! - 建连阶段：在命令与工厂建连之间 select，`close` 抢先则静默终止
//!   （只投递一次 `close`，没有 `open`）；建连失败经分类后以
//!   `error` + `close` 收尾；
//! - 主循环：每轮先检查"队列已空"的推进条件（补投 `drain`、按
//!   `closing`/对端 EOF 收尾），再在命令、拷贝步进、输入拉取三者之间
//!   select；`biased` 保证命令优先，写与读公平穿插；
//! - 终止：任何路径都汇聚到 [`Driver::finish_with`]——推进到 `closed`、
//!   清零积压、（可选）投递 `error`、投递唯一一次 `close`、注销注册表。
//!
//! ## 契约（What）
//! - 事件序列：至多一次 `open` → `data`/`drain` 交错 → （可选 `error`
//!   紧邻）唯一一次 `close`；`close` 之后驱动任务即退出，不可能再有
//!   事件；
//! - 对端 EOF 且仍有积压输出时进入半关闭：继续写完队列再无错误收尾；
//! - 写失败/读失败均为致命：废弃队列，分类上报。

use std::sync::Arc;
use std::sync::atomic::Ordering;

use bytes::Bytes;
use swell_core::prelude::{
    CloseEvent, DataEvent, DrainEvent, ErrorEvent, OpenEvent, ReadyState, SocketError,
    SocketEvent, SocketListener,
};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;

use crate::error;
use crate::factory::{Transport, TransportFactory};
use crate::pump::InputPump;
use crate::queue::OutputQueue;
use crate::socket::SocketShared;

/// 公开句柄发往驱动任务的命令。
pub(crate) enum Command {
    Send(Bytes),
    Close,
    Suspend,
    Resume,
}

pub(crate) struct Driver {
    shared: Arc<SocketShared>,
    factory: Arc<TransportFactory>,
    listener: Arc<dyn SocketListener>,
    cmd_rx: mpsc::UnboundedReceiver<Command>,
    queue: OutputQueue,
    pump: InputPump,
}

impl Driver {
    pub(crate) fn new(
        shared: Arc<SocketShared>,
        factory: Arc<TransportFactory>,
        listener: Arc<dyn SocketListener>,
        cmd_rx: mpsc::UnboundedReceiver<Command>,
    ) -> Self {
        let pump = InputPump::new(shared.binary_type);
        Self {
            shared,
            factory,
            listener,
            cmd_rx,
            queue: OutputQueue::new(),
            pump,
        }
    }

    pub(crate) async fn run(mut self) {
        let Some(transport) = self.connect_phase().await else {
            return;
        };

        if !self.shared.state.advance(ReadyState::Open) {
            // close() 在建连完成与本次推进之间抢先落地：不投递 open，
            // 直接按无错误收尾。
            self.finish_with(None);
            return;
        }
        tracing::debug!(id = %self.shared.id, host = %self.shared.host, "socket open");
        self.emit(SocketEvent::Open(OpenEvent));

        let (mut reader, mut writer) = tokio::io::split(transport);
        let mut read_open = true;
        let mut peer_eof = false;

        loop {
            if self.queue.is_empty() {
                self.maybe_drain();
                let state = self.shared.state.load();
                if state == ReadyState::Closing || peer_eof {
                    let _ = writer.shutdown().await;
                    self.finish_with(None);
                    return;
                }
            }

            let writable = !self.queue.is_empty();
            let readable = read_open
                && !self.pump.is_suspended()
                && self.shared.state.load() == ReadyState::Open;

            tokio::select! {
                biased;
                cmd = self.cmd_rx.recv() => match cmd {
                    Some(Command::Send(buf)) => self.queue.push(buf),
                    Some(Command::Suspend) => self.pump.suspend(),
                    Some(Command::Resume) => self.pump.resume(),
                    Some(Command::Close) => {
                        // 读侧立即停摆；写侧排空后在循环顶部收尾。
                        read_open = false;
                    }
                    None => {
                        // 句柄与注册表控制柄均已消亡，视作关闭请求。
                        self.shared.state.advance(ReadyState::Closing);
                        read_open = false;
                    }
                },
                result = self.queue.copy_step(&mut writer), if writable => match result {
                    Ok(accepted) => {
                        self.shared.buffered.fetch_sub(accepted, Ordering::AcqRel);
                    }
                    Err(err) => {
                        self.fatal(error::map_io_error(error::WRITE, err));
                        return;
                    }
                },
                result = self.pump.pull(&mut reader), if readable => match result {
                    Ok(Some(payload)) => self.emit(SocketEvent::Data(DataEvent { payload })),
                    Ok(None) => {
                        // 对端半关闭：停止读取；积压写完后按无错误收尾。
                        read_open = false;
                        peer_eof = true;
                    }
                    Err(err) => {
                        self.fatal(error::map_io_error(error::READ, err));
                        return;
                    }
                },
            }
        }
    }

    /// 建连阶段：成功返回传输；关闭抢先或建连失败时完成收尾并返回 None。
    async fn connect_phase(&mut self) -> Option<Transport> {
        let factory = Arc::clone(&self.factory);
        let shared = Arc::clone(&self.shared);
        let connect =
            async move { factory.connect(&shared.host, shared.port, shared.use_tls).await };
        tokio::pin!(connect);

        loop {
            tokio::select! {
                biased;
                cmd = self.cmd_rx.recv() => match cmd {
                    Some(Command::Suspend) => self.pump.suspend(),
                    Some(Command::Resume) => self.pump.resume(),
                    // 状态门禁使 send 不可能在 connecting 阶段通过；仅防御。
                    Some(Command::Send(_)) => {}
                    Some(Command::Close) | None => {
                        self.shared.state.advance(ReadyState::Closing);
                        self.finish_with(None);
                        return None;
                    }
                },
                result = &mut connect => match result {
                    Ok(transport) => return Some(transport),
                    Err(err) => {
                        tracing::debug!(
                            id = %self.shared.id,
                            code = err.code(),
                            "socket connect failed"
                        );
                        self.finish_with(Some(err));
                        return None;
                    }
                },
            }
        }
    }

    /// 队列回到 0 且此前越过高水位时，补投唯一一次 `drain`。
    fn maybe_drain(&self) {
        if self.shared.waiting_for_drain.load(Ordering::Acquire)
            && self.shared.buffered.load(Ordering::Acquire) == 0
            && self.shared.waiting_for_drain.swap(false, Ordering::AcqRel)
        {
            self.emit(SocketEvent::Drain(DrainEvent));
        }
    }

    /// 致命流故障：废弃队列并以 `error` + `close` 收尾。
    fn fatal(&mut self, error: SocketError) {
        tracing::debug!(id = %self.shared.id, code = error.code(), "socket failed");
        self.finish_with(Some(error));
    }

    /// 唯一的终止汇聚点。
    fn finish_with(&mut self, error: Option<SocketError>) {
        self.shared.state.advance(ReadyState::Closed);
        self.shared.buffered.store(0, Ordering::Release);
        self.shared.waiting_for_drain.store(false, Ordering::Release);
        if let Some(error) = error {
            self.emit(SocketEvent::Error(ErrorEvent { error }));
        }
        self.emit(SocketEvent::Close(CloseEvent));
        self.shared.registry.unregister(self.shared.id);
        tracing::debug!(id = %self.shared.id, "socket closed");
    }

    fn emit(&self, event: SocketEvent) {
        tracing::trace!(id = %self.shared.id, event = event.name(), "deliver event");
        event.dispatch(self.listener.as_ref());
    }
}
