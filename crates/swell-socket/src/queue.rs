//! 输出队列与异步拷贝步进。
//!
//! # 教案式说明
//!
//! ## 意图（Why）
//! - 多次 `send` 必须序列化为单一有序字节流写入传输，不允许交错或
//!   重排；队列是实现该保证的唯一写路径。
//! - 原生实现用"拷贝器活跃"标志保证同一时刻只有一个异步拷贝在跑；
//!   这里由驱动任务的单循环承担同一职责，队列本身只暴露一次写入
//!   尝试的最小步进 [`OutputQueue::copy_step`]。
//!
//! ## 契约（What）
//! - 缓冲严格按提交顺序写出；队头缓冲只有在全部字节被传输接受后才
//!   会出队（部分写入时在队头原地续写）；
//! - `copy_step` 返回本次被传输接受的字节数，供上层同步扣减积压计数；
//! - 传输写入失败即为致命条件，队列由上层整体废弃。
//!
//! ## 注意事项（Trade-offs）
//! - `copy_step` 单次只发起一个 `write`，取消（select 分支落选）时不会
//!   丢失进度——已接受的字节在返回值中体现，未接受的字节仍在队头。

use std::collections::VecDeque;
use std::io;

use bytes::Bytes;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// 单个排队待发的缓冲及其消费进度。
#[derive(Debug)]
struct PendingWrite {
    buf: Bytes,
    written: usize,
}

impl PendingWrite {
    fn new(buf: Bytes) -> Self {
        Self { buf, written: 0 }
    }

    fn remaining(&self) -> &[u8] {
        &self.buf[self.written..]
    }

    fn is_consumed(&self) -> bool {
        self.written >= self.buf.len()
    }
}

/// 先进先出的待发缓冲队列。
#[derive(Debug, Default)]
pub(crate) struct OutputQueue {
    pending: VecDeque<PendingWrite>,
}

impl OutputQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// 追加一个待发缓冲。
    pub(crate) fn push(&mut self, buf: Bytes) {
        self.pending.push_back(PendingWrite::new(buf));
    }

    /// 队列是否已排空。
    pub(crate) fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// 仍未被传输接受的字节总数。
    pub(crate) fn outstanding(&self) -> usize {
        self.pending.iter().map(|p| p.remaining().len()).sum()
    }

    /// 对队头缓冲执行一次写入尝试，返回被接受的字节数。
    ///
    /// 空队列直接返回 `Ok(0)`；零长缓冲出队后同样返回 `Ok(0)`。传输
    /// 报告接受 0 字节视作写端已不可用，转换为 `WriteZero` 错误。
    pub(crate) async fn copy_step<W>(&mut self, writer: &mut W) -> io::Result<usize>
    where
        W: AsyncWrite + Unpin,
    {
        let Some(head) = self.pending.front_mut() else {
            return Ok(0);
        };
        if head.buf.is_empty() {
            self.pending.pop_front();
            return Ok(0);
        }

        let accepted = writer.write(head.remaining()).await?;
        if accepted == 0 {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                "transport accepted no queued bytes",
            ));
        }
        head.written += accepted;
        if head.is_consumed() {
            self.pending.pop_front();
        }
        Ok(accepted)
    }
}
