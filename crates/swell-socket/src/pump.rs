//! 输入泵：按到达顺序拉取入站字节并包装为 `data` 载荷。
//!
//! # 教案式说明
//!
//! ## 意图（Why）
//! - 入站字节以"当下可读多少就读多少"的粒度投递，不做人为分帧；
//! - `suspend`/`resume` 只是停止发起读取——未读的字节停留在传输层
//!   缓冲，不会丢失，恢复后按原顺序继续。
//!
//! ## 契约（What）
//! - [`InputPump::pull`] 返回 `Ok(Some(payload))` 表示一段新数据，
//!   `Ok(None)` 表示对端已半关闭（EOF），错误则为致命流故障；
//! - 挂起计数为带符号数：在传输尚未建立时到达的 `suspend`/`resume`
//!   同样累加，泵启动后自然生效（对齐原生实现的暂存计数）；
//! - 文本模式对 TCP 分段不敏感：跨越两次读取的合法多字节字符会被
//!   原样拼回，结尾的不完整序列留待下一段字节补齐后再解码。
//!
//! ## 注意事项（Trade-offs）
//! - 文本模式采用 UTF-8 宽松解码，真正非法的序列替换为 U+FFFD，不会
//!   使流中断；EOF 时仍未补齐的残留序列同样按无效字节宽松解码；
//! - 二进制模式每次投递独立所有权的定长缓冲，不经过暂存。

use std::io;

use bytes::BytesMut;
use swell_core::prelude::{BinaryType, DataPayload};
use tokio::io::{AsyncRead, AsyncReadExt};

/// 单次读取的缓冲上限；仅限制一次投递的载荷大小，不构成分帧。
const READ_CHUNK: usize = 16 * 1024;

/// 入站方向的读取泵。
#[derive(Debug)]
pub(crate) struct InputPump {
    binary_type: BinaryType,
    suspend_count: i64,
    /// 文本模式下结尾不完整的 UTF-8 序列，等待后续字节补齐。
    carry: BytesMut,
}

impl InputPump {
    pub(crate) fn new(binary_type: BinaryType) -> Self {
        Self {
            binary_type,
            suspend_count: 0,
            carry: BytesMut::new(),
        }
    }

    /// 暂停数据投递（可叠加）。
    pub(crate) fn suspend(&mut self) {
        self.suspend_count += 1;
    }

    /// 恢复数据投递，抵消一次 `suspend`。
    pub(crate) fn resume(&mut self) {
        self.suspend_count -= 1;
    }

    /// 当前是否处于挂起状态。
    pub(crate) fn is_suspended(&self) -> bool {
        self.suspend_count > 0
    }

    /// 从传输拉取一段可用字节并按配置的载荷形态包装。
    ///
    /// 文本模式下若整段字节都是半个多字节字符，则暂存后继续读取，
    /// 直到凑出至少一个可解码的字符；状态都在 `await` 完成后更新，
    /// select 分支落选不会丢字节。
    pub(crate) async fn pull<R>(&mut self, reader: &mut R) -> io::Result<Option<DataPayload>>
    where
        R: AsyncRead + Unpin,
    {
        loop {
            let mut chunk = BytesMut::with_capacity(READ_CHUNK);
            let received = reader.read_buf(&mut chunk).await?;
            if received == 0 {
                if !self.carry.is_empty() {
                    // EOF 永远等不到补齐，残留序列按无效字节宽松解码。
                    let tail = self.carry.split();
                    return Ok(Some(DataPayload::Text(
                        String::from_utf8_lossy(&tail).into_owned(),
                    )));
                }
                return Ok(None);
            }
            match self.binary_type {
                BinaryType::Binary => return Ok(Some(DataPayload::Binary(chunk.freeze()))),
                BinaryType::Text => {
                    self.carry.extend_from_slice(&chunk);
                    let boundary = self.carry.len() - incomplete_suffix_len(&self.carry);
                    if boundary == 0 {
                        continue;
                    }
                    let ready = self.carry.split_to(boundary);
                    return Ok(Some(DataPayload::Text(
                        String::from_utf8_lossy(&ready).into_owned(),
                    )));
                }
            }
        }
    }
}

/// 结尾处不完整 UTF-8 序列的字节数。
///
/// 只回看最后至多 3 个字节：一个合法前导字节声明的长度若超出现有
/// 字节数，这段尾巴就是"半个字符"；非法前导或纯 ASCII 返回 0，交由
/// 宽松解码立即处理。
fn incomplete_suffix_len(bytes: &[u8]) -> usize {
    let len = bytes.len();
    for back in 1..=len.min(3) {
        let byte = bytes[len - back];
        if byte & 0xC0 == 0x80 {
            // 延续字节，继续向前找前导。
            continue;
        }
        let need = match byte {
            0xC2..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF4 => 4,
            _ => return 0,
        };
        return if need > back { back } else { 0 };
    }
    0
}
