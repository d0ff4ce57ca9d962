//! 套接字生命周期状态与单调推进单元。
//!
//! # 教案式说明
//! - **Why**：套接字的公开契约要求 `readyState` 只能沿
//!   `connecting → open → closing → closed` 单向推进，任何回退都意味着
//!   状态机被破坏；把推进规则收敛到一个类型里，调用方无法绕过。
//! - **How**：[`ReadyState`] 为各状态定义严格递增的序号，
//!   [`StateCell`] 以原子 CAS 实现"只进不退"的推进原语，失败即表示
//!   已有更晚的状态抢先落地。
//! - **What**：`advance` 返回 `bool` 告知本次推进是否生效；读取方通过
//!   `load` 获取当前快照，快照之间满足单调性。

use core::fmt;
use core::sync::atomic::{AtomicU8, Ordering};

/// 套接字对外可见的生命周期状态。
///
/// 序号严格递增，[`StateCell`] 据此拒绝一切回退；`Closed` 为终态，
/// 同一实例不允许重新打开。
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ReadyState {
    /// 传输尚未建立，`open` 已被调用。
    Connecting,
    /// 传输已连通，可读可写。
    Open,
    /// 关闭流程已启动，待输出队列排空。
    Closing,
    /// 双向均已关断，实例永久失效。
    Closed,
}

impl ReadyState {
    /// 状态的单调序号，仅用于推进比较。
    const fn rank(self) -> u8 {
        match self {
            ReadyState::Connecting => 0,
            ReadyState::Open => 1,
            ReadyState::Closing => 2,
            ReadyState::Closed => 3,
        }
    }

    fn from_rank(rank: u8) -> Self {
        match rank {
            0 => ReadyState::Connecting,
            1 => ReadyState::Open,
            2 => ReadyState::Closing,
            _ => ReadyState::Closed,
        }
    }

    /// 是否已进入终态。
    pub const fn is_terminal(self) -> bool {
        matches!(self, ReadyState::Closed)
    }

    /// 对外展示用的小写名称，与事件消费方约定一致。
    pub const fn as_str(self) -> &'static str {
        match self {
            ReadyState::Connecting => "connecting",
            ReadyState::Open => "open",
            ReadyState::Closing => "closing",
            ReadyState::Closed => "closed",
        }
    }
}

impl fmt::Display for ReadyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 跨线程共享的状态单元。
///
/// # 教案式说明
/// - **Why**：公开句柄与驱动任务分属不同执行环境，二者都需要观察并推进
///   状态；互斥锁对这种"单字节、只进不退"的场景过重。
/// - **How**：内部为 `AtomicU8`，`advance` 以 CAS 循环实现仅当目标序号
///   严格大于当前序号时才写入。
/// - **What**：`advance` 返回 `true` 表示本次调用完成了推进；返回
///   `false` 表示状态已等于或晚于目标，调用方应视作幂等无操作。
#[derive(Debug)]
pub struct StateCell(AtomicU8);

impl StateCell {
    /// 以给定初始状态构造。
    pub fn new(state: ReadyState) -> Self {
        Self(AtomicU8::new(state.rank()))
    }

    /// 读取当前状态快照。
    pub fn load(&self) -> ReadyState {
        ReadyState::from_rank(self.0.load(Ordering::Acquire))
    }

    /// 尝试把状态推进到 `next`，仅允许严格前进。
    pub fn advance(&self, next: ReadyState) -> bool {
        let target = next.rank();
        let mut current = self.0.load(Ordering::Acquire);
        loop {
            if current >= target {
                return false;
            }
            match self.0.compare_exchange_weak(
                current,
                target,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(observed) => current = observed,
            }
        }
    }
}

impl Default for StateCell {
    fn default() -> Self {
        Self::new(ReadyState::Connecting)
    }
}
