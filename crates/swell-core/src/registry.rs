//! 显式的存活套接字注册表。
//!
//! # 教案式说明
//! - **Why**：原生实现以进程级全局表（按窗口/上下文索引）追踪存活
//!   套接字，宿主销毁时靠观察者广播逐个清理；环境全局状态难以测试，
//!   也让所有权关系变得隐晦。这里改为显式对象：由调用方构造注册表
//!   并以引用传入套接字构造函数，register/unregister 生命周期一目了然。
//! - **How**：内部为互斥保护的哈希表，键是单调递增的 [`SocketId`]；
//!   表项只持有弱引用的关闭控制柄 [`SocketControl`]，注册表因此不会
//!   延长套接字的生命周期。
//! - **What**：`register` 返回新分配的 ID；`unregister` 在套接字终止时
//!   由驱动方调用；`close_all` 对应宿主销毁场景，对所有仍存活的实例
//!   发起优雅关闭请求。

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, Weak};

/// 注册表分配的套接字标识。
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct SocketId(u64);

impl fmt::Display for SocketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "socket-{}", self.0)
    }
}

/// 注册表记录的连接元数据，仅供诊断展示。
#[derive(Clone, Debug)]
pub struct SocketMeta {
    pub host: String,
    pub port: u16,
    pub use_tls: bool,
}

/// 注册表向套接字发起关闭请求所需的最小接口。
///
/// 实现方必须保证 `request_close` 幂等且不阻塞。
pub trait SocketControl: Send + Sync {
    /// 请求优雅关闭；等价于调用方主动 `close()`。
    fn request_close(&self);
}

#[derive(Debug)]
struct RegistryEntry {
    meta: SocketMeta,
    control: Weak<dyn SocketControl>,
}

/// 存活套接字注册表。
#[derive(Debug, Default)]
pub struct SocketRegistry {
    entries: Mutex<HashMap<u64, RegistryEntry>>,
    next_id: AtomicU64,
}

impl SocketRegistry {
    /// 构造空注册表。
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记一个新套接字，返回分配的 ID。
    pub fn register(&self, meta: SocketMeta, control: Weak<dyn SocketControl>) -> SocketId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut entries = self.lock_entries();
        entries.insert(id, RegistryEntry { meta, control });
        SocketId(id)
    }

    /// 注销套接字；返回是否确实存在对应表项。
    pub fn unregister(&self, id: SocketId) -> bool {
        self.lock_entries().remove(&id.0).is_some()
    }

    /// 当前登记的套接字数量。
    pub fn len(&self) -> usize {
        self.lock_entries().len()
    }

    /// 注册表是否为空。
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 读取某个套接字的诊断元数据。
    pub fn meta(&self, id: SocketId) -> Option<SocketMeta> {
        self.lock_entries().get(&id.0).map(|entry| entry.meta.clone())
    }

    /// 对所有仍存活的套接字发起关闭请求。
    ///
    /// 对应宿主上下文销毁的场景：请求在锁外逐个下发，已经消亡的弱引
    /// 用直接跳过；表项本身由各套接字终止时自行注销。
    pub fn close_all(&self) {
        let controls: Vec<_> = {
            let entries = self.lock_entries();
            entries
                .values()
                .filter_map(|entry| entry.control.upgrade())
                .collect()
        };
        for control in controls {
            control.request_close();
        }
    }

    fn lock_entries(&self) -> std::sync::MutexGuard<'_, HashMap<u64, RegistryEntry>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;

    struct CountingControl {
        closes: AtomicUsize,
    }

    impl SocketControl for CountingControl {
        fn request_close(&self) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn meta(host: &str, port: u16) -> SocketMeta {
        SocketMeta {
            host: host.to_owned(),
            port,
            use_tls: false,
        }
    }

    #[test]
    fn register_and_unregister_round_trip() {
        let registry = SocketRegistry::new();
        let control = Arc::new(CountingControl {
            closes: AtomicUsize::new(0),
        });
        let id = registry.register(
            meta("example.com", 80),
            Arc::downgrade(&control) as Weak<dyn SocketControl>,
        );
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.meta(id).unwrap().host, "example.com");
        assert!(registry.unregister(id));
        assert!(!registry.unregister(id), "重复注销应返回 false");
        assert!(registry.is_empty());
    }

    #[test]
    fn close_all_reaches_every_live_socket() {
        let registry = SocketRegistry::new();
        let alive = Arc::new(CountingControl {
            closes: AtomicUsize::new(0),
        });
        let dropped = Arc::new(CountingControl {
            closes: AtomicUsize::new(0),
        });
        registry.register(
            meta("a", 1),
            Arc::downgrade(&alive) as Weak<dyn SocketControl>,
        );
        registry.register(
            meta("b", 2),
            Arc::downgrade(&dropped) as Weak<dyn SocketControl>,
        );
        drop(dropped);

        registry.close_all();
        assert_eq!(alive.closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn ids_are_unique_across_registrations() {
        let registry = SocketRegistry::new();
        let control = Arc::new(CountingControl {
            closes: AtomicUsize::new(0),
        });
        let a = registry.register(
            meta("a", 1),
            Arc::downgrade(&control) as Weak<dyn SocketControl>,
        );
        let b = registry.register(
            meta("b", 2),
            Arc::downgrade(&control) as Weak<dyn SocketControl>,
        );
        assert_ne!(a, b);
    }
}
