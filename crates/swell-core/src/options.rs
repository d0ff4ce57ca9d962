//! 打开套接字时的一次性配置项。

use core::fmt;

/// 输出积压的高水位（字节）。`send` 后积压达到该值即返回 `false`，
/// 提示调用方等待 `drain` 再继续灌入。
pub const SEND_BUFFER_THRESHOLD: usize = 64 * 1024;

/// 入站载荷的解释方式，打开后不可变更。
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum BinaryType {
    /// 字节按 UTF-8 宽松解码为字符串投递。
    #[default]
    Text,
    /// 字节以独立所有权的缓冲原样投递。
    Binary,
}

impl fmt::Display for BinaryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BinaryType::Text => "string",
            BinaryType::Binary => "arraybuffer",
        })
    }
}

/// `open` 的配置集合，Builder 风格逐项叠加。
///
/// # 教案式说明
/// - **Why**：`useTLS` 与 `binaryType` 决定传输包装与载荷形态，必须在
///   打开时一次性锁定，运行期不可切换；集中成结构体避免长参数列表。
/// - **What**：`with_*` 返回新配置；各 getter 仅读取，无副作用。
#[derive(Clone, Copy, Debug, Default)]
pub struct SocketOptions {
    use_tls: bool,
    binary_type: BinaryType,
}

impl SocketOptions {
    /// 默认配置：明文传输、文本载荷。
    pub const fn new() -> Self {
        Self {
            use_tls: false,
            binary_type: BinaryType::Text,
        }
    }

    /// 是否以 TLS 包装传输。
    pub const fn with_use_tls(mut self, use_tls: bool) -> Self {
        self.use_tls = use_tls;
        self
    }

    /// 设定入站载荷形态。
    pub const fn with_binary_type(mut self, binary_type: BinaryType) -> Self {
        self.binary_type = binary_type;
        self
    }

    /// 读取 TLS 开关。
    pub const fn use_tls(&self) -> bool {
        self.use_tls
    }

    /// 读取载荷形态。
    pub const fn binary_type(&self) -> BinaryType {
        self.binary_type
    }
}
