//! # error 模块说明
//!
//! ## 角色定位（Why）
//! - 为套接字向应用层暴露的全部故障提供集中定义：同步的用法错误、
//!   异步的网络类故障、TLS 协商阶段的安全类故障；
//! - 分类必须是确定且穷尽的——分类器本身永不失败，未识别的底层码
//!   一律落入所属类别的兜底桶，绝不静默丢弃。
//!
//! ## 设计要求（What）
//! - 错误以稳定错误码（`swell.socket.*`）+ 语义种类 [`SocketErrorKind`]
//!   双轨呈现：错误码供日志与告警聚合，种类供程序化分支；
//! - [`SocketError`] 派生 `thiserror::Error`，携带可选底层原因以兼容
//!   `std::error::Error` 链路。
//!
//! ## 扩展建议（How）
//! - 新增种类时必须同时登记 `class`、`code` 与事件名，三者缺一不可；
//! - 原生实现按数值区段辨别安全模块错误的做法不被继承，映射表必须
//!   显式枚举（见 `swell-socket::error` 中的分类函数）。

use std::borrow::Cow;
use std::error::Error as StdError;

use thiserror::Error;

/// 错误的顶层类别，决定其在事件流中的呈现方式与处置策略。
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ErrorClass {
    /// 调用方违反公开契约（如在非 `open` 状态下 `send`），同步抛出。
    Usage,
    /// 证书本身的问题：过期、吊销、签发方不可信等。
    SecurityCertificate,
    /// TLS 协议层的问题：版本不受支持、握手异常等。
    SecurityProtocol,
    /// 网络层的问题：拒绝连接、超时、解析失败等。
    Network,
}

impl ErrorClass {
    /// 是否属于安全类（证书或协议）。
    pub const fn is_security(self) -> bool {
        matches!(
            self,
            ErrorClass::SecurityCertificate | ErrorClass::SecurityProtocol
        )
    }
}

/// 语义化的错误种类，穷尽列出契约承诺区分的全部故障。
///
/// # 教案式说明
/// - **Why**：应用层依据种类决定提示文案与重试策略，必须与底层库的
///   错误表示解耦；
/// - **What**：每个种类归属唯一的 [`ErrorClass`]，并携带稳定错误码与
///   面向事件消费方的历史名称（`*Error` 后缀），后者与既有消费方的
///   字符串约定保持兼容；
/// - **Trade-offs**：安全类种类的粒度以"调用方能否据此给出不同指引"
///   为准，粒度过细只会造成告警维度膨胀。
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum SocketErrorKind {
    // ---- 用法错误（同步） ----
    /// 当前状态不允许该操作（如未 `open` 即 `send`）。
    InvalidState,
    /// 主机名为空或非法。
    InvalidHost,
    /// 端口为 0，超出 [1, 65535]。
    InvalidPort,
    /// `byte_offset`/`byte_length` 越界。
    InvalidRange,
    /// 载荷形态与 `binaryType` 不符。
    PayloadMismatch,
    /// 请求 TLS 但工厂未配置客户端 TLS 参数。
    TlsNotConfigured,

    // ---- 安全类（异步，TLS 协商或读写期间） ----
    /// 证书已过期（或尚未生效）。
    CertificateExpired,
    /// 证书已被吊销。
    CertificateRevoked,
    /// 签发方不可信或未知。
    UntrustedIssuer,
    /// 证书密钥用途不满足本次握手。
    InadequateKeyUsage,
    /// 证书签名算法已被禁用。
    SignatureAlgorithmDisabled,
    /// 对端未出示证书。
    NoCertificate,
    /// 证书格式或内容损坏。
    BadCertificate,
    /// 证书类型不受支持。
    UnsupportedCertificateType,
    /// 对端要求的 TLS 版本不受支持。
    UnsupportedTlsVersion,
    /// 证书与目标主机名不匹配。
    CertificateDomainMismatch,
    /// 安全类兜底桶。
    Security,

    // ---- 网络类（异步） ----
    /// 对端拒绝连接。
    ConnectionRefused,
    /// 网络操作超时。
    NetworkTimeout,
    /// 主机名解析失败。
    DomainNotFound,
    /// 连接被中断（重置、对端异常断开等）。
    NetworkInterrupt,
    /// 网络类兜底桶。
    Network,
}

impl SocketErrorKind {
    /// 种类所属的顶层类别。
    pub const fn class(self) -> ErrorClass {
        use SocketErrorKind::*;
        match self {
            InvalidState | InvalidHost | InvalidPort | InvalidRange | PayloadMismatch
            | TlsNotConfigured => ErrorClass::Usage,
            CertificateExpired
            | CertificateRevoked
            | UntrustedIssuer
            | InadequateKeyUsage
            | SignatureAlgorithmDisabled
            | BadCertificate
            | UnsupportedCertificateType
            | CertificateDomainMismatch => ErrorClass::SecurityCertificate,
            NoCertificate | UnsupportedTlsVersion | Security => ErrorClass::SecurityProtocol,
            ConnectionRefused | NetworkTimeout | DomainNotFound | NetworkInterrupt | Network => {
                ErrorClass::Network
            }
        }
    }

    /// 稳定错误码，供日志与告警聚合使用。
    pub const fn code(self) -> &'static str {
        use SocketErrorKind::*;
        match self {
            InvalidState => "swell.socket.invalid_state",
            InvalidHost => "swell.socket.invalid_host",
            InvalidPort => "swell.socket.invalid_port",
            InvalidRange => "swell.socket.invalid_range",
            PayloadMismatch => "swell.socket.payload_mismatch",
            TlsNotConfigured => "swell.socket.tls_not_configured",
            CertificateExpired => "swell.socket.security.certificate_expired",
            CertificateRevoked => "swell.socket.security.certificate_revoked",
            UntrustedIssuer => "swell.socket.security.untrusted_issuer",
            InadequateKeyUsage => "swell.socket.security.inadequate_key_usage",
            SignatureAlgorithmDisabled => {
                "swell.socket.security.signature_algorithm_disabled"
            }
            NoCertificate => "swell.socket.security.no_certificate",
            BadCertificate => "swell.socket.security.bad_certificate",
            UnsupportedCertificateType => {
                "swell.socket.security.unsupported_certificate_type"
            }
            UnsupportedTlsVersion => "swell.socket.security.unsupported_tls_version",
            CertificateDomainMismatch => "swell.socket.security.domain_mismatch",
            Security => "swell.socket.security.generic",
            ConnectionRefused => "swell.socket.network.connection_refused",
            NetworkTimeout => "swell.socket.network.timeout",
            DomainNotFound => "swell.socket.network.domain_not_found",
            NetworkInterrupt => "swell.socket.network.interrupt",
            Network => "swell.socket.network.generic",
        }
    }

    /// 面向事件消费方的历史名称，沿用既有消费方约定的 `*Error` 拼写。
    pub const fn event_name(self) -> &'static str {
        use SocketErrorKind::*;
        match self {
            InvalidState => "InvalidStateError",
            InvalidHost => "InvalidHostError",
            InvalidPort => "InvalidPortError",
            InvalidRange => "InvalidRangeError",
            PayloadMismatch => "PayloadMismatchError",
            TlsNotConfigured => "TlsNotConfiguredError",
            CertificateExpired => "SecurityExpiredCertificateError",
            CertificateRevoked => "SecurityRevokedCertificateError",
            UntrustedIssuer => "SecurityUntrustedCertificateIssuerError",
            InadequateKeyUsage => "SecurityInadequateKeyUsageError",
            SignatureAlgorithmDisabled => {
                "SecurityCertificateSignatureAlgorithmDisabledError"
            }
            NoCertificate => "SecurityNoCertificateError",
            BadCertificate => "SecurityBadCertificateError",
            UnsupportedCertificateType => "SecurityUnsupportedCertificateTypeError",
            UnsupportedTlsVersion => "SecurityUnsupportedTLSVersionError",
            CertificateDomainMismatch => "SecurityCertificateDomainMismatchError",
            Security => "SecurityError",
            ConnectionRefused => "ConnectionRefusedError",
            NetworkTimeout => "NetworkTimeoutError",
            DomainNotFound => "DomainNotFoundError",
            NetworkInterrupt => "NetworkInterruptError",
            Network => "NetworkError",
        }
    }
}

/// 套接字错误域的最终形态：稳定码 + 种类 + 可读消息 + 可选根因。
#[derive(Debug, Error)]
#[error("{}: {}", .kind.code(), .message)]
pub struct SocketError {
    kind: SocketErrorKind,
    message: Cow<'static, str>,
    #[source]
    cause: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl SocketError {
    /// 构造错误。`message` 面向排障人员，不应包含敏感信息。
    pub fn new(kind: SocketErrorKind, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            message: message.into(),
            cause: None,
        }
    }

    /// 附带底层原因并返回新错误。
    pub fn with_cause(mut self, cause: impl StdError + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// 语义种类。
    pub fn kind(&self) -> SocketErrorKind {
        self.kind
    }

    /// 顶层类别，等价于 `kind().class()`。
    pub fn class(&self) -> ErrorClass {
        self.kind.class()
    }

    /// 稳定错误码。
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// 可读描述。
    pub fn message(&self) -> &str {
        &self.message
    }

    /// 是否为同步用法错误。
    pub fn is_usage(&self) -> bool {
        matches!(self.class(), ErrorClass::Usage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_KINDS: &[SocketErrorKind] = &[
        SocketErrorKind::InvalidState,
        SocketErrorKind::InvalidHost,
        SocketErrorKind::InvalidPort,
        SocketErrorKind::InvalidRange,
        SocketErrorKind::PayloadMismatch,
        SocketErrorKind::TlsNotConfigured,
        SocketErrorKind::CertificateExpired,
        SocketErrorKind::CertificateRevoked,
        SocketErrorKind::UntrustedIssuer,
        SocketErrorKind::InadequateKeyUsage,
        SocketErrorKind::SignatureAlgorithmDisabled,
        SocketErrorKind::NoCertificate,
        SocketErrorKind::BadCertificate,
        SocketErrorKind::UnsupportedCertificateType,
        SocketErrorKind::UnsupportedTlsVersion,
        SocketErrorKind::CertificateDomainMismatch,
        SocketErrorKind::Security,
        SocketErrorKind::ConnectionRefused,
        SocketErrorKind::NetworkTimeout,
        SocketErrorKind::DomainNotFound,
        SocketErrorKind::NetworkInterrupt,
        SocketErrorKind::Network,
    ];

    #[test]
    fn every_kind_has_distinct_code_and_event_name() {
        let mut codes: Vec<&str> = ALL_KINDS.iter().map(|k| k.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), ALL_KINDS.len(), "错误码必须互不重复");

        let mut names: Vec<&str> = ALL_KINDS.iter().map(|k| k.event_name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), ALL_KINDS.len(), "事件名必须互不重复");
    }

    #[test]
    fn security_kinds_report_security_class() {
        assert!(SocketErrorKind::CertificateExpired.class().is_security());
        assert!(SocketErrorKind::UnsupportedTlsVersion.class().is_security());
        assert_eq!(
            SocketErrorKind::CertificateExpired.class(),
            ErrorClass::SecurityCertificate
        );
        assert_eq!(
            SocketErrorKind::Security.class(),
            ErrorClass::SecurityProtocol
        );
        assert_eq!(SocketErrorKind::Network.class(), ErrorClass::Network);
        assert_eq!(SocketErrorKind::InvalidState.class(), ErrorClass::Usage);
    }

    #[test]
    fn display_carries_stable_code() {
        let err = SocketError::new(SocketErrorKind::ConnectionRefused, "tcp connect refused");
        let rendered = err.to_string();
        assert!(rendered.contains("swell.socket.network.connection_refused"));
        assert!(rendered.contains("tcp connect refused"));
    }

    #[test]
    fn cause_is_exposed_through_source_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = SocketError::new(SocketErrorKind::ConnectionRefused, "tcp connect").with_cause(io);
        assert!(StdError::source(&err).is_some());
    }
}
