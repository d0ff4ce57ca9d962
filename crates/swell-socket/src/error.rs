//! 原生 I/O 与 TLS 错误到契约分类法的映射。
//!
//! # 教案式说明
//!
//! ## 意图（Why）
//! - 把 `std::io::Error` 与 `rustls` 的错误统一映射到
//!   [`SocketErrorKind`]，应用层据此分支，无需解析底层库细节；
//! - 分类必须总是给出结果：未识别的码落入所属类别的兜底桶
//!   （`Security` / `Network`），绝不抛出、绝不静默。
//!
//! ## 逻辑（How）
//! - [`OperationKind`] 描述一类操作的默认文案，拼入最终错误消息；
//! - [`map_io_error`] 先探测错误链中是否嵌套 `rustls::Error`（安全类），
//!   否则按 `io::ErrorKind` 走网络类映射；
//! - 证书类细分在 [`classify_certificate_error`] 中显式逐项枚举——这是
//!   对旧实现按数值区段猜测错误模块做法的刻意替换，映射表即契约。
//!
//! ## 注意事项（Trade-offs）
//! - `rustls` 不单独区分"签名算法被禁用"与"签名验证失败"，这里将
//!   `BadSignature` 归入前者，保证该种类有确定的产生路径；
//! - DNS 解析失败在不同平台上的 `io::ErrorKind` 并不稳定，因此解析
//!   阶段不走通用映射，由 [`dns_error`] 直接定类。

use std::io;

use rustls::CertificateError;
use swell_core::prelude::{SocketError, SocketErrorKind};

/// 描述一次底层操作的默认文案。
#[derive(Clone, Copy)]
pub(crate) struct OperationKind {
    pub message: &'static str,
}

pub(crate) const RESOLVE: OperationKind = OperationKind {
    message: "dns resolve",
};
pub(crate) const CONNECT: OperationKind = OperationKind {
    message: "tcp connect",
};
pub(crate) const HANDSHAKE: OperationKind = OperationKind {
    message: "tls handshake",
};
pub(crate) const READ: OperationKind = OperationKind {
    message: "socket read",
};
pub(crate) const WRITE: OperationKind = OperationKind {
    message: "socket write",
};

/// 将 IO 错误映射为契约错误，自动完成安全/网络分类。
pub(crate) fn map_io_error(kind: OperationKind, error: io::Error) -> SocketError {
    let classified = classify_io_error(&error);
    SocketError::new(classified, format!("{}: {}", kind.message, error)).with_cause(error)
}

/// 主机名解析失败的专用构造。
pub(crate) fn dns_error(host: &str, error: io::Error) -> SocketError {
    SocketError::new(
        SocketErrorKind::DomainNotFound,
        format!("{}: {} ({})", RESOLVE.message, host, error),
    )
    .with_cause(error)
}

fn classify_io_error(error: &io::Error) -> SocketErrorKind {
    if let Some(tls) = extract_tls_error(error) {
        return classify_tls_error(tls);
    }
    classify_network_kind(error.kind())
}

/// TLS 故障经由 `tokio-rustls` 以 `io::Error` 包裹上抛，这里取回内嵌
/// 的 `rustls::Error` 以进入安全类细分。
fn extract_tls_error(error: &io::Error) -> Option<&rustls::Error> {
    error
        .get_ref()
        .and_then(|inner| inner.downcast_ref::<rustls::Error>())
}

/// 安全类细分：证书问题走证书表，协议问题按变体归类。
pub(crate) fn classify_tls_error(error: &rustls::Error) -> SocketErrorKind {
    match error {
        rustls::Error::InvalidCertificate(cert) => classify_certificate_error(cert),
        rustls::Error::NoCertificatesPresented => SocketErrorKind::NoCertificate,
        rustls::Error::PeerIncompatible(_) => SocketErrorKind::UnsupportedTlsVersion,
        _ => SocketErrorKind::Security,
    }
}

fn classify_certificate_error(error: &CertificateError) -> SocketErrorKind {
    match error {
        CertificateError::Expired | CertificateError::NotValidYet => {
            SocketErrorKind::CertificateExpired
        }
        CertificateError::Revoked => SocketErrorKind::CertificateRevoked,
        CertificateError::UnknownIssuer => SocketErrorKind::UntrustedIssuer,
        CertificateError::InvalidPurpose => SocketErrorKind::InadequateKeyUsage,
        CertificateError::BadSignature => SocketErrorKind::SignatureAlgorithmDisabled,
        CertificateError::BadEncoding => SocketErrorKind::BadCertificate,
        CertificateError::UnhandledCriticalExtension => {
            SocketErrorKind::UnsupportedCertificateType
        }
        CertificateError::NotValidForName => SocketErrorKind::CertificateDomainMismatch,
        _ => SocketErrorKind::Security,
    }
}

fn classify_network_kind(kind: io::ErrorKind) -> SocketErrorKind {
    use io::ErrorKind;
    match kind {
        ErrorKind::ConnectionRefused => SocketErrorKind::ConnectionRefused,
        ErrorKind::TimedOut => SocketErrorKind::NetworkTimeout,
        ErrorKind::Interrupted
        | ErrorKind::ConnectionReset
        | ErrorKind::ConnectionAborted
        | ErrorKind::BrokenPipe
        | ErrorKind::UnexpectedEof
        | ErrorKind::WriteZero => SocketErrorKind::NetworkInterrupt,
        _ => SocketErrorKind::Network,
    }
}
