//! 传输工厂：解析目标地址并建立明文或 TLS 包装的字节流。
//!
//! # 教案式说明
//!
//! ## 意图（Why）
//! - 将"地址解析 → TCP 建连 → 可选 TLS 握手"收敛为单一入口，套接字
//!   状态机只面对一个 [`Transport`]，无需感知包装细节；
//! - TLS 协商完全委托给 `rustls`/`tokio-rustls`，本组件不触碰协议字节。
//!
//! ## 契约（What）
//! - `connect` 的每个失败分支都已完成分类：解析失败 → `DomainNotFound`，
//!   建连失败按 `io::ErrorKind` 映射，握手失败进入安全类细分；
//! - 请求 TLS 但未安装客户端配置属于用法错误，调用方应在同步路径上
//!   预先以 [`TransportFactory::supports_tls`] 检查。
//!
//! ## 注意事项（Trade-offs）
//! - 解析结果仅取第一个地址，不做 Happy Eyeballs 式多地址竞速；
//! - `ClientConfig` 以 `Arc` 注入，可在多个套接字间复用同一份根证书。

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use rustls::ClientConfig;
use rustls_pki_types::ServerName;
use swell_core::prelude::{SocketError, SocketErrorKind};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::{TcpStream, lookup_host};
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;

use crate::error::{self, dns_error, map_io_error};

/// 建立明文或 TLS 传输的工厂。
#[derive(Clone, Default)]
pub struct TransportFactory {
    tls: Option<Arc<ClientConfig>>,
}

impl TransportFactory {
    /// 构造仅支持明文的工厂。
    pub fn new() -> Self {
        Self { tls: None }
    }

    /// 安装客户端 TLS 配置，启用 `useTLS` 连接。
    pub fn with_tls_config(mut self, config: Arc<ClientConfig>) -> Self {
        self.tls = Some(config);
        self
    }

    /// 是否已具备发起 TLS 连接的条件。
    pub fn supports_tls(&self) -> bool {
        self.tls.is_some()
    }

    /// 建立到 `(host, port)` 的传输，`use_tls` 决定是否做 TLS 包装。
    pub async fn connect(
        &self,
        host: &str,
        port: u16,
        use_tls: bool,
    ) -> Result<Transport, SocketError> {
        let mut addrs = lookup_host((host, port))
            .await
            .map_err(|err| dns_error(host, err))?;
        let addr = addrs.next().ok_or_else(|| {
            SocketError::new(
                SocketErrorKind::DomainNotFound,
                format!("dns resolve: no address records for {host}"),
            )
        })?;

        let stream = TcpStream::connect(addr)
            .await
            .map_err(|err| map_io_error(error::CONNECT, err))?;

        if !use_tls {
            return Ok(Transport::Plain(stream));
        }

        let config = self.tls.clone().ok_or_else(|| {
            SocketError::new(
                SocketErrorKind::TlsNotConfigured,
                "tls requested but no client config installed",
            )
        })?;
        let server_name = ServerName::try_from(host.to_owned()).map_err(|err| {
            SocketError::new(
                SocketErrorKind::InvalidHost,
                format!("tls server name `{host}` rejected: {err}"),
            )
        })?;
        let stream = TlsConnector::from(config)
            .connect(server_name, stream)
            .await
            .map_err(|err| map_io_error(error::HANDSHAKE, err))?;
        Ok(Transport::Tls(Box::new(stream)))
    }
}

/// 已建立的双向字节流，明文与 TLS 统一为一个类型。
///
/// 两个变体都满足 `Unpin`，读写直接委托给内部流；状态机经由
/// `tokio::io::split` 拆成读写两半后独立驱动。
#[derive(Debug)]
pub enum Transport {
    Plain(TcpStream),
    Tls(Box<TlsStream<TcpStream>>),
}

impl AsyncRead for Transport {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            Transport::Plain(stream) => Pin::new(stream).poll_read(cx, buf),
            Transport::Tls(stream) => Pin::new(stream.as_mut()).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for Transport {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        match self.get_mut() {
            Transport::Plain(stream) => Pin::new(stream).poll_write(cx, buf),
            Transport::Tls(stream) => Pin::new(stream.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            Transport::Plain(stream) => Pin::new(stream).poll_flush(cx),
            Transport::Tls(stream) => Pin::new(stream.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            Transport::Plain(stream) => Pin::new(stream).poll_shutdown(cx),
            Transport::Tls(stream) => Pin::new(stream.as_mut()).poll_shutdown(cx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[tokio::test(flavor = "multi_thread")]
    async fn plain_connect_reaches_local_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("addr").port();
        let server = tokio::spawn(async move {
            let (mut peer, _) = listener.accept().await.expect("accept");
            let mut buf = [0u8; 4];
            peer.read_exact(&mut buf).await.expect("read");
            buf
        });

        let factory = TransportFactory::new();
        let mut transport = factory
            .connect("127.0.0.1", port, false)
            .await
            .expect("connect");
        transport.write_all(b"ping").await.expect("write");
        assert_eq!(&server.await.expect("join"), b"ping");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn refused_connect_classifies_as_connection_refused() {
        // 绑定后立刻释放端口，确保其上没有监听者。
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("addr").port();
        drop(listener);

        let factory = TransportFactory::new();
        let err = factory
            .connect("127.0.0.1", port, false)
            .await
            .expect_err("connect must fail");
        assert_eq!(err.kind(), SocketErrorKind::ConnectionRefused);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn tls_without_config_is_a_usage_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("addr").port();

        let factory = TransportFactory::new();
        assert!(!factory.supports_tls());
        let err = factory
            .connect("127.0.0.1", port, true)
            .await
            .expect_err("tls connect must fail");
        assert_eq!(err.kind(), SocketErrorKind::TlsNotConfigured);
    }
}
