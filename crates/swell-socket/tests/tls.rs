//! TLS 路径端到端测试：信任链内回显与不可信签发者的安全分类。

use std::sync::Arc;
use std::time::Duration;

use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use rustls::{ClientConfig, RootCertStore, ServerConfig};
use swell_core::prelude::{
    CloseEvent, DataEvent, DataPayload, ErrorEvent, OpenEvent, SocketErrorKind, SocketListener,
    SocketOptions, SocketRegistry,
};
use swell_socket::{TcpSocket, TransportFactory};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_rustls::TlsAcceptor;

#[derive(Debug)]
enum Record {
    Open,
    Data(DataPayload),
    Error(SocketErrorKind),
    Close,
}

struct Recorder {
    tx: mpsc::UnboundedSender<Record>,
}

impl SocketListener for Recorder {
    fn on_open(&self, _event: OpenEvent) {
        let _ = self.tx.send(Record::Open);
    }

    fn on_data(&self, event: DataEvent) {
        let _ = self.tx.send(Record::Data(event.payload));
    }

    fn on_error(&self, event: ErrorEvent) {
        let _ = self.tx.send(Record::Error(event.error.kind()));
    }

    fn on_close(&self, _event: CloseEvent) {
        let _ = self.tx.send(Record::Close);
    }
}

fn recorder() -> (Arc<Recorder>, mpsc::UnboundedReceiver<Record>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Arc::new(Recorder { tx }), rx)
}

async fn next_record(rx: &mut mpsc::UnboundedReceiver<Record>) -> Record {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("等待事件超时")
        .expect("事件通道提前关闭")
}

/// 为 `localhost` 签发自签名证书，返回证书 DER 与私钥。
fn self_signed_identity() -> (CertificateDer<'static>, PrivateKeyDer<'static>) {
    let certified = rcgen::generate_simple_self_signed(vec!["localhost".to_owned()])
        .expect("generate certificate");
    let cert = certified.cert.der().clone();
    let key = PrivateKeyDer::from(PrivatePkcs8KeyDer::from(
        certified.key_pair.serialize_der(),
    ));
    (cert, key)
}

/// 以给定身份启动 TLS 回显服务器，返回监听端口。
async fn spawn_tls_echo_server(cert: CertificateDer<'static>, key: PrivateKeyDer<'static>) -> u16 {
    let config = ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(vec![cert], key)
        .expect("server config");
    let acceptor = TlsAcceptor::from(Arc::new(config));

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("addr").port();
    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            let acceptor = acceptor.clone();
            tokio::spawn(async move {
                // 握手失败（比如客户端拒绝证书）直接丢弃连接。
                let Ok(mut stream) = acceptor.accept(stream).await else {
                    return;
                };
                let mut buf = [0u8; 4096];
                loop {
                    match stream.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => {
                            if stream.write_all(&buf[..n]).await.is_err() {
                                return;
                            }
                        }
                    }
                }
            });
        }
    });
    port
}

fn client_config_trusting(cert: &CertificateDer<'static>) -> ClientConfig {
    let mut roots = RootCertStore::empty();
    roots.add(cert.clone()).expect("add root");
    ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth()
}

fn client_config_empty_roots() -> ClientConfig {
    ClientConfig::builder()
        .with_root_certificates(RootCertStore::empty())
        .with_no_client_auth()
}

#[tokio::test(flavor = "multi_thread")]
async fn trusted_tls_echo_round_trip() {
    let (cert, key) = self_signed_identity();
    let port = spawn_tls_echo_server(cert.clone(), key).await;

    let registry = Arc::new(SocketRegistry::new());
    let factory = Arc::new(
        TransportFactory::new().with_tls_config(Arc::new(client_config_trusting(&cert))),
    );
    let (recorder, mut rx) = recorder();
    let socket = TcpSocket::open(
        &registry,
        factory,
        recorder,
        "localhost",
        port,
        SocketOptions::new().with_use_tls(true),
    )
    .expect("open");
    assert!(socket.use_tls());

    assert!(matches!(next_record(&mut rx).await, Record::Open));
    socket.send_text("over tls").expect("send");
    match next_record(&mut rx).await {
        Record::Data(DataPayload::Text(text)) => assert_eq!(text, "over tls"),
        other => panic!("期待 data 事件，收到 {other:?}"),
    }

    socket.close();
    loop {
        match next_record(&mut rx).await {
            Record::Close => break,
            Record::Data(_) => {}
            other => panic!("期待 close，收到 {other:?}"),
        }
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn untrusted_issuer_classifies_as_security_error() {
    let (cert, key) = self_signed_identity();
    let port = spawn_tls_echo_server(cert, key).await;

    let registry = Arc::new(SocketRegistry::new());
    let factory = Arc::new(
        TransportFactory::new().with_tls_config(Arc::new(client_config_empty_roots())),
    );
    let (recorder, mut rx) = recorder();
    let _socket = TcpSocket::open(
        &registry,
        factory,
        recorder,
        "localhost",
        port,
        SocketOptions::new().with_use_tls(true),
    )
    .expect("open");

    match next_record(&mut rx).await {
        Record::Error(kind) => {
            assert_eq!(kind, SocketErrorKind::UntrustedIssuer);
            assert!(kind.class().is_security());
        }
        other => panic!("期待 error 事件，收到 {other:?}"),
    }
    assert!(matches!(next_record(&mut rx).await, Record::Close));
    assert!(registry.is_empty());
}
