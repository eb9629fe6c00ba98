//! Shared utilities for relay integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use case_relay::config::{LimitsConfig, RelayConfig, Role, TimeoutConfig};
use case_relay::error::RelayError;
use case_relay::http::{HeaderField, HttpMessage};
use case_relay::lifecycle::Shutdown;
use case_relay::net::{ConnectionId, ConnectionTracker, HttpConnection, Listener};
use case_relay::operator::Operator;
use case_relay::RelayServer;

pub const WAIT: Duration = Duration::from_secs(5);

/// Web server that answers every request with `body` and reports the
/// request heads it saw.
pub struct MockWebServer {
    pub addr: SocketAddr,
    pub requests: mpsc::UnboundedReceiver<String>,
}

pub async fn start_mock_web_server(body: &'static str) -> MockWebServer {
    start_web_server(move |head| {
        let payload = if head.starts_with("HEAD ") { "" } else { body };
        format!(
            "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            payload
        )
    })
    .await
}

/// Web server that answers every request with the same raw bytes.
pub async fn start_raw_web_server(response: &'static str) -> MockWebServer {
    start_web_server(move |_| response.to_string()).await
}

async fn start_web_server<F>(respond: F) -> MockWebServer
where
    F: Fn(&str) -> String + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, requests) = mpsc::unbounded_channel();
    let respond = Arc::new(respond);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let tx = tx.clone();
                    let respond = Arc::clone(&respond);
                    tokio::spawn(async move {
                        let mut head = Vec::new();
                        let mut buf = [0u8; 1024];
                        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                            match socket.read(&mut buf).await {
                                Ok(0) | Err(_) => return,
                                Ok(n) => head.extend_from_slice(&buf[..n]),
                            }
                        }
                        let head = String::from_utf8_lossy(&head).into_owned();
                        let response = respond(&head);
                        let _ = tx.send(head);

                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    MockWebServer { addr, requests }
}

/// Operator that answers prompts from a queue and reports deliveries.
pub struct ScriptedOperator {
    outgoing: Mutex<VecDeque<Vec<u8>>>,
    delivered: mpsc::UnboundedSender<Vec<u8>>,
    carrier_prompts: AtomicUsize,
}

impl ScriptedOperator {
    pub fn new(messages: &[&str]) -> (Arc<Self>, mpsc::UnboundedReceiver<Vec<u8>>) {
        let (delivered, rx) = mpsc::unbounded_channel();
        let operator = Self {
            outgoing: Mutex::new(messages.iter().map(|m| m.as_bytes().to_vec()).collect()),
            delivered,
            carrier_prompts: AtomicUsize::new(0),
        };
        (Arc::new(operator), rx)
    }

    pub fn carrier_prompts(&self) -> usize {
        self.carrier_prompts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Operator for ScriptedOperator {
    async fn compose(&self, _session: ConnectionId) -> Result<Vec<u8>, RelayError> {
        self.outgoing
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(RelayError::OperatorClosed)
    }

    async fn deliver(&self, _session: ConnectionId, message: &[u8]) {
        let _ = self.delivered.send(message.to_vec());
    }

    async fn awaiting_carrier(&self, _session: ConnectionId, _remaining_bits: usize) {
        self.carrier_prompts.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn relay_config(role: Role, peer: SocketAddr) -> RelayConfig {
    let mut config = RelayConfig::default();
    config.role = role;
    config.peer.host = peer.ip().to_string();
    config.peer.port = peer.port();
    config.timeouts.connect_secs = 2;
    config.timeouts.read_secs = 5;
    config.timeouts.write_secs = 2;
    config
}

/// A relay running on an ephemeral loopback port.
pub struct RunningRelay {
    pub addr: SocketAddr,
    pub sessions: ConnectionTracker,
    _shutdown: Shutdown,
}

impl RunningRelay {
    /// Wait until no session is live.
    pub async fn wait_idle(&self) {
        tokio::time::timeout(WAIT, async {
            while self.sessions.active_count() > 0 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("sessions still running");
    }
}

pub async fn start_relay(config: RelayConfig, operator: Arc<ScriptedOperator>) -> RunningRelay {
    let listener = Listener::bind_addr("127.0.0.1:0".parse().unwrap(), &config.listener)
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = RelayServer::new(config, operator);
    let sessions = server.tracker().clone();
    tokio::spawn(server.run(listener, shutdown.subscribe()));
    RunningRelay {
        addr,
        sessions,
        _shutdown: shutdown,
    }
}

/// A browser connection to the client relay.
pub async fn open_browser(relay: SocketAddr) -> HttpConnection {
    HttpConnection::connect(relay, LimitsConfig::default(), TimeoutConfig::default())
        .await
        .unwrap()
}

/// A plain browser GET for `host`.
pub fn browser_request(host: SocketAddr) -> HttpMessage {
    let raw = format!(
        "GET /index.html HTTP/1.1\r\nHost: {}\r\nUser-Agent: Mozilla/5.0\r\nAccept: text/html\r\n\r\n",
        host
    );
    HttpMessage::from_bytes(raw.as_bytes()).unwrap()
}

/// A HEAD for `host`.
pub fn head_request(host: SocketAddr) -> HttpMessage {
    let raw = format!(
        "HEAD /index.html HTTP/1.1\r\nHost: {}\r\nUser-Agent: Mozilla/5.0\r\nAccept: text/html\r\n\r\n",
        host
    );
    HttpMessage::from_bytes(raw.as_bytes()).unwrap()
}

/// A GET whose only header is `Host`.
pub fn host_only_request(host: SocketAddr) -> HttpMessage {
    let mut request = HttpMessage::from_bytes(b"GET / HTTP/1.1\r\n\r\n").unwrap();
    request
        .headers
        .push(HeaderField::new("Host", format!(" {}", host)));
    request
}

pub async fn recv_within<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> T {
    tokio::time::timeout(WAIT, rx.recv())
        .await
        .expect("timed out")
        .expect("channel closed")
}
