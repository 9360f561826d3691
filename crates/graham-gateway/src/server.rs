// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Loopback HTTP listener for the gateway.
//
// # Bind address
//
// The server refuses any address that is not loopback. Binding wider would
// hand raw device writes to every host on the network, and CORS is wide
// open on the assumption that only local pages can reach us.
//
// # Lifecycle
//
// `start` binds and spawns the accept loop on the current Tokio runtime;
// each connection is served on its own task and each dispatch on the
// blocking pool. `stop` exists for tests and orderly teardown. In the
// running bridge nothing calls it: the process exits from the control
// surface and takes any in-flight request with it.

use std::net::SocketAddr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use graham_core::BridgeConfig;
use graham_core::error::{BridgeError, Result};
use graham_core::types::ServerStatus;

use crate::routes::{GatewayState, router};

/// The gateway's HTTP server.
pub struct BridgeServer {
    /// Requested bind address (always loopback).
    addr: SocketAddr,
    /// Address actually bound, once running. Differs from `addr` for port 0.
    local_addr: Option<SocketAddr>,
    /// Current lifecycle state of the server.
    status: ServerStatus,
    /// When the listener came up.
    started_at: Option<DateTime<Utc>>,
    /// Notification handle used to signal a graceful shutdown.
    shutdown_signal: Arc<Notify>,
    /// Handle to the Tokio task running the accept loop.
    task_handle: Option<JoinHandle<()>>,
}

impl BridgeServer {
    /// Create a server for `addr` in `Stopped` state.
    ///
    /// # Errors
    ///
    /// `NonLoopbackBind` if `addr` is not a loopback address.
    pub fn new(addr: SocketAddr) -> Result<Self> {
        if !addr.ip().is_loopback() {
            return Err(BridgeError::NonLoopbackBind(addr));
        }
        Ok(Self {
            addr,
            local_addr: None,
            status: ServerStatus::Stopped,
            started_at: None,
            shutdown_signal: Arc::new(Notify::new()),
            task_handle: None,
        })
    }

    /// Server for the configured loopback port.
    pub fn from_config(config: &BridgeConfig) -> Result<Self> {
        Self::new(config.bind_addr())
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Bound address while running.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    pub fn status(&self) -> ServerStatus {
        self.status
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Bind the listener and start serving in the background.
    ///
    /// # Errors
    ///
    /// Returns `Server` if the port is in use or the listener cannot be
    /// created; the server is then left in `Error` state.
    pub async fn start(&mut self, state: GatewayState) -> Result<SocketAddr> {
        if let (ServerStatus::Running, Some(bound)) = (self.status, self.local_addr) {
            debug!(addr = %bound, "bridge server already running");
            return Ok(bound);
        }

        self.status = ServerStatus::Starting;

        let (listener, bound) = match self.listen().await {
            Ok(listening) => listening,
            Err(e) => {
                self.status = ServerStatus::Error;
                return Err(e);
            }
        };

        info!(addr = %bound, platform = state.dispatcher.platform_name(), "bridge listening");

        let app = router(state);
        let shutdown = Arc::clone(&self.shutdown_signal);

        let handle = tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async move { shutdown.notified().await })
                .await;
            match result {
                Ok(()) => debug!(addr = %bound, "accept loop finished"),
                Err(e) => error!(addr = %bound, error = %e, "accept loop failed"),
            }
        });

        self.local_addr = Some(bound);
        self.started_at = Some(Utc::now());
        self.task_handle = Some(handle);
        self.status = ServerStatus::Running;
        Ok(bound)
    }

    async fn listen(&self) -> Result<(TcpListener, SocketAddr)> {
        let listener = TcpListener::bind(self.addr)
            .await
            .map_err(|e| BridgeError::Server(format!("bind {}: {e}", self.addr)))?;
        let bound = listener
            .local_addr()
            .map_err(|e| BridgeError::Server(format!("local address: {e}")))?;
        Ok((listener, bound))
    }

    /// Stop accepting connections and wait for the accept loop to exit.
    pub async fn stop(&mut self) -> Result<()> {
        if self.status != ServerStatus::Running {
            return Ok(());
        }

        info!(addr = %self.addr, "stopping bridge server");
        self.shutdown_signal.notify_one();

        if let Some(handle) = self.task_handle.take() {
            handle
                .await
                .map_err(|e| BridgeError::Server(format!("task join: {e}")))?;
        }

        self.local_addr = None;
        self.started_at = None;
        self.status = ServerStatus::Stopped;
        info!(addr = %self.addr, "bridge server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    use graham_spool::Dispatcher;
    use graham_spool::simulated::SimulatedPort;

    use super::*;

    fn state(port: &SimulatedPort) -> GatewayState {
        GatewayState::new(
            Dispatcher::new(Arc::new(port.clone()), "Braille Vibe Job"),
            1024 * 1024,
        )
    }

    async fn raw_request(addr: SocketAddr, request: String) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).await.unwrap();
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn get_status() -> String {
        "GET /status HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n".to_owned()
    }

    #[test]
    fn wildcard_bind_is_refused() {
        let addr: SocketAddr = "0.0.0.0:8080".parse().unwrap();
        assert!(matches!(
            BridgeServer::new(addr),
            Err(BridgeError::NonLoopbackBind(_))
        ));

        let lan: SocketAddr = "192.168.1.20:8080".parse().unwrap();
        assert!(BridgeServer::new(lan).is_err());
    }

    #[test]
    fn config_address_is_loopback() {
        let server = BridgeServer::from_config(&BridgeConfig::default()).unwrap();
        assert!(server.addr().ip().is_loopback());
        assert_eq!(server.status(), ServerStatus::Stopped);
    }

    #[tokio::test]
    async fn serves_status_and_print_over_tcp() {
        let port = SimulatedPort::new();
        let mut server = BridgeServer::new("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = server.start(state(&port)).await.unwrap();
        assert_eq!(server.status(), ServerStatus::Running);
        assert!(server.started_at().is_some());

        let response = raw_request(addr, get_status()).await;
        assert!(response.starts_with("HTTP/1.1 200"), "{response}");
        assert!(response.contains(r#""status":"ok""#), "{response}");

        let body = r#"{"printer":"Embosser1","data":"aGVsbG8="}"#;
        let response = raw_request(
            addr,
            format!(
                "POST /print HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            ),
        )
        .await;
        assert!(response.contains(r#"{"status":"queued"}"#), "{response}");
        assert_eq!(port.written(), b"hello");

        server.stop().await.unwrap();
        assert_eq!(server.status(), ServerStatus::Stopped);
    }

    #[tokio::test]
    async fn second_bind_on_same_port_fails() {
        let port = SimulatedPort::new();
        let mut first = BridgeServer::new("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = first.start(state(&port)).await.unwrap();

        let mut second = BridgeServer::new(addr).unwrap();
        assert!(matches!(
            second.start(state(&port)).await,
            Err(BridgeError::Server(_))
        ));
        assert_eq!(second.status(), ServerStatus::Error);
        assert!(second.local_addr().is_none());
        assert!(second.started_at().is_none());

        first.stop().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn probe_answers_while_a_foreground_loop_runs() {
        let port = SimulatedPort::new();
        let mut server = BridgeServer::new("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = server.start(state(&port)).await.unwrap();

        // Stand-in for the control surface: a blocking loop on its own thread.
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let foreground = std::thread::spawn(move || {
            while flag.load(Ordering::Relaxed) {
                std::thread::sleep(Duration::from_millis(1));
            }
        });

        let probes: Vec<_> = (0..16)
            .map(|_| tokio::spawn(raw_request(addr, get_status())))
            .collect();
        for probe in probes {
            let response = probe.await.unwrap();
            assert!(response.contains(r#""status":"ok""#), "{response}");
        }

        running.store(false, Ordering::Relaxed);
        foreground.join().unwrap();
        server.stop().await.unwrap();
    }
}
