//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::time::Duration;

use hash_vault::config::ServiceConfig;
use hash_vault::hashing::HashService;
use hash_vault::{HttpServer, ShutdownComplete, ShutdownCoordinator};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// A server running on an ephemeral local port.
pub struct TestServer {
    pub base_url: String,
    pub hashing: Arc<HashService>,
    pub coordinator: Arc<ShutdownCoordinator>,
    pub complete: ShutdownComplete,
    pub handle: JoinHandle<Result<(), std::io::Error>>,
}

/// Start a server with the given hashing delay.
pub async fn start_server(delay: Duration) -> TestServer {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();

    let mut server = HttpServer::new(ServiceConfig::default());
    server.set_delay(delay);
    let complete = server.shutdown_complete().unwrap();
    let coordinator = server.shutdown_handle();
    let hashing = server.hashing();
    let handle = tokio::spawn(server.run(listener));

    TestServer {
        base_url: format!("http://{}", addr),
        hashing,
        coordinator,
        complete,
        handle,
    }
}

/// A client that never reuses connections, so a stopped listener shows up
/// as a connection error instead of a stale pooled socket.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

pub async fn submit(client: &reqwest::Client, base_url: &str, password: &str) -> reqwest::Response {
    client
        .post(format!("{}/hash", base_url))
        .form(&[("password", password)])
        .send()
        .await
        .expect("server unreachable")
}

pub async fn get(client: &reqwest::Client, url: String) -> reqwest::Response {
    client.get(url).send().await.expect("server unreachable")
}
