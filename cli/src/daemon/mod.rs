// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Server hosting and remote access
//!
//! Handles:
//! - Foreground HTTP server with graceful shutdown
//! - HTTP client for a running orchestrator
//! - Liveness checks used by `unison status`

use anyhow::Result;
use std::time::Duration;

pub mod client;
pub mod server;

pub use client::OrchestratorClient;
pub use server::{build_state, run_server};

pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerStatus {
    Running,
    Unhealthy { error: String },
    Stopped,
}

/// Base URL for `host`, which may already carry a scheme.
pub fn base_url(host: &str, port: u16) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        format!("{}:{}", host, port)
    } else {
        format!("http://{}:{}", host, port)
    }
}

/// Check whether an orchestrator answers `GET /health` at `host:port`.
pub async fn check_server(host: &str, port: u16) -> Result<ServerStatus> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_millis(500))
        .build()?;

    let health_url = format!("{}/health", base_url(host, port));

    match client.get(&health_url).send().await {
        Ok(resp) if resp.status().is_success() => Ok(ServerStatus::Running),
        Ok(resp) => Ok(ServerStatus::Unhealthy {
            error: format!("HTTP {}", resp.status()),
        }),
        Err(e) if e.is_connect() || e.is_timeout() => Ok(ServerStatus::Stopped),
        Err(e) => Ok(ServerStatus::Unhealthy {
            error: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_adds_scheme_once() {
        assert_eq!(base_url("127.0.0.1", 8080), "http://127.0.0.1:8080");
        assert_eq!(base_url("https://unison.local/", 443), "https://unison.local:443");
    }

    #[tokio::test]
    async fn test_check_server_running_and_unhealthy() {
        let mut server = mockito::Server::new_async().await;
        let addr = server.socket_address();
        let health = server
            .mock("GET", "/health")
            .with_status(200)
            .with_body(r#"{"status":"ok"}"#)
            .create_async()
            .await;

        let status = check_server(&addr.ip().to_string(), addr.port()).await.unwrap();
        assert_eq!(status, ServerStatus::Running);
        health.remove_async().await;

        server
            .mock("GET", "/health")
            .with_status(500)
            .create_async()
            .await;
        let status = check_server(&addr.ip().to_string(), addr.port()).await.unwrap();
        assert!(matches!(status, ServerStatus::Unhealthy { .. }));
    }

    #[tokio::test]
    async fn test_check_server_stopped() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let status = check_server("127.0.0.1", port).await.unwrap();
        assert_eq!(status, ServerStatus::Stopped);
    }
}
