#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::watch;

use agora_api::AppState;
use agora_core::config::AppConfig;
use agora_realtime::RealtimeEngine;

pub struct TestServer {
    pub addr: SocketAddr,
    pub state: AppState,
    shutdown: watch::Sender<bool>,
}

impl TestServer {
    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    pub fn stop(&self) {
        let _ = self.shutdown.send(true);
    }
}

pub fn test_state() -> AppState {
    test_state_with(AppConfig::default())
}

pub fn test_state_with(config: AppConfig) -> AppState {
    let engine = RealtimeEngine::new(&config.realtime);
    AppState::new(Arc::new(config), Arc::new(engine))
}

pub async fn spawn_server() -> TestServer {
    spawn_server_with(AppConfig::default()).await
}

pub async fn spawn_server_with(config: AppConfig) -> TestServer {
    let state = test_state_with(config);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (shutdown, mut rx) = watch::channel(false);

    tokio::spawn(agora_api::app::serve(listener, state.clone(), async move {
        let _ = rx.changed().await;
    }));

    TestServer {
        addr,
        state,
        shutdown,
    }
}

/// Polls `check` until it holds or five seconds pass.
pub async fn eventually(mut check: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !check() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached in time"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
