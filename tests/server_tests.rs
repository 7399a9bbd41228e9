//! Serves the router on a real socket and checks graceful shutdown.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use aims_backend::health::{HealthReporter, LivenessCheck, ProbeError};
use aims_backend::http::serve;
use aims_backend::routes::create_router;
use aims_backend::state::AppState;
use async_trait::async_trait;
use axum_server::Handle;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

struct AlwaysUp;

#[async_trait]
impl LivenessCheck for AlwaysUp {
    async fn ping(&self) -> Result<(), ProbeError> {
        Ok(())
    }
}

async fn raw_get(addr: SocketAddr, path: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!(
        "GET {} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
        path
    );
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    response
}

#[tokio::test]
async fn test_serves_health_and_shuts_down_gracefully() {
    let health = HealthReporter::new(Arc::new(AlwaysUp), Duration::from_secs(1));
    let app = create_router(AppState::new(health));

    let handle = Handle::new();
    let server = tokio::spawn(serve(
        app,
        SocketAddr::from(([127, 0, 0, 1], 0)),
        handle.clone(),
    ));

    let addr = handle.listening().await.expect("server failed to bind");
    let response = raw_get(addr, "/health").await;
    assert!(response.starts_with("HTTP/1.1 200"), "{}", response);
    assert!(response.ends_with(r#"{"status":"active","message":"AIMS System is running"}"#));

    handle.graceful_shutdown(Some(Duration::from_secs(1)));
    let result = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server did not stop")
        .unwrap();
    assert!(result.is_ok());
}
