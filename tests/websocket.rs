mod common;

use common::{test_state, FakeExtractor};
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tempfile::TempDir;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use ytdlp_job_server::jobs::DownloadJob;
use ytdlp_job_server::server::build_router;

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

async fn next_json(ws: &mut WsStream) -> serde_json::Value {
    let message = tokio::time::timeout(Duration::from_secs(2), ws.next())
        .await
        .expect("no frame within timeout")
        .unwrap()
        .unwrap();
    match message {
        Message::Text(text) => serde_json::from_str(&text).unwrap(),
        other => panic!("unexpected frame: {:?}", other),
    }
}

#[tokio::test]
async fn test_status_stream_pushes_only_changes() {
    let temp_dir = TempDir::new().unwrap();
    let state = test_state(FakeExtractor::default(), temp_dir.path());
    let registry = state.registry.clone();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        axum::serve(listener, build_router(state)).await.unwrap();
    });

    let (mut ws, _) = connect_async(format!("ws://{}/ws/download_status", addr))
        .await
        .unwrap();

    // 空注册表不推送
    let idle = tokio::time::timeout(Duration::from_millis(150), ws.next()).await;
    assert!(idle.is_err());

    registry.create("job-1").unwrap();
    let frame = next_json(&mut ws).await;
    assert_eq!(frame["job-1"]["status"], "queued");

    // 内容未变化时不重复推送
    let idle = tokio::time::timeout(Duration::from_millis(150), ws.next()).await;
    assert!(idle.is_err());

    registry.set(
        "job-1",
        DownloadJob::downloading(Some("a.mp4".to_string()), Some(50), Some(200)),
    );
    let frame = next_json(&mut ws).await;
    assert_eq!(frame["job-1"]["status"], "downloading");
    assert_eq!(frame["job-1"]["percent"], 25.0);

    registry.remove("job-1");
    let frame = next_json(&mut ws).await;
    assert_eq!(frame, serde_json::json!({}));

    ws.send(Message::Close(None)).await.unwrap();
    server.abort();
}

#[tokio::test]
async fn test_disconnect_leaves_registry_untouched() {
    let temp_dir = TempDir::new().unwrap();
    let state = test_state(FakeExtractor::default(), temp_dir.path());
    let registry = state.registry.clone();
    registry.create("job-1").unwrap();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        axum::serve(listener, build_router(state)).await.unwrap();
    });

    let (mut ws, _) = connect_async(format!("ws://{}/ws/download_status", addr))
        .await
        .unwrap();
    let frame = next_json(&mut ws).await;
    assert_eq!(frame["job-1"]["status"], "queued");
    drop(ws);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(registry.get("job-1").is_some());
    server.abort();
}
