//! WebSocket 路由处理器

use super::SnapshotTracker;
use crate::jobs::JobRegistry;
use crate::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};
use uuid::Uuid;

/// WebSocket 路由处理器
///
/// GET /ws/download_status，升级后定时推送全部任务状态
pub async fn handle_download_status_ws(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let poll_interval = state.config.download.status_poll_interval();
    let registry = Arc::clone(&state.registry);
    ws.on_upgrade(move |socket| stream_download_status(socket, registry, poll_interval))
}

/// 轮询注册表，内容变化时推送快照，直到客户端断开
async fn stream_download_status(
    socket: WebSocket,
    registry: Arc<JobRegistry>,
    poll_interval: Duration,
) {
    let connection_id = Uuid::new_v4().to_string();
    info!("新的 WebSocket 连接: {}", connection_id);

    let (mut sender, mut receiver) = socket.split();
    let mut tracker = SnapshotTracker::new();
    let mut ticker = tokio::time::interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let Some(snapshot) = tracker.poll(&registry) else {
                    continue;
                };
                let json = match serde_json::to_string(snapshot) {
                    Ok(json) => json,
                    Err(e) => {
                        error!("序列化任务快照失败: {}", e);
                        continue;
                    }
                };
                if sender.send(Message::Text(json)).await.is_err() {
                    debug!("推送失败，连接已断开: {}", connection_id);
                    break;
                }
            }
            message = receiver.next() => match message {
                Some(Ok(Message::Close(_))) | None => {
                    debug!("客户端关闭连接: {}", connection_id);
                    break;
                }
                Some(Err(e)) => {
                    debug!("接收消息失败: {} - {}", connection_id, e);
                    break;
                }
                // 客户端消息不参与协议
                Some(Ok(_)) => {}
            }
        }
    }

    info!("WebSocket 连接已关闭: {}", connection_id);
}
