use super::Params;
use crate::downloader::DownloadRequest;
use crate::jobs::DownloadJob;
use crate::server::{ApiError, ApiResult, AppState};
use axum::{extract::State, http::StatusCode, response::Json};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

/// 创建下载任务响应
#[derive(Debug, Serialize)]
pub struct DownloadIdResponse {
    pub download_id: String,
}

/// 任务状态查询参数
#[derive(Debug, Deserialize)]
pub struct DownloadStatusQuery {
    pub download_id: String,
}

/// 创建下载任务
///
/// GET/POST /download，立即返回 202 与任务 ID，下载在后台进行
pub async fn create_download(
    State(state): State<AppState>,
    Params(request): Params<DownloadRequest>,
) -> ApiResult<(StatusCode, Json<DownloadIdResponse>)> {
    info!("创建下载任务: {}", request.url);

    let download_id = state.download_manager.dispatch(request).map_err(|e| {
        error!("创建下载任务失败: {}", e);
        ApiError::from(e)
    })?;

    Ok((StatusCode::ACCEPTED, Json(DownloadIdResponse { download_id })))
}

/// 查询任务状态
///
/// GET /download_status?download_id=
pub async fn get_download_status(
    State(state): State<AppState>,
    Params(query): Params<DownloadStatusQuery>,
) -> ApiResult<Json<DownloadJob>> {
    state
        .registry
        .get(&query.download_id)
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Download ID not found"))
}
