//! 视频信息查询接口
//!
//! 每个接口都同步调用解析器；解析失败与无结果都按 404 处理

use super::{Params, UrlParams};
use crate::extractor::{CombinedVideoInfo, FormatDescriptor, VideoInfo, VideoMetadata};
use crate::server::{ApiError, ApiResult, AppState};
use axum::{extract::State, response::Json};
use serde::Serialize;
use tracing::{info, warn};

const VIDEO_INFO_NOT_FOUND: &str = "Video info not found";
const THUMBNAIL_NOT_FOUND: &str = "Thumbnail not found";
const FORMATS_NOT_FOUND: &str = "Formats not found";

/// 缩略图响应
#[derive(Debug, Serialize)]
pub struct ThumbnailResponse {
    pub thumbnail_url: String,
}

/// 文件大小响应
#[derive(Debug, Serialize)]
pub struct SizeResponse {
    pub filesize_bytes: Option<u64>,
}

/// 格式列表响应
#[derive(Debug, Serialize)]
pub struct FormatsResponse {
    pub formats: Vec<FormatDescriptor>,
}

/// 调用解析器；错误只记录日志，统一视为无结果
async fn lookup(state: &AppState, url: &str) -> Option<VideoInfo> {
    match state.extractor.extract_info(url).await {
        Ok(info) => info,
        Err(e) => {
            warn!("获取视频信息失败: url={}, 错误: {}", url, e);
            None
        }
    }
}

async fn lookup_metadata(state: &AppState, url: &str) -> ApiResult<(VideoInfo, VideoMetadata)> {
    let info = lookup(state, url)
        .await
        .ok_or_else(|| ApiError::not_found(VIDEO_INFO_NOT_FOUND))?;
    let metadata = info
        .to_metadata()
        .ok_or_else(|| ApiError::not_found(VIDEO_INFO_NOT_FOUND))?;
    Ok((info, metadata))
}

/// 获取视频元数据
///
/// GET/POST /metadata
pub async fn get_metadata(
    State(state): State<AppState>,
    Params(params): Params<UrlParams>,
) -> ApiResult<Json<VideoMetadata>> {
    info!("获取视频元数据: {}", params.url);
    let (_, metadata) = lookup_metadata(&state, &params.url).await?;
    Ok(Json(metadata))
}

/// GET/POST /thumbnail
pub async fn get_thumbnail(
    State(state): State<AppState>,
    Params(params): Params<UrlParams>,
) -> ApiResult<Json<ThumbnailResponse>> {
    let thumbnail_url = lookup(&state, &params.url)
        .await
        .and_then(|info| info.thumbnail)
        .ok_or_else(|| ApiError::not_found(THUMBNAIL_NOT_FOUND))?;
    Ok(Json(ThumbnailResponse { thumbnail_url }))
}

/// 获取文件大小，精确值缺失时回退到估算值
///
/// GET/POST /size
pub async fn get_size(
    State(state): State<AppState>,
    Params(params): Params<UrlParams>,
) -> ApiResult<Json<SizeResponse>> {
    let info = lookup(&state, &params.url)
        .await
        .ok_or_else(|| ApiError::not_found(VIDEO_INFO_NOT_FOUND))?;
    Ok(Json(SizeResponse {
        filesize_bytes: info.best_filesize(),
    }))
}

/// GET/POST /formats
pub async fn get_formats(
    State(state): State<AppState>,
    Params(params): Params<UrlParams>,
) -> ApiResult<Json<FormatsResponse>> {
    let formats = lookup(&state, &params.url)
        .await
        .and_then(|info| info.format_descriptors())
        .ok_or_else(|| ApiError::not_found(FORMATS_NOT_FOUND))?;
    Ok(Json(FormatsResponse { formats }))
}

/// 元数据与格式列表合并返回，只调用一次解析器
///
/// GET/POST /combined_video_info
pub async fn get_combined_video_info(
    State(state): State<AppState>,
    Params(params): Params<UrlParams>,
) -> ApiResult<Json<CombinedVideoInfo>> {
    let (info, metadata) = lookup_metadata(&state, &params.url).await?;
    let formats = info
        .format_descriptors()
        .ok_or_else(|| ApiError::not_found(FORMATS_NOT_FOUND))?;
    Ok(Json(CombinedVideoInfo { metadata, formats }))
}
