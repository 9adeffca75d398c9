// API处理器模块

pub mod download;
pub mod video;

pub use download::*;
pub use video::*;

use crate::server::ApiError;
use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::Method,
    Json,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// 请求参数：GET 从查询字符串读取，其余方法从 JSON 请求体读取
#[derive(Debug, Clone)]
pub struct Params<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for Params<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if req.method() == Method::GET {
            let (mut parts, _body) = req.into_parts();
            let Query(value) = Query::<T>::from_request_parts(&mut parts, state)
                .await
                .map_err(|e| ApiError::InvalidRequest(e.body_text()))?;
            Ok(Params(value))
        } else {
            let Json(value) = Json::<T>::from_request(req, state)
                .await
                .map_err(|e| ApiError::InvalidRequest(e.body_text()))?;
            Ok(Params(value))
        }
    }
}

/// 只携带视频 URL 的请求
#[derive(Debug, Clone, Deserialize)]
pub struct UrlParams {
    pub url: String,
}

/// 健康检查响应
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
}

/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
    })
}
