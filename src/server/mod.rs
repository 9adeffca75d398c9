// Web服务器模块

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod websocket;

pub use error::{ApiError, ApiResult};
pub use routes::build_router;
pub use state::AppState;
