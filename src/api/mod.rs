// ==========================================
// GMAO 维护数据核心 - API 层
// ==========================================
// 职责: 提供业务 API 接口, 供 CLI / 宿主应用调用
// ==========================================

pub mod analysis_api;
pub mod data_api;
pub mod error;
pub mod upload_api;

// 重导出核心类型
pub use analysis_api::AnalysisApi;
pub use data_api::DataApi;
pub use error::{ApiError, ApiResult, ErrorPayload};
pub use upload_api::{UploadApi, UploadKind, UploadSummary};
