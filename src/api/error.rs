// ==========================================
// GMAO 维护数据核心 - API 层错误类型
// ==========================================
// 职责: 汇总各层错误, 转换为面向用户的结构化错误载荷
// 规则: 不向用户暴露堆栈; 每个错误都带类别 + 可操作的提示
// ==========================================

use crate::analysis::error::AnalysisError;
use crate::etl::EtlError;
use crate::i18n;
use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// API 层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ===== 导入 =====
    #[error(transparent)]
    Import(#[from] ImportError),

    #[error("Sauvegarde JSON invalide : {0}")]
    InvalidSnapshot(String),

    // ===== 分析 =====
    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    // ===== 服务端 ETL =====
    #[error(transparent)]
    Etl(#[from] EtlError),

    // ===== 数据访问 =====
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    // ===== 通用 =====
    #[error("Paramètre invalide : {0}")]
    InvalidInput(String),

    #[error("Erreur interne : {0}")]
    InternalError(String),
}

impl ApiError {
    /// 错误类别（稳定标识, 供前端分支处理）
    pub fn category(&self) -> &'static str {
        match self {
            ApiError::Import(e) => e.category(),
            ApiError::InvalidSnapshot(_) => "SNAPSHOT",
            ApiError::Analysis(e) => e.category(),
            ApiError::Etl(_) => "ETL",
            ApiError::Repository(_) => "STORAGE",
            ApiError::InvalidInput(_) => "INVALID_INPUT",
            ApiError::InternalError(_) => "INTERNAL",
        }
    }

    /// 转换为错误载荷（提示按当前语言）
    pub fn to_payload(&self) -> ErrorPayload {
        let category = self.category();
        ErrorPayload {
            category: category.to_string(),
            message: self.to_string(),
            hint: i18n::t(&format!("errors.{}", category.to_lowercase())),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

// ==========================================
// ErrorPayload - 结构化错误
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub category: String,
    pub message: String,
    pub hint: String,
}

impl From<ApiError> for ErrorPayload {
    fn from(err: ApiError) -> Self {
        err.to_payload()
    }
}
