// ==========================================
// GMAO 维护数据核心 - AMDEC 分析错误类型
// ==========================================
// 工具: thiserror 派生宏
// 规则: 模型幻觉不是错误（过滤 + 补齐）, 只有无法取得结果时才报错
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 响应样本最大长度（字符）
pub const RESPONSE_SAMPLE_CHARS: usize = 200;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Réponse du modèle inexploitable (aucun tableau JSON trouvé) : {sample}")]
    ResponseParse { sample: String },

    #[error("Appel au modèle impossible : {0}")]
    Llm(String),

    #[error("Le modèle n'a pas répondu dans le délai imparti ({secs} s)")]
    Timeout { secs: u64 },

    #[error("Aucune panne à analyser : importez d'abord un historique d'interventions")]
    EmptyInput,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl AnalysisError {
    /// 构造 ResponseParse, 样本截断为前 200 个字符
    pub fn response_parse(raw: &str) -> Self {
        AnalysisError::ResponseParse {
            sample: raw.chars().take(RESPONSE_SAMPLE_CHARS).collect(),
        }
    }

    /// 面向 API 的错误类别
    pub fn category(&self) -> &'static str {
        match self {
            AnalysisError::ResponseParse { .. } => "RESPONSE_PARSE",
            AnalysisError::Llm(_) => "LLM",
            AnalysisError::Timeout { .. } => "TIMEOUT",
            AnalysisError::EmptyInput => "EMPTY_INPUT",
            AnalysisError::Repository(_) => "STORAGE",
        }
    }
}

impl From<reqwest::Error> for AnalysisError {
    fn from(err: reqwest::Error) -> Self {
        AnalysisError::Llm(err.to_string())
    }
}

/// Result 类型别名
pub type AnalysisResult<T> = Result<T, AnalysisError>;
