// ==========================================
// GMAO 维护数据核心 - AMDEC 分析层
// ==========================================
// 职责: 故障聚合 → LLM 评分 → 封闭集合校验 + 规则补齐
// 红线: 模型输出不可信, 不得引入输入中不存在的部件
// ==========================================

pub mod aggregates;
pub mod amdec_analysis;
pub mod error;
pub mod llm_client;
pub mod prompt;
pub mod response_parser;
pub mod validator;

// 重导出核心类型
pub use aggregates::{aggregate_failures, normalize_key, FailureAggregate};
pub use amdec_analysis::{AmdecAnalysisReport, AmdecAnalysisService};
pub use error::{AnalysisError, AnalysisResult};
pub use llm_client::{ChatCompletionClient, ChatMessage, ChatRequest, GroqClient};
pub use response_parser::parse_llm_response;
pub use validator::{validate, EntrySource, ValidatedEntry, ValidationReport};
