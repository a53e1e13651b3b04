// ==========================================
// GMAO 维护数据核心 - AMDEC 分析服务
// ==========================================
// 流程: 工单 → 故障聚合 → 提示词 → LLM → 解析 → 校验/补齐
// 红线: 不信任模型输出; 只有调用方超时（tokio::time::timeout）
// ==========================================

use crate::analysis::aggregates::{aggregate_failures, FailureAggregate};
use crate::analysis::error::{AnalysisError, AnalysisResult};
use crate::analysis::llm_client::{ChatCompletionClient, ChatMessage, ChatRequest};
use crate::analysis::prompt::{build_user_prompt, SYSTEM_PROMPT};
use crate::analysis::response_parser::parse_llm_response;
use crate::analysis::validator::{validate, ValidationReport};
use crate::config::{AnalysisSettings, ImportConfigReader};
use crate::repository::{MaintenanceStore, WorkOrderFilter};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn};

// ==========================================
// AmdecAnalysisReport
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmdecAnalysisReport {
    pub aggregates: Vec<FailureAggregate>,
    pub validation: ValidationReport,
    pub truncated_aggregates: usize, // 超过上限而未发送的聚合
    pub elapsed_ms: u64,
}

// ==========================================
// AmdecAnalysisService
// ==========================================
pub struct AmdecAnalysisService<S, C, L>
where
    S: MaintenanceStore,
    C: ImportConfigReader,
    L: ChatCompletionClient,
{
    store: Arc<S>,
    config: Arc<C>,
    client: Arc<L>,
}

impl<S, C, L> AmdecAnalysisService<S, C, L>
where
    S: MaintenanceStore,
    C: ImportConfigReader,
    L: ChatCompletionClient,
{
    pub fn new(store: Arc<S>, config: Arc<C>, client: Arc<L>) -> Self {
        Self {
            store,
            config,
            client,
        }
    }

    /// 对当前全部工单做 AMDEC 分析（可按设备过滤）
    #[instrument(skip(self))]
    pub async fn analyze(&self, asset_code: Option<String>) -> AnalysisResult<AmdecAnalysisReport> {
        let filter = WorkOrderFilter {
            asset_code,
            period: None,
        };
        let work_orders = self.store.list_work_orders(&filter).await?;
        let aggregates = aggregate_failures(&work_orders);
        self.analyze_aggregates(aggregates).await
    }

    /// 对给定聚合做分析; 输出条数 == 发送给模型的聚合条数
    pub async fn analyze_aggregates(
        &self,
        mut aggregates: Vec<FailureAggregate>,
    ) -> AnalysisResult<AmdecAnalysisReport> {
        let start_time = Instant::now();
        if aggregates.is_empty() {
            return Err(AnalysisError::EmptyInput);
        }

        let settings = self.config.get_analysis_settings().await?;
        let truncated = aggregates.len().saturating_sub(settings.max_aggregates.max(1));
        if truncated > 0 {
            warn!(truncated = truncated, "聚合条数超过上限, 仅发送次数最多的部分");
            aggregates.truncate(settings.max_aggregates.max(1));
        }

        let raw = self.call_model(&aggregates, &settings).await?;
        let entries = parse_llm_response(&raw)?;
        let validation = validate(&aggregates, &entries);

        let elapsed_ms = start_time.elapsed().as_millis() as u64;
        info!(
            aggregates = aggregates.len(),
            hallucinations = validation.hallucinations,
            backfilled = validation.backfilled,
            elapsed_ms = elapsed_ms,
            "AMDEC 分析完成"
        );

        Ok(AmdecAnalysisReport {
            aggregates,
            validation,
            truncated_aggregates: truncated,
            elapsed_ms,
        })
    }

    async fn call_model(
        &self,
        aggregates: &[FailureAggregate],
        settings: &AnalysisSettings,
    ) -> AnalysisResult<String> {
        let request = ChatRequest {
            model: settings.llm_model.clone(),
            messages: vec![
                ChatMessage::system(SYSTEM_PROMPT),
                ChatMessage::user(build_user_prompt(aggregates)?),
            ],
            temperature: settings.llm_temperature,
        };

        let secs = settings.llm_timeout_secs;
        match tokio::time::timeout(Duration::from_secs(secs), self.client.complete(&request)).await {
            Ok(result) => result,
            Err(_) => Err(AnalysisError::Timeout { secs }),
        }
    }
}
