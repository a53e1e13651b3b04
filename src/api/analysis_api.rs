// ==========================================
// GMAO 维护数据核心 - AMDEC 分析 API
// ==========================================
// 职责: 封装 AmdecAnalysisService, 统一错误为 ApiError
// ==========================================

use crate::analysis::{AmdecAnalysisReport, AmdecAnalysisService, ChatCompletionClient, FailureAggregate};
use crate::api::error::{ApiError, ApiResult};
use crate::config::ImportConfigReader;
use crate::repository::MaintenanceStore;
use std::sync::Arc;

pub struct AnalysisApi<S, C, L>
where
    S: MaintenanceStore,
    C: ImportConfigReader,
    L: ChatCompletionClient,
{
    service: AmdecAnalysisService<S, C, L>,
}

impl<S, C, L> AnalysisApi<S, C, L>
where
    S: MaintenanceStore,
    C: ImportConfigReader,
    L: ChatCompletionClient,
{
    pub fn new(store: Arc<S>, config: Arc<C>, client: Arc<L>) -> Self {
        Self {
            service: AmdecAnalysisService::new(store, config, client),
        }
    }

    /// 基于已导入工单做 AMDEC 分析
    ///
    /// # 参数
    /// - asset_code: 只分析该设备的工单（None = 全部设备）
    pub async fn analyze(&self, asset_code: Option<&str>) -> ApiResult<AmdecAnalysisReport> {
        let asset_code = match asset_code.map(str::trim) {
            Some("") => {
                return Err(ApiError::InvalidInput(
                    "code équipement vide".to_string(),
                ))
            }
            other => other.map(str::to_string),
        };
        Ok(self.service.analyze(asset_code).await?)
    }

    /// 对调用方提供的聚合做分析
    pub async fn analyze_aggregates(
        &self,
        aggregates: Vec<FailureAggregate>,
    ) -> ApiResult<AmdecAnalysisReport> {
        Ok(self.service.analyze_aggregates(aggregates).await?)
    }
}
