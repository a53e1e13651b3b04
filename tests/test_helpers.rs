// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、测试数据生成、LLM 桩客户端
// ==========================================
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use gmao_core::analysis::{AnalysisResult, ChatCompletionClient, ChatRequest};
use gmao_core::config::ConfigManager;
use gmao_core::db::open_sqlite_connection;
use gmao_core::domain::WorkOrder;
use gmao_core::repository::SqliteMaintenanceStore;
use std::error::Error;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::NamedTempFile;

/// 创建临时测试数据库
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().unwrap().to_string();
    Ok((temp_file, db_path))
}

/// 打开存储 + 配置（共享同一连接, 与 AppState 一致）
pub fn open_store(db_path: &str) -> (Arc<SqliteMaintenanceStore>, Arc<ConfigManager>) {
    let conn = open_sqlite_connection(db_path).expect("打开测试数据库失败");
    let conn = Arc::new(Mutex::new(conn));
    let store = Arc::new(SqliteMaintenanceStore::from_connection(conn.clone()).unwrap());
    let config = Arc::new(ConfigManager::from_connection(conn).unwrap());
    (store, config)
}

/// CSV 文本（行内用 `;` 分隔）
pub fn csv(lines: &[&str]) -> Vec<u8> {
    lines.join("\n").into_bytes()
}

/// 构造工单
pub fn work_order(
    asset: &str,
    date: (i32, u32, u32),
    failure_type: &str,
    component: Option<&str>,
    downtime_hours: f64,
    total_cost: f64,
) -> WorkOrder {
    WorkOrder {
        id: uuid::Uuid::new_v4().to_string(),
        asset_code: asset.to_string(),
        wo_code: None,
        start_at: NaiveDate::from_ymd_opt(date.0, date.1, date.2)
            .unwrap()
            .and_hms_opt(8, 0, 0),
        end_at: None,
        failure_type: Some(failure_type.to_string()),
        component: component.map(str::to_string),
        cause: None,
        technician: None,
        description: None,
        downtime_hours,
        material_cost: 0.0,
        total_cost,
        source_file: Some("test.csv".to_string()),
        imported_at: Utc::now(),
    }
}

// ==========================================
// LLM 桩客户端
// ==========================================

/// 返回固定文本的客户端
pub struct CannedChatClient {
    response: String,
    delay: Option<Duration>,
    calls: AtomicUsize,
    last_user_prompt: Mutex<Option<String>>,
}

impl CannedChatClient {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            delay: None,
            calls: AtomicUsize::new(0),
            last_user_prompt: Mutex::new(None),
        }
    }

    /// 延迟返回（用于超时测试）
    pub fn slow(response: impl Into<String>, delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new(response)
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_user_prompt(&self) -> Option<String> {
        self.last_user_prompt.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatCompletionClient for CannedChatClient {
    async fn complete(&self, request: &ChatRequest) -> AnalysisResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let user = request
            .messages
            .iter()
            .find(|m| m.role == "user")
            .map(|m| m.content.clone());
        *self.last_user_prompt.lock().unwrap() = user;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.response.clone())
    }
}
