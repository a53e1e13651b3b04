// ==========================================
// GMAO 维护数据核心 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和 API 实例
// ==========================================

use std::sync::{Arc, Mutex};

use crate::analysis::GroqClient;
use crate::api::{AnalysisApi, ApiResult, DataApi, UploadApi};
use crate::config::{ConfigManager, ImportConfigReader};
use crate::db::open_sqlite_connection;
use crate::repository::SqliteMaintenanceStore;

/// 应用状态
///
/// 存储与配置共享同一个 SQLite 连接
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 本地存储
    pub store: Arc<SqliteMaintenanceStore>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    /// 上传 API
    pub upload_api: Arc<UploadApi<SqliteMaintenanceStore, ConfigManager>>,

    /// 数据管理 API
    pub data_api: Arc<DataApi<SqliteMaintenanceStore, ConfigManager>>,
}

impl AppState {
    /// 创建新的 AppState 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    ///
    /// # 返回
    /// - Ok(AppState): 应用状态实例
    /// - Err(String): 初始化错误
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!(db_path = %db_path, "初始化 AppState");

        let conn = open_sqlite_connection(&db_path)
            .map_err(|e| format!("Impossible d'ouvrir la base de données : {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        let store = Arc::new(
            SqliteMaintenanceStore::from_connection(conn.clone())
                .map_err(|e| format!("Initialisation du stockage impossible : {}", e))?,
        );
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn)
                .map_err(|e| format!("Initialisation de la configuration impossible : {}", e))?,
        );

        let upload_api = Arc::new(UploadApi::new(store.clone(), config_manager.clone()));
        let data_api = Arc::new(DataApi::new(store.clone(), config_manager.clone()));

        tracing::info!("AppState 初始化完成");

        Ok(Self {
            db_path,
            store,
            config_manager,
            upload_api,
            data_api,
        })
    }

    /// 构建 AMDEC 分析 API（LLM 客户端需要 GROQ_API_KEY）
    pub async fn analysis_api(
        &self,
    ) -> ApiResult<AnalysisApi<SqliteMaintenanceStore, ConfigManager, GroqClient>> {
        let settings = self.config_manager.get_analysis_settings().await?;
        let client = GroqClient::from_env(settings.llm_endpoint)?;
        Ok(AnalysisApi::new(
            self.store.clone(),
            self.config_manager.clone(),
            Arc::new(client),
        ))
    }

    /// 获取数据库路径
    pub fn get_db_path(&self) -> &str {
        &self.db_path
    }
}

// ==========================================
// 默认数据库路径辅助函数
// ==========================================

/// 获取默认数据库路径
///
/// # 返回
/// - GMAO_DB_PATH 环境变量（非空时）
/// - 否则: 用户数据目录/gmao-core/gmao.db
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("GMAO_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./gmao.db");
    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("gmao-core");
        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("gmao.db");
        }
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_get_default_db_path() {
        let path = get_default_db_path();
        assert!(!path.is_empty());
        assert!(path.ends_with(".db"));
    }

    #[tokio::test]
    async fn test_app_state_initializes_schema() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("gmao.db").to_string_lossy().to_string();
        let state = AppState::new(db_path.clone()).unwrap();
        assert_eq!(state.get_db_path(), db_path);

        let counts = state.data_api.counts().await.unwrap();
        assert_eq!(counts.len(), 8);
        assert!(counts.values().all(|c| *c == 0));
    }
}
