// ==========================================
// GMAO 维护数据核心 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope), 与业务数据同库
// ==========================================

use crate::config::import_config_trait::{
    AnalysisSettings, EtlSettings, ImportConfigReader, ImportSettings,
};
use crate::db::{configure_sqlite_connection, init_schema, open_sqlite_connection};
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::warn;

// ==========================================
// 配置键
// ==========================================
pub mod config_keys {
    // 导入
    pub const IMPORT_MIN_SHEET_ROWS: &str = "import/min_sheet_rows";
    pub const IMPORT_HEADER_SCAN_ROWS: &str = "import/header_scan_rows";
    pub const IMPORT_SCORE_THRESHOLD: &str = "import/score_threshold";
    pub const IMPORT_UNASSIGNED_ASSET: &str = "import/unassigned_asset_code";
    pub const IMPORT_RECALC_KPIS: &str = "import/recalc_kpis_after_import";

    // AMDEC 分析
    pub const LLM_ENDPOINT: &str = "analysis/llm_endpoint";
    pub const LLM_MODEL: &str = "analysis/llm_model";
    pub const LLM_TEMPERATURE: &str = "analysis/llm_temperature";
    pub const LLM_TIMEOUT_SECS: &str = "analysis/llm_timeout_secs";
    pub const ANALYSIS_MAX_AGGREGATES: &str = "analysis/max_aggregates";

    // ETL
    pub const ETL_INTERPRETER: &str = "etl/interpreter";
    pub const ETL_SCRIPT_PATH: &str = "etl/script_path";
    pub const ETL_TIMEOUT_SECS: &str = "etl/timeout_secs";
}

const GLOBAL_SCOPE: &str = "global";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(format!("锁获取失败: {}", e)))?;
            configure_sqlite_connection(&guard)?;
            init_schema(&guard)?;
        }
        Ok(Self { conn })
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(format!("锁获取失败: {}", e)))
    }

    /// 读取 global scope 的配置值
    pub fn get_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
                params![GLOBAL_SCOPE, key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at) VALUES (?1, ?2, ?3, datetime('now'))
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3, updated_at = datetime('now')",
            params![GLOBAL_SCOPE, key, value],
        )?;
        Ok(())
    }

    /// 所有 global 配置（键有序）
    pub fn get_config_snapshot(&self) -> RepositoryResult<BTreeMap<String, String>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = ?1 ORDER BY key")?;
        let rows = stmt.query_map(params![GLOBAL_SCOPE], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        let snapshot = rows.collect::<rusqlite::Result<BTreeMap<_, _>>>()?;
        Ok(snapshot)
    }

    /// 读取并解析; 缺失或非法时返回默认值（非法值记 warn）
    fn get_parsed_or<T>(&self, key: &str, default: T) -> RepositoryResult<T>
    where
        T: FromStr,
    {
        match self.get_config_value(key)? {
            Some(raw) => match raw.trim().parse::<T>() {
                Ok(value) => Ok(value),
                Err(_) => {
                    warn!(key = key, value = %raw, "配置值非法, 使用默认值");
                    Ok(default)
                }
            },
            None => Ok(default),
        }
    }

    fn get_string_or(&self, key: &str, default: String) -> RepositoryResult<String> {
        Ok(self
            .get_config_value(key)?
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(default))
    }
}

#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_import_settings(&self) -> RepositoryResult<ImportSettings> {
        let defaults = ImportSettings::default();
        Ok(ImportSettings {
            min_sheet_rows: self
                .get_parsed_or(config_keys::IMPORT_MIN_SHEET_ROWS, defaults.min_sheet_rows)?,
            header_scan_rows: self
                .get_parsed_or(config_keys::IMPORT_HEADER_SCAN_ROWS, defaults.header_scan_rows)?
                .max(1),
            score_threshold: self
                .get_parsed_or(config_keys::IMPORT_SCORE_THRESHOLD, defaults.score_threshold)?,
            unassigned_asset_code: self.get_string_or(
                config_keys::IMPORT_UNASSIGNED_ASSET,
                defaults.unassigned_asset_code,
            )?,
            recalc_kpis_after_import: self.get_parsed_or(
                config_keys::IMPORT_RECALC_KPIS,
                defaults.recalc_kpis_after_import,
            )?,
        })
    }

    async fn get_analysis_settings(&self) -> RepositoryResult<AnalysisSettings> {
        let defaults = AnalysisSettings::default();
        Ok(AnalysisSettings {
            llm_endpoint: self.get_string_or(config_keys::LLM_ENDPOINT, defaults.llm_endpoint)?,
            llm_model: self.get_string_or(config_keys::LLM_MODEL, defaults.llm_model)?,
            llm_temperature: self
                .get_parsed_or(config_keys::LLM_TEMPERATURE, defaults.llm_temperature)?,
            llm_timeout_secs: self
                .get_parsed_or(config_keys::LLM_TIMEOUT_SECS, defaults.llm_timeout_secs)?,
            max_aggregates: self
                .get_parsed_or(config_keys::ANALYSIS_MAX_AGGREGATES, defaults.max_aggregates)?,
        })
    }

    async fn get_etl_settings(&self) -> RepositoryResult<EtlSettings> {
        let defaults = EtlSettings::default();
        Ok(EtlSettings {
            interpreter: self.get_string_or(config_keys::ETL_INTERPRETER, defaults.interpreter)?,
            script_path: self.get_string_or(config_keys::ETL_SCRIPT_PATH, defaults.script_path)?,
            timeout_secs: self.get_parsed_or(config_keys::ETL_TIMEOUT_SECS, defaults.timeout_secs)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[tokio::test]
    async fn test_defaults_when_table_empty() {
        let config = manager();
        let settings = config.get_import_settings().await.unwrap();
        assert_eq!(settings, ImportSettings::default());
        assert_eq!(settings.score_threshold, 10);
        assert_eq!(settings.min_sheet_rows, 5);
    }

    #[tokio::test]
    async fn test_overrides_and_invalid_values() {
        let config = manager();
        config.set_config_value(config_keys::IMPORT_SCORE_THRESHOLD, "15").unwrap();
        config.set_config_value(config_keys::IMPORT_MIN_SHEET_ROWS, "beaucoup").unwrap();
        config.set_config_value(config_keys::LLM_TIMEOUT_SECS, "20").unwrap();

        let settings = config.get_import_settings().await.unwrap();
        assert_eq!(settings.score_threshold, 15);
        assert_eq!(settings.min_sheet_rows, 5);

        let analysis = config.get_analysis_settings().await.unwrap();
        assert_eq!(analysis.llm_timeout_secs, 20);
    }

    #[test]
    fn test_upsert_and_snapshot() {
        let config = manager();
        config.set_config_value(config_keys::ETL_INTERPRETER, "python").unwrap();
        config.set_config_value(config_keys::ETL_INTERPRETER, "python3.11").unwrap();
        let snapshot = config.get_config_snapshot().unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(
            snapshot.get(config_keys::ETL_INTERPRETER).map(String::as_str),
            Some("python3.11")
        );
    }
}
