// ==========================================
// GMAO 维护数据核心 - 服务端 ETL 脚本调用
// ==========================================
// 约定: <interpreter> <script> --file <path> --tenant-id <tenant>
//       标准输出最后一个非空行是 JSON, 至少包含 success: bool
// 红线: 不关心脚本内部实现
// ==========================================

use crate::config::EtlSettings;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::{info, instrument, warn};

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Lancement du script ETL impossible : {0}")]
    Spawn(String),

    #[error("Le script ETL n'a pas terminé dans le délai imparti ({secs} s)")]
    Timeout { secs: u64 },

    #[error("Le script ETL n'a produit aucune sortie")]
    NoOutput,

    #[error("Dernière ligne du script ETL illisible : {line}")]
    InvalidOutput { line: String },
}

pub type EtlResult<T> = Result<T, EtlError>;

// ==========================================
// EtlOutcome - 脚本返回的状态
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EtlOutcome {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(skip)]
    pub exit_code: Option<i32>,
}

/// 解析脚本标准输出: 取最后一个非空行作为 JSON 状态
pub fn parse_etl_output(stdout: &str) -> EtlResult<EtlOutcome> {
    let line = stdout
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .ok_or(EtlError::NoOutput)?;

    let value: Value = serde_json::from_str(line).map_err(|_| EtlError::InvalidOutput {
        line: line.chars().take(200).collect(),
    })?;
    if !value.get("success").map(Value::is_boolean).unwrap_or(false) {
        return Err(EtlError::InvalidOutput {
            line: line.chars().take(200).collect(),
        });
    }
    serde_json::from_value(value).map_err(|_| EtlError::InvalidOutput {
        line: line.chars().take(200).collect(),
    })
}

/// 运行 ETL 脚本并读取其状态
#[instrument(skip(settings), fields(script = %settings.script_path))]
pub async fn run_etl_script(
    settings: &EtlSettings,
    file_path: &Path,
    tenant_id: &str,
) -> EtlResult<EtlOutcome> {
    let mut command = Command::new(&settings.interpreter);
    command
        .arg(&settings.script_path)
        .arg("--file")
        .arg(file_path)
        .arg("--tenant-id")
        .arg(tenant_id)
        .kill_on_drop(true);

    let secs = settings.timeout_secs;
    let output = tokio::time::timeout(Duration::from_secs(secs), command.output())
        .await
        .map_err(|_| EtlError::Timeout { secs })?
        .map_err(|e| EtlError::Spawn(e.to_string()))?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    if !output.status.success() {
        let stderr: String = String::from_utf8_lossy(&output.stderr).chars().take(500).collect();
        warn!(
            exit_code = output.status.code().unwrap_or(-1),
            stderr = %stderr,
            "ETL 脚本返回非零状态"
        );
    }

    let mut outcome = parse_etl_output(&stdout)?;
    outcome.exit_code = output.status.code();
    info!(success = outcome.success, exit_code = ?outcome.exit_code, "ETL 脚本完成");
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_non_empty_line_wins() {
        let stdout = "1️⃣  Upserting assets...\n{\"success\": false}\n✅ done\n{\"success\": true, \"message\": \"Import completed successfully\", \"data\": {\"work_orders_created\": 12}}\n\n  \n";
        let outcome = parse_etl_output(stdout).unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.message.as_deref(), Some("Import completed successfully"));
        assert_eq!(outcome.data.unwrap()["work_orders_created"], 12);
    }

    #[test]
    fn test_failure_payload() {
        let outcome = parse_etl_output("{\"success\": false, \"message\": \"boom\"}").unwrap();
        assert!(!outcome.success);
    }

    #[test]
    fn test_invalid_outputs() {
        assert!(matches!(parse_etl_output(""), Err(EtlError::NoOutput)));
        assert!(matches!(
            parse_etl_output("Traceback (most recent call last)"),
            Err(EtlError::InvalidOutput { .. })
        ));
        assert!(matches!(
            parse_etl_output("{\"message\": \"no flag\"}"),
            Err(EtlError::InvalidOutput { .. })
        ));
    }
}
