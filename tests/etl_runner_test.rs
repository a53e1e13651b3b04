// ==========================================
// 服务端 ETL 脚本调用集成测试
// ==========================================
// 测试目标: 参数约定 + 最后一行 JSON 状态 + 超时
// 说明: 以 sh 作为解释器运行临时脚本（仅 unix）
// ==========================================
#![cfg(unix)]

mod test_helpers;

use gmao_core::api::{ApiError, DataApi};
use gmao_core::config::{config_keys, ConfigManager};
use gmao_core::etl::EtlError;
use gmao_core::SqliteMaintenanceStore;
use std::path::PathBuf;
use tempfile::TempDir;
use test_helpers::{create_test_db, open_store};

struct EtlFixture {
    _db: tempfile::NamedTempFile,
    dir: TempDir,
    api: DataApi<SqliteMaintenanceStore, ConfigManager>,
}

impl EtlFixture {
    fn new(script: &str) -> Self {
        let (db, db_path) = create_test_db().unwrap();
        let (store, config) = open_store(&db_path);
        let dir = tempfile::tempdir().unwrap();

        let script_path = dir.path().join("etl.sh");
        std::fs::write(&script_path, script).unwrap();
        config
            .set_config_value(config_keys::ETL_INTERPRETER, "sh")
            .unwrap();
        config
            .set_config_value(config_keys::ETL_SCRIPT_PATH, script_path.to_str().unwrap())
            .unwrap();
        config
            .set_config_value(config_keys::ETL_TIMEOUT_SECS, "2")
            .unwrap();

        Self {
            _db: db,
            dir,
            api: DataApi::new(store, config),
        }
    }

    fn input_file(&self) -> PathBuf {
        let path = self.dir.path().join("interventions.xlsx");
        std::fs::write(&path, b"contenu").unwrap();
        path
    }
}

#[tokio::test]
async fn test_script_receives_file_and_tenant() {
    let fixture = EtlFixture::new(
        r#"echo "1. Lecture de $2"
echo "2. Tenant $4"
echo "{\"success\": true, \"message\": \"Import terminé\", \"data\": {\"flag\": \"$1 $3\", \"tenant\": \"$4\"}}"
"#,
    );
    let file = fixture.input_file();

    let outcome = fixture.api.run_etl(&file, "  usine-nord ").await.unwrap();
    assert!(outcome.success);
    assert_eq!(outcome.message.as_deref(), Some("Import terminé"));
    let data = outcome.data.unwrap();
    assert_eq!(data["flag"], "--file --tenant-id");
    assert_eq!(data["tenant"], "usine-nord");
    assert_eq!(outcome.exit_code, Some(0));
}

#[tokio::test]
async fn test_failure_status_with_non_zero_exit() {
    let fixture = EtlFixture::new(
        r#"echo "{\"success\": false, \"message\": \"colonne manquante\"}"
exit 3
"#,
    );
    let file = fixture.input_file();

    let outcome = fixture.api.run_etl(&file, "usine-nord").await.unwrap();
    assert!(!outcome.success);
    assert_eq!(outcome.message.as_deref(), Some("colonne manquante"));
    assert_eq!(outcome.exit_code, Some(3));
}

#[tokio::test]
async fn test_unreadable_last_line() {
    let fixture = EtlFixture::new("echo 'Traceback (most recent call last)'\n");
    let file = fixture.input_file();

    let err = fixture.api.run_etl(&file, "usine-nord").await.unwrap_err();
    assert!(matches!(err, ApiError::Etl(EtlError::InvalidOutput { .. })));
    assert_eq!(err.category(), "ETL");
}

#[tokio::test]
async fn test_slow_script_times_out() {
    let fixture = EtlFixture::new("sleep 10\necho '{\"success\": true}'\n");
    let file = fixture.input_file();

    let err = fixture.api.run_etl(&file, "usine-nord").await.unwrap_err();
    assert!(matches!(err, ApiError::Etl(EtlError::Timeout { secs: 2 })));
}

#[tokio::test]
async fn test_invalid_arguments_rejected_before_spawn() {
    let fixture = EtlFixture::new("echo '{\"success\": true}'\n");
    let file = fixture.input_file();

    let err = fixture.api.run_etl(&file, "   ").await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));

    let missing = fixture.dir.path().join("absent.csv");
    let err = fixture.api.run_etl(&missing, "usine-nord").await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));
}
