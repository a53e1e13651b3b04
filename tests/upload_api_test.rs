// ==========================================
// UploadApi 集成测试
// ==========================================
// 测试目标: 上传入口（表格导入 + KPI 重算 + 快照还原 + 错误载荷）
// ==========================================

mod test_helpers;

use gmao_core::api::{ApiError, DataApi, ErrorPayload, UploadApi, UploadKind};
use gmao_core::config::{config_keys, ConfigManager};
use gmao_core::domain::{Collection, ImportOutcome, MetricType, RecordFamily};
use gmao_core::i18n;
use gmao_core::repository::{KpiFilter, MaintenanceStore, SqliteMaintenanceStore};
use std::sync::Arc;
use test_helpers::{create_test_db, csv, open_store};

type Apis = (
    Arc<SqliteMaintenanceStore>,
    Arc<ConfigManager>,
    UploadApi<SqliteMaintenanceStore, ConfigManager>,
);

fn setup(db_path: &str) -> Apis {
    let (store, config) = open_store(db_path);
    let api = UploadApi::new(store.clone(), config.clone());
    (store, config, api)
}

fn work_order_csv() -> Vec<u8> {
    csv(&[
        "Date intervention;Désignation;Type de panne;Durée arrêt (h);Coût total",
        "05/03/2024 08:00;Compresseur A1;Mécanique;4;1 200,00 €",
        "12/03/2024 14:00;Compresseur A1;Électrique;2;300",
        "20/03/2024 09:00;Compresseur A1;Préventif;1;50",
        "02/04/2024 10:00;Pompe P2;Mécanique;6;800",
    ])
}

#[tokio::test]
async fn test_work_order_upload_recalculates_kpis() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let (store, _config, api) = setup(&db_path);

    let summary = api
        .upload("interventions.csv", &work_order_csv(), None)
        .await
        .unwrap();

    assert_eq!(summary.kind, UploadKind::TabularImport);
    assert_eq!(summary.family, Some(RecordFamily::WorkOrders));
    assert_eq!(summary.outcome, ImportOutcome::Imported);
    assert_eq!(summary.created_in(Collection::WorkOrders), 4);
    assert_eq!(summary.created_in(Collection::Assets), 2);
    assert!(summary.kpi_records.unwrap() > 0);
    assert!(!summary.message.is_empty());

    // 2024-03 / Compresseur A1: 744h, 停机 7h, 2 次故障（预防性不计）
    let filter = KpiFilter {
        metric: Some(MetricType::Mtbf),
        asset_code: Some("Compresseur A1".to_string()),
        fleet_only: false,
        period: Some("2024-03".to_string()),
    };
    let mtbf = store.list_kpis(&filter).await.unwrap();
    assert_eq!(mtbf.len(), 1);
    assert!((mtbf[0].value - (744.0 - 7.0) / 2.0).abs() < 1e-9);

    let fleet = store
        .list_kpis(&KpiFilter {
            fleet_only: true,
            ..KpiFilter::default()
        })
        .await
        .unwrap();
    assert!(fleet.iter().all(|k| k.asset_code.is_none()));
    // 两个月 × 3 个指标
    assert_eq!(fleet.len(), 6);
    assert!(fleet.iter().all(|k| k.value.is_finite()));
}

#[tokio::test]
async fn test_kpi_recalc_can_be_disabled() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let (store, config, api) = setup(&db_path);
    config
        .set_config_value(config_keys::IMPORT_RECALC_KPIS, "false")
        .unwrap();

    let summary = api
        .upload("interventions.csv", &work_order_csv(), None)
        .await
        .unwrap();
    assert_eq!(summary.kpi_records, None);
    assert_eq!(store.count(Collection::Kpis).await.unwrap(), 0);
}

#[tokio::test]
async fn test_machine_filter_is_forwarded() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let (_store, _config, api) = setup(&db_path);

    let summary = api
        .upload("interventions.csv", &work_order_csv(), Some("pompe"))
        .await
        .unwrap();
    assert_eq!(summary.created_in(Collection::WorkOrders), 1);
    assert_eq!(summary.filtered_out, 3);
}

#[tokio::test]
async fn test_json_upload_restores_snapshot() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let (store, config, api) = setup(&db_path);
    api.upload("interventions.csv", &work_order_csv(), None)
        .await
        .unwrap();

    let data_api = DataApi::new(store.clone(), config);
    let exported = data_api.export_snapshot().await.unwrap();
    data_api.clear_all().await.unwrap();
    assert_eq!(store.count(Collection::WorkOrders).await.unwrap(), 0);

    let summary = api
        .upload("sauvegarde.json", exported.as_bytes(), None)
        .await
        .unwrap();
    assert_eq!(summary.kind, UploadKind::SnapshotRestore);
    assert_eq!(summary.family, None);
    assert_eq!(summary.created_in(Collection::WorkOrders), 4);
    assert_eq!(summary.created_in(Collection::Assets), 2);
    assert_eq!(store.count(Collection::WorkOrders).await.unwrap(), 4);
}

#[tokio::test]
async fn test_invalid_json_is_snapshot_error() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let (_store, _config, api) = setup(&db_path);

    let err = api
        .upload("sauvegarde.json", b"{\"assets\": 12}", None)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidSnapshot(_)));
    assert_eq!(err.category(), "SNAPSHOT");
}

#[tokio::test]
async fn test_errors_become_structured_payloads() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let (_store, _config, api) = setup(&db_path);

    let err = api
        .upload("notes.csv", &csv(&["Nom;Prénom", "Dupont;Jean"]), None)
        .await
        .unwrap_err();
    let payload: ErrorPayload = err.into();
    assert_eq!(payload.category, "UNRECOGNIZED_SCHEMA");
    assert!(payload.message.contains("Nom, Prénom"));
    assert!(!payload.hint.is_empty());

    let err = api.upload("photo.png", b"\x89PNG", None).await.unwrap_err();
    assert_eq!(err.category(), "UNSUPPORTED_FORMAT");

    let err = api
        .upload_file(std::path::Path::new("/nonexistent/export.xlsx"), None)
        .await
        .unwrap_err();
    assert_eq!(err.category(), "FILE");
}

#[tokio::test]
async fn test_upload_file_from_disk() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let (_store, _config, api) = setup(&db_path);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Historique interventions.csv");
    std::fs::write(&path, work_order_csv()).unwrap();

    let summary = api.upload_file(&path, None).await.unwrap();
    assert_eq!(summary.file_name, "Historique interventions.csv");
    assert_eq!(summary.created_in(Collection::WorkOrders), 4);
}

#[tokio::test]
async fn test_no_valid_records_message() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let (_store, _config, api) = setup(&db_path);

    let summary = api
        .upload(
            "vide.csv",
            &csv(&["Date intervention;Désignation;Type de panne"]),
            None,
        )
        .await
        .unwrap();
    assert_eq!(summary.outcome, ImportOutcome::NoValidRecords);
    assert_eq!(summary.kpi_records, None);
    assert_eq!(summary.message, i18n::t("upload.no_valid_records"));
}
