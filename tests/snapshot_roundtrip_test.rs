// ==========================================
// 本地存储快照（备份/还原）集成测试
// ==========================================
// 测试目标: 导出 → 清空 → 还原 → 导出, 各集合内容一致
// ==========================================

mod test_helpers;

use gmao_core::api::{ApiError, DataApi, UploadApi};
use gmao_core::domain::{Collection, StoreSnapshot};
use gmao_core::repository::KpiFilter;
use serde_json::Value;
use test_helpers::{create_test_db, csv, open_store};

/// 集合内容（按 id 排序, 与插入顺序无关）
fn collection(snapshot: &StoreSnapshot, name: &str) -> Vec<Value> {
    let value = serde_json::to_value(snapshot).unwrap();
    let mut items = value[name].as_array().cloned().unwrap_or_default();
    items.sort_by(|a, b| a["id"].as_str().cmp(&b["id"].as_str()));
    items
}

const COLLECTION_FIELDS: [&str; 8] = [
    "assets",
    "work_orders",
    "functions",
    "failure_modes",
    "amdec_rows",
    "parts",
    "part_demand",
    "kpis",
];

async fn seed(upload: &UploadApi<gmao_core::SqliteMaintenanceStore, gmao_core::config::ConfigManager>) {
    upload
        .upload(
            "interventions.csv",
            &csv(&[
                "Date intervention;Désignation;Type de panne;Organe;Durée arrêt (h);Coût total",
                "05/03/2024 08:00;Compresseur A1;Mécanique;Roulement;4;1200",
                "12/03/2024 14:00;Pompe P2;Électrique;Moteur;2;300",
            ]),
            None,
        )
        .await
        .unwrap();
    upload
        .upload(
            "amdec.csv",
            &csv(&[
                "Fonction;Composant;Mode de défaillance;Gravité;Occurrence;Détection",
                "Pomper;Clapet;Fuite;8;4;6",
                "Pomper;Garniture;Usure;6;2;3",
            ]),
            None,
        )
        .await
        .unwrap();
    upload
        .upload(
            "pieces.csv",
            &csv(&[
                "Référence;Désignation;Stock;Stock de sécurité;Point de commande",
                "ROUL-6205;Roulement 6205;0;2;4",
            ]),
            None,
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_export_clear_restore_is_lossless() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let (store, config) = open_store(&db_path);
    let upload = UploadApi::new(store.clone(), config.clone());
    let data = DataApi::new(store, config);
    seed(&upload).await;

    let before_counts = data.counts().await.unwrap();
    assert!(before_counts[&Collection::Kpis] > 0);
    assert_eq!(before_counts[&Collection::WorkOrders], 2);

    let exported = data.export_snapshot().await.unwrap();
    let before = StoreSnapshot::from_json(&exported).unwrap();

    data.clear_all().await.unwrap();
    assert!(data.counts().await.unwrap().values().all(|n| *n == 0));

    let restored = data.restore_snapshot(&exported).await.unwrap();
    assert_eq!(restored, before_counts);

    let after = StoreSnapshot::from_json(&data.export_snapshot().await.unwrap()).unwrap();
    for name in COLLECTION_FIELDS {
        assert_eq!(collection(&before, name), collection(&after, name), "collection {name}");
    }
}

#[tokio::test]
async fn test_restore_into_another_database() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let (store, config) = open_store(&db_path);
    let upload = UploadApi::new(store.clone(), config.clone());
    let source = DataApi::new(store, config);
    seed(&upload).await;
    let exported = source.export_snapshot().await.unwrap();

    let (_tmp2, other_path) = create_test_db().unwrap();
    let (other_store, other_config) = open_store(&other_path);
    let target = DataApi::new(other_store, other_config);
    target.restore_snapshot(&exported).await.unwrap();

    assert_eq!(target.counts().await.unwrap(), source.counts().await.unwrap());
    let fleet = target
        .list_kpis(&KpiFilter {
            fleet_only: true,
            ..KpiFilter::default()
        })
        .await
        .unwrap();
    assert!(!fleet.is_empty());
}

#[tokio::test]
async fn test_restore_replaces_existing_data() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let (store, config) = open_store(&db_path);
    let upload = UploadApi::new(store.clone(), config.clone());
    let data = DataApi::new(store, config);

    let empty = StoreSnapshot::empty().to_json().unwrap();
    seed(&upload).await;
    let counts = data.restore_snapshot(&empty).await.unwrap();
    assert!(counts.values().all(|n| *n == 0));
    assert!(data.counts().await.unwrap().values().all(|n| *n == 0));
}

#[tokio::test]
async fn test_invalid_snapshot_keeps_data() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let (store, config) = open_store(&db_path);
    let upload = UploadApi::new(store.clone(), config.clone());
    let data = DataApi::new(store, config);
    seed(&upload).await;
    let before = data.counts().await.unwrap();

    let err = data.restore_snapshot("pas du json").await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidSnapshot(_)));
    assert_eq!(data.counts().await.unwrap(), before);
}

#[tokio::test]
async fn test_invalid_period_filter() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let (store, config) = open_store(&db_path);
    let data = DataApi::new(store, config);

    let err = data
        .list_kpis(&KpiFilter {
            period: Some("2024-13".to_string()),
            ..KpiFilter::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));
}
