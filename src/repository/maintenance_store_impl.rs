// ==========================================
// GMAO 维护数据核心 - 本地存储 SQLite 实现
// ==========================================
// 职责: 实现 MaintenanceStore（使用 rusqlite）
// 红线: Repository 不含业务规则，只做数据 CRUD
// 约定: 批量写入全部事务化; 列表按写入顺序（rowid）返回
// ==========================================

use crate::db::{configure_sqlite_connection, init_schema, open_sqlite_connection};
use crate::domain::amdec::{AmdecRawRow, FailureMode, FunctionRecord};
use crate::domain::kpi::KpiRecord;
use crate::domain::maintenance::{Asset, WorkOrder};
use crate::domain::part::{Part, PartDemand};
use crate::domain::snapshot::{StoreSnapshot, SNAPSHOT_VERSION};
use crate::domain::types::{Collection, MetricType};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::maintenance_store::{KpiFilter, MaintenanceStore, WorkOrderFilter};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

const WORK_ORDER_COLUMNS: &str = "id, asset_code, wo_code, start_at, end_at, failure_type, \
     component, cause, technician, description, downtime_hours, material_cost, total_cost, \
     source_file, imported_at";

const FAILURE_MODE_COLUMNS: &str = "id, function_id, function_name, asset_code, component, \
     failure_type, cause, effect, severity, occurrence, detection, recommended_action, owner, \
     due_date, status, occurrence_count, created_at";

// ==========================================
// 行映射
// ==========================================
fn conversion_error(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, message.into())
}

fn map_asset(row: &Row) -> rusqlite::Result<Asset> {
    Ok(Asset {
        id: row.get(0)?,
        code: row.get(1)?,
        asset_type: row.get(2)?,
        created_at: row.get(3)?,
    })
}

fn map_work_order(row: &Row) -> rusqlite::Result<WorkOrder> {
    Ok(WorkOrder {
        id: row.get(0)?,
        asset_code: row.get(1)?,
        wo_code: row.get(2)?,
        start_at: row.get(3)?,
        end_at: row.get(4)?,
        failure_type: row.get(5)?,
        component: row.get(6)?,
        cause: row.get(7)?,
        technician: row.get(8)?,
        description: row.get(9)?,
        downtime_hours: row.get(10)?,
        material_cost: row.get(11)?,
        total_cost: row.get(12)?,
        source_file: row.get(13)?,
        imported_at: row.get(14)?,
    })
}

fn map_function(row: &Row) -> rusqlite::Result<FunctionRecord> {
    Ok(FunctionRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        asset_code: row.get(2)?,
        description: row.get(3)?,
    })
}

fn map_failure_mode(row: &Row) -> rusqlite::Result<FailureMode> {
    Ok(FailureMode {
        id: row.get(0)?,
        function_id: row.get(1)?,
        function_name: row.get(2)?,
        asset_code: row.get(3)?,
        component: row.get(4)?,
        failure_type: row.get(5)?,
        cause: row.get(6)?,
        effect: row.get(7)?,
        severity: row.get(8)?,
        occurrence: row.get(9)?,
        detection: row.get(10)?,
        recommended_action: row.get(11)?,
        owner: row.get(12)?,
        due_date: row.get(13)?,
        status: row.get(14)?,
        occurrence_count: row.get(15)?,
        created_at: row.get(16)?,
    })
}

fn map_amdec_row(row: &Row) -> rusqlite::Result<AmdecRawRow> {
    let raw: String = row.get(3)?;
    let values = serde_json::from_str(&raw).map_err(|e| conversion_error(3, e.to_string()))?;
    Ok(AmdecRawRow {
        id: row.get(0)?,
        source_file: row.get(1)?,
        row_number: row.get::<_, i64>(2)?.max(0) as usize,
        values,
    })
}

fn map_part(row: &Row) -> rusqlite::Result<Part> {
    Ok(Part {
        id: row.get(0)?,
        reference: row.get(1)?,
        name: row.get(2)?,
        stock_on_hand: row.get(3)?,
        safety_stock: row.get(4)?,
        reorder_point: row.get(5)?,
        unit_cost: row.get(6)?,
        lead_time_days: row.get(7)?,
    })
}

fn map_part_demand(row: &Row) -> rusqlite::Result<PartDemand> {
    Ok(PartDemand {
        id: row.get(0)?,
        part_ref: row.get(1)?,
        period: row.get(2)?,
        quantity: row.get(3)?,
    })
}

fn map_kpi(row: &Row) -> rusqlite::Result<KpiRecord> {
    let metric: String = row.get(2)?;
    Ok(KpiRecord {
        id: row.get(0)?,
        period: row.get(1)?,
        metric_type: metric
            .parse::<MetricType>()
            .map_err(|e| conversion_error(2, e))?,
        value: row.get(3)?,
        asset_code: row.get(4)?,
    })
}

// ==========================================
// 批量写入（事务内调用）
// ==========================================
fn insert_assets_tx(conn: &Connection, assets: &[Asset]) -> rusqlite::Result<usize> {
    let mut stmt = conn.prepare(
        "INSERT INTO assets (id, code, asset_type, created_at) VALUES (?1, ?2, ?3, ?4)",
    )?;
    for asset in assets {
        stmt.execute(params![asset.id, asset.code, asset.asset_type, asset.created_at])?;
    }
    Ok(assets.len())
}

fn insert_work_orders_tx(conn: &Connection, work_orders: &[WorkOrder]) -> rusqlite::Result<usize> {
    let mut stmt = conn.prepare(&format!(
        "INSERT INTO work_orders ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        WORK_ORDER_COLUMNS
    ))?;
    for wo in work_orders {
        stmt.execute(params![
            wo.id,
            wo.asset_code,
            wo.wo_code,
            wo.start_at,
            wo.end_at,
            wo.failure_type,
            wo.component,
            wo.cause,
            wo.technician,
            wo.description,
            wo.downtime_hours,
            wo.material_cost,
            wo.total_cost,
            wo.source_file,
            wo.imported_at,
        ])?;
    }
    Ok(work_orders.len())
}

fn insert_functions_tx(conn: &Connection, functions: &[FunctionRecord]) -> rusqlite::Result<usize> {
    let mut stmt = conn.prepare(
        "INSERT INTO functions (id, name, asset_code, description) VALUES (?1, ?2, ?3, ?4)",
    )?;
    for f in functions {
        stmt.execute(params![f.id, f.name, f.asset_code, f.description])?;
    }
    Ok(functions.len())
}

fn insert_failure_modes_tx(conn: &Connection, modes: &[FailureMode]) -> rusqlite::Result<usize> {
    let mut stmt = conn.prepare(&format!(
        "INSERT INTO failure_modes ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
        FAILURE_MODE_COLUMNS
    ))?;
    for m in modes {
        stmt.execute(params![
            m.id,
            m.function_id,
            m.function_name,
            m.asset_code,
            m.component,
            m.failure_type,
            m.cause,
            m.effect,
            m.severity,
            m.occurrence,
            m.detection,
            m.recommended_action,
            m.owner,
            m.due_date,
            m.status,
            m.occurrence_count,
            m.created_at,
        ])?;
    }
    Ok(modes.len())
}

fn insert_amdec_rows_tx(conn: &Connection, rows: &[AmdecRawRow]) -> RepositoryResult<usize> {
    let mut stmt = conn.prepare(
        "INSERT INTO amdec_rows (id, source_file, row_number, values_json) VALUES (?1, ?2, ?3, ?4)",
    )?;
    for r in rows {
        let values_json = serde_json::to_string(&r.values)?;
        stmt.execute(params![r.id, r.source_file, r.row_number as i64, values_json])?;
    }
    Ok(rows.len())
}

fn insert_parts_tx(conn: &Connection, parts: &[Part]) -> rusqlite::Result<usize> {
    let mut stmt = conn.prepare(
        "INSERT INTO parts (id, reference, name, stock_on_hand, safety_stock, reorder_point, unit_cost, lead_time_days) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )?;
    for p in parts {
        stmt.execute(params![
            p.id,
            p.reference,
            p.name,
            p.stock_on_hand,
            p.safety_stock,
            p.reorder_point,
            p.unit_cost,
            p.lead_time_days,
        ])?;
    }
    Ok(parts.len())
}

fn insert_part_demand_tx(conn: &Connection, demand: &[PartDemand]) -> rusqlite::Result<usize> {
    let mut stmt = conn.prepare(
        "INSERT INTO part_demand (id, part_ref, period, quantity) VALUES (?1, ?2, ?3, ?4)",
    )?;
    for d in demand {
        stmt.execute(params![d.id, d.part_ref, d.period, d.quantity])?;
    }
    Ok(demand.len())
}

fn insert_kpis_tx(conn: &Connection, kpis: &[KpiRecord]) -> rusqlite::Result<usize> {
    let mut stmt = conn.prepare(
        "INSERT INTO kpis (id, period, metric_type, value, asset_code) VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    for k in kpis {
        stmt.execute(params![k.id, k.period, k.metric_type.as_str(), k.value, k.asset_code])?;
    }
    Ok(kpis.len())
}

fn delete_all_tx(conn: &Connection) -> rusqlite::Result<()> {
    for collection in Collection::ALL {
        conn.execute(&format!("DELETE FROM {}", collection.table_name()), [])?;
    }
    Ok(())
}

// ==========================================
// 全量查询
// ==========================================
fn query_all<T, F>(conn: &Connection, sql: &str, mapper: F) -> rusqlite::Result<Vec<T>>
where
    F: FnMut(&Row) -> rusqlite::Result<T>,
{
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map([], mapper)?;
    rows.collect()
}

fn all_assets(conn: &Connection) -> rusqlite::Result<Vec<Asset>> {
    query_all(
        conn,
        "SELECT id, code, asset_type, created_at FROM assets ORDER BY rowid",
        map_asset,
    )
}

fn all_functions(conn: &Connection) -> rusqlite::Result<Vec<FunctionRecord>> {
    query_all(
        conn,
        "SELECT id, name, asset_code, description FROM functions ORDER BY rowid",
        map_function,
    )
}

fn all_failure_modes(conn: &Connection) -> rusqlite::Result<Vec<FailureMode>> {
    query_all(
        conn,
        &format!("SELECT {} FROM failure_modes ORDER BY rowid", FAILURE_MODE_COLUMNS),
        map_failure_mode,
    )
}

fn all_amdec_rows(conn: &Connection) -> rusqlite::Result<Vec<AmdecRawRow>> {
    query_all(
        conn,
        "SELECT id, source_file, row_number, values_json FROM amdec_rows ORDER BY rowid",
        map_amdec_row,
    )
}

fn all_parts(conn: &Connection) -> rusqlite::Result<Vec<Part>> {
    query_all(
        conn,
        "SELECT id, reference, name, stock_on_hand, safety_stock, reorder_point, unit_cost, lead_time_days \
         FROM parts ORDER BY rowid",
        map_part,
    )
}

// ==========================================
// SqliteMaintenanceStore
// ==========================================
pub struct SqliteMaintenanceStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteMaintenanceStore {
    /// 打开（或创建）数据库文件并建表
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建（与 ConfigManager 共享连接）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            configure_sqlite_connection(&guard)?;
            init_schema(&guard)?;
        }
        Ok(Self { conn })
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 在事务中执行写入
    fn write_tx<T, F>(&self, op: F) -> RepositoryResult<T>
    where
        F: FnOnce(&Connection) -> RepositoryResult<T>,
    {
        let conn = self.get_conn()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        let result = op(&tx)?;
        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(result)
    }
}

#[async_trait]
impl MaintenanceStore for SqliteMaintenanceStore {
    async fn insert_assets(&self, assets: Vec<Asset>) -> RepositoryResult<usize> {
        self.write_tx(|conn| Ok(insert_assets_tx(conn, &assets)?))
    }

    async fn list_assets(&self) -> RepositoryResult<Vec<Asset>> {
        let conn = self.get_conn()?;
        Ok(all_assets(&conn)?)
    }

    async fn find_asset_by_code(&self, code: &str) -> RepositoryResult<Option<Asset>> {
        let conn = self.get_conn()?;
        let asset = conn
            .query_row(
                "SELECT id, code, asset_type, created_at FROM assets WHERE code = ?1 ORDER BY rowid LIMIT 1",
                params![code],
                map_asset,
            )
            .optional()?;
        Ok(asset)
    }

    async fn insert_work_orders(&self, work_orders: Vec<WorkOrder>) -> RepositoryResult<usize> {
        self.write_tx(|conn| Ok(insert_work_orders_tx(conn, &work_orders)?))
    }

    async fn list_work_orders(&self, filter: &WorkOrderFilter) -> RepositoryResult<Vec<WorkOrder>> {
        let mut conditions: Vec<&str> = Vec::new();
        let mut values: Vec<String> = Vec::new();
        if let Some(asset) = &filter.asset_code {
            values.push(asset.clone());
            conditions.push("asset_code = ?");
        }
        if let Some(period) = &filter.period {
            values.push(period.clone());
            conditions.push("substr(start_at, 1, 7) = ?");
        }

        let mut sql = format!("SELECT {} FROM work_orders", WORK_ORDER_COLUMNS);
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push_str(" ORDER BY rowid");

        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), map_work_order)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    async fn insert_functions(&self, functions: Vec<FunctionRecord>) -> RepositoryResult<usize> {
        self.write_tx(|conn| Ok(insert_functions_tx(conn, &functions)?))
    }

    async fn list_functions(&self) -> RepositoryResult<Vec<FunctionRecord>> {
        let conn = self.get_conn()?;
        Ok(all_functions(&conn)?)
    }

    async fn find_function_by_name(&self, name: &str) -> RepositoryResult<Option<FunctionRecord>> {
        let conn = self.get_conn()?;
        let function = conn
            .query_row(
                "SELECT id, name, asset_code, description FROM functions \
                 WHERE name = ?1 COLLATE NOCASE ORDER BY rowid LIMIT 1",
                params![name.trim()],
                map_function,
            )
            .optional()?;
        Ok(function)
    }

    async fn insert_failure_modes(&self, modes: Vec<FailureMode>) -> RepositoryResult<usize> {
        self.write_tx(|conn| Ok(insert_failure_modes_tx(conn, &modes)?))
    }

    async fn list_failure_modes(&self) -> RepositoryResult<Vec<FailureMode>> {
        let conn = self.get_conn()?;
        Ok(all_failure_modes(&conn)?)
    }

    async fn insert_amdec_rows(&self, rows: Vec<AmdecRawRow>) -> RepositoryResult<usize> {
        self.write_tx(|conn| insert_amdec_rows_tx(conn, &rows))
    }

    async fn list_amdec_rows(&self) -> RepositoryResult<Vec<AmdecRawRow>> {
        let conn = self.get_conn()?;
        Ok(all_amdec_rows(&conn)?)
    }

    async fn insert_parts(&self, parts: Vec<Part>) -> RepositoryResult<usize> {
        self.write_tx(|conn| Ok(insert_parts_tx(conn, &parts)?))
    }

    async fn list_parts(&self) -> RepositoryResult<Vec<Part>> {
        let conn = self.get_conn()?;
        Ok(all_parts(&conn)?)
    }

    async fn insert_part_demand(&self, demand: Vec<PartDemand>) -> RepositoryResult<usize> {
        self.write_tx(|conn| Ok(insert_part_demand_tx(conn, &demand)?))
    }

    async fn list_part_demand(&self, part_ref: Option<&str>) -> RepositoryResult<Vec<PartDemand>> {
        let conn = self.get_conn()?;
        let demand = match part_ref {
            Some(reference) => {
                let mut stmt = conn.prepare(
                    "SELECT id, part_ref, period, quantity FROM part_demand \
                     WHERE part_ref = ?1 ORDER BY period, rowid",
                )?;
                let rows = stmt.query_map(params![reference], map_part_demand)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
            None => query_all(
                &conn,
                "SELECT id, part_ref, period, quantity FROM part_demand ORDER BY rowid",
                map_part_demand,
            )?,
        };
        Ok(demand)
    }

    async fn replace_kpis(&self, kpis: Vec<KpiRecord>) -> RepositoryResult<usize> {
        self.write_tx(|conn| {
            let removed = conn.execute("DELETE FROM kpis", [])?;
            debug!(removed = removed, "清除旧 KPI");
            Ok(insert_kpis_tx(conn, &kpis)?)
        })
    }

    async fn list_kpis(&self, filter: &KpiFilter) -> RepositoryResult<Vec<KpiRecord>> {
        let mut conditions: Vec<&str> = Vec::new();
        let mut values: Vec<String> = Vec::new();
        if let Some(metric) = filter.metric {
            values.push(metric.as_str().to_string());
            conditions.push("metric_type = ?");
        }
        if filter.fleet_only {
            conditions.push("asset_code IS NULL");
        } else if let Some(asset) = &filter.asset_code {
            values.push(asset.clone());
            conditions.push("asset_code = ?");
        }
        if let Some(period) = &filter.period {
            values.push(period.clone());
            conditions.push("period = ?");
        }

        let mut sql = "SELECT id, period, metric_type, value, asset_code FROM kpis".to_string();
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push_str(" ORDER BY period, rowid");

        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), map_kpi)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    async fn count(&self, collection: Collection) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", collection.table_name()),
            [],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as usize)
    }

    async fn clear_all(&self) -> RepositoryResult<()> {
        self.write_tx(|conn| Ok(delete_all_tx(conn)?))
    }

    async fn export_snapshot(&self) -> RepositoryResult<StoreSnapshot> {
        let conn = self.get_conn()?;
        Ok(StoreSnapshot {
            version: SNAPSHOT_VERSION,
            exported_at: Utc::now(),
            assets: all_assets(&conn)?,
            work_orders: query_all(
                &conn,
                &format!("SELECT {} FROM work_orders ORDER BY rowid", WORK_ORDER_COLUMNS),
                map_work_order,
            )?,
            functions: all_functions(&conn)?,
            failure_modes: all_failure_modes(&conn)?,
            amdec_rows: all_amdec_rows(&conn)?,
            parts: all_parts(&conn)?,
            part_demand: query_all(
                &conn,
                "SELECT id, part_ref, period, quantity FROM part_demand ORDER BY rowid",
                map_part_demand,
            )?,
            kpis: query_all(
                &conn,
                "SELECT id, period, metric_type, value, asset_code FROM kpis ORDER BY rowid",
                map_kpi,
            )?,
        })
    }

    async fn import_snapshot(
        &self,
        snapshot: StoreSnapshot,
    ) -> RepositoryResult<BTreeMap<Collection, usize>> {
        if snapshot.version > SNAPSHOT_VERSION {
            return Err(RepositoryError::UnsupportedSnapshotVersion {
                found: snapshot.version,
                supported: SNAPSHOT_VERSION,
            });
        }

        self.write_tx(|conn| {
            delete_all_tx(conn)?;
            let mut counts = BTreeMap::new();
            counts.insert(Collection::Assets, insert_assets_tx(conn, &snapshot.assets)?);
            counts.insert(
                Collection::WorkOrders,
                insert_work_orders_tx(conn, &snapshot.work_orders)?,
            );
            counts.insert(Collection::Functions, insert_functions_tx(conn, &snapshot.functions)?);
            counts.insert(
                Collection::FailureModes,
                insert_failure_modes_tx(conn, &snapshot.failure_modes)?,
            );
            counts.insert(Collection::AmdecRows, insert_amdec_rows_tx(conn, &snapshot.amdec_rows)?);
            counts.insert(Collection::Parts, insert_parts_tx(conn, &snapshot.parts)?);
            counts.insert(
                Collection::PartDemand,
                insert_part_demand_tx(conn, &snapshot.part_demand)?,
            );
            counts.insert(Collection::Kpis, insert_kpis_tx(conn, &snapshot.kpis)?);
            Ok(counts)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn store() -> SqliteMaintenanceStore {
        let conn = Connection::open_in_memory().unwrap();
        SqliteMaintenanceStore::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    fn work_order(asset: &str, day: u32) -> WorkOrder {
        WorkOrder {
            id: uuid::Uuid::new_v4().to_string(),
            asset_code: asset.to_string(),
            wo_code: None,
            start_at: NaiveDate::from_ymd_opt(2024, 3, day)
                .unwrap()
                .and_hms_opt(8, 0, 0),
            end_at: None,
            failure_type: Some("Mécanique".to_string()),
            component: None,
            cause: None,
            technician: None,
            description: None,
            downtime_hours: 1.5,
            material_cost: 10.0,
            total_cost: 0.0,
            source_file: Some("test.csv".to_string()),
            imported_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_work_order_filters() {
        let store = store();
        store
            .insert_work_orders(vec![work_order("A", 1), work_order("B", 2), work_order("A", 3)])
            .await
            .unwrap();

        let all = store.list_work_orders(&WorkOrderFilter::default()).await.unwrap();
        assert_eq!(all.len(), 3);

        let filter = WorkOrderFilter {
            asset_code: Some("A".to_string()),
            period: Some("2024-03".to_string()),
        };
        assert_eq!(store.list_work_orders(&filter).await.unwrap().len(), 2);

        let filter = WorkOrderFilter {
            asset_code: None,
            period: Some("2024-04".to_string()),
        };
        assert!(store.list_work_orders(&filter).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_replace_kpis_replaces_everything() {
        let store = store();
        let kpi = |period: &str, asset: Option<&str>| KpiRecord {
            id: uuid::Uuid::new_v4().to_string(),
            period: period.to_string(),
            metric_type: MetricType::Mtbf,
            value: 12.0,
            asset_code: asset.map(|s| s.to_string()),
        };
        store
            .replace_kpis(vec![kpi("2024-01", Some("A")), kpi("2024-01", None)])
            .await
            .unwrap();
        store.replace_kpis(vec![kpi("2024-02", None)]).await.unwrap();

        let all = store.list_kpis(&KpiFilter::default()).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].period, "2024-02");

        let fleet = store
            .list_kpis(&KpiFilter {
                fleet_only: true,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(fleet.len(), 1);
    }

    #[tokio::test]
    async fn test_find_function_by_name_is_case_insensitive() {
        let store = store();
        store
            .insert_functions(vec![FunctionRecord::new("Compression", None)])
            .await
            .unwrap();
        assert!(store.find_function_by_name("compression").await.unwrap().is_some());
        assert!(store.find_function_by_name("Pompage").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_clear_all() {
        let store = store();
        store.insert_assets(vec![Asset::new("A")]).await.unwrap();
        store.insert_work_orders(vec![work_order("A", 1)]).await.unwrap();
        store.clear_all().await.unwrap();
        for collection in Collection::ALL {
            assert_eq!(store.count(collection).await.unwrap(), 0);
        }
    }

    #[tokio::test]
    async fn test_import_snapshot_rejects_future_version() {
        let store = store();
        let mut snapshot = StoreSnapshot::empty();
        snapshot.version = SNAPSHOT_VERSION + 1;
        assert!(store.import_snapshot(snapshot).await.is_err());
    }
}
