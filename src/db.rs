// ==========================================
// GMAO 维护数据核心 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout
// - 建表（幂等, 本地存储无迁移）
// ==========================================

use rusqlite::Connection;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 配置 SQLite 连接的统一 PRAGMA
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 本地存储表结构
///
/// 集合之间不设外键: 导入只追加, 清空按集合整体删除
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS assets (
    id          TEXT PRIMARY KEY,
    code        TEXT NOT NULL,
    asset_type  TEXT NOT NULL,
    created_at  TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_assets_code ON assets(code);

CREATE TABLE IF NOT EXISTS work_orders (
    id              TEXT PRIMARY KEY,
    asset_code      TEXT NOT NULL,
    wo_code         TEXT,
    start_at        TEXT,
    end_at          TEXT,
    failure_type    TEXT,
    component       TEXT,
    cause           TEXT,
    technician      TEXT,
    description     TEXT,
    downtime_hours  REAL NOT NULL DEFAULT 0,
    material_cost   REAL NOT NULL DEFAULT 0,
    total_cost      REAL NOT NULL DEFAULT 0,
    source_file     TEXT,
    imported_at     TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_work_orders_asset ON work_orders(asset_code);

CREATE TABLE IF NOT EXISTS functions (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    asset_code  TEXT,
    description TEXT
);

CREATE TABLE IF NOT EXISTS failure_modes (
    id                  TEXT PRIMARY KEY,
    function_id         TEXT,
    function_name       TEXT,
    asset_code          TEXT,
    component           TEXT NOT NULL,
    failure_type        TEXT NOT NULL,
    cause               TEXT,
    effect              TEXT,
    severity            INTEGER,
    occurrence          INTEGER,
    detection           INTEGER,
    recommended_action  TEXT,
    owner               TEXT,
    due_date            TEXT,
    status              TEXT,
    occurrence_count    INTEGER NOT NULL DEFAULT 0,
    created_at          TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS amdec_rows (
    id           TEXT PRIMARY KEY,
    source_file  TEXT,
    row_number   INTEGER NOT NULL,
    values_json  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS parts (
    id              TEXT PRIMARY KEY,
    reference       TEXT NOT NULL,
    name            TEXT NOT NULL,
    stock_on_hand   REAL NOT NULL DEFAULT 0,
    safety_stock    REAL NOT NULL DEFAULT 0,
    reorder_point   REAL NOT NULL DEFAULT 0,
    unit_cost       REAL,
    lead_time_days  INTEGER
);

CREATE TABLE IF NOT EXISTS part_demand (
    id        TEXT PRIMARY KEY,
    part_ref  TEXT NOT NULL,
    period    TEXT NOT NULL,
    quantity  REAL NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_part_demand_ref ON part_demand(part_ref);

CREATE TABLE IF NOT EXISTS kpis (
    id           TEXT PRIMARY KEY,
    period       TEXT NOT NULL,
    metric_type  TEXT NOT NULL,
    value        REAL NOT NULL,
    asset_code   TEXT
);

CREATE TABLE IF NOT EXISTS config_kv (
    scope_id    TEXT NOT NULL DEFAULT 'global',
    key         TEXT NOT NULL,
    value       TEXT NOT NULL,
    updated_at  TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (scope_id, key)
);
"#;

/// 建表（幂等）
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 9);
    }
}
