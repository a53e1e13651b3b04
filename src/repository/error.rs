// ==========================================
// GMAO 维护数据核心 - 仓储层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 规则: rusqlite / serde_json 错误在此收敛, 上层只见 RepositoryError
// ==========================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== 连接 / 事务 =====
    #[error("Connexion à la base impossible : {0}")]
    DatabaseConnectionError(String),

    #[error("Verrou de la base indisponible : {0}")]
    LockError(String),

    #[error("Échec de transaction : {0}")]
    DatabaseTransactionError(String),

    // ===== 查询 =====
    #[error("Échec de requête : {0}")]
    DatabaseQueryError(String),

    #[error("Aucun enregistrement correspondant")]
    NotFound,

    // 快照中重复的 id 会触发
    #[error("Identifiant déjà présent : {0}")]
    DuplicateId(String),

    // ===== 数据 =====
    #[error("Version de sauvegarde {found} non supportée (version maximale : {supported})")]
    UnsupportedSnapshotVersion { found: u32, supported: u32 },

    #[error("Sérialisation impossible : {0}")]
    SerializationError(String),
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(code, msg)
                if code.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                RepositoryError::DuplicateId(msg.unwrap_or_else(|| code.to_string()))
            }
            rusqlite::Error::SqliteFailure(code, msg) if code.code == rusqlite::ErrorCode::DatabaseBusy => {
                RepositoryError::LockError(msg.unwrap_or_else(|| code.to_string()))
            }
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound,
            other => RepositoryError::DatabaseQueryError(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::SerializationError(err.to_string())
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;
