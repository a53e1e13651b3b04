// ==========================================
// GMAO 维护数据核心 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 规则: 文件级错误必须说明问题类别 + 期望的列名词汇
//       （最终用户修正源文件, 不看日志）
// ==========================================

use crate::repository::error::RepositoryError;
use std::fmt;
use thiserror::Error;

/// 期望列名示例（附在分类失败类错误消息中）
pub const EXPECTED_COLUMNS_HINT: &str = "Colonnes attendues, par exemple : \
« Date intervention », « Désignation », « Type de panne », « Durée arrêt (h) », \
« Organe », « Cause », « Technicien », « Coût matériel » (interventions) ; \
« Fonction », « Mode de défaillance », « Gravité », « Occurrence », « Détection » (AMDEC) ; \
« Référence », « Stock », « Stock de sécurité », « Point de commande » (pièces) ; \
« Référence », « Période », « Consommation » (consommation de pièces).";

// ==========================================
// 工作表拒绝原因
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetRejection {
    KpiTrackingFile,    // 多个按月命名的工作表 → 可用率/KPI 跟踪文件
    NoRecognizableData, // 通用失败
}

impl fmt::Display for SheetRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetRejection::KpiTrackingFile => write!(
                f,
                "Ce fichier ressemble à un suivi de disponibilité / KPI (une feuille par mois) \
                 et non à un historique d'interventions. Importez l'export GMAO des interventions \
                 plutôt que le tableau de bord mensuel."
            ),
            SheetRejection::NoRecognizableData => write!(
                f,
                "Aucune feuille ne contient de données de maintenance reconnaissables."
            ),
        }
    }
}

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("Fichier introuvable : {0}")]
    FileNotFound(String),

    #[error("Format de fichier non supporté : {0} (formats acceptés : .csv, .xls, .xlsx, .json)")]
    UnsupportedFormat(String),

    #[error("Lecture du fichier impossible : {0}")]
    FileReadError(String),

    #[error("Fichier illisible « {file_name} » : {message}")]
    Parse { file_name: String, message: String },

    // ===== 工作表选择错误 =====
    #[error("{reason} Feuilles trouvées : {}. {}", .sheets.join(", "), EXPECTED_COLUMNS_HINT)]
    NoSuitableSheet {
        sheets: Vec<String>,
        reason: SheetRejection,
    },

    #[error(
        "La feuille « {sheet} » est un tableau de synthèse KPI (disponibilité, MTBF, MTTR par mois), \
         pas un historique d'interventions. {}",
        EXPECTED_COLUMNS_HINT
    )]
    KpiSummaryDetected { sheet: String },

    // ===== 分类错误 =====
    #[error(
        "Format de fichier non reconnu. Colonnes détectées : {}. Formats supportés : {}. {}",
        .headers.join(", "),
        .supported.join(" ; "),
        EXPECTED_COLUMNS_HINT
    )]
    UnrecognizedSchema {
        headers: Vec<String>,
        supported: Vec<String>,
    },

    // ===== 存储错误 =====
    #[error("Erreur de stockage : {0}")]
    Repository(#[from] RepositoryError),

    // ===== 通用错误 =====
    #[error("Erreur interne : {0}")]
    InternalError(String),
}

impl ImportError {
    /// 错误类别（供 API 层结构化输出）
    pub fn category(&self) -> &'static str {
        match self {
            ImportError::FileNotFound(_) | ImportError::FileReadError(_) => "FILE",
            ImportError::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            ImportError::Parse { .. } => "PARSE",
            ImportError::NoSuitableSheet { .. } => "NO_SUITABLE_SHEET",
            ImportError::KpiSummaryDetected { .. } => "KPI_SUMMARY_DETECTED",
            ImportError::UnrecognizedSchema { .. } => "UNRECOGNIZED_SCHEMA",
            ImportError::Repository(_) => "STORAGE",
            ImportError::InternalError(_) => "INTERNAL",
        }
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unrecognized_schema_message_lists_headers_and_vocabulary() {
        let err = ImportError::UnrecognizedSchema {
            headers: vec!["Foo".to_string(), "Bar".to_string()],
            supported: vec!["A".to_string(), "B".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("Foo, Bar"));
        assert!(msg.contains("A ; B"));
        assert!(msg.contains("Date intervention"));
        assert_eq!(err.category(), "UNRECOGNIZED_SCHEMA");
    }

    #[test]
    fn test_no_suitable_sheet_messages_differ_by_reason() {
        let sheets = vec!["Janvier".to_string(), "Février".to_string()];
        let kpi = ImportError::NoSuitableSheet {
            sheets: sheets.clone(),
            reason: SheetRejection::KpiTrackingFile,
        };
        let generic = ImportError::NoSuitableSheet {
            sheets,
            reason: SheetRejection::NoRecognizableData,
        };
        assert!(kpi.to_string().contains("disponibilité"));
        assert!(kpi.to_string().contains("Janvier, Février"));
        assert!(generic.to_string().contains("Aucune feuille"));
    }
}
