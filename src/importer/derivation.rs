// ==========================================
// GMAO 维护数据核心 - AMDEC 派生服务
// ==========================================
// 职责: 由维护记录派生功能（Function）与失效模式（Failure Mode）
// 规则: 文件提供的评分优先; 缺失时按停机时长/出现次数打分
// 刻度: 统一 1..=10（1..=5 文件 ×2）
// ==========================================

use crate::domain::amdec::{clamp_canonical, five_point_to_canonical, FailureMode, FunctionRecord};
use crate::importer::field_mapper::WorkOrderRow;
use crate::importer::vocabulary::normalize_header;
use std::collections::HashMap;

/// 缺省可探测度（中间值）
pub const DEFAULT_DETECTION: u8 = 5;
/// 派生失效模式的缺省影响描述
pub const DERIVED_EFFECT: &str = "Arrêt de l'équipement";
pub const UNSPECIFIED: &str = "Non spécifié";

/// 严重度 ← 组内最大停机时长（小时）
pub fn severity_from_downtime(hours: f64) -> u8 {
    if hours <= 1.0 {
        2
    } else if hours <= 4.0 {
        4
    } else if hours <= 8.0 {
        6
    } else if hours <= 24.0 {
        8
    } else {
        10
    }
}

/// 发生度 ← 组内出现次数
pub fn occurrence_from_count(count: u32) -> u8 {
    match count {
        0..=2 => 2,
        3..=5 => 4,
        6..=10 => 6,
        11..=20 => 8,
        _ => 10,
    }
}

/// 统一评分刻度: 文件内所有已提供评分均 ≤5 → 视为 1..=5 刻度并 ×2
pub fn canonicalize_scores(modes: &mut [FailureMode]) {
    let supplied: Vec<u8> = modes
        .iter()
        .flat_map(|m| [m.severity, m.occurrence, m.detection])
        .flatten()
        .collect();
    if supplied.is_empty() {
        return;
    }

    let five_point = supplied.iter().all(|s| *s <= 5);
    let convert = |score: Option<u8>| {
        score.map(|s| {
            if five_point {
                five_point_to_canonical(s)
            } else {
                clamp_canonical(s)
            }
        })
    };

    for mode in modes.iter_mut() {
        mode.severity = convert(mode.severity);
        mode.occurrence = convert(mode.occurrence);
        mode.detection = convert(mode.detection);
    }
}

// ==========================================
// AmdecDerivation - 派生结果
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct AmdecDerivation {
    pub functions: Vec<FunctionRecord>,
    pub failure_modes: Vec<FailureMode>,
}

struct ModeGroup {
    mode: FailureMode,
    worst_downtime: f64,
}

/// 由工单行派生 AMDEC
///
/// - 功能: 按功能/工艺列分组, 无该列时按设备分组
/// - 失效模式: 按（功能, 组成部件, 故障类型）分组, 统计出现次数
pub fn derive_amdec(rows: &[(String, WorkOrderRow)]) -> AmdecDerivation {
    let mut functions: Vec<FunctionRecord> = Vec::new();
    let mut function_index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<ModeGroup> = Vec::new();
    let mut group_index: HashMap<(String, String, String), usize> = HashMap::new();

    for (asset_code, row) in rows {
        let function_name = row
            .function_label
            .clone()
            .unwrap_or_else(|| asset_code.clone());
        let function_key = normalize_header(&function_name);
        let function_pos = *function_index.entry(function_key.clone()).or_insert_with(|| {
            functions.push(FunctionRecord::new(function_name.clone(), Some(asset_code.clone())));
            functions.len() - 1
        });
        let function = &functions[function_pos];

        let component = row.component.clone().unwrap_or_else(|| UNSPECIFIED.to_string());
        let failure_type = row
            .failure_type
            .clone()
            .unwrap_or_else(|| UNSPECIFIED.to_string());
        let key = (
            function_key,
            normalize_header(&component),
            normalize_header(&failure_type),
        );

        let pos = *group_index.entry(key).or_insert_with(|| {
            let mut mode = FailureMode::new(component, failure_type);
            mode.function_id = Some(function.id.clone());
            mode.function_name = Some(function.name.clone());
            mode.asset_code = Some(asset_code.clone());
            mode.effect = Some(DERIVED_EFFECT.to_string());
            groups.push(ModeGroup {
                mode,
                worst_downtime: 0.0,
            });
            groups.len() - 1
        });

        let group = &mut groups[pos];
        group.mode.occurrence_count += 1;
        group.worst_downtime = group.worst_downtime.max(row.downtime_hours);
        if group.mode.cause.is_none() {
            group.mode.cause = row.cause.clone();
        }
        // 文件提供的评分: 组内首个非空值
        group.mode.severity = group.mode.severity.or(row.severity);
        group.mode.occurrence = group.mode.occurrence.or(row.occurrence);
        group.mode.detection = group.mode.detection.or(row.detection);
    }

    let mut failure_modes: Vec<FailureMode> = groups.iter().map(|g| g.mode.clone()).collect();
    canonicalize_scores(&mut failure_modes);

    for (mode, group) in failure_modes.iter_mut().zip(groups.iter()) {
        if mode.severity.is_none() {
            mode.severity = Some(severity_from_downtime(group.worst_downtime));
        }
        if mode.occurrence.is_none() {
            mode.occurrence = Some(occurrence_from_count(mode.occurrence_count));
        }
        if mode.detection.is_none() {
            mode.detection = Some(DEFAULT_DETECTION);
        }
    }

    AmdecDerivation {
        functions,
        failure_modes,
    }
}
