// ==========================================
// GMAO 维护数据核心 - KPI 重算引擎
// ==========================================
// 红线: 全量重算, 替换整个 KPI 集合; 不修改工单
// ==========================================
// 输入: 全部工单
// 输出: 按 (设备, 月) 的 MTBF / MTTR / 可用率 + 每月全厂汇总
// 约束: 结果中不得出现 NaN / Infinity
// ==========================================

use crate::domain::kpi::KpiRecord;
use crate::domain::maintenance::WorkOrder;
use crate::domain::types::MetricType;
use crate::repository::{MaintenanceStore, RepositoryResult, WorkOrderFilter};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument};
use uuid::Uuid;

// ==========================================
// PeriodAccumulator - 单组累计
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct PeriodAccumulator {
    downtime_hours: f64,
    failures: u32,
}

/// 单组指标（已封顶、已去除非有限值）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodMetrics {
    pub operating_hours: f64,
    pub downtime_hours: f64,
    pub failures: u32,
}

impl PeriodMetrics {
    pub fn mtbf(&self) -> f64 {
        finite_or_zero(self.operating_hours / f64::from(self.failures.max(1)))
    }

    pub fn mttr(&self) -> f64 {
        finite_or_zero(self.downtime_hours / f64::from(self.failures.max(1)))
    }

    pub fn availability(&self) -> f64 {
        let denominator = self.operating_hours + self.downtime_hours;
        if denominator <= 0.0 {
            return 0.0;
        }
        finite_or_zero(self.operating_hours / denominator)
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// 月份小时数（该月天数 × 24）; 非法周期 → None
pub fn period_hours(period: &str) -> Option<f64> {
    let (year, month) = period.split_once('-')?;
    let year: i32 = year.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    let days = (next - first).num_days();
    Some(days as f64 * 24.0)
}

// ==========================================
// 纯计算
// ==========================================

/// 由工单计算全部 KPI 记录（无开始时间的工单不计入）
pub fn compute_kpis(work_orders: &[WorkOrder]) -> Vec<KpiRecord> {
    let mut groups: BTreeMap<(String, String), PeriodAccumulator> = BTreeMap::new();

    for wo in work_orders {
        let Some(period) = wo.period() else {
            continue;
        };
        let entry = groups.entry((period, wo.asset_code.clone())).or_default();
        entry.downtime_hours += finite_or_zero(wo.downtime_hours).max(0.0);
        if !wo.is_preventive() {
            entry.failures += 1;
        }
    }

    let mut records = Vec::with_capacity(groups.len() * 3);
    let mut fleet: BTreeMap<String, PeriodMetrics> = BTreeMap::new();

    for ((period, asset_code), acc) in groups {
        let Some(hours) = period_hours(&period) else {
            continue;
        };
        let downtime = acc.downtime_hours.min(hours);
        let metrics = PeriodMetrics {
            operating_hours: hours - downtime,
            downtime_hours: downtime,
            failures: acc.failures,
        };
        push_metrics(&mut records, &period, Some(asset_code), &metrics);

        let total = fleet.entry(period).or_insert(PeriodMetrics {
            operating_hours: 0.0,
            downtime_hours: 0.0,
            failures: 0,
        });
        total.operating_hours += metrics.operating_hours;
        total.downtime_hours += metrics.downtime_hours;
        total.failures += metrics.failures;
    }

    // 全厂汇总: 各设备运行/停机时间与故障数之和
    for (period, metrics) in fleet {
        push_metrics(&mut records, &period, None, &metrics);
    }

    records
}

fn push_metrics(
    records: &mut Vec<KpiRecord>,
    period: &str,
    asset_code: Option<String>,
    metrics: &PeriodMetrics,
) {
    for (metric_type, value) in [
        (MetricType::Availability, metrics.availability()),
        (MetricType::Mtbf, metrics.mtbf()),
        (MetricType::Mttr, metrics.mttr()),
    ] {
        records.push(KpiRecord {
            id: Uuid::new_v4().to_string(),
            period: period.to_string(),
            metric_type,
            value: finite_or_zero(value),
            asset_code: asset_code.clone(),
        });
    }
}

// ==========================================
// KpiRecalcSummary - 重算结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiRecalcSummary {
    pub work_orders: usize,
    pub undated_work_orders: usize,
    pub kpi_records: usize,
    pub periods: usize,
    pub elapsed_ms: u64,
}

// ==========================================
// KpiRecalculator
// ==========================================
pub struct KpiRecalculator<S>
where
    S: MaintenanceStore,
{
    store: Arc<S>,
}

impl<S> KpiRecalculator<S>
where
    S: MaintenanceStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// 全量重算并替换 KPI 集合（空工单 → 空 KPI 集合）
    #[instrument(skip(self))]
    pub async fn recalculate(&self) -> RepositoryResult<KpiRecalcSummary> {
        let start_time = Instant::now();
        let work_orders = self.store.list_work_orders(&WorkOrderFilter::default()).await?;
        let undated = work_orders.iter().filter(|wo| wo.start_at.is_none()).count();

        let records = compute_kpis(&work_orders);
        let periods = records
            .iter()
            .map(|r| r.period.as_str())
            .collect::<std::collections::BTreeSet<_>>()
            .len();
        let written = self.store.replace_kpis(records).await?;

        let summary = KpiRecalcSummary {
            work_orders: work_orders.len(),
            undated_work_orders: undated,
            kpi_records: written,
            periods,
            elapsed_ms: start_time.elapsed().as_millis() as u64,
        };
        info!(
            work_orders = summary.work_orders,
            undated = summary.undated_work_orders,
            kpi_records = summary.kpi_records,
            periods = summary.periods,
            "KPI 重算完成"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn wo(asset: &str, date: (i32, u32, u32), downtime: f64, failure_type: &str) -> WorkOrder {
        WorkOrder {
            id: Uuid::new_v4().to_string(),
            asset_code: asset.to_string(),
            wo_code: None,
            start_at: NaiveDate::from_ymd_opt(date.0, date.1, date.2)
                .unwrap()
                .and_hms_opt(8, 0, 0),
            end_at: None,
            failure_type: Some(failure_type.to_string()),
            component: None,
            cause: None,
            technician: None,
            description: None,
            downtime_hours: downtime,
            material_cost: 0.0,
            total_cost: 0.0,
            source_file: None,
            imported_at: Utc::now(),
        }
    }

    fn value(records: &[KpiRecord], asset: Option<&str>, metric: MetricType) -> f64 {
        records
            .iter()
            .find(|r| r.asset_code.as_deref() == asset && r.metric_type == metric)
            .map(|r| r.value)
            .unwrap()
    }

    #[test]
    fn test_period_hours() {
        assert_eq!(period_hours("2024-02"), Some(29.0 * 24.0));
        assert_eq!(period_hours("2023-02"), Some(28.0 * 24.0));
        assert_eq!(period_hours("2024-12"), Some(31.0 * 24.0));
        assert_eq!(period_hours("2024-13"), None);
    }

    #[test]
    fn test_empty_input_yields_empty_set() {
        assert!(compute_kpis(&[]).is_empty());
    }

    #[test]
    fn test_single_asset_month() {
        // 2024-04: 720 h
        let orders = vec![
            wo("COMP-A1", (2024, 4, 2), 10.0, "Mécanique"),
            wo("COMP-A1", (2024, 4, 20), 10.0, "Électrique"),
            wo("COMP-A1", (2024, 4, 25), 4.0, "Préventif"),
        ];
        let records = compute_kpis(&orders);
        // 3 指标 × (设备 + 全厂)
        assert_eq!(records.len(), 6);

        let mtbf = value(&records, Some("COMP-A1"), MetricType::Mtbf);
        let mttr = value(&records, Some("COMP-A1"), MetricType::Mttr);
        let availability = value(&records, Some("COMP-A1"), MetricType::Availability);
        assert!((mtbf - (720.0 - 24.0) / 2.0).abs() < 1e-9);
        assert!((mttr - 12.0).abs() < 1e-9);
        assert!((availability - 696.0 / 720.0).abs() < 1e-9);
    }

    #[test]
    fn test_downtime_capped_and_no_failures() {
        let orders = vec![wo("PRESSE-2", (2024, 2, 1), 5000.0, "Préventive systématique")];
        let records = compute_kpis(&orders);
        assert!(records.iter().all(|r| r.value.is_finite()));
        assert_eq!(value(&records, Some("PRESSE-2"), MetricType::Availability), 0.0);
        assert_eq!(value(&records, Some("PRESSE-2"), MetricType::Mtbf), 0.0);
        assert!((value(&records, Some("PRESSE-2"), MetricType::Mttr) - 696.0).abs() < 1e-9);
    }

    #[test]
    fn test_fleet_record_sums_assets() {
        let orders = vec![
            wo("A", (2024, 4, 2), 20.0, "Mécanique"),
            wo("B", (2024, 4, 3), 0.0, "Mécanique"),
        ];
        let records = compute_kpis(&orders);
        let fleet_mtbf = value(&records, None, MetricType::Mtbf);
        assert!((fleet_mtbf - (700.0 + 720.0) / 2.0).abs() < 1e-9);
        let fleet_availability = value(&records, None, MetricType::Availability);
        assert!((fleet_availability - 1420.0 / 1440.0).abs() < 1e-9);
    }

    #[test]
    fn test_non_finite_downtime_ignored() {
        let orders = vec![wo("A", (2024, 4, 2), f64::NAN, "Mécanique")];
        let records = compute_kpis(&orders);
        assert!(records.iter().all(|r| r.value.is_finite()));
        assert_eq!(value(&records, Some("A"), MetricType::Availability), 1.0);
    }
}
