// ==========================================
// GMAO 维护数据核心 - 备件库存监控引擎
// ==========================================
// 红线: 所有判定必须输出 reason
// ==========================================
// 职责: 库存阈值判定 + 按消耗历史选择需求策略 + MTBF 需求预测
// 输入: Part + PartDemand（按月）
// 输出: StockAlert（按严重度排序）
// ==========================================

use crate::domain::part::{ConfidenceLevel, DemandStrategy, Part, PartDemand, StockStatus};
use crate::repository::{MaintenanceStore, RepositoryResult};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{info, instrument};

// ==========================================
// 库存状态判定
// ==========================================

/// 判定单个备件的库存状态（返回状态 + 原因）
pub fn evaluate_stock(part: &Part) -> (StockStatus, String) {
    if part.stock_on_hand <= 0.0 {
        return (StockStatus::OutOfStock, "Rupture de stock".to_string());
    }
    if part.stock_on_hand < part.safety_stock {
        return (
            StockStatus::BelowSafetyStock,
            format!(
                "Stock {} inférieur au stock de sécurité {}",
                part.stock_on_hand, part.safety_stock
            ),
        );
    }
    if part.stock_on_hand <= part.reorder_point {
        return (
            StockStatus::BelowReorderPoint,
            format!(
                "Stock {} au niveau du point de commande {}",
                part.stock_on_hand, part.reorder_point
            ),
        );
    }
    (StockStatus::Ok, "Stock suffisant".to_string())
}

// ==========================================
// 需求统计 + 策略
// ==========================================

/// 趋势比较窗口（月）: 最近 12 个月 vs 最早 12 个月
const TREND_WINDOW_MONTHS: usize = 12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandStats {
    pub n_months: usize,
    pub non_zero_months: usize,
    pub non_zero_percentage: f64,
    pub mean_usage: f64,
    pub std_usage: f64,
    pub cv: Option<f64>, // 平均消耗为 0 时无定义
    pub trend_strength: f64, // 不足 12 个月时为 0
}

/// 按月汇总消耗（无法解析的期间、非有限数量被忽略）
fn monthly_totals(demand: &[PartDemand]) -> BTreeMap<NaiveDate, f64> {
    let mut by_month: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for record in demand {
        let Some(month) = parse_period(&record.period) else {
            continue;
        };
        if record.quantity.is_finite() {
            *by_month.entry(month).or_insert(0.0) += record.quantity;
        }
    }
    by_month
}

/// 将按月消耗展开为连续月份序列（缺失月份补 0）
pub fn monthly_series(demand: &[PartDemand]) -> Vec<f64> {
    let by_month = monthly_totals(demand);

    let (Some(first), Some(last)) = (
        by_month.keys().next().copied(),
        by_month.keys().next_back().copied(),
    ) else {
        return Vec::new();
    };

    let mut series = Vec::new();
    let mut cursor = first;
    while cursor <= last {
        series.push(by_month.get(&cursor).copied().unwrap_or(0.0));
        cursor = next_month(cursor);
    }
    series
}

fn parse_period(period: &str) -> Option<NaiveDate> {
    let (year, month) = period.split_once('-')?;
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, 1)
}

fn next_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MAX)
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// 总体标准差
fn std_dev(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

pub fn demand_stats(series: &[f64]) -> DemandStats {
    let n = series.len();
    if n == 0 {
        return DemandStats {
            n_months: 0,
            non_zero_months: 0,
            non_zero_percentage: 0.0,
            mean_usage: 0.0,
            std_usage: 0.0,
            cv: None,
            trend_strength: 0.0,
        };
    }
    let non_zero = series.iter().filter(|v| **v > 0.0).count();
    let mean_usage = mean(series);
    let std = std_dev(series, mean_usage);

    // 相对变化: |近期均值 - 早期均值| / 早期均值（分母加 1e-6 防止除零）
    let trend_strength = if n >= TREND_WINDOW_MONTHS {
        let recent = mean(&series[n - TREND_WINDOW_MONTHS..]);
        let early = mean(&series[..TREND_WINDOW_MONTHS]);
        (recent - early).abs() / (early + 1e-6)
    } else {
        0.0
    };

    DemandStats {
        n_months: n,
        non_zero_months: non_zero,
        non_zero_percentage: non_zero as f64 / n as f64 * 100.0,
        mean_usage,
        std_usage: std,
        cv: if mean_usage > 0.0 { Some(std / mean_usage) } else { None },
        trend_strength,
    }
}

/// 按消耗规律选择需求策略（返回策略 + 原因）
pub fn select_strategy(stats: &DemandStats) -> (DemandStrategy, String) {
    let pct = stats.non_zero_percentage;
    let regular = stats.cv.map(|cv| cv < 1.0).unwrap_or(false);
    if pct >= 50.0 && regular {
        (
            DemandStrategy::TimeSeries,
            "Utilisation régulière avec variabilité faible".to_string(),
        )
    } else if (20.0..50.0).contains(&pct) {
        (
            DemandStrategy::Statistical,
            "Utilisation modérée ou intermittente".to_string(),
        )
    } else {
        (
            DemandStrategy::SafetyStock,
            "Utilisation sporadique: stock de sécurité basé sur le risque".to_string(),
        )
    }
}

// ==========================================
// MTBF - 按有消耗的月份推算故障间隔
// ==========================================
// 每个有消耗的月份视为一次故障（记在当月 1 日）
// λ = 1 / MTBF（次/月）, 预测期望 = λ·t, 泊松区间 ±1.04·√(λt)

/// 平均每月天数
pub const DAYS_PER_MONTH: f64 = 30.44;
/// 预测月数
pub const FORECAST_HORIZON_MONTHS: u32 = 12;
/// 泊松近似区间系数（约 70% 置信度）
const POISSON_BAND_Z: f64 = 1.04;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MtbfStats {
    pub failure_months: usize,
    pub mtbf_days: f64,
    pub mtbf_months: f64,
    pub std_days: f64,
    pub failure_rate: f64, // λ, 次/月
    pub min_interval_days: i64,
    pub max_interval_days: i64,
    pub reliability: ConfidenceLevel, // 由 std/mtbf 判定: <0.3 高, <0.6 中
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub month_offset: u32, // 1 起
    pub expected_failures: f64,
    pub lower: f64,
    pub upper: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MtbfForecast {
    pub points: Vec<ForecastPoint>,
    pub mtbf_months: f64,
    pub confidence: ConfidenceLevel, // 由故障月数判定: ≥5 高, ≥3 中
}

/// 计算 MTBF 统计; 有消耗的月份少于 2 个时返回 None
pub fn mtbf_stats(demand: &[PartDemand]) -> Option<MtbfStats> {
    let failure_dates: Vec<NaiveDate> = monthly_totals(demand)
        .into_iter()
        .filter(|(_, quantity)| *quantity > 0.0)
        .map(|(month, _)| month)
        .collect();
    if failure_dates.len() < 2 {
        return None;
    }

    let intervals: Vec<i64> = failure_dates
        .windows(2)
        .map(|pair| pair[1].signed_duration_since(pair[0]).num_days())
        .collect();
    let days: Vec<f64> = intervals.iter().map(|d| *d as f64).collect();
    let mtbf_days = mean(&days);
    if mtbf_days <= 0.0 {
        return None;
    }
    let std_days = std_dev(&days, mtbf_days);
    let mtbf_months = mtbf_days / DAYS_PER_MONTH;

    let dispersion = std_days / mtbf_days;
    let reliability = if dispersion < 0.3 {
        ConfidenceLevel::High
    } else if dispersion < 0.6 {
        ConfidenceLevel::Medium
    } else {
        ConfidenceLevel::Low
    };

    Some(MtbfStats {
        failure_months: failure_dates.len(),
        mtbf_days,
        mtbf_months,
        std_days,
        failure_rate: 1.0 / mtbf_months,
        min_interval_days: intervals.iter().copied().min().unwrap_or(0),
        max_interval_days: intervals.iter().copied().max().unwrap_or(0),
        reliability,
    })
}

/// 按失效率 λ 生成逐月累计期望故障数
pub fn mtbf_forecast(stats: &MtbfStats, horizon_months: u32) -> MtbfForecast {
    let points = (1..=horizon_months)
        .map(|month_offset| {
            let expected = stats.failure_rate * f64::from(month_offset);
            let band = POISSON_BAND_Z * expected.sqrt();
            ForecastPoint {
                month_offset,
                expected_failures: expected,
                lower: (expected - band).max(0.0),
                upper: expected + band,
            }
        })
        .collect();

    let confidence = match stats.failure_months {
        n if n >= 5 => ConfidenceLevel::High,
        n if n >= 3 => ConfidenceLevel::Medium,
        _ => ConfidenceLevel::Low,
    };

    MtbfForecast {
        points,
        mtbf_months: stats.mtbf_months,
        confidence,
    }
}

// ==========================================
// StockAlert - 单个备件的监控结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockAlert {
    pub part_ref: String,
    pub part_name: String,
    pub status: StockStatus,
    pub reason: String,
    pub strategy: DemandStrategy,
    pub strategy_reason: String,
    pub stats: DemandStats,
    pub mtbf: Option<MtbfStats>,       // 有消耗的月份不足 2 个时为空
    pub forecast: Option<MtbfForecast>, // 随 mtbf 一同存在
}

// ==========================================
// StockMonitor
// ==========================================
pub struct StockMonitor<S>
where
    S: MaintenanceStore,
{
    store: Arc<S>,
}

impl<S> StockMonitor<S>
where
    S: MaintenanceStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// 评估全部备件; `only_alerts` 为 true 时过滤掉 Ok 状态
    ///
    /// 结果按严重度（缺货优先）再按参考号排序
    #[instrument(skip(self))]
    pub async fn evaluate_all(&self, only_alerts: bool) -> RepositoryResult<Vec<StockAlert>> {
        let parts = self.store.list_parts().await?;
        let demand = self.store.list_part_demand(None).await?;

        let mut demand_by_ref: HashMap<String, Vec<PartDemand>> = HashMap::new();
        for record in demand {
            demand_by_ref
                .entry(record.part_ref.trim().to_lowercase())
                .or_default()
                .push(record);
        }

        let mut alerts: Vec<StockAlert> = parts
            .iter()
            .map(|part| {
                let history = demand_by_ref
                    .get(&part.reference.trim().to_lowercase())
                    .map(Vec::as_slice)
                    .unwrap_or(&[]);
                let (status, reason) = evaluate_stock(part);
                let stats = demand_stats(&monthly_series(history));
                let (strategy, strategy_reason) = select_strategy(&stats);
                let mtbf = mtbf_stats(history);
                let forecast = mtbf
                    .as_ref()
                    .map(|m| mtbf_forecast(m, FORECAST_HORIZON_MONTHS));
                StockAlert {
                    part_ref: part.reference.clone(),
                    part_name: part.name.clone(),
                    status,
                    reason,
                    strategy,
                    strategy_reason,
                    stats,
                    mtbf,
                    forecast,
                }
            })
            .filter(|alert| !only_alerts || alert.status != StockStatus::Ok)
            .collect();

        alerts.sort_by(|a, b| a.status.cmp(&b.status).then_with(|| a.part_ref.cmp(&b.part_ref)));

        info!(
            parts = parts.len(),
            alerts = alerts.iter().filter(|a| a.status != StockStatus::Ok).count(),
            "库存监控完成"
        );
        Ok(alerts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part(stock: f64, safety: f64, reorder: f64) -> Part {
        Part {
            id: "p".to_string(),
            reference: "ROUL-6205".to_string(),
            name: "Roulement 6205".to_string(),
            stock_on_hand: stock,
            safety_stock: safety,
            reorder_point: reorder,
            unit_cost: None,
            lead_time_days: None,
        }
    }

    fn demand(period: &str, quantity: f64) -> PartDemand {
        PartDemand {
            id: period.to_string(),
            part_ref: "ROUL-6205".to_string(),
            period: period.to_string(),
            quantity,
        }
    }

    #[test]
    fn test_stock_thresholds() {
        assert_eq!(evaluate_stock(&part(0.0, 2.0, 5.0)).0, StockStatus::OutOfStock);
        assert_eq!(evaluate_stock(&part(1.0, 2.0, 5.0)).0, StockStatus::BelowSafetyStock);
        assert_eq!(evaluate_stock(&part(5.0, 2.0, 5.0)).0, StockStatus::BelowReorderPoint);
        assert_eq!(evaluate_stock(&part(6.0, 2.0, 5.0)).0, StockStatus::Ok);
        // 未设置再订货点
        assert_eq!(evaluate_stock(&part(3.0, 2.0, 0.0)).0, StockStatus::Ok);
    }

    #[test]
    fn test_monthly_series_fills_gaps() {
        let history = vec![
            demand("2024-01", 2.0),
            demand("2024-04", 1.0),
            demand("2024-01", 1.0),
            demand("n/a", 9.0),
        ];
        assert_eq!(monthly_series(&history), vec![3.0, 0.0, 0.0, 1.0]);
        assert!(monthly_series(&[]).is_empty());
    }

    #[test]
    fn test_strategy_selection() {
        let regular = demand_stats(&[4.0, 5.0, 4.0, 6.0, 5.0, 4.0]);
        assert_eq!(select_strategy(&regular).0, DemandStrategy::TimeSeries);

        let intermittent = demand_stats(&[0.0, 3.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        assert!((intermittent.non_zero_percentage - 20.0).abs() < 1e-9);
        assert_eq!(select_strategy(&intermittent).0, DemandStrategy::Statistical);

        let sporadic = demand_stats(&[0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 7.0]);
        assert_eq!(select_strategy(&sporadic).0, DemandStrategy::SafetyStock);

        let empty = demand_stats(&[]);
        assert_eq!(empty.cv, None);
        assert_eq!(select_strategy(&empty).0, DemandStrategy::SafetyStock);
    }

    #[test]
    fn test_trend_strength_needs_a_year_of_history() {
        let short = demand_stats(&[1.0, 2.0, 3.0]);
        assert_eq!(short.trend_strength, 0.0);

        // 最早 12 个月均值 1, 最近 12 个月均值 2
        let mut series = vec![1.0; 12];
        series.extend(vec![2.0; 12]);
        let growing = demand_stats(&series);
        assert!((growing.trend_strength - 1.0).abs() < 1e-5);

        let flat = demand_stats(&[3.0; 12]);
        assert!(flat.trend_strength.abs() < 1e-9);
    }

    #[test]
    fn test_mtbf_requires_two_failure_months() {
        assert_eq!(mtbf_stats(&[]), None);
        assert_eq!(mtbf_stats(&[demand("2024-01", 2.0)]), None);
        // 零消耗月份不算故障; 同月多条记录合并
        assert_eq!(
            mtbf_stats(&[
                demand("2024-01", 2.0),
                demand("2024-01", 1.0),
                demand("2024-02", 0.0),
            ]),
            None
        );
    }

    #[test]
    fn test_mtbf_stats_from_failure_months() {
        let history = vec![
            demand("2024-01", 1.0),
            demand("2024-02", 0.0),
            demand("2024-03", 2.0),
            demand("2024-05", 1.0),
        ];
        let stats = mtbf_stats(&history).unwrap();

        // 间隔: 1/1 → 3/1 = 60 天（闰年）, 3/1 → 5/1 = 61 天
        assert_eq!(stats.failure_months, 3);
        assert_eq!(stats.min_interval_days, 60);
        assert_eq!(stats.max_interval_days, 61);
        assert!((stats.mtbf_days - 60.5).abs() < 1e-9);
        assert!((stats.std_days - 0.5).abs() < 1e-9);
        assert!((stats.mtbf_months - 60.5 / DAYS_PER_MONTH).abs() < 1e-9);
        assert!((stats.failure_rate - DAYS_PER_MONTH / 60.5).abs() < 1e-9);
        assert_eq!(stats.reliability, ConfidenceLevel::High);
    }

    #[test]
    fn test_irregular_intervals_lower_reliability() {
        // 间隔 31 天与 334 天, 离散度远超 0.6
        let history = vec![
            demand("2023-01", 1.0),
            demand("2023-02", 1.0),
            demand("2024-01", 1.0),
        ];
        let stats = mtbf_stats(&history).unwrap();
        assert_eq!(stats.reliability, ConfidenceLevel::Low);
    }

    #[test]
    fn test_mtbf_forecast_poisson_band() {
        let stats = mtbf_stats(&[demand("2024-01", 1.0), demand("2024-03", 1.0)]).unwrap();
        let forecast = mtbf_forecast(&stats, FORECAST_HORIZON_MONTHS);

        assert_eq!(forecast.points.len(), 12);
        assert_eq!(forecast.confidence, ConfidenceLevel::Low);
        assert!((forecast.mtbf_months - stats.mtbf_months).abs() < 1e-12);

        let lambda = stats.failure_rate;
        let first = &forecast.points[0];
        assert_eq!(first.month_offset, 1);
        assert!((first.expected_failures - lambda).abs() < 1e-9);
        // λ < 1.04² 时下界被截到 0
        assert_eq!(first.lower, 0.0);
        assert!((first.upper - (lambda + 1.04 * lambda.sqrt())).abs() < 1e-9);

        let last = &forecast.points[11];
        let expected = lambda * 12.0;
        assert!((last.expected_failures - expected).abs() < 1e-9);
        assert!((last.lower - (expected - 1.04 * expected.sqrt())).abs() < 1e-9);
        assert!(forecast
            .points
            .windows(2)
            .all(|p| p[1].expected_failures > p[0].expected_failures));
    }

    #[test]
    fn test_forecast_confidence_follows_failure_count() {
        let months = ["2024-01", "2024-02", "2024-03", "2024-04", "2024-05"];
        let history: Vec<PartDemand> = months.iter().map(|m| demand(m, 1.0)).collect();

        let five = mtbf_stats(&history).unwrap();
        assert_eq!(mtbf_forecast(&five, 3).confidence, ConfidenceLevel::High);

        let three = mtbf_stats(&history[..3]).unwrap();
        assert_eq!(mtbf_forecast(&three, 3).confidence, ConfidenceLevel::Medium);

        assert!(mtbf_forecast(&three, 0).points.is_empty());
    }

    #[test]
    fn test_frequent_but_volatile_falls_back_to_safety_stock() {
        let volatile = demand_stats(&[1.0, 30.0, 1.0, 0.0]);
        assert!(volatile.cv.unwrap() >= 1.0);
        assert_eq!(select_strategy(&volatile).0, DemandStrategy::SafetyStock);
    }
}
