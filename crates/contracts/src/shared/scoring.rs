//! Расчёт выполнения (achievement) и балла (score) KPI
//!
//! Все функции чистые: без побочных эффектов и без обращения к хранилищу.

use crate::enums::{KpiCategory, PerformanceStatus, YtdCalculation};
use serde::{Deserialize, Serialize};

/// Верхняя граница выполнения, учитываемая при расчёте балла (%)
pub const ACHIEVEMENT_CAP: f64 = 120.0;

/// Порог статуса On Track (%)
pub const ON_TRACK_THRESHOLD: f64 = 100.0;

/// Порог статуса At Risk (%)
pub const AT_RISK_THRESHOLD: f64 = 80.0;

/// Политика расчёта выполнения с учётом категории KPI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementPolicy {
    /// `actual / target * 100` для любой категории
    #[default]
    Ratio,
    /// Max: actual / target, Min: target / actual, OnTarget: штраф за отклонение
    CategoryAware,
}

impl AchievementPolicy {
    pub fn code(&self) -> &'static str {
        match self {
            AchievementPolicy::Ratio => "ratio",
            AchievementPolicy::CategoryAware => "category_aware",
        }
    }
}

/// Выполнение в процентах: `actual / target * 100`
///
/// Возвращает `None`, если цель равна нулю или одно из значений не конечно.
pub fn compute_achievement(target: f64, actual: f64) -> Option<f64> {
    if target == 0.0 || !target.is_finite() || !actual.is_finite() {
        return None;
    }
    Some(actual / target * 100.0)
}

/// Вклад KPI в итоговый балл: `weight * min(achievement, 120) / 100`
pub fn compute_score(weight: f64, achievement: f64) -> f64 {
    weight * achievement.min(ACHIEVEMENT_CAP) / 100.0
}

/// Вклад с неопределённым выполнением равен нулю
pub fn score_contribution(weight: f64, achievement: Option<f64>) -> f64 {
    achievement
        .map(|a| compute_score(weight, a))
        .unwrap_or(0.0)
}

/// Выполнение с учётом выбранной политики и категории KPI
pub fn compute_achievement_for(
    policy: AchievementPolicy,
    category: KpiCategory,
    target: f64,
    actual: f64,
) -> Option<f64> {
    match (policy, category) {
        (AchievementPolicy::Ratio, _) | (AchievementPolicy::CategoryAware, KpiCategory::Max) => {
            compute_achievement(target, actual)
        }
        (AchievementPolicy::CategoryAware, KpiCategory::Min) => {
            compute_achievement(actual, target)
        }
        (AchievementPolicy::CategoryAware, KpiCategory::OnTarget) => {
            if target == 0.0 || !target.is_finite() || !actual.is_finite() {
                return None;
            }
            let deviation = (actual - target).abs() / target.abs() * 100.0;
            Some((100.0 - deviation).max(0.0))
        }
    }
}

/// Выполнение по паре необязательных значений (нет цели или факта → `None`)
pub fn achievement_of(
    policy: AchievementPolicy,
    category: KpiCategory,
    target: Option<f64>,
    actual: Option<f64>,
) -> Option<f64> {
    match (target, actual) {
        (Some(t), Some(a)) => compute_achievement_for(policy, category, t, a),
        _ => None,
    }
}

/// Свёртка ряда значений в YTD-значение
pub fn ytd_value(mode: YtdCalculation, values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    match mode {
        YtdCalculation::Accumulative => Some(values.iter().sum()),
        YtdCalculation::Average => Some(values.iter().sum::<f64>() / values.len() as f64),
        YtdCalculation::LastValue => values.last().copied(),
    }
}

/// Статус, выводимый из выполнения
pub fn implied_status(achievement: Option<f64>) -> PerformanceStatus {
    match achievement {
        Some(a) if a >= ON_TRACK_THRESHOLD => PerformanceStatus::OnTrack,
        Some(a) if a >= AT_RISK_THRESHOLD => PerformanceStatus::AtRisk,
        _ => PerformanceStatus::OffTrack,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_achievement_is_ratio_for_positive_targets() {
        let cases = [(5.0, 4.5), (10.0, 10.0), (3.0, 7.0), (250.0, 0.0), (0.5, -1.0)];
        for (target, actual) in cases {
            let a = compute_achievement(target, actual).unwrap();
            assert!(approx(a, actual / target * 100.0), "{target} {actual}");
        }
    }

    #[test]
    fn test_zero_target_gives_undefined_achievement() {
        assert_eq!(compute_achievement(0.0, 10.0), None);
        assert_eq!(compute_achievement(f64::NAN, 10.0), None);
        assert_eq!(compute_achievement(10.0, f64::INFINITY), None);
        assert_eq!(score_contribution(40.0, compute_achievement(0.0, 1.0)), 0.0);
    }

    #[test]
    fn test_score_is_capped_at_120() {
        for achievement in [120.0, 121.0, 150.0, 1000.0] {
            assert!(approx(compute_score(15.0, achievement), 15.0 * 1.2));
        }
    }

    #[test]
    fn test_score_below_cap_is_proportional() {
        for achievement in [0.0, 45.5, 90.0, 100.0, 119.9] {
            assert!(approx(
                compute_score(40.0, achievement),
                40.0 * achievement / 100.0
            ));
        }
    }

    #[test]
    fn test_example_scenario() {
        let a1 = compute_achievement(5.0, 4.5).unwrap();
        let a2 = compute_achievement(10.0, 10.0).unwrap();
        assert!(approx(a1, 90.0));
        assert!(approx(a2, 100.0));
        assert!(approx(compute_score(15.0, a1), 13.5));
        assert!(approx(compute_score(40.0, a2), 40.0));
    }

    fn approx_opt(a: Option<f64>, b: Option<f64>) -> bool {
        match (a, b) {
            (Some(x), Some(y)) => approx(x, y),
            (None, None) => true,
            _ => false,
        }
    }

    #[test]
    fn test_ratio_policy_ignores_category() {
        for category in KpiCategory::all() {
            let a = compute_achievement_for(AchievementPolicy::Ratio, category, 10.0, 8.0);
            assert!(approx_opt(a, Some(80.0)), "{category:?}");
        }
    }

    #[test]
    fn test_category_aware_policy() {
        let policy = AchievementPolicy::CategoryAware;
        let max = compute_achievement_for(policy, KpiCategory::Max, 10.0, 8.0);
        assert!(approx_opt(max, Some(80.0)));

        // Для Min меньший факт лучше: цель 8, факт 10 → 80%
        let min = compute_achievement_for(policy, KpiCategory::Min, 8.0, 10.0);
        assert!(approx_opt(min, Some(80.0)));
        assert_eq!(compute_achievement_for(policy, KpiCategory::Min, 8.0, 0.0), None);

        let exact = compute_achievement_for(policy, KpiCategory::OnTarget, 10.0, 10.0);
        assert!(approx_opt(exact, Some(100.0)));
        let off = compute_achievement_for(policy, KpiCategory::OnTarget, 10.0, 12.0);
        assert!(approx_opt(off, Some(80.0)));
        let far = compute_achievement_for(policy, KpiCategory::OnTarget, 10.0, 35.0);
        assert!(approx_opt(far, Some(0.0)));
    }

    #[test]
    fn test_achievement_of_requires_both_values() {
        let p = AchievementPolicy::Ratio;
        assert_eq!(achievement_of(p, KpiCategory::Max, Some(10.0), None), None);
        assert_eq!(achievement_of(p, KpiCategory::Max, None, Some(1.0)), None);
        assert_eq!(
            achievement_of(p, KpiCategory::Max, Some(10.0), Some(5.0)),
            Some(50.0)
        );
    }

    #[test]
    fn test_ytd_modes() {
        let values = [10.0, 20.0, 60.0];
        assert_eq!(ytd_value(YtdCalculation::Accumulative, &values), Some(90.0));
        assert_eq!(ytd_value(YtdCalculation::Average, &values), Some(30.0));
        assert_eq!(ytd_value(YtdCalculation::LastValue, &values), Some(60.0));
        assert_eq!(ytd_value(YtdCalculation::Average, &[]), None);
    }

    #[test]
    fn test_implied_status_thresholds() {
        assert_eq!(implied_status(Some(100.0)), PerformanceStatus::OnTrack);
        assert_eq!(implied_status(Some(99.9)), PerformanceStatus::AtRisk);
        assert_eq!(implied_status(Some(80.0)), PerformanceStatus::AtRisk);
        assert_eq!(implied_status(Some(79.9)), PerformanceStatus::OffTrack);
        assert_eq!(implied_status(None), PerformanceStatus::OffTrack);
    }
}
