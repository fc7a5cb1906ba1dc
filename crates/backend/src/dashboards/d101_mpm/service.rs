use crate::domain::a001_kpi;
use crate::shared::config::achievement_policy;
use crate::shared::error::ServiceResult;
use contracts::dashboards::d101_mpm::{MpmRequest, MpmResponse};
use contracts::domain::a001_kpi::{Kpi, KpiScoreRow};
use contracts::shared::list_query::ListState;
use contracts::shared::scoring::AchievementPolicy;
use sea_orm::DatabaseConnection;
use std::collections::BTreeSet;

/// Помесячный список KPI с фильтром и пагинацией
pub async fn get_mpm(db: &DatabaseConnection, request: &MpmRequest) -> ServiceResult<MpmResponse> {
    let kpis = a001_kpi::repository::list_all(db).await?;
    let state = ListState::from_request(request.filter(), request.page, request.page_size);
    let response = build_mpm(&kpis, achievement_policy(), &state);
    tracing::debug!(
        "MPM: {} row(s) after filter, page {}/{}",
        response.page.total,
        response.page.page,
        response.page.total_pages
    );
    Ok(response)
}

/// Все месяцы, для которых есть цель или факт, по возрастанию
pub fn collect_periods(kpis: &[Kpi]) -> Vec<String> {
    let periods: BTreeSet<&String> = kpis
        .iter()
        .flat_map(|k| k.targets.keys().chain(k.actuals.keys()))
        .collect();
    periods.into_iter().cloned().collect()
}

/// Строки KPI × месяц: KPI по порядку, внутри KPI месяцы по возрастанию
pub fn flatten_rows(kpis: &[Kpi], policy: AchievementPolicy) -> Vec<KpiScoreRow> {
    kpis.iter()
        .flat_map(|kpi| {
            let months: BTreeSet<&String> = kpi.targets.keys().chain(kpi.actuals.keys()).collect();
            months
                .into_iter()
                .map(|month| kpi.score_row(month, policy))
                .collect::<Vec<_>>()
        })
        .collect()
}

pub fn build_mpm(kpis: &[Kpi], policy: AchievementPolicy, state: &ListState) -> MpmResponse {
    let rows = flatten_rows(kpis, policy);
    MpmResponse {
        periods: collect_periods(kpis),
        page: state.apply(&rows),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use contracts::enums::{KpiCategory, PerformanceStatus, Perspective, UnitOfMeasure, YtdCalculation};
    use contracts::shared::list_query::ListFilter;

    fn kpi(code: &str, perspective: Perspective, months: &[(&str, f64, Option<f64>)]) -> Kpi {
        let mut kpi = Kpi::new_for_insert(
            code.into(),
            format!("Indicator {}", code),
            perspective,
            25.0,
            UnitOfMeasure::Number,
            KpiCategory::Max,
            YtdCalculation::Accumulative,
        );
        for (month, target, actual) in months {
            kpi.targets.insert(month.to_string(), *target);
            if let Some(a) = actual {
                kpi.actuals.insert(month.to_string(), *a);
            }
        }
        kpi
    }

    fn sample() -> Vec<Kpi> {
        vec![
            kpi(
                "F1.1",
                Perspective::Financial,
                &[("2025-01", 10.0, Some(10.0)), ("2025-02", 10.0, Some(5.0)), ("2025-03", 10.0, None)],
            ),
            kpi("C1.1", Perspective::Customer, &[("2025-02", 4.0, Some(4.0))]),
        ]
    }

    #[test]
    fn test_rows_flatten_kpi_by_month_with_ytd() {
        let rows = flatten_rows(&sample(), AchievementPolicy::Ratio);
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[1].period, "2025-02");
        assert_eq!(rows[1].ytd_target, Some(20.0));
        assert_eq!(rows[1].ytd_actual, Some(15.0));
        assert_eq!(rows[2].achievement, None);
        assert_eq!(collect_periods(&sample()), vec!["2025-01", "2025-02", "2025-03"]);
    }

    #[test]
    fn test_date_range_and_status_filter_then_paginate() {
        let mut state = ListState::new(1);
        state.set_filter(ListFilter {
            date_from: NaiveDate::from_ymd_opt(2025, 2, 1),
            date_to: NaiveDate::from_ymd_opt(2025, 2, 28),
            ..Default::default()
        });
        let response = build_mpm(&sample(), AchievementPolicy::Ratio, &state);
        assert_eq!(response.page.total, 2);
        assert_eq!(response.page.total_pages, 2);
        assert_eq!(response.page.items.len(), 1);

        state.set_filter(ListFilter {
            status: Some(PerformanceStatus::OnTrack),
            ..Default::default()
        });
        state.set_page_size(10);
        let response = build_mpm(&sample(), AchievementPolicy::Ratio, &state);
        let codes: Vec<_> = response.page.items.iter().map(|r| (r.code.as_str(), r.period.as_str())).collect();
        assert_eq!(codes, vec![("F1.1", "2025-01"), ("C1.1", "2025-02")]);
    }

    #[test]
    fn test_page_past_end_is_empty() {
        let mut state = ListState::new(3);
        state.set_page(5);
        let response = build_mpm(&sample(), AchievementPolicy::Ratio, &state);
        assert_eq!(response.page.total, 4);
        assert!(response.page.items.is_empty());
    }
}
