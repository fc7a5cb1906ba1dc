use crate::domain::{a001_kpi, a002_team_action_plan, a004_period};
use crate::shared::config::achievement_policy;
use crate::shared::error::{ServiceError, ServiceResult};
use contracts::dashboards::d100_bsc_scorecard::{
    BscScorecardRequest, BscScorecardResponse, PerspectiveGroup,
};
use contracts::domain::a001_kpi::Kpi;
use contracts::domain::a002_team_action_plan::{reconcile_team_plans, TeamActionPlan};
use contracts::shared::aggregation::{check_weight_total, grand_total, group_by_perspective, subtotal};
use contracts::shared::list_query::ListFilter;
use contracts::shared::period_label::{parse_period_label, period_label};
use contracts::shared::scoring::AchievementPolicy;
use sea_orm::DatabaseConnection;
use std::collections::HashMap;

/// Ожидаемая сумма весов KPI компании
pub const EXPECTED_WEIGHT_TOTAL: f64 = 100.0;

/// Get BSC scorecard for a period
pub async fn get_scorecard(
    db: &DatabaseConnection,
    request: &BscScorecardRequest,
) -> ServiceResult<BscScorecardResponse> {
    let kpis = a001_kpi::repository::list_all(db).await?;
    let period = resolve_period(db, request.period.as_deref(), &kpis).await?;
    let policy = achievement_policy();

    let mut response = build_scorecard(&kpis, &period, policy, &request.filter());

    let plans = a002_team_action_plan::repository::list_all(db).await?;
    response.warnings.extend(allocation_warnings(&kpis, &plans));

    tracing::info!(
        "BSC scorecard for {}: {} group(s), total score {:.2}",
        period,
        response.groups.len(),
        response.grand_total.score
    );
    Ok(response)
}

/// Месяц отчёта
///
/// Явно заданный месяц, иначе первый месяц активного периода, иначе
/// последний месяц, для которого есть цель хотя бы одного KPI.
pub async fn resolve_period(
    db: &DatabaseConnection,
    requested: Option<&str>,
    kpis: &[Kpi],
) -> ServiceResult<String> {
    if let Some(label) = requested.map(str::trim).filter(|s| !s.is_empty()) {
        let date = parse_period_label(label).map_err(ServiceError::Validation)?;
        return Ok(period_label(date));
    }
    if let Some(active) = a004_period::repository::find_active(db).await? {
        if let Some(first) = active.months().into_iter().next() {
            return Ok(first);
        }
    }
    Ok(latest_target_month(kpis).unwrap_or_else(|| period_label(chrono::Utc::now().date_naive())))
}

pub fn latest_target_month(kpis: &[Kpi]) -> Option<String> {
    kpis.iter()
        .filter_map(|k| k.targets.keys().next_back())
        .max()
        .cloned()
}

/// Собрать scorecard из списка KPI (без обращения к БД)
pub fn build_scorecard(
    kpis: &[Kpi],
    period: &str,
    policy: AchievementPolicy,
    filter: &ListFilter,
) -> BscScorecardResponse {
    let all_rows: Vec<_> = kpis.iter().map(|k| k.score_row(period, policy)).collect();
    let rows = filter.apply(&all_rows);

    let groups = group_by_perspective(&rows)
        .into_iter()
        .map(|(perspective, entries)| PerspectiveGroup {
            perspective,
            name: perspective.display_name().to_string(),
            subtotal: subtotal(entries.iter().copied()),
            rows: entries.into_iter().cloned().collect(),
        })
        .collect();

    let weight_check = check_weight_total(&rows, EXPECTED_WEIGHT_TOTAL);
    let mut warnings = Vec::new();
    // Для отфильтрованного набора сумма весов не обязана быть 100
    if filter.is_empty() && !rows.is_empty() && !weight_check.balanced {
        warnings.push(format!(
            "KPI weights sum to {:.2}, expected {:.0}",
            weight_check.actual, weight_check.expected
        ));
    }

    BscScorecardResponse {
        period: period.to_string(),
        policy,
        groups,
        grand_total: grand_total(&rows),
        weight_check,
        warnings,
    }
}

/// Предупреждения о перераспределении веса KPI между командами
pub fn allocation_warnings(kpis: &[Kpi], plans: &[TeamActionPlan]) -> Vec<String> {
    let mut by_kpi: HashMap<&str, Vec<TeamActionPlan>> = HashMap::new();
    for plan in plans {
        by_kpi.entry(plan.kpi_ref.as_str()).or_default().push(plan.clone());
    }

    let mut warnings = Vec::new();
    for kpi in kpis {
        let Some(kpi_plans) = by_kpi.get(kpi.to_string_id().as_str()) else {
            continue;
        };
        let report = reconcile_team_plans(kpi, kpi_plans);
        if report.weight.over_allocated {
            warnings.push(format!(
                "KPI {}: team weights {:.2} exceed KPI weight {:.2}",
                kpi.base.code, report.weight.allocated, report.weight.parent
            ));
        }
        for mismatch in &report.target_mismatches {
            warnings.push(format!(
                "KPI {}: team targets for {} sum to {:.2}, KPI target is {:.2}",
                kpi.base.code, mismatch.period, mismatch.allocated, mismatch.expected
            ));
        }
    }
    warnings
}
