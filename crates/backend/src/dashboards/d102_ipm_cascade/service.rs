use crate::dashboards::d100_bsc_scorecard::service::{latest_target_month, resolve_period};
use crate::domain::{a001_kpi, a002_team_action_plan, a003_individual_performance};
use crate::shared::config::achievement_policy;
use crate::shared::error::{ServiceError, ServiceResult};
use contracts::dashboards::d102_ipm_cascade::{
    AllocationEntry, CompanyCascadeResponse, IpmCascadeRequest, IpmCascadeResponse,
};
use contracts::domain::a001_kpi::Kpi;
use contracts::domain::a002_team_action_plan::{reconcile_team_plans, TeamActionPlan};
use contracts::domain::a003_individual_performance::IndividualPerformance;
use contracts::enums::Perspective;
use contracts::shared::aggregation::reconcile_allocation;
use contracts::shared::cascade::{CascadeLevel, CascadeNode};
use contracts::shared::period_label::{parse_period_label, period_label};
use contracts::shared::scoring::{achievement_of, AchievementPolicy};
use sea_orm::DatabaseConnection;
use std::collections::BTreeMap;

const COMPANY_NODE_ID: &str = "company";
const COMPANY_NODE_NAME: &str = "Company";

/// Каскад KPI → команды → исполнители за месяц
pub async fn get_cascade(
    db: &DatabaseConnection,
    kpi_id: &str,
    request: &IpmCascadeRequest,
) -> ServiceResult<IpmCascadeResponse> {
    let kpi = a001_kpi::service::get_by_id(db, kpi_id).await?;
    let period = match request.period.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(label) => period_label(parse_period_label(label).map_err(ServiceError::Validation)?),
        None => latest_target_month(std::slice::from_ref(&kpi))
            .unwrap_or_else(|| period_label(chrono::Utc::now().date_naive())),
    };

    let plans = a002_team_action_plan::repository::list_by_kpi(db, kpi_id).await?;
    let plan_ids = plans.iter().map(TeamActionPlan::to_string_id).collect();
    let individuals = a003_individual_performance::repository::list_by_team_plans(db, plan_ids).await?;

    let response = build_cascade(&kpi, &plans, &individuals, &period, achievement_policy());
    for warning in &response.warnings {
        tracing::warn!("IPM cascade {}: {}", kpi.base.code, warning);
    }
    Ok(response)
}

/// Узел команды
///
/// Собственная цель команды за месяц даёт лист с фактом, равным сумме фактов
/// исполнителей. Без цели узел сворачивается из исполнителей.
fn team_node(
    plan: &TeamActionPlan,
    members: &[&IndividualPerformance],
    kpi: &Kpi,
    period: &str,
    policy: AchievementPolicy,
) -> CascadeNode {
    let children: Vec<CascadeNode> = members
        .iter()
        .map(|member| {
            let row = member.period_row(period, policy, kpi.category);
            CascadeNode::leaf(
                CascadeLevel::Individual,
                row.id,
                row.name,
                row.weight,
                row.target,
                row.actual,
                row.achievement,
            )
            .with_status(row.status)
        })
        .collect();

    let target = plan.target_at(period);
    let actuals: Vec<f64> = members.iter().filter_map(|m| m.actual_at(period)).collect();
    let actual = (!actuals.is_empty()).then(|| actuals.iter().sum());

    if target.is_none() && !children.is_empty() {
        return CascadeNode::rollup(CascadeLevel::Team, plan.to_string_id(), plan.team_name(), children);
    }
    CascadeNode::leaf(
        CascadeLevel::Team,
        plan.to_string_id(),
        plan.team_name(),
        plan.team_weight,
        target,
        actual,
        achievement_of(policy, kpi.category, target, actual),
    )
    .with_children(children)
}

pub fn build_cascade(
    kpi: &Kpi,
    plans: &[TeamActionPlan],
    individuals: &[IndividualPerformance],
    period: &str,
    policy: AchievementPolicy,
) -> IpmCascadeResponse {
    let mut allocations = Vec::new();
    let mut warnings = Vec::new();

    let report = reconcile_team_plans(kpi, plans);
    if report.weight.over_allocated {
        warnings.push(format!(
            "Team weights {:.2} exceed KPI weight {:.2}",
            report.weight.allocated, report.weight.parent
        ));
    }
    for mismatch in &report.target_mismatches {
        warnings.push(format!(
            "Team targets for {} sum to {:.2}, KPI target is {:.2}",
            mismatch.period, mismatch.allocated, mismatch.expected
        ));
    }
    allocations.push(AllocationEntry {
        parent_id: kpi.to_string_id(),
        parent_name: kpi.base.description.clone(),
        check: report.weight,
    });

    let mut teams = Vec::with_capacity(plans.len());
    for plan in plans {
        let plan_id = plan.to_string_id();
        let members: Vec<&IndividualPerformance> =
            individuals.iter().filter(|i| i.team_plan_ref == plan_id).collect();
        let check = reconcile_allocation(plan.team_weight, members.iter().map(|m| m.individual_weight));
        if check.over_allocated {
            warnings.push(format!(
                "Team {}: individual weights {:.2} exceed team weight {:.2}",
                plan.team_name(),
                check.allocated,
                check.parent
            ));
        }
        allocations.push(AllocationEntry {
            parent_id: plan_id,
            parent_name: plan.team_name().to_string(),
            check,
        });
        teams.push(team_node(plan, &members, kpi, period, policy));
    }

    let root = CascadeNode::leaf(
        CascadeLevel::Kpi,
        kpi.to_string_id(),
        kpi.base.description.clone(),
        kpi.weight,
        kpi.target_at(period),
        kpi.actual_at(period),
        kpi.achievement_at(period, policy),
    )
    .with_children(teams);

    IpmCascadeResponse {
        kpi_id: kpi.to_string_id(),
        period: period.to_string(),
        root,
        allocations,
        warnings,
    }
}

/// Каскад всей компании за месяц
///
/// Месяц выбирается так же, как для BSC scorecard, поэтому балл корня
/// совпадает с итогом scorecard.
pub async fn get_company_cascade(
    db: &DatabaseConnection,
    request: &IpmCascadeRequest,
) -> ServiceResult<CompanyCascadeResponse> {
    let kpis = a001_kpi::service::list_all(db).await?;
    let period = resolve_period(db, request.period.as_deref(), &kpis).await?;
    let plans = a002_team_action_plan::repository::list_all(db).await?;
    let individuals = a003_individual_performance::repository::list_all(db).await?;

    let response = build_company_cascade(&kpis, &plans, &individuals, &period, achievement_policy());
    tracing::info!(
        "Company cascade for {}: {} KPI(s), score {:.2}",
        period,
        kpis.len(),
        response.root.score
    );
    Ok(response)
}

/// Company → перспективы → KPI → команды → исполнители
///
/// Перспективы без KPI пропускаются; порядок перспектив канонический.
pub fn build_company_cascade(
    kpis: &[Kpi],
    plans: &[TeamActionPlan],
    individuals: &[IndividualPerformance],
    period: &str,
    policy: AchievementPolicy,
) -> CompanyCascadeResponse {
    let mut by_perspective: BTreeMap<Perspective, Vec<CascadeNode>> = BTreeMap::new();
    let mut warnings = Vec::new();

    for kpi in kpis {
        let kpi_id = kpi.to_string_id();
        let kpi_plans: Vec<TeamActionPlan> =
            plans.iter().filter(|p| p.kpi_ref == kpi_id).cloned().collect();
        let cascade = build_cascade(kpi, &kpi_plans, individuals, period, policy);
        warnings.extend(
            cascade
                .warnings
                .into_iter()
                .map(|w| format!("{}: {}", kpi.base.code, w)),
        );
        by_perspective.entry(kpi.perspective).or_default().push(cascade.root);
    }

    let perspectives = by_perspective
        .into_iter()
        .map(|(perspective, nodes)| {
            CascadeNode::rollup(
                CascadeLevel::Perspective,
                perspective.code(),
                perspective.display_name(),
                nodes,
            )
        })
        .collect();

    CompanyCascadeResponse {
        period: period.to_string(),
        root: CascadeNode::rollup(CascadeLevel::Company, COMPANY_NODE_ID, COMPANY_NODE_NAME, perspectives),
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::enums::{KpiCategory, PerformanceStatus, Perspective, UnitOfMeasure, YtdCalculation};

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn kpi() -> Kpi {
        let mut kpi = Kpi::new_for_insert(
            "F1.1".into(),
            "Revenue".into(),
            Perspective::Financial,
            20.0,
            UnitOfMeasure::Currency,
            KpiCategory::Max,
            YtdCalculation::Accumulative,
        );
        kpi.targets.insert("2025-01".into(), 100.0);
        kpi.actuals.insert("2025-01".into(), 90.0);
        kpi
    }

    fn plan(kpi: &Kpi, name: &str, weight: f64, target: Option<f64>) -> TeamActionPlan {
        let mut plan = TeamActionPlan::new_for_insert(String::new(), name.into(), kpi.to_string_id(), weight);
        if let Some(t) = target {
            plan.monthly_targets.insert("2025-01".into(), t);
        }
        plan
    }

    fn member(plan: &TeamActionPlan, name: &str, weight: f64, target: f64, actual: f64) -> IndividualPerformance {
        let mut entry = IndividualPerformance::new_for_insert(
            String::new(),
            name.into(),
            plan.to_string_id(),
            "Sales rep".into(),
            weight,
        );
        entry.monthly_targets.insert("2025-01".into(), target);
        entry.monthly_actuals.insert("2025-01".into(), actual);
        entry
    }

    #[test]
    fn test_team_with_target_sums_member_actuals() {
        let kpi = kpi();
        let north = plan(&kpi, "North", 12.0, Some(60.0));
        let south = plan(&kpi, "South", 8.0, Some(40.0));
        let individuals = vec![
            member(&north, "Ann", 6.0, 30.0, 30.0),
            member(&north, "Bob", 6.0, 30.0, 24.0),
            member(&south, "Eve", 8.0, 40.0, 36.0),
        ];
        let cascade = build_cascade(&kpi, &[north, south], &individuals, "2025-01", AchievementPolicy::Ratio);

        assert!(approx(cascade.root.achievement.unwrap(), 90.0));
        assert_eq!(cascade.root.children.len(), 2);
        let north_node = &cascade.root.children[0];
        assert_eq!(north_node.actual, Some(54.0));
        assert!(approx(north_node.achievement.unwrap(), 90.0));
        assert_eq!(north_node.children[1].status, PerformanceStatus::AtRisk);
        assert_eq!(cascade.root.leaf_count(), 3);
        assert_eq!(cascade.allocations.len(), 3);
        assert!(cascade.warnings.is_empty());
    }

    #[test]
    fn test_team_without_target_rolls_up_and_warns() {
        let kpi = kpi();
        let team = plan(&kpi, "East", 25.0, None);
        let mut manual = member(&team, "Ann", 15.0, 10.0, 12.0);
        manual.status = Some(PerformanceStatus::AtRisk);
        let individuals = vec![manual, member(&team, "Bob", 15.0, 10.0, 5.0)];

        let cascade = build_cascade(&kpi, &[team], &individuals, "2025-01", AchievementPolicy::Ratio);
        let node = &cascade.root.children[0];
        // 15 * 1.2 + 15 * 0.5
        assert!(approx(node.score, 25.5));
        assert!(approx(node.weight, 30.0));
        assert_eq!(node.children[0].status, PerformanceStatus::AtRisk);
        assert_eq!(cascade.warnings.len(), 2);
        assert!(cascade.allocations[1].check.over_allocated);
    }

    #[test]
    fn test_company_cascade_rolls_up_perspectives() {
        let revenue = kpi();
        let mut cost = Kpi::new_for_insert(
            "F1.2".into(),
            "Cost ratio".into(),
            Perspective::Financial,
            30.0,
            UnitOfMeasure::Percent,
            KpiCategory::Min,
            YtdCalculation::Average,
        );
        cost.targets.insert("2025-01".into(), 30.0);
        let mut nps = Kpi::new_for_insert(
            "C1.1".into(),
            "Net promoter score".into(),
            Perspective::Customer,
            10.0,
            UnitOfMeasure::Score,
            KpiCategory::Max,
            YtdCalculation::Average,
        );
        nps.targets.insert("2025-01".into(), 10.0);
        nps.actuals.insert("2025-01".into(), 10.0);

        let team = plan(&revenue, "North", 25.0, None);
        let individuals = vec![member(&team, "Ann", 6.0, 30.0, 30.0)];
        let kpis = vec![nps, revenue, cost];
        let company = build_company_cascade(&kpis, &[team], &individuals, "2025-01", AchievementPolicy::Ratio);

        let root = &company.root;
        assert_eq!(root.level, CascadeLevel::Company);
        let names: Vec<_> = root.children.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(
            names,
            vec![Perspective::Financial.display_name(), Perspective::Customer.display_name()]
        );
        assert!(root.children.iter().all(|n| n.level == CascadeLevel::Perspective));

        // 20 * 0.9 + 30 * 0 + 10 * 1.0
        assert!(approx(root.score, 28.0));
        assert!(approx(root.weight, 60.0));
        assert!(approx(root.children[0].score, 18.0));
        assert!(approx(root.children_subtotal().score, root.score));
        assert_eq!(root.children[0].children[0].level, CascadeLevel::Kpi);
        assert_eq!(root.leaf_count(), 3);

        assert_eq!(company.warnings.len(), 1);
        assert!(company.warnings[0].starts_with("F1.1: "));
    }
}
