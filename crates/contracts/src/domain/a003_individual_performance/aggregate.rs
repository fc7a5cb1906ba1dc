use crate::domain::a001_kpi::PeriodValues;
use crate::domain::a002_team_action_plan::TeamActionPlan;
use crate::domain::common::{AggregateId, BaseAggregate};
use crate::enums::{KpiCategory, PerformanceStatus};
use crate::shared::aggregation::{reconcile_allocation, AllocationCheck, Weighted};
use crate::shared::list_query::Filterable;
use crate::shared::period_label::{parse_period_label, period_label};
use crate::shared::scoring::{achievement_of, implied_status, AchievementPolicy};
use serde::{Deserialize, Serialize};

crate::uuid_aggregate_id!(
    /// ID типа для агрегата индивидуальных показателей
    IndividualPerformanceId
);

/// Индивидуальные показатели сотрудника в рамках командного плана
///
/// `description` хранит ФИО исполнителя.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndividualPerformance {
    #[serde(flatten)]
    pub base: BaseAggregate<IndividualPerformanceId>,

    /// ID плана действий команды
    pub team_plan_ref: String,
    /// ID сотрудника (a005), если исполнитель заведён в справочнике
    pub employee_ref: Option<String>,
    pub position: String,
    pub individual_weight: f64,
    pub monthly_targets: PeriodValues,
    pub monthly_actuals: PeriodValues,
    /// Статус, заданный вручную; иначе выводится из выполнения
    pub status: Option<PerformanceStatus>,
}

impl IndividualPerformance {
    pub fn new_for_insert(
        code: String,
        name: String,
        team_plan_ref: String,
        position: String,
        individual_weight: f64,
    ) -> Self {
        Self {
            base: BaseAggregate::new(IndividualPerformanceId::new_v4(), code, name),
            team_plan_ref,
            employee_ref: None,
            position,
            individual_weight,
            monthly_targets: PeriodValues::new(),
            monthly_actuals: PeriodValues::new(),
            status: None,
        }
    }

    pub fn to_string_id(&self) -> String {
        self.base.id.as_string()
    }

    pub fn name(&self) -> &str {
        &self.base.description
    }

    pub fn target_at(&self, period: &str) -> Option<f64> {
        self.monthly_targets.get(period).copied()
    }

    pub fn actual_at(&self, period: &str) -> Option<f64> {
        self.monthly_actuals.get(period).copied()
    }

    pub fn achievement_at(
        &self,
        period: &str,
        policy: AchievementPolicy,
        category: KpiCategory,
    ) -> Option<f64> {
        achievement_of(policy, category, self.target_at(period), self.actual_at(period))
    }

    /// Ручной статус имеет приоритет над выведенным
    pub fn effective_status(&self, achievement: Option<f64>) -> PerformanceStatus {
        self.status.unwrap_or_else(|| implied_status(achievement))
    }

    pub fn update(&mut self, dto: &IndividualPerformanceDto) {
        self.base.code = dto.code.clone().unwrap_or_default();
        self.base.description = dto.name.trim().to_string();
        self.base.comment = dto.comment.clone();
        self.team_plan_ref = dto.team_plan_ref.clone();
        self.employee_ref = dto.employee_ref.clone().filter(|s| !s.trim().is_empty());
        self.position = dto.position.trim().to_string();
        self.individual_weight = dto.individual_weight;
        self.monthly_targets = dto.monthly_targets.clone();
        self.monthly_actuals = dto.monthly_actuals.clone();
        self.status = dto.status;
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.base.description.trim().is_empty() {
            return Err("Name must not be empty".into());
        }
        if self.team_plan_ref.trim().is_empty() {
            return Err("Team plan reference must not be empty".into());
        }
        if !self.individual_weight.is_finite() || !(0.0..=100.0).contains(&self.individual_weight)
        {
            return Err(format!(
                "Individual weight must be between 0 and 100, got {}",
                self.individual_weight
            ));
        }
        for values in [&self.monthly_targets, &self.monthly_actuals] {
            for (label, value) in values {
                if period_label(parse_period_label(label)?) != *label {
                    return Err(format!("Invalid period label '{}', expected YYYY-MM", label));
                }
                if !value.is_finite() {
                    return Err(format!("Value for {} must be a finite number", label));
                }
            }
        }
        Ok(())
    }

    pub fn before_write(&mut self) {
        self.base.touch();
        if self.base.code.trim().is_empty() {
            self.base.code = format!("IPM-{}", &self.to_string_id()[..8]);
        }
    }

    pub fn period_row(
        &self,
        period: &str,
        policy: AchievementPolicy,
        category: KpiCategory,
    ) -> IndividualPeriodRow {
        let achievement = self.achievement_at(period, policy, category);
        IndividualPeriodRow {
            id: self.to_string_id(),
            name: self.base.description.clone(),
            position: self.position.clone(),
            weight: self.individual_weight,
            target: self.target_at(period),
            actual: self.actual_at(period),
            achievement,
            status: self.effective_status(achievement),
        }
    }
}

crate::impl_aggregate_root!(
    IndividualPerformance,
    IndividualPerformanceId,
    "a003",
    "individual_performance",
    "Individual Performance",
    "Individual Performance"
);

impl Filterable for IndividualPerformance {
    fn search_fields(&self) -> Vec<&str> {
        vec![&self.base.code, &self.base.description, &self.position]
    }

    fn status(&self) -> Option<PerformanceStatus> {
        self.status
    }
}

/// Показатели исполнителя за месяц
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndividualPeriodRow {
    pub id: String,
    pub name: String,
    pub position: String,
    pub weight: f64,
    pub target: Option<f64>,
    pub actual: Option<f64>,
    pub achievement: Option<f64>,
    pub status: PerformanceStatus,
}

impl Weighted for IndividualPeriodRow {
    fn weight(&self) -> f64 {
        self.weight
    }

    fn achievement(&self) -> Option<f64> {
        self.achievement
    }
}

/// Сверка индивидуальных весов с весом команды
pub fn reconcile_individuals(plan: &TeamActionPlan, entries: &[IndividualPerformance]) -> AllocationCheck {
    reconcile_allocation(
        plan.team_weight,
        entries.iter().map(|e| e.individual_weight),
    )
}

// ============================================================================
// Forms / DTOs
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndividualPerformanceDto {
    pub id: Option<String>,
    pub code: Option<String>,
    pub team_plan_ref: String,
    pub employee_ref: Option<String>,
    pub name: String,
    #[serde(default)]
    pub position: String,
    pub individual_weight: f64,
    #[serde(default)]
    pub monthly_targets: PeriodValues,
    #[serde(default)]
    pub monthly_actuals: PeriodValues,
    pub status: Option<PerformanceStatus>,
    pub comment: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(weight: f64) -> IndividualPerformance {
        let mut e = IndividualPerformance::new_for_insert(
            String::new(),
            "Alice".into(),
            "plan".into(),
            "Analyst".into(),
            weight,
        );
        e.monthly_targets.insert("2025-01".into(), 10.0);
        e.monthly_actuals.insert("2025-01".into(), 8.5);
        e
    }

    #[test]
    fn test_status_is_implied_unless_set() {
        let mut e = entry(5.0);
        let row = e.period_row("2025-01", AchievementPolicy::Ratio, KpiCategory::Max);
        assert_eq!(row.status, PerformanceStatus::AtRisk);

        e.status = Some(PerformanceStatus::OnTrack);
        let row = e.period_row("2025-01", AchievementPolicy::Ratio, KpiCategory::Max);
        assert_eq!(row.status, PerformanceStatus::OnTrack);

        let missing = e.period_row("2025-02", AchievementPolicy::Ratio, KpiCategory::Max);
        assert_eq!(missing.achievement, None);
    }

    #[test]
    fn test_reconcile_individuals() {
        let plan = TeamActionPlan::new_for_insert("T1".into(), "North".into(), "kpi".into(), 10.0);
        let check = reconcile_individuals(&plan, &[entry(4.0), entry(4.0)]);
        assert!(!check.over_allocated);
        assert!((check.remaining - 2.0).abs() < 1e-9);

        let check = reconcile_individuals(&plan, &[entry(6.0), entry(6.0)]);
        assert!(check.over_allocated);
    }

    #[test]
    fn test_validate() {
        let mut e = entry(5.0);
        assert!(e.validate().is_ok());
        e.monthly_actuals.insert("2025-02".into(), f64::INFINITY);
        assert!(e.validate().is_err());

        let mut e = entry(5.0);
        e.team_plan_ref = " ".into();
        assert!(e.validate().is_err());
    }
}
