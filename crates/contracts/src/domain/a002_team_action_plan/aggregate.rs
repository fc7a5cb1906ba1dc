use crate::domain::a001_kpi::{Kpi, PeriodValues};
use crate::domain::common::{AggregateId, BaseAggregate};
use crate::shared::aggregation::{reconcile_allocation, AllocationCheck, WEIGHT_TOLERANCE};
use crate::shared::list_query::Filterable;
use crate::shared::period_label::{parse_period_label, period_label};
use serde::{Deserialize, Serialize};

crate::uuid_aggregate_id!(
    /// ID типа для агрегата плана действий команды
    TeamActionPlanId
);

/// План действий команды по KPI
///
/// `description` хранит название команды, `comment` комментарии к плану.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamActionPlan {
    #[serde(flatten)]
    pub base: BaseAggregate<TeamActionPlanId>,

    /// ID родительского KPI
    pub kpi_ref: String,
    /// Доля веса KPI, закреплённая за командой
    pub team_weight: f64,
    /// Годовая цель команды
    pub team_target: Option<f64>,
    /// Цели команды по месяцам
    pub monthly_targets: PeriodValues,
}

impl TeamActionPlan {
    pub fn new_for_insert(code: String, team_name: String, kpi_ref: String, team_weight: f64) -> Self {
        Self {
            base: BaseAggregate::new(TeamActionPlanId::new_v4(), code, team_name),
            kpi_ref,
            team_weight,
            team_target: None,
            monthly_targets: PeriodValues::new(),
        }
    }

    pub fn to_string_id(&self) -> String {
        self.base.id.as_string()
    }

    pub fn team_name(&self) -> &str {
        &self.base.description
    }

    pub fn target_at(&self, period: &str) -> Option<f64> {
        self.monthly_targets.get(period).copied()
    }

    pub fn update(&mut self, dto: &TeamActionPlanDto) {
        self.base.code = dto.code.clone().unwrap_or_default();
        self.base.description = dto.team_name.trim().to_string();
        self.base.comment = dto.comments.clone();
        self.kpi_ref = dto.kpi_ref.clone();
        self.team_weight = dto.team_weight;
        self.team_target = dto.team_target;
        self.monthly_targets = dto.monthly_targets.clone();
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.base.description.trim().is_empty() {
            return Err("Team name must not be empty".into());
        }
        if self.kpi_ref.trim().is_empty() {
            return Err("KPI reference must not be empty".into());
        }
        if !self.team_weight.is_finite() || !(0.0..=100.0).contains(&self.team_weight) {
            return Err(format!("Team weight must be between 0 and 100, got {}", self.team_weight));
        }
        if matches!(self.team_target, Some(t) if !t.is_finite()) {
            return Err("Team target must be a finite number".into());
        }
        for (label, value) in &self.monthly_targets {
            if period_label(parse_period_label(label)?) != *label {
                return Err(format!("Invalid period label '{}', expected YYYY-MM", label));
            }
            if !value.is_finite() {
                return Err(format!("Monthly target for {} must be a finite number", label));
            }
        }
        Ok(())
    }

    pub fn before_write(&mut self) {
        self.base.touch();
        if self.base.code.trim().is_empty() {
            self.base.code = format!("TAP-{}", &self.to_string_id()[..8]);
        }
    }
}

crate::impl_aggregate_root!(
    TeamActionPlan,
    TeamActionPlanId,
    "a002",
    "team_action_plan",
    "Team Action Plan",
    "Team Action Plans"
);

impl Filterable for TeamActionPlan {
    fn search_fields(&self) -> Vec<&str> {
        vec![&self.base.code, &self.base.description]
    }
}

/// Сверка командных планов с родительским KPI
///
/// Только информирует: сохранение планов не блокируется.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamAllocationReport {
    pub weight: AllocationCheck,
    /// Месяцы, где сумма командных целей расходится с целью KPI
    pub target_mismatches: Vec<MonthlyMismatch>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyMismatch {
    pub period: String,
    pub expected: f64,
    pub allocated: f64,
}

impl TeamAllocationReport {
    pub fn is_consistent(&self) -> bool {
        !self.weight.over_allocated && self.target_mismatches.is_empty()
    }
}

/// Сверить распределение веса и помесячных целей KPI между командами
pub fn reconcile_team_plans(kpi: &Kpi, plans: &[TeamActionPlan]) -> TeamAllocationReport {
    let weight = reconcile_allocation(kpi.weight, plans.iter().map(|p| p.team_weight));
    let target_mismatches = kpi
        .targets
        .iter()
        .filter_map(|(period, expected)| {
            let allocated: f64 = plans.iter().filter_map(|p| p.target_at(period)).sum();
            let has_any = plans.iter().any(|p| p.target_at(period).is_some());
            if has_any && (allocated - expected).abs() > WEIGHT_TOLERANCE {
                Some(MonthlyMismatch {
                    period: period.clone(),
                    expected: *expected,
                    allocated,
                })
            } else {
                None
            }
        })
        .collect();
    TeamAllocationReport {
        weight,
        target_mismatches,
    }
}

// ============================================================================
// Forms / DTOs
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamActionPlanDto {
    pub id: Option<String>,
    pub code: Option<String>,
    pub kpi_ref: String,
    pub team_name: String,
    pub team_weight: f64,
    pub team_target: Option<f64>,
    #[serde(default)]
    pub monthly_targets: PeriodValues,
    pub comments: Option<String>,
}
