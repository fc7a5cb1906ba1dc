use crate::domain::common::{AggregateId, BaseAggregate};
use crate::enums::{KpiCategory, PerformanceStatus, Perspective, UnitOfMeasure, YtdCalculation};
use crate::shared::aggregation::{InPerspective, Weighted};
use crate::shared::list_query::Filterable;
use crate::shared::period_label::{parse_period_label, period_label, year_start_label};
use crate::shared::scoring::{
    achievement_of, implied_status, score_contribution, ytd_value, AchievementPolicy,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

crate::uuid_aggregate_id!(
    /// ID типа для агрегата KPI
    KpiId
);

/// Помесячные значения: метка `YYYY-MM` → значение
pub type PeriodValues = BTreeMap<String, f64>;

// ============================================================================
// Aggregate
// ============================================================================

/// Агрегат KPI
///
/// `code` хранит номер KPI ("F1.1"), `description` его наименование.
/// Выполнение и балл не хранятся, а вычисляются по целям и фактам периода.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Kpi {
    #[serde(flatten)]
    pub base: BaseAggregate<KpiId>,

    pub perspective: Perspective,
    /// Определение (формула, источник данных)
    pub definition: String,
    /// Вес в процентах
    pub weight: f64,
    pub unit: UnitOfMeasure,
    pub category: KpiCategory,
    pub ytd_calculation: YtdCalculation,
    /// Цели по месяцам
    pub targets: PeriodValues,
    /// Факты по месяцам
    pub actuals: PeriodValues,
    /// Описание проблемы при невыполнении
    pub problem: Option<String>,
    /// Корректирующее действие
    pub corrective_action: Option<String>,
}

impl Kpi {
    pub fn new_for_insert(
        code: String,
        description: String,
        perspective: Perspective,
        weight: f64,
        unit: UnitOfMeasure,
        category: KpiCategory,
        ytd_calculation: YtdCalculation,
    ) -> Self {
        Self {
            base: BaseAggregate::new(KpiId::new_v4(), code, description),
            perspective,
            definition: String::new(),
            weight,
            unit,
            category,
            ytd_calculation,
            targets: PeriodValues::new(),
            actuals: PeriodValues::new(),
            problem: None,
            corrective_action: None,
        }
    }

    pub fn to_string_id(&self) -> String {
        self.base.id.as_string()
    }

    pub fn target_at(&self, period: &str) -> Option<f64> {
        self.targets.get(period).copied()
    }

    pub fn actual_at(&self, period: &str) -> Option<f64> {
        self.actuals.get(period).copied()
    }

    pub fn achievement_at(&self, period: &str, policy: AchievementPolicy) -> Option<f64> {
        achievement_of(
            policy,
            self.category,
            self.target_at(period),
            self.actual_at(period),
        )
    }

    pub fn score_at(&self, period: &str, policy: AchievementPolicy) -> f64 {
        score_contribution(self.weight, self.achievement_at(period, policy))
    }

    /// YTD-цель: свёртка целей с января по `up_to` включительно
    pub fn ytd_target(&self, up_to: &str) -> Option<f64> {
        ytd_of(&self.targets, self.ytd_calculation, up_to)
    }

    /// YTD-факт: свёртка фактов с января по `up_to` включительно
    pub fn ytd_actual(&self, up_to: &str) -> Option<f64> {
        ytd_of(&self.actuals, self.ytd_calculation, up_to)
    }

    pub fn ytd_achievement(&self, up_to: &str, policy: AchievementPolicy) -> Option<f64> {
        achievement_of(
            policy,
            self.category,
            self.ytd_target(up_to),
            self.ytd_actual(up_to),
        )
    }

    /// Ввод факта за месяц; `None` удаляет значение
    pub fn set_actual(&mut self, period: &str, actual: Option<f64>) -> Result<(), String> {
        let date = parse_period_label(period)?;
        let label = period_label(date);
        match actual {
            Some(value) if !value.is_finite() => {
                Err(format!("Actual for {} must be a finite number", label))
            }
            Some(value) => {
                self.actuals.insert(label, value);
                Ok(())
            }
            None => {
                self.actuals.remove(&label);
                Ok(())
            }
        }
    }

    pub fn set_notes(&mut self, dto: &KpiNotesDto) {
        self.problem = normalize_text(dto.problem.as_deref());
        self.corrective_action = normalize_text(dto.corrective_action.as_deref());
    }

    /// Первый месяц, на который задана цель
    pub fn first_period(&self) -> Option<&str> {
        self.targets.keys().next().map(String::as_str)
    }

    /// Обновить данные из DTO (факты сохраняются, если DTO их не содержит)
    pub fn update(&mut self, dto: &KpiDto) {
        self.base.code = dto.code.trim().to_string();
        self.base.description = dto.description.trim().to_string();
        self.base.comment = dto.comment.clone();
        self.perspective = dto.perspective;
        self.definition = dto.definition.clone().unwrap_or_default();
        self.weight = dto.weight;
        self.unit = dto.unit;
        self.category = dto.category;
        self.ytd_calculation = dto.ytd_calculation;
        self.targets = dto.targets.clone();
        if let Some(actuals) = &dto.actuals {
            self.actuals = actuals.clone();
        }
        self.problem = normalize_text(dto.problem.as_deref());
        self.corrective_action = normalize_text(dto.corrective_action.as_deref());
    }

    pub fn validate(&self) -> Result<(), String> {
        self.base.validate_identity()?;
        if !self.weight.is_finite() || !(0.0..=100.0).contains(&self.weight) {
            return Err(format!(
                "Weight of {} must be between 0 and 100, got {}",
                self.base.code, self.weight
            ));
        }
        validate_period_values("Target", &self.targets)?;
        validate_period_values("Actual", &self.actuals)?;
        Ok(())
    }

    pub fn before_write(&mut self) {
        self.base.touch();
    }

    /// Строка скоркарты за период
    pub fn score_row(&self, period: &str, policy: AchievementPolicy) -> KpiScoreRow {
        let achievement = self.achievement_at(period, policy);
        KpiScoreRow {
            id: self.to_string_id(),
            code: self.base.code.clone(),
            name: self.base.description.clone(),
            definition: self.definition.clone(),
            perspective: self.perspective,
            category: self.category,
            unit: self.unit,
            weight: self.weight,
            period: period.to_string(),
            target: self.target_at(period),
            actual: self.actual_at(period),
            achievement,
            score: score_contribution(self.weight, achievement),
            status: implied_status(achievement),
            ytd_target: self.ytd_target(period),
            ytd_actual: self.ytd_actual(period),
            ytd_achievement: self.ytd_achievement(period, policy),
            problem: self.problem.clone(),
            corrective_action: self.corrective_action.clone(),
        }
    }
}

crate::impl_aggregate_root!(Kpi, KpiId, "a001", "kpi", "KPI", "KPIs");

fn ytd_of(values: &PeriodValues, mode: YtdCalculation, up_to: &str) -> Option<f64> {
    let end = period_label(parse_period_label(up_to).ok()?);
    let start = year_start_label(&end).ok()?;
    let series: Vec<f64> = values
        .range(start..=end)
        .map(|(_, v)| *v)
        .collect();
    ytd_value(mode, &series)
}

fn validate_period_values(kind: &str, values: &PeriodValues) -> Result<(), String> {
    for (label, value) in values {
        if period_label(parse_period_label(label)?) != *label {
            return Err(format!("Invalid period label '{}', expected YYYY-MM", label));
        }
        if !value.is_finite() {
            return Err(format!("{} for {} must be a finite number", kind, label));
        }
    }
    Ok(())
}

fn normalize_text(text: Option<&str>) -> Option<String> {
    text.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl Filterable for Kpi {
    fn search_fields(&self) -> Vec<&str> {
        vec![&self.base.code, &self.base.description, &self.definition]
    }

    fn perspective(&self) -> Option<Perspective> {
        Some(self.perspective)
    }

    fn category(&self) -> Option<KpiCategory> {
        Some(self.category)
    }

    fn reference_date(&self) -> Option<NaiveDate> {
        self.first_period().and_then(|p| parse_period_label(p).ok())
    }
}

// ============================================================================
// Score row
// ============================================================================

/// KPI с рассчитанными показателями за один месяц
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiScoreRow {
    pub id: String,
    pub code: String,
    pub name: String,
    pub definition: String,
    pub perspective: Perspective,
    pub category: KpiCategory,
    pub unit: UnitOfMeasure,
    pub weight: f64,
    pub period: String,
    pub target: Option<f64>,
    pub actual: Option<f64>,
    pub achievement: Option<f64>,
    pub score: f64,
    pub status: PerformanceStatus,
    pub ytd_target: Option<f64>,
    pub ytd_actual: Option<f64>,
    pub ytd_achievement: Option<f64>,
    pub problem: Option<String>,
    pub corrective_action: Option<String>,
}

impl Weighted for KpiScoreRow {
    fn weight(&self) -> f64 {
        self.weight
    }

    fn achievement(&self) -> Option<f64> {
        self.achievement
    }
}

impl InPerspective for KpiScoreRow {
    fn perspective(&self) -> Perspective {
        self.perspective
    }
}

impl Filterable for KpiScoreRow {
    fn search_fields(&self) -> Vec<&str> {
        vec![&self.code, &self.name, &self.definition]
    }

    fn perspective(&self) -> Option<Perspective> {
        Some(self.perspective)
    }

    fn category(&self) -> Option<KpiCategory> {
        Some(self.category)
    }

    fn status(&self) -> Option<PerformanceStatus> {
        Some(self.status)
    }

    fn reference_date(&self) -> Option<NaiveDate> {
        parse_period_label(&self.period).ok()
    }
}

// ============================================================================
// Forms / DTOs
// ============================================================================

/// DTO для создания/обновления KPI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KpiDto {
    pub id: Option<String>,
    pub code: String,
    pub description: String,
    pub perspective: Perspective,
    pub definition: Option<String>,
    pub weight: f64,
    pub unit: UnitOfMeasure,
    pub category: KpiCategory,
    pub ytd_calculation: YtdCalculation,
    #[serde(default)]
    pub targets: PeriodValues,
    /// `None` оставляет факты без изменений
    #[serde(default)]
    pub actuals: Option<PeriodValues>,
    pub problem: Option<String>,
    pub corrective_action: Option<String>,
    pub comment: Option<String>,
}

/// Ввод факта за месяц
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActualEntryDto {
    pub period: String,
    pub actual: Option<f64>,
}

/// Проблема и корректирующее действие
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KpiNotesDto {
    pub problem: Option<String>,
    pub corrective_action: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::common::AggregateRoot;

    fn sample() -> Kpi {
        let mut kpi = Kpi::new_for_insert(
            "F1.1".into(),
            "Revenue".into(),
            Perspective::Financial,
            15.0,
            UnitOfMeasure::Currency,
            KpiCategory::Max,
            YtdCalculation::Accumulative,
        );
        kpi.targets.insert("2025-01".into(), 5.0);
        kpi.targets.insert("2025-02".into(), 5.0);
        kpi.targets.insert("2025-03".into(), 10.0);
        kpi.actuals.insert("2025-01".into(), 4.5);
        kpi.actuals.insert("2025-02".into(), 6.0);
        kpi
    }

    #[test]
    fn test_achievement_and_score_for_period() {
        let kpi = sample();
        let achievement = kpi.achievement_at("2025-01", AchievementPolicy::Ratio).unwrap();
        assert!((achievement - 90.0).abs() < 1e-9);
        assert!((kpi.score_at("2025-01", AchievementPolicy::Ratio) - 13.5).abs() < 1e-9);
        assert_eq!(kpi.achievement_at("2025-03", AchievementPolicy::Ratio), None);
        assert_eq!(kpi.score_at("2025-03", AchievementPolicy::Ratio), 0.0);
    }

    #[test]
    fn test_zero_target_gives_undefined_achievement() {
        let mut kpi = sample();
        kpi.targets.insert("2025-04".into(), 0.0);
        kpi.actuals.insert("2025-04".into(), 3.0);
        let row = kpi.score_row("2025-04", AchievementPolicy::Ratio);
        assert_eq!(row.achievement, None);
        assert_eq!(row.score, 0.0);
        assert_eq!(row.status, PerformanceStatus::OffTrack);
    }

    #[test]
    fn test_ytd_accumulates_from_january() {
        let kpi = sample();
        assert_eq!(kpi.ytd_target("2025-02"), Some(10.0));
        assert_eq!(kpi.ytd_actual("2025-02"), Some(10.5));
        let ytd = kpi.ytd_achievement("2025-02", AchievementPolicy::Ratio).unwrap();
        assert!((ytd - 105.0).abs() < 1e-9);
        assert_eq!(kpi.ytd_target("2024-12"), None);
    }

    #[test]
    fn test_set_actual() {
        let mut kpi = sample();
        kpi.set_actual("2025-03", Some(12.0)).unwrap();
        assert_eq!(kpi.actual_at("2025-03"), Some(12.0));

        kpi.set_actual("2025-03", None).unwrap();
        assert_eq!(kpi.actual_at("2025-03"), None);

        assert!(kpi.set_actual("March", Some(1.0)).is_err());
        assert!(kpi.set_actual("2025-03", Some(f64::NAN)).is_err());
    }

    #[test]
    fn test_validate() {
        let mut kpi = sample();
        assert!(kpi.validate().is_ok());

        kpi.weight = 120.0;
        assert!(kpi.validate().is_err());

        kpi.weight = 10.0;
        kpi.targets.insert("2025-13".into(), 1.0);
        assert!(kpi.validate().is_err());

        let mut unnamed = sample();
        unnamed.base.description = "  ".into();
        assert!(unnamed.validate().is_err());
    }

    #[test]
    fn test_notes_are_trimmed() {
        let mut kpi = sample();
        kpi.set_notes(&KpiNotesDto {
            problem: Some("  supplier delay ".into()),
            corrective_action: Some("   ".into()),
        });
        assert_eq!(kpi.problem.as_deref(), Some("supplier delay"));
        assert_eq!(kpi.corrective_action, None);
    }

    #[test]
    fn test_aggregate_names() {
        assert_eq!(Kpi::full_name(), "a001_kpi");
        assert_eq!(sample().code(), "F1.1");
    }
}
