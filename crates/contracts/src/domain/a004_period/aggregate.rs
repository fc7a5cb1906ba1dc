use crate::domain::common::{AggregateId, BaseAggregate};
use crate::shared::period_label::months_between;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

crate::uuid_aggregate_id!(
    /// ID типа для агрегата отчётного периода
    PeriodId
);

// ============================================================================
// Status / type
// ============================================================================

/// Статус отчётного периода: Draft → Active → Closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodStatus {
    Draft,
    Active,
    Closed,
}

impl PeriodStatus {
    pub fn code(&self) -> &'static str {
        match self {
            PeriodStatus::Draft => "draft",
            PeriodStatus::Active => "active",
            PeriodStatus::Closed => "closed",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "draft" => Some(PeriodStatus::Draft),
            "active" => Some(PeriodStatus::Active),
            "closed" => Some(PeriodStatus::Closed),
            _ => None,
        }
    }

    /// Разрешены только переходы вперёд на один шаг
    pub fn can_transition_to(&self, next: PeriodStatus) -> bool {
        matches!(
            (self, next),
            (PeriodStatus::Draft, PeriodStatus::Active) | (PeriodStatus::Active, PeriodStatus::Closed)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodType {
    Monthly,
    Quarterly,
    Semester,
    Annual,
}

impl PeriodType {
    pub fn code(&self) -> &'static str {
        match self {
            PeriodType::Monthly => "monthly",
            PeriodType::Quarterly => "quarterly",
            PeriodType::Semester => "semester",
            PeriodType::Annual => "annual",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "monthly" => Some(PeriodType::Monthly),
            "quarterly" => Some(PeriodType::Quarterly),
            "semester" => Some(PeriodType::Semester),
            "annual" => Some(PeriodType::Annual),
            _ => None,
        }
    }
}

// ============================================================================
// Aggregate
// ============================================================================

/// Отчётный период
///
/// `description` хранит наименование периода ("FY2025 Q1").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Period {
    #[serde(flatten)]
    pub base: BaseAggregate<PeriodId>,

    pub year: i32,
    /// Метка подпериода ("Q1", "H2", "2025-03")
    pub sub_period: String,
    pub period_type: PeriodType,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub status: PeriodStatus,
}

impl Period {
    pub fn new_for_insert(
        code: String,
        description: String,
        year: i32,
        sub_period: String,
        period_type: PeriodType,
        date_from: NaiveDate,
        date_to: NaiveDate,
    ) -> Self {
        Self {
            base: BaseAggregate::new(PeriodId::new_v4(), code, description),
            year,
            sub_period,
            period_type,
            date_from,
            date_to,
            status: PeriodStatus::Draft,
        }
    }

    pub fn to_string_id(&self) -> String {
        self.base.id.as_string()
    }

    /// Метки месяцев, входящих в период
    pub fn months(&self) -> Vec<String> {
        months_between(self.date_from, self.date_to)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.date_from <= date && date <= self.date_to
    }

    /// Статус меняется только через [`check_transition`]
    pub fn update(&mut self, dto: &PeriodDto) {
        self.base.code = dto.code.clone().unwrap_or_default();
        self.base.description = dto.description.trim().to_string();
        self.base.comment = dto.comment.clone();
        self.year = dto.year;
        self.sub_period = dto.sub_period.trim().to_string();
        self.period_type = dto.period_type;
        self.date_from = dto.date_from;
        self.date_to = dto.date_to;
    }

    pub fn validate(&self) -> Result<(), String> {
        self.base.validate_identity()?;
        if self.date_from > self.date_to {
            return Err(format!(
                "Period start {} is after its end {}",
                self.date_from, self.date_to
            ));
        }
        if !(1900..=9999).contains(&self.year) {
            return Err(format!("Year {} is out of range", self.year));
        }
        Ok(())
    }

    pub fn before_write(&mut self) {
        self.base.touch();
    }
}

crate::impl_aggregate_root!(Period, PeriodId, "a004", "period", "Period", "Periods");

// ============================================================================
// Transitions
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum PeriodTransitionError {
    NotFound(String),
    NotAllowed {
        from: PeriodStatus,
        to: PeriodStatus,
    },
    /// Другой период уже активен
    AnotherActive { active_code: String },
}

impl std::fmt::Display for PeriodTransitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PeriodTransitionError::NotFound(id) => write!(f, "Period {} not found", id),
            PeriodTransitionError::NotAllowed { from, to } => write!(
                f,
                "Transition from {} to {} is not allowed",
                from.code(),
                to.code()
            ),
            PeriodTransitionError::AnotherActive { active_code } => {
                write!(f, "Period {} is already active", active_code)
            }
        }
    }
}

impl std::error::Error for PeriodTransitionError {}

/// Проверить переход периода `id` в статус `to` относительно текущего списка
///
/// Возвращает индекс периода в `periods`.
pub fn check_transition(
    periods: &[Period],
    id: PeriodId,
    to: PeriodStatus,
) -> Result<usize, PeriodTransitionError> {
    let index = periods
        .iter()
        .position(|p| p.base.id == id && !p.base.metadata.is_deleted)
        .ok_or_else(|| PeriodTransitionError::NotFound(id.as_string()))?;
    let from = periods[index].status;
    if !from.can_transition_to(to) {
        return Err(PeriodTransitionError::NotAllowed { from, to });
    }
    if to == PeriodStatus::Active {
        if let Some(active) = periods
            .iter()
            .find(|p| p.status == PeriodStatus::Active && !p.base.metadata.is_deleted)
        {
            return Err(PeriodTransitionError::AnotherActive {
                active_code: active.base.code.clone(),
            });
        }
    }
    Ok(index)
}

// ============================================================================
// Forms / DTOs
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodDto {
    pub id: Option<String>,
    pub code: Option<String>,
    pub description: String,
    pub year: i32,
    pub sub_period: String,
    pub period_type: PeriodType,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodTransitionDto {
    pub status: PeriodStatus,
}
