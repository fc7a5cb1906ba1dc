use serde::{Deserialize, Serialize};

/// Единица измерения KPI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitOfMeasure {
    Percent,
    Currency,
    Number,
    Ratio,
    Days,
    Score,
}

impl UnitOfMeasure {
    pub fn code(&self) -> &'static str {
        match self {
            UnitOfMeasure::Percent => "percent",
            UnitOfMeasure::Currency => "currency",
            UnitOfMeasure::Number => "number",
            UnitOfMeasure::Ratio => "ratio",
            UnitOfMeasure::Days => "days",
            UnitOfMeasure::Score => "score",
        }
    }

    /// Короткое обозначение для таблиц
    pub fn symbol(&self) -> &'static str {
        match self {
            UnitOfMeasure::Percent => "%",
            UnitOfMeasure::Currency => "Rp",
            UnitOfMeasure::Number => "#",
            UnitOfMeasure::Ratio => "x",
            UnitOfMeasure::Days => "days",
            UnitOfMeasure::Score => "pts",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "percent" => Some(UnitOfMeasure::Percent),
            "currency" => Some(UnitOfMeasure::Currency),
            "number" => Some(UnitOfMeasure::Number),
            "ratio" => Some(UnitOfMeasure::Ratio),
            "days" => Some(UnitOfMeasure::Days),
            "score" => Some(UnitOfMeasure::Score),
            _ => None,
        }
    }
}
