use serde::{Deserialize, Serialize};

/// Правило свёртки помесячных значений в значение с начала года (YTD)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YtdCalculation {
    /// Сумма значений
    Accumulative,
    /// Среднее значение
    Average,
    /// Последнее значение
    LastValue,
}

impl YtdCalculation {
    pub fn code(&self) -> &'static str {
        match self {
            YtdCalculation::Accumulative => "accumulative",
            YtdCalculation::Average => "average",
            YtdCalculation::LastValue => "last_value",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            YtdCalculation::Accumulative => "Accumulative",
            YtdCalculation::Average => "Average",
            YtdCalculation::LastValue => "Last Value",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "accumulative" => Some(YtdCalculation::Accumulative),
            "average" => Some(YtdCalculation::Average),
            "last_value" => Some(YtdCalculation::LastValue),
            _ => None,
        }
    }
}
