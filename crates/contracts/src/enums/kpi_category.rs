use serde::{Deserialize, Serialize};

/// Категория KPI: какое направление факта считается благоприятным
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KpiCategory {
    /// Чем больше факт, тем лучше
    Max,
    /// Чем меньше факт, тем лучше
    Min,
    /// Лучше всего точное попадание в цель
    OnTarget,
}

impl KpiCategory {
    pub fn code(&self) -> &'static str {
        match self {
            KpiCategory::Max => "max",
            KpiCategory::Min => "min",
            KpiCategory::OnTarget => "on_target",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            KpiCategory::Max => "Max",
            KpiCategory::Min => "Min",
            KpiCategory::OnTarget => "On Target",
        }
    }

    pub fn all() -> Vec<KpiCategory> {
        vec![KpiCategory::Max, KpiCategory::Min, KpiCategory::OnTarget]
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "max" => Some(KpiCategory::Max),
            "min" => Some(KpiCategory::Min),
            "on_target" => Some(KpiCategory::OnTarget),
            _ => None,
        }
    }
}
