use serde::{Deserialize, Serialize};

/// Статус выполнения показателя
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceStatus {
    OnTrack,
    AtRisk,
    OffTrack,
}

impl PerformanceStatus {
    pub fn code(&self) -> &'static str {
        match self {
            PerformanceStatus::OnTrack => "on_track",
            PerformanceStatus::AtRisk => "at_risk",
            PerformanceStatus::OffTrack => "off_track",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PerformanceStatus::OnTrack => "On Track",
            PerformanceStatus::AtRisk => "At Risk",
            PerformanceStatus::OffTrack => "Off Track",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "on_track" => Some(PerformanceStatus::OnTrack),
            "at_risk" => Some(PerformanceStatus::AtRisk),
            "off_track" => Some(PerformanceStatus::OffTrack),
            _ => None,
        }
    }
}
