use crate::domain::a001_kpi::KpiScoreRow;
use crate::enums::{KpiCategory, PerformanceStatus, Perspective};
use crate::shared::aggregation::{Subtotal, WeightCheck};
use crate::shared::list_query::ListFilter;
use crate::shared::scoring::AchievementPolicy;
use serde::{Deserialize, Serialize};

/// Request for the BSC scorecard
///
/// Without `period` the first month of the active period is used,
/// then the latest month with any target.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BscScorecardRequest {
    pub period: Option<String>,
    pub search: Option<String>,
    pub perspective: Option<Perspective>,
    pub category: Option<KpiCategory>,
    pub status: Option<PerformanceStatus>,
}

impl BscScorecardRequest {
    pub fn filter(&self) -> ListFilter {
        ListFilter {
            search: self.search.clone(),
            perspective: self.perspective,
            category: self.category,
            status: self.status,
            date_from: None,
            date_to: None,
        }
    }
}

/// One perspective with its KPI rows and subtotal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerspectiveGroup {
    pub perspective: Perspective,
    /// Display name (e.g., "Learning & Growth")
    pub name: String,
    pub rows: Vec<KpiScoreRow>,
    pub subtotal: Subtotal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BscScorecardResponse {
    /// Month in format "YYYY-MM"
    pub period: String,
    pub policy: AchievementPolicy,
    /// Groups in canonical perspective order, empty groups omitted
    pub groups: Vec<PerspectiveGroup>,
    pub grand_total: Subtotal,
    /// Weight sum of the shown KPIs against 100
    pub weight_check: WeightCheck,
    /// Advisory messages (weights not summing to 100, over-allocated plans)
    pub warnings: Vec<String>,
}
