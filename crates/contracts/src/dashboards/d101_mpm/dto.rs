use crate::domain::a001_kpi::KpiScoreRow;
use crate::enums::{KpiCategory, PerformanceStatus, Perspective};
use crate::shared::list_query::{ListFilter, Page};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Request for the monthly KPI list (one row per KPI and month)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MpmRequest {
    pub search: Option<String>,
    pub perspective: Option<Perspective>,
    pub category: Option<KpiCategory>,
    pub status: Option<PerformanceStatus>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

impl MpmRequest {
    pub fn filter(&self) -> ListFilter {
        ListFilter {
            search: self.search.clone(),
            perspective: self.perspective,
            category: self.category,
            status: self.status,
            date_from: self.date_from,
            date_to: self.date_to,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MpmResponse {
    /// All months present in the data, ascending
    pub periods: Vec<String>,
    pub page: Page<KpiScoreRow>,
}
