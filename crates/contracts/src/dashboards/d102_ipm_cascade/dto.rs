use crate::shared::aggregation::AllocationCheck;
use crate::shared::cascade::CascadeNode;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IpmCascadeRequest {
    /// Month in format "YYYY-MM"; the latest KPI target month when absent
    pub period: Option<String>,
}

/// Allocation of a parent weight between its children
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationEntry {
    pub parent_id: String,
    pub parent_name: String,
    pub check: AllocationCheck,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpmCascadeResponse {
    pub kpi_id: String,
    pub period: String,
    /// KPI → teams → individuals
    pub root: CascadeNode,
    /// KPI weight vs. team weights, then each team vs. its individuals
    pub allocations: Vec<AllocationEntry>,
    pub warnings: Vec<String>,
}

/// Whole-company tree: company → perspectives → KPIs → teams → individuals
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyCascadeResponse {
    pub period: String,
    pub root: CascadeNode,
    pub warnings: Vec<String>,
}
