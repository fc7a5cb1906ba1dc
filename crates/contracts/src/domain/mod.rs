pub mod a001_kpi;
pub mod a002_team_action_plan;
pub mod a003_individual_performance;
pub mod a004_period;
pub mod a005_employee;
pub mod common;
