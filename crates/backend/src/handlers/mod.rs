// Aggregate handlers (a001-a005)
pub mod a001_kpi;
pub mod a002_team_action_plan;
pub mod a003_individual_performance;
pub mod a004_period;
pub mod a005_employee;

// Dashboard handlers (d100-d102)
pub mod d100_bsc_scorecard;
pub mod d101_mpm;
pub mod d102_ipm_cascade;

pub mod testdata;
