pub mod d100_bsc_scorecard;
pub mod d101_mpm;
pub mod d102_ipm_cascade;
