pub mod kpi_category;
pub mod performance_status;
pub mod perspective;
pub mod unit_of_measure;
pub mod ytd_calculation;

pub use kpi_category::KpiCategory;
pub use performance_status::PerformanceStatus;
pub use perspective::Perspective;
pub use unit_of_measure::UnitOfMeasure;
pub use ytd_calculation::YtdCalculation;
