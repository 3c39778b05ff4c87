// Module declarations
pub(crate) mod reports_model;
pub(crate) mod reports_repository;
pub(crate) mod reports_service;
pub(crate) mod reports_traits;

// Re-export the public interface
pub use reports_model::{BalanceMismatch, NetIncomeReport, TrialBalance, TrialBalanceRow};
pub use reports_service::ReportService;
pub use reports_traits::ReportServiceTrait;
