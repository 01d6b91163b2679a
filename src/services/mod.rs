pub mod dashboard_service;
pub mod fallback;
pub mod notify_service;

pub use dashboard_service::DashboardService;
pub use notify_service::NotifyService;
