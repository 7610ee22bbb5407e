pub mod analytics;
pub mod appointment;
pub mod lifecycle;
pub mod notification;
pub mod reports;

pub use analytics::AnalyticsService;
pub use appointment::AppointmentService;
pub use lifecycle::AppointmentLifecycleService;
pub use notification::{EdgeFunctionSmsSender, NotificationService, SmsSender};
pub use reports::{ReportService, ReportUpload};
