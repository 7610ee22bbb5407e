pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::*;
pub use router::{analytics_routes, appointment_routes};
pub use services::{AnalyticsService, AppointmentService, ReportService};
