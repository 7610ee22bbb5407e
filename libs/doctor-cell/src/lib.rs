pub mod handlers;
pub mod router;
pub mod models;
pub mod services;

pub use models::*;
pub use router::doctor_routes;
pub use services::{DoctorService, derive_slots, is_date_selectable, selectable_dates, SLOT_GRANULARITY_MINUTES};
