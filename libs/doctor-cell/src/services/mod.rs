pub mod availability_codec;
pub mod doctor;
pub mod slots;

pub use doctor::DoctorService;
pub use slots::{derive_slots, is_date_selectable, selectable_dates, SLOT_GRANULARITY_MINUTES};
