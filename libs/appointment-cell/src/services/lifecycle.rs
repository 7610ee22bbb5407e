// libs/appointment-cell/src/services/lifecycle.rs
use tracing::{debug, warn};

use crate::models::{AppointmentError, AppointmentStatus};

pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// Validate that a status transition is allowed
    pub fn validate_status_transition(
        &self,
        current_status: AppointmentStatus,
        new_status: AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        debug!("Validating status transition from {} to {}", current_status, new_status);

        if !self.get_valid_transitions(current_status).contains(&new_status) {
            warn!("Invalid status transition attempted: {} -> {}", current_status, new_status);
            return Err(AppointmentError::InvalidStatusTransition {
                from: current_status,
                to: new_status,
            });
        }

        Ok(())
    }

    /// Get all valid next statuses for a given current status
    pub fn get_valid_transitions(&self, current_status: AppointmentStatus) -> Vec<AppointmentStatus> {
        match current_status {
            AppointmentStatus::Pending => vec![
                AppointmentStatus::Scheduled,
                AppointmentStatus::Cancelled,
            ],
            AppointmentStatus::Scheduled => vec![
                AppointmentStatus::Completed,
                AppointmentStatus::Cancelled,
            ],
            // A cancelled visit can be put back on the calendar
            AppointmentStatus::Cancelled => vec![AppointmentStatus::Scheduled],
            AppointmentStatus::Completed => vec![],
        }
    }
}

impl Default for AppointmentLifecycleService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use AppointmentStatus::*;

    #[test]
    fn test_allowed_transitions() {
        let lifecycle = AppointmentLifecycleService::new();

        assert!(lifecycle.validate_status_transition(Pending, Scheduled).is_ok());
        assert!(lifecycle.validate_status_transition(Pending, Cancelled).is_ok());
        assert!(lifecycle.validate_status_transition(Scheduled, Completed).is_ok());
        assert!(lifecycle.validate_status_transition(Scheduled, Cancelled).is_ok());
        assert!(lifecycle.validate_status_transition(Cancelled, Scheduled).is_ok());
    }

    #[test]
    fn test_only_scheduled_visits_complete() {
        let lifecycle = AppointmentLifecycleService::new();

        assert!(lifecycle.validate_status_transition(Pending, Completed).is_err());
        assert!(lifecycle.validate_status_transition(Cancelled, Completed).is_err());
    }

    #[test]
    fn test_completed_is_terminal() {
        let lifecycle = AppointmentLifecycleService::new();

        assert!(lifecycle.get_valid_transitions(Completed).is_empty());
        assert!(lifecycle.validate_status_transition(Completed, Cancelled).is_err());
        assert!(lifecycle.validate_status_transition(Scheduled, Scheduled).is_err());
    }
}
