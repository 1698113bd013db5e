use chrono::{DateTime, Utc};

/// Custom actions for Order entities.
#[derive(Debug, Clone)]
pub enum OrderAction {
    /// Moves a pending order to approved. Already approved orders are left as they are.
    Approve { approver_id: String, at: DateTime<Utc> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderActionResult {
    /// `true` when this call performed the transition.
    Approve(bool),
}
