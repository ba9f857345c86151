use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// An approved leave request spanning an inclusive date range.
/// Invariant: `date_from <= date_to`. Immutable once approved.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LeaveGrant {
    pub id: u64,
    pub employee_id: u64,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub leave_type: String,
    pub status: String,
}
