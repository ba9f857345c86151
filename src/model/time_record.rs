use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// One punch row per employee per date. All four times are optional, but a
/// row with all four null is never written (rejected at the write path).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TimeRecord {
    pub id: u64,
    pub employee_id: u64,
    pub date: NaiveDate,
    pub am_time_in: Option<NaiveTime>,
    pub am_time_out: Option<NaiveTime>,
    pub pm_time_in: Option<NaiveTime>,
    pub pm_time_out: Option<NaiveTime>,
}
