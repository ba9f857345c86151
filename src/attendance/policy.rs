use chrono::NaiveTime;

/// Single source of truth for the attendance thresholds. Every consumer
/// (calendar, list, summary) derives status through the same policy value,
/// so the late threshold cannot drift between views.
#[derive(Debug, Clone, Copy)]
pub struct AttendancePolicy {
    /// An AM arrival strictly after this time counts as late.
    pub late_after: NaiveTime,
    /// Required daily hours for the undertime calculation.
    pub required_hours: u32,
}

impl Default for AttendancePolicy {
    fn default() -> Self {
        Self {
            late_after: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            required_hours: 8,
        }
    }
}
