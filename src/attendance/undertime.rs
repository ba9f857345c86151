use serde::Serialize;
use utoipa::ToSchema;

use super::clock::ClockValue;

/// Shortfall between worked and required time, split for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct Undertime {
    #[schema(example = 1)]
    pub hours: u32,
    #[schema(example = 35)]
    pub minutes: u32,
}

impl Undertime {
    pub const ZERO: Undertime = Undertime {
        hours: 0,
        minutes: 0,
    };

    pub fn from_minutes(total: u32) -> Self {
        Undertime {
            hours: total / 60,
            minutes: total % 60,
        }
    }

    pub fn total_minutes(&self) -> u32 {
        self.hours * 60 + self.minutes
    }

    pub fn is_zero(&self) -> bool {
        self.hours == 0 && self.minutes == 0
    }
}

/// Undertime accrues only on fully-punched days: any missing or malformed
/// slot yields zero. Reversed intervals clamp to zero instead of going
/// negative.
pub fn compute_undertime(
    am_in: ClockValue,
    am_out: ClockValue,
    pm_in: ClockValue,
    pm_out: ClockValue,
    required_hours: u32,
) -> Undertime {
    let (am_in, am_out, pm_in, pm_out) = match (
        am_in.minutes_since_midnight(),
        am_out.minutes_since_midnight(),
        pm_in.minutes_since_midnight(),
        pm_out.minutes_since_midnight(),
    ) {
        (Some(a), Some(b), Some(c), Some(d)) => (a, b, c, d),
        _ => return Undertime::ZERO,
    };

    let morning = am_out.saturating_sub(am_in);
    let afternoon = pm_out.saturating_sub(pm_in);
    let worked = morning + afternoon;
    let expected = required_hours * 60;

    Undertime::from_minutes(expected.saturating_sub(worked))
}
