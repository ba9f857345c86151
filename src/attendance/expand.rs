use std::collections::HashSet;

use chrono::NaiveDate;
use tracing::warn;

use crate::model::leave_grant::LeaveGrant;

/// One synthetic entry per calendar day covered by an approved grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaveDay {
    pub leave_id: u64,
    pub employee_id: u64,
    pub date: NaiveDate,
    pub leave_type: String,
}

/// Expands each grant into daily entries, both endpoints inclusive.
///
/// Upstream approval should prevent two grants from covering the same
/// (employee, date), but nothing enforces it structurally: when it happens
/// the first grant encountered wins and the collision is logged.
pub fn expand_leave_grants(grants: &[LeaveGrant]) -> Vec<LeaveDay> {
    let mut seen: HashSet<(u64, NaiveDate)> = HashSet::new();
    let mut days = Vec::new();

    for grant in grants {
        if grant.date_from > grant.date_to {
            warn!(
                leave_id = grant.id,
                employee_id = grant.employee_id,
                "leave grant has an inverted date range, skipping"
            );
            continue;
        }

        for date in grant
            .date_from
            .iter_days()
            .take_while(|d| *d <= grant.date_to)
        {
            if !seen.insert((grant.employee_id, date)) {
                warn!(
                    leave_id = grant.id,
                    employee_id = grant.employee_id,
                    %date,
                    "overlapping leave grants for the same day, keeping the first"
                );
                continue;
            }

            days.push(LeaveDay {
                leave_id: grant.id,
                employee_id: grant.employee_id,
                date,
                leave_type: grant.leave_type.clone(),
            });
        }
    }

    days
}
