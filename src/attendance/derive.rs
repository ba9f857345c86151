use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::clock::{ABSENCE_MARKER, ClockValue};
use super::expand::LeaveDay;
use super::policy::AttendancePolicy;
use super::undertime::{Undertime, compute_undertime};
use crate::model::time_record::TimeRecord;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
    ToSchema,
)]
pub enum AttendanceStatus {
    Present,
    Absent,
    Leave,
    Late,
}

/// Computed per-employee, per-day attendance row. Never persisted; rebuilt
/// from punches and expanded leave on every read.
#[derive(Debug, Clone)]
pub struct DerivedRecord {
    pub employee_id: u64,
    /// Originating punch row, kept even when leave wins so edit actions can
    /// still reach it.
    pub dtr_id: Option<u64>,
    pub leave_id: Option<u64>,
    pub employee: String,
    pub date: NaiveDate,
    pub am_arrival: ClockValue,
    pub am_departure: ClockValue,
    pub pm_arrival: ClockValue,
    pub pm_departure: ClockValue,
    pub status: AttendanceStatus,
    pub leave_type: Option<String>,
    pub undertime: Undertime,
}

impl DerivedRecord {
    /// The four display slots as they appear on the monthly form. On leave
    /// days the leave-type label occupies the AM-arrival slot and the
    /// remaining slots hold the absence marker.
    pub fn display_times(&self) -> [String; 4] {
        match (&self.status, &self.leave_type) {
            (AttendanceStatus::Leave, Some(label)) => [
                label.clone(),
                ABSENCE_MARKER.to_string(),
                ABSENCE_MARKER.to_string(),
                ABSENCE_MARKER.to_string(),
            ],
            _ => [
                self.am_arrival.display(),
                self.am_departure.display(),
                self.pm_arrival.display(),
                self.pm_departure.display(),
            ],
        }
    }
}

/// The single status decision used by every view. Approved leave supersedes
/// any stray punch for the same day.
pub fn derive_status(
    punch: Option<&TimeRecord>,
    leave: Option<&LeaveDay>,
    policy: &AttendancePolicy,
) -> AttendanceStatus {
    if leave.is_some() {
        return AttendanceStatus::Leave;
    }

    let Some(punch) = punch else {
        return AttendanceStatus::Absent;
    };

    match punch.am_time_in {
        Some(arrival) if arrival > policy.late_after => AttendanceStatus::Late,
        _ => AttendanceStatus::Present,
    }
}

/// Merges punches and expanded leave into one map keyed by
/// (employee_id, date), covering every employee and every date seen in
/// either source. Built in a single pass over the indexes instead of
/// re-filtering the source lists per day per employee.
pub fn derive_records(
    punches: &[TimeRecord],
    leave_days: &[LeaveDay],
    names: &HashMap<u64, String>,
    policy: &AttendancePolicy,
) -> BTreeMap<(u64, NaiveDate), DerivedRecord> {
    let mut punch_index: HashMap<(u64, NaiveDate), &TimeRecord> = HashMap::new();
    for punch in punches {
        punch_index.insert((punch.employee_id, punch.date), punch);
    }

    let mut leave_index: HashMap<(u64, NaiveDate), &LeaveDay> = HashMap::new();
    for day in leave_days {
        leave_index.entry((day.employee_id, day.date)).or_insert(day);
    }

    let employees: BTreeSet<u64> = punches
        .iter()
        .map(|p| p.employee_id)
        .chain(leave_days.iter().map(|d| d.employee_id))
        .collect();
    let dates: BTreeSet<NaiveDate> = punches
        .iter()
        .map(|p| p.date)
        .chain(leave_days.iter().map(|d| d.date))
        .collect();

    let mut records = BTreeMap::new();

    for &employee_id in &employees {
        for &date in &dates {
            let punch = punch_index.get(&(employee_id, date)).copied();
            let leave = leave_index.get(&(employee_id, date)).copied();

            let status = derive_status(punch, leave, policy);

            let am_arrival = ClockValue::from_stored(punch.and_then(|p| p.am_time_in));
            let am_departure = ClockValue::from_stored(punch.and_then(|p| p.am_time_out));
            let pm_arrival = ClockValue::from_stored(punch.and_then(|p| p.pm_time_in));
            let pm_departure = ClockValue::from_stored(punch.and_then(|p| p.pm_time_out));

            // Only worked days accrue undertime.
            let undertime = match status {
                AttendanceStatus::Present | AttendanceStatus::Late => compute_undertime(
                    am_arrival,
                    am_departure,
                    pm_arrival,
                    pm_departure,
                    policy.required_hours,
                ),
                _ => Undertime::ZERO,
            };

            let employee = names
                .get(&employee_id)
                .cloned()
                .unwrap_or_else(|| format!("Employee #{}", employee_id));

            records.insert((employee_id, date), DerivedRecord {
                employee_id,
                dtr_id: punch.map(|p| p.id),
                leave_id: leave.map(|d| d.leave_id),
                employee,
                date,
                am_arrival,
                am_departure,
                pm_arrival,
                pm_departure,
                status,
                leave_type: leave.map(|d| d.leave_type.clone()),
                undertime,
            });
        }
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attendance::expand::expand_leave_grants;
    use crate::model::leave_grant::LeaveGrant;
    use chrono::NaiveTime;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn hm(h: u32, m: u32) -> Option<NaiveTime> {
        Some(NaiveTime::from_hms_opt(h, m, 0).unwrap())
    }

    fn punch(id: u64, employee_id: u64, d: u32, am_in: Option<NaiveTime>) -> TimeRecord {
        TimeRecord {
            id,
            employee_id,
            date: date(d),
            am_time_in: am_in,
            am_time_out: hm(12, 0),
            pm_time_in: hm(13, 0),
            pm_time_out: hm(17, 0),
        }
    }

    fn grant(id: u64, employee_id: u64, from: u32, to: u32) -> LeaveGrant {
        LeaveGrant {
            id,
            employee_id,
            date_from: date(from),
            date_to: date(to),
            leave_type: "Sick Leave".into(),
            status: "approved".into(),
        }
    }

    fn names() -> HashMap<u64, String> {
        HashMap::from([(7, "Juan Dela Cruz".to_string()), (8, "Maria Santos".to_string())])
    }

    #[test]
    fn every_day_of_a_grant_derives_leave_including_boundaries() {
        let leave_days = expand_leave_grants(&[grant(1, 7, 4, 6)]);
        let records = derive_records(&[], &leave_days, &names(), &AttendancePolicy::default());

        for d in 4..=6 {
            let rec = &records[&(7, date(d))];
            assert_eq!(rec.status, AttendanceStatus::Leave);
            assert_eq!(rec.leave_id, Some(1));
            assert_eq!(rec.leave_type.as_deref(), Some("Sick Leave"));
        }
    }

    #[test]
    fn leave_wins_over_a_coexisting_punch() {
        let punches = vec![punch(10, 7, 4, hm(8, 0))];
        let leave_days = expand_leave_grants(&[grant(1, 7, 4, 4)]);
        let records = derive_records(&punches, &leave_days, &names(), &AttendancePolicy::default());

        let rec = &records[&(7, date(4))];
        assert_eq!(rec.status, AttendanceStatus::Leave);
        // Both back-references survive for edit actions.
        assert_eq!(rec.dtr_id, Some(10));
        assert_eq!(rec.leave_id, Some(1));
        assert!(rec.undertime.is_zero());
    }

    #[test]
    fn leave_label_occupies_the_am_arrival_slot() {
        let leave_days = expand_leave_grants(&[grant(1, 7, 4, 4)]);
        let records = derive_records(&[], &leave_days, &names(), &AttendancePolicy::default());

        let [am_in, am_out, pm_in, pm_out] = records[&(7, date(4))].display_times();
        assert_eq!(am_in, "Sick Leave");
        assert_eq!(am_out, "-");
        assert_eq!(pm_in, "-");
        assert_eq!(pm_out, "-");
    }

    #[test]
    fn uncovered_pairs_are_absent_with_markers() {
        // Employee 7 punches on the 4th, employee 8 is on leave on the 5th:
        // the cross pairs (7, 5th) and (8, 4th) have no record at all.
        let punches = vec![punch(10, 7, 4, hm(8, 0))];
        let leave_days = expand_leave_grants(&[grant(1, 8, 5, 5)]);
        let records = derive_records(&punches, &leave_days, &names(), &AttendancePolicy::default());

        for key in [(7, date(5)), (8, date(4))] {
            let rec = &records[&key];
            assert_eq!(rec.status, AttendanceStatus::Absent);
            assert_eq!(rec.display_times(), ["-", "-", "-", "-"]);
            assert_eq!(rec.dtr_id, None);
            assert_eq!(rec.leave_id, None);
            assert!(rec.undertime.is_zero());
        }
    }

    #[test]
    fn arrival_at_the_threshold_is_present_one_minute_after_is_late() {
        let policy = AttendancePolicy::default();
        let punches = vec![punch(10, 7, 4, hm(8, 0)), punch(11, 7, 5, hm(8, 1))];
        let records = derive_records(&punches, &[], &names(), &policy);

        assert_eq!(records[&(7, date(4))].status, AttendanceStatus::Present);
        assert_eq!(records[&(7, date(5))].status, AttendanceStatus::Late);
    }

    #[test]
    fn missing_am_arrival_never_counts_as_late() {
        let punches = vec![punch(10, 7, 4, None)];
        let records = derive_records(&punches, &[], &names(), &AttendancePolicy::default());

        let rec = &records[&(7, date(4))];
        assert_eq!(rec.status, AttendanceStatus::Present);
        assert_eq!(rec.display_times()[0], "-");
        // Missing slot also means no undertime is accrued.
        assert!(rec.undertime.is_zero());
    }

    #[test]
    fn late_day_still_accrues_undertime() {
        let mut row = punch(10, 7, 4, hm(9, 5));
        row.pm_time_out = hm(16, 30);
        let records = derive_records(&[row], &[], &names(), &AttendancePolicy::default());

        let rec = &records[&(7, date(4))];
        assert_eq!(rec.status, AttendanceStatus::Late);
        assert_eq!(rec.undertime.total_minutes(), 95);
    }

    #[test]
    fn unknown_employee_gets_a_placeholder_name() {
        let punches = vec![punch(10, 99, 4, hm(8, 0))];
        let records = derive_records(&punches, &[], &names(), &AttendancePolicy::default());
        assert_eq!(records[&(99, date(4))].employee, "Employee #99");
    }

    #[test]
    fn status_round_trips_through_strings() {
        use std::str::FromStr;
        assert_eq!(AttendanceStatus::Leave.to_string(), "Leave");
        assert_eq!(
            AttendanceStatus::from_str("Late").unwrap(),
            AttendanceStatus::Late
        );
    }
}
