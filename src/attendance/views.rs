use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::derive::{AttendanceStatus, DerivedRecord};

/// The derived attendance map all three projections read from.
pub type DerivedMap = BTreeMap<(u64, NaiveDate), DerivedRecord>;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct StatusCounts {
    pub present: u64,
    pub absent: u64,
    pub leave: u64,
    pub late: u64,
}

impl StatusCounts {
    fn bump(&mut self, status: AttendanceStatus) {
        match status {
            AttendanceStatus::Present => self.present += 1,
            AttendanceStatus::Absent => self.absent += 1,
            AttendanceStatus::Leave => self.leave += 1,
            AttendanceStatus::Late => self.late += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.present + self.absent + self.leave + self.late
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CalendarCell {
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub counts: StatusCounts,
}

/// Per-day status counts for every date of the requested range. Dates with
/// no derived records still produce a zero cell so month grids render
/// complete.
pub fn calendar_view(records: &DerivedMap, from: NaiveDate, to: NaiveDate) -> Vec<CalendarCell> {
    let mut per_day: BTreeMap<NaiveDate, StatusCounts> = BTreeMap::new();
    for rec in records.values() {
        if rec.date >= from && rec.date <= to {
            per_day.entry(rec.date).or_default().bump(rec.status);
        }
    }

    from.iter_days()
        .take_while(|d| *d <= to)
        .map(|date| CalendarCell {
            date,
            counts: per_day.get(&date).copied().unwrap_or_default(),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Default, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Date,
    Employee,
    Status,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug)]
pub struct ListView<'a> {
    pub rows: Vec<&'a DerivedRecord>,
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
}

/// Sortable, paginated flat projection. The status tab accepts any of the
/// four statuses, so the per-date tab counts always sum to the calendar
/// cell's total for that date.
pub fn list_view<'a>(
    records: &'a DerivedMap,
    status: Option<AttendanceStatus>,
    sort_by: SortKey,
    order: SortOrder,
    page: u64,
    per_page: u64,
) -> ListView<'a> {
    let mut rows: Vec<&DerivedRecord> = records
        .values()
        .filter(|rec| status.is_none_or(|s| rec.status == s))
        .collect();

    rows.sort_by(|a, b| {
        let ordering = match sort_by {
            SortKey::Date => a
                .date
                .cmp(&b.date)
                .then_with(|| a.employee.cmp(&b.employee)),
            SortKey::Employee => a
                .employee
                .cmp(&b.employee)
                .then_with(|| a.date.cmp(&b.date)),
            SortKey::Status => a
                .status
                .cmp(&b.status)
                .then_with(|| a.date.cmp(&b.date))
                .then_with(|| a.employee.cmp(&b.employee)),
        };
        match order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });

    let total = rows.len() as u64;
    let page = page.max(1);
    let per_page = per_page.clamp(1, 100);
    let offset = ((page - 1) * per_page) as usize;

    let rows = if offset >= rows.len() {
        Vec::new()
    } else {
        rows.into_iter()
            .skip(offset)
            .take(per_page as usize)
            .collect()
    };

    ListView {
        rows,
        page,
        per_page,
        total,
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WeekdaySummary {
    #[schema(example = "Monday")]
    pub weekday: String,
    pub counts: StatusCounts,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EmployeeSummary {
    pub employee_id: u64,
    pub employee: String,
    pub counts: StatusCounts,
    /// Accumulated undertime across the range, in minutes.
    pub undertime_minutes: u64,
}

#[derive(Debug, PartialEq, Serialize, ToSchema)]
pub struct StatusRates {
    pub present: f64,
    pub absent: f64,
    pub leave: f64,
    pub late: f64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SummaryView {
    pub weekdays: Vec<WeekdaySummary>,
    pub employees: Vec<EmployeeSummary>,
    pub rates: StatusRates,
    pub total_records: u64,
}

fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

fn rate(count: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let pct = count as f64 / total as f64 * 100.0;
    (pct * 10.0).round() / 10.0
}

/// Day-of-week and per-employee aggregates plus overall rate percentages
/// at one decimal place.
pub fn summary_view(records: &DerivedMap) -> SummaryView {
    let mut weekday_counts: BTreeMap<u8, StatusCounts> = BTreeMap::new();
    let mut employee_counts: BTreeMap<u64, (String, StatusCounts, u64)> = BTreeMap::new();
    let mut overall = StatusCounts::default();

    for rec in records.values() {
        overall.bump(rec.status);

        weekday_counts
            .entry(rec.date.weekday().number_from_monday() as u8)
            .or_default()
            .bump(rec.status);

        let entry = employee_counts
            .entry(rec.employee_id)
            .or_insert_with(|| (rec.employee.clone(), StatusCounts::default(), 0));
        entry.1.bump(rec.status);
        entry.2 += rec.undertime.total_minutes() as u64;
    }

    let weekdays = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ]
    .into_iter()
    .map(|wd| WeekdaySummary {
        weekday: weekday_name(wd).to_string(),
        counts: weekday_counts
            .get(&(wd.number_from_monday() as u8))
            .copied()
            .unwrap_or_default(),
    })
    .collect();

    let employees = employee_counts
        .into_iter()
        .map(|(employee_id, (employee, counts, undertime_minutes))| EmployeeSummary {
            employee_id,
            employee,
            counts,
            undertime_minutes,
        })
        .collect();

    let total = overall.total();
    let rates = StatusRates {
        present: rate(overall.present, total),
        absent: rate(overall.absent, total),
        leave: rate(overall.leave, total),
        late: rate(overall.late, total),
    };

    SummaryView {
        weekdays,
        employees,
        rates,
        total_records: total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attendance::expand::expand_leave_grants;
    use crate::attendance::policy::AttendancePolicy;
    use crate::attendance::derive::derive_records;
    use crate::model::leave_grant::LeaveGrant;
    use crate::model::time_record::TimeRecord;
    use chrono::NaiveTime;
    use std::collections::HashMap;

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

    // Three employees over March 4-5:
    //   4th: emp 1 on time, emp 2 late, emp 3 on leave
    //   5th: emp 1 on time, emps 2 and 3 absent (cross product)
    fn fixture() -> DerivedMap {
        let punches = vec![
            punch(1, 1, 4, hm(7, 55)),
            punch(2, 2, 4, hm(9, 15)),
            punch(3, 1, 5, hm(8, 0)),
        ];
        let grants = vec![LeaveGrant {
            id: 9,
            employee_id: 3,
            date_from: date(4),
            date_to: date(4),
            leave_type: "Vacation Leave".into(),
            status: "approved".into(),
        }];
        let names = HashMap::from([
            (1, "Ana Reyes".to_string()),
            (2, "Ben Cruz".to_string()),
            (3, "Carla Lim".to_string()),
        ]);
        derive_records(
            &punches,
            &expand_leave_grants(&grants),
            &names,
            &AttendancePolicy::default(),
        )
    }

    #[test]
    fn calendar_counts_by_status_per_day() {
        let records = fixture();
        let cells = calendar_view(&records, date(4), date(5));

        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0].counts, StatusCounts {
            present: 1,
            absent: 0,
            leave: 1,
            late: 1,
        });
        assert_eq!(cells[1].counts, StatusCounts {
            present: 1,
            absent: 2,
            leave: 0,
            late: 0,
        });
    }

    #[test]
    fn calendar_fills_empty_dates_with_zero_cells() {
        let records = fixture();
        let cells = calendar_view(&records, date(1), date(3));
        assert_eq!(cells.len(), 3);
        assert!(cells.iter().all(|c| c.counts.total() == 0));
    }

    #[test]
    fn calendar_total_matches_list_total_for_each_date() {
        let records = fixture();
        let cells = calendar_view(&records, date(4), date(5));

        for cell in cells {
            let unfiltered = list_view(&records, None, SortKey::Date, SortOrder::Asc, 1, 100)
                .rows
                .iter()
                .filter(|r| r.date == cell.date)
                .count() as u64;
            assert_eq!(cell.counts.total(), unfiltered);

            // Tab counts across all four statuses sum to the same figure.
            let tab_sum: u64 = [
                AttendanceStatus::Present,
                AttendanceStatus::Absent,
                AttendanceStatus::Leave,
                AttendanceStatus::Late,
            ]
            .into_iter()
            .map(|s| {
                list_view(&records, Some(s), SortKey::Date, SortOrder::Asc, 1, 100)
                    .rows
                    .iter()
                    .filter(|r| r.date == cell.date)
                    .count() as u64
            })
            .sum();
            assert_eq!(cell.counts.total(), tab_sum);
        }
    }

    #[test]
    fn list_filters_by_status_tab() {
        let records = fixture();
        let late = list_view(
            &records,
            Some(AttendanceStatus::Late),
            SortKey::Date,
            SortOrder::Asc,
            1,
            100,
        );
        assert_eq!(late.total, 1);
        assert_eq!(late.rows[0].employee, "Ben Cruz");
    }

    #[test]
    fn list_sorts_by_employee_then_date() {
        let records = fixture();
        let view = list_view(&records, None, SortKey::Employee, SortOrder::Asc, 1, 100);
        let order: Vec<_> = view
            .rows
            .iter()
            .map(|r| (r.employee.as_str(), r.date))
            .collect();
        let mut expected = order.clone();
        expected.sort();
        assert_eq!(order, expected);
    }

    #[test]
    fn list_descending_reverses_the_ordering() {
        let records = fixture();
        let asc = list_view(&records, None, SortKey::Date, SortOrder::Asc, 1, 100);
        let desc = list_view(&records, None, SortKey::Date, SortOrder::Desc, 1, 100);
        let mut reversed: Vec<_> = desc.rows.iter().map(|r| (r.employee_id, r.date)).collect();
        reversed.reverse();
        let forward: Vec<_> = asc.rows.iter().map(|r| (r.employee_id, r.date)).collect();
        assert_eq!(forward, reversed);
    }

    #[test]
    fn list_paginates_and_reports_full_total() {
        let records = fixture();
        let page1 = list_view(&records, None, SortKey::Date, SortOrder::Asc, 1, 2);
        let page2 = list_view(&records, None, SortKey::Date, SortOrder::Asc, 2, 2);
        let page9 = list_view(&records, None, SortKey::Date, SortOrder::Asc, 9, 2);

        assert_eq!(page1.total, 6);
        assert_eq!(page1.rows.len(), 2);
        assert_eq!(page2.rows.len(), 2);
        assert!(page9.rows.is_empty());
        assert_eq!(page9.total, 6);
    }

    #[test]
    fn summary_rates_have_one_decimal_place() {
        let records = fixture();
        let summary = summary_view(&records);

        // 6 records: 2 present, 2 absent, 1 leave, 1 late.
        assert_eq!(summary.total_records, 6);
        assert_eq!(summary.rates, StatusRates {
            present: 33.3,
            absent: 33.3,
            leave: 16.7,
            late: 16.7,
        });
    }

    #[test]
    fn summary_groups_by_weekday_and_employee() {
        let records = fixture();
        let summary = summary_view(&records);

        // 2024-03-04 is a Monday, 2024-03-05 a Tuesday.
        let monday = &summary.weekdays[0];
        assert_eq!(monday.weekday, "Monday");
        assert_eq!(monday.counts.total(), 3);
        let tuesday = &summary.weekdays[1];
        assert_eq!(tuesday.counts.absent, 2);

        assert_eq!(summary.employees.len(), 3);
        let ben = summary
            .employees
            .iter()
            .find(|e| e.employee == "Ben Cruz")
            .unwrap();
        assert_eq!(ben.counts.late, 1);
        assert_eq!(ben.counts.absent, 1);
        // Ben's late day ran 9:15-12:00 and 13:00-17:00 = 405 worked.
        assert_eq!(ben.undertime_minutes, 75);
    }

    #[test]
    fn empty_map_summarizes_to_zero_rates() {
        let records = DerivedMap::new();
        let summary = summary_view(&records);
        assert_eq!(summary.total_records, 0);
        assert_eq!(summary.rates.present, 0.0);
    }
}
