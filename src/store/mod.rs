//! Record Store: typed accessors over punch rows, leave grants and
//! employee names. Pure reads apart from the upsert write path; scoping is
//! decided upstream by the access filter and applied here as SQL.

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveTime};
use sqlx::MySqlPool;

use crate::attendance::scope::EmployeeScope;
use crate::error::ApiError;
use crate::model::employee::Employee;
use crate::model::leave_grant::LeaveGrant;
use crate::model::time_record::TimeRecord;

const TIME_RECORD_COLUMNS: &str =
    "id, employee_id, date, am_time_in, am_time_out, pm_time_in, pm_time_out";
const LEAVE_GRANT_COLUMNS: &str = "id, employee_id, date_from, date_to, leave_type, status";
const EMPLOYEE_COLUMNS: &str = "id, first_name, last_name, extname, status";

pub async fn punches_in_range(
    pool: &MySqlPool,
    scope: EmployeeScope,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<TimeRecord>, ApiError> {
    let mut sql = format!(
        "SELECT {} FROM time_records WHERE date BETWEEN ? AND ?",
        TIME_RECORD_COLUMNS
    );
    if let EmployeeScope::One(_) = scope {
        sql.push_str(" AND employee_id = ?");
    }
    sql.push_str(" ORDER BY date, employee_id");

    let mut query = sqlx::query_as::<_, TimeRecord>(&sql).bind(from).bind(to);
    if let EmployeeScope::One(id) = scope {
        query = query.bind(id);
    }

    Ok(query.fetch_all(pool).await?)
}

/// Approved grants overlapping the range: `date_from <= to AND date_to >= from`.
pub async fn leaves_in_range(
    pool: &MySqlPool,
    scope: EmployeeScope,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<LeaveGrant>, ApiError> {
    let mut sql = format!(
        "SELECT {} FROM leave_grants \
         WHERE status = 'approved' AND date_from <= ? AND date_to >= ?",
        LEAVE_GRANT_COLUMNS
    );
    if let EmployeeScope::One(_) = scope {
        sql.push_str(" AND employee_id = ?");
    }
    sql.push_str(" ORDER BY id");

    let mut query = sqlx::query_as::<_, LeaveGrant>(&sql).bind(to).bind(from);
    if let EmployeeScope::One(id) = scope {
        query = query.bind(id);
    }

    Ok(query.fetch_all(pool).await?)
}

pub async fn employee_names(
    pool: &MySqlPool,
    scope: EmployeeScope,
) -> Result<HashMap<u64, String>, ApiError> {
    let mut sql = format!("SELECT {} FROM employees", EMPLOYEE_COLUMNS);
    if let EmployeeScope::One(_) = scope {
        sql.push_str(" WHERE id = ?");
    }

    let mut query = sqlx::query_as::<_, Employee>(&sql);
    if let EmployeeScope::One(id) = scope {
        query = query.bind(id);
    }

    let employees = query.fetch_all(pool).await?;
    Ok(employees
        .into_iter()
        .map(|e| (e.id, e.display_name()))
        .collect())
}

pub async fn find_leave_grant(pool: &MySqlPool, id: u64) -> Result<LeaveGrant, ApiError> {
    let sql = format!(
        "SELECT {} FROM leave_grants WHERE id = ?",
        LEAVE_GRANT_COLUMNS
    );
    sqlx::query_as::<_, LeaveGrant>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(ApiError::NotFound {
            what: "leave grant",
        })
}

/// Exact match against the assembled display name, case-insensitive.
pub async fn find_employee_by_name(
    pool: &MySqlPool,
    name: &str,
) -> Result<Option<Employee>, ApiError> {
    let sql = format!(
        "SELECT {} FROM employees \
         WHERE LOWER(TRIM(CONCAT(COALESCE(CONCAT(extname, ' '), ''), first_name, ' ', last_name))) = ? \
         LIMIT 1",
        EMPLOYEE_COLUMNS
    );
    Ok(sqlx::query_as::<_, Employee>(&sql)
        .bind(name.trim().to_lowercase())
        .fetch_optional(pool)
        .await?)
}

/// The four punch slots of a write. The all-null combination is rejected
/// at the API layer before it can reach the store.
#[derive(Debug, Clone, Copy)]
pub struct PunchTimes {
    pub am_time_in: Option<NaiveTime>,
    pub am_time_out: Option<NaiveTime>,
    pub pm_time_in: Option<NaiveTime>,
    pub pm_time_out: Option<NaiveTime>,
}

impl PunchTimes {
    pub fn is_empty(&self) -> bool {
        self.am_time_in.is_none()
            && self.am_time_out.is_none()
            && self.pm_time_in.is_none()
            && self.pm_time_out.is_none()
    }
}

async fn leave_covering_on<'e, E>(
    executor: E,
    employee_id: u64,
    date: NaiveDate,
) -> Result<Option<LeaveGrant>, ApiError>
where
    E: sqlx::Executor<'e, Database = sqlx::MySql>,
{
    let sql = format!(
        "SELECT {} FROM leave_grants \
         WHERE employee_id = ? AND status = 'approved' AND ? BETWEEN date_from AND date_to \
         ORDER BY id LIMIT 1",
        LEAVE_GRANT_COLUMNS
    );
    Ok(sqlx::query_as::<_, LeaveGrant>(&sql)
        .bind(employee_id)
        .bind(date)
        .fetch_optional(executor)
        .await?)
}

/// Atomic manual-entry write: one transaction that rejects the write when
/// approved leave covers the date, then upserts on the (employee_id, date)
/// unique key so concurrent writers cannot produce duplicate rows.
pub async fn upsert_time_record(
    pool: &MySqlPool,
    employee_id: u64,
    date: NaiveDate,
    times: &PunchTimes,
) -> Result<(), ApiError> {
    let mut tx = pool.begin().await?;

    if leave_covering_on(&mut *tx, employee_id, date)
        .await?
        .is_some()
    {
        // Dropping the transaction rolls it back.
        return Err(ApiError::LeaveConflict { date });
    }

    sqlx::query(
        "INSERT INTO time_records \
         (employee_id, date, am_time_in, am_time_out, pm_time_in, pm_time_out) \
         VALUES (?, ?, ?, ?, ?, ?) \
         ON DUPLICATE KEY UPDATE \
         am_time_in = VALUES(am_time_in), am_time_out = VALUES(am_time_out), \
         pm_time_in = VALUES(pm_time_in), pm_time_out = VALUES(pm_time_out)",
    )
    .bind(employee_id)
    .bind(date)
    .bind(times.am_time_in)
    .bind(times.am_time_out)
    .bind(times.pm_time_in)
    .bind(times.pm_time_out)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}

/// Correction write against an existing punch row. The row is loaded
/// inside the transaction so the leave-overlap check runs against its
/// actual (employee, date) key.
pub async fn update_time_record(
    pool: &MySqlPool,
    dtr_id: u64,
    times: &PunchTimes,
) -> Result<TimeRecord, ApiError> {
    let mut tx = pool.begin().await?;

    let sql = format!(
        "SELECT {} FROM time_records WHERE id = ?",
        TIME_RECORD_COLUMNS
    );
    let row = sqlx::query_as::<_, TimeRecord>(&sql)
        .bind(dtr_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(ApiError::NotFound {
            what: "time record",
        })?;

    if leave_covering_on(&mut *tx, row.employee_id, row.date)
        .await?
        .is_some()
    {
        return Err(ApiError::LeaveConflict { date: row.date });
    }

    sqlx::query(
        "UPDATE time_records \
         SET am_time_in = ?, am_time_out = ?, pm_time_in = ?, pm_time_out = ? \
         WHERE id = ?",
    )
    .bind(times.am_time_in)
    .bind(times.am_time_out)
    .bind(times.pm_time_in)
    .bind(times.pm_time_out)
    .bind(dtr_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(TimeRecord {
        am_time_in: times.am_time_in,
        am_time_out: times.am_time_out,
        pm_time_in: times.pm_time_in,
        pm_time_out: times.pm_time_out,
        ..row
    })
}
