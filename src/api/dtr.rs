use actix_web::{HttpResponse, Responder, web};
use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use crate::attendance::clock::ClockValue;
use crate::attendance::derive::{AttendanceStatus, DerivedRecord, derive_records};
use crate::attendance::expand::expand_leave_grants;
use crate::attendance::scope::{EmployeeScope, effective_scope};
use crate::attendance::undertime::Undertime;
use crate::attendance::views::{
    CalendarCell, SortKey, SortOrder, SummaryView, calendar_view, list_view, summary_view,
};
use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::error::ApiError;
use crate::store::{self, PunchTimes};
use crate::utils::{employee_cache, employee_filter};

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct DtrQuery {
    /// Range start, defaults to the first day of the current month
    #[schema(example = "2024-03-01", format = "date", value_type = String)]
    pub from: Option<NaiveDate>,
    /// Range end, defaults to the last day of the current month
    #[schema(example = "2024-03-31", format = "date", value_type = String)]
    pub to: Option<NaiveDate>,
    /// Requested scope; subject to the access policy
    #[schema(example = 7)]
    pub employee_id: Option<u64>,
    /// Status tab filter
    #[schema(example = "Late")]
    pub status: Option<AttendanceStatus>,
    #[schema(example = "date")]
    pub sort_by: Option<SortKey>,
    #[schema(example = "asc")]
    pub order: Option<SortOrder>,
    /// Pagination page number (start with 1)
    #[schema(example = 1)]
    pub page: Option<u64>,
    /// Pagination per page number
    #[schema(example = 20)]
    pub per_page: Option<u64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DtrRow {
    #[schema(example = 7)]
    pub employee_id: u64,
    #[schema(example = 42, nullable = true)]
    pub dtr_id: Option<u64>,
    #[schema(example = 9, nullable = true)]
    pub leave_id: Option<u64>,
    #[schema(example = "Juan Dela Cruz")]
    pub employee: String,
    #[schema(example = "Mar 04, 2024")]
    pub date: String,
    #[schema(example = "8:00 AM")]
    pub am_arrival: String,
    #[schema(example = "12:00 PM")]
    pub am_departure: String,
    #[schema(example = "1:00 PM")]
    pub pm_arrival: String,
    #[schema(example = "5:00 PM")]
    pub pm_departure: String,
    #[schema(example = "Present")]
    pub status: AttendanceStatus,
    /// Leave type name, only when status = Leave
    #[serde(rename = "type")]
    #[schema(example = "Sick Leave", nullable = true)]
    pub leave_type: Option<String>,
    pub undertime: Undertime,
}

impl From<&DerivedRecord> for DtrRow {
    fn from(rec: &DerivedRecord) -> Self {
        let [am_arrival, am_departure, pm_arrival, pm_departure] = rec.display_times();
        DtrRow {
            employee_id: rec.employee_id,
            dtr_id: rec.dtr_id,
            leave_id: rec.leave_id,
            employee: rec.employee.clone(),
            date: rec.date.format("%b %d, %Y").to_string(),
            am_arrival,
            am_departure,
            pm_arrival,
            pm_departure,
            status: rec.status,
            leave_type: rec.leave_type.clone(),
            undertime: rec.undertime,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[schema(example = json!({
    "data": [
        {
            "employee_id": 7,
            "dtr_id": 42,
            "leave_id": null,
            "employee": "Juan Dela Cruz",
            "date": "Mar 04, 2024",
            "am_arrival": "8:00 AM",
            "am_departure": "12:00 PM",
            "pm_arrival": "1:00 PM",
            "pm_departure": "4:30 PM",
            "status": "Present",
            "type": null,
            "undertime": { "hours": 0, "minutes": 30 }
        }
    ],
    "page": 1,
    "per_page": 20,
    "total": 1
}))]
pub struct DtrListResponse {
    pub data: Vec<DtrRow>,
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 20)]
    pub per_page: u64,
    #[schema(example = 1)]
    pub total: u64,
}

#[derive(Serialize, ToSchema)]
pub struct DtrCalendarResponse {
    #[schema(example = "2024-03-01", value_type = String, format = "date")]
    pub from: NaiveDate,
    #[schema(example = "2024-03-31", value_type = String, format = "date")]
    pub to: NaiveDate,
    pub data: Vec<CalendarCell>,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateDtr {
    /// Full display name as printed on the monthly form
    #[schema(example = "Juan Dela Cruz")]
    pub employee: String,
    #[schema(example = "2024-03-04", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "8:00 AM", nullable = true)]
    pub am_arrival: Option<String>,
    #[schema(example = "12:00 PM", nullable = true)]
    pub am_departure: Option<String>,
    #[schema(example = "1:00 PM", nullable = true)]
    pub pm_arrival: Option<String>,
    #[schema(example = "5:00 PM", nullable = true)]
    pub pm_departure: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateDtr {
    /// Punch row to correct; mutually exclusive with leave_id
    #[schema(example = 42, nullable = true)]
    pub dtr_id: Option<u64>,
    /// Leave row the edit form targeted; mutually exclusive with dtr_id
    #[schema(example = 9, nullable = true)]
    pub leave_id: Option<u64>,
    #[schema(example = "8:00 AM", nullable = true)]
    pub am_arrival: Option<String>,
    #[schema(example = "12:00 PM", nullable = true)]
    pub am_departure: Option<String>,
    #[schema(example = "1:00 PM", nullable = true)]
    pub pm_arrival: Option<String>,
    #[schema(example = "5:00 PM", nullable = true)]
    pub pm_departure: Option<String>,
}

/// Defaults a missing range side to the current month's bounds.
fn resolve_range(
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<(NaiveDate, NaiveDate), ApiError> {
    let today = chrono::Local::now().date_naive();
    let month_start = today.with_day(1).expect("day 1 always exists");
    let month_end = {
        let (year, month) = if today.month() == 12 {
            (today.year() + 1, 1)
        } else {
            (today.year(), today.month() + 1)
        };
        NaiveDate::from_ymd_opt(year, month, 1)
            .expect("first of month always exists")
            .pred_opt()
            .expect("not at the calendar epoch")
    };

    let from = from.unwrap_or(month_start);
    let to = to.unwrap_or(month_end);

    if from > to {
        return Err(ApiError::validation("from", "from cannot be after to"));
    }

    Ok((from, to))
}

/// Snapshot reads + the full derivation pipeline for one request.
async fn derive_for_range(
    pool: &MySqlPool,
    scope: EmployeeScope,
    from: NaiveDate,
    to: NaiveDate,
    config: &Config,
) -> Result<crate::attendance::views::DerivedMap, ApiError> {
    let punches = store::punches_in_range(pool, scope, from, to).await?;
    let leaves = store::leaves_in_range(pool, scope, from, to).await?;
    let names = store::employee_names(pool, scope).await?;

    // Grants may extend past the requested window; only their in-range
    // days participate.
    let mut leave_days = expand_leave_grants(&leaves);
    leave_days.retain(|d| d.date >= from && d.date <= to);

    Ok(derive_records(&punches, &leave_days, &names, &config.attendance))
}

fn parse_slot(
    field: &'static str,
    value: Option<&str>,
) -> Result<Option<NaiveTime>, ApiError> {
    match value {
        None => Ok(None),
        Some(text) => match ClockValue::parse(text) {
            ClockValue::Valid(t) => Ok(Some(t)),
            ClockValue::Absent => Ok(None),
            ClockValue::Malformed => Err(ApiError::validation(
                field,
                format!("unrecognized time '{}'", text.trim()),
            )),
        },
    }
}

/// Manual writes are strict where reads are lenient: malformed text is a
/// 400 here instead of degrading to the absence marker.
fn parse_times(
    am_arrival: Option<&str>,
    am_departure: Option<&str>,
    pm_arrival: Option<&str>,
    pm_departure: Option<&str>,
) -> Result<PunchTimes, ApiError> {
    let times = PunchTimes {
        am_time_in: parse_slot("am_arrival", am_arrival)?,
        am_time_out: parse_slot("am_departure", am_departure)?,
        pm_time_in: parse_slot("pm_arrival", pm_arrival)?,
        pm_time_out: parse_slot("pm_departure", pm_departure)?,
    };

    if times.is_empty() {
        return Err(ApiError::validation(
            "times",
            "at least one of the four times is required",
        ));
    }

    Ok(times)
}

/// Three-tier name resolution: cuckoo filter fast negative, moka cache
/// fast positive, database fallback (which re-seeds both).
async fn resolve_employee(pool: &MySqlPool, name: &str) -> Result<u64, ApiError> {
    if !employee_filter::might_exist(name) {
        return Err(ApiError::NotFound { what: "employee" });
    }

    if let Some(id) = employee_cache::lookup(name).await {
        return Ok(id);
    }

    match store::find_employee_by_name(pool, name).await? {
        Some(employee) => {
            employee_cache::remember(name, employee.id).await;
            employee_filter::insert(name);
            Ok(employee.id)
        }
        None => Err(ApiError::NotFound { what: "employee" }),
    }
}

/// Daily time record list view
#[utoipa::path(
    get,
    path = "/api/v1/dtr",
    params(DtrQuery),
    responses(
        (status = 200, description = "Paginated attendance rows", body = DtrListResponse),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "DTR"
)]
pub async fn list_dtr(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<DtrQuery>,
) -> actix_web::Result<impl Responder> {
    let scope = effective_scope(auth.role, auth.employee_id, query.employee_id)?;
    let (from, to) = resolve_range(query.from, query.to)?;

    let records = derive_for_range(pool.get_ref(), scope, from, to, config.get_ref()).await?;
    let view = list_view(
        &records,
        query.status,
        query.sort_by.unwrap_or_default(),
        query.order.unwrap_or_default(),
        query.page.unwrap_or(1),
        query.per_page.unwrap_or(20),
    );

    Ok(HttpResponse::Ok().json(DtrListResponse {
        data: view.rows.into_iter().map(DtrRow::from).collect(),
        page: view.page,
        per_page: view.per_page,
        total: view.total,
    }))
}

/// Calendar cells with per-day status counts
#[utoipa::path(
    get,
    path = "/api/v1/dtr/calendar",
    params(DtrQuery),
    responses(
        (status = 200, description = "Per-day status counts", body = DtrCalendarResponse),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "DTR"
)]
pub async fn calendar_dtr(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<DtrQuery>,
) -> actix_web::Result<impl Responder> {
    let scope = effective_scope(auth.role, auth.employee_id, query.employee_id)?;
    let (from, to) = resolve_range(query.from, query.to)?;

    let records = derive_for_range(pool.get_ref(), scope, from, to, config.get_ref()).await?;
    let data = calendar_view(&records, from, to);

    Ok(HttpResponse::Ok().json(DtrCalendarResponse { from, to, data }))
}

/// Day-of-week and per-employee aggregates
#[utoipa::path(
    get,
    path = "/api/v1/dtr/summary",
    params(DtrQuery),
    responses(
        (status = 200, description = "Aggregate counts and rates", body = SummaryView),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "DTR"
)]
pub async fn summary_dtr(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<DtrQuery>,
) -> actix_web::Result<impl Responder> {
    let scope = effective_scope(auth.role, auth.employee_id, query.employee_id)?;
    let (from, to) = resolve_range(query.from, query.to)?;

    let records = derive_for_range(pool.get_ref(), scope, from, to, config.get_ref()).await?;

    Ok(HttpResponse::Ok().json(summary_view(&records)))
}

/// Manual time-record entry
#[utoipa::path(
    post,
    path = "/api/v1/dtr",
    request_body(
        content = CreateDtr,
        description = "Manual entry payload",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Time record saved", body = Object, example = json!({
            "message": "Time record saved"
        })),
        (status = 400, description = "Malformed field"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Unknown employee"),
        (status = 422, description = "Approved leave covers the date", body = Object, example = json!({
            "message": "approved leave already covers 2024-03-04",
            "date": "2024-03-04"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "DTR"
)]
pub async fn create_dtr(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateDtr>,
) -> actix_web::Result<impl Responder> {
    auth.require_privileged()?;

    let employee_id = resolve_employee(pool.get_ref(), &payload.employee).await?;
    let times = parse_times(
        payload.am_arrival.as_deref(),
        payload.am_departure.as_deref(),
        payload.pm_arrival.as_deref(),
        payload.pm_departure.as_deref(),
    )?;

    store::upsert_time_record(pool.get_ref(), employee_id, payload.date, &times).await?;

    info!(employee_id, date = %payload.date, "time record saved");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Time record saved"
    })))
}

/// Time-record correction
#[utoipa::path(
    put,
    path = "/api/v1/dtr",
    request_body(
        content = UpdateDtr,
        description = "Correction payload; exactly one of dtr_id or leave_id",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Time record updated", body = Object, example = json!({
            "message": "Time record updated"
        })),
        (status = 400, description = "Malformed field or ambiguous target"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Unknown record"),
        (status = 422, description = "Approved leave covers the date")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "DTR"
)]
pub async fn update_dtr(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<UpdateDtr>,
) -> actix_web::Result<impl Responder> {
    auth.require_privileged()?;

    let times = parse_times(
        payload.am_arrival.as_deref(),
        payload.am_departure.as_deref(),
        payload.pm_arrival.as_deref(),
        payload.pm_departure.as_deref(),
    )?;

    match (payload.dtr_id, payload.leave_id) {
        (Some(dtr_id), None) => {
            let updated = store::update_time_record(pool.get_ref(), dtr_id, &times).await?;

            info!(dtr_id, employee_id = updated.employee_id, "time record updated");

            Ok(HttpResponse::Ok().json(serde_json::json!({
                "message": "Time record updated"
            })))
        }
        (None, Some(leave_id)) => {
            // The edit form posts whichever id the row carries. Approved
            // leave supersedes punch edits, so a leave-backed row rejects
            // with the covered date rather than a confusing 404.
            let grant = store::find_leave_grant(pool.get_ref(), leave_id).await?;
            Err(ApiError::LeaveConflict {
                date: grant.date_from,
            }
            .into())
        }
        _ => Err(ApiError::validation(
            "dtr_id",
            "provide exactly one of dtr_id or leave_id",
        )
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_range_rejects_inverted_bounds() {
        let from = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let to = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        assert!(resolve_range(Some(from), Some(to)).is_err());
    }

    #[test]
    fn resolve_range_passes_explicit_bounds_through() {
        let from = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let to = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        assert_eq!(resolve_range(Some(from), Some(to)).unwrap(), (from, to));
    }

    #[test]
    fn parse_times_rejects_the_all_empty_payload() {
        let err = parse_times(None, None, Some("-"), None).unwrap_err();
        assert!(matches!(err, ApiError::Validation { field: "times", .. }));
    }

    #[test]
    fn parse_times_rejects_malformed_text_with_the_field_name() {
        let err = parse_times(Some("8:00 AM"), Some("noonish"), None, None).unwrap_err();
        assert!(matches!(
            err,
            ApiError::Validation {
                field: "am_departure",
                ..
            }
        ));
    }

    #[test]
    fn parse_times_accepts_partial_days() {
        let times = parse_times(Some("8:00 AM"), Some("12:00 PM"), None, None).unwrap();
        assert!(times.am_time_in.is_some());
        assert!(times.pm_time_in.is_none());
        assert!(!times.is_empty());
    }
}
