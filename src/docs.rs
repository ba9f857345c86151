use crate::api::dtr::{
    CreateDtr, DtrCalendarResponse, DtrListResponse, DtrQuery, DtrRow, UpdateDtr,
};
use crate::attendance::derive::AttendanceStatus;
use crate::attendance::undertime::Undertime;
use crate::attendance::views::{
    CalendarCell, EmployeeSummary, SortKey, SortOrder, StatusCounts, StatusRates, SummaryView,
    WeekdaySummary,
};
use crate::model::employee::Employee;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "DTR System API",
        version = "1.0.0",
        description = r#"
## Daily Time Record (DTR) System

This API reconciles raw time-clock punches and approved leave grants into a
single per-employee, per-day attendance view.

### 🔹 Key Features
- **Attendance List**
  - Flat daily rows with merged display times, status and undertime
- **Calendar View**
  - Per-day Present/Absent/Leave/Late counts for month grids
- **Summary View**
  - Day-of-week and per-employee aggregates with rate percentages
- **Manual Entry & Corrections**
  - Upsert punch rows; writes on leave-covered dates are rejected

### 🔐 Security
All endpoints are protected using **JWT Bearer authentication** issued by
the external identity service. Unprivileged callers only ever see their own
records.

### 📦 Response Format
- JSON-based RESTful responses
- Pagination supported for the list endpoint

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::dtr::list_dtr,
        crate::api::dtr::calendar_dtr,
        crate::api::dtr::summary_dtr,
        crate::api::dtr::create_dtr,
        crate::api::dtr::update_dtr
    ),
    components(
        schemas(
            DtrQuery,
            DtrRow,
            DtrListResponse,
            DtrCalendarResponse,
            CreateDtr,
            UpdateDtr,
            AttendanceStatus,
            Undertime,
            CalendarCell,
            StatusCounts,
            StatusRates,
            SummaryView,
            WeekdaySummary,
            EmployeeSummary,
            SortKey,
            SortOrder,
            Employee
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "DTR", description = "Daily time record APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
