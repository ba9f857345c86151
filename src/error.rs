use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use chrono::NaiveDate;
use derive_more::Display;
use serde_json::json;

/// Typed failure kinds for the attendance endpoints. Parse failures inside
/// the derivation pipeline never reach this type: a malformed stored time
/// degrades to the absence marker so one bad record cannot abort a whole
/// range aggregation.
#[derive(Debug, Display, PartialEq, Eq)]
pub enum ApiError {
    #[display(fmt = "{} not found", what)]
    NotFound { what: &'static str },

    /// A punch write landed on a date already covered by approved leave.
    #[display(fmt = "approved leave already covers {}", date)]
    LeaveConflict { date: NaiveDate },

    #[display(fmt = "{}: {}", field, message)]
    Validation {
        field: &'static str,
        message: String,
    },

    #[display(fmt = "caller has no employee profile")]
    Forbidden,

    /// Storage-layer failure; the enclosing transaction is rolled back in
    /// full before this surfaces.
    #[display(fmt = "storage transaction failed")]
    Transaction,
}

impl ApiError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        ApiError::Validation {
            field,
            message: message.into(),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::LeaveConflict { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::Transaction => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            ApiError::LeaveConflict { date } => json!({
                "message": self.to_string(),
                "date": date,
            }),
            ApiError::Validation { field, .. } => json!({
                "message": self.to_string(),
                "field": field,
            }),
            _ => json!({ "message": self.to_string() }),
        };

        HttpResponse::build(self.status_code()).json(body)
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => ApiError::NotFound { what: "record" },
            e => {
                tracing::error!(error = %e, "storage failure");
                ApiError::Transaction
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_error_kinds() {
        assert_eq!(
            ApiError::NotFound { what: "employee" }.status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::LeaveConflict {
                date: NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()
            }
            .status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::validation("date", "malformed").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            ApiError::Transaction.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn conflict_message_names_the_date() {
        let err = ApiError::LeaveConflict {
            date: NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
        };
        assert_eq!(err.to_string(), "approved leave already covers 2024-03-04");
    }
}
