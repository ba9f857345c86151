use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "first_name": "Juan",
        "last_name": "Dela Cruz",
        "extname": "Jr.",
        "status": "active"
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "Juan")]
    pub first_name: String,

    #[schema(example = "Dela Cruz")]
    pub last_name: String,

    #[schema(example = "Jr.", nullable = true)]
    pub extname: Option<String>,

    #[schema(example = "active")]
    pub status: String,
}

impl Employee {
    /// Display name as it appears on the monthly time-record form:
    /// `<extname> <first> <last>` when an extension name exists.
    pub fn display_name(&self) -> String {
        match self.extname.as_deref() {
            Some(ext) if !ext.trim().is_empty() => {
                format!("{} {} {}", ext.trim(), self.first_name, self.last_name)
            }
            _ => format!("{} {}", self.first_name, self.last_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn employee(extname: Option<&str>) -> Employee {
        Employee {
            id: 7,
            first_name: "Juan".into(),
            last_name: "Dela Cruz".into(),
            extname: extname.map(Into::into),
            status: "active".into(),
        }
    }

    #[test]
    fn display_name_includes_extension_when_present() {
        assert_eq!(employee(Some("Jr.")).display_name(), "Jr. Juan Dela Cruz");
        assert_eq!(employee(None).display_name(), "Juan Dela Cruz");
    }

    #[test]
    fn display_name_ignores_blank_extension() {
        assert_eq!(employee(Some("  ")).display_name(), "Juan Dela Cruz");
    }
}
