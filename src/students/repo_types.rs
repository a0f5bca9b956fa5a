use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Card holder. `nfc_uid` is the lookup key for scans.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Student {
    pub id: Uuid,
    pub nfc_uid: String,
    pub name: String,
    pub class: String,
    #[serde(rename = "student_id")]
    pub student_number: String, // school-issued identifier
    pub school_id: Uuid,
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewStudent {
    pub nfc_uid: String,
    pub name: String,
    pub class: String,
    pub student_number: String,
    pub school_id: Uuid,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct School {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewSchool {
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}
