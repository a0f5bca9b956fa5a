use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::students::repo_types::{School, Student};

/// Request body for binding an NFC card to a new student.
#[derive(Debug, Deserialize)]
pub struct RegisterCardRequest {
    pub nfc_uid: String,
    pub name: String,
    pub class: String,
    pub student_id: String,
    pub school_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct RegisterCardResponse {
    pub message: &'static str,
    pub student: Student,
}

#[derive(Debug, Deserialize)]
pub struct CreateSchoolRequest {
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SchoolResponse {
    pub school: School,
}

#[derive(Debug, Serialize)]
pub struct SchoolsResponse {
    pub schools: Vec<School>,
}
