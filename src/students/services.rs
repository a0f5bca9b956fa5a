use tracing::{info, warn};

use crate::{
    auth::services::is_valid_email,
    error::{AppError, AppResult},
    students::{
        dto::{CreateSchoolRequest, RegisterCardRequest},
        repo::{StudentRepo, STUDENTS_NFC_UID_KEY, STUDENTS_STUDENT_NUMBER_KEY},
        repo_types::{NewSchool, NewStudent, School, Student},
    },
};

fn required(value: &str, field: &str) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::bad_request(format!("{field} is required")));
    }
    Ok(value.to_string())
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Binds a card to a new, active student of an active school. Both the card UID
/// and the student number must be unused.
pub async fn register_student(
    students: &dyn StudentRepo,
    req: RegisterCardRequest,
) -> AppResult<Student> {
    let new = NewStudent {
        nfc_uid: required(&req.nfc_uid, "nfc_uid")?,
        name: required(&req.name, "name")?,
        class: required(&req.class, "class")?,
        student_number: required(&req.student_id, "student_id")?,
        school_id: req.school_id,
    };

    if students.find_active_school(new.school_id).await?.is_none() {
        warn!(school_id = %new.school_id, "card registration for unknown school");
        return Err(AppError::not_found("School not found"));
    }

    let student = students.create_student(new).await.map_err(|e| {
        if e.is_unique_violation_of(STUDENTS_NFC_UID_KEY) {
            warn!(nfc_uid = %req.nfc_uid, "nfc card already registered");
            AppError::conflict("NFC card already registered")
        } else if e.is_unique_violation_of(STUDENTS_STUDENT_NUMBER_KEY) {
            warn!(student_id = %req.student_id, "student id already exists");
            AppError::conflict("Student ID already exists")
        } else {
            e.into()
        }
    })?;

    info!(
        student_id = %student.id,
        nfc_uid = %student.nfc_uid,
        school_id = %student.school_id,
        "nfc card registered"
    );
    Ok(student)
}

pub async fn register_school(
    students: &dyn StudentRepo,
    req: CreateSchoolRequest,
) -> AppResult<School> {
    let email = optional(req.email).map(|e| e.to_lowercase());
    if let Some(email) = &email {
        if !is_valid_email(email) {
            return Err(AppError::bad_request("Invalid email"));
        }
    }

    let school = students
        .create_school(NewSchool {
            name: required(&req.name, "name")?,
            address: optional(req.address),
            phone: optional(req.phone),
            email,
        })
        .await?;
    info!(school_id = %school.id, name = %school.name, "school registered");
    Ok(school)
}

pub async fn list_schools(students: &dyn StudentRepo) -> AppResult<Vec<School>> {
    Ok(students.list_schools().await?)
}
