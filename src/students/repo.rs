use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    db::{PgStore, StoreResult},
    students::repo_types::{NewSchool, NewStudent, School, Student},
};

/// Unique constraint on `students.nfc_uid`.
pub const STUDENTS_NFC_UID_KEY: &str = "students_nfc_uid_key";
/// Unique constraint on `students.student_number`.
pub const STUDENTS_STUDENT_NUMBER_KEY: &str = "students_student_number_key";

#[async_trait]
pub trait StudentRepo: Send + Sync {
    /// Single constrained insert; duplicates surface as unique violations of
    /// [`STUDENTS_NFC_UID_KEY`] or [`STUDENTS_STUDENT_NUMBER_KEY`].
    async fn create_student(&self, new: NewStudent) -> StoreResult<Student>;
    async fn create_school(&self, new: NewSchool) -> StoreResult<School>;
    async fn find_active_school(&self, id: Uuid) -> StoreResult<Option<School>>;
    async fn list_schools(&self) -> StoreResult<Vec<School>>;
}

#[async_trait]
impl StudentRepo for PgStore {
    async fn create_student(&self, new: NewStudent) -> StoreResult<Student> {
        let student = sqlx::query_as::<_, Student>(
            r#"
            INSERT INTO students (nfc_uid, name, class, student_number, school_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, nfc_uid, name, class, student_number, school_id, is_active,
                      created_at, updated_at
            "#,
        )
        .bind(&new.nfc_uid)
        .bind(&new.name)
        .bind(&new.class)
        .bind(&new.student_number)
        .bind(new.school_id)
        .fetch_one(self.pool())
        .await?;
        Ok(student)
    }

    async fn create_school(&self, new: NewSchool) -> StoreResult<School> {
        let school = sqlx::query_as::<_, School>(
            r#"
            INSERT INTO schools (name, address, phone, email)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, address, phone, email, is_active, created_at, updated_at
            "#,
        )
        .bind(&new.name)
        .bind(&new.address)
        .bind(&new.phone)
        .bind(&new.email)
        .fetch_one(self.pool())
        .await?;
        Ok(school)
    }

    async fn find_active_school(&self, id: Uuid) -> StoreResult<Option<School>> {
        let school = sqlx::query_as::<_, School>(
            r#"
            SELECT id, name, address, phone, email, is_active, created_at, updated_at
            FROM schools
            WHERE id = $1 AND is_active
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        Ok(school)
    }

    async fn list_schools(&self) -> StoreResult<Vec<School>> {
        let schools = sqlx::query_as::<_, School>(
            r#"
            SELECT id, name, address, phone, email, is_active, created_at, updated_at
            FROM schools
            WHERE is_active
            ORDER BY name ASC
            "#,
        )
        .fetch_all(self.pool())
        .await?;
        Ok(schools)
    }
}
