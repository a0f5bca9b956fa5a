//! In-process store for tests. Emulates the unique and foreign key constraints of
//! the Postgres schema so services see the same errors.

use std::sync::Mutex;

use async_trait::async_trait;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::{
    attendance::{
        repo::{AttendanceRepo, ATTENDANCES_STUDENT_DATE_KEY},
        repo_types::{Attendance, AttendanceWithStudent, NewAttendance},
    },
    auth::{
        repo::{UserRepo, USERS_EMAIL_KEY},
        repo_types::{NewUser, User},
    },
    db::{StoreError, StoreResult},
    students::{
        repo::{StudentRepo, STUDENTS_NFC_UID_KEY, STUDENTS_STUDENT_NUMBER_KEY},
        repo_types::{NewSchool, NewStudent, School, Student},
    },
};

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    schools: Vec<School>,
    students: Vec<Student>,
    attendances: Vec<Attendance>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

fn unique(constraint: &str) -> StoreError {
    StoreError::UniqueViolation {
        constraint: constraint.to_string(),
    }
}

impl MemoryStore {
    pub fn deactivate_user(&self, id: Uuid) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(user) = inner.users.iter_mut().find(|u| u.id == id) {
            user.is_active = false;
        }
    }

    pub fn deactivate_student(&self, id: Uuid) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(student) = inner.students.iter_mut().find(|s| s.id == id) {
            student.is_active = false;
        }
    }

    pub fn attendance_count(&self, student_id: Uuid) -> usize {
        let inner = self.inner.lock().unwrap();
        inner
            .attendances
            .iter()
            .filter(|a| a.student_id == student_id)
            .count()
    }
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn create_user(&self, new: NewUser) -> StoreResult<User> {
        let mut inner = self.inner.lock().unwrap();
        if inner.users.iter().any(|u| u.email == new.email) {
            return Err(unique(USERS_EMAIL_KEY));
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            email: new.email,
            password_hash: new.password_hash,
            name: new.name,
            role: new.role,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        inner.users.push(user.clone());
        Ok(user)
    }

    async fn find_active_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .users
            .iter()
            .find(|u| u.email == email && u.is_active)
            .cloned())
    }

    async fn find_active_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .users
            .iter()
            .find(|u| u.id == id && u.is_active)
            .cloned())
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        Ok(self.inner.lock().unwrap().users.clone())
    }
}

#[async_trait]
impl StudentRepo for MemoryStore {
    async fn create_student(&self, new: NewStudent) -> StoreResult<Student> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.schools.iter().any(|s| s.id == new.school_id) {
            return Err(StoreError::ForeignKeyViolation {
                constraint: "students_school_id_fkey".into(),
            });
        }
        if inner.students.iter().any(|s| s.nfc_uid == new.nfc_uid) {
            return Err(unique(STUDENTS_NFC_UID_KEY));
        }
        if inner
            .students
            .iter()
            .any(|s| s.student_number == new.student_number)
        {
            return Err(unique(STUDENTS_STUDENT_NUMBER_KEY));
        }
        let now = OffsetDateTime::now_utc();
        let student = Student {
            id: Uuid::new_v4(),
            nfc_uid: new.nfc_uid,
            name: new.name,
            class: new.class,
            student_number: new.student_number,
            school_id: new.school_id,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        inner.students.push(student.clone());
        Ok(student)
    }

    async fn create_school(&self, new: NewSchool) -> StoreResult<School> {
        let now = OffsetDateTime::now_utc();
        let school = School {
            id: Uuid::new_v4(),
            name: new.name,
            address: new.address,
            phone: new.phone,
            email: new.email,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.inner.lock().unwrap().schools.push(school.clone());
        Ok(school)
    }

    async fn find_active_school(&self, id: Uuid) -> StoreResult<Option<School>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .schools
            .iter()
            .find(|s| s.id == id && s.is_active)
            .cloned())
    }

    async fn list_schools(&self) -> StoreResult<Vec<School>> {
        let inner = self.inner.lock().unwrap();
        let mut schools: Vec<School> = inner.schools.iter().filter(|s| s.is_active).cloned().collect();
        schools.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(schools)
    }
}

#[async_trait]
impl AttendanceRepo for MemoryStore {
    async fn find_active_student_by_nfc(&self, nfc_uid: &str) -> StoreResult<Option<Student>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .students
            .iter()
            .find(|s| s.nfc_uid == nfc_uid && s.is_active)
            .cloned())
    }

    async fn find_for_day(&self, student_id: Uuid, date: Date) -> StoreResult<Option<Attendance>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .attendances
            .iter()
            .find(|a| a.student_id == student_id && a.date == date)
            .cloned())
    }

    async fn insert_check_in(&self, new: NewAttendance) -> StoreResult<Attendance> {
        let mut inner = self.inner.lock().unwrap();
        if inner
            .attendances
            .iter()
            .any(|a| a.student_id == new.student_id && a.date == new.date)
        {
            return Err(unique(ATTENDANCES_STUDENT_DATE_KEY));
        }
        let now = OffsetDateTime::now_utc();
        let attendance = Attendance {
            id: Uuid::new_v4(),
            student_id: new.student_id,
            date: new.date,
            time_in: Some(new.time_in),
            time_out: None,
            status: new.status,
            created_at: now,
            updated_at: now,
        };
        inner.attendances.push(attendance.clone());
        Ok(attendance)
    }

    async fn set_check_out(&self, id: Uuid, at: OffsetDateTime) -> StoreResult<Option<Attendance>> {
        let mut inner = self.inner.lock().unwrap();
        let Some(row) = inner
            .attendances
            .iter_mut()
            .find(|a| a.id == id && a.time_out.is_none())
        else {
            return Ok(None);
        };
        row.time_out = Some(at);
        row.updated_at = OffsetDateTime::now_utc();
        Ok(Some(row.clone()))
    }

    async fn history(&self, student_id: Uuid, limit: i64) -> StoreResult<Vec<Attendance>> {
        let inner = self.inner.lock().unwrap();
        let mut rows: Vec<Attendance> = inner
            .attendances
            .iter()
            .filter(|a| a.student_id == student_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date));
        rows.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(rows)
    }

    async fn for_day(&self, date: Date) -> StoreResult<Vec<AttendanceWithStudent>> {
        let inner = self.inner.lock().unwrap();
        let mut rows: Vec<AttendanceWithStudent> = inner
            .attendances
            .iter()
            .filter(|a| a.date == date)
            .filter_map(|a| {
                let student = inner.students.iter().find(|s| s.id == a.student_id)?;
                Some(AttendanceWithStudent {
                    attendance: a.clone(),
                    student: student.clone(),
                })
            })
            .collect();
        // NULLS LAST
        rows.sort_by_key(|r| (r.attendance.time_in.is_none(), r.attendance.time_in));
        Ok(rows)
    }
}
