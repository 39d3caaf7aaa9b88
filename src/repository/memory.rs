use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use chrono::Utc;

use super::{Repository, RepositoryError, RepositoryResult};
use crate::domain::{
    AccountId, AuditEntry, CascadeCounts, JobRequest, PartnerView, RequestField, RequestId,
    RequestView, Specialization, SpecializationId, Student, Subject, SubjectId, UserAccount,
    UserId,
};

/// The full table set held by [`MemoryRepository`]. Mutations inside a
/// transaction run against a staged copy, so partial work never becomes
/// visible.
#[derive(Debug, Default, Clone)]
pub struct Tables {
    admins: BTreeSet<i64>,
    students: BTreeMap<i64, Student>,
    accounts: BTreeMap<i64, UserAccount>,
    specializations: BTreeMap<i64, Specialization>,
    subjects: BTreeMap<i64, Subject>,
    requests: BTreeMap<i64, JobRequest>,
    audit: Vec<AuditEntry>,
    next_id: i64,
}

impl Tables {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn delete_requests_of_specialization(&mut self, id: SpecializationId) -> usize {
        let before = self.requests.len();
        self.requests.retain(|_, request| request.specialization_id != id);
        before - self.requests.len()
    }

    pub fn delete_subjects_of_specialization(&mut self, id: SpecializationId) -> usize {
        let before = self.subjects.len();
        self.subjects.retain(|_, subject| subject.specialization_id != id);
        before - self.subjects.len()
    }

    /// Removes both identity spaces tied to the specialization: legacy
    /// account rows and registered students. Returns (accounts, students).
    pub fn delete_members_of_specialization(&mut self, id: SpecializationId) -> (usize, usize) {
        let accounts_before = self.accounts.len();
        self.accounts
            .retain(|_, account| account.specialization_id != Some(id));
        let students_before = self.students.len();
        self.students
            .retain(|_, student| student.specialization_id != Some(id));
        (
            accounts_before - self.accounts.len(),
            students_before - self.students.len(),
        )
    }

    pub fn delete_specialization_row(&mut self, id: SpecializationId) -> bool {
        self.specializations.remove(&id.0).is_some()
    }
}

/// In-memory [`Repository`] with transactional semantics: the single state
/// lock is the shared resource, held for the whole duration of a compound
/// operation and never across a wait for user input.
#[derive(Default)]
pub struct MemoryRepository {
    state: Mutex<Tables>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `operation` against a staged copy of the tables and commits the
    /// copy only if it returns `Ok`. An error discards every staged
    /// mutation, leaving the pre-transaction state visible.
    pub fn transaction<T>(
        &self,
        operation: impl FnOnce(&mut Tables) -> RepositoryResult<T>,
    ) -> RepositoryResult<T> {
        let mut guard = self.state.lock().expect("repository mutex poisoned");
        let mut staged = guard.clone();
        let outcome = operation(&mut staged)?;
        *guard = staged;
        Ok(outcome)
    }

    fn read<T>(&self, reader: impl FnOnce(&Tables) -> T) -> T {
        let guard = self.state.lock().expect("repository mutex poisoned");
        reader(&guard)
    }

    /// Grants admin privileges to an identity. Provisioning concern, kept
    /// outside the conversational surface.
    pub fn add_admin(&self, user: UserId) {
        let mut guard = self.state.lock().expect("repository mutex poisoned");
        guard.admins.insert(user.0);
    }

    /// Creates a legacy account row as the administrative import path does.
    pub fn add_account(
        &self,
        name: &str,
        phone: &str,
        specialization: Option<SpecializationId>,
    ) -> RepositoryResult<UserAccount> {
        self.transaction(|tables| {
            let id = tables.allocate_id();
            let account = UserAccount {
                id: AccountId(id),
                name: name.to_string(),
                phone: phone.to_string(),
                specialization_id: specialization,
                is_active: true,
                created_at: Utc::now(),
            };
            tables.accounts.insert(id, account.clone());
            Ok(account)
        })
    }
}

fn newest_first(a: &JobRequest, b: &JobRequest) -> std::cmp::Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| b.id.0.cmp(&a.id.0))
}

fn request_view(tables: &Tables, request: &JobRequest) -> Option<RequestView> {
    // Browsing joins the legacy account table on the request owner id; a
    // request without a matching account row is omitted, as the source
    // query's inner join did.
    let account = tables.accounts.get(&request.user_id.0)?;
    let subject_name = tables
        .subjects
        .get(&request.subject_id.0)
        .map(|subject| subject.name.clone())
        .unwrap_or_else(|| "unknown".to_string());
    Some(RequestView {
        id: request.id,
        owner_name: account.name.clone(),
        owner_phone: account.phone.clone(),
        subject_name,
        professor_name: request.professor_name.clone(),
        class_number: request.class_number.clone(),
        details: request.details.clone(),
    })
}

impl Repository for MemoryRepository {
    fn is_admin(&self, user: UserId) -> RepositoryResult<bool> {
        Ok(self.read(|tables| tables.admins.contains(&user.0)))
    }

    fn upsert_student_contact(&self, user: UserId, contact: &str) -> RepositoryResult<()> {
        self.transaction(|tables| {
            tables
                .students
                .entry(user.0)
                .and_modify(|student| student.contact = contact.to_string())
                .or_insert_with(|| Student {
                    user_id: user,
                    contact: contact.to_string(),
                    full_name: None,
                    username: None,
                    specialization_id: None,
                    is_registered: false,
                });
            Ok(())
        })
    }

    fn complete_registration(
        &self,
        user: UserId,
        full_name: &str,
        username: &str,
        specialization: SpecializationId,
    ) -> RepositoryResult<()> {
        self.transaction(|tables| {
            let taken = tables.students.values().any(|student| {
                student.user_id != user && student.username.as_deref() == Some(username)
            });
            if taken {
                return Err(RepositoryError::Conflict);
            }
            if !tables.specializations.contains_key(&specialization.0) {
                return Err(RepositoryError::NotFound);
            }
            let student = tables
                .students
                .get_mut(&user.0)
                .ok_or(RepositoryError::NotFound)?;
            student.full_name = Some(full_name.to_string());
            student.username = Some(username.to_string());
            student.specialization_id = Some(specialization);
            student.is_registered = true;
            Ok(())
        })
    }

    fn is_registered(&self, user: UserId) -> RepositoryResult<bool> {
        Ok(self.read(|tables| {
            tables
                .students
                .get(&user.0)
                .map(|student| student.is_registered)
                .unwrap_or(false)
        }))
    }

    fn find_student(&self, user: UserId) -> RepositoryResult<Option<Student>> {
        Ok(self.read(|tables| tables.students.get(&user.0).cloned()))
    }

    fn student_specialization(&self, user: UserId) -> RepositoryResult<Option<SpecializationId>> {
        Ok(self.read(|tables| {
            tables
                .students
                .get(&user.0)
                .filter(|student| student.is_registered)
                .and_then(|student| student.specialization_id)
        }))
    }

    fn username_taken(&self, username: &str) -> RepositoryResult<bool> {
        Ok(self.read(|tables| {
            tables
                .students
                .values()
                .any(|student| student.username.as_deref() == Some(username))
        }))
    }

    fn list_specializations(&self) -> RepositoryResult<Vec<Specialization>> {
        Ok(self.read(|tables| {
            let mut specializations: Vec<_> = tables.specializations.values().cloned().collect();
            specializations.sort_by(|a, b| a.name.cmp(&b.name));
            specializations
        }))
    }

    fn find_specialization(
        &self,
        id: SpecializationId,
    ) -> RepositoryResult<Option<Specialization>> {
        Ok(self.read(|tables| tables.specializations.get(&id.0).cloned()))
    }

    fn insert_specialization(&self, name: &str) -> RepositoryResult<Specialization> {
        self.transaction(|tables| {
            if tables
                .specializations
                .values()
                .any(|specialization| specialization.name == name)
            {
                return Err(RepositoryError::Conflict);
            }
            let id = tables.allocate_id();
            let specialization = Specialization {
                id: SpecializationId(id),
                name: name.to_string(),
            };
            tables.specializations.insert(id, specialization.clone());
            Ok(specialization)
        })
    }

    fn rename_specialization(&self, id: SpecializationId, new_name: &str) -> RepositoryResult<()> {
        self.transaction(|tables| {
            if tables
                .specializations
                .values()
                .any(|other| other.id != id && other.name == new_name)
            {
                return Err(RepositoryError::Conflict);
            }
            let specialization = tables
                .specializations
                .get_mut(&id.0)
                .ok_or(RepositoryError::NotFound)?;
            specialization.name = new_name.to_string();
            Ok(())
        })
    }

    fn cascade_counts(&self, id: SpecializationId) -> RepositoryResult<CascadeCounts> {
        self.read(|tables| {
            if !tables.specializations.contains_key(&id.0) {
                return Err(RepositoryError::NotFound);
            }
            Ok(CascadeCounts {
                subjects: tables
                    .subjects
                    .values()
                    .filter(|subject| subject.specialization_id == id)
                    .count(),
                accounts: tables
                    .accounts
                    .values()
                    .filter(|account| account.specialization_id == Some(id))
                    .count(),
                students: tables
                    .students
                    .values()
                    .filter(|student| student.specialization_id == Some(id))
                    .count(),
                requests: tables
                    .requests
                    .values()
                    .filter(|request| request.specialization_id == id)
                    .count(),
            })
        })
    }

    fn delete_specialization(&self, id: SpecializationId) -> RepositoryResult<CascadeCounts> {
        // Dependency order: requests, then subjects, then members, then the
        // parent row. Each prefix alone still leaves a referentially valid
        // state.
        self.transaction(|tables| {
            if !tables.specializations.contains_key(&id.0) {
                return Err(RepositoryError::NotFound);
            }
            let requests = tables.delete_requests_of_specialization(id);
            let subjects = tables.delete_subjects_of_specialization(id);
            let (accounts, students) = tables.delete_members_of_specialization(id);
            tables.delete_specialization_row(id);
            Ok(CascadeCounts {
                subjects,
                accounts,
                students,
                requests,
            })
        })
    }

    fn subjects_of(&self, specialization: SpecializationId) -> RepositoryResult<Vec<Subject>> {
        Ok(self.read(|tables| {
            let mut subjects: Vec<_> = tables
                .subjects
                .values()
                .filter(|subject| subject.specialization_id == specialization)
                .cloned()
                .collect();
            subjects.sort_by(|a, b| a.name.cmp(&b.name));
            subjects
        }))
    }

    fn find_subject(&self, id: SubjectId) -> RepositoryResult<Option<Subject>> {
        Ok(self.read(|tables| tables.subjects.get(&id.0).cloned()))
    }

    fn insert_subject(
        &self,
        specialization: SpecializationId,
        name: &str,
    ) -> RepositoryResult<Subject> {
        self.transaction(|tables| {
            if !tables.specializations.contains_key(&specialization.0) {
                return Err(RepositoryError::NotFound);
            }
            let duplicate = tables
                .subjects
                .values()
                .any(|subject| subject.specialization_id == specialization && subject.name == name);
            if duplicate {
                return Err(RepositoryError::Conflict);
            }
            let id = tables.allocate_id();
            let subject = Subject {
                id: SubjectId(id),
                name: name.to_string(),
                specialization_id: specialization,
            };
            tables.subjects.insert(id, subject.clone());
            Ok(subject)
        })
    }

    fn rename_subject(&self, id: SubjectId, new_name: &str) -> RepositoryResult<()> {
        self.transaction(|tables| {
            let specialization = tables
                .subjects
                .get(&id.0)
                .map(|subject| subject.specialization_id)
                .ok_or(RepositoryError::NotFound)?;
            let duplicate = tables.subjects.values().any(|other| {
                other.id != id
                    && other.specialization_id == specialization
                    && other.name == new_name
            });
            if duplicate {
                return Err(RepositoryError::Conflict);
            }
            let subject = tables
                .subjects
                .get_mut(&id.0)
                .ok_or(RepositoryError::NotFound)?;
            subject.name = new_name.to_string();
            Ok(())
        })
    }

    fn delete_subject(&self, id: SubjectId) -> RepositoryResult<usize> {
        self.transaction(|tables| {
            if tables.subjects.remove(&id.0).is_none() {
                return Err(RepositoryError::NotFound);
            }
            let now = Utc::now();
            let mut touched = 0;
            for request in tables.requests.values_mut() {
                if request.subject_id == id && request.is_active {
                    request.is_active = false;
                    request.updated_at = now;
                    touched += 1;
                }
            }
            Ok(touched)
        })
    }

    fn list_accounts(
        &self,
        offset: usize,
        limit: usize,
    ) -> RepositoryResult<(Vec<UserAccount>, usize)> {
        Ok(self.read(|tables| {
            let mut accounts: Vec<_> = tables.accounts.values().cloned().collect();
            accounts.sort_by(|a, b| {
                b.created_at
                    .cmp(&a.created_at)
                    .then_with(|| b.id.0.cmp(&a.id.0))
            });
            let total = accounts.len();
            let page = accounts.into_iter().skip(offset).take(limit).collect();
            (page, total)
        }))
    }

    fn accounts_by_state(
        &self,
        active: bool,
        limit: usize,
    ) -> RepositoryResult<Vec<UserAccount>> {
        Ok(self.read(|tables| {
            let mut accounts: Vec<_> = tables
                .accounts
                .values()
                .filter(|account| account.is_active == active)
                .cloned()
                .collect();
            accounts.sort_by(|a, b| a.name.cmp(&b.name));
            accounts.truncate(limit);
            accounts
        }))
    }

    fn search_accounts(&self, term: &str, limit: usize) -> RepositoryResult<Vec<UserAccount>> {
        let needle = term.to_lowercase();
        Ok(self.read(|tables| {
            let mut accounts: Vec<_> = tables
                .accounts
                .values()
                .filter(|account| {
                    account.name.to_lowercase().contains(&needle)
                        || account.phone.to_lowercase().contains(&needle)
                })
                .cloned()
                .collect();
            accounts.sort_by(|a, b| a.name.cmp(&b.name));
            accounts.truncate(limit);
            accounts
        }))
    }

    fn find_account(&self, id: AccountId) -> RepositoryResult<Option<UserAccount>> {
        Ok(self.read(|tables| tables.accounts.get(&id.0).cloned()))
    }

    fn set_account_active(&self, id: AccountId, active: bool) -> RepositoryResult<()> {
        self.transaction(|tables| {
            let account = tables
                .accounts
                .get_mut(&id.0)
                .ok_or(RepositoryError::NotFound)?;
            account.is_active = active;
            Ok(())
        })
    }

    fn insert_request(
        &self,
        user: UserId,
        specialization: SpecializationId,
        subject: SubjectId,
        professor_name: &str,
        class_number: &str,
        details: &str,
    ) -> RepositoryResult<JobRequest> {
        self.transaction(|tables| {
            // Referential existence checks: the subject must belong to the
            // given specialization at creation time.
            let owning = tables
                .subjects
                .get(&subject.0)
                .map(|subject| subject.specialization_id)
                .ok_or(RepositoryError::NotFound)?;
            if owning != specialization || !tables.specializations.contains_key(&specialization.0)
            {
                return Err(RepositoryError::NotFound);
            }
            let now = Utc::now();
            let id = tables.allocate_id();
            let request = JobRequest {
                id: RequestId(id),
                user_id: user,
                specialization_id: specialization,
                subject_id: subject,
                professor_name: professor_name.to_string(),
                class_number: class_number.to_string(),
                details: details.to_string(),
                is_active: true,
                created_at: now,
                updated_at: now,
            };
            tables.requests.insert(id, request.clone());
            Ok(request)
        })
    }

    fn find_request(&self, id: RequestId) -> RepositoryResult<Option<JobRequest>> {
        Ok(self.read(|tables| tables.requests.get(&id.0).cloned()))
    }

    fn active_requests_of(&self, user: UserId) -> RepositoryResult<Vec<JobRequest>> {
        Ok(self.read(|tables| {
            let mut requests: Vec<_> = tables
                .requests
                .values()
                .filter(|request| request.user_id == user && request.is_active)
                .cloned()
                .collect();
            requests.sort_by(newest_first);
            requests
        }))
    }

    fn update_request_field(
        &self,
        id: RequestId,
        field: RequestField,
        value: &str,
    ) -> RepositoryResult<()> {
        self.transaction(|tables| {
            let request = tables
                .requests
                .get_mut(&id.0)
                .ok_or(RepositoryError::NotFound)?;
            match field {
                RequestField::ClassNumber => request.class_number = value.to_string(),
                RequestField::ProfessorName => request.professor_name = value.to_string(),
                RequestField::Details => request.details = value.to_string(),
            }
            request.updated_at = Utc::now();
            Ok(())
        })
    }

    fn deactivate_request(&self, id: RequestId) -> RepositoryResult<()> {
        self.transaction(|tables| {
            let request = tables
                .requests
                .get_mut(&id.0)
                .ok_or(RepositoryError::NotFound)?;
            request.is_active = false;
            request.updated_at = Utc::now();
            Ok(())
        })
    }

    fn requests_for_subject(
        &self,
        specialization: SpecializationId,
        subject: SubjectId,
        offset: usize,
        limit: usize,
    ) -> RepositoryResult<(Vec<RequestView>, usize)> {
        Ok(self.read(|tables| {
            let mut requests: Vec<_> = tables
                .requests
                .values()
                .filter(|request| {
                    request.is_active
                        && request.specialization_id == specialization
                        && request.subject_id == subject
                })
                .collect();
            requests.sort_by(|a, b| newest_first(a, b));
            let total = requests.len();
            let page = requests
                .into_iter()
                .skip(offset)
                .take(limit)
                .filter_map(|request| request_view(tables, request))
                .collect();
            (page, total)
        }))
    }

    fn recent_active_requests(&self, limit: usize) -> RepositoryResult<Vec<RequestView>> {
        Ok(self.read(|tables| {
            let mut requests: Vec<_> = tables
                .requests
                .values()
                .filter(|request| request.is_active)
                .collect();
            requests.sort_by(|a, b| newest_first(a, b));
            requests
                .into_iter()
                .take(limit)
                .filter_map(|request| request_view(tables, request))
                .collect()
        }))
    }

    fn deactivate_requests_for_subject(&self, subject: SubjectId) -> RepositoryResult<usize> {
        self.transaction(|tables| {
            let now = Utc::now();
            let mut touched = 0;
            for request in tables.requests.values_mut() {
                if request.subject_id == subject && request.is_active {
                    request.is_active = false;
                    request.updated_at = now;
                    touched += 1;
                }
            }
            Ok(touched)
        })
    }

    fn deactivate_requests_for_specialization(
        &self,
        specialization: SpecializationId,
    ) -> RepositoryResult<usize> {
        self.transaction(|tables| {
            let now = Utc::now();
            let mut touched = 0;
            for request in tables.requests.values_mut() {
                if request.specialization_id == specialization && request.is_active {
                    request.is_active = false;
                    request.updated_at = now;
                    touched += 1;
                }
            }
            Ok(touched)
        })
    }

    fn partners_for_subject(&self, subject: SubjectId) -> RepositoryResult<Vec<PartnerView>> {
        Ok(self.read(|tables| {
            let mut requests: Vec<_> = tables
                .requests
                .values()
                .filter(|request| request.subject_id == subject && request.is_active)
                .collect();
            requests.sort_by(|a, b| newest_first(a, b));
            requests
                .into_iter()
                .filter_map(|request| {
                    let student = tables.students.get(&request.user_id.0)?;
                    if !student.is_registered {
                        return None;
                    }
                    Some(PartnerView {
                        request_id: request.id,
                        full_name: student.full_name.clone()?,
                        username: student.username.clone()?,
                        contact: student.contact.clone(),
                        professor_name: request.professor_name.clone(),
                        class_number: request.class_number.clone(),
                        details: request.details.clone(),
                    })
                })
                .collect()
        }))
    }

    fn append_audit(&self, action: &str, details: &str) -> RepositoryResult<()> {
        self.transaction(|tables| {
            tables.audit.push(AuditEntry {
                action: action.to_string(),
                details: details.to_string(),
                created_at: Utc::now(),
            });
            Ok(())
        })
    }

    fn recent_audit(&self, limit: usize) -> RepositoryResult<Vec<AuditEntry>> {
        Ok(self.read(|tables| {
            tables.audit.iter().rev().take(limit).cloned().collect()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> (MemoryRepository, SpecializationId, SubjectId) {
        let repo = MemoryRepository::new();
        let spec = repo.insert_specialization("Informatics").expect("insert spec");
        let subject = repo
            .insert_subject(spec.id, "Databases")
            .expect("insert subject");
        (repo, spec.id, subject.id)
    }

    #[test]
    fn specialization_names_are_unique() {
        let (repo, _, _) = seeded();
        let duplicate = repo.insert_specialization("Informatics");
        assert!(matches!(duplicate, Err(RepositoryError::Conflict)));
    }

    #[test]
    fn subject_names_unique_within_specialization_only() {
        let (repo, spec, _) = seeded();
        assert!(matches!(
            repo.insert_subject(spec, "Databases"),
            Err(RepositoryError::Conflict)
        ));

        let other = repo.insert_specialization("Economics").expect("insert");
        repo.insert_subject(other.id, "Databases")
            .expect("same name allowed under another specialization");
    }

    #[test]
    fn same_name_rename_of_other_row_conflicts() {
        let (repo, spec, _) = seeded();
        let other = repo.insert_specialization("Economics").expect("insert");
        assert!(matches!(
            repo.rename_specialization(other.id, "Informatics"),
            Err(RepositoryError::Conflict)
        ));
        repo.rename_specialization(spec, "Informatics")
            .expect("renaming a row to its own name is not a conflict");
    }

    #[test]
    fn duplicate_username_leaves_first_registration_untouched() {
        let (repo, spec, _) = seeded();
        repo.upsert_student_contact(UserId(1), "963911000001")
            .expect("contact");
        repo.complete_registration(UserId(1), "Ali Hassan", "ali_202345", spec)
            .expect("first registration");

        repo.upsert_student_contact(UserId(2), "963911000002")
            .expect("contact");
        let second = repo.complete_registration(UserId(2), "Sami Omar", "ali_202345", spec);
        assert!(matches!(second, Err(RepositoryError::Conflict)));

        let first = repo
            .find_student(UserId(1))
            .expect("lookup")
            .expect("student row");
        assert!(first.is_registered);
        assert_eq!(first.username.as_deref(), Some("ali_202345"));
        let second_row = repo
            .find_student(UserId(2))
            .expect("lookup")
            .expect("student row");
        assert!(!second_row.is_registered);
    }

    #[test]
    fn contact_upsert_overwrites_only_the_contact() {
        let (repo, spec, _) = seeded();
        repo.upsert_student_contact(UserId(7), "963911000001")
            .expect("contact");
        repo.complete_registration(UserId(7), "Ali Hassan", "ali_1", spec)
            .expect("register");
        repo.upsert_student_contact(UserId(7), "963911999999")
            .expect("second share");

        let student = repo.find_student(UserId(7)).expect("lookup").expect("row");
        assert_eq!(student.contact, "963911999999");
        assert!(student.is_registered);
        assert_eq!(student.full_name.as_deref(), Some("Ali Hassan"));
    }

    #[test]
    fn insert_request_rejects_subject_outside_specialization() {
        let (repo, spec, _) = seeded();
        let other = repo.insert_specialization("Economics").expect("insert");
        let foreign = repo
            .insert_subject(other.id, "Accounting")
            .expect("insert subject");
        let attempt = repo.insert_request(UserId(1), spec, foreign.id, "Dr. A", "101", "");
        assert!(matches!(attempt, Err(RepositoryError::NotFound)));
    }

    #[test]
    fn cascade_removes_all_dependents_and_reports_counts() {
        let (repo, spec, subject) = seeded();
        repo.add_account("Ali", "0911", Some(spec)).expect("account");
        repo.add_account("Sami", "0912", Some(spec)).expect("account");
        repo.upsert_student_contact(UserId(1), "0911").expect("contact");
        repo.complete_registration(UserId(1), "Ali", "ali_1", spec)
            .expect("register");
        repo.insert_request(UserId(1), spec, subject, "Dr. A", "101", "")
            .expect("request");

        let counts = repo.delete_specialization(spec).expect("cascade");
        assert_eq!(counts.subjects, 1);
        assert_eq!(counts.accounts, 2);
        assert_eq!(counts.students, 1);
        assert_eq!(counts.requests, 1);

        assert!(repo.find_specialization(spec).expect("lookup").is_none());
        assert!(repo.subjects_of(spec).expect("subjects").is_empty());
        assert!(repo.find_student(UserId(1)).expect("lookup").is_none());
        let (accounts, total) = repo.list_accounts(0, 10).expect("accounts");
        assert!(accounts.is_empty());
        assert_eq!(total, 0);
    }

    #[test]
    fn failed_transaction_discards_staged_deletes() {
        let (repo, spec, subject) = seeded();
        repo.add_account("Ali", "0911", Some(spec)).expect("account");
        repo.insert_request(UserId(1), spec, subject, "Dr. A", "101", "")
            .expect("request");

        let before = repo.cascade_counts(spec).expect("counts");
        let attempt: RepositoryResult<()> = repo.transaction(|tables| {
            tables.delete_requests_of_specialization(spec);
            Err(RepositoryError::Unavailable("storage offline".to_string()))
        });
        assert!(matches!(attempt, Err(RepositoryError::Unavailable(_))));

        // Every staged delete rolled back.
        assert_eq!(repo.cascade_counts(spec).expect("counts"), before);
        assert_eq!(before.requests, 1);
    }

    #[test]
    fn field_update_touches_only_that_field() {
        let (repo, spec, subject) = seeded();
        let request = repo
            .insert_request(UserId(1), spec, subject, "Dr. A", "101", "bring notes")
            .expect("request");

        repo.update_request_field(request.id, RequestField::Details, "updated")
            .expect("edit");

        let edited = repo
            .find_request(request.id)
            .expect("lookup")
            .expect("request row");
        assert_eq!(edited.details, "updated");
        assert_eq!(edited.class_number, "101");
        assert_eq!(edited.professor_name, "Dr. A");
        assert!(edited.updated_at >= edited.created_at);
    }

    #[test]
    fn deactivation_is_a_soft_delete() {
        let (repo, spec, subject) = seeded();
        let request = repo
            .insert_request(UserId(1), spec, subject, "Dr. A", "101", "")
            .expect("request");
        repo.deactivate_request(request.id).expect("deactivate");

        assert!(repo.active_requests_of(UserId(1)).expect("list").is_empty());
        let row = repo
            .find_request(request.id)
            .expect("lookup")
            .expect("row survives deactivation");
        assert!(!row.is_active);
    }

    #[test]
    fn subject_delete_takes_its_requests_down_with_it() {
        let (repo, spec, subject) = seeded();
        let request = repo
            .insert_request(UserId(1), spec, subject, "Dr. A", "101", "")
            .expect("request");

        let deactivated = repo.delete_subject(subject).expect("delete");
        assert_eq!(deactivated, 1);
        assert!(repo.find_subject(subject).expect("lookup").is_none());
        let row = repo
            .find_request(request.id)
            .expect("lookup")
            .expect("request row survives");
        assert!(!row.is_active);

        // A second delete finds nothing and changes nothing.
        assert!(matches!(
            repo.delete_subject(subject),
            Err(RepositoryError::NotFound)
        ));
    }

    #[test]
    fn audit_is_append_only_and_newest_first() {
        let repo = MemoryRepository::new();
        repo.append_audit("specialization added", "Informatics")
            .expect("append");
        repo.append_audit("subject added", "Databases").expect("append");

        let recent = repo.recent_audit(10).expect("recent");
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].action, "subject added");
        assert_eq!(recent[1].action, "specialization added");
    }

    #[test]
    fn account_search_matches_name_and_phone_case_insensitively() {
        let (repo, spec, _) = seeded();
        repo.add_account("Ali Hassan", "963911000001", Some(spec))
            .expect("account");
        repo.add_account("Sami Omar", "963922000002", Some(spec))
            .expect("account");

        let by_name = repo.search_accounts("ali", 10).expect("search");
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].name, "Ali Hassan");

        let by_phone = repo.search_accounts("922", 10).expect("search");
        assert_eq!(by_phone.len(), 1);
        assert_eq!(by_phone[0].name, "Sami Omar");
    }
}
