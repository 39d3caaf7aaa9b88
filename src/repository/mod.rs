mod memory;

pub use memory::MemoryRepository;

use crate::domain::{
    AccountId, AuditEntry, CascadeCounts, JobRequest, PartnerView, RequestField, RequestId,
    RequestView, Specialization, SpecializationId, Student, Subject, SubjectId, UserAccount,
    UserId,
};

/// Error enumeration for repository failures. Storage-level errors are
/// converted here and never surface raw to the flow layer.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Storage abstraction with narrow, intention-revealing operations.
///
/// Compound operations (the specialization cascade, bulk deactivation) are
/// atomic: either every statement commits or none do. Uniqueness checks run
/// in the same critical section as the insert or update they guard, so a
/// violation always comes back as [`RepositoryError::Conflict`] rather than
/// a silent overwrite.
pub trait Repository: Send + Sync {
    // Privileged identities.
    fn is_admin(&self, user: UserId) -> RepositoryResult<bool>;

    // Students (registration-flow identity space).
    fn upsert_student_contact(&self, user: UserId, contact: &str) -> RepositoryResult<()>;
    fn complete_registration(
        &self,
        user: UserId,
        full_name: &str,
        username: &str,
        specialization: SpecializationId,
    ) -> RepositoryResult<()>;
    fn is_registered(&self, user: UserId) -> RepositoryResult<bool>;
    fn find_student(&self, user: UserId) -> RepositoryResult<Option<Student>>;
    fn student_specialization(&self, user: UserId) -> RepositoryResult<Option<SpecializationId>>;
    fn username_taken(&self, username: &str) -> RepositoryResult<bool>;

    // Specializations.
    fn list_specializations(&self) -> RepositoryResult<Vec<Specialization>>;
    fn find_specialization(
        &self,
        id: SpecializationId,
    ) -> RepositoryResult<Option<Specialization>>;
    fn insert_specialization(&self, name: &str) -> RepositoryResult<Specialization>;
    fn rename_specialization(&self, id: SpecializationId, new_name: &str) -> RepositoryResult<()>;
    fn cascade_counts(&self, id: SpecializationId) -> RepositoryResult<CascadeCounts>;
    /// Removes the specialization together with its requests, subjects, and
    /// dependent accounts/students, in that order, as one transaction.
    fn delete_specialization(&self, id: SpecializationId) -> RepositoryResult<CascadeCounts>;

    // Subjects.
    fn subjects_of(&self, specialization: SpecializationId) -> RepositoryResult<Vec<Subject>>;
    fn find_subject(&self, id: SubjectId) -> RepositoryResult<Option<Subject>>;
    fn insert_subject(
        &self,
        specialization: SpecializationId,
        name: &str,
    ) -> RepositoryResult<Subject>;
    fn rename_subject(&self, id: SubjectId, new_name: &str) -> RepositoryResult<()>;
    /// Removes the subject and deactivates its active requests in one
    /// transaction, returning how many requests were deactivated.
    fn delete_subject(&self, id: SubjectId) -> RepositoryResult<usize>;

    // Legacy account records (moderation identity space).
    fn list_accounts(
        &self,
        offset: usize,
        limit: usize,
    ) -> RepositoryResult<(Vec<UserAccount>, usize)>;
    fn accounts_by_state(&self, active: bool, limit: usize)
        -> RepositoryResult<Vec<UserAccount>>;
    fn search_accounts(&self, term: &str, limit: usize) -> RepositoryResult<Vec<UserAccount>>;
    fn find_account(&self, id: AccountId) -> RepositoryResult<Option<UserAccount>>;
    fn set_account_active(&self, id: AccountId, active: bool) -> RepositoryResult<()>;

    // Job requests.
    fn insert_request(
        &self,
        user: UserId,
        specialization: SpecializationId,
        subject: SubjectId,
        professor_name: &str,
        class_number: &str,
        details: &str,
    ) -> RepositoryResult<JobRequest>;
    fn find_request(&self, id: RequestId) -> RepositoryResult<Option<JobRequest>>;
    fn active_requests_of(&self, user: UserId) -> RepositoryResult<Vec<JobRequest>>;
    fn update_request_field(
        &self,
        id: RequestId,
        field: RequestField,
        value: &str,
    ) -> RepositoryResult<()>;
    fn deactivate_request(&self, id: RequestId) -> RepositoryResult<()>;
    fn requests_for_subject(
        &self,
        specialization: SpecializationId,
        subject: SubjectId,
        offset: usize,
        limit: usize,
    ) -> RepositoryResult<(Vec<RequestView>, usize)>;
    fn recent_active_requests(&self, limit: usize) -> RepositoryResult<Vec<RequestView>>;
    fn deactivate_requests_for_subject(&self, subject: SubjectId) -> RepositoryResult<usize>;
    fn deactivate_requests_for_specialization(
        &self,
        specialization: SpecializationId,
    ) -> RepositoryResult<usize>;
    fn partners_for_subject(&self, subject: SubjectId) -> RepositoryResult<Vec<PartnerView>>;

    // Audit trail.
    fn append_audit(&self, action: &str, details: &str) -> RepositoryResult<()>;
    fn recent_audit(&self, limit: usize) -> RepositoryResult<Vec<AuditEntry>>;
}
