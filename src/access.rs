//! Role resolution. Privilege is re-derived from the repository on every
//! event rather than cached in the session.

use crate::domain::{Role, UserId};
use crate::repository::{Repository, RepositoryResult};

pub fn resolve_role<R: Repository>(repository: &R, user: UserId) -> RepositoryResult<Role> {
    if repository.is_admin(user)? {
        return Ok(Role::Admin);
    }
    if repository.is_registered(user)? {
        return Ok(Role::RegisteredStudent);
    }
    Ok(Role::Unregistered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryRepository;

    #[test]
    fn admin_wins_over_registration_state() {
        let repo = MemoryRepository::new();
        repo.add_admin(UserId(9));
        assert_eq!(resolve_role(&repo, UserId(9)).unwrap(), Role::Admin);
    }

    #[test]
    fn unknown_identities_are_unregistered() {
        let repo = MemoryRepository::new();
        assert_eq!(resolve_role(&repo, UserId(5)).unwrap(), Role::Unregistered);
    }

    #[test]
    fn completed_registration_grants_student_role() {
        let repo = MemoryRepository::new();
        let spec = repo.insert_specialization("Informatics").unwrap();
        repo.upsert_student_contact(UserId(5), "0911").unwrap();
        assert_eq!(resolve_role(&repo, UserId(5)).unwrap(), Role::Unregistered);

        repo.complete_registration(UserId(5), "Ali", "ali_1", spec.id)
            .unwrap();
        assert_eq!(
            resolve_role(&repo, UserId(5)).unwrap(),
            Role::RegisteredStudent
        );
    }
}
