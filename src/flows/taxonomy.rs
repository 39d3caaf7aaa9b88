//! Admin taxonomy management: specializations and their subjects.

use super::{fetch, Engine, FlowState, CANCEL_LABEL, PERMISSION_DENIED};
use crate::audit;
use crate::domain::{Role, SpecializationId, SubjectId, UserId};
use crate::events::{Choice, OutboundRender};
use crate::repository::{Repository, RepositoryError};
use crate::token::ChoiceToken;

impl<R: Repository> Engine<R> {
    /// Admin status is re-checked when a privileged text step commits, not
    /// just when the flow started.
    fn require_admin(&self, user: UserId, role: Role) -> Option<Vec<OutboundRender>> {
        if role == Role::Admin {
            None
        } else {
            self.sessions.clear(user);
            Some(vec![OutboundRender::prompt(PERMISSION_DENIED)])
        }
    }

    pub(crate) fn specializations_menu(&self, user: UserId) -> Vec<OutboundRender> {
        let specializations = fetch!(self, user, self.repository.list_specializations());
        let mut choices = Vec::new();
        for specialization in &specializations {
            choices.push(Choice::new(
                format!("Subjects of {}", specialization.name),
                ChoiceToken::ManageSubjects(specialization.id),
            ));
            choices.push(Choice::new(
                format!("Rename {}", specialization.name),
                ChoiceToken::SpecializationEdit(specialization.id),
            ));
            choices.push(Choice::new(
                format!("Delete {}", specialization.name),
                ChoiceToken::SpecializationDelete(specialization.id),
            ));
        }
        choices.push(Choice::new(
            "Add a specialization",
            ChoiceToken::SpecializationAdd,
        ));
        choices.push(Choice::new(CANCEL_LABEL, ChoiceToken::Cancel));
        let text = if specializations.is_empty() {
            "No specializations yet.".to_string()
        } else {
            "Specializations on record.".to_string()
        };
        vec![OutboundRender::menu(text, choices)]
    }

    pub(crate) fn begin_specialization_add(&self, user: UserId) -> Vec<OutboundRender> {
        self.sessions.set(user, FlowState::AwaitingSpecializationName);
        vec![OutboundRender::prompt(
            "Send the name of the new specialization.",
        )]
    }

    pub(crate) fn specialization_name_entered(
        &self,
        user: UserId,
        role: Role,
        text: &str,
    ) -> Vec<OutboundRender> {
        if let Some(out) = self.require_admin(user, role) {
            return out;
        }
        if text.is_empty() {
            return vec![OutboundRender::prompt("The name cannot be empty.")];
        }
        match self.repository.insert_specialization(text) {
            Ok(specialization) => {
                self.sessions.clear(user);
                audit::record(
                    self.repository.as_ref(),
                    "specialization added",
                    &specialization.name,
                );
                vec![OutboundRender::prompt(format!(
                    "Added {}.",
                    specialization.name
                ))]
            }
            Err(RepositoryError::Conflict) => vec![OutboundRender::prompt(
                "A specialization with that name already exists. Send another name.",
            )],
            Err(error) => self.repo_failure(user, error),
        }
    }

    pub(crate) fn begin_specialization_rename(
        &self,
        user: UserId,
        specialization: SpecializationId,
    ) -> Vec<OutboundRender> {
        let Some(found) = fetch!(self, user, self.repository.find_specialization(specialization))
        else {
            return vec![OutboundRender::prompt(
                "That specialization is no longer available.",
            )];
        };
        self.sessions.set(
            user,
            FlowState::AwaitingSpecializationRename { specialization },
        );
        vec![OutboundRender::prompt(format!(
            "Send the new name for {}.",
            found.name
        ))]
    }

    pub(crate) fn specialization_rename_entered(
        &self,
        user: UserId,
        role: Role,
        specialization: SpecializationId,
        text: &str,
    ) -> Vec<OutboundRender> {
        if let Some(out) = self.require_admin(user, role) {
            return out;
        }
        if text.is_empty() {
            return vec![OutboundRender::prompt("The name cannot be empty.")];
        }
        let Some(current) = fetch!(self, user, self.repository.find_specialization(specialization))
        else {
            self.sessions.clear(user);
            return vec![OutboundRender::prompt(
                "That specialization is no longer available.",
            )];
        };
        // Renaming to the current name is a no-op, no write and no audit.
        if current.name == text {
            self.sessions.clear(user);
            return vec![OutboundRender::prompt("The name is unchanged.")];
        }
        match self.repository.rename_specialization(specialization, text) {
            Ok(()) => {
                self.sessions.clear(user);
                audit::record(
                    self.repository.as_ref(),
                    "specialization renamed",
                    &format!("{} to {}", current.name, text),
                );
                vec![OutboundRender::prompt(format!("Renamed to {text}."))]
            }
            Err(RepositoryError::Conflict) => vec![OutboundRender::prompt(
                "Another specialization already has that name. Send a different one.",
            )],
            Err(error) => self.repo_failure(user, error),
        }
    }

    pub(crate) fn specialization_delete_gate(
        &self,
        user: UserId,
        specialization: SpecializationId,
    ) -> Vec<OutboundRender> {
        let Some(found) = fetch!(self, user, self.repository.find_specialization(specialization))
        else {
            return vec![OutboundRender::prompt(
                "That specialization is no longer available.",
            )];
        };
        let counts = fetch!(self, user, self.repository.cascade_counts(specialization));
        vec![OutboundRender::menu(
            format!(
                "Deleting {} also removes {} subjects, {} accounts, {} students and {} requests. \
                 This cannot be undone.",
                found.name, counts.subjects, counts.accounts, counts.students, counts.requests
            ),
            vec![
                Choice::new(
                    "Yes, delete everything",
                    ChoiceToken::SpecializationDeleteConfirm(specialization),
                ),
                Choice::new("No, keep it", ChoiceToken::Cancel),
            ],
        )]
    }

    pub(crate) fn specialization_delete(
        &self,
        user: UserId,
        specialization: SpecializationId,
    ) -> Vec<OutboundRender> {
        let Some(found) = fetch!(self, user, self.repository.find_specialization(specialization))
        else {
            return vec![OutboundRender::prompt(
                "That specialization is no longer available.",
            )];
        };
        let counts = fetch!(self, user, self.repository.delete_specialization(specialization));
        audit::record(
            self.repository.as_ref(),
            "specialization deleted",
            &format!(
                "{} with {} subjects, {} accounts, {} students, {} requests",
                found.name, counts.subjects, counts.accounts, counts.students, counts.requests
            ),
        );
        vec![OutboundRender::prompt(format!(
            "{} and everything under it is gone.",
            found.name
        ))]
    }

    pub(crate) fn subjects_menu(
        &self,
        user: UserId,
        specialization: SpecializationId,
    ) -> Vec<OutboundRender> {
        let Some(found) = fetch!(self, user, self.repository.find_specialization(specialization))
        else {
            return vec![OutboundRender::prompt(
                "That specialization is no longer available.",
            )];
        };
        let subjects = fetch!(self, user, self.repository.subjects_of(specialization));
        let mut choices = Vec::new();
        for subject in &subjects {
            choices.push(Choice::new(
                format!("Rename {}", subject.name),
                ChoiceToken::SubjectEdit(subject.id),
            ));
            choices.push(Choice::new(
                format!("Delete {}", subject.name),
                ChoiceToken::SubjectDelete(subject.id),
            ));
        }
        choices.push(Choice::new(
            "Add a subject",
            ChoiceToken::SubjectAdd(specialization),
        ));
        choices.push(Choice::new(CANCEL_LABEL, ChoiceToken::Cancel));
        vec![OutboundRender::menu(
            format!("Subjects of {}.", found.name),
            choices,
        )]
    }

    pub(crate) fn begin_subject_add(
        &self,
        user: UserId,
        specialization: SpecializationId,
    ) -> Vec<OutboundRender> {
        if fetch!(self, user, self.repository.find_specialization(specialization)).is_none() {
            return vec![OutboundRender::prompt(
                "That specialization is no longer available.",
            )];
        }
        self.sessions
            .set(user, FlowState::AwaitingSubjectName { specialization });
        vec![OutboundRender::prompt("Send the name of the new subject.")]
    }

    pub(crate) fn subject_name_entered(
        &self,
        user: UserId,
        role: Role,
        specialization: SpecializationId,
        text: &str,
    ) -> Vec<OutboundRender> {
        if let Some(out) = self.require_admin(user, role) {
            return out;
        }
        if text.is_empty() {
            return vec![OutboundRender::prompt("The name cannot be empty.")];
        }
        match self.repository.insert_subject(specialization, text) {
            Ok(subject) => {
                self.sessions.clear(user);
                audit::record(self.repository.as_ref(), "subject added", &subject.name);
                vec![OutboundRender::prompt(format!("Added {}.", subject.name))]
            }
            Err(RepositoryError::Conflict) => vec![OutboundRender::prompt(
                "This specialization already has a subject with that name. Send another.",
            )],
            Err(error) => self.repo_failure(user, error),
        }
    }

    pub(crate) fn begin_subject_rename(
        &self,
        user: UserId,
        subject: SubjectId,
    ) -> Vec<OutboundRender> {
        let Some(found) = fetch!(self, user, self.repository.find_subject(subject)) else {
            return vec![OutboundRender::prompt("That subject is no longer available.")];
        };
        self.sessions
            .set(user, FlowState::AwaitingSubjectRename { subject });
        vec![OutboundRender::prompt(format!(
            "Send the new name for {}.",
            found.name
        ))]
    }

    pub(crate) fn subject_rename_entered(
        &self,
        user: UserId,
        role: Role,
        subject: SubjectId,
        text: &str,
    ) -> Vec<OutboundRender> {
        if let Some(out) = self.require_admin(user, role) {
            return out;
        }
        if text.is_empty() {
            return vec![OutboundRender::prompt("The name cannot be empty.")];
        }
        let Some(current) = fetch!(self, user, self.repository.find_subject(subject)) else {
            self.sessions.clear(user);
            return vec![OutboundRender::prompt("That subject is no longer available.")];
        };
        if current.name == text {
            self.sessions.clear(user);
            return vec![OutboundRender::prompt("The name is unchanged.")];
        }
        match self.repository.rename_subject(subject, text) {
            Ok(()) => {
                self.sessions.clear(user);
                audit::record(
                    self.repository.as_ref(),
                    "subject renamed",
                    &format!("{} to {}", current.name, text),
                );
                vec![OutboundRender::prompt(format!("Renamed to {text}."))]
            }
            Err(RepositoryError::Conflict) => vec![OutboundRender::prompt(
                "This specialization already has a subject with that name. Send a different one.",
            )],
            Err(error) => self.repo_failure(user, error),
        }
    }

    pub(crate) fn subject_delete_gate(
        &self,
        user: UserId,
        subject: SubjectId,
    ) -> Vec<OutboundRender> {
        let Some(found) = fetch!(self, user, self.repository.find_subject(subject)) else {
            return vec![OutboundRender::prompt("That subject is no longer available.")];
        };
        let (_, total) = fetch!(
            self,
            user,
            self.repository
                .requests_for_subject(found.specialization_id, subject, 0, 0)
        );
        vec![OutboundRender::menu(
            format!(
                "Deleting {} also deactivates its {} active requests.",
                found.name, total
            ),
            vec![
                Choice::new(
                    "Yes, delete it",
                    ChoiceToken::SubjectDeleteConfirm(subject),
                ),
                Choice::new("No, keep it", ChoiceToken::Cancel),
            ],
        )]
    }

    pub(crate) fn subject_delete(&self, user: UserId, subject: SubjectId) -> Vec<OutboundRender> {
        let Some(found) = fetch!(self, user, self.repository.find_subject(subject)) else {
            return vec![OutboundRender::prompt("That subject is no longer available.")];
        };
        let deactivated = fetch!(self, user, self.repository.delete_subject(subject));
        audit::record(
            self.repository.as_ref(),
            "subject deleted",
            &format!("{} with {} requests deactivated", found.name, deactivated),
        );
        vec![OutboundRender::prompt(format!("{} is gone.", found.name))]
    }
}
