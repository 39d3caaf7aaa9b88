//! Conversation flow engine.
//!
//! [`Engine::handle`] is the single entry point: it resolves the caller's
//! role, routes slash commands, decodes choice tokens, and feeds freeform
//! text into whichever flow the caller's session is in. Steps whose entire
//! context fits in a token (pickers, confirmation gates) are stateless;
//! only steps waiting for typed input hold a session.

mod admin;
mod browse;
mod registration;
mod requests;
mod taxonomy;

use std::sync::Arc;
use std::time::Duration;

use tracing::error;

use crate::access::resolve_role;
use crate::domain::{RequestField, RequestId, Role, SpecializationId, SubjectId, UserId};
use crate::events::{EventKind, InboundEvent, OutboundRender};
use crate::repository::{Repository, RepositoryError};
use crate::session::SessionStore;
use crate::token::ChoiceToken;

/// Conversation position for one identity. Each variant carries exactly the
/// data collected so far and still needed to finish the flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowState {
    // Registration.
    AwaitingContact,
    AwaitingFullName,
    AwaitingUsername {
        full_name: String,
    },
    AwaitingRegistrationSpecialization {
        full_name: String,
        username: String,
    },

    // Job-request creation.
    AwaitingClassNumber {
        subject: SubjectId,
    },
    AwaitingProfessorName {
        subject: SubjectId,
        class_number: String,
    },
    AwaitingDetails {
        subject: SubjectId,
        class_number: String,
        professor_name: String,
    },

    // Job-request edit.
    AwaitingFieldValue {
        request: RequestId,
        field: RequestField,
    },

    // Taxonomy management.
    AwaitingSpecializationName,
    AwaitingSpecializationRename {
        specialization: SpecializationId,
    },
    AwaitingSubjectName {
        specialization: SpecializationId,
    },
    AwaitingSubjectRename {
        subject: SubjectId,
    },

    // Student search.
    AwaitingSearchTerm,
}

pub struct Engine<R> {
    pub(crate) repository: Arc<R>,
    pub(crate) sessions: SessionStore<FlowState>,
}

pub(crate) const GENERIC_FAILURE: &str = "Something went wrong. Please try again later.";
pub(crate) const PERMISSION_DENIED: &str = "You are not allowed to do that.";
pub(crate) const UNEXPECTED_INPUT: &str =
    "I did not expect that here. Send /start to see what you can do.";
pub(crate) const CANCELLED: &str = "Cancelled. Nothing was changed.";

/// Abort every flow, propagated through menus as the universal "no".
pub(crate) const CANCEL_LABEL: &str = "Cancel";

impl<R: Repository> Engine<R> {
    pub fn new(repository: Arc<R>, session_ttl: Duration) -> Self {
        Self {
            repository,
            sessions: SessionStore::new(session_ttl),
        }
    }

    /// Reclaims idle sessions; intended to be driven on a timer by the host.
    pub fn sweep_sessions(&self) -> usize {
        self.sessions.sweep()
    }

    pub fn handle(&self, event: InboundEvent) -> Vec<OutboundRender> {
        let user = event.user;
        let role = match resolve_role(self.repository.as_ref(), user) {
            Ok(role) => role,
            Err(error) => return self.repo_failure(user, error),
        };

        match event.kind {
            EventKind::Text(text) => self.on_text(user, role, text.trim()),
            EventKind::ContactShare(phone) => self.on_contact(user, role, &phone),
            EventKind::Choice(raw) => self.on_choice(user, role, &raw),
        }
    }

    fn on_text(&self, user: UserId, role: Role, text: &str) -> Vec<OutboundRender> {
        if let Some(command) = text.strip_prefix('/') {
            return self.on_command(user, role, command);
        }
        match self.sessions.get(user) {
            Some(FlowState::AwaitingFullName) => self.full_name_entered(user, text),
            Some(FlowState::AwaitingUsername { full_name }) => {
                self.username_entered(user, full_name, text)
            }
            Some(FlowState::AwaitingClassNumber { subject }) => {
                self.class_number_entered(user, subject, text)
            }
            Some(FlowState::AwaitingProfessorName {
                subject,
                class_number,
            }) => self.professor_entered(user, subject, class_number, text),
            Some(FlowState::AwaitingDetails {
                subject,
                class_number,
                professor_name,
            }) => self.details_entered(user, subject, class_number, professor_name, text),
            Some(FlowState::AwaitingFieldValue { request, field }) => {
                self.field_value_entered(user, request, field, text)
            }
            Some(FlowState::AwaitingSpecializationName) => {
                self.specialization_name_entered(user, role, text)
            }
            Some(FlowState::AwaitingSpecializationRename { specialization }) => {
                self.specialization_rename_entered(user, role, specialization, text)
            }
            Some(FlowState::AwaitingSubjectName { specialization }) => {
                self.subject_name_entered(user, role, specialization, text)
            }
            Some(FlowState::AwaitingSubjectRename { subject }) => {
                self.subject_rename_entered(user, role, subject, text)
            }
            Some(FlowState::AwaitingContact)
            | Some(FlowState::AwaitingRegistrationSpecialization { .. }) => self.unexpected(),
            Some(FlowState::AwaitingSearchTerm) => self.search_term_entered(user, role, text),
            None => self.unexpected(),
        }
    }

    fn on_command(&self, user: UserId, role: Role, command: &str) -> Vec<OutboundRender> {
        match command {
            "cancel" => {
                self.sessions.clear(user);
                vec![OutboundRender::prompt(CANCELLED)]
            }
            "start" => self.start(user, role),
            // Student surface.
            "new" => self.student_only(user, role, |engine| engine.begin_new_request(user)),
            "edit" => self.student_only(user, role, |engine| engine.begin_edit_request(user)),
            "delete" => self.student_only(user, role, |engine| engine.begin_delete_request(user)),
            "partners" => self.student_only(user, role, |engine| engine.begin_partners(user)),
            // Admin surface.
            "requests" => self.admin_only(user, role, |engine| engine.begin_browse(user)),
            "delete_request" => {
                self.admin_only(user, role, |engine| engine.begin_admin_delete(user))
            }
            "students" => self.admin_only(user, role, |engine| engine.students_page(user, 0)),
            "search" => self.admin_only(user, role, |engine| engine.begin_search(user)),
            "disable" => self.admin_only(user, role, |engine| engine.moderation_list(user, true)),
            "enable" => self.admin_only(user, role, |engine| engine.moderation_list(user, false)),
            "specs" => self.admin_only(user, role, |engine| engine.specializations_menu(user)),
            "audit" => self.admin_only(user, role, |engine| engine.audit_review(user)),
            _ => self.unexpected(),
        }
    }

    fn on_choice(&self, user: UserId, role: Role, raw: &str) -> Vec<OutboundRender> {
        let token = match ChoiceToken::decode(raw) {
            Ok(token) => token,
            Err(_) => return self.unexpected(),
        };
        match token {
            ChoiceToken::Cancel => {
                self.sessions.clear(user);
                vec![OutboundRender::prompt(CANCELLED)]
            }
            ChoiceToken::RegisterSpecialization(specialization) => {
                self.registration_specialization_chosen(user, specialization)
            }

            ChoiceToken::NewRequestSubject(subject) => {
                self.student_only(user, role, |engine| engine.subject_chosen(user, subject))
            }
            ChoiceToken::EditRequestPick(request) => {
                self.student_only(user, role, |engine| engine.edit_pick(user, request))
            }
            ChoiceToken::EditRequestField(request, field) => self
                .student_only(user, role, |engine| {
                    engine.edit_field_chosen(user, request, field)
                }),
            ChoiceToken::DeleteRequestPick(request) => {
                self.student_only(user, role, |engine| engine.delete_pick(user, request))
            }
            ChoiceToken::DeleteRequestConfirm(request) => {
                self.student_only(user, role, |engine| engine.delete_confirm(user, request))
            }
            ChoiceToken::PartnersSubject(subject) => self
                .student_only(user, role, |engine| {
                    engine.partners_for_subject(user, subject)
                }),
            ChoiceToken::ContactPartner(request) => {
                self.student_only(user, role, |engine| engine.contact_partner(user, request))
            }

            ChoiceToken::BrowseSpecialization(specialization) => self
                .admin_only(user, role, |engine| {
                    engine.browse_specialization(user, specialization)
                }),
            ChoiceToken::BrowsePage(specialization, subject, page) => {
                self.admin_only(user, role, |engine| {
                    engine.browse_page(user, specialization, subject, page)
                })
            }
            ChoiceToken::PurgeSubject(specialization, subject) => {
                self.admin_only(user, role, |engine| {
                    engine.purge_subject_gate(user, specialization, subject)
                })
            }
            ChoiceToken::PurgeSubjectConfirm(specialization, subject) => {
                self.admin_only(user, role, |engine| {
                    engine.purge_subject(user, specialization, subject)
                })
            }
            ChoiceToken::PurgeSpecialization(specialization) => {
                self.admin_only(user, role, |engine| {
                    engine.purge_specialization_gate(user, specialization)
                })
            }
            ChoiceToken::PurgeSpecializationConfirm(specialization) => {
                self.admin_only(user, role, |engine| {
                    engine.purge_specialization(user, specialization)
                })
            }
            ChoiceToken::AdminDeletePick(request) => {
                self.admin_only(user, role, |engine| engine.admin_delete_gate(user, request))
            }
            ChoiceToken::AdminDeleteConfirm(request) => {
                self.admin_only(user, role, |engine| engine.admin_delete(user, request))
            }
            ChoiceToken::StudentsPage(page) => {
                self.admin_only(user, role, |engine| engine.students_page(user, page))
            }
            ChoiceToken::DisableAccount(account) => self.admin_only(user, role, |engine| {
                engine.moderation_gate(user, account, false)
            }),
            ChoiceToken::DisableAccountConfirm(account) => self
                .admin_only(user, role, |engine| {
                    engine.moderation_apply(user, account, false)
                }),
            ChoiceToken::EnableAccount(account) => {
                self.admin_only(user, role, |engine| engine.moderation_gate(user, account, true))
            }
            ChoiceToken::EnableAccountConfirm(account) => self
                .admin_only(user, role, |engine| {
                    engine.moderation_apply(user, account, true)
                }),

            ChoiceToken::SpecializationAdd => {
                self.admin_only(user, role, |engine| engine.begin_specialization_add(user))
            }
            ChoiceToken::SpecializationEdit(specialization) => {
                self.admin_only(user, role, |engine| {
                    engine.begin_specialization_rename(user, specialization)
                })
            }
            ChoiceToken::SpecializationDelete(specialization) => {
                self.admin_only(user, role, |engine| {
                    engine.specialization_delete_gate(user, specialization)
                })
            }
            ChoiceToken::SpecializationDeleteConfirm(specialization) => {
                self.admin_only(user, role, |engine| {
                    engine.specialization_delete(user, specialization)
                })
            }
            ChoiceToken::ManageSubjects(specialization) => self
                .admin_only(user, role, |engine| {
                    engine.subjects_menu(user, specialization)
                }),
            ChoiceToken::SubjectAdd(specialization) => self.admin_only(user, role, |engine| {
                engine.begin_subject_add(user, specialization)
            }),
            ChoiceToken::SubjectEdit(subject) => {
                self.admin_only(user, role, |engine| engine.begin_subject_rename(user, subject))
            }
            ChoiceToken::SubjectDelete(subject) => {
                self.admin_only(user, role, |engine| engine.subject_delete_gate(user, subject))
            }
            ChoiceToken::SubjectDeleteConfirm(subject) => {
                self.admin_only(user, role, |engine| engine.subject_delete(user, subject))
            }
        }
    }

    fn on_contact(&self, user: UserId, _role: Role, phone: &str) -> Vec<OutboundRender> {
        match self.sessions.get(user) {
            Some(FlowState::AwaitingContact) => self.contact_shared(user, phone),
            _ => self.unexpected(),
        }
    }

    fn start(&self, user: UserId, role: Role) -> Vec<OutboundRender> {
        match role {
            Role::Admin => vec![OutboundRender::prompt(
                "Admin console. Commands: /requests, /delete_request, /students, /search, \
                 /disable, /enable, /specs, /audit.",
            )],
            Role::RegisteredStudent => vec![OutboundRender::prompt(
                "Welcome back. Commands: /new to post a request, /edit to change one, \
                 /delete to remove one, /partners to find study partners.",
            )],
            Role::Unregistered => self.begin_registration(user),
        }
    }

    fn student_only(
        &self,
        _user: UserId,
        role: Role,
        action: impl FnOnce(&Self) -> Vec<OutboundRender>,
    ) -> Vec<OutboundRender> {
        match role {
            Role::RegisteredStudent | Role::Admin => action(self),
            Role::Unregistered => vec![OutboundRender::prompt(PERMISSION_DENIED)],
        }
    }

    fn admin_only(
        &self,
        _user: UserId,
        role: Role,
        action: impl FnOnce(&Self) -> Vec<OutboundRender>,
    ) -> Vec<OutboundRender> {
        if role == Role::Admin {
            action(self)
        } else {
            vec![OutboundRender::prompt(PERMISSION_DENIED)]
        }
    }

    pub(crate) fn unexpected(&self) -> Vec<OutboundRender> {
        vec![OutboundRender::prompt(UNEXPECTED_INPUT)]
    }

    /// Terminal handling for repository errors that reach the engine. The
    /// session is cleared so the caller restarts from a known state.
    pub(crate) fn repo_failure(&self, user: UserId, error: RepositoryError) -> Vec<OutboundRender> {
        self.sessions.clear(user);
        match error {
            RepositoryError::NotFound => {
                vec![OutboundRender::prompt("That item is no longer available.")]
            }
            RepositoryError::Conflict => {
                vec![OutboundRender::prompt("That name is already in use.")]
            }
            RepositoryError::Unavailable(reason) => {
                error!(%user, %reason, "repository unavailable, aborting flow");
                vec![OutboundRender::prompt(GENERIC_FAILURE)]
            }
        }
    }
}

/// Maps a repository result or bails out with [`Engine::repo_failure`].
macro_rules! fetch {
    ($engine:expr, $user:expr, $result:expr) => {
        match $result {
            Ok(value) => value,
            Err(error) => return $engine.repo_failure($user, error),
        }
    };
}
pub(crate) use fetch;
