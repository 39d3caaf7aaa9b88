//! Admin request browsing, bulk deactivation, account moderation, student
//! listing and search, and audit review.

use super::{fetch, Engine, FlowState, CANCEL_LABEL, PERMISSION_DENIED};
use crate::audit;
use crate::domain::{AccountId, RequestId, RequestView, Role, SpecializationId, SubjectId, UserId};
use crate::events::{Choice, OutboundRender};
use crate::pagination::{
    self, AUDIT_LIMIT, MODERATION_LIMIT, RECENT_REQUEST_LIMIT, REQUEST_PAGE_SIZE, SEARCH_LIMIT,
    STUDENT_PAGE_SIZE,
};
use crate::repository::Repository;
use crate::token::ChoiceToken;

fn request_card(view: &RequestView) -> String {
    let details = if view.details.is_empty() {
        "no extra details".to_string()
    } else {
        view.details.clone()
    };
    format!(
        "#{} {} ({}): {} class {} with {}. {}",
        view.id.0,
        view.owner_name,
        view.owner_phone,
        view.subject_name,
        view.class_number,
        view.professor_name,
        details
    )
}

impl<R: Repository> Engine<R> {
    pub(crate) fn begin_browse(&self, user: UserId) -> Vec<OutboundRender> {
        let specializations = fetch!(self, user, self.repository.list_specializations());
        if specializations.is_empty() {
            return vec![OutboundRender::prompt("No specializations on record.")];
        }
        let mut choices: Vec<Choice> = specializations
            .into_iter()
            .map(|spec| Choice::new(spec.name, ChoiceToken::BrowseSpecialization(spec.id)))
            .collect();
        choices.push(Choice::new(CANCEL_LABEL, ChoiceToken::Cancel));
        vec![OutboundRender::menu("Browse requests where?", choices)]
    }

    pub(crate) fn browse_specialization(
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
        if subjects.is_empty() {
            return vec![OutboundRender::prompt(format!(
                "{} has no subjects yet.",
                found.name
            ))];
        }
        let mut choices: Vec<Choice> = subjects
            .into_iter()
            .map(|subject| {
                Choice::new(
                    subject.name,
                    ChoiceToken::BrowsePage(specialization, subject.id, 0),
                )
            })
            .collect();
        choices.push(Choice::new(
            "Deactivate every request here",
            ChoiceToken::PurgeSpecialization(specialization),
        ));
        choices.push(Choice::new(CANCEL_LABEL, ChoiceToken::Cancel));
        vec![OutboundRender::menu(
            format!("Subjects of {}.", found.name),
            choices,
        )]
    }

    pub(crate) fn browse_page(
        &self,
        user: UserId,
        specialization: SpecializationId,
        subject: SubjectId,
        page: usize,
    ) -> Vec<OutboundRender> {
        let window_probe = fetch!(
            self,
            user,
            self.repository
                .requests_for_subject(specialization, subject, 0, 0)
        );
        let total = window_probe.1;
        if total == 0 {
            return vec![OutboundRender::prompt(
                "No active requests for that subject.",
            )];
        }
        let window = pagination::page(total, page, REQUEST_PAGE_SIZE);
        let (views, _) = fetch!(
            self,
            user,
            self.repository.requests_for_subject(
                specialization,
                subject,
                window.offset,
                REQUEST_PAGE_SIZE,
            )
        );
        let body = views
            .iter()
            .map(request_card)
            .collect::<Vec<_>>()
            .join("\n");

        let mut choices = Vec::new();
        if window.has_prev {
            choices.push(Choice::new(
                "Previous page",
                ChoiceToken::BrowsePage(specialization, subject, page - 1),
            ));
        }
        if window.has_next {
            choices.push(Choice::new(
                "Next page",
                ChoiceToken::BrowsePage(specialization, subject, page + 1),
            ));
        }
        choices.push(Choice::new(
            "Deactivate every request here",
            ChoiceToken::PurgeSubject(specialization, subject),
        ));
        choices.push(Choice::new(CANCEL_LABEL, ChoiceToken::Cancel));
        vec![OutboundRender::menu(body, choices)]
    }

    pub(crate) fn purge_subject_gate(
        &self,
        user: UserId,
        specialization: SpecializationId,
        subject: SubjectId,
    ) -> Vec<OutboundRender> {
        let (_, total) = fetch!(
            self,
            user,
            self.repository
                .requests_for_subject(specialization, subject, 0, 0)
        );
        vec![OutboundRender::menu(
            format!("Deactivate all {total} active requests for this subject?"),
            vec![
                Choice::new(
                    "Yes, deactivate them",
                    ChoiceToken::PurgeSubjectConfirm(specialization, subject),
                ),
                Choice::new("No, keep them", ChoiceToken::Cancel),
            ],
        )]
    }

    pub(crate) fn purge_subject(
        &self,
        user: UserId,
        _specialization: SpecializationId,
        subject: SubjectId,
    ) -> Vec<OutboundRender> {
        let touched = fetch!(
            self,
            user,
            self.repository.deactivate_requests_for_subject(subject)
        );
        audit::record(
            self.repository.as_ref(),
            "subject requests purged",
            &format!("subject {} ({} requests)", subject.0, touched),
        );
        vec![OutboundRender::prompt(format!(
            "Deactivated {touched} requests."
        ))]
    }

    pub(crate) fn purge_specialization_gate(
        &self,
        user: UserId,
        specialization: SpecializationId,
    ) -> Vec<OutboundRender> {
        let counts = fetch!(self, user, self.repository.cascade_counts(specialization));
        vec![OutboundRender::menu(
            format!(
                "Deactivate all requests in this specialization ({} on record)?",
                counts.requests
            ),
            vec![
                Choice::new(
                    "Yes, deactivate them",
                    ChoiceToken::PurgeSpecializationConfirm(specialization),
                ),
                Choice::new("No, keep them", ChoiceToken::Cancel),
            ],
        )]
    }

    pub(crate) fn purge_specialization(
        &self,
        user: UserId,
        specialization: SpecializationId,
    ) -> Vec<OutboundRender> {
        let touched = fetch!(
            self,
            user,
            self.repository
                .deactivate_requests_for_specialization(specialization)
        );
        audit::record(
            self.repository.as_ref(),
            "specialization requests purged",
            &format!("specialization {} ({} requests)", specialization.0, touched),
        );
        vec![OutboundRender::prompt(format!(
            "Deactivated {touched} requests."
        ))]
    }

    pub(crate) fn begin_admin_delete(&self, user: UserId) -> Vec<OutboundRender> {
        let recent = fetch!(
            self,
            user,
            self.repository.recent_active_requests(RECENT_REQUEST_LIMIT)
        );
        if recent.is_empty() {
            return vec![OutboundRender::prompt("No active requests anywhere.")];
        }
        let mut choices: Vec<Choice> = recent
            .iter()
            .map(|view| {
                Choice::new(
                    format!("#{} {}: {}", view.id.0, view.owner_name, view.subject_name),
                    ChoiceToken::AdminDeletePick(view.id),
                )
            })
            .collect();
        choices.push(Choice::new(CANCEL_LABEL, ChoiceToken::Cancel));
        vec![OutboundRender::menu("Delete which request?", choices)]
    }

    pub(crate) fn admin_delete_gate(
        &self,
        user: UserId,
        request: RequestId,
    ) -> Vec<OutboundRender> {
        match self.repository.find_request(request) {
            Ok(Some(found)) if found.is_active => vec![OutboundRender::menu(
                format!(
                    "Delete request #{} (class {} with {})?",
                    found.id.0, found.class_number, found.professor_name
                ),
                vec![
                    Choice::new("Yes, delete it", ChoiceToken::AdminDeleteConfirm(request)),
                    Choice::new("No, keep it", ChoiceToken::Cancel),
                ],
            )],
            Ok(_) => vec![OutboundRender::prompt(
                "That request is no longer available.",
            )],
            Err(error) => self.repo_failure(user, error),
        }
    }

    pub(crate) fn admin_delete(&self, user: UserId, request: RequestId) -> Vec<OutboundRender> {
        fetch!(self, user, self.repository.deactivate_request(request));
        audit::record(
            self.repository.as_ref(),
            "request deleted by admin",
            &format!("request {}", request.0),
        );
        vec![OutboundRender::prompt("The request is gone.")]
    }

    pub(crate) fn students_page(&self, user: UserId, page: usize) -> Vec<OutboundRender> {
        let probe = fetch!(self, user, self.repository.list_accounts(0, 0));
        let total = probe.1;
        if total == 0 {
            return vec![OutboundRender::prompt("No accounts on record.")];
        }
        let window = pagination::page(total, page, STUDENT_PAGE_SIZE);
        let (accounts, _) = fetch!(
            self,
            user,
            self.repository.list_accounts(window.offset, STUDENT_PAGE_SIZE)
        );
        let body = accounts
            .iter()
            .map(|account| {
                let state = if account.is_active { "active" } else { "disabled" };
                format!("#{} {} ({}) {}", account.id.0, account.name, account.phone, state)
            })
            .collect::<Vec<_>>()
            .join("\n");

        let mut choices = Vec::new();
        if window.has_prev {
            choices.push(Choice::new(
                "Previous page",
                ChoiceToken::StudentsPage(page - 1),
            ));
        }
        if window.has_next {
            choices.push(Choice::new("Next page", ChoiceToken::StudentsPage(page + 1)));
        }
        choices.push(Choice::new(CANCEL_LABEL, ChoiceToken::Cancel));
        vec![OutboundRender::menu(body, choices)]
    }

    pub(crate) fn begin_search(&self, user: UserId) -> Vec<OutboundRender> {
        self.sessions.set(user, FlowState::AwaitingSearchTerm);
        vec![OutboundRender::prompt(
            "Send part of a name or phone number to search for.",
        )]
    }

    pub(crate) fn search_term_entered(
        &self,
        user: UserId,
        role: Role,
        text: &str,
    ) -> Vec<OutboundRender> {
        if role != Role::Admin {
            self.sessions.clear(user);
            return vec![OutboundRender::prompt(PERMISSION_DENIED)];
        }
        if text.is_empty() {
            return vec![OutboundRender::prompt("The search term cannot be empty.")];
        }
        let hits = fetch!(self, user, self.repository.search_accounts(text, SEARCH_LIMIT));
        self.sessions.clear(user);
        if hits.is_empty() {
            return vec![OutboundRender::prompt("No accounts match that.")];
        }
        let body = hits
            .iter()
            .map(|account| {
                let state = if account.is_active { "active" } else { "disabled" };
                format!("#{} {} ({}) {}", account.id.0, account.name, account.phone, state)
            })
            .collect::<Vec<_>>()
            .join("\n");
        vec![OutboundRender::prompt(body)]
    }

    /// Lists accounts in the given activation state so the opposite state
    /// can be applied to one of them.
    pub(crate) fn moderation_list(&self, user: UserId, currently_active: bool) -> Vec<OutboundRender> {
        let accounts = fetch!(
            self,
            user,
            self.repository
                .accounts_by_state(currently_active, MODERATION_LIMIT)
        );
        if accounts.is_empty() {
            let text = if currently_active {
                "No active accounts to disable."
            } else {
                "No disabled accounts to enable."
            };
            return vec![OutboundRender::prompt(text)];
        }
        let mut choices: Vec<Choice> = accounts
            .iter()
            .map(|account| {
                let token = if currently_active {
                    ChoiceToken::DisableAccount(account.id)
                } else {
                    ChoiceToken::EnableAccount(account.id)
                };
                Choice::new(format!("{} ({})", account.name, account.phone), token)
            })
            .collect();
        choices.push(Choice::new(CANCEL_LABEL, ChoiceToken::Cancel));
        let text = if currently_active {
            "Disable which account?"
        } else {
            "Enable which account?"
        };
        vec![OutboundRender::menu(text, choices)]
    }

    pub(crate) fn moderation_gate(
        &self,
        user: UserId,
        account: AccountId,
        make_active: bool,
    ) -> Vec<OutboundRender> {
        let Some(found) = fetch!(self, user, self.repository.find_account(account)) else {
            return vec![OutboundRender::prompt("That account is no longer available.")];
        };
        let verb = if make_active { "Enable" } else { "Disable" };
        let confirm = if make_active {
            ChoiceToken::EnableAccountConfirm(account)
        } else {
            ChoiceToken::DisableAccountConfirm(account)
        };
        vec![OutboundRender::menu(
            format!("{} {} ({})?", verb, found.name, found.phone),
            vec![
                Choice::new(format!("Yes, {}", verb.to_lowercase()), confirm),
                Choice::new("No, leave it", ChoiceToken::Cancel),
            ],
        )]
    }

    pub(crate) fn moderation_apply(
        &self,
        user: UserId,
        account: AccountId,
        make_active: bool,
    ) -> Vec<OutboundRender> {
        fetch!(
            self,
            user,
            self.repository.set_account_active(account, make_active)
        );
        let action = if make_active {
            "account enabled"
        } else {
            "account disabled"
        };
        audit::record(
            self.repository.as_ref(),
            action,
            &format!("account {}", account.0),
        );
        let text = if make_active {
            "The account is active again."
        } else {
            "The account is disabled."
        };
        vec![OutboundRender::prompt(text)]
    }

    pub(crate) fn audit_review(&self, user: UserId) -> Vec<OutboundRender> {
        let entries = fetch!(self, user, self.repository.recent_audit(AUDIT_LIMIT));
        if entries.is_empty() {
            return vec![OutboundRender::prompt("The audit trail is empty.")];
        }
        let body = entries
            .iter()
            .map(|entry| {
                format!(
                    "{} {}: {}",
                    entry.created_at.format("%Y-%m-%d %H:%M"),
                    entry.action,
                    entry.details
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        vec![OutboundRender::prompt(body)]
    }
}
