//! Student-facing job-request lifecycle: create, edit one field, delete.

use super::{fetch, Engine, FlowState, CANCEL_LABEL};
use crate::audit;
use crate::domain::{JobRequest, RequestField, RequestId, SubjectId, UserId};
use crate::events::{Choice, OutboundRender};
use crate::repository::Repository;
use crate::token::ChoiceToken;

/// What students type when a request has nothing extra to say.
pub(crate) const NO_DETAILS_SENTINEL: &str = "لا يوجد";

fn summary(request: &JobRequest) -> String {
    format!(
        "class {} with {}",
        request.class_number, request.professor_name
    )
}

impl<R: Repository> Engine<R> {
    /// The caller's specialization, or a message telling them to register.
    pub(crate) fn caller_specialization(
        &self,
        user: UserId,
    ) -> Result<crate::domain::SpecializationId, Vec<OutboundRender>> {
        match self.repository.student_specialization(user) {
            Ok(Some(specialization)) => Ok(specialization),
            Ok(None) => Err(vec![OutboundRender::prompt(
                "You need a completed registration with a specialization for that.",
            )]),
            Err(error) => Err(self.repo_failure(user, error)),
        }
    }

    /// The request, if it exists, is active, and belongs to the caller.
    /// Stale picks (already deleted, someone else's) all get the same reply.
    fn owned_active_request(
        &self,
        user: UserId,
        request: RequestId,
    ) -> Result<JobRequest, Vec<OutboundRender>> {
        match self.repository.find_request(request) {
            Ok(Some(found)) if found.user_id == user && found.is_active => Ok(found),
            Ok(_) => Err(vec![OutboundRender::prompt(
                "That request is no longer available.",
            )]),
            Err(error) => Err(self.repo_failure(user, error)),
        }
    }

    pub(crate) fn begin_new_request(&self, user: UserId) -> Vec<OutboundRender> {
        let specialization = match self.caller_specialization(user) {
            Ok(specialization) => specialization,
            Err(out) => return out,
        };
        let subjects = fetch!(self, user, self.repository.subjects_of(specialization));
        if subjects.is_empty() {
            return vec![OutboundRender::prompt(
                "Your specialization has no subjects yet. Please try again later.",
            )];
        }
        let mut choices: Vec<Choice> = subjects
            .into_iter()
            .map(|subject| Choice::new(subject.name, ChoiceToken::NewRequestSubject(subject.id)))
            .collect();
        choices.push(Choice::new(CANCEL_LABEL, ChoiceToken::Cancel));
        vec![OutboundRender::menu(
            "Which subject is the request for?",
            choices,
        )]
    }

    pub(crate) fn subject_chosen(&self, user: UserId, subject: SubjectId) -> Vec<OutboundRender> {
        let specialization = match self.caller_specialization(user) {
            Ok(specialization) => specialization,
            Err(out) => return out,
        };
        match self.repository.find_subject(subject) {
            Ok(Some(found)) if found.specialization_id == specialization => {}
            Ok(_) => {
                return vec![OutboundRender::prompt(
                    "That subject is no longer available.",
                )]
            }
            Err(error) => return self.repo_failure(user, error),
        }
        self.sessions
            .set(user, FlowState::AwaitingClassNumber { subject });
        vec![OutboundRender::prompt("Send the class number.")]
    }

    pub(crate) fn class_number_entered(
        &self,
        user: UserId,
        subject: SubjectId,
        text: &str,
    ) -> Vec<OutboundRender> {
        if text.is_empty() {
            return vec![OutboundRender::prompt("The class number cannot be empty.")];
        }
        self.sessions.set(
            user,
            FlowState::AwaitingProfessorName {
                subject,
                class_number: text.to_string(),
            },
        );
        vec![OutboundRender::prompt("Send the professor's name.")]
    }

    pub(crate) fn professor_entered(
        &self,
        user: UserId,
        subject: SubjectId,
        class_number: String,
        text: &str,
    ) -> Vec<OutboundRender> {
        if text.is_empty() {
            return vec![OutboundRender::prompt(
                "The professor's name cannot be empty.",
            )];
        }
        self.sessions.set(
            user,
            FlowState::AwaitingDetails {
                subject,
                class_number,
                professor_name: text.to_string(),
            },
        );
        vec![OutboundRender::prompt(format!(
            "Any extra details? Send {NO_DETAILS_SENTINEL} if there are none.",
        ))]
    }

    pub(crate) fn details_entered(
        &self,
        user: UserId,
        subject: SubjectId,
        class_number: String,
        professor_name: String,
        text: &str,
    ) -> Vec<OutboundRender> {
        let details = if text == NO_DETAILS_SENTINEL { "" } else { text };
        let specialization = match self.caller_specialization(user) {
            Ok(specialization) => specialization,
            Err(out) => return out,
        };
        let request = fetch!(
            self,
            user,
            self.repository.insert_request(
                user,
                specialization,
                subject,
                &professor_name,
                &class_number,
                details,
            )
        );
        self.sessions.clear(user);
        audit::record(
            self.repository.as_ref(),
            "request created",
            &format!("request {} by user {user}", request.id.0),
        );
        vec![OutboundRender::prompt(
            "Your request is posted. Matching partners can now find it.",
        )]
    }

    pub(crate) fn begin_edit_request(&self, user: UserId) -> Vec<OutboundRender> {
        let requests = fetch!(self, user, self.repository.active_requests_of(user));
        if requests.is_empty() {
            return vec![OutboundRender::prompt("You have no active requests.")];
        }
        let mut choices: Vec<Choice> = requests
            .iter()
            .map(|request| Choice::new(summary(request), ChoiceToken::EditRequestPick(request.id)))
            .collect();
        choices.push(Choice::new(CANCEL_LABEL, ChoiceToken::Cancel));
        vec![OutboundRender::menu("Which request should change?", choices)]
    }

    pub(crate) fn edit_pick(&self, user: UserId, request: RequestId) -> Vec<OutboundRender> {
        if let Err(out) = self.owned_active_request(user, request) {
            return out;
        }
        let choices = vec![
            Choice::new(
                RequestField::ClassNumber.label(),
                ChoiceToken::EditRequestField(request, RequestField::ClassNumber),
            ),
            Choice::new(
                RequestField::ProfessorName.label(),
                ChoiceToken::EditRequestField(request, RequestField::ProfessorName),
            ),
            Choice::new(
                RequestField::Details.label(),
                ChoiceToken::EditRequestField(request, RequestField::Details),
            ),
            Choice::new(CANCEL_LABEL, ChoiceToken::Cancel),
        ];
        vec![OutboundRender::menu("Which field?", choices)]
    }

    pub(crate) fn edit_field_chosen(
        &self,
        user: UserId,
        request: RequestId,
        field: RequestField,
    ) -> Vec<OutboundRender> {
        if let Err(out) = self.owned_active_request(user, request) {
            return out;
        }
        self.sessions
            .set(user, FlowState::AwaitingFieldValue { request, field });
        vec![OutboundRender::prompt(format!(
            "Send the new {}.",
            field.label()
        ))]
    }

    pub(crate) fn field_value_entered(
        &self,
        user: UserId,
        request: RequestId,
        field: RequestField,
        text: &str,
    ) -> Vec<OutboundRender> {
        let value = if field == RequestField::Details && text == NO_DETAILS_SENTINEL {
            ""
        } else {
            text
        };
        if value.is_empty() && field != RequestField::Details {
            return vec![OutboundRender::prompt(format!(
                "The {} cannot be empty.",
                field.label()
            ))];
        }
        if let Err(out) = self.owned_active_request(user, request) {
            self.sessions.clear(user);
            return out;
        }
        fetch!(
            self,
            user,
            self.repository.update_request_field(request, field, value)
        );
        self.sessions.clear(user);
        audit::record(
            self.repository.as_ref(),
            "request edited",
            &format!("request {} field {}", request.0, field.token_tag()),
        );
        vec![OutboundRender::prompt("Updated.")]
    }

    pub(crate) fn begin_delete_request(&self, user: UserId) -> Vec<OutboundRender> {
        let requests = fetch!(self, user, self.repository.active_requests_of(user));
        if requests.is_empty() {
            return vec![OutboundRender::prompt("You have no active requests.")];
        }
        let mut choices: Vec<Choice> = requests
            .iter()
            .map(|request| {
                Choice::new(summary(request), ChoiceToken::DeleteRequestPick(request.id))
            })
            .collect();
        choices.push(Choice::new(CANCEL_LABEL, ChoiceToken::Cancel));
        vec![OutboundRender::menu("Which request should go?", choices)]
    }

    pub(crate) fn delete_pick(&self, user: UserId, request: RequestId) -> Vec<OutboundRender> {
        let found = match self.owned_active_request(user, request) {
            Ok(found) => found,
            Err(out) => return out,
        };
        vec![OutboundRender::menu(
            format!("Delete the request for {}?", summary(&found)),
            vec![
                Choice::new("Yes, delete it", ChoiceToken::DeleteRequestConfirm(request)),
                Choice::new("No, keep it", ChoiceToken::Cancel),
            ],
        )]
    }

    pub(crate) fn delete_confirm(&self, user: UserId, request: RequestId) -> Vec<OutboundRender> {
        if let Err(out) = self.owned_active_request(user, request) {
            return out;
        }
        fetch!(self, user, self.repository.deactivate_request(request));
        audit::record(
            self.repository.as_ref(),
            "request deleted",
            &format!("request {} by owner {user}", request.0),
        );
        vec![OutboundRender::prompt("The request is gone.")]
    }
}
