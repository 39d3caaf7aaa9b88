//! Registration flow: contact share, full name, username, specialization.

use std::sync::OnceLock;

use regex_lite::Regex;

use super::{fetch, Engine, FlowState, CANCEL_LABEL};
use crate::audit;
use crate::domain::{SpecializationId, UserId};
use crate::events::{Choice, OutboundRender};
use crate::repository::{Repository, RepositoryError};
use crate::token::ChoiceToken;

/// Letter groups separated by underscores, ending in an underscore and a
/// student number, e.g. `mona_said_202411`.
fn username_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new("^[a-zA-Z]+(_[a-zA-Z]+)*_[0-9]+$").expect("username pattern is valid")
    })
}

pub(crate) fn valid_username(candidate: &str) -> bool {
    username_pattern().is_match(candidate)
}

impl<R: Repository> Engine<R> {
    pub(crate) fn begin_registration(&self, user: UserId) -> Vec<OutboundRender> {
        self.sessions.set(user, FlowState::AwaitingContact);
        vec![OutboundRender::prompt(
            "Welcome! To register, please share your contact first.",
        )]
    }

    /// Contact is persisted the moment it arrives, before the rest of the
    /// flow runs. Sharing again later only overwrites the stored contact.
    pub(crate) fn contact_shared(&self, user: UserId, phone: &str) -> Vec<OutboundRender> {
        fetch!(self, user, self.repository.upsert_student_contact(user, phone));
        self.sessions.set(user, FlowState::AwaitingFullName);
        vec![OutboundRender::prompt("Thanks. Now send your full name.")]
    }

    pub(crate) fn full_name_entered(&self, user: UserId, text: &str) -> Vec<OutboundRender> {
        if text.is_empty() {
            return vec![OutboundRender::prompt("Your full name cannot be empty.")];
        }
        self.sessions.set(
            user,
            FlowState::AwaitingUsername {
                full_name: text.to_string(),
            },
        );
        vec![OutboundRender::prompt(
            "Now send your university username, like mona_said_202411.",
        )]
    }

    pub(crate) fn username_entered(
        &self,
        user: UserId,
        full_name: String,
        text: &str,
    ) -> Vec<OutboundRender> {
        if !valid_username(text) {
            // Re-prompt in place; the collected full name stays in the session.
            return vec![OutboundRender::prompt(
                "That username does not look right. Use letters separated by underscores \
                 followed by your student number, like mona_said_202411.",
            )];
        }
        if fetch!(self, user, self.repository.username_taken(text)) {
            return vec![OutboundRender::prompt(
                "That username is already taken. Try another one.",
            )];
        }

        let specializations = fetch!(self, user, self.repository.list_specializations());
        if specializations.is_empty() {
            self.sessions.clear(user);
            return vec![OutboundRender::prompt(
                "No specializations are available yet. Please try again later.",
            )];
        }

        self.sessions.set(
            user,
            FlowState::AwaitingRegistrationSpecialization {
                full_name,
                username: text.to_string(),
            },
        );
        let mut choices: Vec<Choice> = specializations
            .into_iter()
            .map(|spec| Choice::new(spec.name, ChoiceToken::RegisterSpecialization(spec.id)))
            .collect();
        choices.push(Choice::new(CANCEL_LABEL, ChoiceToken::Cancel));
        vec![OutboundRender::menu("Pick your specialization.", choices)]
    }

    pub(crate) fn registration_specialization_chosen(
        &self,
        user: UserId,
        specialization: SpecializationId,
    ) -> Vec<OutboundRender> {
        let Some(FlowState::AwaitingRegistrationSpecialization {
            full_name,
            username,
        }) = self.sessions.get(user)
        else {
            return self.unexpected();
        };

        match self
            .repository
            .complete_registration(user, &full_name, &username, specialization)
        {
            Ok(()) => {
                self.sessions.clear(user);
                audit::record(
                    self.repository.as_ref(),
                    "student registered",
                    &format!("user {user} as {username}"),
                );
                vec![OutboundRender::prompt(
                    "You are registered. Send /start to see what you can do.",
                )]
            }
            // Someone claimed the username between the check and the commit.
            Err(RepositoryError::Conflict) => {
                self.sessions
                    .set(user, FlowState::AwaitingUsername { full_name });
                vec![OutboundRender::prompt(
                    "That username was just taken. Send a different one.",
                )]
            }
            Err(error) => self.repo_failure(user, error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_usernames() {
        for candidate in ["ali_202345", "mona_said_202411", "a_b_c_1"] {
            assert!(valid_username(candidate), "rejected {candidate}");
        }
    }

    #[test]
    fn rejects_malformed_usernames() {
        for candidate in [
            "",
            "ali",
            "_202345",
            "ali_",
            "ali__202345",
            "ali_20a345",
            "ali 202345",
            "Ali-202345",
            "202345_ali",
        ] {
            assert!(!valid_username(candidate), "accepted {candidate}");
        }
    }
}
