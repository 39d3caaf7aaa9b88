//! Partner browsing for registered students.

use super::{fetch, Engine, CANCEL_LABEL};
use crate::domain::{PartnerView, RequestId, SubjectId, UserId};
use crate::events::{Choice, OutboundRender};
use crate::repository::Repository;
use crate::token::ChoiceToken;

fn partner_card(partner: &PartnerView) -> String {
    let details = if partner.details.is_empty() {
        "no extra details".to_string()
    } else {
        partner.details.clone()
    };
    format!(
        "{} is looking for a partner: class {} with {}. {}",
        partner.full_name, partner.class_number, partner.professor_name, details
    )
}

impl<R: Repository> Engine<R> {
    pub(crate) fn begin_partners(&self, user: UserId) -> Vec<OutboundRender> {
        let specialization = match self.caller_specialization(user) {
            Ok(specialization) => specialization,
            Err(out) => return out,
        };
        let subjects = fetch!(self, user, self.repository.subjects_of(specialization));
        if subjects.is_empty() {
            return vec![OutboundRender::prompt(
                "Your specialization has no subjects yet.",
            )];
        }
        let mut choices: Vec<Choice> = subjects
            .into_iter()
            .map(|subject| Choice::new(subject.name, ChoiceToken::PartnersSubject(subject.id)))
            .collect();
        choices.push(Choice::new(CANCEL_LABEL, ChoiceToken::Cancel));
        vec![OutboundRender::menu(
            "Pick a subject to see who needs a partner.",
            choices,
        )]
    }

    pub(crate) fn partners_for_subject(
        &self,
        user: UserId,
        subject: SubjectId,
    ) -> Vec<OutboundRender> {
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

        let partners = fetch!(self, user, self.repository.partners_for_subject(subject));
        if partners.is_empty() {
            return vec![OutboundRender::prompt(
                "Nobody is looking for a partner in that subject right now.",
            )];
        }
        partners
            .iter()
            .map(|partner| {
                OutboundRender::menu(
                    partner_card(partner),
                    vec![Choice::new(
                        "Contact",
                        ChoiceToken::ContactPartner(partner.request_id),
                    )],
                )
            })
            .collect()
    }

    pub(crate) fn contact_partner(&self, user: UserId, request: RequestId) -> Vec<OutboundRender> {
        let found = match self.repository.find_request(request) {
            Ok(Some(found)) if found.is_active => found,
            Ok(_) => {
                return vec![OutboundRender::prompt(
                    "That request is no longer available.",
                )]
            }
            Err(error) => return self.repo_failure(user, error),
        };
        let owner = match self.repository.find_student(found.user_id) {
            Ok(Some(owner)) if owner.is_registered => owner,
            Ok(_) => {
                return vec![OutboundRender::prompt(
                    "That student is no longer registered.",
                )]
            }
            Err(error) => return self.repo_failure(user, error),
        };
        let (Some(full_name), Some(username)) = (owner.full_name, owner.username) else {
            return vec![OutboundRender::prompt(
                "That student is no longer registered.",
            )];
        };
        let view = PartnerView {
            request_id: found.id,
            full_name,
            username,
            contact: owner.contact,
            professor_name: found.professor_name,
            class_number: found.class_number,
            details: found.details,
        };
        vec![OutboundRender::prompt(format!(
            "Reach {} at {} or {}.",
            view.full_name,
            view.normalized_contact(),
            view.university_email()
        ))]
    }
}
