//! Structured-choice tokens.
//!
//! A token is what the transport carries back when the user picks a menu
//! choice. Tokens hold a fixed tag and numeric ids only; entity names never
//! travel in a token, so a name containing the separator cannot corrupt the
//! payload. Decoding validates the tag, the field count, and every id, and
//! returns [`TokenError`] on anything malformed.

use crate::domain::{AccountId, RequestField, RequestId, SpecializationId, SubjectId};

const SEPARATOR: char = ':';

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("unknown token tag: {0}")]
    UnknownTag(String),
    #[error("malformed token payload: {0}")]
    Malformed(String),
}

/// Every menu choice the engine can offer, as a closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceToken {
    /// Accepted in any state; aborts the flow in progress.
    Cancel,

    // Registration.
    RegisterSpecialization(SpecializationId),

    // Job-request lifecycle (student).
    NewRequestSubject(SubjectId),
    EditRequestPick(RequestId),
    EditRequestField(RequestId, RequestField),
    DeleteRequestPick(RequestId),
    DeleteRequestConfirm(RequestId),

    // Partner browsing (student).
    PartnersSubject(SubjectId),
    ContactPartner(RequestId),

    // Admin request browsing and bulk deactivation.
    BrowseSpecialization(SpecializationId),
    BrowsePage(SpecializationId, SubjectId, usize),
    PurgeSubject(SpecializationId, SubjectId),
    PurgeSubjectConfirm(SpecializationId, SubjectId),
    PurgeSpecialization(SpecializationId),
    PurgeSpecializationConfirm(SpecializationId),

    // Admin single-request deletion.
    AdminDeletePick(RequestId),
    AdminDeleteConfirm(RequestId),

    // Admin student listing.
    StudentsPage(usize),

    // Account moderation.
    DisableAccount(AccountId),
    DisableAccountConfirm(AccountId),
    EnableAccount(AccountId),
    EnableAccountConfirm(AccountId),

    // Taxonomy management.
    SpecializationAdd,
    SpecializationEdit(SpecializationId),
    SpecializationDelete(SpecializationId),
    SpecializationDeleteConfirm(SpecializationId),
    ManageSubjects(SpecializationId),
    SubjectAdd(SpecializationId),
    SubjectEdit(SubjectId),
    SubjectDelete(SubjectId),
    SubjectDeleteConfirm(SubjectId),
}

impl ChoiceToken {
    pub fn encode(self) -> String {
        match self {
            ChoiceToken::Cancel => "cancel".to_string(),
            ChoiceToken::RegisterSpecialization(id) => format!("reg_spec:{}", id.0),
            ChoiceToken::NewRequestSubject(id) => format!("new_subject:{}", id.0),
            ChoiceToken::EditRequestPick(id) => format!("edit_pick:{}", id.0),
            ChoiceToken::EditRequestField(id, field) => {
                format!("edit_field:{}:{}", id.0, field.token_tag())
            }
            ChoiceToken::DeleteRequestPick(id) => format!("del_pick:{}", id.0),
            ChoiceToken::DeleteRequestConfirm(id) => format!("del_yes:{}", id.0),
            ChoiceToken::PartnersSubject(id) => format!("partners_subject:{}", id.0),
            ChoiceToken::ContactPartner(id) => format!("contact:{}", id.0),
            ChoiceToken::BrowseSpecialization(id) => format!("browse_spec:{}", id.0),
            ChoiceToken::BrowsePage(spec, subject, page) => {
                format!("browse_page:{}:{}:{}", spec.0, subject.0, page)
            }
            ChoiceToken::PurgeSubject(spec, subject) => {
                format!("purge_subject:{}:{}", spec.0, subject.0)
            }
            ChoiceToken::PurgeSubjectConfirm(spec, subject) => {
                format!("purge_subject_yes:{}:{}", spec.0, subject.0)
            }
            ChoiceToken::PurgeSpecialization(id) => format!("purge_spec:{}", id.0),
            ChoiceToken::PurgeSpecializationConfirm(id) => format!("purge_spec_yes:{}", id.0),
            ChoiceToken::AdminDeletePick(id) => format!("admin_del:{}", id.0),
            ChoiceToken::AdminDeleteConfirm(id) => format!("admin_del_yes:{}", id.0),
            ChoiceToken::StudentsPage(page) => format!("students_page:{page}"),
            ChoiceToken::DisableAccount(id) => format!("disable:{}", id.0),
            ChoiceToken::DisableAccountConfirm(id) => format!("disable_yes:{}", id.0),
            ChoiceToken::EnableAccount(id) => format!("enable:{}", id.0),
            ChoiceToken::EnableAccountConfirm(id) => format!("enable_yes:{}", id.0),
            ChoiceToken::SpecializationAdd => "spec_add".to_string(),
            ChoiceToken::SpecializationEdit(id) => format!("spec_edit:{}", id.0),
            ChoiceToken::SpecializationDelete(id) => format!("spec_del:{}", id.0),
            ChoiceToken::SpecializationDeleteConfirm(id) => format!("spec_del_yes:{}", id.0),
            ChoiceToken::ManageSubjects(id) => format!("subjects:{}", id.0),
            ChoiceToken::SubjectAdd(id) => format!("subject_add:{}", id.0),
            ChoiceToken::SubjectEdit(id) => format!("subject_edit:{}", id.0),
            ChoiceToken::SubjectDelete(id) => format!("subject_del:{}", id.0),
            ChoiceToken::SubjectDeleteConfirm(id) => format!("subject_del_yes:{}", id.0),
        }
    }

    pub fn decode(raw: &str) -> Result<Self, TokenError> {
        let mut parts = raw.split(SEPARATOR);
        let tag = parts.next().unwrap_or_default();
        let rest: Vec<&str> = parts.collect();

        let token = match tag {
            "cancel" => with_arity(raw, &rest, 0, |_| Some(ChoiceToken::Cancel))?,
            "reg_spec" => one_id(raw, &rest, |id| {
                ChoiceToken::RegisterSpecialization(SpecializationId(id))
            })?,
            "new_subject" => one_id(raw, &rest, |id| {
                ChoiceToken::NewRequestSubject(SubjectId(id))
            })?,
            "edit_pick" => one_id(raw, &rest, |id| {
                ChoiceToken::EditRequestPick(RequestId(id))
            })?,
            "edit_field" => with_arity(raw, &rest, 2, |fields| {
                let id = fields[0].parse().ok()?;
                let field = RequestField::from_token_tag(fields[1])?;
                Some(ChoiceToken::EditRequestField(RequestId(id), field))
            })?,
            "del_pick" => one_id(raw, &rest, |id| {
                ChoiceToken::DeleteRequestPick(RequestId(id))
            })?,
            "del_yes" => one_id(raw, &rest, |id| {
                ChoiceToken::DeleteRequestConfirm(RequestId(id))
            })?,
            "partners_subject" => one_id(raw, &rest, |id| {
                ChoiceToken::PartnersSubject(SubjectId(id))
            })?,
            "contact" => one_id(raw, &rest, |id| ChoiceToken::ContactPartner(RequestId(id)))?,
            "browse_spec" => one_id(raw, &rest, |id| {
                ChoiceToken::BrowseSpecialization(SpecializationId(id))
            })?,
            "browse_page" => with_arity(raw, &rest, 3, |fields| {
                let spec = fields[0].parse().ok()?;
                let subject = fields[1].parse().ok()?;
                let page = fields[2].parse().ok()?;
                Some(ChoiceToken::BrowsePage(
                    SpecializationId(spec),
                    SubjectId(subject),
                    page,
                ))
            })?,
            "purge_subject" => two_ids(raw, &rest, |spec, subject| {
                ChoiceToken::PurgeSubject(SpecializationId(spec), SubjectId(subject))
            })?,
            "purge_subject_yes" => two_ids(raw, &rest, |spec, subject| {
                ChoiceToken::PurgeSubjectConfirm(SpecializationId(spec), SubjectId(subject))
            })?,
            "purge_spec" => one_id(raw, &rest, |id| {
                ChoiceToken::PurgeSpecialization(SpecializationId(id))
            })?,
            "purge_spec_yes" => one_id(raw, &rest, |id| {
                ChoiceToken::PurgeSpecializationConfirm(SpecializationId(id))
            })?,
            "admin_del" => one_id(raw, &rest, |id| {
                ChoiceToken::AdminDeletePick(RequestId(id))
            })?,
            "admin_del_yes" => one_id(raw, &rest, |id| {
                ChoiceToken::AdminDeleteConfirm(RequestId(id))
            })?,
            "students_page" => with_arity(raw, &rest, 1, |fields| {
                fields[0].parse().ok().map(ChoiceToken::StudentsPage)
            })?,
            "disable" => one_id(raw, &rest, |id| {
                ChoiceToken::DisableAccount(AccountId(id))
            })?,
            "disable_yes" => one_id(raw, &rest, |id| {
                ChoiceToken::DisableAccountConfirm(AccountId(id))
            })?,
            "enable" => one_id(raw, &rest, |id| ChoiceToken::EnableAccount(AccountId(id)))?,
            "enable_yes" => one_id(raw, &rest, |id| {
                ChoiceToken::EnableAccountConfirm(AccountId(id))
            })?,
            "spec_add" => with_arity(raw, &rest, 0, |_| Some(ChoiceToken::SpecializationAdd))?,
            "spec_edit" => one_id(raw, &rest, |id| {
                ChoiceToken::SpecializationEdit(SpecializationId(id))
            })?,
            "spec_del" => one_id(raw, &rest, |id| {
                ChoiceToken::SpecializationDelete(SpecializationId(id))
            })?,
            "spec_del_yes" => one_id(raw, &rest, |id| {
                ChoiceToken::SpecializationDeleteConfirm(SpecializationId(id))
            })?,
            "subjects" => one_id(raw, &rest, |id| {
                ChoiceToken::ManageSubjects(SpecializationId(id))
            })?,
            "subject_add" => one_id(raw, &rest, |id| {
                ChoiceToken::SubjectAdd(SpecializationId(id))
            })?,
            "subject_edit" => one_id(raw, &rest, |id| {
                ChoiceToken::SubjectEdit(SubjectId(id))
            })?,
            "subject_del" => one_id(raw, &rest, |id| {
                ChoiceToken::SubjectDelete(SubjectId(id))
            })?,
            "subject_del_yes" => one_id(raw, &rest, |id| {
                ChoiceToken::SubjectDeleteConfirm(SubjectId(id))
            })?,
            other => return Err(TokenError::UnknownTag(other.to_string())),
        };
        Ok(token)
    }
}

fn with_arity(
    raw: &str,
    fields: &[&str],
    expected: usize,
    build: impl FnOnce(&[&str]) -> Option<ChoiceToken>,
) -> Result<ChoiceToken, TokenError> {
    if fields.len() != expected {
        return Err(TokenError::Malformed(raw.to_string()));
    }
    build(fields).ok_or_else(|| TokenError::Malformed(raw.to_string()))
}

fn one_id(
    raw: &str,
    fields: &[&str],
    build: impl FnOnce(i64) -> ChoiceToken,
) -> Result<ChoiceToken, TokenError> {
    with_arity(raw, fields, 1, |fields| {
        fields[0].parse().ok().map(build)
    })
}

fn two_ids(
    raw: &str,
    fields: &[&str],
    build: impl FnOnce(i64, i64) -> ChoiceToken,
) -> Result<ChoiceToken, TokenError> {
    with_arity(raw, fields, 2, |fields| {
        let first = fields[0].parse().ok()?;
        let second = fields[1].parse().ok()?;
        Some(build(first, second))
    })
}
