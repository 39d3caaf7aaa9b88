use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// External chat identity of a caller. Distinct from [`AccountId`], which
/// numbers the administratively managed account rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpecializationId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubjectId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestId(pub i64);

/// Row id in the legacy account table used by admin moderation and request
/// browsing. Kept deliberately separate from [`UserId`]; the two identity
/// spaces are related but never unified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(pub i64);

/// Caller privilege resolved per inbound event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    RegisteredStudent,
    Unregistered,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Specialization {
    pub id: SpecializationId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subject {
    pub id: SubjectId,
    pub name: String,
    pub specialization_id: SpecializationId,
}

/// Registration-flow identity. A row appears as soon as a contact is shared
/// and is completed once `is_registered` flips to true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Student {
    pub user_id: UserId,
    pub contact: String,
    pub full_name: Option<String>,
    pub username: Option<String>,
    pub specialization_id: Option<SpecializationId>,
    pub is_registered: bool,
}

/// Administratively managed account record, moderated independently of the
/// registration flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserAccount {
    pub id: AccountId,
    pub name: String,
    pub phone: String,
    pub specialization_id: Option<SpecializationId>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// One open "looking for a partner" posting. Deactivation is a soft delete;
/// only a specialization cascade removes the row for good.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobRequest {
    pub id: RequestId,
    pub user_id: UserId,
    pub specialization_id: SpecializationId,
    pub subject_id: SubjectId,
    pub professor_name: String,
    pub class_number: String,
    pub details: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditEntry {
    pub action: String,
    pub details: String,
    pub created_at: DateTime<Utc>,
}

/// The single mutable field chosen during a request edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestField {
    ClassNumber,
    ProfessorName,
    Details,
}

impl RequestField {
    pub fn token_tag(self) -> &'static str {
        match self {
            RequestField::ClassNumber => "class",
            RequestField::ProfessorName => "professor",
            RequestField::Details => "details",
        }
    }

    pub fn from_token_tag(tag: &str) -> Option<Self> {
        match tag {
            "class" => Some(RequestField::ClassNumber),
            "professor" => Some(RequestField::ProfessorName),
            "details" => Some(RequestField::Details),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RequestField::ClassNumber => "class number",
            RequestField::ProfessorName => "professor name",
            RequestField::Details => "details",
        }
    }
}

/// Request joined with the legacy account that owns it, for admin browsing.
#[derive(Debug, Clone, Serialize)]
pub struct RequestView {
    pub id: RequestId,
    pub owner_name: String,
    pub owner_phone: String,
    pub subject_name: String,
    pub professor_name: String,
    pub class_number: String,
    pub details: String,
}

/// Request joined with the registered student that posted it, for partner
/// browsing. The university e-mail is derived from the username.
#[derive(Debug, Clone, Serialize)]
pub struct PartnerView {
    pub request_id: RequestId,
    pub full_name: String,
    pub username: String,
    pub contact: String,
    pub professor_name: String,
    pub class_number: String,
    pub details: String,
}

impl PartnerView {
    pub fn university_email(&self) -> String {
        format!("{}@svuonline.org", self.username)
    }

    /// Phone numbers arrive without a leading plus from some transports.
    pub fn normalized_contact(&self) -> String {
        if self.contact.is_empty() {
            "unavailable".to_string()
        } else if self.contact.starts_with('+') {
            self.contact.clone()
        } else {
            format!("+{}", self.contact)
        }
    }
}

/// Dependent-row counts shown before a specialization delete is confirmed,
/// and reported after the cascade runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CascadeCounts {
    pub subjects: usize,
    pub accounts: usize,
    pub students: usize,
    pub requests: usize,
}
