//! Transport-neutral event and render types. The hosting process translates
//! its messaging platform into [`InboundEvent`]s and turns [`OutboundRender`]
//! instructions back into whatever the platform draws.

use serde::Serialize;

use crate::domain::UserId;
use crate::token::ChoiceToken;

#[derive(Debug, Clone)]
pub struct InboundEvent {
    pub user: UserId,
    pub kind: EventKind,
}

#[derive(Debug, Clone)]
pub enum EventKind {
    /// Freeform text, including slash commands.
    Text(String),
    /// The caller shared their own contact; the payload is the phone number.
    ContactShare(String),
    /// The caller picked a menu choice; the payload is the raw token.
    Choice(String),
}

impl InboundEvent {
    pub fn text(user: UserId, text: impl Into<String>) -> Self {
        Self {
            user,
            kind: EventKind::Text(text.into()),
        }
    }

    pub fn contact(user: UserId, phone: impl Into<String>) -> Self {
        Self {
            user,
            kind: EventKind::ContactShare(phone.into()),
        }
    }

    pub fn choice(user: UserId, token: ChoiceToken) -> Self {
        Self {
            user,
            kind: EventKind::Choice(token.encode()),
        }
    }
}

/// One selectable option in a rendered menu. The label is display-only; the
/// token is what comes back in [`EventKind::Choice`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub label: String,
    pub token: String,
}

impl Choice {
    pub fn new(label: impl Into<String>, token: ChoiceToken) -> Self {
        Self {
            label: label.into(),
            token: token.encode(),
        }
    }
}

/// What the engine asks the transport to draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutboundRender {
    /// Message with an ordered set of choices.
    Menu { text: String, choices: Vec<Choice> },
    /// Plain message awaiting freeform input (or nothing at all).
    Prompt { text: String },
}

impl OutboundRender {
    pub fn prompt(text: impl Into<String>) -> Self {
        OutboundRender::Prompt { text: text.into() }
    }

    pub fn menu(text: impl Into<String>, choices: Vec<Choice>) -> Self {
        OutboundRender::Menu {
            text: text.into(),
            choices,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            OutboundRender::Menu { text, .. } | OutboundRender::Prompt { text } => text,
        }
    }

    pub fn choices(&self) -> &[Choice] {
        match self {
            OutboundRender::Menu { choices, .. } => choices,
            OutboundRender::Prompt { .. } => &[],
        }
    }
}
