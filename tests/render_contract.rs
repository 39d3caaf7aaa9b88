//! The serialized shape of render instructions is the contract the hosting
//! transport consumes; keep it stable.

use partner_match::domain::SpecializationId;
use partner_match::events::{Choice, OutboundRender};
use partner_match::token::ChoiceToken;
use serde_json::json;

#[test]
fn menu_serializes_with_ordered_choices() {
    let render = OutboundRender::menu(
        "Pick your specialization.",
        vec![
            Choice::new(
                "Informatics",
                ChoiceToken::RegisterSpecialization(SpecializationId(3)),
            ),
            Choice::new("Cancel", ChoiceToken::Cancel),
        ],
    );
    let value = serde_json::to_value(&render).expect("menu serializes");
    assert_eq!(
        value,
        json!({
            "kind": "menu",
            "text": "Pick your specialization.",
            "choices": [
                {"label": "Informatics", "token": "reg_spec:3"},
                {"label": "Cancel", "token": "cancel"},
            ],
        })
    );
}

#[test]
fn prompt_serializes_flat() {
    let render = OutboundRender::prompt("Send the class number.");
    let value = serde_json::to_value(&render).expect("prompt serializes");
    assert_eq!(
        value,
        json!({"kind": "prompt", "text": "Send the class number."})
    );
}
