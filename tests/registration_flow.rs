use std::sync::Arc;
use std::time::Duration;

use partner_match::domain::UserId;
use partner_match::events::{Choice, EventKind, InboundEvent, OutboundRender};
use partner_match::{Engine, MemoryRepository, Repository};

fn engine() -> (Engine<MemoryRepository>, Arc<MemoryRepository>) {
    let repository = Arc::new(MemoryRepository::new());
    let engine = Engine::new(Arc::clone(&repository), Duration::from_secs(300));
    (engine, repository)
}

fn pick(renders: &[OutboundRender], label: &str) -> Choice {
    renders
        .iter()
        .flat_map(|render| render.choices())
        .find(|choice| choice.label == label)
        .unwrap_or_else(|| panic!("no choice labelled '{label}'"))
        .clone()
}

fn choose(user: UserId, choice: &Choice) -> InboundEvent {
    InboundEvent {
        user,
        kind: EventKind::Choice(choice.token.clone()),
    }
}

#[test]
fn registration_happy_path() {
    let (engine, repository) = engine();
    repository.insert_specialization("Informatics").unwrap();
    let user = UserId(10);

    let out = engine.handle(InboundEvent::text(user, "/start"));
    assert!(out[0].text().contains("share your contact"));

    let out = engine.handle(InboundEvent::contact(user, "963911222333"));
    assert!(out[0].text().contains("full name"));

    let out = engine.handle(InboundEvent::text(user, "Ali Hassan"));
    assert!(out[0].text().contains("username"));

    let out = engine.handle(InboundEvent::text(user, "ali_202345"));
    let choice = pick(&out, "Informatics");

    let out = engine.handle(choose(user, &choice));
    assert!(out[0].text().contains("registered"));

    let student = repository.find_student(user).unwrap().expect("student row");
    assert!(student.is_registered);
    assert_eq!(student.contact, "963911222333");
    assert_eq!(student.full_name.as_deref(), Some("Ali Hassan"));
    assert_eq!(student.username.as_deref(), Some("ali_202345"));
    assert!(student.specialization_id.is_some());
}

#[test]
fn invalid_username_reprompts_without_losing_the_name() {
    let (engine, repository) = engine();
    repository.insert_specialization("Informatics").unwrap();
    let user = UserId(11);

    engine.handle(InboundEvent::text(user, "/start"));
    engine.handle(InboundEvent::contact(user, "963911000000"));
    engine.handle(InboundEvent::text(user, "Mona Said"));

    let out = engine.handle(InboundEvent::text(user, "mona said 2024"));
    assert!(out[0].text().contains("does not look right"));

    // The collected full name survives the re-prompt.
    let out = engine.handle(InboundEvent::text(user, "mona_said_202411"));
    let choice = pick(&out, "Informatics");
    engine.handle(choose(user, &choice));

    let student = repository.find_student(user).unwrap().expect("student row");
    assert_eq!(student.full_name.as_deref(), Some("Mona Said"));
}

#[test]
fn duplicate_username_keeps_the_first_registration() {
    let (engine, repository) = engine();
    repository.insert_specialization("Informatics").unwrap();

    for (user, name) in [(UserId(1), "Ali Hassan"), (UserId(2), "Sami Omar")] {
        engine.handle(InboundEvent::text(user, "/start"));
        engine.handle(InboundEvent::contact(user, "963911000001"));
        engine.handle(InboundEvent::text(user, name));
    }

    let out = engine.handle(InboundEvent::text(UserId(1), "ali_202345"));
    engine.handle(choose(UserId(1), &pick(&out, "Informatics")));

    let out = engine.handle(InboundEvent::text(UserId(2), "ali_202345"));
    assert!(out[0].text().contains("already taken"));

    let first = repository
        .find_student(UserId(1))
        .unwrap()
        .expect("student row");
    assert!(first.is_registered);
    let second = repository
        .find_student(UserId(2))
        .unwrap()
        .expect("student row");
    assert!(!second.is_registered);
}

#[test]
fn cancel_mid_flow_restarts_clean() {
    let (engine, repository) = engine();
    repository.insert_specialization("Informatics").unwrap();
    let user = UserId(12);

    engine.handle(InboundEvent::text(user, "/start"));
    engine.handle(InboundEvent::contact(user, "963911000002"));
    engine.handle(InboundEvent::text(user, "Ali Hassan"));

    let out = engine.handle(InboundEvent::text(user, "/cancel"));
    assert!(out[0].text().contains("Cancelled"));

    // No half-finished registration remains.
    let student = repository.find_student(user).unwrap().expect("student row");
    assert!(!student.is_registered);
    assert!(student.full_name.is_none());

    // A fresh /start begins from the contact step again.
    let out = engine.handle(InboundEvent::text(user, "/start"));
    assert!(out[0].text().contains("share your contact"));
}

#[test]
fn registration_aborts_when_no_specializations_exist() {
    let (engine, _repository) = engine();
    let user = UserId(13);

    engine.handle(InboundEvent::text(user, "/start"));
    engine.handle(InboundEvent::contact(user, "963911000003"));
    engine.handle(InboundEvent::text(user, "Ali Hassan"));

    let out = engine.handle(InboundEvent::text(user, "ali_202345"));
    assert!(out[0].text().contains("No specializations"));

    // The session is gone; stray text now gets the generic nudge.
    let out = engine.handle(InboundEvent::text(user, "anything"));
    assert!(out[0].text().contains("/start"));
}

#[test]
fn text_during_the_contact_step_is_rejected() {
    let (engine, _repository) = engine();
    let user = UserId(14);

    engine.handle(InboundEvent::text(user, "/start"));
    let out = engine.handle(InboundEvent::text(user, "963911000004"));
    assert!(out[0].text().contains("did not expect"));
}
