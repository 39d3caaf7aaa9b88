use std::sync::Arc;
use std::time::Duration;

use partner_match::domain::{SpecializationId, SubjectId, UserId};
use partner_match::events::{Choice, EventKind, InboundEvent, OutboundRender};
use partner_match::token::ChoiceToken;
use partner_match::{Engine, MemoryRepository, Repository};

const ADMIN: UserId = UserId(999);

fn engine() -> (Engine<MemoryRepository>, Arc<MemoryRepository>) {
    let repository = Arc::new(MemoryRepository::new());
    repository.add_admin(ADMIN);
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

fn has_choice(renders: &[OutboundRender], label: &str) -> bool {
    renders
        .iter()
        .flat_map(|render| render.choices())
        .any(|choice| choice.label == label)
}

fn choose(user: UserId, choice: &Choice) -> InboundEvent {
    InboundEvent {
        user,
        kind: EventKind::Choice(choice.token.clone()),
    }
}

fn token(user: UserId, token: ChoiceToken) -> InboundEvent {
    InboundEvent::choice(user, token)
}

/// Twelve active requests under one subject, each owned by its own account.
fn seed_browsable(repository: &MemoryRepository) -> (SpecializationId, SubjectId) {
    let spec = repository.insert_specialization("Informatics").unwrap();
    let subject = repository.insert_subject(spec.id, "Databases").unwrap();
    for index in 0..12 {
        let account = repository
            .add_account(&format!("Student {index}"), &format!("0911{index:04}"), Some(spec.id))
            .unwrap();
        repository
            .insert_request(
                UserId(account.id.0),
                spec.id,
                subject.id,
                "Dr. Ahmad",
                &format!("A{index}"),
                "",
            )
            .unwrap();
    }
    (spec.id, subject.id)
}

#[test]
fn taxonomy_add_and_duplicate_reprompt() {
    let (engine, repository) = engine();

    let out = engine.handle(InboundEvent::text(ADMIN, "/specs"));
    let add = pick(&out, "Add a specialization");
    engine.handle(choose(ADMIN, &add));
    let out = engine.handle(InboundEvent::text(ADMIN, "Informatics"));
    assert!(out[0].text().contains("Added Informatics"));

    engine.handle(token(ADMIN, ChoiceToken::SpecializationAdd));
    let out = engine.handle(InboundEvent::text(ADMIN, "Informatics"));
    assert!(out[0].text().contains("already exists"));

    // The re-prompt keeps the flow alive for a corrected name.
    let out = engine.handle(InboundEvent::text(ADMIN, "Economics"));
    assert!(out[0].text().contains("Added Economics"));
    assert_eq!(repository.list_specializations().unwrap().len(), 2);
}

#[test]
fn same_name_rename_short_circuits() {
    let (engine, repository) = engine();
    let spec = repository.insert_specialization("Informatics").unwrap();

    engine.handle(token(ADMIN, ChoiceToken::SpecializationEdit(spec.id)));
    let out = engine.handle(InboundEvent::text(ADMIN, "Informatics"));
    assert!(out[0].text().contains("unchanged"));

    let audit = repository.recent_audit(20).unwrap();
    assert!(audit
        .iter()
        .all(|entry| entry.action != "specialization renamed"));
}

#[test]
fn rename_conflicts_reprompt_in_place() {
    let (engine, repository) = engine();
    let first = repository.insert_specialization("Informatics").unwrap();
    repository.insert_specialization("Economics").unwrap();

    engine.handle(token(ADMIN, ChoiceToken::SpecializationEdit(first.id)));
    let out = engine.handle(InboundEvent::text(ADMIN, "Economics"));
    assert!(out[0].text().contains("already has that name"));

    let out = engine.handle(InboundEvent::text(ADMIN, "Applied Informatics"));
    assert!(out[0].text().contains("Renamed"));
    let renamed = repository.find_specialization(first.id).unwrap().unwrap();
    assert_eq!(renamed.name, "Applied Informatics");
}

#[test]
fn specialization_delete_shows_counts_and_cascades() {
    let (engine, repository) = engine();
    let (spec, _) = seed_browsable(&repository);
    repository.upsert_student_contact(UserId(1), "0911").unwrap();
    repository
        .complete_registration(UserId(1), "Ali", "ali_1", spec)
        .unwrap();

    let gate = engine.handle(token(ADMIN, ChoiceToken::SpecializationDelete(spec)));
    assert!(gate[0].text().contains("1 subjects"));
    assert!(gate[0].text().contains("12 accounts"));
    assert!(gate[0].text().contains("1 students"));
    assert!(gate[0].text().contains("12 requests"));

    let confirm = pick(&gate, "Yes, delete everything");
    let out = engine.handle(choose(ADMIN, &confirm));
    assert!(out[0].text().contains("gone"));

    assert!(repository.find_specialization(spec).unwrap().is_none());
    assert!(repository.find_student(UserId(1)).unwrap().is_none());
    let (accounts, total) = repository.list_accounts(0, 50).unwrap();
    assert!(accounts.is_empty());
    assert_eq!(total, 0);
}

#[test]
fn subject_management_roundtrip() {
    let (engine, repository) = engine();
    let spec = repository.insert_specialization("Informatics").unwrap();

    engine.handle(token(ADMIN, ChoiceToken::ManageSubjects(spec.id)));
    engine.handle(token(ADMIN, ChoiceToken::SubjectAdd(spec.id)));
    let out = engine.handle(InboundEvent::text(ADMIN, "Databases"));
    assert!(out[0].text().contains("Added Databases"));

    let subject = repository.subjects_of(spec.id).unwrap()[0].clone();
    engine.handle(token(ADMIN, ChoiceToken::SubjectEdit(subject.id)));
    let out = engine.handle(InboundEvent::text(ADMIN, "Advanced Databases"));
    assert!(out[0].text().contains("Renamed"));

    let gate = engine.handle(token(ADMIN, ChoiceToken::SubjectDelete(subject.id)));
    let confirm = pick(&gate, "Yes, delete it");
    engine.handle(choose(ADMIN, &confirm));
    assert!(repository.subjects_of(spec.id).unwrap().is_empty());
}

#[test]
fn browsing_pages_through_requests_newest_first() {
    let (engine, repository) = engine();
    seed_browsable(&repository);

    let out = engine.handle(InboundEvent::text(ADMIN, "/requests"));
    let out = engine.handle(choose(ADMIN, &pick(&out, "Informatics")));
    let first = engine.handle(choose(ADMIN, &pick(&out, "Databases")));

    assert_eq!(first[0].text().lines().count(), 5);
    assert!(has_choice(&first, "Next page"));
    assert!(!has_choice(&first, "Previous page"));

    let second = engine.handle(choose(ADMIN, &pick(&first, "Next page")));
    assert!(has_choice(&second, "Next page"));
    assert!(has_choice(&second, "Previous page"));

    let third = engine.handle(choose(ADMIN, &pick(&second, "Next page")));
    assert_eq!(third[0].text().lines().count(), 2);
    assert!(!has_choice(&third, "Next page"));
    assert!(has_choice(&third, "Previous page"));
}

#[test]
fn purging_a_subject_deactivates_everything_in_it() {
    let (engine, repository) = engine();
    let (spec, subject) = seed_browsable(&repository);

    let gate = engine.handle(token(ADMIN, ChoiceToken::PurgeSubject(spec, subject)));
    assert!(gate[0].text().contains("12 active requests"));
    let confirm = pick(&gate, "Yes, deactivate them");
    let out = engine.handle(choose(ADMIN, &confirm));
    assert!(out[0].text().contains("Deactivated 12"));

    let (_, total) = repository
        .requests_for_subject(spec, subject, 0, 0)
        .unwrap();
    assert_eq!(total, 0);
}

#[test]
fn single_request_delete_from_the_recent_list() {
    let (engine, repository) = engine();
    seed_browsable(&repository);

    let out = engine.handle(InboundEvent::text(ADMIN, "/delete_request"));
    // Latest ten only, newest first.
    let listed: Vec<_> = out[0]
        .choices()
        .iter()
        .filter(|choice| choice.label.starts_with('#'))
        .collect();
    assert_eq!(listed.len(), 10);

    let first = listed[0].clone();
    let gate = engine.handle(choose(ADMIN, &first));
    let confirm = pick(&gate, "Yes, delete it");
    engine.handle(choose(ADMIN, &confirm));

    let remaining = repository.recent_active_requests(20).unwrap();
    assert_eq!(remaining.len(), 11);
}

#[test]
fn student_listing_pages_and_search() {
    let (engine, repository) = engine();
    seed_browsable(&repository);

    let out = engine.handle(InboundEvent::text(ADMIN, "/students"));
    assert_eq!(out[0].text().lines().count(), 10);
    assert!(has_choice(&out, "Next page"));

    let last = engine.handle(choose(ADMIN, &pick(&out, "Next page")));
    assert_eq!(last[0].text().lines().count(), 2);
    assert!(!has_choice(&last, "Next page"));

    engine.handle(InboundEvent::text(ADMIN, "/search"));
    let out = engine.handle(InboundEvent::text(ADMIN, "student 3"));
    assert_eq!(out[0].text().lines().count(), 1);
    assert!(out[0].text().contains("Student 3"));
}

#[test]
fn a_forged_page_index_renders_an_empty_page() {
    let (engine, repository) = engine();
    let spec = repository.insert_specialization("Informatics").unwrap();
    repository
        .add_account("Ali Hassan", "963911000001", Some(spec.id))
        .unwrap();

    let out = engine.handle(token(ADMIN, ChoiceToken::StudentsPage(usize::MAX)));
    assert_eq!(out[0].text().lines().count(), 0);
    assert!(!has_choice(&out, "Next page"));
}

#[test]
fn moderation_disable_then_enable() {
    let (engine, repository) = engine();
    let spec = repository.insert_specialization("Informatics").unwrap();
    let account = repository
        .add_account("Ali Hassan", "963911000001", Some(spec.id))
        .unwrap();

    let out = engine.handle(InboundEvent::text(ADMIN, "/disable"));
    let target = pick(&out, "Ali Hassan (963911000001)");
    let gate = engine.handle(choose(ADMIN, &target));
    let confirm = pick(&gate, "Yes, disable");
    engine.handle(choose(ADMIN, &confirm));
    assert!(!repository.find_account(account.id).unwrap().unwrap().is_active);

    let out = engine.handle(InboundEvent::text(ADMIN, "/enable"));
    let target = pick(&out, "Ali Hassan (963911000001)");
    let gate = engine.handle(choose(ADMIN, &target));
    let confirm = pick(&gate, "Yes, enable");
    engine.handle(choose(ADMIN, &confirm));
    assert!(repository.find_account(account.id).unwrap().unwrap().is_active);
}

#[test]
fn audit_review_lists_newest_first() {
    let (engine, repository) = engine();
    repository.append_audit("specialization added", "Informatics").unwrap();
    repository.append_audit("subject added", "Databases").unwrap();

    let out = engine.handle(InboundEvent::text(ADMIN, "/audit"));
    let lines: Vec<&str> = out[0].text().lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("subject added"));
    assert!(lines[1].contains("specialization added"));
}

#[test]
fn admin_commands_reject_everyone_else() {
    let (engine, repository) = engine();
    let spec = repository.insert_specialization("Informatics").unwrap();
    repository.upsert_student_contact(UserId(5), "0911").unwrap();
    repository
        .complete_registration(UserId(5), "Ali", "ali_1", spec.id)
        .unwrap();

    for command in ["/specs", "/requests", "/students", "/audit", "/disable"] {
        let out = engine.handle(InboundEvent::text(UserId(5), command));
        assert!(out[0].text().contains("not allowed"), "{command} leaked");
    }
}
