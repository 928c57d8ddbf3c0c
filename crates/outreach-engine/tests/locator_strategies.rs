mod support;

use outreach_engine::locator::{locate, locate_with, strategies_for, Strategy, StrategySpec};
use outreach_engine::ControlRole;
use support::{FakeControl, FakePage, FakeSession};

#[tokio::test]
async fn test_later_strategy_matches_when_earlier_ones_fail() {
    // No button carries visible "Connect" text, but one has the
    // aria-label; strategy 2 must match and be reported as the rule.
    let session = FakeSession::new();
    session.set_current(FakePage::new(
        "Jane Doe profile",
        vec![
            FakeControl::button("follow", "Follow"),
            FakeControl::button("unlabeled", "").with_attr("aria-label", "Connect with Jane Doe"),
        ],
    ));

    let located = locate(&session, ControlRole::Connect).await.unwrap();

    let located = located.expect("strategy 2 should match");
    assert_eq!(located.strategy, "connect via aria-label");
    assert_eq!(located.handle.id, "unlabeled");
}

#[tokio::test]
async fn test_first_strategy_wins_when_both_match() {
    let session = FakeSession::new();
    session.set_current(FakePage::new(
        "profile",
        vec![
            FakeControl::button("by-text", "Connect").with_attr("aria-label", "Connect"),
        ],
    ));

    let located = locate(&session, ControlRole::Connect)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(located.strategy, "visible connect button");
}

#[tokio::test]
async fn test_exhaustion_returns_none_without_side_effects() {
    let session = FakeSession::new();
    session.set_current(FakePage::new(
        "profile with nothing useful",
        vec![FakeControl::button("follow", "Follow")],
    ));

    let located = locate(&session, ControlRole::Connect).await.unwrap();

    assert!(located.is_none());
    // Lookup must be read-only: nothing clicked, nothing typed.
    assert!(session.clicks().is_empty());
    assert!(session.typed().is_empty());
}

#[tokio::test]
async fn test_region_strategy_requires_the_region() {
    let table = vec![StrategySpec {
        description: "actions region only",
        strategy: Strategy::ByRegionThenText {
            region_css: ".actions".to_string(),
            css: "button".to_string(),
            needle: "Connect".to_string(),
        },
    }];

    let session = FakeSession::new();
    session.set_current(FakePage::new(
        "profile",
        vec![FakeControl::button("stray", "Connect")],
    ));

    // Button present but region absent: the composite strategy fails.
    let located = locate_with(&session, "connect", &table).await.unwrap();
    assert!(located.is_none());

    // With the region present the same button matches.
    session.set_current(FakePage::new(
        "profile",
        vec![
            FakeControl {
                id: "region",
                tag: "div",
                text: "",
                attributes: vec![("class", "actions")],
                on_click: None,
            },
            FakeControl::button("stray", "Connect"),
        ],
    ));

    let located = locate_with(&session, "connect", &table).await.unwrap();
    assert_eq!(located.unwrap().handle.id, "stray");
}

#[tokio::test]
async fn test_note_field_found_by_structural_selector() {
    let session = FakeSession::new();
    session.set_current(FakePage::new(
        "invite dialog",
        vec![FakeControl {
            id: "note",
            tag: "textarea",
            text: "",
            attributes: vec![("name", "message")],
            on_click: None,
        }],
    ));

    let located = locate(&session, ControlRole::NoteField)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(located.strategy, "named message textarea");
}

#[test]
fn test_every_role_has_a_strategy_table() {
    for role in [
        ControlRole::Connect,
        ControlRole::Message,
        ControlRole::AddNote,
        ControlRole::NoteField,
        ControlRole::Send,
    ] {
        assert!(
            !strategies_for(role).is_empty(),
            "{} has no strategies",
            role.as_str()
        );
    }
}
