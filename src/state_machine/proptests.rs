//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::transition::*;
use super::*;
use proptest::prelude::*;

// ============================================================================
// Test Helpers
// ============================================================================

fn test_context() -> SessionContext {
    SessionContext::new(SessionId::new(7, 7))
}

fn persisted(effects: &[Effect]) -> Vec<CapturedFields> {
    effects
        .iter()
        .filter_map(|e| match e {
            Effect::PersistRecord { fields } => Some(fields.clone()),
            _ => None,
        })
        .collect()
}

fn reply_count(effects: &[Effect]) -> usize {
    effects
        .iter()
        .filter(|e| matches!(e, Effect::Reply { .. }))
        .count()
}

/// Drive a session the way the runtime does: outcome events produced by
/// persistence are fed back immediately.
fn drive(events: Vec<Event>, save_succeeds: bool) -> (IntakeState, Vec<Effect>) {
    let ctx = test_context();
    let mut state = IntakeState::New;
    let mut all_effects = Vec::new();

    for event in events {
        let mut pending = vec![event];
        while let Some(current) = pending.pop() {
            let Ok(result) = transition(&state, &ctx, current) else {
                continue;
            };
            state = result.new_state;
            for effect in result.effects {
                if matches!(effect, Effect::PersistRecord { .. }) {
                    pending.push(if save_succeeds {
                        Event::RecordSaved
                    } else {
                        Event::RecordFailed {
                            message: "unwritable".to_string(),
                        }
                    });
                }
                all_effects.push(effect);
            }
        }
    }
    (state, all_effects)
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_text() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z0-9 ]{0,20}",
        "\\PC{0,12}",
        Just(String::new()),
    ]
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        1 => Just(Event::Begin),
        1 => Just(Event::Cancel),
        6 => arb_text().prop_map(Event::Text),
        1 => Just(Event::RecordSaved),
        1 => "[a-z ]{1,20}".prop_map(|message| Event::RecordFailed { message }),
    ]
}

fn arb_prompting_state() -> impl Strategy<Value = IntakeState> {
    prop_oneof![
        Just(IntakeState::New),
        Just(IntakeState::AwaitingName),
        arb_text().prop_map(|name| IntakeState::AwaitingPhone { name }),
        (arb_text(), arb_text()).prop_map(|(name, phone_number)| {
            IntakeState::AwaitingLocation { name, phone_number }
        }),
    ]
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // Every accepted transition answers with at most one reply
    #[test]
    fn prop_at_most_one_reply_per_event(events in proptest::collection::vec(arb_event(), 0..20)) {
        let ctx = test_context();
        let mut state = IntakeState::New;

        for event in events {
            if let Ok(result) = transition(&state, &ctx, event) {
                prop_assert!(reply_count(&result.effects) <= 1);
                state = result.new_state;
            }
        }
    }

    // A session persists at most once, and only a fully captured record
    #[test]
    fn prop_persist_at_most_once(
        events in proptest::collection::vec(arb_event(), 0..20),
        save_succeeds in any::<bool>(),
    ) {
        let mut events = events;
        events.insert(0, Event::Begin);
        let (state, effects) = drive(events, save_succeeds);

        let records = persisted(&effects);
        prop_assert!(records.len() <= 1);
        if records.len() == 1 {
            prop_assert!(state.is_terminal());
        }
    }

    // Cancel from any prompting state ends the session with nothing persisted
    #[test]
    fn prop_cancel_never_persists(state in arb_prompting_state()) {
        let result = transition(&state, &test_context(), Event::Cancel).unwrap();

        prop_assert_eq!(&result.new_state, &IntakeState::Done);
        prop_assert!(persisted(&result.effects).is_empty());
        prop_assert_eq!(result.reply(), Some(prompts::CANCELLED));
    }

    // Three answers produce exactly one record carrying them verbatim
    #[test]
    fn prop_completed_session_captures_fields(
        name in arb_text(),
        phone in arb_text(),
        location in arb_text(),
    ) {
        let (state, effects) = drive(
            vec![
                Event::Begin,
                Event::Text(name.clone()),
                Event::Text(phone.clone()),
                Event::Text(location.clone()),
            ],
            true,
        );

        prop_assert_eq!(state, IntakeState::Done);
        let expected = CapturedFields::new(name, phone, location);
        prop_assert_eq!(persisted(&effects), vec![expected.clone()]);
        let confirmation = Effect::reply(prompts::saved(&expected));
        prop_assert!(effects.contains(&confirmation));
        prop_assert_eq!(effects.last(), Some(&Effect::EndSession));
    }

    // Cancelling after any prefix of answers persists nothing
    #[test]
    fn prop_cancel_after_prefix(
        answers in proptest::collection::vec(arb_text(), 0..3),
    ) {
        let mut events = vec![Event::Begin];
        events.extend(answers.into_iter().map(Event::Text));
        events.push(Event::Cancel);

        let (state, effects) = drive(events, true);

        prop_assert_eq!(state, IntakeState::Done);
        prop_assert!(persisted(&effects).is_empty());
    }

    // Transitions are pure: same inputs, same outputs
    #[test]
    fn prop_transition_is_deterministic(state in arb_prompting_state(), event in arb_event()) {
        let ctx = test_context();
        let first = transition(&state, &ctx, event.clone());
        let second = transition(&state, &ctx, event);

        match (first, second) {
            (Ok(a), Ok(b)) => {
                prop_assert_eq!(a.new_state, b.new_state);
                prop_assert_eq!(a.effects, b.effects);
            }
            (Err(a), Err(b)) => prop_assert_eq!(a, b),
            _ => prop_assert!(false, "transition outcome differed between runs"),
        }
    }
}
