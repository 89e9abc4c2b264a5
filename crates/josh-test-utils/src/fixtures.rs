//! Reusable attribute-handler fixtures.
//!
//! Three standard attribute bodies for pipeline validation and engine
//! testing:
//!
//! - [`const_attribute`] — always resolves to a fixed value (no reads).
//! - [`identity_attribute`] — copies another attribute's value through.
//! - [`failing_attribute`] — always fails resolution, deterministically.

use josh_core::Event;
use josh_entity::EventHandlers;
use josh_handler::{EventHandlerAction, Op};
use josh_units::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// An attribute that always resolves to `value`, regardless of event,
/// reading nothing. Mirrors `ConstPropagator`: useful for asserting that
/// a downstream handler observes a known, fixed input.
pub fn const_attribute(value: Value) -> EventHandlers {
    let action = Arc::new(EventHandlerAction::Ops(vec![Op::Push(value)]));
    [Event::Init, Event::Start, Event::Step, Event::End]
        .into_iter()
        .map(|event| (event, Arc::clone(&action)))
        .collect()
}

/// An attribute that resolves by copying `source`'s current value
/// through unchanged, for every event. Mirrors `IdentityPropagator`:
/// useful for asserting that routing through a handler doesn't corrupt
/// a value.
pub fn identity_attribute(source: impl Into<String>) -> EventHandlers {
    let action = Arc::new(EventHandlerAction::Ops(vec![Op::PushAttribute { name: source.into() }]));
    [Event::Init, Event::Start, Event::Step, Event::End]
        .into_iter()
        .map(|event| (event, Arc::clone(&action)))
        .collect()
}

/// An attribute that always fails resolution with a scope error, for
/// every event. Mirrors `FailingPropagator`: useful for asserting that a
/// resolution failure surfaces through the stepper with the right
/// `(patch_key, attribute, event)` context rather than being swallowed.
pub fn failing_attribute() -> EventHandlers {
    let action = Arc::new(EventHandlerAction::Ops(vec![Op::PushAttribute {
        name: "__josh_test_utils_nonexistent__".to_string(),
    }]));
    [Event::Init, Event::Start, Event::Step, Event::End]
        .into_iter()
        .map(|event| (event, Arc::clone(&action)))
        .collect()
}

/// Build the handler map for a single event only, leaving every other
/// event to fall back per `spec.md` §4.C.
pub fn handler_for_event(event: Event, action: EventHandlerAction) -> EventHandlers {
    let mut handlers: HashMap<Event, Arc<EventHandlerAction>> = HashMap::new();
    handlers.insert(event, Arc::new(action));
    handlers
}
