//! The sub-step event taxonomy.

use std::fmt;

/// One of the four sub-steps at which a handler may fire.
///
/// `spec.md` §3: "`EventHandlers` is a mapping from event tag (`init`,
/// `start`, `step`, `end`) to a compiled RHS." Resolution of a missing
/// event-specific handler falls back to `Step` then `Init` (§4.C).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Event {
    /// Runs once, on the first timestep, before `Start`.
    Init,
    /// Runs first within every timestep after the first.
    Start,
    /// Runs after `Start` within every timestep.
    Step,
    /// Runs after `Step`, the last sub-step of every timestep.
    End,
}

impl Event {
    /// All events in sub-step order (`Init` is a step-0 special case and
    /// is not part of the regular per-timestep ordering).
    pub const ORDER: [Event; 3] = [Event::Start, Event::Step, Event::End];

    /// The fallback chain used when an entity has no handler registered
    /// for this exact event: `Step` falls back to `Init`; `Start` and `End`
    /// also fall back to `Step` then `Init` (`spec.md` §4.C: "falling back
    /// to `step` if event-specific is absent, then `init`").
    pub fn fallback_chain(self) -> &'static [Event] {
        match self {
            Event::Init => &[Event::Init],
            Event::Start => &[Event::Start, Event::Step, Event::Init],
            Event::Step => &[Event::Step, Event::Init],
            Event::End => &[Event::End, Event::Step, Event::Init],
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Event::Init => "init",
            Event::Start => "start",
            Event::Step => "step",
            Event::End => "end",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_falls_back_to_init() {
        assert_eq!(Event::Step.fallback_chain(), &[Event::Step, Event::Init]);
    }

    #[test]
    fn end_falls_back_through_step_then_init() {
        assert_eq!(
            Event::End.fallback_chain(),
            &[Event::End, Event::Step, Event::Init]
        );
    }
}
