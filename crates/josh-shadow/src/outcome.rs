//! The explicit resolution-outcome type.

use josh_units::Value;

/// What happened when resolving one attribute, named explicitly
/// (`spec.md` §9) to avoid representing a resolution loop as a thrown
/// exception: "the resolver returns `Resolved(v) | Pending | Loop`.
/// Callers map `Loop` directly to a direct-storage read."
#[derive(Clone, Debug, PartialEq)]
pub enum ResolveOutcome {
    /// The attribute's value, either already cached for this event or
    /// just computed by running its handler.
    Resolved(Value),
    /// The attribute is reachable through a nested scope that has not
    /// yet produced a value, distinct from an exact re-entrant cycle.
    /// Reserved for nested synthetic-scope resolution paths; current
    /// callers resolve this the same way as `Loop`.
    Pending,
    /// `a` is already in the in-progress set: an exact self/cycle
    /// re-entry. The caller reads the attribute directly from storage
    /// instead (the prior-step value written at the last freeze).
    Loop,
}
