//! The op set executed by [`crate::machine::EventHandlerMachine`].

use josh_units::{Units, Value};

/// The method `applyMap` uses to map a value from one range to another.
#[derive(Clone, Debug, PartialEq)]
pub enum MapMethod {
    /// Linear interpolation between the source and target ranges.
    Linear,
    /// Logistic-curve interpolation, steeper near the midpoint.
    Sigmoid,
    /// A user-named method not built into the engine; always a compile
    /// error to reach at runtime (surfaced as `UnknownMapMethod`).
    Named(String),
}

/// One instruction in a compiled handler's op stream.
///
/// `spec.md` §4.D enumerates this op set exactly; each variant here
/// corresponds to one named operation.
#[derive(Clone, Debug, PartialEq)]
pub enum Op {
    /// Push a literal value.
    Push(Value),
    /// Pop and discard the top of the stack.
    Pop,
    /// `b + a` (pops `a` then `b`, pushes the sum).
    Add,
    /// `b - a`.
    Subtract,
    /// `b * a`.
    Multiply,
    /// `b / a`.
    Divide,
    /// `b ^ a`.
    Pow,
    /// `b == a`.
    Eq,
    /// `b != a`.
    Neq,
    /// `b < a`.
    Lt,
    /// `b <= a`.
    Le,
    /// `b > a`.
    Gt,
    /// `b >= a`.
    Ge,
    /// `b && a`.
    And,
    /// `b || a`.
    Or,
    /// `!a`.
    Not,
    /// Cast the top of the stack to `units`; if `force`, relabel without
    /// converting (`castForce`).
    Cast {
        /// The target units.
        units: Units,
        /// Whether to relabel without converting.
        force: bool,
    },
    /// Clamp the top of the stack. Pops (in order) the value, then the
    /// high bound if `has_high`, then the low bound if `has_low`.
    Bound {
        /// Whether a low bound is present on the stack.
        has_low: bool,
        /// Whether a high bound is present on the stack.
        has_high: bool,
    },
    /// Map the top of the stack from one range to another. Pops (in
    /// order) the value, `from_low`, `from_high`, `to_low`, `to_high`,
    /// and an optional method parameter if `has_param`.
    ApplyMap {
        /// The mapping method.
        method: MapMethod,
        /// Whether a method parameter (e.g. sigmoid steepness) follows
        /// the range bounds on the stack.
        has_param: bool,
        /// Whether to clamp the result to `[to_low, to_high]`.
        clamp: bool,
    },
    /// String concatenation: `b ++ a`.
    Concat,
    /// Absolute value of the top of the stack.
    Abs,
    /// Resolve another attribute by name and push its value.
    PushAttribute {
        /// The attribute name to resolve.
        name: String,
    },
    /// Pop a count and create that many entities of `type_name`.
    CreateEntity {
        /// The prototype name to instantiate.
        type_name: String,
    },
    /// Pop a distance and execute a spatial query for `attribute`.
    ExecuteSpatialQuery {
        /// The attribute to gather from matching entities.
        attribute: String,
    },
    /// Pop `y` then `x` and push a 2-element position distribution.
    MakePosition,
    /// Peek the top of the stack and store it as a named local variable,
    /// leaving the value on the stack.
    SaveLocalVariable {
        /// The local variable name.
        name: String,
    },
}
