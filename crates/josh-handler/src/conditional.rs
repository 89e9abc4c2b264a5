//! Conditional handler bodies and the chained-elif builder.

use crate::error::HandlerError;
use crate::machine::EventHandlerMachine;
use crate::ops::Op;
use crate::scope::Scope;
use josh_units::Value;

/// A compiled handler body: either a flat op stream, or an `if`/`elif`/
/// `else` chain.
///
/// `spec.md` §4.D: "A `ConditionalAction` holds `(cond, then, else)` and
/// chained elif forms are built by a builder."
#[derive(Clone, Debug, PartialEq)]
pub enum EventHandlerAction {
    /// A flat op stream, executed unconditionally.
    Ops(Vec<Op>),
    /// An `if`/`elif`/`else` chain.
    Conditional(ConditionalAction),
}

impl EventHandlerAction {
    /// Execute this action against `scope`, returning the resolved value.
    pub fn execute(&self, scope: &mut dyn Scope) -> Result<Value, HandlerError> {
        let mut machine = EventHandlerMachine::new();
        match self {
            EventHandlerAction::Ops(ops) => machine.run(ops, scope),
            EventHandlerAction::Conditional(cond) => cond.execute(scope),
        }
    }
}

/// One `if cond then ... else ...` node. The `else` branch may itself be
/// a nested [`ConditionalAction`] (an `elif`), built by
/// [`ConditionalBuilder`].
#[derive(Clone, Debug, PartialEq)]
pub struct ConditionalAction {
    cond: Vec<Op>,
    then_branch: Box<EventHandlerAction>,
    else_branch: Option<Box<EventHandlerAction>>,
}

impl ConditionalAction {
    /// Execute: evaluate `cond`, run `then_branch` if true, else
    /// `else_branch` if present, else fail with a type mismatch (every
    /// compiled conditional chain must end in an `else`, enforced by the
    /// upstream compiler, not re-validated here).
    pub fn execute(&self, scope: &mut dyn Scope) -> Result<Value, HandlerError> {
        let mut machine = EventHandlerMachine::new();
        let cond_value = machine.run(&self.cond, scope)?;
        let cond_true = match cond_value {
            Value::Boolean(b, _) => b,
            other => {
                return Err(HandlerError::TypeMismatch {
                    expected: "boolean",
                    found: format!("{other:?}"),
                })
            }
        };
        if cond_true {
            self.then_branch.execute(scope)
        } else {
            match &self.else_branch {
                Some(branch) => branch.execute(scope),
                None => Err(HandlerError::TypeMismatch {
                    expected: "a matching branch (no else present)",
                    found: "none".to_string(),
                }),
            }
        }
    }
}

/// Builds an `if`/`elif`/`elif`/.../`else` chain bottom-up.
///
/// Branches are appended in source order (`if`, then each `elif`, then the
/// final `else`); [`build`](Self::build) assembles them into nested
/// [`ConditionalAction`]s so evaluation short-circuits at the first true
/// condition, exactly as written.
#[derive(Default)]
pub struct ConditionalBuilder {
    /// `(condition ops, body)` pairs in `if`/`elif` order.
    branches: Vec<(Vec<Op>, EventHandlerAction)>,
    /// The trailing `else` body, if any.
    else_branch: Option<EventHandlerAction>,
}

impl ConditionalBuilder {
    /// Start a new, empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an `if`/`elif` branch.
    pub fn branch(mut self, cond: Vec<Op>, body: EventHandlerAction) -> Self {
        self.branches.push((cond, body));
        self
    }

    /// Set the trailing `else` body.
    pub fn with_else(mut self, body: EventHandlerAction) -> Self {
        self.else_branch = Some(body);
        self
    }

    /// Assemble the chain. Returns the innermost body directly if no
    /// branches were added (only an `else`, or nothing).
    pub fn build(mut self) -> EventHandlerAction {
        let mut tail = self.else_branch.take();
        while let Some((cond, body)) = self.branches.pop() {
            let action = ConditionalAction {
                cond,
                then_branch: Box::new(body),
                else_branch: tail.take().map(Box::new),
            };
            tail = Some(EventHandlerAction::Conditional(action));
        }
        tail.unwrap_or(EventHandlerAction::Ops(Vec::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use josh_units::{UnitRegistry, Units};
    use std::collections::HashMap;

    struct TestScope {
        registry: UnitRegistry,
        locals: HashMap<String, Value>,
    }

    impl Scope for TestScope {
        fn resolve_attribute(&mut self, _name: &str) -> Result<Value, HandlerError> {
            unimplemented!()
        }
        fn create_entities(&mut self, _t: &str, _c: i64) -> Result<Value, HandlerError> {
            unimplemented!()
        }
        fn execute_spatial_query(&mut self, _a: &str, _d: &Value) -> Result<Value, HandlerError> {
            unimplemented!()
        }
        fn unit_registry(&self) -> &UnitRegistry {
            &self.registry
        }
        fn set_local(&mut self, name: &str, value: Value) {
            self.locals.insert(name.to_string(), value);
        }
        fn get_local(&self, name: &str) -> Option<Value> {
            self.locals.get(name).cloned()
        }
    }

    fn scope() -> TestScope {
        TestScope {
            registry: UnitRegistry::new(),
            locals: HashMap::new(),
        }
    }

    #[test]
    fn elif_chain_picks_first_true_branch() {
        let chain = ConditionalBuilder::new()
            .branch(
                vec![Op::Push(Value::Boolean(false, Units::empty()))],
                EventHandlerAction::Ops(vec![Op::Push(Value::Int(1, Units::empty()))]),
            )
            .branch(
                vec![Op::Push(Value::Boolean(true, Units::empty()))],
                EventHandlerAction::Ops(vec![Op::Push(Value::Int(2, Units::empty()))]),
            )
            .with_else(EventHandlerAction::Ops(vec![Op::Push(Value::Int(3, Units::empty()))]))
            .build();

        let mut s = scope();
        let result = chain.execute(&mut s).unwrap();
        assert_eq!(result, Value::Int(2, Units::empty()));
    }

    #[test]
    fn falls_through_to_else() {
        let chain = ConditionalBuilder::new()
            .branch(
                vec![Op::Push(Value::Boolean(false, Units::empty()))],
                EventHandlerAction::Ops(vec![Op::Push(Value::Int(1, Units::empty()))]),
            )
            .with_else(EventHandlerAction::Ops(vec![Op::Push(Value::Int(9, Units::empty()))]))
            .build();

        let mut s = scope();
        let result = chain.execute(&mut s).unwrap();
        assert_eq!(result, Value::Int(9, Units::empty()));
    }
}
