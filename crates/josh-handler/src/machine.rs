//! [`EventHandlerMachine`]: the stack interpreter for compiled handlers.

use crate::error::HandlerError;
use crate::ops::{MapMethod, Op};
use crate::scope::Scope;
use josh_units::{Distribution, Value};

/// A small stack interpreter executing one compiled handler's op stream.
///
/// `spec.md` §4.D: "the machine's stack holds typed values; the final
/// stack top after applying all actions for an RHS is the resolved
/// value."
#[derive(Default)]
pub struct EventHandlerMachine {
    stack: Vec<Value>,
}

impl EventHandlerMachine {
    /// Construct an empty machine.
    pub fn new() -> Self {
        Self { stack: Vec::new() }
    }

    fn pop(&mut self) -> Result<Value, HandlerError> {
        self.stack.pop().ok_or(HandlerError::StackUnderflow)
    }

    fn pop_bool(&mut self) -> Result<bool, HandlerError> {
        match self.pop()? {
            Value::Boolean(b, _) => Ok(b),
            other => Err(HandlerError::TypeMismatch {
                expected: "boolean",
                found: format!("{other:?}"),
            }),
        }
    }

    fn pop_string(&mut self) -> Result<String, HandlerError> {
        match self.pop()? {
            Value::String(s, _) => Ok(s),
            other => Err(HandlerError::TypeMismatch {
                expected: "string",
                found: format!("{other:?}"),
            }),
        }
    }

    fn pop_f64(&mut self) -> Result<f64, HandlerError> {
        let v = self.pop()?;
        v.as_f64().ok_or_else(|| HandlerError::TypeMismatch {
            expected: "numeric",
            found: format!("{v:?}"),
        })
    }

    /// Run the given op stream against `scope`, returning the final
    /// stack-top value. The op stream must leave exactly one value on
    /// the stack.
    pub fn run(&mut self, ops: &[Op], scope: &mut dyn Scope) -> Result<Value, HandlerError> {
        self.stack.clear();
        for op in ops {
            self.step(op, scope)?;
        }
        self.pop()
    }

    fn step(&mut self, op: &Op, scope: &mut dyn Scope) -> Result<(), HandlerError> {
        match op {
            Op::Push(v) => self.stack.push(v.clone()),
            Op::Pop => {
                self.pop()?;
            }
            Op::Add => {
                let a = self.pop()?;
                let b = self.pop()?;
                self.stack.push(b.add(&a, scope.unit_registry())?);
            }
            Op::Subtract => {
                let a = self.pop()?;
                let b = self.pop()?;
                self.stack.push(b.subtract(&a, scope.unit_registry())?);
            }
            Op::Multiply => {
                let a = self.pop()?;
                let b = self.pop()?;
                self.stack.push(b.multiply(&a)?);
            }
            Op::Divide => {
                let a = self.pop()?;
                let b = self.pop()?;
                self.stack.push(b.divide(&a)?);
            }
            Op::Pow => {
                let a = self.pop()?;
                let b = self.pop()?;
                self.stack.push(b.raise_to_power(&a)?);
            }
            Op::Eq => {
                let a = self.pop()?;
                let b = self.pop()?;
                let eq = b.values_equal(&a, scope.unit_registry())?;
                self.stack.push(Value::Boolean(eq, josh_units::Units::empty()));
            }
            Op::Neq => {
                let a = self.pop()?;
                let b = self.pop()?;
                let eq = b.values_equal(&a, scope.unit_registry())?;
                self.stack.push(Value::Boolean(!eq, josh_units::Units::empty()));
            }
            Op::Lt | Op::Le | Op::Gt | Op::Ge => {
                let a = self.pop()?;
                let b = self.pop()?;
                let ord = b.compare(&a, scope.unit_registry())?;
                let result = match (op, ord) {
                    (Op::Lt, Some(o)) => o == std::cmp::Ordering::Less,
                    (Op::Le, Some(o)) => o != std::cmp::Ordering::Greater,
                    (Op::Gt, Some(o)) => o == std::cmp::Ordering::Greater,
                    (Op::Ge, Some(o)) => o != std::cmp::Ordering::Less,
                    _ => false,
                };
                self.stack.push(Value::Boolean(result, josh_units::Units::empty()));
            }
            Op::And => {
                let a = self.pop_bool()?;
                let b = self.pop_bool()?;
                self.stack.push(Value::Boolean(a && b, josh_units::Units::empty()));
            }
            Op::Or => {
                let a = self.pop_bool()?;
                let b = self.pop_bool()?;
                self.stack.push(Value::Boolean(a || b, josh_units::Units::empty()));
            }
            Op::Not => {
                let a = self.pop_bool()?;
                self.stack.push(Value::Boolean(!a, josh_units::Units::empty()));
            }
            Op::Cast { units, force } => {
                let v = self.pop()?;
                let result = if *force {
                    v.cast_force(units)
                } else {
                    v.cast(units, scope.unit_registry())?
                };
                self.stack.push(result);
            }
            Op::Bound { has_low, has_high } => {
                let v = self.pop()?;
                let high = if *has_high { Some(self.pop_f64()?) } else { None };
                let low = if *has_low { Some(self.pop_f64()?) } else { None };
                let units = v.units().clone();
                let mut x = v.as_f64().ok_or_else(|| HandlerError::TypeMismatch {
                    expected: "numeric",
                    found: format!("{v:?}"),
                })?;
                if let Some(lo) = low {
                    x = x.max(lo);
                }
                if let Some(hi) = high {
                    x = x.min(hi);
                }
                self.stack.push(v.rebuild_like(x, units));
            }
            Op::ApplyMap {
                method,
                has_param,
                clamp,
            } => {
                let param = if *has_param { Some(self.pop_f64()?) } else { None };
                let to_high = self.pop_f64()?;
                let to_low = self.pop_f64()?;
                let from_high = self.pop_f64()?;
                let from_low = self.pop_f64()?;
                let v = self.pop()?;
                let units = v.units().clone();
                let x = v.as_f64().ok_or_else(|| HandlerError::TypeMismatch {
                    expected: "numeric",
                    found: format!("{v:?}"),
                })?;
                let mapped = apply_map(method, x, from_low, from_high, to_low, to_high, param)?;
                let mapped = if *clamp {
                    mapped.clamp(to_low.min(to_high), to_low.max(to_high))
                } else {
                    mapped
                };
                self.stack.push(v.rebuild_like(mapped, units));
            }
            Op::Concat => {
                let a = self.pop_string()?;
                let b = self.pop_string()?;
                self.stack.push(Value::String(b + &a, josh_units::Units::empty()));
            }
            Op::Abs => {
                let v = self.pop()?;
                let units = v.units().clone();
                let x = v.as_f64().ok_or_else(|| HandlerError::TypeMismatch {
                    expected: "numeric",
                    found: format!("{v:?}"),
                })?;
                self.stack.push(v.rebuild_like(x.abs(), units));
            }
            Op::PushAttribute { name } => {
                let v = scope.resolve_attribute(name)?;
                self.stack.push(v);
            }
            Op::CreateEntity { type_name } => {
                let count = self.pop_f64()? as i64;
                let v = scope.create_entities(type_name, count)?;
                self.stack.push(v);
            }
            Op::ExecuteSpatialQuery { attribute } => {
                let distance = self.pop()?;
                let v = scope.execute_spatial_query(attribute, &distance)?;
                self.stack.push(v);
            }
            Op::MakePosition => {
                let y = self.pop_f64()?;
                let x = self.pop_f64()?;
                self.stack.push(Value::Distribution(
                    Distribution::Realized(vec![x, y]),
                    josh_units::Units::empty(),
                ));
            }
            Op::SaveLocalVariable { name } => {
                let v = self.pop()?;
                scope.set_local(name, v.clone());
                self.stack.push(v);
            }
        }
        Ok(())
    }
}

fn apply_map(
    method: &MapMethod,
    x: f64,
    from_low: f64,
    from_high: f64,
    to_low: f64,
    to_high: f64,
    param: Option<f64>,
) -> Result<f64, HandlerError> {
    let span = from_high - from_low;
    let frac = if span == 0.0 { 0.0 } else { (x - from_low) / span };
    match method {
        MapMethod::Linear => Ok(to_low + frac * (to_high - to_low)),
        MapMethod::Sigmoid => {
            let steepness = param.unwrap_or(1.0);
            let logistic = 1.0 / (1.0 + (-steepness * (frac - 0.5) * 12.0).exp());
            Ok(to_low + logistic * (to_high - to_low))
        }
        MapMethod::Named(name) => Err(HandlerError::UnknownMapMethod(name.clone())),
    }
}

/// Helper extending [`Value`] with a "same variant, new magnitude" builder
/// used by unary/clamp ops that want to preserve the numeric backend.
trait RebuildLike {
    fn rebuild_like(&self, magnitude: f64, units: josh_units::Units) -> Value;
}

impl RebuildLike for Value {
    fn rebuild_like(&self, magnitude: f64, units: josh_units::Units) -> Value {
        match self {
            Value::Int(..) => Value::Int(magnitude.round() as i64, units),
            Value::Decimal(..) => Value::Decimal(
                rust_decimal::Decimal::from_f64_retain(magnitude).unwrap_or_default(),
                units,
            ),
            _ => Value::Double(magnitude, units),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use josh_units::{UnitRegistry, Units};
    use std::collections::HashMap;

    struct TestScope {
        registry: UnitRegistry,
        attributes: HashMap<String, Value>,
        locals: HashMap<String, Value>,
    }

    impl Scope for TestScope {
        fn resolve_attribute(&mut self, name: &str) -> Result<Value, HandlerError> {
            self.attributes
                .get(name)
                .cloned()
                .ok_or_else(|| HandlerError::ScopeError(format!("missing attribute {name}")))
        }

        fn create_entities(&mut self, _type_name: &str, _count: i64) -> Result<Value, HandlerError> {
            unimplemented!("not exercised in this test")
        }

        fn execute_spatial_query(
            &mut self,
            _attribute: &str,
            _distance: &Value,
        ) -> Result<Value, HandlerError> {
            unimplemented!("not exercised in this test")
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
            attributes: HashMap::new(),
            locals: HashMap::new(),
        }
    }

    #[test]
    fn push_attribute_plus_constant() {
        let mut s = scope();
        s.attributes.insert(
            "prior.value".to_string(),
            Value::Int(5, Units::base("m")),
        );
        let ops = vec![
            Op::PushAttribute {
                name: "prior.value".to_string(),
            },
            Op::Push(Value::Int(1, Units::base("m"))),
            Op::Add,
        ];
        let mut machine = EventHandlerMachine::new();
        let result = machine.run(&ops, &mut s).unwrap();
        assert_eq!(result, Value::Int(6, Units::base("m")));
    }

    #[test]
    fn bound_clamps_to_range() {
        let ops = vec![
            Op::Push(Value::Double(15.0, Units::empty())),
            Op::Push(Value::Double(0.0, Units::empty())),
            Op::Push(Value::Double(10.0, Units::empty())),
            Op::Bound {
                has_low: true,
                has_high: true,
            },
        ];
        let mut machine = EventHandlerMachine::new();
        let mut s = scope();
        let result = machine.run(&ops, &mut s).unwrap();
        assert_eq!(result, Value::Double(10.0, Units::empty()));
    }

    #[test]
    fn linear_map_rescales_range() {
        let ops = vec![
            Op::Push(Value::Double(5.0, Units::empty())),
            Op::Push(Value::Double(0.0, Units::empty())),
            Op::Push(Value::Double(10.0, Units::empty())),
            Op::Push(Value::Double(0.0, Units::empty())),
            Op::Push(Value::Double(100.0, Units::empty())),
            Op::ApplyMap {
                method: MapMethod::Linear,
                has_param: false,
                clamp: true,
            },
        ];
        let mut machine = EventHandlerMachine::new();
        let mut s = scope();
        let result = machine.run(&ops, &mut s).unwrap();
        assert_eq!(result, Value::Double(50.0, Units::empty()));
    }

    #[test]
    fn save_local_variable_keeps_value_on_stack() {
        let ops = vec![
            Op::Push(Value::Int(3, Units::empty())),
            Op::SaveLocalVariable {
                name: "x".to_string(),
            },
        ];
        let mut machine = EventHandlerMachine::new();
        let mut s = scope();
        let result = machine.run(&ops, &mut s).unwrap();
        assert_eq!(result, Value::Int(3, Units::empty()));
        assert_eq!(s.get_local("x"), Some(Value::Int(3, Units::empty())));
    }
}
