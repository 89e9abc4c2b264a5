//! The typed value algebra (`spec.md` §3, §4.A).

use crate::distribution::Distribution;
use crate::error::UnitsError;
use crate::units::{UnitRegistry, Units};
use josh_core::EntityId;
use rust_decimal::Decimal;
use std::fmt;

/// A reference to an entity, carried as a typed value.
///
/// `spec.md` §3: `EntityRef(Entity, Units=entity-type-name)` — the units
/// string for this variant is the referenced entity's type name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityRef {
    /// The referenced entity's identity.
    pub id: EntityId,
    /// The referenced entity's prototype/type name.
    pub type_name: String,
}

/// A tagged sum of every value shape the DSL can produce, each carrying
/// units.
///
/// `spec.md` §3: "Every value carries units." Numeric precision is
/// selectable: `Int` for exact integers, `Decimal` for exact fixed-point
/// arithmetic (`rust_decimal::Decimal`), `Double` for IEEE 754 `f64`.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// An exact integer value.
    Int(i64, Units),
    /// An exact decimal value, used when `favorBigDecimal` reproducibility
    /// is required.
    Decimal(Decimal, Units),
    /// An IEEE 754 double-precision value.
    Double(f64, Units),
    /// A boolean, still unit-bearing (typically [`Units::empty`]).
    Boolean(bool, Units),
    /// A text value.
    String(String, Units),
    /// A reference to another entity.
    EntityRef(EntityRef, Units),
    /// A distribution of numeric values.
    Distribution(Distribution, Units),
}

impl Value {
    /// The units this value carries.
    pub fn units(&self) -> &Units {
        match self {
            Value::Int(_, u)
            | Value::Decimal(_, u)
            | Value::Double(_, u)
            | Value::Boolean(_, u)
            | Value::String(_, u)
            | Value::EntityRef(_, u)
            | Value::Distribution(_, u) => u,
        }
    }

    /// Coerce a numeric value to `f64`. Returns `None` for non-numeric
    /// variants.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v, _) => Some(*v as f64),
            Value::Decimal(v, _) => v.to_string().parse().ok(),
            Value::Double(v, _) => Some(*v),
            _ => None,
        }
    }

    fn numeric_kind_rank(&self) -> Option<u8> {
        match self {
            Value::Int(..) => Some(0),
            Value::Double(..) => Some(1),
            Value::Decimal(..) => Some(2),
            _ => None,
        }
    }

    fn require_alias_equal(
        registry: &UnitRegistry,
        a: &Units,
        b: &Units,
    ) -> Result<(), UnitsError> {
        if registry.units_equal(a, b) {
            Ok(())
        } else {
            Err(UnitsError::UnitMismatch {
                left: a.canonical_string(),
                right: b.canonical_string(),
            })
        }
    }

    /// `self + other`. Requires alias-equal units. Numeric promotion:
    /// `Int + Int -> Int`; otherwise promotes to the "wider" of
    /// `Double`/`Decimal` present, preferring `Decimal` when either
    /// operand is `Decimal`.
    pub fn add(&self, other: &Value, registry: &UnitRegistry) -> Result<Value, UnitsError> {
        Self::require_alias_equal(registry, self.units(), other.units())?;
        self.numeric_binop(other, |a, b| a + b, |a, b| a + b, |a, b| a + b)
    }

    /// `self - other`. Requires alias-equal units.
    pub fn subtract(&self, other: &Value, registry: &UnitRegistry) -> Result<Value, UnitsError> {
        Self::require_alias_equal(registry, self.units(), other.units())?;
        self.numeric_binop(other, |a, b| a - b, |a, b| a - b, |a, b| a - b)
    }

    /// `self * other`. Units compose by concatenation (`m * s`), cancelling
    /// common factors against the canonical form.
    pub fn multiply(&self, other: &Value) -> Result<Value, UnitsError> {
        let units = self.units().multiply(other.units());
        self.numeric_binop_units(other, units, |a, b| a * b, |a, b| a * b, |a, b| a * b)
    }

    /// `self / other`. Units compose by division (`m / s`). Fails with
    /// `DivideByZero` if `other` is numerically zero.
    pub fn divide(&self, other: &Value) -> Result<Value, UnitsError> {
        if let Some(v) = other.as_f64() {
            if v == 0.0 {
                return Err(UnitsError::DivideByZero);
            }
        }
        let units = self.units().divide(other.units());
        self.numeric_binop_units(other, units, |a, b| a / b, |a, b| a / b, |a, b| a / b)
    }

    /// `self ^ exponent`. `exponent` must be dimensionless; if `self` is
    /// dimensioned, `exponent` must additionally be an integer value.
    pub fn raise_to_power(&self, exponent: &Value) -> Result<Value, UnitsError> {
        if !exponent.units().is_empty() {
            return Err(UnitsError::UnsupportedPower {
                base_units: self.units().canonical_string(),
            });
        }
        let exp_f64 = exponent
            .as_f64()
            .ok_or_else(|| UnitsError::UnsupportedPower {
                base_units: self.units().canonical_string(),
            })?;
        if !self.units().is_empty() && exp_f64.fract() != 0.0 {
            return Err(UnitsError::UnsupportedPower {
                base_units: self.units().canonical_string(),
            });
        }
        let result_units = self.units().pow(exp_f64 as i32);
        let base = self
            .as_f64()
            .ok_or_else(|| UnitsError::UnsupportedPower {
                base_units: self.units().canonical_string(),
            })?;
        Ok(Value::Double(base.powf(exp_f64), result_units))
    }

    /// Compare for equality under unit alias rules.
    pub fn values_equal(&self, other: &Value, registry: &UnitRegistry) -> Result<bool, UnitsError> {
        Self::require_alias_equal(registry, self.units(), other.units())?;
        Ok(self.compare_raw(other) == Some(std::cmp::Ordering::Equal))
    }

    /// Ordered comparison under unit alias rules. Returns `None` if the
    /// underlying values are not ordered relative to one another (e.g.
    /// distinct entity refs).
    pub fn compare(
        &self,
        other: &Value,
        registry: &UnitRegistry,
    ) -> Result<Option<std::cmp::Ordering>, UnitsError> {
        Self::require_alias_equal(registry, self.units(), other.units())?;
        Ok(self.compare_raw(other))
    }

    fn compare_raw(&self, other: &Value) -> Option<std::cmp::Ordering> {
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => match (self, other) {
                (Value::String(a, _), Value::String(b, _)) => Some(a.cmp(b)),
                (Value::Boolean(a, _), Value::Boolean(b, _)) => Some(a.cmp(b)),
                _ => None,
            },
        }
    }

    /// Cast to `target_units`: a no-op if units are alias-equal, a
    /// conversion if the registry declares a path, an error otherwise.
    pub fn cast(&self, target_units: &Units, registry: &UnitRegistry) -> Result<Value, UnitsError> {
        if registry.units_equal(self.units(), target_units) {
            return Ok(self.clone());
        }
        match registry.conversion_factor(self.units(), target_units) {
            Some(factor) => {
                let value = self
                    .as_f64()
                    .ok_or_else(|| UnitsError::UnitMismatch {
                        left: self.units().canonical_string(),
                        right: target_units.canonical_string(),
                    })?
                    * factor;
                Ok(self.rebuild_numeric(value, target_units.clone()))
            }
            None => Err(UnitsError::UnitMismatch {
                left: self.units().canonical_string(),
                right: target_units.canonical_string(),
            }),
        }
    }

    /// Relabel units without converting the magnitude. Used for
    /// known-compatible reinterpretation (`spec.md` §4.A).
    pub fn cast_force(&self, target_units: &Units) -> Value {
        match self {
            Value::Int(v, _) => Value::Int(*v, target_units.clone()),
            Value::Decimal(v, _) => Value::Decimal(*v, target_units.clone()),
            Value::Double(v, _) => Value::Double(*v, target_units.clone()),
            Value::Boolean(v, _) => Value::Boolean(*v, target_units.clone()),
            Value::String(v, _) => Value::String(v.clone(), target_units.clone()),
            Value::EntityRef(v, _) => Value::EntityRef(v.clone(), target_units.clone()),
            Value::Distribution(v, _) => Value::Distribution(v.clone(), target_units.clone()),
        }
    }

    fn rebuild_numeric(&self, value: f64, units: Units) -> Value {
        match self {
            Value::Int(..) => Value::Int(value.round() as i64, units),
            Value::Decimal(..) => Value::Decimal(
                Decimal::from_f64_retain(value).unwrap_or_default(),
                units,
            ),
            _ => Value::Double(value, units),
        }
    }

    fn numeric_binop(
        &self,
        other: &Value,
        int_op: impl Fn(i64, i64) -> i64,
        dec_op: impl Fn(Decimal, Decimal) -> Decimal,
        float_op: impl Fn(f64, f64) -> f64,
    ) -> Result<Value, UnitsError> {
        let units = self.units().clone();
        self.numeric_binop_units(other, units, int_op, dec_op, float_op)
    }

    fn numeric_binop_units(
        &self,
        other: &Value,
        units: Units,
        int_op: impl Fn(i64, i64) -> i64,
        dec_op: impl Fn(Decimal, Decimal) -> Decimal,
        float_op: impl Fn(f64, f64) -> f64,
    ) -> Result<Value, UnitsError> {
        let rank = self
            .numeric_kind_rank()
            .max(other.numeric_kind_rank())
            .ok_or_else(|| UnitsError::UnitMismatch {
                left: self.units().canonical_string(),
                right: other.units().canonical_string(),
            })?;
        match rank {
            2 => {
                let a = self.as_decimal();
                let b = other.as_decimal();
                Ok(Value::Decimal(dec_op(a, b), units))
            }
            1 => {
                let a = self.as_f64().unwrap_or_default();
                let b = other.as_f64().unwrap_or_default();
                Ok(Value::Double(float_op(a, b), units))
            }
            _ => {
                if let (Value::Int(a, _), Value::Int(b, _)) = (self, other) {
                    Ok(Value::Int(int_op(*a, *b), units))
                } else {
                    let a = self.as_f64().unwrap_or_default();
                    let b = other.as_f64().unwrap_or_default();
                    Ok(Value::Double(float_op(a, b), units))
                }
            }
        }
    }

    fn as_decimal(&self) -> Decimal {
        match self {
            Value::Decimal(v, _) => *v,
            other => Decimal::from_f64_retain(other.as_f64().unwrap_or_default()).unwrap_or_default(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let units = self.units().canonical_string();
        match self {
            Value::Int(v, _) => write!(f, "{v} {units}"),
            Value::Decimal(v, _) => write!(f, "{v} {units}"),
            Value::Double(v, _) => write!(f, "{v} {units}"),
            Value::Boolean(v, _) => write!(f, "{v} {units}"),
            Value::String(v, _) => write!(f, "{v:?} {units}"),
            Value::EntityRef(v, _) => write!(f, "<{}:{}> {units}", v.type_name, v.id),
            Value::Distribution(_, _) => write!(f, "<distribution> {units}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meters(v: i64) -> Value {
        Value::Int(v, Units::base("m"))
    }

    #[test]
    fn add_requires_alias_equal_units() {
        let reg = UnitRegistry::new();
        let a = meters(1);
        let b = Value::Int(1, Units::base("s"));
        assert!(matches!(
            a.add(&b, &reg),
            Err(UnitsError::UnitMismatch { .. })
        ));
    }

    #[test]
    fn add_succeeds_for_alias_equal_units() {
        let mut reg = UnitRegistry::new();
        reg.register_alias_class(&["year", "yeers", "yrs"]);
        let a = Value::Int(1, reg.parse("year"));
        let b = Value::Int(1, reg.parse("yeers"));
        let sum = a.add(&b, &reg).unwrap();
        assert_eq!(sum, Value::Int(2, reg.parse("year")));
    }

    #[test]
    fn multiply_composes_units() {
        let a = Value::Double(2.0, Units::base("m"));
        let b = Value::Double(3.0, Units::base("s"));
        let product = a.multiply(&b).unwrap();
        assert_eq!(product.units().canonical_string(), "m*s");
        assert_eq!(product.as_f64(), Some(6.0));
    }

    #[test]
    fn divide_by_zero_is_an_error() {
        let a = meters(1);
        let b = Value::Int(0, Units::empty());
        assert_eq!(a.divide(&b), Err(UnitsError::DivideByZero));
    }

    #[test]
    fn raise_to_power_requires_integer_exponent_for_dimensioned_base() {
        let base = meters(4);
        let half = Value::Double(0.5, Units::empty());
        assert!(matches!(
            base.raise_to_power(&half),
            Err(UnitsError::UnsupportedPower { .. })
        ));
        let squared = Value::Double(2.0, Units::empty());
        let result = base.raise_to_power(&squared).unwrap();
        assert_eq!(result.units().canonical_string(), "m^2");
    }

    #[test]
    fn cast_is_noop_for_alias_equal_units() {
        let reg = UnitRegistry::new();
        let a = meters(5);
        let casted = a.cast(&Units::base("m"), &reg).unwrap();
        assert_eq!(casted, a);
    }

    #[test]
    fn cast_without_path_fails() {
        let reg = UnitRegistry::new();
        let a = meters(5);
        assert!(matches!(
            a.cast(&Units::base("s"), &reg),
            Err(UnitsError::UnitMismatch { .. })
        ));
    }

    #[test]
    fn cast_force_relabels_without_converting() {
        let a = meters(5);
        let relabeled = a.cast_force(&Units::base("count"));
        assert_eq!(relabeled, Value::Int(5, Units::base("count")));
    }
}
