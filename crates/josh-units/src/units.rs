//! The [`Units`] product-of-base-unit-powers type and [`UnitRegistry`].

use std::collections::HashMap;
use std::fmt;

/// A single base unit raised to an integer power, e.g. `m^2` or `s^-1`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct UnitTerm {
    base: String,
    power: i32,
}

/// Canonical units label: a product of base-unit powers.
///
/// `spec.md` §3: "Canonical string formed from multiplicative combinations
/// of base units." Constructed through a [`UnitRegistry`] so that every
/// base name has already been mapped to its alias-class representative;
/// once canonicalized, `PartialEq` is a plain field compare (`spec.md` §9:
/// "equality is then a field compare").
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Units {
    terms: Vec<UnitTerm>,
}

impl Units {
    /// The dimensionless unit.
    pub fn empty() -> Self {
        Self { terms: Vec::new() }
    }

    /// Whether this is the dimensionless unit.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Construct from a single base unit raised to the first power.
    pub fn base(name: impl Into<String>) -> Self {
        Self {
            terms: vec![UnitTerm {
                base: name.into(),
                power: 1,
            }],
        }
    }

    fn normalize(mut terms: Vec<UnitTerm>) -> Self {
        terms.sort();
        let mut merged: Vec<UnitTerm> = Vec::with_capacity(terms.len());
        for term in terms {
            if let Some(last) = merged.last_mut() {
                if last.base == term.base {
                    last.power += term.power;
                    continue;
                }
            }
            merged.push(term);
        }
        merged.retain(|t| t.power != 0);
        Self { terms: merged }
    }

    /// Compose two units by multiplying (`U * V`), cancelling common
    /// factors against the canonical form.
    pub fn multiply(&self, other: &Units) -> Units {
        let mut terms = self.terms.clone();
        terms.extend(other.terms.iter().cloned());
        Self::normalize(terms)
    }

    /// Compose two units by dividing (`U / V`), cancelling common factors.
    pub fn divide(&self, other: &Units) -> Units {
        let mut terms = self.terms.clone();
        terms.extend(other.terms.iter().map(|t| UnitTerm {
            base: t.base.clone(),
            power: -t.power,
        }));
        Self::normalize(terms)
    }

    /// Raise this unit to an integer power.
    pub fn pow(&self, exponent: i32) -> Units {
        if exponent == 0 {
            return Units::empty();
        }
        let terms = self
            .terms
            .iter()
            .map(|t| UnitTerm {
                base: t.base.clone(),
                power: t.power * exponent,
            })
            .collect();
        Self::normalize(terms)
    }

    /// Render the canonical string form, e.g. `m/s` or `m^2*s^-1`.
    pub fn canonical_string(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.terms.is_empty() {
            return write!(f, "");
        }
        let rendered: Vec<String> = self
            .terms
            .iter()
            .map(|t| {
                if t.power == 1 {
                    t.base.clone()
                } else {
                    format!("{}^{}", t.base, t.power)
                }
            })
            .collect();
        write!(f, "{}", rendered.join("*"))
    }
}

/// Parses unit strings and holds alias classes and declared conversions.
///
/// `spec.md` §3: "users may declare `alias` lists that make two unit
/// strings equivalent; the converter also holds declared conversions
/// (identity and user-defined directional conversions)."
#[derive(Clone, Debug, Default)]
pub struct UnitRegistry {
    /// Raw base-unit name -> canonical alias-class representative.
    aliases: HashMap<String, String>,
    /// `(from, to)` canonical base names -> multiplicative factor.
    conversions: HashMap<(String, String), f64>,
}

impl UnitRegistry {
    /// Construct an empty registry: no aliases, no declared conversions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare that `names` are all aliases of one another. The first name
    /// becomes the canonical representative.
    pub fn register_alias_class(&mut self, names: &[&str]) {
        if let Some((canonical, rest)) = names.split_first() {
            for name in rest {
                self.aliases.insert((*name).to_string(), canonical.to_string());
            }
            self.aliases
                .entry((*canonical).to_string())
                .or_insert_with(|| canonical.to_string());
        }
    }

    /// Declare a directional conversion: one `from` unit equals `factor`
    /// `to` units.
    pub fn register_conversion(&mut self, from: &str, to: &str, factor: f64) {
        let from = self.canonical_base(from);
        let to = self.canonical_base(to);
        self.conversions.insert((from, to), factor);
    }

    fn canonical_base(&self, base: &str) -> String {
        self.aliases
            .get(base)
            .cloned()
            .unwrap_or_else(|| base.to_string())
    }

    /// Parse a unit expression (e.g. `"m/s"`, `"m*s^-1"`, `"count"`, or
    /// `""` for dimensionless) into canonical [`Units`], mapping every base
    /// name through the alias table.
    pub fn parse(&self, expr: &str) -> Units {
        let expr = expr.trim();
        if expr.is_empty() {
            return Units::empty();
        }
        let mut terms = Vec::new();
        let mut sign = 1;
        for token in tokenize(expr) {
            match token {
                Token::Mul => sign = 1,
                Token::Div => sign = -1,
                Token::Name(name, power) => {
                    let base = self.canonical_base(&name);
                    terms.push(UnitTerm {
                        base,
                        power: power * sign,
                    });
                }
            }
        }
        Units::normalize(terms)
    }

    /// Look up a direct conversion factor for the whole unit expression,
    /// when both sides are a single base unit (the common case: a user
    /// declares `meters -> feet`, not a compound conversion).
    ///
    /// Returns `None` if no declared conversion applies.
    pub fn conversion_factor(&self, from: &Units, to: &Units) -> Option<f64> {
        let (from_base, from_pow) = from.sole_term()?;
        let (to_base, to_pow) = to.sole_term()?;
        if from_pow != to_pow {
            return None;
        }
        self.conversions
            .get(&(from_base.clone(), to_base.clone()))
            .map(|factor| factor.powi(from_pow))
    }

    /// Two units compare equal iff they share an alias class: their
    /// canonical forms (already alias-mapped by [`parse`](Self::parse))
    /// are structurally equal.
    pub fn units_equal(&self, a: &Units, b: &Units) -> bool {
        a == b
    }
}

impl Units {
    fn sole_term(&self) -> Option<(&String, i32)> {
        match self.terms.as_slice() {
            [t] => Some((&t.base, t.power)),
            _ => None,
        }
    }
}

enum Token {
    Mul,
    Div,
    Name(String, i32),
}

fn tokenize(expr: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = expr.char_indices().peekable();
    let mut current_op = Token::Mul;
    let mut buf = String::new();
    let flush = |buf: &mut String, tokens: &mut Vec<Token>, op: Token| {
        if !buf.is_empty() {
            tokens.push(op);
            let (name, power) = split_power(buf);
            tokens.push(Token::Name(name, power));
            buf.clear();
        }
    };
    while let Some((_, c)) = chars.next() {
        match c {
            '*' => {
                flush(&mut buf, &mut tokens, current_op);
                current_op = Token::Mul;
            }
            '/' => {
                flush(&mut buf, &mut tokens, current_op);
                current_op = Token::Div;
            }
            _ => buf.push(c),
        }
    }
    flush(&mut buf, &mut tokens, current_op);
    tokens
}

fn split_power(token: String) -> (String, i32) {
    if let Some(idx) = token.find('^') {
        let (name, pow) = token.split_at(idx);
        let pow = pow[1..].parse::<i32>().unwrap_or(1);
        (name.to_string(), pow)
    } else {
        (token, 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_equivalence() {
        let mut reg = UnitRegistry::new();
        reg.register_alias_class(&["year", "yeers", "yrs"]);
        let a = reg.parse("year");
        let b = reg.parse("yeers");
        let c = reg.parse("yrs");
        assert!(reg.units_equal(&a, &b));
        assert!(reg.units_equal(&a, &c));
    }

    #[test]
    fn multiply_composes_and_divide_cancels() {
        let reg = UnitRegistry::new();
        let m = reg.parse("m");
        let s = reg.parse("s");
        let m_per_s = m.divide(&s);
        assert_eq!(m_per_s.canonical_string(), "m*s^-1");

        let back_to_m = m_per_s.multiply(&s);
        assert_eq!(back_to_m, m);
    }

    #[test]
    fn empty_is_dimensionless() {
        let reg = UnitRegistry::new();
        assert!(reg.parse("").is_empty());
        assert!(Units::empty().is_empty());
    }

    #[test]
    fn conversion_factor_requires_single_matching_power() {
        let mut reg = UnitRegistry::new();
        reg.register_conversion("meters", "feet", 3.28084);
        let m = reg.parse("meters");
        let ft = reg.parse("feet");
        assert!(reg.conversion_factor(&m, &ft).is_some());

        let m2 = m.pow(2);
        let ft2 = ft.pow(2);
        // Same relative power, factor should be squared.
        let factor = reg.conversion_factor(&m2, &ft2).unwrap();
        assert!((factor - 3.28084_f64.powi(2)).abs() < 1e-9);
    }

    proptest::proptest! {
        #[test]
        fn multiply_then_divide_is_identity(a in "[a-z]{1,4}", b in "[a-z]{1,4}") {
            let reg = UnitRegistry::new();
            let ua = reg.parse(&a);
            let ub = reg.parse(&b);
            let composed = ua.multiply(&ub).divide(&ub);
            proptest::prop_assert_eq!(composed, ua);
        }
    }
}
