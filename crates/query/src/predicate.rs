//! Storage-agnostic predicate AST.
//!
//! Compilers build these trees; backends lower them (SQL fragment, in-memory
//! filter). `matches` is the reference semantics every backend must agree with.

use core::cmp::Ordering;

use crate::condition::{Condition, Operator};
use crate::field::{FieldDef, FieldValue, Filterable};

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Identity: matches everything.
    True,
    Compare {
        field: &'static FieldDef,
        op: Operator,
        value: FieldValue,
    },
    /// Empty `And` matches everything.
    And(Vec<Predicate>),
    /// Empty `Or` matches nothing.
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    pub fn compare(field: &'static FieldDef, op: Operator, value: impl Into<FieldValue>) -> Self {
        Predicate::Compare {
            field,
            op,
            value: value.into(),
        }
    }

    pub fn eq(field: &'static FieldDef, value: impl Into<FieldValue>) -> Self {
        Self::compare(field, Operator::Eq, value)
    }

    /// Conjunction that flattens nested `And`s and drops `True` operands.
    pub fn all(preds: impl IntoIterator<Item = Predicate>) -> Self {
        let mut out = Vec::new();
        for p in preds {
            match p {
                Predicate::True => {}
                Predicate::And(inner) => out.extend(inner),
                other => out.push(other),
            }
        }
        match out.len() {
            0 => Predicate::True,
            1 => out.remove(0),
            _ => Predicate::And(out),
        }
    }

    pub fn any(preds: impl IntoIterator<Item = Predicate>) -> Self {
        let mut out = Vec::new();
        for p in preds {
            match p {
                Predicate::True => return Predicate::True,
                Predicate::Or(inner) => out.extend(inner),
                other => out.push(other),
            }
        }
        match out.len() {
            1 => out.remove(0),
            _ => Predicate::Or(out),
        }
    }

    pub fn and(self, other: Predicate) -> Self {
        Self::all([self, other])
    }

    pub fn or(self, other: Predicate) -> Self {
        Self::any([self, other])
    }

    pub fn negate(self) -> Self {
        Predicate::Not(Box::new(self))
    }

    /// Evaluate against an entity in memory.
    pub fn matches<E: Filterable>(&self, entity: &E) -> bool {
        match self {
            Predicate::True => true,
            Predicate::Compare { field, op, value } => match entity.field_value(field) {
                Some(actual) => compare(&actual, *op, value),
                None => false,
            },
            Predicate::And(ps) => ps.iter().all(|p| p.matches(entity)),
            Predicate::Or(ps) => ps.iter().any(|p| p.matches(entity)),
            Predicate::Not(p) => !p.matches(entity),
        }
    }
}

impl From<Condition> for Predicate {
    fn from(value: Condition) -> Self {
        Predicate::Compare {
            field: value.field(),
            op: value.operator(),
            value: value.value().clone(),
        }
    }
}

fn compare(actual: &FieldValue, op: Operator, expected: &FieldValue) -> bool {
    if op == Operator::Like {
        return match (actual, expected) {
            (FieldValue::String(text), FieldValue::String(pattern)) => {
                like_match(&like_pattern(pattern), text)
            }
            _ => false,
        };
    }
    let Some(ord) = actual.compare(expected) else {
        return false;
    };
    match op {
        Operator::Eq => ord == Ordering::Equal,
        Operator::Ne => ord != Ordering::Equal,
        Operator::Gt => ord == Ordering::Greater,
        Operator::Ge => ord != Ordering::Less,
        Operator::Lt => ord == Ordering::Less,
        Operator::Le => ord != Ordering::Greater,
        Operator::Like => false,
    }
}

/// Normalise a client LIKE value into a pattern.
///
/// Values without `%`/`_` wildcards are substring searches.
pub fn like_pattern(value: &str) -> String {
    if value.contains(['%', '_']) {
        value.to_string()
    } else {
        format!("%{value}%")
    }
}

/// Case-sensitive SQL `LIKE` without an escape character.
pub fn like_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();

    let (mut pi, mut ti) = (0usize, 0usize);
    // Position of the last `%` seen and the text index it was tried against.
    let mut backtrack: Option<(usize, usize)> = None;

    while ti < t.len() {
        if pi < p.len() && (p[pi] == '_' || p[pi] == t[ti]) {
            pi += 1;
            ti += 1;
        } else if pi < p.len() && p[pi] == '%' {
            backtrack = Some((pi, ti));
            pi += 1;
        } else if let Some((star, matched)) = backtrack {
            pi = star + 1;
            ti = matched + 1;
            backtrack = Some((star, matched + 1));
        } else {
            return false;
        }
    }
    p[pi..].iter().all(|c| *c == '%')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{FieldType, Schema};
    use rust_decimal::Decimal;

    static ID: FieldDef = FieldDef::internal("id", "id", FieldType::Uuid);
    static NAME: FieldDef = FieldDef::filterable("name", "name", FieldType::String);
    static PRICE: FieldDef = FieldDef::filterable("price", "price", FieldType::Decimal);
    static NOTE: FieldDef = FieldDef::filterable("note", "note", FieldType::String);

    static SCHEMA: Schema = Schema {
        entity: "item",
        table: "items",
        id: &ID,
        fields: &[&ID, &NAME, &PRICE, &NOTE],
    };

    struct Item {
        name: String,
        price: Decimal,
        note: Option<String>,
    }

    impl Filterable for Item {
        fn schema() -> &'static Schema {
            &SCHEMA
        }

        fn field_value(&self, field: &FieldDef) -> Option<FieldValue> {
            match field.name {
                "name" => Some(self.name.clone().into()),
                "price" => Some(self.price.into()),
                "note" => self.note.clone().map(Into::into),
                _ => None,
            }
        }
    }

    fn item(name: &str, price: i64) -> Item {
        Item {
            name: name.to_string(),
            price: Decimal::from(price),
            note: None,
        }
    }

    #[test]
    fn like_supports_wildcards_and_substrings() {
        assert!(like_match("%oyo%", "Toyota"));
        assert!(like_match("T_yota", "Toyota"));
        assert!(like_match("T%a", "Toyota"));
        assert!(!like_match("T%x", "Toyota"));
        assert!(like_match("%", ""));
        assert!(!like_match("_", ""));
        assert!(like_match("%a%b%", "xxaxxbxx"));
        assert!(!like_match("toy%", "Toyota"), "LIKE is case-sensitive");
        assert_eq!(like_pattern("Toy"), "%Toy%");
        assert_eq!(like_pattern("Toy%"), "Toy%");
    }

    #[test]
    fn ordered_comparisons_on_decimals() {
        let p = Predicate::compare(&PRICE, Operator::Ge, Decimal::from(5000));
        assert!(p.matches(&item("a", 5000)));
        assert!(p.matches(&item("a", 7000)));
        assert!(!p.matches(&item("a", 4999)));

        let p = Predicate::compare(&PRICE, Operator::Lt, Decimal::from(5000));
        assert!(p.matches(&item("a", 4999)));
        assert!(!p.matches(&item("a", 5000)));
    }

    #[test]
    fn missing_fields_never_match() {
        let p = Predicate::compare(&NOTE, Operator::Ne, "x");
        assert!(!p.matches(&item("a", 1)));
        let p = Predicate::compare(&NOTE, Operator::Eq, "x").negate();
        assert!(p.matches(&item("a", 1)));
    }

    #[test]
    fn combinators_flatten_and_keep_identity() {
        assert_eq!(Predicate::all([]), Predicate::True);
        assert_eq!(Predicate::True.and(Predicate::True), Predicate::True);

        let a = Predicate::eq(&NAME, "a");
        let b = Predicate::eq(&NAME, "b");
        let c = Predicate::eq(&NAME, "c");
        let nested = a.clone().and(b.clone()).and(c.clone());
        assert_eq!(nested, Predicate::And(vec![a.clone(), b.clone(), c.clone()]));

        let either = a.or(b);
        assert!(either.matches(&item("b", 1)));
        assert!(!either.matches(&item("c", 1)));
        assert!(!Predicate::Or(vec![]).matches(&item("c", 1)));
        assert!(Predicate::And(vec![]).matches(&item("c", 1)));
    }
}
