//! Predicate → Postgres lowering.
//!
//! Only static schema strings (table and column names) are pushed as raw SQL;
//! every client value is a bind parameter. Each comparison is guarded with
//! `IS NOT NULL` so a missing value never matches, negated or not, exactly as
//! [`Predicate::matches`] behaves.

use sqlx::{Postgres, QueryBuilder};

use carshop_query::predicate::like_pattern;
use carshop_query::{
    Direction, FieldType, FieldValue, Operator, PageRequest, Predicate, Schema, SortKey,
};

/// Append `predicate` as a boolean SQL expression.
pub fn push_predicate(qb: &mut QueryBuilder<'_, Postgres>, predicate: &Predicate) {
    match predicate {
        Predicate::True => {
            qb.push("TRUE");
        }
        Predicate::Compare { field, op, value } => {
            qb.push("(")
                .push(field.column)
                .push(" IS NOT NULL AND ")
                .push(field.column);
            if *op == Operator::Like {
                qb.push(" LIKE ");
                match value {
                    FieldValue::String(s) => qb.push_bind(like_pattern(s)),
                    // Rejected at condition construction; kept total for the AST.
                    _ => qb.push("NULL"),
                };
                qb.push(" ESCAPE '')");
            } else {
                qb.push(" ").push(op.symbol()).push(" ");
                push_value(qb, value);
                qb.push(")");
            }
        }
        Predicate::And(ps) => push_junction(qb, ps, " AND ", "TRUE"),
        Predicate::Or(ps) => push_junction(qb, ps, " OR ", "FALSE"),
        Predicate::Not(p) => {
            qb.push("NOT (");
            push_predicate(qb, p);
            qb.push(")");
        }
    }
}

fn push_junction(qb: &mut QueryBuilder<'_, Postgres>, ps: &[Predicate], sep: &str, empty: &str) {
    if ps.is_empty() {
        qb.push(empty);
        return;
    }
    qb.push("(");
    for (i, p) in ps.iter().enumerate() {
        if i > 0 {
            qb.push(sep);
        }
        push_predicate(qb, p);
    }
    qb.push(")");
}

fn push_value(qb: &mut QueryBuilder<'_, Postgres>, value: &FieldValue) {
    match value {
        FieldValue::String(v) => qb.push_bind(v.clone()),
        FieldValue::Decimal(v) => qb.push_bind(*v),
        FieldValue::Date(v) => qb.push_bind(*v),
        FieldValue::Timestamp(v) => qb.push_bind(*v),
        FieldValue::Boolean(v) => qb.push_bind(*v),
        FieldValue::Uuid(v) => qb.push_bind(*v),
    };
}

/// `ORDER BY` matching the in-memory comparator: absent values first when
/// ascending, last when descending. Strings compare bytewise (`COLLATE "C"`)
/// whatever the database locale is.
pub fn push_order_by(qb: &mut QueryBuilder<'_, Postgres>, keys: &[SortKey]) {
    if keys.is_empty() {
        return;
    }
    qb.push(" ORDER BY ");
    for (i, key) in keys.iter().enumerate() {
        if i > 0 {
            qb.push(", ");
        }
        qb.push(key.field.column);
        if key.field.ty == FieldType::String {
            qb.push(r#" COLLATE "C""#);
        }
        qb.push(match key.direction {
            Direction::Asc => " ASC NULLS FIRST",
            Direction::Desc => " DESC NULLS LAST",
        });
    }
}

/// `SELECT <columns> FROM <table> WHERE … ORDER BY … [LIMIT … OFFSET …]`.
pub fn select_page<'a>(
    schema: &Schema,
    columns: &str,
    predicate: &Predicate,
    keys: &[SortKey],
    page: Option<&PageRequest>,
) -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::new("SELECT ");
    qb.push(columns).push(" FROM ").push(schema.table).push(" WHERE ");
    push_predicate(&mut qb, predicate);
    push_order_by(&mut qb, keys);
    if let Some(page) = page {
        qb.push(" LIMIT ")
            .push_bind(i64::from(page.size))
            .push(" OFFSET ")
            .push_bind(i64::try_from(page.offset()).unwrap_or(i64::MAX));
    }
    qb
}

/// `SELECT COUNT(*) FROM <table> WHERE …`.
pub fn count<'a>(schema: &Schema, predicate: &Predicate) -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM ");
    qb.push(schema.table).push(" WHERE ");
    push_predicate(&mut qb, predicate);
    qb
}
