//! Compiles filters to Postgres against the `dishes` layout: `id` and `name`
//! columns plus an `attributes` JSONB document. User values and attribute
//! keys are always bound, never spliced.

use super::{Condition, Direction, Order, Pattern, Where};
use serde_json::Value;
use sqlx::{types::Json, Postgres, QueryBuilder};

fn is_column(field: &str) -> bool {
    matches!(field, "id" | "name")
}

fn push_json_expr(qb: &mut QueryBuilder<'_, Postgres>, field: &str) {
    match is_column(field) {
        true => qb.push("to_jsonb(").push(field).push(")"),
        false => qb
            .push("(attributes -> ")
            .push_bind(field.to_string())
            .push(")"),
    };
}

fn push_text_expr(qb: &mut QueryBuilder<'_, Postgres>, field: &str) {
    match is_column(field) {
        true => qb.push(field),
        false => qb
            .push("(attributes ->> ")
            .push_bind(field.to_string())
            .push(")"),
    };
}

pub fn push_where(qb: &mut QueryBuilder<'_, Postgres>, r#where: &Where) {
    match r#where {
        Where::And(clauses) if clauses.is_empty() => {
            qb.push("TRUE");
        }
        Where::Or(clauses) if clauses.is_empty() => {
            qb.push("FALSE");
        }
        Where::And(clauses) => push_joined(qb, clauses, " AND "),
        Where::Or(clauses) => push_joined(qb, clauses, " OR "),
        Where::Field { name, condition } => push_condition(qb, name, condition),
    }
}

fn push_joined(qb: &mut QueryBuilder<'_, Postgres>, clauses: &[Where], separator: &str) {
    qb.push("(");
    for (i, clause) in clauses.iter().enumerate() {
        if i > 0 {
            qb.push(separator);
        }
        push_where(qb, clause);
    }
    qb.push(")");
}

fn push_comparison(qb: &mut QueryBuilder<'_, Postgres>, field: &str, op: &str, bound: &Value) {
    if let Value::String(bound) = bound {
        // Byte order, whatever the database collation.
        qb.push("(jsonb_typeof(");
        push_json_expr(qb, field);
        qb.push(") = 'string' AND (");
        push_json_expr(qb, field);
        qb.push(" #>> '{}') COLLATE \"C\"")
            .push(op)
            .push_bind(bound.clone())
            .push(")");
        return;
    }

    qb.push("(jsonb_typeof(");
    push_json_expr(qb, field);
    qb.push(") = jsonb_typeof(")
        .push_bind(Json(bound.clone()))
        .push(") AND ");
    push_json_expr(qb, field);
    qb.push(op).push_bind(Json(bound.clone())).push(")");
}

fn push_list(qb: &mut QueryBuilder<'_, Postgres>, values: &[Value]) {
    qb.push("(");
    {
        let mut separated = qb.separated(", ");
        for value in values {
            separated.push_bind(Json(value.clone()));
        }
    }
    qb.push(")");
}

fn push_condition(qb: &mut QueryBuilder<'_, Postgres>, field: &str, condition: &Condition) {
    match condition {
        Condition::Eq(Value::Null) => {
            qb.push("(");
            push_json_expr(qb, field);
            qb.push(" IS NULL OR ");
            push_json_expr(qb, field);
            qb.push(" = 'null'::jsonb)");
        }
        Condition::Eq(value) => {
            push_json_expr(qb, field);
            qb.push(" = ").push_bind(Json(value.clone()));
        }
        Condition::Neq(Value::Null) => {
            qb.push("(");
            push_json_expr(qb, field);
            qb.push(" IS NOT NULL AND ");
            push_json_expr(qb, field);
            qb.push(" <> 'null'::jsonb)");
        }
        Condition::Neq(value) => {
            push_json_expr(qb, field);
            qb.push(" IS DISTINCT FROM ")
                .push_bind(Json(value.clone()));
        }
        Condition::Gt(bound) => push_comparison(qb, field, " > ", bound),
        Condition::Gte(bound) => push_comparison(qb, field, " >= ", bound),
        Condition::Lt(bound) => push_comparison(qb, field, " < ", bound),
        Condition::Lte(bound) => push_comparison(qb, field, " <= ", bound),
        Condition::Inq(values) if values.is_empty() => {
            qb.push("FALSE");
        }
        Condition::Inq(values) => {
            push_json_expr(qb, field);
            qb.push(" IN ");
            push_list(qb, values);
        }
        Condition::Nin(values) if values.is_empty() => {
            qb.push("TRUE");
        }
        Condition::Nin(values) => {
            qb.push("(");
            push_json_expr(qb, field);
            qb.push(" IS NULL OR ");
            push_json_expr(qb, field);
            qb.push(" NOT IN ");
            push_list(qb, values);
            qb.push(")");
        }
        Condition::Between(lower, upper) => {
            qb.push("(");
            push_comparison(qb, field, " >= ", lower);
            qb.push(" AND ");
            push_comparison(qb, field, " <= ", upper);
            qb.push(")");
        }
        Condition::Like { pattern, negated } => {
            let (op, value) = match (pattern, *negated) {
                (Pattern::Sql { text, case_insensitive: false }, false) => (" LIKE ", text),
                (Pattern::Sql { text, case_insensitive: false }, true) => (" NOT LIKE ", text),
                (Pattern::Sql { text, case_insensitive: true }, false) => (" ILIKE ", text),
                (Pattern::Sql { text, case_insensitive: true }, true) => (" NOT ILIKE ", text),
                (Pattern::Regex { source, case_insensitive: false }, false) => (" ~ ", source),
                (Pattern::Regex { source, case_insensitive: false }, true) => (" !~ ", source),
                (Pattern::Regex { source, case_insensitive: true }, false) => (" ~* ", source),
                (Pattern::Regex { source, case_insensitive: true }, true) => (" !~* ", source),
            };
            push_text_expr(qb, field);
            qb.push(op).push_bind(value.clone());
        }
    }
}

/// Appends `ORDER BY`, always ending on `id` so paging is stable.
///
/// Each entry sorts by JSON type first (string, number, boolean, array,
/// object, then null or missing), strings by byte order, numbers and
/// booleans by value. Arrays and objects tie within their type.
pub fn push_order(qb: &mut QueryBuilder<'_, Postgres>, order: &[Order]) {
    qb.push(" ORDER BY ");
    for Order { field, direction } in order {
        let direction = match direction {
            Direction::Asc => " ASC, ",
            Direction::Desc => " DESC, ",
        };

        qb.push("CASE jsonb_typeof(");
        push_json_expr(qb, field);
        qb.push(
            ") WHEN 'string' THEN 0 WHEN 'number' THEN 1 WHEN 'boolean' THEN 2 \
             WHEN 'array' THEN 3 WHEN 'object' THEN 4 ELSE 5 END",
        )
        .push(direction);

        qb.push("(CASE WHEN jsonb_typeof(");
        push_json_expr(qb, field);
        qb.push(") = 'string' THEN ");
        push_json_expr(qb, field);
        qb.push(" #>> '{}' END) COLLATE \"C\"").push(direction);

        qb.push("(CASE WHEN jsonb_typeof(");
        push_json_expr(qb, field);
        qb.push(") IN ('number', 'boolean') THEN ");
        push_json_expr(qb, field);
        qb.push(" END)").push(direction);
    }
    qb.push("id ASC");
}

pub fn push_page(qb: &mut QueryBuilder<'_, Postgres>, limit: Option<u64>, skip: Option<u64>) {
    if let Some(limit) = limit {
        qb.push(" LIMIT ").push_bind(limit.min(i64::MAX as u64) as i64);
    }
    if let Some(skip) = skip {
        qb.push(" OFFSET ").push_bind(skip.min(i64::MAX as u64) as i64);
    }
}
