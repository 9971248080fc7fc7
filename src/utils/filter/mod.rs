//! Structured query descriptors accepted by the list, count and bulk update
//! endpoints.
//!
//! A filter arrives as JSON (`?filter={"where":{"name":{"ilike":"%pasta%"}}}`)
//! and is parsed once into [`Filter`]. Stores either evaluate it directly
//! ([`Where::compile`]) or compile it to SQL ([`push_where`]).

mod eval;
mod extract;
mod sql;

pub use eval::{compare_records, Matcher};
pub use extract::{QueryFilter, QueryWhere};
pub use sql::{push_order, push_page, push_where};

use serde_json::{Map, Value};

const OPERATORS: [&str; 14] = [
    "eq", "neq", "gt", "gte", "lt", "lte", "inq", "nin", "between", "like", "nlike", "ilike",
    "nilike", "regexp",
];

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{0}")]
pub struct FilterError(pub String);

impl FilterError {
    fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub r#where: Where,
    pub order: Vec<Order>,
    pub limit: Option<u64>,
    pub skip: Option<u64>,
    pub fields: Fields,
    pub include: Vec<String>,
}

impl Filter {
    pub fn from_json(raw: &str) -> Result<Self, FilterError> {
        let value = serde_json::from_str::<Value>(raw)
            .map_err(|err| FilterError::new(format!("filter is not valid JSON: {err}")))?;
        Self::parse(value)
    }

    pub fn parse(value: Value) -> Result<Self, FilterError> {
        let map = match value {
            Value::Null => return Ok(Self::default()),
            Value::Object(map) => map,
            _ => return Err(FilterError::new("filter must be a JSON object")),
        };

        let mut filter = Self::default();

        for (key, value) in map {
            match key.as_str() {
                "where" => filter.r#where = Where::parse(value)?,
                "order" => filter.order = Order::parse_many(value)?,
                "limit" => filter.limit = parse_count(&key, value)?,
                "skip" | "offset" => filter.skip = parse_count(&key, value)?,
                "fields" => filter.fields = Fields::parse(value)?,
                "include" => filter.include = parse_include(value)?,
                other => return Err(FilterError::new(format!("unknown filter key `{other}`"))),
            }
        }

        Ok(filter)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Where {
    And(Vec<Where>),
    Or(Vec<Where>),
    Field { name: String, condition: Condition },
}

impl Default for Where {
    fn default() -> Self {
        Self::And(vec![])
    }
}

impl Where {
    pub fn field(name: impl Into<String>, condition: Condition) -> Self {
        Self::Field {
            name: name.into(),
            condition,
        }
    }

    /// True for the clause that matches every record.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::And(clauses) if clauses.is_empty())
    }

    pub fn from_json(raw: &str) -> Result<Self, FilterError> {
        let value = serde_json::from_str::<Value>(raw)
            .map_err(|err| FilterError::new(format!("where is not valid JSON: {err}")))?;
        Self::parse(value)
    }

    pub fn parse(value: Value) -> Result<Self, FilterError> {
        let map = match value {
            Value::Null => return Ok(Self::default()),
            Value::Object(map) => map,
            _ => return Err(FilterError::new("where must be a JSON object")),
        };

        let mut clauses = vec![];

        for (key, value) in map {
            match key.as_str() {
                "and" => clauses.push(Self::And(Self::parse_list(&key, value)?)),
                "or" => clauses.push(Self::Or(Self::parse_list(&key, value)?)),
                field => {
                    validate_field_name(field)?;
                    for condition in Condition::parse_many(field, value)? {
                        clauses.push(Self::field(field, condition));
                    }
                }
            }
        }

        Ok(match clauses.len() {
            1 => clauses.remove(0),
            _ => Self::And(clauses),
        })
    }

    fn parse_list(key: &str, value: Value) -> Result<Vec<Self>, FilterError> {
        match value {
            Value::Array(items) => items.into_iter().map(Self::parse).collect(),
            _ => Err(FilterError::new(format!("`{key}` expects an array of where clauses"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(Value),
    Neq(Value),
    Gt(Value),
    Gte(Value),
    Lt(Value),
    Lte(Value),
    Inq(Vec<Value>),
    Nin(Vec<Value>),
    Between(Value, Value),
    Like { pattern: Pattern, negated: bool },
}

impl Condition {
    fn parse_many(field: &str, value: Value) -> Result<Vec<Self>, FilterError> {
        let ops = match value {
            Value::Object(ops) if ops.keys().any(|key| OPERATORS.contains(&key.as_str())) => ops,
            value => return Ok(vec![Self::Eq(value)]),
        };

        ops.into_iter()
            .map(|(op, operand)| Self::parse(field, &op, operand))
            .collect()
    }

    fn parse(field: &str, op: &str, operand: Value) -> Result<Self, FilterError> {
        let condition = match op {
            "eq" => Self::Eq(operand),
            "neq" => Self::Neq(operand),
            "gt" => Self::Gt(scalar(field, op, operand)?),
            "gte" => Self::Gte(scalar(field, op, operand)?),
            "lt" => Self::Lt(scalar(field, op, operand)?),
            "lte" => Self::Lte(scalar(field, op, operand)?),
            "inq" => Self::Inq(array(field, op, operand)?),
            "nin" => Self::Nin(array(field, op, operand)?),
            "between" => {
                let mut bounds = array(field, op, operand)?;
                if bounds.len() != 2 {
                    return Err(FilterError::new(format!(
                        "`{field}.between` expects exactly two bounds"
                    )));
                }
                let upper = scalar(field, op, bounds.remove(1))?;
                let lower = scalar(field, op, bounds.remove(0))?;
                Self::Between(lower, upper)
            }
            "like" | "nlike" | "ilike" | "nilike" => Self::Like {
                pattern: Pattern::Sql {
                    text: string(field, op, operand)?,
                    case_insensitive: op.ends_with("ilike"),
                },
                negated: op.starts_with('n'),
            },
            "regexp" => Self::Like {
                pattern: Pattern::parse_regexp(&string(field, op, operand)?)?,
                negated: false,
            },
            other => {
                return Err(FilterError::new(format!(
                    "unknown operator `{other}` on field `{field}`"
                )))
            }
        };

        Ok(condition)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    /// SQL `LIKE` syntax: `%` any run, `_` any single character, `\` escapes.
    Sql { text: String, case_insensitive: bool },
    Regex { source: String, case_insensitive: bool },
}

impl Pattern {
    /// Case-insensitive substring match on the literal `needle`.
    pub fn contains_ignore_case(needle: &str) -> Self {
        Self::Regex {
            source: format!(".*{}.*", regex::escape(needle)),
            case_insensitive: true,
        }
    }

    /// Accepts `/source/flags` or a bare regular expression.
    fn parse_regexp(raw: &str) -> Result<Self, FilterError> {
        let (source, flags) = match raw.strip_prefix('/').and_then(|rest| rest.rsplit_once('/')) {
            Some((source, flags)) if flags.chars().all(|c| "gimsuy".contains(c)) => {
                (source, flags)
            }
            _ => (raw, ""),
        };

        let pattern = Self::Regex {
            source: source.to_string(),
            case_insensitive: flags.contains('i'),
        };
        pattern.compile()?;

        Ok(pattern)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub field: String,
    pub direction: Direction,
}

impl Order {
    fn parse_many(value: Value) -> Result<Vec<Self>, FilterError> {
        match value {
            Value::Null => Ok(vec![]),
            Value::String(raw) => Ok(vec![Self::parse(&raw)?]),
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(raw) => Self::parse(&raw),
                    _ => Err(FilterError::new("order entries must be strings")),
                })
                .collect(),
            _ => Err(FilterError::new("order must be a string or an array of strings")),
        }
    }

    fn parse(raw: &str) -> Result<Self, FilterError> {
        let mut parts = raw.split_whitespace();

        let field = parts
            .next()
            .ok_or_else(|| FilterError::new("order entries must name a field"))?;
        validate_field_name(field)?;

        let direction = match parts.next().map(str::to_ascii_uppercase).as_deref() {
            None | Some("ASC") => Direction::Asc,
            Some("DESC") => Direction::Desc,
            Some(other) => {
                return Err(FilterError::new(format!(
                    "unknown order direction `{other}`"
                )))
            }
        };

        if parts.next().is_some() {
            return Err(FilterError::new(format!("malformed order entry `{raw}`")));
        }

        Ok(Self {
            field: field.to_string(),
            direction,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Fields {
    #[default]
    All,
    Only(Vec<String>),
    Except(Vec<String>),
}

impl Fields {
    fn parse(value: Value) -> Result<Self, FilterError> {
        match value {
            Value::Null => Ok(Self::All),
            Value::Array(items) => {
                let names = items
                    .into_iter()
                    .map(|item| match item {
                        Value::String(name) => validate_field_name(&name).map(|_| name),
                        _ => Err(FilterError::new("fields entries must be strings")),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(match names.is_empty() {
                    true => Self::All,
                    false => Self::Only(names),
                })
            }
            Value::Object(map) => {
                let mut only = vec![];
                let mut except = vec![];
                for (name, flag) in map {
                    validate_field_name(&name)?;
                    match flag {
                        Value::Bool(true) => only.push(name),
                        Value::Bool(false) => except.push(name),
                        _ => {
                            return Err(FilterError::new(format!(
                                "fields.{name} must be a boolean"
                            )))
                        }
                    }
                }
                Ok(match (only.is_empty(), except.is_empty()) {
                    (false, _) => Self::Only(only),
                    (true, false) => Self::Except(except),
                    (true, true) => Self::All,
                })
            }
            _ => Err(FilterError::new("fields must be an array or an object")),
        }
    }

    pub fn project(&self, mut document: Map<String, Value>) -> Map<String, Value> {
        match self {
            Self::All => document,
            Self::Only(names) => {
                document.retain(|key, _| names.iter().any(|name| name == key));
                document
            }
            Self::Except(names) => {
                document.retain(|key, _| !names.iter().any(|name| name == key));
                document
            }
        }
    }
}

fn parse_include(value: Value) -> Result<Vec<String>, FilterError> {
    let relation = |item: Value| match item {
        Value::String(name) => Ok(name),
        Value::Object(mut map) => match map.remove("relation") {
            Some(Value::String(name)) => Ok(name),
            _ => Err(FilterError::new("include entries need a `relation` name")),
        },
        _ => Err(FilterError::new("include entries must be strings or objects")),
    };

    match value {
        Value::Null => Ok(vec![]),
        Value::Array(items) => items.into_iter().map(relation).collect(),
        item => Ok(vec![relation(item)?]),
    }
}

fn parse_count(key: &str, value: Value) -> Result<Option<u64>, FilterError> {
    match value {
        Value::Null => Ok(None),
        Value::Number(number) => number
            .as_u64()
            .map(Some)
            .ok_or_else(|| FilterError::new(format!("`{key}` must be a non-negative integer"))),
        Value::String(raw) => raw
            .parse::<u64>()
            .map(Some)
            .map_err(|_| FilterError::new(format!("`{key}` must be a non-negative integer"))),
        _ => Err(FilterError::new(format!("`{key}` must be a non-negative integer"))),
    }
}

fn validate_field_name(name: &str) -> Result<(), FilterError> {
    let mut chars = name.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    match valid {
        true => Ok(()),
        false => Err(FilterError::new(format!("invalid field name `{name}`"))),
    }
}

fn scalar(field: &str, op: &str, operand: Value) -> Result<Value, FilterError> {
    match operand {
        Value::Number(_) | Value::String(_) | Value::Bool(_) => Ok(operand),
        _ => Err(FilterError::new(format!(
            "`{field}.{op}` expects a number, string or boolean"
        ))),
    }
}

fn array(field: &str, op: &str, operand: Value) -> Result<Vec<Value>, FilterError> {
    match operand {
        Value::Array(items) => Ok(items),
        _ => Err(FilterError::new(format!("`{field}.{op}` expects an array"))),
    }
}

fn string(field: &str, op: &str, operand: Value) -> Result<String, FilterError> {
    match operand {
        Value::String(text) => Ok(text),
        _ => Err(FilterError::new(format!("`{field}.{op}` expects a string"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_a_complete_filter() {
        let filter = Filter::parse(json!({
            "where": { "name": "Pasta", "price": { "gte": 5, "lt": 10 } },
            "order": ["price DESC", "name"],
            "limit": 5,
            "offset": "2",
            "fields": { "name": true },
        }))
        .unwrap();

        assert_eq!(
            filter.r#where,
            Where::And(vec![
                Where::field("name", Condition::Eq(json!("Pasta"))),
                Where::field("price", Condition::Gte(json!(5))),
                Where::field("price", Condition::Lt(json!(10))),
            ])
        );
        assert_eq!(
            filter.order,
            vec![
                Order {
                    field: "price".into(),
                    direction: Direction::Desc
                },
                Order {
                    field: "name".into(),
                    direction: Direction::Asc
                },
            ]
        );
        assert_eq!(filter.limit, Some(5));
        assert_eq!(filter.skip, Some(2));
        assert_eq!(filter.fields, Fields::Only(vec!["name".into()]));
        assert!(filter.include.is_empty());
    }

    #[test]
    fn single_clause_is_not_wrapped() {
        let r#where = Where::parse(json!({ "or": [{ "name": "a" }, { "name": "b" }] })).unwrap();

        assert_eq!(
            r#where,
            Where::Or(vec![
                Where::field("name", Condition::Eq(json!("a"))),
                Where::field("name", Condition::Eq(json!("b"))),
            ])
        );
    }

    #[test]
    fn objects_without_operators_are_equality() {
        let r#where = Where::parse(json!({ "origin": { "country": "IT" } })).unwrap();

        assert_eq!(
            r#where,
            Where::field("origin", Condition::Eq(json!({ "country": "IT" })))
        );
    }

    #[test]
    fn like_family_operators() {
        let r#where = Where::parse(json!({ "name": { "nilike": "%soup%" } })).unwrap();

        assert_eq!(
            r#where,
            Where::field(
                "name",
                Condition::Like {
                    pattern: Pattern::Sql {
                        text: "%soup%".into(),
                        case_insensitive: true
                    },
                    negated: true
                }
            )
        );
    }

    #[test]
    fn regexp_with_flags() {
        let r#where = Where::parse(json!({ "name": { "regexp": "/^pa/i" } })).unwrap();

        assert_eq!(
            r#where,
            Where::field(
                "name",
                Condition::Like {
                    pattern: Pattern::Regex {
                        source: "^pa".into(),
                        case_insensitive: true
                    },
                    negated: false
                }
            )
        );
    }

    #[test]
    fn contains_ignore_case_escapes_metacharacters() {
        assert_eq!(
            Pattern::contains_ignore_case("a.b(c"),
            Pattern::Regex {
                source: r".*a\.b\(c.*".into(),
                case_insensitive: true
            }
        );
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(Filter::from_json("{not json").is_err());
        assert!(Filter::parse(json!([])).is_err());
        assert!(Filter::parse(json!({ "sort": "name" })).is_err());
        assert!(Filter::parse(json!({ "limit": -1 })).is_err());
        assert!(Filter::parse(json!({ "order": "name SIDEWAYS" })).is_err());
        assert!(Where::parse(json!({ "name; DROP TABLE dishes": 1 })).is_err());
        assert!(Where::parse(json!({ "price": { "gt": 1, "bogus": 2 } })).is_err());
        assert!(Where::parse(json!({ "price": { "between": [1] } })).is_err());
        assert!(Where::parse(json!({ "price": { "gt": [1] } })).is_err());
        assert!(Where::parse(json!({ "name": { "regexp": "(" } })).is_err());
        assert!(Where::parse(json!({ "and": { "name": "a" } })).is_err());
    }

    #[test]
    fn include_accepts_strings_and_objects() {
        let filter = Filter::parse(json!({
            "include": ["restaurant", { "relation": "ingredients" }]
        }))
        .unwrap();

        assert_eq!(filter.include, vec!["restaurant", "ingredients"]);
    }

    #[test]
    fn projection() {
        let document = json!({ "id": "1", "name": "Pasta", "price": 9 })
            .as_object()
            .cloned()
            .unwrap();

        let only = Fields::parse(json!(["name"])).unwrap().project(document.clone());
        assert_eq!(Value::Object(only), json!({ "name": "Pasta" }));

        let except = Fields::parse(json!({ "price": false }))
            .unwrap()
            .project(document.clone());
        assert_eq!(Value::Object(except), json!({ "id": "1", "name": "Pasta" }));

        assert_eq!(Fields::All.project(document.clone()), document);
    }
}
