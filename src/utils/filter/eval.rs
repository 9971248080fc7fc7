use super::{Condition, Direction, FilterError, Order, Pattern, Where};
use regex::{Regex, RegexBuilder};
use serde_json::{Map, Value};
use std::cmp::Ordering;

/// A where clause with its patterns compiled, ready to test many documents.
pub enum Matcher<'a> {
    And(Vec<Matcher<'a>>),
    Or(Vec<Matcher<'a>>),
    Field {
        name: &'a str,
        condition: &'a Condition,
        regex: Option<Regex>,
    },
}

impl Where {
    pub fn compile(&self) -> Result<Matcher<'_>, FilterError> {
        Ok(match self {
            Self::And(clauses) => Matcher::And(compile_all(clauses)?),
            Self::Or(clauses) => Matcher::Or(compile_all(clauses)?),
            Self::Field { name, condition } => Matcher::Field {
                name,
                condition,
                regex: match condition {
                    Condition::Like { pattern, .. } => Some(pattern.compile()?),
                    _ => None,
                },
            },
        })
    }
}

fn compile_all(clauses: &[Where]) -> Result<Vec<Matcher<'_>>, FilterError> {
    clauses.iter().map(Where::compile).collect()
}

impl Matcher<'_> {
    pub fn matches(&self, document: &Map<String, Value>) -> bool {
        match self {
            Self::And(clauses) => clauses.iter().all(|clause| clause.matches(document)),
            Self::Or(clauses) => clauses.iter().any(|clause| clause.matches(document)),
            Self::Field {
                name,
                condition,
                regex,
            } => condition.matches(
                document.get(*name).unwrap_or(&Value::Null),
                regex.as_ref(),
            ),
        }
    }
}

impl Condition {
    fn matches(&self, value: &Value, regex: Option<&Regex>) -> bool {
        match self {
            Self::Eq(expected) => loose_eq(value, expected),
            Self::Neq(expected) => !loose_eq(value, expected),
            Self::Gt(bound) => compare(value, bound) == Some(Ordering::Greater),
            Self::Gte(bound) => matches!(
                compare(value, bound),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Self::Lt(bound) => compare(value, bound) == Some(Ordering::Less),
            Self::Lte(bound) => {
                matches!(compare(value, bound), Some(Ordering::Less | Ordering::Equal))
            }
            Self::Inq(candidates) => candidates.iter().any(|c| loose_eq(value, c)),
            Self::Nin(candidates) => !candidates.iter().any(|c| loose_eq(value, c)),
            Self::Between(lower, upper) => {
                matches!(
                    compare(value, lower),
                    Some(Ordering::Greater | Ordering::Equal)
                ) && matches!(compare(value, upper), Some(Ordering::Less | Ordering::Equal))
            }
            Self::Like { negated, .. } => match (text(value), regex) {
                (Some(text), Some(regex)) => regex.is_match(&text) != *negated,
                _ => false,
            },
        }
    }
}

impl Pattern {
    pub fn compile(&self) -> Result<Regex, FilterError> {
        let (source, case_insensitive) = match self {
            Self::Sql {
                text,
                case_insensitive,
            } => (like_to_regex(text), *case_insensitive),
            Self::Regex {
                source,
                case_insensitive,
            } => (source.clone(), *case_insensitive),
        };

        RegexBuilder::new(&source)
            .case_insensitive(case_insensitive)
            .build()
            .map_err(|err| FilterError::new(format!("invalid pattern: {err}")))
    }
}

/// Orders two documents the way [`push_order`](super::push_order) does:
/// strings before numbers before booleans before arrays before objects,
/// strings by byte order, and missing or null values last when ascending.
pub fn compare_records(a: &Map<String, Value>, b: &Map<String, Value>, order: &[Order]) -> Ordering {
    order
        .iter()
        .map(|Order { field, direction }| {
            let ordering = sort_key(a.get(field)).cmp_with(&sort_key(b.get(field)));
            match direction {
                Direction::Asc => ordering,
                Direction::Desc => ordering.reverse(),
            }
        })
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

enum SortKey<'a> {
    String(&'a str),
    Number(f64),
    Bool(bool),
    Array,
    Object,
    Missing,
}

impl SortKey<'_> {
    fn rank(&self) -> u8 {
        match self {
            Self::String(_) => 0,
            Self::Number(_) => 1,
            Self::Bool(_) => 2,
            Self::Array => 3,
            Self::Object => 4,
            Self::Missing => 5,
        }
    }

    fn cmp_with(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::String(a), Self::String(b)) => a.cmp(b),
            (Self::Number(a), Self::Number(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

fn sort_key(value: Option<&Value>) -> SortKey<'_> {
    match value {
        None | Some(Value::Null) => SortKey::Missing,
        Some(Value::String(text)) => SortKey::String(text),
        Some(Value::Number(number)) => number
            .as_f64()
            .map(SortKey::Number)
            .unwrap_or(SortKey::Missing),
        Some(Value::Bool(flag)) => SortKey::Bool(*flag),
        Some(Value::Array(_)) => SortKey::Array,
        Some(Value::Object(_)) => SortKey::Object,
    }
}

fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => a == b,
    }
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

fn like_to_regex(pattern: &str) -> String {
    let mut source = String::from("(?s)^");
    let mut chars = pattern.chars();

    while let Some(c) = chars.next() {
        match c {
            '%' => source.push_str(".*"),
            '_' => source.push('.'),
            '\\' => {
                if let Some(escaped) = chars.next() {
                    source.push_str(&regex::escape(&escaped.to_string()));
                }
            }
            c => source.push_str(&regex::escape(&c.to_string())),
        }
    }

    source.push('$');
    source
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn matches(r#where: Value, doc: Value) -> bool {
        Where::parse(r#where)
            .unwrap()
            .compile()
            .unwrap()
            .matches(&document(doc))
    }

    #[test]
    fn equality_and_missing_fields() {
        let dish = json!({ "id": "1", "name": "Pasta", "price": 9 });

        assert!(matches(json!({ "name": "Pasta" }), dish.clone()));
        assert!(!matches(json!({ "name": "pasta" }), dish.clone()));
        assert!(matches(json!({ "price": 9.0 }), dish.clone()));
        assert!(matches(json!({ "spicy": null }), dish.clone()));
        assert!(matches(json!({ "spicy": { "neq": true } }), dish.clone()));
        assert!(matches(json!({}), dish));
    }

    #[test]
    fn ranges_only_compare_like_types() {
        let dish = json!({ "name": "Pasta", "price": 9 });

        assert!(matches(json!({ "price": { "gt": 5, "lte": 9 } }), dish.clone()));
        assert!(!matches(json!({ "price": { "gt": "5" } }), dish.clone()));
        assert!(matches(json!({ "price": { "between": [9, 12] } }), dish.clone()));
        assert!(matches(json!({ "name": { "lt": "Risotto" } }), dish.clone()));
        assert!(!matches(json!({ "missing": { "lt": 100 } }), dish));
    }

    #[test]
    fn membership() {
        let dish = json!({ "name": "Pasta", "course": "main" });

        assert!(matches(json!({ "course": { "inq": ["main", "side"] } }), dish.clone()));
        assert!(!matches(json!({ "course": { "nin": ["main"] } }), dish.clone()));
        assert!(!matches(json!({ "course": { "inq": [] } }), dish.clone()));
        assert!(matches(json!({ "course": { "nin": [] } }), dish));
    }

    #[test]
    fn like_patterns() {
        let dish = json!({ "name": "Penne 100%" });

        assert!(matches(json!({ "name": { "like": "Pen%" } }), dish.clone()));
        assert!(!matches(json!({ "name": { "like": "pen%" } }), dish.clone()));
        assert!(matches(json!({ "name": { "ilike": "pen%" } }), dish.clone()));
        assert!(matches(json!({ "name": { "like": "P_nne%" } }), dish.clone()));
        assert!(matches(json!({ "name": { "like": "%100\\%" } }), dish.clone()));
        assert!(!matches(json!({ "name": { "like": "%10\\%" } }), dish.clone()));
        assert!(matches(json!({ "name": { "nlike": "Rigatoni%" } }), dish.clone()));
        assert!(!matches(json!({ "missing": { "nlike": "x" } }), dish));
    }

    #[test]
    fn contains_ignore_case_is_literal() {
        let regex = Pattern::contains_ignore_case("bc").compile().unwrap();
        assert!(regex.is_match("ABCdef"));
        assert!(!regex.is_match("acb"));

        let regex = Pattern::contains_ignore_case(".*").compile().unwrap();
        assert!(regex.is_match("odd.*name"));
        assert!(!regex.is_match("Pasta"));
    }

    #[test]
    fn boolean_combinators() {
        let dish = json!({ "name": "Pasta", "price": 9 });

        assert!(matches(
            json!({ "or": [{ "name": "Soup" }, { "price": 9 }] }),
            dish.clone()
        ));
        assert!(!matches(
            json!({ "and": [{ "name": "Pasta" }, { "price": 10 }] }),
            dish.clone()
        ));
        assert!(!matches(json!({ "or": [] }), dish));
    }

    #[test]
    fn ordering_puts_missing_last() {
        let mut docs = vec![
            document(json!({ "id": "a", "price": 12 })),
            document(json!({ "id": "b" })),
            document(json!({ "id": "c", "price": 3 })),
        ];
        let order = vec![Order {
            field: "price".into(),
            direction: Direction::Asc,
        }];

        docs.sort_by(|a, b| compare_records(a, b, &order));
        let ids: Vec<_> = docs.iter().map(|doc| doc["id"].clone()).collect();
        assert_eq!(ids, vec![json!("c"), json!("a"), json!("b")]);

        let order = vec![Order {
            field: "price".into(),
            direction: Direction::Desc,
        }];
        docs.sort_by(|a, b| compare_records(a, b, &order));
        let ids: Vec<_> = docs.iter().map(|doc| doc["id"].clone()).collect();
        assert_eq!(ids, vec![json!("b"), json!("a"), json!("c")]);
    }

    #[test]
    fn oversized_patterns_fail_to_compile() {
        let r#where = Where::field(
            "name",
            Condition::Like {
                pattern: Pattern::Regex {
                    source: String::from(r"(?:\w{1000}){1000}"),
                    case_insensitive: false,
                },
                negated: false,
            },
        );

        assert!(r#where.compile().is_err());
    }

    #[test]
    fn explicit_null_sorts_with_missing() {
        let mut docs = vec![
            document(json!({ "id": "a", "course": null })),
            document(json!({ "id": "b", "course": "main" })),
            document(json!({ "id": "c" })),
            document(json!({ "id": "d", "course": "Side" })),
        ];
        let order = vec![Order {
            field: "course".into(),
            direction: Direction::Asc,
        }];

        docs.sort_by(|a, b| compare_records(a, b, &order));
        let ids: Vec<_> = docs.iter().map(|doc| doc["id"].clone()).collect();
        assert_eq!(ids, vec![json!("d"), json!("b"), json!("a"), json!("c")]);
    }
}
