use crate::config::OrderingPolicy;
use regex::Regex;
use serde_json::{Map, Value};
use sift_parser::{CompareOp, Condition};
use std::borrow::Cow;
use std::cmp::Ordering;
use thiserror::Error;

pub type Record = Map<String, Value>;

#[derive(Error, Debug)]
pub enum ExecutorError {
    #[error("invalid LIKE pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("condition on '{0}' has no operator")]
    MissingOperator(String),
}

/// Walks a dotted path through nested objects. A missing segment, or an
/// intermediate value that is not an object, resolves to `None`.
pub fn resolve<'r>(record: &'r Record, path: &str) -> Option<&'r Value> {
    let mut segments = path.split('.');
    let mut current = record.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Text a value is compared as: strings raw, `null` as `null`, everything
/// else as compact JSON.
pub fn render(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s),
        Value::Null => Cow::Borrowed("null"),
        other => Cow::Owned(other.to_string()),
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Translates a LIKE pattern into an anchored regex: `%` is any run of
/// characters, `_` exactly one, everything else literal.
pub fn like_to_regex(pattern: &str) -> Result<Regex, ExecutorError> {
    let mut translated = String::with_capacity(pattern.len() + 8);
    translated.push_str("(?s)^");
    let mut buf = [0u8; 4];
    for ch in pattern.chars() {
        match ch {
            '%' => translated.push_str(".*"),
            '_' => translated.push('.'),
            other => translated.push_str(&regex::escape(other.encode_utf8(&mut buf))),
        }
    }
    translated.push('$');

    Regex::new(&translated).map_err(|source| ExecutorError::Pattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// Right-hand side of a comparison.
#[derive(Debug)]
enum Operand<'q> {
    Literal(&'q str),
    Field(&'q str),
}

/// A right-hand side after resolution against one record.
enum Side<'a> {
    Literal(&'a str),
    Value(&'a Value),
}

impl Side<'_> {
    fn text(&self) -> Cow<'_, str> {
        match self {
            Side::Literal(text) => Cow::Borrowed(text),
            Side::Value(value) => render(value),
        }
    }

    fn number(&self) -> Option<f64> {
        match self {
            Side::Literal(text) => text.parse().ok(),
            Side::Value(value) => as_number(value),
        }
    }
}

#[derive(Debug)]
enum Test<'q> {
    Equal(Operand<'q>),
    NotEqual(Operand<'q>),
    Order(CompareOp, Operand<'q>),
    Like(Regex),
    NotLike(Regex),
    In(&'q [String]),
    NotIn(&'q [String]),
}

#[derive(Debug)]
struct Predicate<'q> {
    field: &'q str,
    test: Test<'q>,
}

impl<'q> Predicate<'q> {
    fn compile(condition: &'q Condition) -> Result<Self, ExecutorError> {
        let operand = if condition.operand2_is_field {
            Operand::Field(&condition.operand2)
        } else {
            Operand::Literal(&condition.operand2)
        };

        let test = match condition.operator {
            CompareOp::Equal => Test::Equal(operand),
            CompareOp::NotEqual => Test::NotEqual(operand),
            op @ (CompareOp::GreaterThan
            | CompareOp::GreaterThanOrEqual
            | CompareOp::LessThan
            | CompareOp::LessThanOrEqual) => Test::Order(op, operand),
            CompareOp::Like => Test::Like(like_to_regex(&condition.operand2)?),
            CompareOp::NotLike => Test::NotLike(like_to_regex(&condition.operand2)?),
            CompareOp::In => Test::In(&condition.in_values),
            CompareOp::NotIn => Test::NotIn(&condition.in_values),
            CompareOp::Unknown => {
                return Err(ExecutorError::MissingOperator(condition.operand1.clone()))
            }
        };

        Ok(Self {
            field: &condition.operand1,
            test,
        })
    }

    fn evaluate(&self, record: &Record, ordering: OrderingPolicy) -> bool {
        let Some(value) = resolve(record, self.field) else {
            return false;
        };

        let side = |operand: &Operand<'q>| match *operand {
            Operand::Literal(text) => Some(Side::Literal(text)),
            Operand::Field(path) => resolve(record, path).map(Side::Value),
        };

        match &self.test {
            Test::Equal(operand) => {
                side(operand).is_some_and(|rhs| render(value) == rhs.text())
            }
            Test::NotEqual(operand) => {
                side(operand).is_some_and(|rhs| render(value) != rhs.text())
            }
            Test::Order(op, operand) => side(operand)
                .and_then(|rhs| compare(value, &rhs, ordering))
                .is_some_and(|ord| satisfies(*op, ord)),
            Test::Like(regex) => value.as_str().is_some_and(|s| regex.is_match(s)),
            Test::NotLike(regex) => !value.as_str().is_some_and(|s| regex.is_match(s)),
            Test::In(values) => {
                let text = render(value);
                values.iter().any(|v| *v == text)
            }
            Test::NotIn(values) => {
                let text = render(value);
                !values.iter().any(|v| *v == text)
            }
        }
    }
}

fn compare(left: &Value, right: &Side<'_>, ordering: OrderingPolicy) -> Option<Ordering> {
    if ordering == OrderingPolicy::NumericThenString {
        if let (Some(a), Some(b)) = (as_number(left), right.number()) {
            return a.partial_cmp(&b);
        }
    }
    Some(render(left).as_ref().cmp(right.text().as_ref()))
}

fn satisfies(op: CompareOp, ord: Ordering) -> bool {
    match op {
        CompareOp::GreaterThan => ord == Ordering::Greater,
        CompareOp::GreaterThanOrEqual => ord != Ordering::Less,
        CompareOp::LessThan => ord == Ordering::Less,
        CompareOp::LessThanOrEqual => ord != Ordering::Greater,
        _ => false,
    }
}

/// A WHERE clause compiled once and evaluated against any number of records.
#[derive(Debug)]
pub struct Executor<'q> {
    predicates: Vec<Predicate<'q>>,
    ordering: OrderingPolicy,
}

impl<'q> Executor<'q> {
    pub fn new(
        conditions: &'q [Condition],
        ordering: OrderingPolicy,
    ) -> Result<Self, ExecutorError> {
        let predicates = conditions
            .iter()
            .map(Predicate::compile)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            predicates,
            ordering,
        })
    }

    /// True when every condition holds. Stops at the first one that fails;
    /// an empty clause matches every record.
    pub fn matches(&self, record: &Record) -> bool {
        self.predicates
            .iter()
            .all(|predicate| predicate.evaluate(record, self.ordering))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sift_parser::parse;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("record fixtures must be objects"),
        }
    }

    fn eval(sql: &str, ordering: OrderingPolicy, value: Value) -> bool {
        let query = parse(sql).unwrap();
        let executor = Executor::new(&query.conditions, ordering).unwrap();
        executor.matches(&record(value))
    }

    fn numeric(sql: &str, value: Value) -> bool {
        eval(sql, OrderingPolicy::NumericThenString, value)
    }

    #[test]
    fn test_resolve_nested_paths() {
        let r = record(json!({"a": {"b": {"c": 1}}, "x": 5}));
        assert_eq!(resolve(&r, "a.b.c"), Some(&json!(1)));
        assert_eq!(resolve(&r, "x"), Some(&json!(5)));
        assert_eq!(resolve(&r, "a.z"), None);
        assert_eq!(resolve(&r, "x.y"), None);
        assert_eq!(resolve(&r, "missing"), None);
    }

    #[test]
    fn test_render_values() {
        assert_eq!(render(&json!("text")), "text");
        assert_eq!(render(&json!(30)), "30");
        assert_eq!(render(&json!(2.5)), "2.5");
        assert_eq!(render(&json!(true)), "true");
        assert_eq!(render(&Value::Null), "null");
        assert_eq!(render(&json!([1, "a"])), r#"[1,"a"]"#);
    }

    #[test]
    fn test_like_translation() {
        let re = like_to_regex("John%").unwrap();
        assert!(re.is_match("John Doe"));
        assert!(re.is_match("John"));
        assert!(!re.is_match("Mr John"));

        let re = like_to_regex("a_c").unwrap();
        assert!(re.is_match("abc"));
        assert!(!re.is_match("ac"));
        assert!(!re.is_match("abbc"));

        let re = like_to_regex("1.5 (x)+").unwrap();
        assert!(re.is_match("1.5 (x)+"));
        assert!(!re.is_match("105 (x)+"));

        let re = like_to_regex("%line%").unwrap();
        assert!(re.is_match("first\nline\nlast"));
    }

    #[test]
    fn test_equality_uses_string_rendering() {
        assert!(numeric("SELECT * FROM t WHERE age = '30'", json!({"age": 30})));
        assert!(!numeric("SELECT * FROM t WHERE age = '30.0'", json!({"age": 30})));
        assert!(numeric("SELECT * FROM t WHERE ok = 'true'", json!({"ok": true})));
        assert!(numeric("SELECT * FROM t WHERE v != 'x'", json!({"v": "y"})));
    }

    #[test]
    fn test_missing_field_is_false_for_every_operator() {
        for sql in [
            "SELECT * FROM t WHERE nope = 'x'",
            "SELECT * FROM t WHERE nope != 'x'",
            "SELECT * FROM t WHERE nope NOT LIKE 'x'",
            "SELECT * FROM t WHERE nope NOT IN ('x')",
            "SELECT * FROM t WHERE nope > '1'",
        ] {
            assert!(!numeric(sql, json!({"a": 1})), "{sql}");
        }
    }

    #[test]
    fn test_ordering_policies() {
        let sql = "SELECT * FROM t WHERE age > '10'";
        assert!(!numeric(sql, json!({"age": "9"})));
        assert!(eval(sql, OrderingPolicy::Lexicographic, json!({"age": "9"})));

        assert!(numeric("SELECT * FROM t WHERE age >= '30'", json!({"age": 30})));
        assert!(numeric("SELECT * FROM t WHERE age <= '30'", json!({"age": "30"})));
        assert!(numeric("SELECT * FROM t WHERE name < 'b'", json!({"name": "alice"})));
        assert!(!numeric("SELECT * FROM t WHERE name > 'b'", json!({"name": "alice"})));
    }

    #[test]
    fn test_like_only_matches_strings() {
        assert!(!numeric("SELECT * FROM t WHERE n LIKE '1%'", json!({"n": 10})));
        assert!(numeric("SELECT * FROM t WHERE n NOT LIKE '1%'", json!({"n": 10})));
        assert!(!numeric("SELECT * FROM t WHERE n NOT LIKE '1%'", json!({"n": "10"})));
    }

    #[test]
    fn test_in_membership() {
        let sql = "SELECT * FROM t WHERE id IN ('1', '2')";
        assert!(numeric(sql, json!({"id": 2})));
        assert!(!numeric(sql, json!({"id": 3})));
        assert!(numeric("SELECT * FROM t WHERE id NOT IN ('1', '2')", json!({"id": 3})));
    }

    #[test]
    fn test_field_reference_on_right() {
        let sql = "SELECT * FROM t WHERE home.zip = work.zip";
        assert!(numeric(sql, json!({"home": {"zip": "1"}, "work": {"zip": "1"}})));
        assert!(!numeric(sql, json!({"home": {"zip": "1"}, "work": {"zip": "2"}})));
        assert!(!numeric(sql, json!({"home": {"zip": "1"}})));

        assert!(numeric(
            "SELECT * FROM t WHERE spent > budget",
            json!({"spent": 120, "budget": "100"})
        ));
    }

    #[test]
    fn test_empty_clause_matches_everything() {
        let executor = Executor::new(&[], OrderingPolicy::default()).unwrap();
        assert!(executor.matches(&Record::new()));
    }

    #[test]
    fn test_unknown_operator_is_rejected() {
        let conditions = [Condition::on_field("a")];
        let err = Executor::new(&conditions, OrderingPolicy::default()).unwrap_err();
        assert!(matches!(err, ExecutorError::MissingOperator(field) if field == "a"));
    }
}
