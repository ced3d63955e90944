//! Parsing filters and sort orders from the command line

use procure_lib::api::query::Direction;
use procure_lib::api::query::Filter;
use procure_lib::api::query::FilterValue;
use procure_lib::api::query::Operator;
use procure_lib::api::query::OrderBy;
use serde_json::Value;

use crate::error::CliError;

/// Parses `field:op:value`, or `field=value` for equality.
///
/// `in`, `not in` and `between` take comma-separated values. `json-contains`
/// is rejected; JSON fields are searched with `--search-field`/`--search`.
pub fn parse_filter(raw: &str) -> Result<Filter, CliError> {
    let mut parts = raw.splitn(3, ':');
    if let (Some(field), Some(op), Some(value)) = (parts.next(), parts.next(), parts.next()) {
        let field = field.trim();
        if !field.is_empty() && !field.contains('=') {
            let operator = Operator::parse(op).ok_or_else(|| CliError::UnknownOperator {
                filter: raw.to_string(),
                op: op.to_string(),
            })?;
            if operator == Operator::JsonContains {
                return Err(CliError::JsonFilter(raw.to_string()));
            }
            return Ok(Filter::new(field, operator, filter_value(operator, value)));
        }
    }

    match raw.split_once('=') {
        Some((field, value)) if !field.trim().is_empty() => Ok(Filter::eq(field.trim(), scalar(value))),
        _ => Err(CliError::InvalidFilter(raw.to_string())),
    }
}

fn filter_value(operator: Operator, raw: &str) -> FilterValue {
    if operator.takes_list() {
        return FilterValue::List(raw.split(',').map(|v| scalar(v.trim())).collect());
    }
    match operator {
        Operator::Like | Operator::NotLike | Operator::Is | Operator::JsonContains => {
            FilterValue::Single(Value::String(raw.to_string()))
        }
        _ => FilterValue::Single(scalar(raw)),
    }
}

/// Integers are sent as numbers, everything else as text.
fn scalar(raw: &str) -> Value {
    match raw.parse::<i64>() {
        Ok(n) if n.to_string() == raw => Value::from(n),
        _ => Value::from(raw),
    }
}

/// Parses `field:asc` or `field:desc`.
pub fn parse_sort(raw: &str) -> Result<OrderBy, CliError> {
    let invalid = || CliError::InvalidSort(raw.to_string());
    let (field, direction) = raw.rsplit_once(':').ok_or_else(invalid)?;
    let direction = Direction::parse(direction).ok_or_else(invalid)?;
    if field.trim().is_empty() {
        return Err(invalid());
    }
    Ok(OrderBy::new(field.trim(), direction))
}
