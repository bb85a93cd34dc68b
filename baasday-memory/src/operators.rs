//! Application of update documents to stored documents.

use baasday_core::{
    update::{INCREMENT, PULL, PUSH, PUSH_UNIQUE, UNSET},
    value::{Number, Value, ValueMap},
};

use crate::evaluator::Comparable;

/// Applies an update document to `document` in place.
///
/// Plain values replace the field; single-key `$` documents apply the
/// operator. Fields listed in `protected` are left untouched.
///
/// # Errors
///
/// Returns a description of the first invalid operation. Operations before
/// it have already been applied, so callers apply updates to a copy.
pub fn apply_update(document: &mut ValueMap, update: &ValueMap, protected: &[&str]) -> Result<(), String> {
    for (field, operation) in update {
        if protected.contains(&field.as_str()) {
            continue;
        }

        match as_operator(operation) {
            Some((operator, operand)) => apply_operator(document, field, operator, operand)?,
            None => {
                document.insert(field.clone(), operation.clone());
            }
        }
    }

    Ok(())
}

fn as_operator(operation: &Value) -> Option<(&str, &Value)> {
    let map = operation.as_map()?;
    if map.len() != 1 {
        return None;
    }
    map.iter()
        .next()
        .filter(|(key, _)| key.starts_with('$'))
        .map(|(key, value)| (key.as_str(), value))
}

fn apply_operator(document: &mut ValueMap, field: &str, operator: &str, operand: &Value) -> Result<(), String> {
    match operator {
        INCREMENT => {
            let Value::Number(amount) = operand else {
                return Err(format!("{INCREMENT} on {field} needs a number, found {}", operand.type_name()));
            };
            let current = match document.get(field) {
                None | Some(Value::Null) => Number::Int(0),
                Some(Value::Number(current)) => *current,
                Some(other) => {
                    return Err(format!("cannot increment {field}: it holds a {}", other.type_name()));
                }
            };
            document.insert(field.to_string(), Value::Number(add(current, *amount)));
        }
        PUSH | PUSH_UNIQUE => {
            let list = list_field(document, field, operator)?;
            let present = list
                .iter()
                .any(|item| Comparable::from(item) == Comparable::from(operand));
            if operator == PUSH || !present {
                list.push(operand.clone());
            }
        }
        PULL => {
            if document.get(field).is_some_and(|value| !value.is_null()) {
                let list = list_field(document, field, operator)?;
                list.retain(|item| Comparable::from(item) != Comparable::from(operand));
            }
        }
        UNSET => {
            document.remove(field);
        }
        other => return Err(format!("unknown update operator {other}")),
    }

    Ok(())
}

/// Returns the list stored under `field`, creating an empty one if absent or null.
fn list_field<'a>(document: &'a mut ValueMap, field: &str, operator: &str) -> Result<&'a mut Vec<Value>, String> {
    let slot = document.entry(field.to_string()).or_insert(Value::Null);
    if slot.is_null() {
        *slot = Value::List(Vec::new());
    }

    match slot {
        Value::List(list) => Ok(list),
        other => Err(format!("{operator} on {field} needs a list, found {}", other.type_name())),
    }
}

fn add(left: Number, right: Number) -> Number {
    match (left, right) {
        (Number::Int(a), Number::Int(b)) => a
            .checked_add(b)
            .map(Number::Int)
            .unwrap_or(Number::Float(a as f64 + b as f64)),
        (a, b) => Number::Float(a.as_f64() + b.as_f64()),
    }
}
