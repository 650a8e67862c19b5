//! Shared helpers for command handlers.

use std::io::IsTerminal;

use fleetops_core::{EntityId, Filter, FilterOp};

use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
///
/// Without a terminal there is nobody to ask, so `--yes` is required.
pub fn confirm(action: &str, message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Split a `FIELD=VALUE` assignment. The value may be empty or contain `=`.
pub fn parse_assignment(raw: &str) -> Result<(String, String), CliError> {
    match raw.split_once('=') {
        Some((field, value)) if !field.trim().is_empty() => {
            Ok((field.trim().to_owned(), value.to_owned()))
        }
        _ => Err(CliError::Validation {
            field: "set".into(),
            reason: format!("expected FIELD=VALUE, got '{raw}'"),
        }),
    }
}

/// Parse a `--filter` expression.
///
/// Supported forms: `col=value`, `col!=value`, `col>=value`, `col<=value`,
/// `col>value`, `col<value`, and `col=a,b,c` (membership).
pub fn parse_filter(raw: &str) -> Result<Filter, CliError> {
    const OPERATORS: [(&str, FilterOp); 6] = [
        ("!=", FilterOp::Neq),
        (">=", FilterOp::Gte),
        ("<=", FilterOp::Lte),
        ("=", FilterOp::Eq),
        (">", FilterOp::Gt),
        ("<", FilterOp::Lt),
    ];

    let (column, op, value) = OPERATORS
        .iter()
        .filter_map(|(token, op)| {
            raw.find(token)
                .map(|at| (at, &raw[..at], *op, &raw[at + token.len()..]))
        })
        .min_by_key(|(at, ..)| *at)
        .map(|(_, column, op, value)| (column.trim(), op, value.trim()))
        .ok_or_else(|| CliError::Validation {
            field: "filter".into(),
            reason: format!("expected COLUMN=VALUE, got '{raw}'"),
        })?;

    if column.is_empty() {
        return Err(CliError::Validation {
            field: "filter".into(),
            reason: format!("missing column in '{raw}'"),
        });
    }

    Ok(match (op, value) {
        (FilterOp::Eq, "null" | "true" | "false") => Filter::new(column, FilterOp::Is, value),
        (FilterOp::Eq, list) if list.contains(',') => {
            Filter::in_list(column, list.split(',').map(str::trim))
        }
        (op, value) => Filter::new(column, op, value),
    })
}

/// Parse a record id argument.
pub fn record_id(raw: &str) -> Result<EntityId, CliError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CliError::Validation {
            field: "id".into(),
            reason: "record id cannot be empty".into(),
        });
    }
    Ok(EntityId::from(trimmed))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn assignment_keeps_equals_in_value() {
        assert_eq!(
            parse_assignment("notes=torque=35Nm").unwrap(),
            ("notes".into(), "torque=35Nm".into())
        );
        assert_eq!(
            parse_assignment("inspector_name=").unwrap(),
            ("inspector_name".into(), String::new())
        );
        assert!(parse_assignment("=x").is_err());
        assert!(parse_assignment("tail_number").is_err());
    }

    #[test]
    fn filter_operators() {
        assert_eq!(
            parse_filter("status=operational").unwrap().to_param(),
            ("status".into(), "eq.operational".into())
        );
        assert_eq!(
            parse_filter("severity!=low").unwrap().to_param(),
            ("severity".into(), "neq.low".into())
        );
        assert_eq!(
            parse_filter("quantity_available<=5").unwrap().to_param(),
            ("quantity_available".into(), "lte.5".into())
        );
        assert_eq!(
            parse_filter("is_acknowledged=false").unwrap().to_param(),
            ("is_acknowledged".into(), "is.false".into())
        );
    }

    #[test]
    fn comma_list_becomes_membership() {
        let filter = parse_filter("status=pending,in_progress").unwrap();
        assert_eq!(filter.op, FilterOp::In);
        assert_eq!(filter.value, "pending,in_progress");
    }

    #[test]
    fn filter_needs_an_operator_and_column() {
        assert!(parse_filter("status").is_err());
        assert!(parse_filter("=pending").is_err());
    }
}
