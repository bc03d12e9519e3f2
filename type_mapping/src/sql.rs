//! SQL type conversion utilities
//!
//! This module handles how each argument value is rendered
//! inside a routine call.

use crate::types::PostgresValue;

/// Render the argument expression for the value bound at `index` (1-based).
///
/// NULL is written inline so the server resolves its type from the routine
/// signature; decimals travel as text and are cast on the server.
pub fn placeholder(value: &PostgresValue, index: usize) -> String {
    match value {
        PostgresValue::Null => "NULL".to_string(),
        PostgresValue::Decimal(_) => format!("${}::numeric", index),
        _ => format!("${}", index),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_is_inlined() {
        assert_eq!(placeholder(&PostgresValue::Null, 3), "NULL");
    }

    #[test]
    fn decimal_is_cast() {
        assert_eq!(
            placeholder(&PostgresValue::Decimal("1.25".into()), 2),
            "$2::numeric"
        );
        assert_eq!(placeholder(&PostgresValue::Integer(1), 1), "$1");
        assert_eq!(placeholder(&PostgresValue::TextArray(vec![]), 4), "$4");
    }
}
