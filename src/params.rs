use tracing::warn;

use crate::client::{ClientError, PreparedStatement};
use crate::temporal::is_datetime_literal;
use crate::types::Value;

/// Bind positional parameters onto a prepared statement.
///
/// Text values that look like datetime literals are bound through the
/// datetime setter; see [`is_datetime_literal`]. Values with no binder
/// (`UInt`, `Unsupported`) leave their position unbound and log a warning
/// naming the index — the statement is still executed afterwards and the
/// database gets to reject it.
///
/// # Errors
/// Returns [`ClientError`] if the client refuses a binding.
pub fn bind_parameters(
    statement: &mut dyn PreparedStatement,
    params: &[Value],
) -> Result<(), ClientError> {
    for (index, value) in params.iter().enumerate() {
        match value {
            Value::Null => statement.set_null(index)?,
            Value::Bool(b) => statement.set_bool(index, *b)?,
            Value::Int(i) => statement.set_i64(index, *i)?,
            Value::Float(f) => statement.set_f64(index, *f)?,
            Value::Text(s) => {
                if is_datetime_literal(s) {
                    statement.set_datetime(index, s)?;
                } else {
                    statement.set_string(index, s)?;
                }
            }
            other => {
                warn!(
                    index,
                    kind = other.kind_name(),
                    "parameter has no binder, leaving it unbound"
                );
            }
        }
    }
    Ok(())
}
