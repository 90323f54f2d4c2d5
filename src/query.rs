//! Eager materialization of result sets into generic rows.
//!
//! Both forms load the entire result into memory before returning and
//! preserve the database's row order. They differ in how integer columns
//! are read: the array form goes through the client's 32-bit getters and
//! widens, the mapped form reads 64 bits directly. Callers depend on the
//! distinction, so the two paths stay separate.

use std::sync::Arc;

use crate::client::{ClientError, RowSet, SqlType};
use crate::results::{MappedRow, build_column_index};
use crate::types::Value;

/// Materialize a result set as rows of column-ordered values.
///
/// # Errors
/// Returns [`ClientError`] if advancing the cursor or reading a cell fails.
pub fn build_array_rows(rows: &mut dyn RowSet) -> Result<Vec<Vec<Value>>, ClientError> {
    let column_count = rows.column_count();
    let mut out = Vec::new();
    while rows.advance()? {
        let mut row = Vec::with_capacity(column_count);
        for index in 0..column_count {
            row.push(array_cell(&*rows, index)?);
        }
        out.push(row);
    }
    Ok(out)
}

/// Materialize a result set as column-name-keyed rows.
///
/// Unsigned integer columns become [`Value::UInt`], keeping magnitudes
/// above `i64::MAX` intact. Duplicate column names resolve to the later
/// column when looked up by name.
///
/// # Errors
/// Returns [`ClientError`] if advancing the cursor or reading a cell fails.
pub fn build_mapped_rows(rows: &mut dyn RowSet) -> Result<Vec<MappedRow>, ClientError> {
    let column_count = rows.column_count();
    let column_names: Arc<Vec<String>> = Arc::new(
        (0..column_count)
            .map(|i| rows.column_name(i).to_string())
            .collect(),
    );
    let cache = Arc::new(build_column_index(&column_names));

    let mut out = Vec::new();
    while rows.advance()? {
        let mut values = Vec::with_capacity(column_count);
        for index in 0..column_count {
            values.push(mapped_cell(&*rows, index)?);
        }
        out.push(MappedRow::with_shared(
            Arc::clone(&column_names),
            Arc::clone(&cache),
            values,
        ));
    }
    Ok(out)
}

/// Drain a result set, returning how many rows it held.
///
/// # Errors
/// Returns [`ClientError`] if advancing the cursor fails.
pub(crate) fn count_rows(rows: &mut dyn RowSet) -> Result<u64, ClientError> {
    let mut count = 0;
    while rows.advance()? {
        count += 1;
    }
    Ok(count)
}

fn array_cell(rows: &dyn RowSet, index: usize) -> Result<Value, ClientError> {
    match rows.column_type(index) {
        SqlType::Bit => Ok(Value::Bool(rows.get_bool(index)?)),
        SqlType::TinyInt | SqlType::SmallInt | SqlType::MediumInt | SqlType::BigInt => {
            if rows.column_is_signed(index) {
                Ok(Value::Int(i64::from(rows.get_i32(index)?)))
            } else {
                Ok(Value::Int(i64::from(rows.get_u32(index)?)))
            }
        }
        SqlType::Real | SqlType::Double | SqlType::Decimal | SqlType::Numeric => {
            Ok(Value::Float(rows.get_f64(index)?))
        }
        _ => Ok(Value::Text(rows.get_string(index)?)),
    }
}

fn mapped_cell(rows: &dyn RowSet, index: usize) -> Result<Value, ClientError> {
    match rows.column_type(index) {
        SqlType::Bit => Ok(Value::Bool(rows.get_bool(index)?)),
        SqlType::TinyInt | SqlType::SmallInt | SqlType::MediumInt | SqlType::BigInt => {
            if rows.column_is_signed(index) {
                Ok(Value::Int(rows.get_i64(index)?))
            } else {
                Ok(Value::UInt(rows.get_u64(index)?))
            }
        }
        SqlType::Real | SqlType::Double | SqlType::Decimal | SqlType::Numeric => {
            Ok(Value::Float(rows.get_f64(index)?))
        }
        _ => Ok(Value::Text(rows.get_string(index)?)),
    }
}
