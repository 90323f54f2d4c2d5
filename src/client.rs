//! The seam to the blocking database client library.
//!
//! The dispatch core never talks to a concrete driver; it sees the client
//! through these traits only. An implementation wraps whatever synchronous
//! connector the process links against, and the worker thread is the sole
//! caller, so nothing here needs interior locking.

use thiserror::Error;

use crate::config::ConnectionProperties;

/// Error raised by the underlying database client, carrying the driver's
/// native error code and five-character SQLSTATE.
#[derive(Debug, Clone, Error)]
#[error("{message} (error code: {code}, sqlstate: {sql_state})")]
pub struct ClientError {
    pub message: String,
    pub code: i32,
    pub sql_state: String,
}

impl ClientError {
    pub fn new(message: impl Into<String>, code: i32, sql_state: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code,
            sql_state: sql_state.into(),
        }
    }
}

/// SQL column types the marshalling layer distinguishes.
///
/// `Integer` is listed but takes the string path during materialization,
/// like every type outside the explicit integer/float/bit sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlType {
    Bit,
    TinyInt,
    SmallInt,
    MediumInt,
    Integer,
    BigInt,
    Real,
    Double,
    Decimal,
    Numeric,
    Char,
    VarChar,
    Date,
    Time,
    DateTime,
    Timestamp,
    Null,
    Other,
}

/// Entry point of the client library: opens connections.
pub trait DatabaseClient: Send + 'static {
    /// Open a connection using the given properties.
    ///
    /// # Errors
    /// Returns [`ClientError`] if the connection cannot be established.
    fn connect(
        &mut self,
        properties: &ConnectionProperties,
    ) -> Result<Box<dyn Connection>, ClientError>;
}

/// One live connection. Statement creation is folded into the connection
/// methods; the worker thread owns the connection exclusively.
pub trait Connection: Send {
    /// Whether the connection still reports itself usable.
    fn is_valid(&mut self) -> bool;

    /// Probe the server, reconnecting if the driver is configured to. May
    /// perform network I/O.
    ///
    /// # Errors
    /// Returns [`ClientError`] if the probe itself fails.
    fn reconnect(&mut self) -> Result<bool, ClientError>;

    /// Switch the connection's active schema.
    ///
    /// # Errors
    /// Returns [`ClientError`] if the schema change is rejected.
    fn set_schema(&mut self, schema: &str) -> Result<(), ClientError>;

    /// Run a statement, reporting whether it produced a result set.
    ///
    /// # Errors
    /// Returns [`ClientError`] if execution fails.
    fn execute(&mut self, query: &str) -> Result<bool, ClientError>;

    /// Run a DML statement and return the affected-row count.
    ///
    /// # Errors
    /// Returns [`ClientError`] if execution fails.
    fn execute_update(&mut self, query: &str) -> Result<u64, ClientError>;

    /// Run a query and return a cursor over its result set.
    ///
    /// # Errors
    /// Returns [`ClientError`] if execution fails.
    fn execute_query<'a>(&'a mut self, query: &str) -> Result<Box<dyn RowSet + 'a>, ClientError>;

    /// Prepare a statement with positional parameters.
    ///
    /// # Errors
    /// Returns [`ClientError`] if preparation fails.
    fn prepare<'a>(&'a mut self, query: &str)
    -> Result<Box<dyn PreparedStatement + 'a>, ClientError>;

    /// Close the connection. Implementations must tolerate repeated calls.
    ///
    /// # Errors
    /// Returns [`ClientError`] if the close itself fails.
    fn close(&mut self) -> Result<(), ClientError>;

    /// Whether the connection has already been closed.
    fn is_closed(&self) -> bool;
}

/// A prepared statement with 0-based positional parameters.
pub trait PreparedStatement {
    /// # Errors
    /// Returns [`ClientError`] if the parameter cannot be bound.
    fn set_null(&mut self, index: usize) -> Result<(), ClientError>;

    /// # Errors
    /// Returns [`ClientError`] if the parameter cannot be bound.
    fn set_bool(&mut self, index: usize, value: bool) -> Result<(), ClientError>;

    /// # Errors
    /// Returns [`ClientError`] if the parameter cannot be bound.
    fn set_i64(&mut self, index: usize, value: i64) -> Result<(), ClientError>;

    /// # Errors
    /// Returns [`ClientError`] if the parameter cannot be bound.
    fn set_f64(&mut self, index: usize, value: f64) -> Result<(), ClientError>;

    /// # Errors
    /// Returns [`ClientError`] if the parameter cannot be bound.
    fn set_string(&mut self, index: usize, value: &str) -> Result<(), ClientError>;

    /// Bind a datetime literal, already in the client's textual form.
    ///
    /// # Errors
    /// Returns [`ClientError`] if the parameter cannot be bound.
    fn set_datetime(&mut self, index: usize, value: &str) -> Result<(), ClientError>;

    /// # Errors
    /// Returns [`ClientError`] if execution fails.
    fn execute(&mut self) -> Result<bool, ClientError>;

    /// # Errors
    /// Returns [`ClientError`] if execution fails.
    fn execute_update(&mut self) -> Result<u64, ClientError>;

    /// # Errors
    /// Returns [`ClientError`] if execution fails.
    fn execute_query<'a>(&'a mut self) -> Result<Box<dyn RowSet + 'a>, ClientError>;
}

/// Cursor over a query result, with 0-based column access.
///
/// The typed getters mirror what synchronous connectors expose: separate
/// 32- and 64-bit reads with signedness chosen by the caller from the
/// column metadata.
pub trait RowSet {
    /// Move to the next row; `false` once the rows are exhausted.
    ///
    /// # Errors
    /// Returns [`ClientError`] if fetching the row fails.
    fn advance(&mut self) -> Result<bool, ClientError>;

    fn column_count(&self) -> usize;
    fn column_name(&self, index: usize) -> &str;
    fn column_type(&self, index: usize) -> SqlType;
    fn column_is_signed(&self, index: usize) -> bool;

    /// # Errors
    /// Returns [`ClientError`] if the cell cannot be read.
    fn get_bool(&self, index: usize) -> Result<bool, ClientError>;
    /// # Errors
    /// Returns [`ClientError`] if the cell cannot be read.
    fn get_i32(&self, index: usize) -> Result<i32, ClientError>;
    /// # Errors
    /// Returns [`ClientError`] if the cell cannot be read.
    fn get_u32(&self, index: usize) -> Result<u32, ClientError>;
    /// # Errors
    /// Returns [`ClientError`] if the cell cannot be read.
    fn get_i64(&self, index: usize) -> Result<i64, ClientError>;
    /// # Errors
    /// Returns [`ClientError`] if the cell cannot be read.
    fn get_u64(&self, index: usize) -> Result<u64, ClientError>;
    /// # Errors
    /// Returns [`ClientError`] if the cell cannot be read.
    fn get_f64(&self, index: usize) -> Result<f64, ClientError>;
    /// # Errors
    /// Returns [`ClientError`] if the cell cannot be read.
    fn get_string(&self, index: usize) -> Result<String, ClientError>;
}
