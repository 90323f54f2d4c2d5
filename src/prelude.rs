//! Convenient imports for common functionality.

pub use crate::async_api::AsyncApi;
pub use crate::callback::{Argument, Callback, CallbackTarget};
pub use crate::client::{
    ClientError, Connection, DatabaseClient, PreparedStatement, RowSet, SqlType,
};
pub use crate::config::{ConnectionProperties, ConnectionPropertiesBuilder};
pub use crate::dispatch::SqlDispatcher;
pub use crate::error::SqlDispatchError;
pub use crate::manager::ConnectionManager;
pub use crate::params::bind_parameters;
pub use crate::query::{build_array_rows, build_mapped_rows};
pub use crate::results::MappedRow;
pub use crate::temporal::is_datetime_literal;
pub use crate::types::Value;
