//! Asynchronous single-connection task dispatch over a blocking SQL
//! client.
//!
//! Callers submit operations from any thread; a dedicated worker thread
//! executes them one at a time against one live connection and reports
//! each completion through a caller-supplied callback, in submission
//! order. The underlying client library is used as a plain synchronous,
//! single-connection API behind the [`client`] traits.

pub mod async_api;
pub mod callback;
pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod manager;
pub mod params;
pub mod prelude;
pub mod query;
pub mod results;
pub mod temporal;
pub mod types;

mod worker;

pub use dispatch::SqlDispatcher;
pub use error::SqlDispatchError;
pub use types::Value;
