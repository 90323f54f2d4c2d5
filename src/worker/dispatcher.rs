use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Receiver;

use tracing::error;

use crate::callback::Argument;
use crate::client::ClientError;
use crate::manager::ConnectionManager;
use crate::params::bind_parameters;
use crate::query::{build_array_rows, build_mapped_rows, count_rows};
use crate::results::MappedRow;
use crate::types::Value;

use super::channel::Command;

/// The dispatch loop: receive one command, execute it, invoke its callback,
/// repeat. The callback runs before the next receive, so completion order
/// always matches submission order and no new task starts mid-callback.
///
/// The exit flag is checked before executing each received command; once it
/// is set, anything still queued is dropped without its callback firing.
pub(super) fn run_worker(
    mut manager: ConnectionManager,
    receiver: &Receiver<Command>,
    exit: &AtomicBool,
) {
    while let Ok(command) = receiver.recv() {
        if exit.load(Ordering::Acquire) {
            break;
        }
        match command {
            Command::Shutdown => break,
            Command::Connect { callback } => {
                let success = connect(&mut manager);
                callback.complete(vec![Argument::Success(success)]);
            }
            Command::SetSchema { schema, callback } => {
                let success = set_schema(&mut manager, &schema);
                callback.complete(vec![Argument::Success(success)]);
            }
            Command::Execute { query, callback } => {
                let success = execute(&mut manager, &query);
                callback.complete(vec![Argument::Success(success)]);
            }
            Command::ExecutePrepared {
                query,
                params,
                callback,
            } => {
                let success = execute_prepared(&mut manager, &query, &params);
                callback.complete(vec![Argument::Success(success)]);
            }
            Command::ExecuteUpdate { query, callback } => {
                let (success, affected) = execute_update(&mut manager, &query);
                callback.complete(vec![Argument::Success(success), Argument::Count(affected)]);
            }
            Command::ExecutePreparedUpdate {
                query,
                params,
                callback,
            } => {
                let (success, affected) = execute_prepared_update(&mut manager, &query, &params);
                callback.complete(vec![Argument::Success(success), Argument::Count(affected)]);
            }
            Command::ExecuteSelect { query, callback } => {
                let success = execute_select(&mut manager, &query);
                callback.complete(vec![Argument::Success(success)]);
            }
            Command::ExecutePreparedSelect {
                query,
                params,
                callback,
            } => {
                let (success, observed) = execute_prepared_select(&mut manager, &query, &params);
                callback.complete(vec![Argument::Success(success), Argument::Count(observed)]);
            }
            Command::FetchArray { query, callback } => {
                let (success, rows) = fetch_array(&mut manager, &query);
                callback.complete(vec![Argument::Success(success), Argument::Rows(rows)]);
            }
            Command::FetchPreparedArray {
                query,
                params,
                callback,
            } => {
                let (success, rows) = fetch_prepared_array(&mut manager, &query, &params);
                callback.complete(vec![Argument::Success(success), Argument::Rows(rows)]);
            }
            Command::FetchMapped { query, callback } => {
                let (success, rows) = fetch_mapped(&mut manager, &query);
                callback.complete(vec![Argument::Success(success), Argument::Records(rows)]);
            }
            Command::FetchPreparedMapped {
                query,
                params,
                callback,
            } => {
                let (success, rows) = fetch_prepared_mapped(&mut manager, &query, &params);
                callback.complete(vec![Argument::Success(success), Argument::Records(rows)]);
            }
            Command::Close { callback } => {
                manager.close();
                callback.complete(Vec::new());
            }
        }
    }

    // The connection never outlives the worker.
    manager.close();
}

fn log_client_error(context: &str, err: &ClientError) {
    error!(
        code = err.code,
        sql_state = %err.sql_state,
        "{context}: {}",
        err.message
    );
}

fn connect(manager: &mut ConnectionManager) -> bool {
    match manager.connect() {
        Ok(()) => true,
        Err(err) => {
            log_client_error("connect failed", &err);
            false
        }
    }
}

fn set_schema(manager: &mut ConnectionManager, schema: &str) -> bool {
    if !manager.is_usable() {
        return false;
    }
    match manager.set_schema(schema) {
        Ok(()) => true,
        Err(err) => {
            log_client_error("schema change failed", &err);
            false
        }
    }
}

fn execute(manager: &mut ConnectionManager, query: &str) -> bool {
    if !manager.is_usable() {
        return false;
    }
    let Some(connection) = manager.live() else {
        return false;
    };
    match connection.execute(query) {
        Ok(_) => true,
        Err(err) => {
            log_client_error("statement execution failed", &err);
            false
        }
    }
}

fn execute_prepared(manager: &mut ConnectionManager, query: &str, params: &[Value]) -> bool {
    if !manager.is_usable() {
        return false;
    }
    let Some(connection) = manager.live() else {
        return false;
    };
    let outcome = (|| -> Result<(), ClientError> {
        let mut statement = connection.prepare(query)?;
        bind_parameters(statement.as_mut(), params)?;
        statement.execute()?;
        Ok(())
    })();
    match outcome {
        Ok(()) => true,
        Err(err) => {
            log_client_error("prepared statement execution failed", &err);
            false
        }
    }
}

fn execute_update(manager: &mut ConnectionManager, query: &str) -> (bool, u64) {
    if !manager.is_usable() {
        return (false, 0);
    }
    let Some(connection) = manager.live() else {
        return (false, 0);
    };
    match connection.execute_update(query) {
        Ok(affected) => (true, affected),
        Err(err) => {
            log_client_error("update execution failed", &err);
            (false, 0)
        }
    }
}

fn execute_prepared_update(
    manager: &mut ConnectionManager,
    query: &str,
    params: &[Value],
) -> (bool, u64) {
    if !manager.is_usable() {
        return (false, 0);
    }
    let Some(connection) = manager.live() else {
        return (false, 0);
    };
    let outcome = (|| -> Result<u64, ClientError> {
        let mut statement = connection.prepare(query)?;
        bind_parameters(statement.as_mut(), params)?;
        statement.execute_update()
    })();
    match outcome {
        Ok(affected) => (true, affected),
        Err(err) => {
            log_client_error("prepared update execution failed", &err);
            (false, 0)
        }
    }
}

fn execute_select(manager: &mut ConnectionManager, query: &str) -> bool {
    if !manager.is_usable() {
        return false;
    }
    let Some(connection) = manager.live() else {
        return false;
    };
    let outcome = (|| -> Result<(), ClientError> {
        let mut rows = connection.execute_query(query)?;
        let _ = count_rows(rows.as_mut())?;
        Ok(())
    })();
    match outcome {
        Ok(()) => true,
        Err(err) => {
            log_client_error("select execution failed", &err);
            false
        }
    }
}

fn execute_prepared_select(
    manager: &mut ConnectionManager,
    query: &str,
    params: &[Value],
) -> (bool, u64) {
    if !manager.is_usable() {
        return (false, 0);
    }
    let Some(connection) = manager.live() else {
        return (false, 0);
    };
    let outcome = (|| -> Result<u64, ClientError> {
        let mut statement = connection.prepare(query)?;
        bind_parameters(statement.as_mut(), params)?;
        let mut rows = statement.execute_query()?;
        count_rows(rows.as_mut())
    })();
    match outcome {
        Ok(observed) => (true, observed),
        Err(err) => {
            log_client_error("prepared select execution failed", &err);
            (false, 0)
        }
    }
}

fn fetch_array(manager: &mut ConnectionManager, query: &str) -> (bool, Vec<Vec<Value>>) {
    if !manager.is_usable() {
        return (false, Vec::new());
    }
    let Some(connection) = manager.live() else {
        return (false, Vec::new());
    };
    let outcome = (|| -> Result<Vec<Vec<Value>>, ClientError> {
        let mut rows = connection.execute_query(query)?;
        build_array_rows(rows.as_mut())
    })();
    match outcome {
        Ok(rows) => (true, rows),
        Err(err) => {
            log_client_error("array fetch failed", &err);
            (false, Vec::new())
        }
    }
}

fn fetch_prepared_array(
    manager: &mut ConnectionManager,
    query: &str,
    params: &[Value],
) -> (bool, Vec<Vec<Value>>) {
    if !manager.is_usable() {
        return (false, Vec::new());
    }
    let Some(connection) = manager.live() else {
        return (false, Vec::new());
    };
    let outcome = (|| -> Result<Vec<Vec<Value>>, ClientError> {
        let mut statement = connection.prepare(query)?;
        bind_parameters(statement.as_mut(), params)?;
        let mut rows = statement.execute_query()?;
        build_array_rows(rows.as_mut())
    })();
    match outcome {
        Ok(rows) => (true, rows),
        Err(err) => {
            log_client_error("prepared array fetch failed", &err);
            (false, Vec::new())
        }
    }
}

fn fetch_mapped(manager: &mut ConnectionManager, query: &str) -> (bool, Vec<MappedRow>) {
    if !manager.is_usable() {
        return (false, Vec::new());
    }
    let Some(connection) = manager.live() else {
        return (false, Vec::new());
    };
    let outcome = (|| -> Result<Vec<MappedRow>, ClientError> {
        let mut rows = connection.execute_query(query)?;
        build_mapped_rows(rows.as_mut())
    })();
    match outcome {
        Ok(rows) => (true, rows),
        Err(err) => {
            log_client_error("mapped fetch failed", &err);
            (false, Vec::new())
        }
    }
}

fn fetch_prepared_mapped(
    manager: &mut ConnectionManager,
    query: &str,
    params: &[Value],
) -> (bool, Vec<MappedRow>) {
    if !manager.is_usable() {
        return (false, Vec::new());
    }
    let Some(connection) = manager.live() else {
        return (false, Vec::new());
    };
    let outcome = (|| -> Result<Vec<MappedRow>, ClientError> {
        let mut statement = connection.prepare(query)?;
        bind_parameters(statement.as_mut(), params)?;
        let mut rows = statement.execute_query()?;
        build_mapped_rows(rows.as_mut())
    })();
    match outcome {
        Ok(rows) => (true, rows),
        Err(err) => {
            log_client_error("prepared mapped fetch failed", &err);
            (false, Vec::new())
        }
    }
}
