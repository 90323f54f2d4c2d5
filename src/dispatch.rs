use std::sync::{Arc, Mutex, MutexGuard};

use crate::callback::Callback;
use crate::client::DatabaseClient;
use crate::config::ConnectionProperties;
use crate::error::SqlDispatchError;
use crate::manager::ConnectionManager;
use crate::types::Value;
use crate::worker::{Command, WorkerHandle};

/// Asynchronous façade over one blocking database connection.
///
/// Operations submitted from any thread are queued and executed one at a
/// time on a dedicated worker thread; completion is reported through each
/// task's [`Callback`], in submission order, before the next task starts.
/// The worker starts lazily with the first submitted operation and runs
/// until [`shutdown`](Self::shutdown) (or drop).
///
/// Failures never cross the queue: a task that cannot run reports
/// `success = false` through its callback, and the worker moves on.
pub struct SqlDispatcher {
    properties: Arc<Mutex<ConnectionProperties>>,
    state: Mutex<DispatchState>,
}

struct DispatchState {
    client: Option<Box<dyn DatabaseClient>>,
    worker: Option<WorkerHandle>,
}

impl SqlDispatcher {
    pub fn new(client: impl DatabaseClient) -> Self {
        Self::with_properties(client, ConnectionProperties::default())
    }

    pub fn with_properties(client: impl DatabaseClient, properties: ConnectionProperties) -> Self {
        Self {
            properties: Arc::new(Mutex::new(properties)),
            state: Mutex::new(DispatchState {
                client: Some(Box::new(client)),
                worker: None,
            }),
        }
    }

    /// Update the stored credentials, taking effect on the next connect.
    /// Applied directly, never queued.
    pub fn set_credentials(&self, host: &str, user: &str, password: &str, port: u16) {
        let mut props = self.lock_properties();
        props.host = host.to_string();
        props.user = user.to_string();
        props.password = password.to_string();
        props.port = port;
    }

    /// Snapshot of the current connection properties.
    #[must_use]
    pub fn properties(&self) -> ConnectionProperties {
        self.lock_properties().clone()
    }

    /// Open the connection. Callback: `(success)`.
    ///
    /// # Errors
    /// Returns [`SqlDispatchError`] if the task cannot be queued.
    pub fn connect_to_database(&self, callback: Callback) -> Result<(), SqlDispatchError> {
        self.submit(Command::Connect { callback })
    }

    /// Switch the active schema, remembering it for reconnects.
    /// Callback: `(success)`.
    ///
    /// # Errors
    /// Returns [`SqlDispatchError`] if the task cannot be queued.
    pub fn set_schema(&self, schema: &str, callback: Callback) -> Result<(), SqlDispatchError> {
        self.submit(Command::SetSchema {
            schema: schema.to_string(),
            callback,
        })
    }

    /// Run a statement. Callback: `(success)`.
    ///
    /// # Errors
    /// Returns [`SqlDispatchError`] if the task cannot be queued.
    pub fn execute_query(&self, query: &str, callback: Callback) -> Result<(), SqlDispatchError> {
        self.submit(Command::Execute {
            query: query.to_string(),
            callback,
        })
    }

    /// Run a parameterized statement. Callback: `(success)`.
    ///
    /// # Errors
    /// Returns [`SqlDispatchError`] if the task cannot be queued.
    pub fn execute_prepared_query(
        &self,
        query: &str,
        params: Vec<Value>,
        callback: Callback,
    ) -> Result<(), SqlDispatchError> {
        self.submit(Command::ExecutePrepared {
            query: query.to_string(),
            params,
            callback,
        })
    }

    /// Run a DML statement. Callback: `(success, affected_rows)`.
    ///
    /// # Errors
    /// Returns [`SqlDispatchError`] if the task cannot be queued.
    pub fn execute_update_query(
        &self,
        query: &str,
        callback: Callback,
    ) -> Result<(), SqlDispatchError> {
        self.submit(Command::ExecuteUpdate {
            query: query.to_string(),
            callback,
        })
    }

    /// Run a parameterized DML statement. Callback: `(success,
    /// affected_rows)`.
    ///
    /// # Errors
    /// Returns [`SqlDispatchError`] if the task cannot be queued.
    pub fn execute_prepared_update_query(
        &self,
        query: &str,
        params: Vec<Value>,
        callback: Callback,
    ) -> Result<(), SqlDispatchError> {
        self.submit(Command::ExecutePreparedUpdate {
            query: query.to_string(),
            params,
            callback,
        })
    }

    /// Run a SELECT, discarding its rows. Callback: `(success)`.
    ///
    /// # Errors
    /// Returns [`SqlDispatchError`] if the task cannot be queued.
    pub fn execute_select_query(
        &self,
        query: &str,
        callback: Callback,
    ) -> Result<(), SqlDispatchError> {
        self.submit(Command::ExecuteSelect {
            query: query.to_string(),
            callback,
        })
    }

    /// Run a parameterized SELECT, discarding its rows. Callback:
    /// `(success, row_count)`.
    ///
    /// # Errors
    /// Returns [`SqlDispatchError`] if the task cannot be queued.
    pub fn execute_prepared_select_query(
        &self,
        query: &str,
        params: Vec<Value>,
        callback: Callback,
    ) -> Result<(), SqlDispatchError> {
        self.submit(Command::ExecutePreparedSelect {
            query: query.to_string(),
            params,
            callback,
        })
    }

    /// Fetch all rows in column order. Callback: `(success, rows)`.
    ///
    /// # Errors
    /// Returns [`SqlDispatchError`] if the task cannot be queued.
    pub fn fetch_array(&self, query: &str, callback: Callback) -> Result<(), SqlDispatchError> {
        self.submit(Command::FetchArray {
            query: query.to_string(),
            callback,
        })
    }

    /// Parameterized [`fetch_array`](Self::fetch_array). Callback:
    /// `(success, rows)`.
    ///
    /// # Errors
    /// Returns [`SqlDispatchError`] if the task cannot be queued.
    pub fn fetch_prepared_array(
        &self,
        query: &str,
        params: Vec<Value>,
        callback: Callback,
    ) -> Result<(), SqlDispatchError> {
        self.submit(Command::FetchPreparedArray {
            query: query.to_string(),
            params,
            callback,
        })
    }

    /// Fetch all rows keyed by column name. Callback: `(success, rows)`.
    ///
    /// # Errors
    /// Returns [`SqlDispatchError`] if the task cannot be queued.
    pub fn fetch_mapped(&self, query: &str, callback: Callback) -> Result<(), SqlDispatchError> {
        self.submit(Command::FetchMapped {
            query: query.to_string(),
            callback,
        })
    }

    /// Parameterized [`fetch_mapped`](Self::fetch_mapped). Callback:
    /// `(success, rows)`.
    ///
    /// # Errors
    /// Returns [`SqlDispatchError`] if the task cannot be queued.
    pub fn fetch_prepared_mapped(
        &self,
        query: &str,
        params: Vec<Value>,
        callback: Callback,
    ) -> Result<(), SqlDispatchError> {
        self.submit(Command::FetchPreparedMapped {
            query: query.to_string(),
            params,
            callback,
        })
    }

    /// Close the connection. The callback is still invoked, with only the
    /// caller's extra arguments.
    ///
    /// # Errors
    /// Returns [`SqlDispatchError`] if the task cannot be queued.
    pub fn close_connection(&self, callback: Callback) -> Result<(), SqlDispatchError> {
        self.submit(Command::Close { callback })
    }

    /// Stop the worker and wait for it to finish. The task in flight
    /// completes and reports; anything still queued is abandoned without
    /// its callback, and later submissions fail with a connection error.
    /// The connection is closed on the way out. Idempotent.
    pub fn shutdown(&self) {
        let mut state = self.lock_state();
        state.client = None;
        if let Some(mut worker) = state.worker.take() {
            drop(state);
            worker.shutdown();
        }
    }

    fn submit(&self, command: Command) -> Result<(), SqlDispatchError> {
        let mut state = self.lock_state();
        if state.worker.is_none() {
            let Some(client) = state.client.take() else {
                return Err(SqlDispatchError::ConnectionError(
                    "dispatcher is shut down".into(),
                ));
            };
            let manager = ConnectionManager::new(client, Arc::clone(&self.properties));
            state.worker = Some(WorkerHandle::spawn(manager)?);
        }
        let Some(worker) = state.worker.as_ref() else {
            return Err(SqlDispatchError::ConnectionError(
                "dispatch worker unavailable".into(),
            ));
        };
        worker.send(command)
    }

    fn lock_state(&self) -> MutexGuard<'_, DispatchState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn lock_properties(&self) -> MutexGuard<'_, ConnectionProperties> {
        match self.properties.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Drop for SqlDispatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}
