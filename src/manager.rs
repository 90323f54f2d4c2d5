use std::sync::{Arc, Mutex};

use tracing::error;

use crate::client::{ClientError, Connection, DatabaseClient};
use crate::config::ConnectionProperties;

/// Owner of the single live connection and the configuration used to open
/// it. Lives on the worker thread; nothing else touches the connection.
pub struct ConnectionManager {
    client: Box<dyn DatabaseClient>,
    properties: Arc<Mutex<ConnectionProperties>>,
    connection: Option<Box<dyn Connection>>,
}

impl ConnectionManager {
    #[must_use]
    pub fn new(
        client: Box<dyn DatabaseClient>,
        properties: Arc<Mutex<ConnectionProperties>>,
    ) -> Self {
        Self {
            client,
            properties,
            connection: None,
        }
    }

    /// Open a connection from the current properties, replacing any
    /// previous one.
    ///
    /// # Errors
    /// Returns [`ClientError`] if the client cannot connect.
    pub fn connect(&mut self) -> Result<(), ClientError> {
        let snapshot = self.properties_snapshot();
        let connection = self.client.connect(&snapshot)?;
        self.connection = Some(connection);
        Ok(())
    }

    /// A connection is usable only when one exists, it reports itself
    /// valid, and a reconnect probe succeeds. The probe may hit the
    /// network; a probe failure counts as unusable, it is not raised.
    pub fn is_usable(&mut self) -> bool {
        match self.connection.as_mut() {
            Some(connection) => {
                connection.is_valid()
                    && match connection.reconnect() {
                        Ok(reachable) => reachable,
                        Err(_) => false,
                    }
            }
            None => false,
        }
    }

    /// Switch the active schema on the live connection and record it in
    /// the stored properties, so a later reconnect lands in the same
    /// schema.
    ///
    /// # Errors
    /// Returns [`ClientError`] if there is no open connection or the
    /// client rejects the change. The stored properties are updated
    /// first, before the live connection is asked.
    pub fn set_schema(&mut self, schema: &str) -> Result<(), ClientError> {
        let Some(connection) = self.connection.as_mut() else {
            return Err(ClientError::new("no open connection", 0, "08003"));
        };
        match self.properties.lock() {
            Ok(mut props) => props.schema = Some(schema.to_string()),
            Err(poisoned) => poisoned.into_inner().schema = Some(schema.to_string()),
        }
        connection.set_schema(schema)
    }

    /// Close the live connection if present and not already closed.
    /// Repeated calls are no-ops.
    pub fn close(&mut self) {
        if let Some(connection) = self.connection.as_mut() {
            if !connection.is_closed() {
                if let Err(err) = connection.close() {
                    error!(
                        code = err.code,
                        sql_state = %err.sql_state,
                        "failed to close connection: {}",
                        err.message
                    );
                }
            }
        }
    }

    pub(crate) fn live(&mut self) -> Option<&mut (dyn Connection + '_)> {
        match self.connection.as_mut() {
            Some(connection) => Some(connection.as_mut()),
            None => None,
        }
    }

    fn properties_snapshot(&self) -> ConnectionProperties {
        match self.properties.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}
