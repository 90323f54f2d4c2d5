/// Configuration for the single managed connection.
///
/// Shared between the submitting side (`set_credentials`) and the worker
/// (connect, schema changes), always behind one mutex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionProperties {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub schema: Option<String>,
    pub auto_reconnect: bool,
}

impl Default for ConnectionProperties {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3306,
            user: String::new(),
            password: String::new(),
            schema: None,
            auto_reconnect: true,
        }
    }
}

impl ConnectionProperties {
    #[must_use]
    pub fn builder() -> ConnectionPropertiesBuilder {
        ConnectionPropertiesBuilder {
            props: Self::default(),
        }
    }
}

/// Fluent builder for [`ConnectionProperties`].
#[derive(Debug, Clone)]
pub struct ConnectionPropertiesBuilder {
    props: ConnectionProperties,
}

impl ConnectionPropertiesBuilder {
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.props.host = host.into();
        self
    }

    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.props.port = port;
        self
    }

    #[must_use]
    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.props.user = user.into();
        self
    }

    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.props.password = password.into();
        self
    }

    #[must_use]
    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.props.schema = Some(schema.into());
        self
    }

    #[must_use]
    pub fn auto_reconnect(mut self, auto_reconnect: bool) -> Self {
        self.props.auto_reconnect = auto_reconnect;
        self
    }

    #[must_use]
    pub fn finish(self) -> ConnectionProperties {
        self.props
    }
}
