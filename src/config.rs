use std::sync::Arc;

use crate::catalog::TypeRegistry;

/// Options for configuring a [`Connection`](crate::connection::Connection).
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Rewrite `@name` / `:name` placeholders to `$n` before preparing.
    pub rewrite_named_parameters: bool,
    /// Bind the native session when the connection opens. When `false`, each reader binds the
    /// session for its own lifetime.
    pub bind_on_open: bool,
    pub type_registry: Arc<TypeRegistry>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            rewrite_named_parameters: true,
            bind_on_open: true,
            type_registry: TypeRegistry::global(),
        }
    }
}

impl ConnectionConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_named_parameter_rewrite(mut self, rewrite: bool) -> Self {
        self.rewrite_named_parameters = rewrite;
        self
    }

    #[must_use]
    pub fn with_bind_on_open(mut self, bind_on_open: bool) -> Self {
        self.bind_on_open = bind_on_open;
        self
    }

    /// Use a private type registry instead of the process-wide one.
    #[must_use]
    pub fn with_type_registry(mut self, registry: Arc<TypeRegistry>) -> Self {
        self.type_registry = registry;
        self
    }

    #[must_use]
    pub fn builder() -> ConnectionConfigBuilder {
        ConnectionConfigBuilder::default()
    }
}

/// Fluent builder for [`ConnectionConfig`].
#[derive(Debug, Clone, Default)]
pub struct ConnectionConfigBuilder {
    opts: ConnectionConfig,
}

impl ConnectionConfigBuilder {
    #[must_use]
    pub fn named_parameter_rewrite(mut self, rewrite: bool) -> Self {
        self.opts.rewrite_named_parameters = rewrite;
        self
    }

    #[must_use]
    pub fn bind_on_open(mut self, bind_on_open: bool) -> Self {
        self.opts.bind_on_open = bind_on_open;
        self
    }

    #[must_use]
    pub fn type_registry(mut self, registry: Arc<TypeRegistry>) -> Self {
        self.opts.type_registry = registry;
        self
    }

    #[must_use]
    pub fn finish(self) -> ConnectionConfig {
        self.opts
    }
}
