//! High-level typed wrapper for the Executor.
//!
//! [`Client`] pairs an [`Executor`] with an [`EngineConfig`] and exposes the
//! remote procedures as typed methods. Every method takes the
//! [`Auth`](exo_core::Auth) context it acts for; a client holds no
//! per-context state of its own.
//!
//! # Example
//!
//! ```ignore
//! use exo_executor::{Client, Deferred, MemoryStore, ReadRequest};
//! use exo_core::{Auth, SortOrder};
//!
//! let client = Client::new(Deferred::new(MemoryStore::new()));
//! let auth = Auth::cik(cik);
//!
//! let me = client.lookup_aliased_self(&auth)?;
//! let rows: Vec<_> = client
//!     .read_many(&auth, vec![temp, humidity], client.read_request(1000, SortOrder::Desc))
//!     .collect::<Result<_, _>>()?;
//! ```

mod listing;
mod resources;
mod series;

pub use listing::{ListedResource, ListingWithInfo};
pub use resources::Listing;

use crate::{EngineConfig, Executor, Result, Transport};

/// Typed client over an [`Executor`].
pub struct Client<T> {
    executor: Executor<T>,
    config: EngineConfig,
}

impl<T: Transport> Client<T> {
    /// Create a client with the default configuration.
    pub fn new(transport: T) -> Self {
        Self {
            executor: Executor::new(transport),
            config: EngineConfig::default(),
        }
    }

    /// Create a client with an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) if the configuration
    /// does not validate.
    pub fn with_config(transport: T, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            executor: Executor::new(transport),
            config,
        })
    }

    /// The underlying executor, for raw command access.
    pub fn executor(&self) -> &Executor<T> {
        &self.executor
    }

    /// The active configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}
