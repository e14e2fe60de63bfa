// Selection reconciliation core: keeps a session's active agent/assistant/model
// consistent with the loaded catalogs and projects it to downstream UI state.

pub mod catalog;
pub mod config;
pub mod diagnostics;
pub mod endpoint;
pub mod error;
pub mod persistence;
pub mod projector;
pub mod resolver;
pub mod selector;
pub mod session;
pub mod test_utils;
pub mod utils;

pub use endpoint::{EndpointKind, EntityKind};
pub use error::{Error, Result};
