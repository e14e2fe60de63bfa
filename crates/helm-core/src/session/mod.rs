pub mod state;
pub mod store;

pub use state::{OptionSetter, SessionField, SessionSlot, SessionState};
pub use store::SessionStore;
