//! stencil-session: the studio's application context.
//!
//! Design rules:
//! - Session state is an explicit `AppContext`, created at startup and
//!   shut down at exit. Nothing is global.
//! - The signed-in user is persisted as JSON under a fixed key.
//! - Gated pages and the editor get the user through `AppContext`, never
//!   by reaching into the store.

pub mod context;
pub mod store;

pub use context::{AppContext, ContextError, Theme};
pub use store::{LocalStore, StoreError, STORE_FILE_EXT, THEME_KEY, USER_KEY};
