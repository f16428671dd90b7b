//! Dispatcher module exports.
//!
//! Re-exports the dispatcher and the action handler capability so embedders
//! can depend on this module directly.

pub mod dispatcher;

pub use dispatcher::{handler_fn, ActionHandler, Dispatcher, FnHandler};
