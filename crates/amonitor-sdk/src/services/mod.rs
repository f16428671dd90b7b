//! Built-in action handlers.

pub mod demo;

pub use demo::DemoActionHandler;
