//! Event hooks for run and pattern lifecycle.

pub mod dispatcher;
pub mod handler;
pub mod types;

pub use dispatcher::EventDispatcher;
pub use handler::SextantEventHandler;
