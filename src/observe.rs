//! Diagnostic output of the database engine.
//!
//! The engine never talks to a global logger directly; it reports through a
//! [`Sink`] handed to it at construction. [`TracingSink`] forwards to `tracing`.

use tracing::{error, info};

pub trait Sink: Send + Sync {
    fn info(&self, message: &str);
    fn error(&self, message: &str);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl Sink for TracingSink {
    fn info(&self, message: &str) {
        info!(target: "vraxion::orm", "{message}");
    }
    fn error(&self, message: &str) {
        error!(target: "vraxion::orm", "{message}");
    }
}
