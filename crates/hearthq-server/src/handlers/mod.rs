//! HTTP request handlers, one module per concern.

pub mod consume;
pub mod options;
pub mod produce;
pub mod topics;
