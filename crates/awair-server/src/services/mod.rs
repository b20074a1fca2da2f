//! Request-processing services behind the HTTP handlers.

pub mod predict;
