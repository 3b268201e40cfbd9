//! REST API gateway module for the FixBoard marketplace backend.
//!
//! All network access is funneled through the `Gateway`: it attaches the
//! bearer token where a request requires one and classifies every response
//! into a typed outcome (success, auth rejection, other failure).

pub mod error;
pub mod gateway;

pub use error::ApiError;
pub use gateway::{CallOptions, Gateway};
