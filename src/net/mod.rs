//! Networking modules for the remote REST API.
//!
//! SYSTEM CONTEXT
//! ==============
//! `gateway` defines the auth seam and the response-interpretation boundary,
//! `http` is the reqwest implementation, and `types` defines the wire schema.

pub mod gateway;
pub mod http;
pub mod types;
