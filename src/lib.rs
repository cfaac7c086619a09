//! marmite: client for the recipe-manager REST API with a managed auth session.
//!
//! SYSTEM CONTEXT
//! ==============
//! `session` owns tokens and identity and decides when to refresh. `net`
//! holds the wire types, the `AuthGateway` seam and its reqwest
//! implementation. `api` layers typed resource calls on top of both, routing
//! every bearer request through the session's refresh-once-and-retry path.
//!
//! A typical embedder builds one [`session::SessionManager`], hydrates it,
//! spawns [`session::spawn_refresh_task`], and hands clones to consumers.

pub mod api;
pub mod config;
pub mod net;
pub mod session;
pub mod shopping;
pub mod validation;

pub use api::Api;
pub use config::{ClientConfig, ConfigError};
pub use net::http::HttpGateway;
pub use session::{SessionError, SessionManager};
