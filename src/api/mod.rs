//! Portal HTTP API.
//!
//! Procedures are grouped by domain under `/api/<domain>/...`: queries are
//! `GET`, mutations are `POST`. Protected procedures need a session, admin
//! procedures the `admin` role. The router is composable: `portal_api_router()`
//! returns a `Router` that can be mounted on any axum server.

pub mod endpoints;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::portal_api_router;
pub use server::{start_server, start_server_on, PortalServer};
pub use types::ApiContext;
