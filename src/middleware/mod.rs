//! Axum integration: page gate, extractors and the resource API.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use planguard::middleware::{GateConfig, GateState, api_routes, protect};
//!
//! // 1. Provide an IdentityProvider and a DocumentStore
//! let identity = planguard::identity::init_shared(IdentityConfig::from_env()?).await?;
//! let state = GateState::new(GateConfig::from_env()?, identity, store)?;
//!
//! // 2. Gate the page routes and mount the API
//! let app = protect(pages, state.clone()).merge(api_routes(state));
//!
//! // 3. Use AuthUser / ProUser in your own handlers
//! async fn export(ProUser(user): ProUser) -> impl IntoResponse { /* ... */ }
//! ```

mod config;
mod cookies;
mod error;
mod extractor;
mod gate;
mod routes;
mod state;

pub use config::GateConfig;
pub use extractor::{AuthUser, ProUser};
pub use gate::{GateOutcome, ProtectedPaths, access_gate, evaluate, protect};
pub use routes::api_routes;
pub use state::GateState;
