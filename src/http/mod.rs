//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (add or keep request ID)
//!     → client_info.rs (resolve client address and scheme)
//!     → echo handler
//!     → Send to client
//! ```

pub mod client_info;
pub mod request;
pub mod server;

pub use client_info::{ClientInfo, ClientInfoState};
pub use request::{RequestIdExt, X_REQUEST_ID};
pub use server::{HttpServer, ServerError};
