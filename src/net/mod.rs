//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → tls.rs (optional TLS handshake via axum-server/rustls)
//!     → Hand off to HTTP layer, tagged as TLS or plain
//! ```
//!
//! # Design Decisions
//! - TLS is a property of the listener, not of individual connections
//! - The TLS flag is the fallback for scheme resolution

pub mod tls;
