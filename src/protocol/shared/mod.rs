//! Shared functionality for TNCCS protocol implementations.

pub mod traits;

pub use traits::{InboundBatch, SecureTransport, TnccsProtocol};
