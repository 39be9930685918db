//! Core components for the TNCCS session layer.
//!
//! This module contains the fundamental building blocks: session and state
//! machine, IMC/IMV messages and the batch channel, configuration, and
//! error handling.

// Export message handling
pub mod message;

// Export session management
pub mod session;

// Session-level enumerations
pub mod types;

// Session limits
pub mod config;

// Protocol constants
pub mod constants;

// Error handling
pub mod error;

// Re-exports for convenience
pub use self::error::{Error, Result, TncResult};
pub use self::message::{BatchChannel, ComponentId, Message, MessageFlags, MessageType};
pub use self::session::{SessionState, TnccsSession};
pub use self::types::{Identity, Role, TnccsType, TransportType};
pub use self::config::TnccsConfig;
