/*!
Session management for the TNCCS session layer.

This module provides the session state machine and the session itself.
*/

// State management
pub mod state;

// Session
pub mod session;

// Re-export main session types
pub use self::state::{SessionState, StateManager};
pub use self::session::TnccsSession;
