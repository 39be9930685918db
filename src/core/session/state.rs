/*!
Session state management for the TNCCS session layer.

This module defines session states and the state machine for session
progression: `Established -> VariantSelected -> Closed`, with `Closed`
reachable from anywhere and never left.
*/

use std::fmt;

use crate::core::types::{Role, TnccsType};

/// Session state for tracking protocol progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SessionState {
    /// Transport handshake done, variant possibly still being negotiated
    Established,
    /// A batch exchange pinned a concrete protocol variant
    VariantSelected,
    /// Session closed
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Established => write!(f, "Established"),
            SessionState::VariantSelected => write!(f, "VariantSelected"),
            SessionState::Closed => write!(f, "Closed"),
        }
    }
}

/// Session state manager
///
/// Tracks the state together with the protocol variant, since leaving
/// `Established` is exactly the moment the variant becomes concrete.
#[derive(Debug, Clone, Copy)]
pub struct StateManager {
    state: SessionState,
    role: Role,
    variant: TnccsType,
}

impl StateManager {
    /// Create a state manager for a freshly established session
    pub fn new(role: Role, variant: TnccsType) -> Self {
        Self {
            state: SessionState::Established,
            role,
            variant,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Requested variant until one is pinned, then the pinned variant
    pub fn variant(&self) -> TnccsType {
        self.variant
    }

    pub fn is_closed(&self) -> bool {
        self.state == SessionState::Closed
    }

    /// Whether the variant is still awaiting negotiation
    pub fn is_negotiating(&self) -> bool {
        self.state == SessionState::Established && self.variant == TnccsType::Dynamic
    }

    /// Pin `variant` after the first well-formed batch
    ///
    /// Ignored once the session left `Established` or for a non-concrete
    /// variant.
    pub fn transition_to_variant_selected(&mut self, variant: TnccsType) {
        if self.state == SessionState::Established && variant.is_concrete() {
            log::info!("{} selected {}", self.role, variant);
            self.variant = variant;
            self.state = SessionState::VariantSelected;
        }
    }

    /// Transition to the closed state
    pub fn transition_to_closed(&mut self) {
        if self.state != SessionState::Closed {
            log::debug!("{} session {} -> {}", self.role, self.state, SessionState::Closed);
            self.state = SessionState::Closed;
        }
    }
}
