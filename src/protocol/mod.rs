//! Protocol implementation for TNCCS.
//!
//! This module contains the transport and variant seams, the registry and
//! session factory, and the built-in TNCCS 2.0 variant.

// Shared traits
pub mod shared;

// Built-in TNCCS 2.0 (PB-TNC) variant
pub mod pb_tnc;

// Variant detection for dynamic sessions
pub mod dynamic;

// Registry and session factory
pub mod registry;

// Builder
pub mod builder;

// In-memory transport
pub mod transport;

// Re-export for convenience
pub use builder::TnccsSessionBuilder;
pub use pb_tnc::PbTncProtocol;
pub use registry::{ProtocolConstructor, TnccsRegistry};
pub use shared::traits::{InboundBatch, SecureTransport, TnccsProtocol};
pub use transport::MemoryTransport;
