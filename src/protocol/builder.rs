/*!
Session builder for the TNCCS session layer.

This module provides a builder pattern for creating sessions with a
specific role, identities, transport binding, variant and configuration.
*/

use std::sync::Arc;

use crate::core::{
    config::TnccsConfig,
    error::{Error, Result},
    session::TnccsSession,
    types::{Identity, Role, TnccsType, TransportType},
};
use crate::protocol::registry::TnccsRegistry;
use crate::protocol::shared::traits::SecureTransport;

/// Builder for TNCCS sessions
#[derive(Debug, Clone)]
pub struct TnccsSessionBuilder {
    role: Role,
    server_identity: Identity,
    peer_identity: Identity,
    transport_type: TransportType,
    variant: TnccsType,
    config: TnccsConfig,
}

impl Default for TnccsSessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TnccsSessionBuilder {
    /// Create a new builder: client role, TNCCS 2.0, unknown binding
    pub fn new() -> Self {
        Self {
            role: Role::Requestor,
            server_identity: Identity::any(),
            peer_identity: Identity::any(),
            transport_type: TransportType::Unknown,
            variant: TnccsType::V2_0,
            config: TnccsConfig::default(),
        }
    }

    /// Set the role
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    /// Set as TNC Client
    pub fn as_client(mut self) -> Self {
        self.role = Role::Requestor;
        self
    }

    /// Set as TNC Server
    pub fn as_server(mut self) -> Self {
        self.role = Role::Responder;
        self
    }

    pub fn with_server_identity(mut self, identity: impl Into<Identity>) -> Self {
        self.server_identity = identity.into();
        self
    }

    pub fn with_peer_identity(mut self, identity: impl Into<Identity>) -> Self {
        self.peer_identity = identity.into();
        self
    }

    /// Set the IF-T binding the session runs over
    pub fn with_transport_type(mut self, transport_type: TransportType) -> Self {
        self.transport_type = transport_type;
        self
    }

    /// Pin a variant, or pass [`TnccsType::Dynamic`] to negotiate
    pub fn with_variant(mut self, variant: TnccsType) -> Self {
        self.variant = variant;
        self
    }

    /// Negotiate the variant from the peer's first batch
    pub fn negotiate(self) -> Self {
        self.with_variant(TnccsType::Dynamic)
    }

    pub fn with_config(mut self, config: TnccsConfig) -> Self {
        self.config = config;
        self
    }

    /// Build a session over `transport`
    pub fn build<T: SecureTransport>(
        self,
        registry: &Arc<TnccsRegistry>,
        transport: T,
    ) -> Result<TnccsSession<T>> {
        self.config.validate()?;

        if !registry.supports(self.role, self.transport_type, self.variant) {
            return Err(Error::UnsupportedConfiguration {
                role: self.role,
                transport: self.transport_type,
                variant: self.variant,
            });
        }

        let protocol = match self.variant {
            TnccsType::Dynamic => None,
            variant => {
                let protocol = registry.instantiate(self.role, self.transport_type, variant)?;
                self.config.validate_for(protocol.as_ref())?;
                Some(protocol)
            }
        };

        if self.peer_identity.is_any() {
            log::debug!("no peer identity supplied for {} session", self.role);
        }

        log::info!(
            "created {} session for {} between '{}' and '{}' over {}",
            self.variant,
            self.role,
            self.server_identity,
            self.peer_identity,
            self.transport_type
        );

        Ok(TnccsSession::new(
            transport,
            self.role,
            self.server_identity,
            self.peer_identity,
            self.transport_type,
            self.variant,
            protocol,
            Arc::clone(registry),
            self.config,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::session::SessionState;
    use crate::protocol::transport::MemoryTransport;

    #[test]
    fn test_build_dynamic_server() {
        let registry = Arc::new(TnccsRegistry::with_defaults());
        let (transport, _peer) = MemoryTransport::pair();

        let session = TnccsSessionBuilder::new()
            .as_server()
            .with_server_identity("pdp.example.org")
            .with_peer_identity("client.example.org")
            .with_transport_type(TransportType::Tls2_0)
            .negotiate()
            .build(&registry, transport)
            .unwrap();

        assert_eq!(session.role(), Role::Responder);
        assert_eq!(session.variant(), TnccsType::Dynamic);
        assert_eq!(session.state(), SessionState::Established);
        assert_eq!(session.server_identity().as_str(), "pdp.example.org");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let registry = Arc::new(TnccsRegistry::with_defaults());
        let (transport, _peer) = MemoryTransport::pair();

        let result = TnccsSessionBuilder::new()
            .with_config(TnccsConfig::new().with_max_pending_messages(0))
            .build(&registry, transport);
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_config_checked_against_variant() {
        let registry = Arc::new(TnccsRegistry::with_defaults());
        let (transport, _peer) = MemoryTransport::pair();

        // Room for the payload but not for the PB-TNC headers around it
        let config = TnccsConfig::new()
            .with_max_message_size(64)
            .with_max_batch_size(80);
        let result = TnccsSessionBuilder::new()
            .with_config(config)
            .build(&registry, transport);
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_unregistered_variant_rejected() {
        let registry = Arc::new(TnccsRegistry::with_defaults());
        let (transport, _peer) = MemoryTransport::pair();

        let result = TnccsSessionBuilder::new()
            .with_variant(TnccsType::Soh)
            .build(&registry, transport);
        assert!(matches!(result, Err(Error::UnsupportedConfiguration { .. })));
    }
}
