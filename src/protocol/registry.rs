/*!
Registry of TNCCS protocol implementations.

The registry is an ordinary value: build it at startup, register the
variants the process supports, share it behind an `Arc`, and drop it (or
`clear` it) at teardown. Sessions keep a reference so a dynamic server can
instantiate the variant its peer turns out to speak.
*/

use std::sync::Arc;

use crate::core::config::TnccsConfig;
use crate::core::error::{Error, Result};
use crate::core::types::{Identity, Role, TnccsType, TransportType};
use crate::invalid_argument_err;
use crate::protocol::builder::TnccsSessionBuilder;
use crate::protocol::pb_tnc::PbTncProtocol;
use crate::protocol::shared::traits::{SecureTransport, TnccsProtocol};
use crate::core::session::TnccsSession;

/// Constructor for one protocol implementation
pub type ProtocolConstructor = fn(Role) -> Box<dyn TnccsProtocol>;

#[derive(Debug, Clone)]
struct Registration {
    variant: TnccsType,
    roles: Vec<Role>,
    transports: Vec<TransportType>,
    constructor: ProtocolConstructor,
}

impl Registration {
    fn matches(&self, role: Role, transport: TransportType) -> bool {
        self.roles.contains(&role) && self.transports.contains(&transport)
    }
}

/// Table of registered TNCCS variants
#[derive(Debug, Clone, Default)]
pub struct TnccsRegistry {
    registrations: Vec<Registration>,
    dynamic_roles: Vec<Role>,
}

impl TnccsRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in implementations
    ///
    /// TNCCS 2.0 for both roles over the 2.0 bindings (and an unknown
    /// binding), plus dynamic negotiation on the server.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        let registered = registry.register(
            TnccsType::V2_0,
            &[Role::Requestor, Role::Responder],
            &[TransportType::Unknown, TransportType::Eap2_0, TransportType::Tls2_0],
            PbTncProtocol::boxed,
        );
        debug_assert!(registered.is_ok());
        registry.register_dynamic(&[Role::Responder]);
        registry
    }

    /// Register `constructor` as the implementation of `variant`
    ///
    /// Replaces any earlier registration of the same variant.
    pub fn register(
        &mut self,
        variant: TnccsType,
        roles: &[Role],
        transports: &[TransportType],
        constructor: ProtocolConstructor,
    ) -> Result<()> {
        if !variant.is_concrete() {
            return invalid_argument_err!("cannot register an implementation of {}", variant);
        }

        if self.unregister(variant) {
            log::info!("replacing {} implementation", variant);
        } else {
            log::debug!("registered {} implementation", variant);
        }
        self.registrations.push(Registration {
            variant,
            roles: roles.to_vec(),
            transports: transports.to_vec(),
            constructor,
        });
        Ok(())
    }

    /// Allow dynamic negotiation for `roles`
    pub fn register_dynamic(&mut self, roles: &[Role]) {
        for role in roles {
            if !self.dynamic_roles.contains(role) {
                self.dynamic_roles.push(*role);
            }
        }
    }

    /// Remove the implementation of `variant`, returning whether one existed
    pub fn unregister(&mut self, variant: TnccsType) -> bool {
        if variant == TnccsType::Dynamic {
            let had = !self.dynamic_roles.is_empty();
            self.dynamic_roles.clear();
            return had;
        }
        let before = self.registrations.len();
        self.registrations.retain(|r| r.variant != variant);
        self.registrations.len() != before
    }

    /// Remove every registration
    pub fn clear(&mut self) {
        self.registrations.clear();
        self.dynamic_roles.clear();
    }

    /// Registered concrete variants, in registration order
    pub fn variants(&self) -> Vec<TnccsType> {
        self.registrations.iter().map(|r| r.variant).collect()
    }

    /// Check if a session for this combination can be created
    pub fn supports(&self, role: Role, transport: TransportType, variant: TnccsType) -> bool {
        match variant {
            TnccsType::Dynamic => {
                self.dynamic_roles.contains(&role)
                    && self.registrations.iter().any(|r| r.matches(role, transport))
            }
            _ => self
                .registrations
                .iter()
                .any(|r| r.variant == variant && r.matches(role, transport)),
        }
    }

    /// Create the protocol implementation for a concrete variant
    pub fn instantiate(
        &self,
        role: Role,
        transport: TransportType,
        variant: TnccsType,
    ) -> Result<Box<dyn TnccsProtocol>> {
        self.registrations
            .iter()
            .find(|r| r.variant == variant && r.matches(role, transport))
            .map(|r| (r.constructor)(role))
            .ok_or(Error::UnsupportedConfiguration {
                role,
                transport,
                variant,
            })
    }

    /// Session factory entry point
    ///
    /// Creates a session in the `Established` state with `transport_type`
    /// preset and the variant pinned, or left to negotiation when `variant`
    /// is [`TnccsType::Dynamic`].
    pub fn create_session<T: SecureTransport>(
        registry: &Arc<TnccsRegistry>,
        is_server: bool,
        server: Identity,
        peer: Identity,
        transport_type: TransportType,
        variant: TnccsType,
        transport: T,
    ) -> Result<TnccsSession<T>> {
        TnccsSessionBuilder::new()
            .with_role(Role::from_is_server(is_server))
            .with_server_identity(server)
            .with_peer_identity(peer)
            .with_transport_type(transport_type)
            .with_variant(variant)
            .with_config(TnccsConfig::default())
            .build(registry, transport)
    }
}
