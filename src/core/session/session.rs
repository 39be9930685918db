/*!
TNCCS session.

A session owns one secure-transport endpoint and presents the same
[`SecureTransport`] contract to its callers, except that writes never carry
raw bytes: every write builds the next batch from the messages IMC/IMV
components queued in the session's [`BatchChannel`].
*/

use std::collections::VecDeque;
use std::fmt;
use std::io;
use std::sync::Arc;

use bytes::Bytes;

use crate::core::{
    config::TnccsConfig,
    constants::AUTH_TYPE_UNSET,
    error::{Error, Result},
    message::{BatchChannel, ComponentId, MessageFlags, PendingMessage, ReceivedMessage},
    session::state::{SessionState, StateManager},
    types::{Identity, Role, TnccsType, TransportType},
};
use crate::protocol::dynamic::detect_variant;
use crate::protocol::registry::TnccsRegistry;
use crate::protocol::shared::traits::{SecureTransport, TnccsProtocol};
use crate::{format_err, invalid_argument_err, invalid_state_err};

/// One TNCCS conversation bound to one secure-transport endpoint
pub struct TnccsSession<T: SecureTransport> {
    transport: T,
    state_manager: StateManager,
    server_identity: Identity,
    peer_identity: Identity,
    transport_type: TransportType,
    auth_type: u32,
    /// `None` until a dynamic session detected its variant
    protocol: Option<Box<dyn TnccsProtocol>>,
    registry: Arc<TnccsRegistry>,
    channel: BatchChannel,
    received: VecDeque<ReceivedMessage>,
    rejected: Vec<PendingMessage>,
    config: TnccsConfig,
}

impl<T: SecureTransport> fmt::Debug for TnccsSession<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TnccsSession")
            .field("role", &self.role())
            .field("state", &self.state())
            .field("variant", &self.variant())
            .field("negotiating", &self.state_manager.is_negotiating())
            .field("transport_type", &self.transport_type)
            .field("auth_type", &self.auth_type)
            .field("pending", &self.channel.len())
            .field("received", &self.received.len())
            .field("rejected", &self.rejected.len())
            .finish()
    }
}

impl<T: SecureTransport> TnccsSession<T> {
    /// Sessions come from [`TnccsRegistry::create_session`] or the builder
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        transport: T,
        role: Role,
        server_identity: Identity,
        peer_identity: Identity,
        transport_type: TransportType,
        variant: TnccsType,
        protocol: Option<Box<dyn TnccsProtocol>>,
        registry: Arc<TnccsRegistry>,
        config: TnccsConfig,
    ) -> Self {
        Self {
            transport,
            state_manager: StateManager::new(role, variant),
            server_identity,
            peer_identity,
            transport_type,
            auth_type: AUTH_TYPE_UNSET,
            protocol,
            registry,
            channel: BatchChannel::new(&config),
            received: VecDeque::new(),
            rejected: Vec::new(),
            config,
        }
    }

    pub fn role(&self) -> Role {
        self.state_manager.role()
    }

    pub fn is_server(&self) -> bool {
        self.role().is_server()
    }

    pub fn server_identity(&self) -> &Identity {
        &self.server_identity
    }

    pub fn peer_identity(&self) -> &Identity {
        &self.peer_identity
    }

    pub fn state(&self) -> SessionState {
        self.state_manager.state()
    }

    /// Requested variant, or the pinned one once a batch selected it
    pub fn variant(&self) -> TnccsType {
        self.state_manager.variant()
    }

    pub fn config(&self) -> &TnccsConfig {
        &self.config
    }

    /// Handle for IMC/IMV components to queue messages through
    pub fn channel(&self) -> BatchChannel {
        self.channel.clone()
    }

    /// Messages waiting for the next batch
    pub fn pending_len(&self) -> usize {
        self.channel.len()
    }

    /// The underlying transport endpoint
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// IF-T binding the session runs over
    pub fn get_transport(&self) -> TransportType {
        self.transport_type
    }

    /// Record the IF-T binding; last write wins
    pub fn set_transport(&mut self, transport_type: TransportType) -> Result<()> {
        self.ensure_open()?;
        log::debug!("{} transport {} -> {}", self.role(), self.transport_type, transport_type);
        self.transport_type = transport_type;
        Ok(())
    }

    /// How the peer authenticated, [`AUTH_TYPE_UNSET`] before it did
    pub fn get_auth_type(&self) -> u32 {
        self.auth_type
    }

    /// Record how the peer authenticated; last write wins
    pub fn set_auth_type(&mut self, auth_type: u32) -> Result<()> {
        self.ensure_open()?;
        self.auth_type = auth_type;
        Ok(())
    }

    /// Queue a message for the next batch, see [`BatchChannel::send_message`]
    #[allow(clippy::too_many_arguments)]
    pub fn send_message(
        &self,
        source: ComponentId,
        destination: ComponentId,
        flags: MessageFlags,
        payload: &[u8],
        payload_len: u32,
        vendor_id: u32,
        subtype: u32,
    ) -> Result<()> {
        self.channel
            .send_message(source, destination, flags, payload, payload_len, vendor_id, subtype)
    }

    /// Run the transport handshake
    pub fn handshake(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.transport.handshake().map_err(Error::Transport)
    }

    /// Read and process the next inbound batch
    ///
    /// Returns the raw batch, `None` when the transport had nothing to
    /// deliver. Extracted messages are collected for [`take_received`].
    /// A transport failure or a malformed batch closes the session.
    ///
    /// [`take_received`]: TnccsSession::take_received
    pub fn receive(&mut self) -> Result<Option<Bytes>> {
        self.ensure_open()?;

        let record = match self.transport.read() {
            Ok(Some(record)) => record,
            Ok(None) => return Ok(None),
            Err(err) => {
                log::warn!("{} transport read failed: {}", self.role(), err);
                self.terminate();
                return Err(Error::Transport(err));
            }
        };

        if let Err(err) = self.process_inbound(&record) {
            if err.is_fatal() {
                log::warn!("{} closing session: {}", self.role(), err);
                self.terminate();
            }
            return Err(err);
        }
        Ok(Some(record))
    }

    fn process_inbound(&mut self, data: &[u8]) -> Result<()> {
        if data.len() > self.config.max_batch_size as usize {
            return format_err!(
                "batch of {} bytes exceeds the {} byte limit",
                data.len(),
                self.config.max_batch_size
            );
        }

        if self.protocol.is_none() {
            let detected = detect_variant(data);
            if !detected.is_concrete() {
                return format_err!("cannot identify the TNCCS variant of the first batch");
            }
            log::info!("{} detected {} from first batch", self.role(), detected);
            let protocol = self
                .registry
                .instantiate(self.role(), self.transport_type, detected)?;
            if let Err(err) = self.config.validate_for(protocol.as_ref()) {
                log::warn!("{} cannot run {}: {}", self.role(), detected, err);
                return Err(Error::UnsupportedConfiguration {
                    role: self.role(),
                    transport: self.transport_type,
                    variant: detected,
                });
            }
            self.protocol = Some(protocol);
        }

        let protocol = match self.protocol.as_mut() {
            Some(protocol) => protocol,
            None => return invalid_state_err!("variant-selected", "no protocol instantiated"),
        };
        let batch = protocol.process_batch(data)?;
        let variant = protocol.variant();

        self.state_manager.transition_to_variant_selected(variant);
        self.received.extend(batch.messages);

        if batch.close {
            log::info!("{} peer closed the session", self.role());
            self.terminate();
        }
        Ok(())
    }

    /// Messages received so far, in arrival order
    pub fn take_received(&mut self) -> Vec<ReceivedMessage> {
        self.received.drain(..).collect()
    }

    /// Build the next batch from pending messages and write it
    ///
    /// Returns how many messages the batch carries. Messages that would push
    /// the batch past `max_batch_size` stay queued for the next flush.
    /// Messages the variant cannot carry at all, too large for any batch or
    /// not expressible on the wire, are dropped and kept for
    /// [`take_rejected`]. If the batch cannot be built or written, its
    /// messages go back to the front of the queue.
    ///
    /// [`take_rejected`]: TnccsSession::take_rejected
    pub fn flush(&mut self) -> Result<usize> {
        self.ensure_open()?;

        let role = self.state_manager.role();
        let max_batch_size = self.config.max_batch_size as usize;
        let protocol = match self.protocol.as_mut() {
            Some(protocol) => protocol,
            None => return invalid_state_err!("variant-selected", "dynamic negotiation pending"),
        };

        let budget = max_batch_size.saturating_sub(protocol.batch_overhead());
        let (taken, oversized) = self.channel.take_batch(budget, |m| protocol.message_size(m));
        for message in oversized {
            log::warn!(
                "{} dropping message from {}: {} bytes exceed the {} byte batch limit",
                role,
                message.source(),
                protocol.message_size(&message),
                budget
            );
            self.rejected.push(message);
        }

        let mut messages = Vec::with_capacity(taken.len());
        for message in taken {
            match protocol.check_message(&message) {
                Ok(()) => messages.push(message),
                Err(err) => {
                    log::warn!("{} dropping message from {}: {}", role, message.source(), err);
                    self.rejected.push(message);
                }
            }
        }
        let count = messages.len();

        let batch = match protocol.build_batch(&messages) {
            Ok(batch) => batch,
            Err(err) => {
                self.channel.restore(messages);
                return Err(err);
            }
        };
        if batch.len() > max_batch_size {
            self.channel.restore(messages);
            return invalid_argument_err!(
                "{} batch of {} bytes exceeds the {} byte limit",
                protocol.variant(),
                batch.len(),
                max_batch_size
            );
        }
        let variant = protocol.variant();

        if let Err(err) = self.transport.write(&batch) {
            self.channel.restore(messages);
            return Err(Error::Transport(err));
        }

        self.state_manager.transition_to_variant_selected(variant);
        log::debug!("{} flushed {} messages", role, count);
        Ok(count)
    }

    /// Messages dropped by [`flush`] because the variant cannot carry them
    ///
    /// [`flush`]: TnccsSession::flush
    pub fn take_rejected(&mut self) -> Vec<PendingMessage> {
        std::mem::take(&mut self.rejected)
    }

    /// Close the session and its transport
    ///
    /// Queued messages are discarded. Once a variant is in use the peer is
    /// told with a closing batch. Closing twice is a no-op.
    pub fn close(&mut self) -> Result<()> {
        if self.state_manager.is_closed() {
            return Ok(());
        }

        let mut result = Ok(());
        if let Some(protocol) = self.protocol.as_mut() {
            if self.transport.is_complete() {
                result = protocol
                    .build_close()
                    .and_then(|batch| self.transport.write(&batch).map_err(Error::Transport));
            }
        }

        self.terminate();
        result
    }

    /// Move to `Closed`, drop queued messages, close the transport
    fn terminate(&mut self) {
        self.state_manager.transition_to_closed();
        self.channel.close();
        if let Err(err) = self.transport.close() {
            log::debug!("{} transport close failed: {}", self.role(), err);
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.state_manager.is_closed() {
            return Err(Error::SessionTerminated);
        }
        Ok(())
    }
}

impl<T: SecureTransport> SecureTransport for TnccsSession<T> {
    fn handshake(&mut self) -> io::Result<()> {
        TnccsSession::handshake(self).map_err(io::Error::from)
    }

    fn read(&mut self) -> io::Result<Option<Bytes>> {
        self.receive().map_err(io::Error::from)
    }

    /// Only empty writes are accepted; they flush the next batch
    fn write(&mut self, data: &[u8]) -> io::Result<()> {
        if !data.is_empty() {
            let err: Result<()> =
                invalid_argument_err!("raw writes of {} bytes bypass batch construction", data.len());
            return err.map_err(io::Error::from);
        }
        self.flush().map(|_| ()).map_err(io::Error::from)
    }

    fn close(&mut self) -> io::Result<()> {
        TnccsSession::close(self).map_err(io::Error::from)
    }

    fn is_complete(&self) -> bool {
        !self.state_manager.is_closed() && self.transport.is_complete()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::transport::MemoryTransport;

    fn client() -> TnccsSession<MemoryTransport> {
        let registry = Arc::new(TnccsRegistry::with_defaults());
        let (transport, _peer) = MemoryTransport::pair();
        TnccsRegistry::create_session(
            &registry,
            false,
            Identity::new("pdp"),
            Identity::new("ar"),
            TransportType::Tls2_0,
            TnccsType::V2_0,
            transport,
        )
        .unwrap()
    }

    #[test]
    fn test_auth_type_defaults_to_unset() {
        let mut session = client();
        assert_eq!(session.get_auth_type(), AUTH_TYPE_UNSET);

        session.set_auth_type(3).unwrap();
        session.set_auth_type(5).unwrap();
        assert_eq!(session.get_auth_type(), 5);
    }

    #[test]
    fn test_metadata_rejected_after_close() {
        let mut session = client();
        session.close().unwrap();

        assert!(matches!(session.set_transport(TransportType::Eap2_0), Err(Error::SessionTerminated)));
        assert!(matches!(session.set_auth_type(1), Err(Error::SessionTerminated)));
        // Getters keep working
        assert_eq!(session.get_transport(), TransportType::Tls2_0);
        assert_eq!(session.get_auth_type(), AUTH_TYPE_UNSET);
    }

    #[test]
    fn test_raw_write_rejected() {
        let mut session = client();
        let err = SecureTransport::write(&mut session, b"raw").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_flush_before_handshake_keeps_messages() {
        let mut session = client();
        session
            .send_message(ComponentId::Specific(1), ComponentId::Any, MessageFlags::empty(), b"x", 1, 0, 1)
            .unwrap();

        assert!(matches!(session.flush(), Err(Error::Transport(_))));
        assert_eq!(session.pending_len(), 1);
        assert_eq!(session.state(), SessionState::Established);
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut session = client();
        session.close().unwrap();
        session.close().unwrap();
        assert_eq!(session.state(), SessionState::Closed);
        assert!(matches!(session.flush(), Err(Error::SessionTerminated)));
        assert!(matches!(session.receive(), Err(Error::SessionTerminated)));
    }
}
