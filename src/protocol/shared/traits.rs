/*!
Core traits for TNCCS protocol operations.

[`SecureTransport`] is the record-layer contract a session consumes from its
carrier and presents to its own callers. [`TnccsProtocol`] is the seam
between the variant-agnostic session and one wire protocol version.
*/

use std::io;

use bytes::Bytes;

use crate::core::error::Result;
use crate::core::message::{PendingMessage, ReceivedMessage};
use crate::core::types::TnccsType;

/// Secure transport endpoint
///
/// Records are whole application-data units; framing below that is the
/// transport's concern.
pub trait SecureTransport {
    /// Run the handshake to completion
    fn handshake(&mut self) -> io::Result<()>;

    /// Read the next application record, `None` when nothing is pending
    fn read(&mut self) -> io::Result<Option<Bytes>>;

    /// Write one application record
    fn write(&mut self, data: &[u8]) -> io::Result<()>;

    /// Close the endpoint
    fn close(&mut self) -> io::Result<()>;

    /// Whether the handshake has completed and the endpoint is usable
    fn is_complete(&self) -> bool;
}

/// Result of processing one inbound batch
#[derive(Debug, Default)]
pub struct InboundBatch {
    /// IMC/IMV messages in batch order
    pub messages: Vec<ReceivedMessage>,
    /// Peer asked to end the session
    pub close: bool,
}

/// One TNCCS protocol version
pub trait TnccsProtocol: Send {
    /// The variant this implementation speaks
    fn variant(&self) -> TnccsType;

    /// Bytes a batch costs before any message is added
    fn batch_overhead(&self) -> usize;

    /// Bytes `message` adds to a batch
    ///
    /// Must be exact: the session budgets batches with it.
    fn message_size(&self, message: &PendingMessage) -> usize;

    /// Check that `message` can be expressed on the wire
    ///
    /// Messages failing the check are dropped from the outbound queue
    /// instead of being passed to [`build_batch`](TnccsProtocol::build_batch).
    fn check_message(&self, _message: &PendingMessage) -> Result<()> {
        Ok(())
    }

    /// Serialize `messages`, in order, into one outbound batch
    fn build_batch(&mut self, messages: &[PendingMessage]) -> Result<Bytes>;

    /// Serialize a batch ending the session
    fn build_close(&mut self) -> Result<Bytes>;

    /// Parse one inbound batch
    fn process_batch(&mut self, data: &[u8]) -> Result<InboundBatch>;
}
