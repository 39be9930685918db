/*!
Message batch channel.

IMC/IMV components hand their messages to the channel, possibly from several
threads; the session drains it in FIFO order whenever it builds the next
outbound batch. A single lock guards both the queue and the closed flag, so
a message is either fully queued before close or rejected after it.
*/

use std::collections::VecDeque;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;

use crate::core::config::TnccsConfig;
use crate::core::constants::TNC_IMCID_ANY;
use crate::core::error::{Error, Result};
use crate::core::message::types::{ComponentId, Message, MessageFlags, MessageType, PendingMessage};
use crate::invalid_argument_err;

#[derive(Debug, Default)]
struct ChannelState {
    queue: VecDeque<PendingMessage>,
    closed: bool,
}

#[derive(Debug)]
struct ChannelInner {
    state: Mutex<ChannelState>,
    max_message_size: usize,
    max_pending_messages: usize,
}

/// Cloneable handle through which IMC/IMV components queue messages for one
/// session
#[derive(Debug, Clone)]
pub struct BatchChannel {
    inner: Arc<ChannelInner>,
}

impl BatchChannel {
    /// Create an open, empty channel with the limits of `config`
    pub fn new(config: &TnccsConfig) -> Self {
        Self {
            inner: Arc::new(ChannelInner {
                state: Mutex::new(ChannelState::default()),
                max_message_size: config.max_message_size as usize,
                max_pending_messages: config.max_pending_messages,
            }),
        }
    }

    /// Queue a message for the next outbound batch
    ///
    /// `payload_len` must equal `payload.len()`. Nothing is queued when the
    /// call fails, and nothing is flushed when it succeeds.
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
        if payload.len() as u64 != payload_len as u64 {
            // Closed sessions report termination regardless of arguments
            if self.is_closed() {
                return Err(Error::SessionTerminated);
            }
            return invalid_argument_err!(
                "message length {} does not match buffer of {} bytes",
                payload_len,
                payload.len()
            );
        }

        let message = Message::new(
            source,
            destination,
            flags,
            MessageType::new(vendor_id, subtype),
            Bytes::copy_from_slice(payload),
        );
        self.enqueue(message)
    }

    /// Queue an already assembled message
    pub fn enqueue(&self, message: PendingMessage) -> Result<()> {
        let mut state = self.inner.state.lock();
        if state.closed {
            return Err(Error::SessionTerminated);
        }
        for id in [message.source(), message.destination()] {
            if id == ComponentId::Specific(TNC_IMCID_ANY) {
                return invalid_argument_err!(
                    "component ID {} is reserved for the wildcard, use ComponentId::Any",
                    TNC_IMCID_ANY
                );
            }
        }
        if message.len() > self.inner.max_message_size {
            return invalid_argument_err!(
                "message of {} bytes exceeds the {} byte limit",
                message.len(),
                self.inner.max_message_size
            );
        }
        if state.queue.len() >= self.inner.max_pending_messages {
            return invalid_argument_err!(
                "{} messages already waiting for the next batch",
                state.queue.len()
            );
        }

        log::debug!(
            "queued message type {} from {} to {} ({} bytes)",
            message.msg_type(),
            message.source(),
            message.destination(),
            message.len()
        );
        state.queue.push_back(message);
        Ok(())
    }

    /// Remove the longest FIFO prefix whose encoded size fits `budget`
    ///
    /// `encoded_size` reports what one message costs inside a batch. A
    /// message too large to fit an empty batch is removed as well and
    /// returned in the second vector, so it cannot hold back the messages
    /// behind it.
    pub fn take_batch<F>(
        &self,
        budget: usize,
        encoded_size: F,
    ) -> (Vec<PendingMessage>, Vec<PendingMessage>)
    where
        F: Fn(&PendingMessage) -> usize,
    {
        let mut state = self.inner.state.lock();
        let mut batch = Vec::new();
        let mut oversized = Vec::new();
        let mut used = 0usize;

        while let Some(message) = state.queue.front() {
            let size = encoded_size(message);
            if size <= budget && used + size > budget {
                break;
            }
            let Some(message) = state.queue.pop_front() else {
                break;
            };
            if size > budget {
                oversized.push(message);
            } else {
                used += size;
                batch.push(message);
            }
        }

        (batch, oversized)
    }

    /// Put messages back at the front of the queue, keeping their order
    pub fn restore(&self, messages: Vec<PendingMessage>) {
        let mut state = self.inner.state.lock();
        if state.closed {
            log::debug!("dropping {} restored messages, channel closed", messages.len());
            return;
        }
        for message in messages.into_iter().rev() {
            state.queue.push_front(message);
        }
    }

    /// Reject all further messages and discard those still queued
    ///
    /// Returns the number of discarded messages.
    pub fn close(&self) -> usize {
        let mut state = self.inner.state.lock();
        state.closed = true;
        let discarded = state.queue.len();
        state.queue.clear();
        if discarded > 0 {
            log::warn!("discarding {} undelivered messages", discarded);
        }
        discarded
    }

    pub fn is_closed(&self) -> bool {
        self.inner.state.lock().closed
    }

    /// Number of messages waiting for the next batch
    pub fn len(&self) -> usize {
        self.inner.state.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the queued messages, oldest first
    pub fn snapshot(&self) -> Vec<PendingMessage> {
        self.inner.state.lock().queue.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel() -> BatchChannel {
        BatchChannel::new(&TnccsConfig::default())
    }

    fn send(channel: &BatchChannel, payload: &[u8]) -> Result<()> {
        channel.send_message(
            ComponentId::Specific(1),
            ComponentId::Any,
            MessageFlags::empty(),
            payload,
            payload.len() as u32,
            0x005597,
            1,
        )
    }

    #[test]
    fn test_fifo_order() {
        let channel = channel();
        send(&channel, b"first").unwrap();
        send(&channel, b"second").unwrap();
        send(&channel, b"third").unwrap();

        let payloads: Vec<_> = channel
            .snapshot()
            .iter()
            .map(|m| m.payload().clone())
            .collect();
        assert_eq!(payloads, vec![&b"first"[..], &b"second"[..], &b"third"[..]]);
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let channel = channel();
        let result = channel.send_message(
            ComponentId::Any,
            ComponentId::Any,
            MessageFlags::empty(),
            b"abc",
            4,
            0,
            1,
        );
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
        assert!(channel.is_empty());
    }

    #[test]
    fn test_closed_channel_rejects() {
        let channel = channel();
        send(&channel, b"lost").unwrap();
        assert_eq!(channel.close(), 1);

        assert!(matches!(send(&channel, b"late"), Err(Error::SessionTerminated)));
        assert!(channel.is_empty());
    }

    #[test]
    fn test_limits() {
        let config = TnccsConfig::new()
            .with_max_message_size(4)
            .with_max_pending_messages(2);
        let channel = BatchChannel::new(&config);

        assert!(matches!(send(&channel, b"12345"), Err(Error::InvalidArgument(_))));
        send(&channel, b"1").unwrap();
        send(&channel, b"2").unwrap();
        assert!(matches!(send(&channel, b"3"), Err(Error::InvalidArgument(_))));
        assert_eq!(channel.len(), 2);
    }

    #[test]
    fn test_take_batch_respects_budget() {
        let channel = channel();
        for payload in [&b"aaaa"[..], b"bbbb", b"cccc"] {
            send(&channel, payload).unwrap();
        }

        let (batch, oversized) = channel.take_batch(9, |m| m.len() + 1);
        assert_eq!(batch.len(), 1);
        assert!(oversized.is_empty());
        let (batch, _) = channel.take_batch(10, |m| m.len() + 1);
        assert_eq!(batch.len(), 2);
        assert!(channel.is_empty());
    }

    #[test]
    fn test_take_batch_sets_aside_oversized() {
        let channel = channel();
        send(&channel, b"oversized").unwrap();
        send(&channel, b"ok").unwrap();
        send(&channel, b"also oversized").unwrap();
        send(&channel, b"fine").unwrap();

        let (batch, oversized) = channel.take_batch(4, |m| m.len());
        let sent: Vec<_> = batch.iter().map(|m| m.payload().clone()).collect();
        assert_eq!(sent, vec![&b"ok"[..]]);
        assert_eq!(oversized.len(), 2);
        assert_eq!(oversized[0].payload(), &b"oversized"[..]);

        // "fine" did not fit next to "ok" and waits for the next batch
        assert_eq!(channel.len(), 1);
    }

    #[test]
    fn test_wildcard_value_as_specific_id_rejected() {
        let channel = channel();
        let result = channel.send_message(
            ComponentId::Specific(TNC_IMCID_ANY),
            ComponentId::Any,
            MessageFlags::empty(),
            b"x",
            1,
            0,
            1,
        );
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
        assert!(channel.is_empty());
    }

    #[test]
    fn test_restore_keeps_order() {
        let channel = channel();
        for payload in [&b"1"[..], b"2", b"3"] {
            send(&channel, payload).unwrap();
        }
        let (taken, _) = channel.take_batch(2, |_| 1);
        channel.restore(taken);

        let payloads: Vec<_> = channel
            .snapshot()
            .iter()
            .map(|m| m.payload().clone())
            .collect();
        assert_eq!(payloads, vec![&b"1"[..], &b"2"[..], &b"3"[..]]);
    }
}
