/*!
Session configuration.

Limits applied by the batch channel when accepting messages and by the
session when building and accepting batches.
*/

use bytes::Bytes;

use crate::core::constants::defaults;
use crate::core::error::Result;
use crate::core::message::{ComponentId, Message, MessageFlags, MessageType};
use crate::invalid_argument_err;
use crate::protocol::shared::traits::TnccsProtocol;

#[cfg(feature = "serde-support")]
use serde::{Deserialize, Serialize};

/// Configuration for a TNCCS session
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct TnccsConfig {
    /// Largest encoded batch built or accepted, headers included
    pub max_batch_size: u32,
    /// Largest payload accepted from a single IMC/IMV call
    pub max_message_size: u32,
    /// Messages allowed to wait for the next batch
    pub max_pending_messages: usize,
}

impl Default for TnccsConfig {
    fn default() -> Self {
        Self {
            max_batch_size: defaults::MAX_BATCH_SIZE,
            max_message_size: defaults::MAX_MESSAGE_SIZE,
            max_pending_messages: defaults::MAX_PENDING_MESSAGES,
        }
    }
}

impl TnccsConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a configuration for carriers with small frames, such as EAP
    /// methods that fragment every batch
    pub fn constrained() -> Self {
        Self {
            max_batch_size: 16_384,
            max_message_size: 8_192,
            max_pending_messages: 64,
        }
    }

    pub fn with_max_batch_size(mut self, size: u32) -> Self {
        self.max_batch_size = size;
        self
    }

    pub fn with_max_message_size(mut self, size: u32) -> Self {
        self.max_message_size = size;
        self
    }

    pub fn with_max_pending_messages(mut self, count: usize) -> Self {
        self.max_pending_messages = count;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_pending_messages == 0 {
            return invalid_argument_err!("max_pending_messages must be non-zero");
        }
        if self.max_message_size == 0 {
            return invalid_argument_err!("max_message_size must be non-zero");
        }
        if self.max_batch_size == 0 {
            return invalid_argument_err!("max_batch_size must be non-zero");
        }
        Ok(())
    }

    /// Validate the configuration for the variant that will build batches
    ///
    /// Every payload the channel accepts must fit into a batch of `protocol`
    /// on its own, otherwise it could never be flushed.
    pub fn validate_for(&self, protocol: &dyn TnccsProtocol) -> Result<()> {
        self.validate()?;

        let largest = Message::new(
            ComponentId::Any,
            ComponentId::Any,
            MessageFlags::empty(),
            MessageType::new(0, 0),
            Bytes::from(vec![0u8; self.max_message_size as usize]),
        );
        let smallest_batch = protocol.batch_overhead() as u64 + protocol.message_size(&largest) as u64;
        if (self.max_batch_size as u64) < smallest_batch {
            return invalid_argument_err!(
                "max_batch_size {} cannot hold a {} message of max_message_size {}",
                self.max_batch_size,
                protocol.variant(),
                self.max_message_size
            );
        }
        Ok(())
    }
}
