/*!
Message handling for the TNCCS session layer.

This module provides the IMC/IMV message types and the batch channel that
queues outbound messages for the next batch.
*/

pub mod types;
pub mod channel;

// Re-export commonly used items
pub use types::{ComponentId, Message, MessageFlags, MessageType, PendingMessage, ReceivedMessage};
pub use channel::BatchChannel;
