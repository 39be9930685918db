/*!
IMC/IMV message types.

A [`Message`] is one application payload travelling between integrity
measurement components. Outbound it waits in the batch channel as a
[`PendingMessage`]; inbound it is extracted from a batch as a
[`ReceivedMessage`].
*/

use std::fmt;

use bitflags::bitflags;
use bytes::Bytes;

use crate::core::constants::TNC_IMCID_ANY;

/// IMC or IMV identifier, or the wildcard addressing every component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentId {
    Any,
    /// Never `TNC_IMCID_ANY`; the batch channel rejects that value
    Specific(u32),
}

impl ComponentId {
    /// Interpret a raw `TNC_IMCID`/`TNC_IMVID`
    pub fn from_raw(raw: u32) -> Self {
        if raw == TNC_IMCID_ANY {
            ComponentId::Any
        } else {
            ComponentId::Specific(raw)
        }
    }

    pub fn to_raw(self) -> u32 {
        match self {
            ComponentId::Any => TNC_IMCID_ANY,
            ComponentId::Specific(id) => id,
        }
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentId::Any => write!(f, "any"),
            ComponentId::Specific(id) => write!(f, "{}", id),
        }
    }
}

impl From<u32> for ComponentId {
    fn from(raw: u32) -> Self {
        Self::from_raw(raw)
    }
}

bitflags! {
    /// Message flags as passed through the IF-IMC/IF-IMV send call
    ///
    /// Bits unknown to this crate are retained; the variant serializing the
    /// batch decides what it can express.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct MessageFlags: u32 {
        /// Deliver to exactly one recipient component
        const EXCL = 0x0000_0080;
    }
}

/// Message type: vendor ID plus vendor-defined subtype
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageType {
    pub vendor_id: u32,
    pub subtype: u32,
}

impl MessageType {
    pub fn new(vendor_id: u32, subtype: u32) -> Self {
        Self { vendor_id, subtype }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:06x}/0x{:08x}", self.vendor_id, self.subtype)
    }
}

/// One IMC/IMV payload with its addressing
///
/// Immutable once built; the session only moves it between queues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    source: ComponentId,
    destination: ComponentId,
    flags: MessageFlags,
    msg_type: MessageType,
    payload: Bytes,
}

/// Message waiting in the batch channel for the next outbound batch
pub type PendingMessage = Message;

/// Message extracted from an inbound batch
pub type ReceivedMessage = Message;

impl Message {
    pub fn new(
        source: ComponentId,
        destination: ComponentId,
        flags: MessageFlags,
        msg_type: MessageType,
        payload: Bytes,
    ) -> Self {
        Self {
            source,
            destination,
            flags,
            msg_type,
            payload,
        }
    }

    pub fn source(&self) -> ComponentId {
        self.source
    }

    pub fn destination(&self) -> ComponentId {
        self.destination
    }

    pub fn flags(&self) -> MessageFlags {
        self.flags
    }

    pub fn msg_type(&self) -> MessageType {
        self.msg_type
    }

    pub fn vendor_id(&self) -> u32 {
        self.msg_type.vendor_id
    }

    pub fn subtype(&self) -> u32 {
        self.msg_type.subtype
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_id_wildcard() {
        assert_eq!(ComponentId::from_raw(0xffff), ComponentId::Any);
        assert_eq!(ComponentId::from_raw(7), ComponentId::Specific(7));
        assert_eq!(ComponentId::Any.to_raw(), 0xffff);
        assert_eq!(ComponentId::Specific(7).to_raw(), 7);
        assert_eq!(ComponentId::Any.to_string(), "any");
    }

    #[test]
    fn test_flags_retain_unknown_bits() {
        let flags = MessageFlags::from_bits_retain(0x81);
        assert!(flags.contains(MessageFlags::EXCL));
        assert_eq!(flags.bits(), 0x81);
    }

    #[test]
    fn test_message_type_display() {
        let msg_type = MessageType::new(0x005597, 1);
        assert_eq!(msg_type.to_string(), "0x005597/0x00000001");
    }
}
