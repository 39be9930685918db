/*!
TNCCS 2.0 (PB-TNC) batch framing.

Batch header (8 bytes):
- Version (1 byte): 0x02
- Director (1 byte): 0x80 when sent by the server
- Reserved (1 byte)
- Batch Type (1 byte, low nibble)
- Batch Length (4 bytes, big-endian): including this header

Every IMC/IMV payload travels as a PB-PA message: a 12 byte PB-TNC message
header (flags, 24 bit vendor, type, length) followed by a 12 byte PA
sub-header (flags, 24 bit PA vendor, PA subtype, posture collector ID,
posture validator ID) and the payload.
*/

use std::fmt;

use byteorder::{BigEndian, ByteOrder};
use bytes::{BufMut, Bytes, BytesMut};

use crate::core::constants::{TNC_VENDORID_IETF, pb_tnc};
use crate::core::error::Result;
use crate::core::message::{ComponentId, Message, MessageFlags, MessageType, PendingMessage};
use crate::core::types::{Role, TnccsType};
use crate::protocol::shared::traits::{InboundBatch, TnccsProtocol};
use crate::{format_err, invalid_argument_err, protocol_err};

/// PB-TNC batch types
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BatchType {
    /// Client data
    CData = 1,
    /// Server data
    SData = 2,
    /// Assessment result
    Result = 3,
    /// Client retry request
    CRetry = 4,
    /// Server retry request
    SRetry = 5,
    /// End of session
    Close = 6,
}

impl BatchType {
    /// Convert a u8 value to a BatchType
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(BatchType::CData),
            2 => Some(BatchType::SData),
            3 => Some(BatchType::Result),
            4 => Some(BatchType::CRetry),
            5 => Some(BatchType::SRetry),
            6 => Some(BatchType::Close),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Data batch type sent by `role`
    pub fn data_for(role: Role) -> Self {
        match role {
            Role::Requestor => BatchType::CData,
            Role::Responder => BatchType::SData,
        }
    }

    /// Whether `role` may send this batch type
    pub fn is_legal_from(self, role: Role) -> bool {
        match role {
            Role::Requestor => matches!(self, BatchType::CData | BatchType::CRetry | BatchType::Close),
            Role::Responder => matches!(
                self,
                BatchType::SData | BatchType::Result | BatchType::SRetry | BatchType::Close
            ),
        }
    }
}

impl fmt::Display for BatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchType::CData => write!(f, "CDATA"),
            BatchType::SData => write!(f, "SDATA"),
            BatchType::Result => write!(f, "RESULT"),
            BatchType::CRetry => write!(f, "CRETRY"),
            BatchType::SRetry => write!(f, "SRETRY"),
            BatchType::Close => write!(f, "CLOSE"),
        }
    }
}

/// PB-TNC batch header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchHeader {
    /// Sent by the server
    pub director_server: bool,
    pub batch_type: BatchType,
    /// Total batch length including the header
    pub length: u32,
}

impl BatchHeader {
    /// Convert the header to bytes (8 bytes)
    pub fn to_bytes(&self) -> [u8; pb_tnc::BATCH_HEADER_SIZE] {
        let mut bytes = [0u8; pb_tnc::BATCH_HEADER_SIZE];
        bytes[0] = pb_tnc::VERSION;
        bytes[1] = if self.director_server { pb_tnc::DIRECTOR_SERVER } else { 0 };
        bytes[3] = self.batch_type.as_u8();
        BigEndian::write_u32(&mut bytes[4..8], self.length);
        bytes
    }

    /// Parse a header from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < pb_tnc::BATCH_HEADER_SIZE {
            return format_err!("batch of {} bytes is shorter than its header", bytes.len());
        }
        if bytes[0] != pb_tnc::VERSION {
            return format_err!("unsupported PB-TNC version {}", bytes[0]);
        }

        let batch_type = match BatchType::from_u8(bytes[3] & 0x0f) {
            Some(t) => t,
            None => return format_err!("invalid PB-TNC batch type {}", bytes[3] & 0x0f),
        };

        Ok(Self {
            director_server: bytes[1] & pb_tnc::DIRECTOR_SERVER != 0,
            batch_type,
            length: BigEndian::read_u32(&bytes[4..8]),
        })
    }
}

/// PB-TNC 2.0 protocol state for one session endpoint
#[derive(Debug)]
pub struct PbTncProtocol {
    role: Role,
    batches_sent: u64,
    batches_received: u64,
}

impl PbTncProtocol {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            batches_sent: 0,
            batches_received: 0,
        }
    }

    /// Registry constructor
    pub fn boxed(role: Role) -> Box<dyn TnccsProtocol> {
        Box::new(Self::new(role))
    }

    /// Posture collector and validator IDs for an outbound message
    fn component_ids(&self, message: &PendingMessage) -> Result<(u16, u16)> {
        let (imc, imv) = match self.role {
            Role::Requestor => (message.source(), message.destination()),
            Role::Responder => (message.destination(), message.source()),
        };
        Ok((wire_component_id(imc)?, wire_component_id(imv)?))
    }

    fn write_pa_message(&self, buf: &mut BytesMut, message: &PendingMessage) -> Result<()> {
        self.check_message(message)?;
        let (collector, validator) = self.component_ids(message)?;
        let length = pb_tnc::PA_MSG_OVERHEAD + message.len();

        let mut header = [0u8; pb_tnc::PA_MSG_OVERHEAD];
        // PB-TNC message header
        BigEndian::write_u24(&mut header[1..4], TNC_VENDORID_IETF);
        BigEndian::write_u32(&mut header[4..8], pb_tnc::MSG_TYPE_PA);
        BigEndian::write_u32(&mut header[8..12], length as u32);
        // PA sub-header
        header[12] = if message.flags().contains(MessageFlags::EXCL) { 0x80 } else { 0 };
        BigEndian::write_u24(&mut header[13..16], message.vendor_id());
        BigEndian::write_u32(&mut header[16..20], message.subtype());
        BigEndian::write_u16(&mut header[20..22], collector);
        BigEndian::write_u16(&mut header[22..24], validator);

        buf.put_slice(&header);
        buf.put_slice(message.payload());
        Ok(())
    }

    fn read_pa_message(&self, value: &[u8]) -> Result<Message> {
        if value.len() < pb_tnc::PA_HEADER_SIZE {
            return format_err!("PA message of {} bytes is shorter than its header", value.len());
        }

        let flags = if value[0] & 0x80 != 0 { MessageFlags::EXCL } else { MessageFlags::empty() };
        let vendor_id = BigEndian::read_u24(&value[1..4]);
        let subtype = BigEndian::read_u32(&value[4..8]);
        let collector = ComponentId::from_raw(BigEndian::read_u16(&value[8..10]) as u32);
        let validator = ComponentId::from_raw(BigEndian::read_u16(&value[10..12]) as u32);

        // The peer wrote the batch, so its role decides the direction
        let (source, destination) = match self.role.peer() {
            Role::Requestor => (collector, validator),
            Role::Responder => (validator, collector),
        };

        Ok(Message::new(
            source,
            destination,
            flags,
            MessageType::new(vendor_id, subtype),
            Bytes::copy_from_slice(&value[pb_tnc::PA_HEADER_SIZE..]),
        ))
    }

    fn header_only(&mut self, batch_type: BatchType) -> Bytes {
        let header = BatchHeader {
            director_server: self.role.is_server(),
            batch_type,
            length: pb_tnc::BATCH_HEADER_SIZE as u32,
        };
        self.batches_sent += 1;
        Bytes::copy_from_slice(&header.to_bytes())
    }
}

fn wire_component_id(id: ComponentId) -> Result<u16> {
    let raw = id.to_raw();
    match u16::try_from(raw) {
        Ok(wire) => Ok(wire),
        Err(_) => invalid_argument_err!("component ID {} does not fit 16 bits", raw),
    }
}

impl TnccsProtocol for PbTncProtocol {
    fn variant(&self) -> TnccsType {
        TnccsType::V2_0
    }

    fn batch_overhead(&self) -> usize {
        pb_tnc::BATCH_HEADER_SIZE
    }

    fn message_size(&self, message: &PendingMessage) -> usize {
        pb_tnc::PA_MSG_OVERHEAD + message.len()
    }

    fn check_message(&self, message: &PendingMessage) -> Result<()> {
        if message.vendor_id() > pb_tnc::MAX_VENDOR_ID {
            return invalid_argument_err!(
                "vendor ID 0x{:x} does not fit the 24 bit PA vendor field",
                message.vendor_id()
            );
        }
        self.component_ids(message).map(|_| ())
    }

    fn build_batch(&mut self, messages: &[PendingMessage]) -> Result<Bytes> {
        let length: usize = pb_tnc::BATCH_HEADER_SIZE
            + messages.iter().map(|m| self.message_size(m)).sum::<usize>();
        let length = match u32::try_from(length) {
            Ok(length) => length,
            Err(_) => return invalid_argument_err!("batch of {} bytes is too large", length),
        };

        let batch_type = BatchType::data_for(self.role);
        let header = BatchHeader {
            director_server: self.role.is_server(),
            batch_type,
            length,
        };

        let mut buf = BytesMut::with_capacity(length as usize);
        buf.put_slice(&header.to_bytes());
        for message in messages {
            self.write_pa_message(&mut buf, message)?;
        }

        self.batches_sent += 1;
        log::debug!(
            "built PB-TNC {} batch #{} with {} messages ({} bytes)",
            batch_type,
            self.batches_sent,
            messages.len(),
            length
        );
        Ok(buf.freeze())
    }

    fn build_close(&mut self) -> Result<Bytes> {
        Ok(self.header_only(BatchType::Close))
    }

    fn process_batch(&mut self, data: &[u8]) -> Result<InboundBatch> {
        let header = BatchHeader::from_bytes(data)?;

        if header.director_server != self.role.peer().is_server() {
            return protocol_err!("PB-TNC director bit does not match the {}", self.role.peer());
        }
        if !header.batch_type.is_legal_from(self.role.peer()) {
            return protocol_err!("{} may not send a {} batch", self.role.peer(), header.batch_type);
        }
        if header.length as usize != data.len() {
            return format_err!(
                "PB-TNC batch length {} does not match the {} bytes received",
                header.length,
                data.len()
            );
        }

        let mut batch = InboundBatch {
            messages: Vec::new(),
            close: header.batch_type == BatchType::Close,
        };

        let mut offset = pb_tnc::BATCH_HEADER_SIZE;
        while offset < data.len() {
            let rest = &data[offset..];
            if rest.len() < pb_tnc::MSG_HEADER_SIZE {
                return format_err!("truncated PB-TNC message header at offset {}", offset);
            }

            let flags = rest[0];
            let vendor_id = BigEndian::read_u24(&rest[1..4]);
            let msg_type = BigEndian::read_u32(&rest[4..8]);
            let length = BigEndian::read_u32(&rest[8..12]) as usize;
            if length < pb_tnc::MSG_HEADER_SIZE || length > rest.len() {
                return format_err!("invalid PB-TNC message length {} at offset {}", length, offset);
            }

            let value = &rest[pb_tnc::MSG_HEADER_SIZE..length];
            if vendor_id == TNC_VENDORID_IETF && msg_type == pb_tnc::MSG_TYPE_PA {
                batch.messages.push(self.read_pa_message(value)?);
            } else if flags & pb_tnc::MSG_FLAG_NOSKIP != 0 {
                return protocol_err!(
                    "unsupported PB-TNC message type 0x{:06x}/{} marked NOSKIP",
                    vendor_id,
                    msg_type
                );
            } else {
                log::debug!("skipping PB-TNC message type 0x{:06x}/{}", vendor_id, msg_type);
            }

            offset += length;
        }

        self.batches_received += 1;
        log::debug!(
            "processed PB-TNC {} batch #{} with {} messages",
            header.batch_type,
            self.batches_received,
            batch.messages.len()
        );
        Ok(batch)
    }
}
