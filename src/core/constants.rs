/*!
Constants for the TNCCS session layer.

Identifier wildcards and result codes follow the TNC IF-IMC/IF-IMV C API,
batch framing sizes follow PB-TNC.
*/

/// Wildcard IMC ID
pub const TNC_IMCID_ANY: u32 = 0xffff;

/// Wildcard IMV ID
pub const TNC_IMVID_ANY: u32 = 0xffff;

/// Wildcard vendor ID
pub const TNC_VENDORID_ANY: u32 = 0x00ff_ffff;

/// Wildcard message subtype
pub const TNC_SUBTYPE_ANY: u32 = 0xff;

/// IETF private enterprise number
pub const TNC_VENDORID_IETF: u32 = 0x0000_0000;

/// Trusted Computing Group private enterprise number
pub const TNC_VENDORID_TCG: u32 = 0x0000_5597;

/// Authentication type reported before the transport authenticated the peer
pub const AUTH_TYPE_UNSET: u32 = 0;

/// Default configuration values
pub mod defaults {
    /// Largest batch the session will build or accept
    pub const MAX_BATCH_SIZE: u32 = 128_000;

    /// Largest single payload accepted from an IMC/IMV
    pub const MAX_MESSAGE_SIZE: u32 = 64_000;

    /// Messages that may wait for the next batch
    pub const MAX_PENDING_MESSAGES: usize = 1024;
}

/// TNC result codes
pub mod result_codes {
    pub const SUCCESS: u32 = 0;
    pub const NOT_INITIALIZED: u32 = 1;
    pub const ALREADY_INITIALIZED: u32 = 2;
    pub const NO_COMMON_VERSION: u32 = 3;
    pub const CANT_RETRY: u32 = 4;
    pub const WONT_RETRY: u32 = 5;
    pub const INVALID_PARAMETER: u32 = 6;
    pub const CANT_RESPOND: u32 = 7;
    pub const ILLEGAL_OPERATION: u32 = 8;
    pub const OTHER: u32 = 9;
    pub const FATAL: u32 = 10;
}

/// PB-TNC framing constants
pub mod pb_tnc {
    /// PB-TNC protocol version carried in every batch header
    pub const VERSION: u8 = 0x02;

    /// Size of the batch header in bytes
    pub const BATCH_HEADER_SIZE: usize = 8;

    /// Size of a PB-TNC message header in bytes
    pub const MSG_HEADER_SIZE: usize = 12;

    /// Size of the PB-PA sub-header in bytes
    pub const PA_HEADER_SIZE: usize = 12;

    /// Director bit, set on batches sent by the server
    pub const DIRECTOR_SERVER: u8 = 0x80;

    /// Message must not be skipped by a receiver that does not understand it
    pub const MSG_FLAG_NOSKIP: u8 = 0x80;

    /// PB-PA message type under the IETF vendor ID
    pub const MSG_TYPE_PA: u32 = 1;

    /// Largest value a 24 bit vendor field can carry
    pub const MAX_VENDOR_ID: u32 = 0x00ff_ffff;

    /// Encoded overhead of one PA message on top of its payload
    pub const PA_MSG_OVERHEAD: usize = MSG_HEADER_SIZE + PA_HEADER_SIZE;
}
