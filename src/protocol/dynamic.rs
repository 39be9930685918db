/*!
Automatic TNCCS variant detection.

A server created with [`TnccsType::Dynamic`] waits for the client's first
batch and pins whichever variant that batch is written in.
*/

use crate::core::constants::pb_tnc;
use crate::core::types::TnccsType;

/// Identify the variant an inbound batch is written in
///
/// PB-TNC batches start with their version byte; TNCCS 1.1 batches are XML
/// documents. Anything else, SOH included, cannot be told apart from noise
/// and yields [`TnccsType::Unknown`].
pub fn detect_variant(data: &[u8]) -> TnccsType {
    match data.first() {
        Some(&pb_tnc::VERSION) => TnccsType::V2_0,
        Some(b'<') => TnccsType::V1_1,
        _ => TnccsType::Unknown,
    }
}
