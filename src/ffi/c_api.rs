/*!
C API for the TNCCS batch channel.

IMC/IMV modules written against the C IF-IMC/IF-IMV interface queue their
messages through `tnccs_send_message`. The host hands each module an opaque
handle obtained from [`channel_handle`] and releases it with
`tnccs_release_channel` once the module is done with the session.
*/

use std::{ffi::c_void, slice};

use crate::core::{
    constants::result_codes,
    error::Result,
    message::{BatchChannel, ComponentId, MessageFlags},
    session::TnccsSession,
    types::Role,
};
use crate::protocol::shared::traits::SecureTransport;

/// TNC result code
#[allow(non_camel_case_types)]
pub type TNC_Result = u32;

// Opaque channel handle for the C API
#[repr(C)]
pub struct TnccsChannelHandle(*mut c_void);

struct ChannelBinding {
    channel: BatchChannel,
    role: Role,
}

impl TnccsChannelHandle {
    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }
}

/// Create a C handle for the session's batch channel
///
/// The handle keeps the channel alive after the session is gone; sends then
/// fail with `TNC_RESULT_ILLEGAL_OPERATION`.
pub fn channel_handle<T: SecureTransport>(session: &TnccsSession<T>) -> TnccsChannelHandle {
    let binding = Box::new(ChannelBinding {
        channel: session.channel(),
        role: session.role(),
    });
    TnccsChannelHandle(Box::into_raw(binding) as *mut c_void)
}

// Helper function to convert Result to a TNC result code
fn to_result_code(result: Result<()>) -> TNC_Result {
    match result {
        Ok(()) => result_codes::SUCCESS,
        Err(err) => err.result_code(),
    }
}

/// Release a channel handle
///
/// # Safety
///
/// `handle` must come from [`channel_handle`] and must not be used again.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tnccs_release_channel(handle: TnccsChannelHandle) {
    if !handle.0.is_null() {
        unsafe {
            let _ = Box::from_raw(handle.0 as *mut ChannelBinding);
        }
    }
}

/// Add a message to the next TNCCS batch
///
/// On a TNC Client `imc_id` is the sender and `imv_id` the recipient, on a
/// TNC Server the other way round.
///
/// @return TNC_RESULT_SUCCESS, or the TNC result code of the failure
///
/// # Safety
///
/// `handle` must come from [`channel_handle`]. `msg` must be null or point to
/// at least `msg_len` readable bytes.
#[unsafe(no_mangle)]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn tnccs_send_message(
    handle: *const TnccsChannelHandle,
    imc_id: u32,
    imv_id: u32,
    msg_flags: u32,
    msg: *const u8,
    msg_len: u32,
    msg_vid: u32,
    msg_subtype: u32,
) -> TNC_Result {
    // Validate arguments
    if handle.is_null() {
        return result_codes::INVALID_PARAMETER;
    }
    let binding = unsafe {
        let handle = &*handle;
        if handle.0.is_null() {
            return result_codes::INVALID_PARAMETER;
        }
        &*(handle.0 as *const ChannelBinding)
    };

    let payload: &[u8] = if msg.is_null() {
        if msg_len != 0 {
            return result_codes::INVALID_PARAMETER;
        }
        &[]
    } else {
        unsafe { slice::from_raw_parts(msg, msg_len as usize) }
    };

    let imc = ComponentId::from_raw(imc_id);
    let imv = ComponentId::from_raw(imv_id);
    let (source, destination) = match binding.role {
        Role::Requestor => (imc, imv),
        Role::Responder => (imv, imc),
    };

    to_result_code(binding.channel.send_message(
        source,
        destination,
        MessageFlags::from_bits_retain(msg_flags),
        payload,
        msg_len,
        msg_vid,
        msg_subtype,
    ))
}

/// Number of messages waiting for the next batch, 0 for a null handle
///
/// # Safety
///
/// `handle` must be null or come from [`channel_handle`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tnccs_pending_messages(handle: *const TnccsChannelHandle) -> u32 {
    if handle.is_null() {
        return 0;
    }
    unsafe {
        let handle = &*handle;
        if handle.0.is_null() {
            return 0;
        }
        let binding = &*(handle.0 as *const ChannelBinding);
        binding.channel.len() as u32
    }
}
