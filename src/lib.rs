/*!
# TNCCS

TNC Client/Server session layer: carries network-access-control health
attestation between a network access requestor (TNC Client, hosting IMCs)
and a policy decision point (TNC Server, hosting IMVs) over a secure
transport.

## Overview

- A [`TnccsSession`] owns one secure-transport endpoint and is itself a
  [`SecureTransport`]; writes build batches instead of passing bytes through
- IMC/IMV components queue messages through the session's [`BatchChannel`],
  concurrently if they like; batches preserve queue order
- Transport binding and peer authentication type are recorded on the session
  by the carrier layer
- Sessions come from an explicit [`TnccsRegistry`] of protocol variants, with
  automatic variant negotiation on the server
- TNCCS 2.0 (PB-TNC) framing is built in; other variants plug in through
  [`TnccsProtocol`]

## Example

```
use std::sync::Arc;
use tnccs::{
    ComponentId, MemoryTransport, MessageFlags, TnccsRegistry, TnccsSessionBuilder,
    TransportType,
};

let registry = Arc::new(TnccsRegistry::with_defaults());
let (client_end, server_end) = MemoryTransport::pair();

let mut client = TnccsSessionBuilder::new()
    .as_client()
    .with_transport_type(TransportType::Tls2_0)
    .build(&registry, client_end)?;
let mut server = TnccsSessionBuilder::new()
    .as_server()
    .with_transport_type(TransportType::Tls2_0)
    .negotiate()
    .build(&registry, server_end)?;

client.handshake()?;
server.handshake()?;

let payload = b"os version";
client.send_message(
    ComponentId::Specific(1),
    ComponentId::Any,
    MessageFlags::empty(),
    payload,
    payload.len() as u32,
    0x005597,
    1,
)?;
client.flush()?;

server.receive()?;
let received = server.take_received();
assert_eq!(received[0].payload(), &payload[..]);
# Ok::<(), tnccs::Error>(())
```
*/

// Core components
pub mod core;

// Protocol implementation
pub mod protocol;

// C bindings for IMC/IMV modules
#[cfg(feature = "ffi")]
pub mod ffi;

// Re-export commonly used types for convenience
pub use self::core::error::{Error, Result, TncResult};
pub use self::core::message::{
    BatchChannel, ComponentId, Message, MessageFlags, MessageType, PendingMessage, ReceivedMessage,
};
pub use self::core::session::{SessionState, TnccsSession};
pub use self::core::types::{Identity, Role, TnccsType, TransportType};
pub use self::core::config::TnccsConfig;
pub use self::core::constants::{
    AUTH_TYPE_UNSET, TNC_IMCID_ANY, TNC_IMVID_ANY, TNC_SUBTYPE_ANY, TNC_VENDORID_ANY,
    TNC_VENDORID_IETF, TNC_VENDORID_TCG, result_codes,
};

// Re-export protocol components
pub use self::protocol::{
    InboundBatch, MemoryTransport, PbTncProtocol, ProtocolConstructor, SecureTransport,
    TnccsProtocol, TnccsRegistry, TnccsSessionBuilder,
};
