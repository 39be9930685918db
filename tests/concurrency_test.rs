// tests/concurrency_test.rs
use std::sync::Arc;
use std::thread;

use tnccs::{
    ComponentId, Error, MemoryTransport, MessageFlags, Result, TnccsRegistry, TnccsSessionBuilder,
    TransportType,
};

const THREADS: u32 = 8;
const PER_THREAD: u32 = 50;

#[test]
fn test_concurrent_senders_keep_per_sender_order() -> Result<()> {
    let registry = Arc::new(TnccsRegistry::with_defaults());
    let (client_end, server_end) = MemoryTransport::pair();
    let mut client = TnccsSessionBuilder::new()
        .with_transport_type(TransportType::Tls2_0)
        .build(&registry, client_end)?;
    let mut server = TnccsSessionBuilder::new()
        .as_server()
        .with_transport_type(TransportType::Tls2_0)
        .build(&registry, server_end)?;
    client.handshake()?;
    server.handshake()?;

    let handles: Vec<_> = (0..THREADS)
        .map(|imc| {
            let channel = client.channel();
            thread::spawn(move || -> Result<()> {
                for seq in 0..PER_THREAD {
                    let payload = format!("{}:{}", imc, seq);
                    channel.send_message(
                        ComponentId::Specific(imc),
                        ComponentId::Any,
                        MessageFlags::empty(),
                        payload.as_bytes(),
                        payload.len() as u32,
                        0x005597,
                        1,
                    )?;
                }
                Ok(())
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("sender thread panicked")?;
    }

    while client.pending_len() > 0 {
        client.flush()?;
    }
    let mut received = Vec::new();
    while server.receive()?.is_some() {
        received.extend(server.take_received());
    }
    assert_eq!(received.len(), (THREADS * PER_THREAD) as usize);

    // Every message arrives whole and each IMC's messages stay in order
    let mut next = vec![0u32; THREADS as usize];
    for message in &received {
        let text = std::str::from_utf8(message.payload()).expect("payload is utf-8");
        let (imc, seq) = text.split_once(':').expect("payload has a separator");
        let imc: u32 = imc.parse().expect("imc id");
        let seq: u32 = seq.parse().expect("sequence number");

        assert_eq!(message.source(), ComponentId::Specific(imc));
        assert_eq!(seq, next[imc as usize]);
        next[imc as usize] += 1;
    }
    Ok(())
}

#[test]
fn test_close_races_with_senders() -> Result<()> {
    let registry = Arc::new(TnccsRegistry::with_defaults());
    let (client_end, _server_end) = MemoryTransport::pair();
    let mut client = TnccsSessionBuilder::new().build(&registry, client_end)?;
    client.handshake()?;

    let channel = client.channel();
    let sender = thread::spawn(move || {
        let mut accepted = 0u32;
        loop {
            match channel.send_message(
                ComponentId::Specific(1),
                ComponentId::Any,
                MessageFlags::empty(),
                b"x",
                1,
                0,
                1,
            ) {
                Ok(()) => accepted += 1,
                Err(Error::SessionTerminated) => return Ok(accepted),
                // Queue full, keep trying until the close lands
                Err(Error::InvalidArgument(_)) => thread::yield_now(),
                Err(err) => return Err(err),
            }
        }
    });

    thread::yield_now();
    client.close()?;
    sender.join().expect("sender thread panicked")?;

    // Nothing sneaks in after close
    assert_eq!(client.pending_len(), 0);
    Ok(())
}
