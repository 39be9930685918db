/*!
In-memory secure transport.

`MemoryTransport::pair()` yields two connected endpoints exchanging whole
records through shared queues. Used to drive sessions without a real
carrier.
*/

use std::collections::VecDeque;
use std::io;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;

use crate::protocol::shared::traits::SecureTransport;

#[derive(Debug, Default)]
struct Link {
    records: VecDeque<Bytes>,
    closed: bool,
}

/// One end of an in-memory record link
#[derive(Debug)]
pub struct MemoryTransport {
    inbound: Arc<Mutex<Link>>,
    outbound: Arc<Mutex<Link>>,
    complete: bool,
}

impl MemoryTransport {
    /// Create two connected endpoints
    pub fn pair() -> (MemoryTransport, MemoryTransport) {
        let a_to_b = Arc::new(Mutex::new(Link::default()));
        let b_to_a = Arc::new(Mutex::new(Link::default()));

        let a = MemoryTransport {
            inbound: Arc::clone(&b_to_a),
            outbound: Arc::clone(&a_to_b),
            complete: false,
        };
        let b = MemoryTransport {
            inbound: a_to_b,
            outbound: b_to_a,
            complete: false,
        };
        (a, b)
    }

    /// Records written by the peer and not yet read
    pub fn pending_records(&self) -> usize {
        self.inbound.lock().records.len()
    }
}

impl SecureTransport for MemoryTransport {
    fn handshake(&mut self) -> io::Result<()> {
        if self.outbound.lock().closed {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "link closed"));
        }
        self.complete = true;
        Ok(())
    }

    fn read(&mut self) -> io::Result<Option<Bytes>> {
        if !self.complete {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "handshake not complete"));
        }
        let mut link = self.inbound.lock();
        match link.records.pop_front() {
            Some(record) => Ok(Some(record)),
            None if link.closed => Err(io::Error::new(
                io::ErrorKind::ConnectionAborted,
                "peer closed the link",
            )),
            None => Ok(None),
        }
    }

    fn write(&mut self, data: &[u8]) -> io::Result<()> {
        if !self.complete {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "handshake not complete"));
        }
        let mut link = self.outbound.lock();
        if link.closed {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "link closed"));
        }
        link.records.push_back(Bytes::copy_from_slice(data));
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        self.outbound.lock().closed = true;
        self.inbound.lock().closed = true;
        self.complete = false;
        Ok(())
    }

    fn is_complete(&self) -> bool {
        self.complete
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_cross_the_link() {
        let (mut a, mut b) = MemoryTransport::pair();
        a.handshake().unwrap();
        b.handshake().unwrap();

        a.write(b"one").unwrap();
        a.write(b"two").unwrap();
        assert_eq!(b.pending_records(), 2);
        assert_eq!(b.read().unwrap().unwrap(), &b"one"[..]);
        assert_eq!(b.read().unwrap().unwrap(), &b"two"[..]);
        assert!(b.read().unwrap().is_none());
    }

    #[test]
    fn test_requires_handshake() {
        let (mut a, _b) = MemoryTransport::pair();
        let err = a.write(b"early").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotConnected);
    }

    #[test]
    fn test_close_is_seen_by_peer() {
        let (mut a, mut b) = MemoryTransport::pair();
        a.handshake().unwrap();
        b.handshake().unwrap();

        a.write(b"last").unwrap();
        a.close().unwrap();

        // Data written before close is still delivered
        assert_eq!(b.read().unwrap().unwrap(), &b"last"[..]);
        assert_eq!(b.read().unwrap_err().kind(), io::ErrorKind::ConnectionAborted);
        assert_eq!(b.write(b"reply").unwrap_err().kind(), io::ErrorKind::BrokenPipe);
    }
}
