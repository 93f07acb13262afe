//! Byte transports behind serial stages.
//!
//! A transport is read by the poller thread and written by the dispatcher
//! thread, so it is shared as `Arc<Mutex<dyn Transport>>`. Reads must not
//! block: an empty vector means "nothing right now".

use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};

/// A bidirectional byte device.
#[cfg_attr(test, mockall::automock)]
pub trait Transport: Send {
    /// Return whatever is available without blocking.
    fn read(&mut self) -> io::Result<Vec<u8>>;

    /// Write all of `bytes`.
    fn write(&mut self, bytes: &[u8]) -> io::Result<()>;
}

/// A transport shared between the poller and the dispatcher.
pub type SharedTransport = Arc<Mutex<dyn Transport>>;

/// Wrap a transport for sharing.
pub fn shared<T: Transport + 'static>(transport: T) -> SharedTransport {
    Arc::new(Mutex::new(transport))
}

/// Lock a shared transport, recovering from a poisoned lock.
///
/// A panic in one stage must not take the device away from the others.
pub fn lock_transport(transport: &SharedTransport) -> MutexGuard<'_, dyn Transport + 'static> {
    match transport.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!("Transport lock poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

/// In-process transport: one end of a crossed pair of channels.
///
/// Reads drain everything the peer has written so far.
pub struct MemoryTransport {
    tx: Sender<Vec<u8>>,
    rx: Receiver<Vec<u8>>,
}

impl MemoryTransport {
    /// Two connected ends. Bytes written to one are read from the other.
    pub fn pair() -> (Self, Self) {
        let (a_tx, a_rx) = unbounded();
        let (b_tx, b_rx) = unbounded();
        (
            Self { tx: a_tx, rx: b_rx },
            Self { tx: b_tx, rx: a_rx },
        )
    }
}

impl Transport for MemoryTransport {
    fn read(&mut self) -> io::Result<Vec<u8>> {
        let mut out = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(chunk) => out.extend_from_slice(&chunk),
                Err(TryRecvError::Empty) => return Ok(out),
                Err(TryRecvError::Disconnected) if out.is_empty() => {
                    return Err(io::Error::new(
                        io::ErrorKind::BrokenPipe,
                        "memory transport peer closed",
                    ))
                }
                Err(TryRecvError::Disconnected) => return Ok(out),
            }
        }
    }

    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.tx.send(bytes.to_vec()).map_err(|_| {
            io::Error::new(io::ErrorKind::BrokenPipe, "memory transport peer closed")
        })
    }
}
