//! UDP magic packet listener.
//!
//! The listener owns one UDP socket for the lifetime of the process:
//!
//! ```text
//! Unbound --bind ok--> Listening --socket error--> Closed
//!    |                                               ^
//!    +-------------------bind error------------------+
//! ```
//!
//! `Closed` is terminal. Every well-formed magic packet is checked against the host's current
//! MAC addresses; on a match the display is woken and a script batch is
//! launched on its own task, so the next datagram is never held up.

mod notifier;

pub use notifier::{LogNotifier, Notifier};

use crate::display::DisplayWaker;
use crate::error::listener::ListenerError;
use crate::magic_packet::target_mac;
use crate::network::{MacSource, SystemMacSource};
use crate::scripts::ScriptEngine;

use std::io::ErrorKind;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use log::{debug, info, trace};
use tokio::net::UdpSocket;
use tokio::spawn as TokioSpawn;
use tokio::sync::Mutex;

const RECV_BUFFER_SIZE: usize = 2048;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    Unbound,
    Listening(SocketAddr),
    Closed,
}

#[derive(Debug, Default)]
pub struct ListenerStats {
    received: AtomicU64,
    matched: AtomicU64,
}

impl ListenerStats {
    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    pub fn matched(&self) -> u64 {
        self.matched.load(Ordering::Relaxed)
    }
}

/// Everything a datagram needs once it has arrived.
struct PacketHandler {
    engine: ScriptEngine,
    waker: DisplayWaker,
    macs: Arc<dyn MacSource>,
    stats: Arc<ListenerStats>,
}

impl PacketHandler {
    /// Returns whether the datagram was a magic packet for this host.
    fn handle(&self, payload: &[u8], from: SocketAddr) -> bool {
        self.stats.received.fetch_add(1, Ordering::Relaxed);

        // Interface enumeration is costly; only well-formed packets pay for it.
        let Some(target) = target_mac(payload) else {
            trace!("Ignored {} byte datagram from {from}", payload.len());
            return false;
        };

        if !self.macs.local_macs().contains(&target) {
            trace!("Ignored magic packet for {target} from {from}");
            return false;
        }

        self.stats.matched.fetch_add(1, Ordering::Relaxed);
        info!("Magic packet received from {from}");

        self.waker.wake();

        let engine = self.engine.clone();
        TokioSpawn(async move {
            let _ = engine.execute_startup_scripts().await;
        });

        true
    }
}

pub struct MagicPacketListener {
    bind_addr: SocketAddr,
    handler: Arc<PacketHandler>,
    notifier: Arc<dyn Notifier>,
    state: Arc<Mutex<ListenerState>>,
}

impl MagicPacketListener {
    /// Listener on `0.0.0.0:9` using the live interface table.
    pub fn new(engine: ScriptEngine, waker: DisplayWaker) -> Self {
        let bind_addr = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, crate::WOL_PORT));
        Self::with_parts(
            bind_addr,
            engine,
            waker,
            Arc::new(SystemMacSource),
            Arc::new(LogNotifier),
        )
    }

    pub fn with_parts(
        bind_addr: SocketAddr,
        engine: ScriptEngine,
        waker: DisplayWaker,
        macs: Arc<dyn MacSource>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            bind_addr,
            handler: Arc::new(PacketHandler {
                engine,
                waker,
                macs,
                stats: Arc::new(ListenerStats::default()),
            }),
            notifier,
            state: Arc::new(Mutex::new(ListenerState::Unbound)),
        }
    }

    pub fn with_bind_addr(mut self, bind_addr: SocketAddr) -> Self {
        self.bind_addr = bind_addr;
        self
    }

    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    pub async fn state(&self) -> ListenerState {
        *self.state.lock().await
    }

    pub fn stats(&self) -> Arc<ListenerStats> {
        Arc::clone(&self.handler.stats)
    }

    /// Bind the socket and start receiving.
    ///
    /// Calling again while listening is a no-op that returns the bound
    /// address. A bind failure closes the listener for good and is reported
    /// both to the notifier and to the caller.
    pub async fn start(&self) -> Result<SocketAddr, ListenerError> {
        // Held across the bind so concurrent starts cannot double-bind.
        let mut state = self.state.lock().await;

        match *state {
            ListenerState::Listening(addr) => {
                debug!("Listener already running on {addr}");
                return Ok(addr);
            }
            ListenerState::Closed => return Err(ListenerError::closed()),
            ListenerState::Unbound => {}
        }

        let socket = match UdpSocket::bind(self.bind_addr).await {
            Ok(socket) => socket,
            Err(e) => {
                *state = ListenerState::Closed;
                let err = ListenerError::bind(self.bind_addr, e);
                self.notifier.listener_unavailable(&err);
                return Err(err);
            }
        };

        let local_addr = match socket.local_addr() {
            Ok(addr) => addr,
            Err(e) => {
                *state = ListenerState::Closed;
                let err = ListenerError::bind(self.bind_addr, e);
                self.notifier.listener_unavailable(&err);
                return Err(err);
            }
        };

        *state = ListenerState::Listening(local_addr);
        info!("Listening for magic packets on UDP {local_addr}");

        TokioSpawn(receive_loop(
            socket,
            Arc::clone(&self.handler),
            Arc::clone(&self.notifier),
            Arc::clone(&self.state),
        ));

        Ok(local_addr)
    }
}

/// Errors a UDP socket reports for a single bad exchange rather than a dead socket.
fn is_transient(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::ConnectionReset | ErrorKind::Interrupted | ErrorKind::WouldBlock
    )
}

async fn receive_loop(
    socket: UdpSocket,
    handler: Arc<PacketHandler>,
    notifier: Arc<dyn Notifier>,
    state: Arc<Mutex<ListenerState>>,
) {
    let mut buf = [0u8; RECV_BUFFER_SIZE];

    loop {
        match socket.recv_from(&mut buf).await {
            Ok((len, from)) => {
                handler.handle(&buf[..len], from);
            }
            Err(e) if is_transient(e.kind()) => {
                debug!("Transient receive error ignored: {e}");
            }
            Err(e) => {
                let err = ListenerError::receive(e);
                *state.lock().await = ListenerState::Closed;
                notifier.listener_unavailable(&err);
                break;
            }
        }
    }

    info!("Magic packet listener closed");
}
