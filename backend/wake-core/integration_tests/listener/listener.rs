use crate::helpers::{append_line, engine_for, read_lines, wait_until, write_script};

use wake_core::display::DisplayWaker;
use wake_core::error::listener::ListenerError;
use wake_core::listener::{ListenerState, MagicPacketListener, Notifier};
use wake_core::network::MacSource;
use wake_core::scripts::ScriptEngine;

use std::collections::HashSet;
use std::net::{Ipv4Addr, SocketAddr, UdpSocket as StdUdpSocket};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::net::UdpSocket;

// ============================================================================
// Public API tests for the magic packet listener
// Each test binds loopback on an ephemeral port
// ============================================================================

const LOCAL_MAC: [u8; 6] = [0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF];
const FOREIGN_MAC: [u8; 6] = [0x11, 0x22, 0x33, 0x44, 0x55, 0x66];

/// Notifier that remembers every error it was handed.
#[derive(Default)]
struct RecordingNotifier {
    seen: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    fn count(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

impl Notifier for RecordingNotifier {
    fn listener_unavailable(&self, error: &ListenerError) {
        self.seen.lock().unwrap().push(error.to_string());
    }
}

/// MAC source that counts how often the interface table is consulted.
#[derive(Default)]
struct CountingMacSource {
    calls: AtomicUsize,
}

impl MacSource for CountingMacSource {
    fn local_macs(&self) -> HashSet<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        HashSet::from([String::from("aabbccddeeff")])
    }
}

fn magic_packet(mac: [u8; 6]) -> Vec<u8> {
    let mut packet = vec![0xFF; 6];
    for _ in 0..16 {
        packet.extend_from_slice(&mac);
    }
    packet
}

fn loopback_any_port() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::LOCALHOST, 0))
}

fn listener_for(
    bind_addr: SocketAddr,
    engine: ScriptEngine,
    notifier: Arc<RecordingNotifier>,
) -> MagicPacketListener {
    let macs: HashSet<String> = HashSet::from([String::from("aabbccddeeff")]);
    MagicPacketListener::with_parts(
        bind_addr,
        engine,
        DisplayWaker::disabled(),
        Arc::new(macs),
        notifier,
    )
}

async fn send(to: SocketAddr, payload: &[u8]) {
    let sender = UdpSocket::bind(loopback_any_port())
        .await
        .expect("Failed to bind sender socket");
    sender
        .send_to(payload, to)
        .await
        .expect("Failed to send datagram");
}

fn idle_engine(dir: &Path) -> ScriptEngine {
    engine_for(dir, Duration::ZERO)
}

/// **VALUE**: Verifies only packets addressed to a local MAC trigger the wake path.
///
/// **WHY THIS MATTERS**: Magic packets are broadcast; every machine on the segment sees them.
/// Reacting to another host's packet would run the user's scripts at random.
///
/// **BUG THIS CATCHES**: Would catch the MAC comparison being skipped, or stats counting the wrong
/// thing.
#[tokio::test]
async fn given_listening_when_foreign_and_local_packets_arrive_then_only_local_matches() {
    // GIVEN: A listener on loopback with an empty scripts dir
    let scripts = tempfile::tempdir().unwrap();
    let notifier = Arc::new(RecordingNotifier::default());
    let listener = listener_for(
        loopback_any_port(),
        idle_engine(scripts.path()),
        notifier.clone(),
    );
    let addr = listener.start().await.expect("Failed to start listener");
    let stats = listener.stats();

    // WHEN: A foreign packet, then garbage, then one for us
    send(addr, &magic_packet(FOREIGN_MAC)).await;
    send(addr, b"hello").await;
    send(addr, &magic_packet(LOCAL_MAC)).await;

    // THEN: Three received, one matched
    let settled = wait_until(Duration::from_secs(5), || {
        stats.received() == 3 && stats.matched() == 1
    })
    .await;
    assert!(settled, "Listener did not receive all datagrams");
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(stats.matched(), 1);
    assert_eq!(listener.state().await, ListenerState::Listening(addr));
    assert_eq!(notifier.count(), 0);
}

/// **VALUE**: Full wake path: packet in, startup script out.
///
/// **WHY THIS MATTERS**: This is the whole point of the program.
///
/// **BUG THIS CATCHES**: Would catch the handler matching but never calling the script engine.
#[cfg(unix)]
#[tokio::test]
async fn given_startup_script_when_magic_packet_arrives_then_script_runs() {
    // GIVEN: One script that records its run
    let scripts = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let marker = work.path().join("woke.txt");
    write_script(scripts.path(), "wake.sh", &append_line(&marker, "woke"));

    let listener = listener_for(
        loopback_any_port(),
        engine_for(scripts.path(), Duration::from_secs(30)),
        Arc::new(RecordingNotifier::default()),
    );
    let addr = listener.start().await.expect("Failed to start listener");

    // WHEN: A matching packet arrives
    send(addr, &magic_packet(LOCAL_MAC)).await;

    // THEN: The script wrote its marker
    let ran = wait_until(Duration::from_secs(10), || !read_lines(&marker).is_empty()).await;
    assert!(ran, "Startup script did not run after magic packet");
    assert_eq!(read_lines(&marker), vec!["woke"]);
}

/// **VALUE**: Verifies a repeated start is harmless.
///
/// **WHY THIS MATTERS**: The app may call start from more than one place during startup.
///
/// **BUG THIS CATCHES**: Would catch a second bind attempt, which would fail with "address in use"
/// against our own socket and close the listener.
#[tokio::test]
async fn given_listening_when_started_again_then_same_address_returned() {
    let scripts = tempfile::tempdir().unwrap();
    let notifier = Arc::new(RecordingNotifier::default());
    let listener = listener_for(
        loopback_any_port(),
        idle_engine(scripts.path()),
        notifier.clone(),
    );

    let first = listener.start().await.expect("First start failed");
    let second = listener.start().await.expect("Second start failed");

    assert_eq!(first, second);
    assert_eq!(listener.state().await, ListenerState::Listening(first));
    assert_eq!(notifier.count(), 0);
}

/// **VALUE**: Verifies a taken port disables the listener and tells the user, without panicking.
///
/// **WHY THIS MATTERS**: Another WOL tool may already own port 9. The app must keep running with
/// wake detection disabled and say so once.
///
/// **BUG THIS CATCHES**: Would catch bind errors escaping as panics, silent failures, or the
/// listener retrying and reporting the same failure repeatedly.
#[tokio::test]
async fn given_port_taken_when_started_then_closed_and_notified_once() {
    // GIVEN: Another socket already holds the address
    let squatter = StdUdpSocket::bind(loopback_any_port()).unwrap();
    let taken = squatter.local_addr().unwrap();

    let scripts = tempfile::tempdir().unwrap();
    let notifier = Arc::new(RecordingNotifier::default());
    let listener = listener_for(taken, idle_engine(scripts.path()), notifier.clone());

    // WHEN: Starting
    let result = listener.start().await;

    // THEN: Bind error reported as address-in-use, listener closed, one notification
    let err = result.expect_err("Bind on a taken port should fail");
    assert!(err.is_address_in_use());
    assert!(matches!(err, ListenerError::Bind { address, .. } if address == taken));
    assert_eq!(listener.state().await, ListenerState::Closed);
    assert_eq!(notifier.count(), 1);

    // WHEN: Starting again after closure
    let again = listener.start().await;

    // THEN: Closed error, no second notification
    assert!(matches!(again, Err(ListenerError::Closed { .. })));
    assert_eq!(notifier.count(), 1);
}

/// **VALUE**: Verifies interface enumeration only happens for well-formed magic packets.
///
/// **WHY THIS MATTERS**: Enumerating interfaces is a system call heavy operation that runs on
/// the receive task. Port 9 sees plenty of unrelated traffic; each stray datagram must stay cheap.
///
/// **BUG THIS CATCHES**: Would catch the MAC lookup moving back ahead of the length and sync checks.
#[tokio::test]
async fn given_garbage_datagrams_when_received_then_interfaces_not_enumerated() {
    // GIVEN: A listener with a counting MAC source
    let scripts = tempfile::tempdir().unwrap();
    let macs = Arc::new(CountingMacSource::default());
    let listener = MagicPacketListener::with_parts(
        loopback_any_port(),
        idle_engine(scripts.path()),
        DisplayWaker::disabled(),
        macs.clone(),
        Arc::new(RecordingNotifier::default()),
    );
    let addr = listener.start().await.expect("Failed to start listener");
    let stats = listener.stats();

    // WHEN: Short garbage and a full-length packet without the sync stream arrive
    send(addr, b"hello").await;
    send(addr, &[0u8; 102]).await;
    let settled = wait_until(Duration::from_secs(5), || stats.received() == 2).await;
    assert!(settled, "Listener did not receive all datagrams");

    // THEN: The interface table was never consulted
    assert_eq!(macs.calls.load(Ordering::SeqCst), 0);

    // WHEN: A real magic packet arrives
    send(addr, &magic_packet(LOCAL_MAC)).await;
    let matched = wait_until(Duration::from_secs(5), || stats.matched() == 1).await;

    // THEN: Exactly one lookup for it
    assert!(matched, "Magic packet was not matched");
    assert_eq!(macs.calls.load(Ordering::SeqCst), 1);
}
