use wake_core::error::CoreError;
use wake_core::error::listener::ListenerError;

use std::error::Error as StdError;
use std::io::{Error as IoError, ErrorKind};
use std::net::SocketAddr;

/// **VALUE**: Verifies bind errors carry the address, the cause and where they were raised.
///
/// **WHY THIS MATTERS**: The log line is all a user has when wake detection is disabled.
///
/// **BUG THIS CATCHES**: Would catch a missing source chain or a location pointing inside the
/// error constructor instead of at the caller.
#[test]
fn given_bind_failure_when_displayed_then_includes_address_and_caller_location() {
    // GIVEN: An address-in-use failure
    let addr: SocketAddr = "0.0.0.0:9".parse().unwrap();
    let io = IoError::new(ErrorKind::AddrInUse, "address in use");

    // WHEN: Wrapping it
    let err = ListenerError::bind(addr, io);
    let shown = err.to_string();

    // THEN: Display names the address and points at this file
    assert!(shown.starts_with("Bind Error: 0.0.0.0:9"));
    assert!(shown.contains("address in use"));
    assert!(shown.contains("integration_tests"));
    assert!(err.is_address_in_use());

    let source = err.source().expect("Bind error should expose its io source");
    assert_eq!(source.to_string(), "address in use");
}

/// **VALUE**: Verifies only bind failures count as "port in use".
///
/// **BUG THIS CATCHES**: Would catch the user-facing "port taken" message firing for an
/// unrelated receive failure.
#[test]
fn given_receive_or_closed_error_when_checked_then_not_address_in_use() {
    let receive = ListenerError::receive(IoError::new(ErrorKind::AddrInUse, "odd"));
    let closed = ListenerError::closed();

    assert!(!receive.is_address_in_use());
    assert!(!closed.is_address_in_use());
    assert!(closed.source().is_none());
    assert!(closed.to_string().starts_with("Listener Closed Error:"));
}

/// **VALUE**: Verifies the crate-level error is transparent over the listener error.
///
/// **BUG THIS CATCHES**: Would catch an extra prefix being stacked onto every message.
#[test]
fn given_listener_error_when_converted_to_core_error_then_display_unchanged() {
    let err = ListenerError::closed();
    let expected = err.to_string();

    let core: CoreError = err.into();

    assert_eq!(core.to_string(), expected);
}
