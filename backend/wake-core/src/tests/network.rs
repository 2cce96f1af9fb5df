// Unit tests for local MAC inspection helpers

use crate::network::{MacSource, format_mac, has_external_ipv4, list_local_mac_addresses, normalize_mac};

use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// **VALUE**: Verifies normalization across the separator styles operating systems print.
///
/// **WHY THIS MATTERS**: Interface MACs and packet MACs must end up in one canonical form or
/// matching fails silently and the host never wakes.
///
/// **BUG THIS CATCHES**: Would catch a normalizer that keeps separators or uppercase digits.
#[test]
fn given_various_mac_formats_when_normalized_then_lowercase_hex() {
    let cases = [
        ("AA:BB:CC:DD:EE:FF", "aabbccddeeff"),
        ("aa-bb-cc-dd-ee-ff", "aabbccddeeff"),
        ("aabb.ccdd.eeff", "aabbccddeeff"),
        ("001122334455", "001122334455"),
    ];

    for (raw, expected) in cases {
        assert_eq!(normalize_mac(raw).as_deref(), Some(expected), "input: {raw}");
    }
}

/// **VALUE**: Verifies that the all-zero address and malformed strings are excluded.
///
/// **WHY THIS MATTERS**: Virtual and loopback interfaces report 00:00:00:00:00:00. Including it
/// would let any packet targeting the zero MAC trigger scripts.
///
/// **BUG THIS CATCHES**: Would catch removal of the zero-MAC filter or the length check.
#[test]
fn given_zero_or_malformed_mac_when_normalized_then_none() {
    for raw in ["00:00:00:00:00:00", "", "aa:bb:cc", "zz:bb:cc:dd:ee:ff", "aabbccddeeff00"] {
        assert_eq!(normalize_mac(raw), None, "input: {raw}");
    }
}

/// **VALUE**: Verifies the interface filter: IPv4 and not loopback.
///
/// **WHY THIS MATTERS**: Only externally reachable IPv4 interfaces can receive a broadcast
/// magic packet; their MACs are the only legitimate targets.
///
/// **BUG THIS CATCHES**: Would catch loopback or IPv6-only interfaces slipping into the set.
#[test]
fn given_interface_addresses_when_filtered_then_only_external_ipv4_qualifies() {
    let loopback = [IpAddr::V4(Ipv4Addr::LOCALHOST)];
    let v6_only = [IpAddr::V6(Ipv6Addr::new(0xfe80, 0, 0, 0, 0, 0, 0, 1))];
    let lan = [
        IpAddr::V6(Ipv6Addr::LOCALHOST),
        IpAddr::V4(Ipv4Addr::new(192, 168, 1, 20)),
    ];
    let none: [IpAddr; 0] = [];
    let link_local = [IpAddr::V4(Ipv4Addr::new(169, 254, 10, 20))];

    assert!(!has_external_ipv4(&loopback));
    assert!(!has_external_ipv4(&v6_only));
    assert!(!has_external_ipv4(&none));
    assert!(has_external_ipv4(&lan));
    // Link-local IPv4 is still reachable on the segment
    assert!(has_external_ipv4(&link_local));
}

#[test]
fn given_bytes_when_formatted_then_twelve_hex_digits() {
    assert_eq!(format_mac(&[0xDE, 0xAD, 0xBE, 0xEF, 0x00, 0x01]), "deadbeef0001");
}

/// **VALUE**: Verifies the live enumeration honours its own invariants on whatever host runs the tests.
///
/// **WHY THIS MATTERS**: The listener calls this on every datagram; it must not panic and must
/// only return normalized, non-zero addresses.
///
/// **BUG THIS CATCHES**: Would catch raw sysinfo strings or zero MACs leaking into the set.
#[test]
fn given_live_host_when_listing_macs_then_entries_are_normalized() {
    let macs = list_local_mac_addresses();

    for mac in &macs {
        assert_eq!(normalize_mac(mac).as_deref(), Some(mac.as_str()));
    }
}

#[test]
fn given_fixed_set_when_used_as_mac_source_then_returns_copy() {
    let set: HashSet<String> = ["aabbccddeeff".to_string()].into_iter().collect();

    assert_eq!(set.local_macs(), set);
}
