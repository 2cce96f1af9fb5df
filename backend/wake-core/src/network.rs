//! Local network interface inspection.
//!
//! Produces the set of hardware addresses a Wake-on-LAN packet may target to
//! reach this host. Addresses are normalized to 12 lowercase hex digits so
//! they compare directly against the target field of a magic packet.

use std::collections::HashSet;
use std::net::IpAddr;

use log::{debug, trace, warn};
use sysinfo::Networks;

pub const MAC_HEX_LEN: usize = 12;
const ZERO_MAC: &str = "000000000000";

/// Source of the host's current MAC addresses.
///
/// The listener consults this once per well-formed magic packet so interface
/// changes are picked up without a restart.
pub trait MacSource: Send + Sync {
    fn local_macs(&self) -> HashSet<String>;
}

/// Reads the live interface table through `sysinfo`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemMacSource;

impl MacSource for SystemMacSource {
    fn local_macs(&self) -> HashSet<String> {
        list_local_mac_addresses()
    }
}

impl MacSource for HashSet<String> {
    fn local_macs(&self) -> HashSet<String> {
        self.clone()
    }
}

/// Render six raw bytes as 12 lowercase hex digits.
pub fn format_mac(bytes: &[u8; 6]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Normalize a textual MAC address (`AA:BB:CC:DD:EE:FF`, `aa-bb-..`,
/// `aabb.ccdd.eeff`, ...) to 12 lowercase hex digits.
///
/// Returns `None` for anything that is not exactly six bytes of hex, and for
/// the all-zero address.
pub fn normalize_mac(raw: &str) -> Option<String> {
    let digits: String = raw
        .chars()
        .filter(|c| !matches!(c, ':' | '-' | '.'))
        .map(|c| c.to_ascii_lowercase())
        .collect();

    if digits.len() != MAC_HEX_LEN || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    if digits == ZERO_MAC {
        return None;
    }

    Some(digits)
}

/// An interface qualifies when it carries at least one IPv4 address that is
/// not loopback.
pub(crate) fn has_external_ipv4<'a>(addrs: impl IntoIterator<Item = &'a IpAddr>) -> bool {
    addrs
        .into_iter()
        .any(|addr| matches!(addr, IpAddr::V4(v4) if !v4.is_loopback()))
}

/// Enumerate the host's non-loopback IPv4 interfaces and collect their MACs.
///
/// Never fails: an empty interface table yields an empty set, which the
/// validator treats as "nothing addresses this host".
pub fn list_local_mac_addresses() -> HashSet<String> {
    let networks = Networks::new_with_refreshed_list();
    let mut macs = HashSet::new();

    for (name, data) in &networks {
        let addrs: Vec<IpAddr> = data.ip_networks().iter().map(|n| n.addr).collect();

        if !has_external_ipv4(&addrs) {
            trace!("Skipping interface {name}: no external IPv4 address");
            continue;
        }

        match normalize_mac(&format_mac(&data.mac_address().0)) {
            Some(mac) => {
                trace!("Interface {name} has MAC {mac}");
                macs.insert(mac);
            }
            None => trace!("Skipping interface {name}: no usable hardware address"),
        }
    }

    if macs.is_empty() {
        warn!("No usable network interfaces found while listing local MAC addresses");
    } else {
        debug!("Local MAC addresses: {macs:?}");
    }

    macs
}
