//! Wake-on-LAN magic packet validation.
//!
//! A magic packet is six `0xFF` bytes followed by the target MAC address
//! (conventionally repeated sixteen times). Only the sync stream and the first
//! MAC occurrence are inspected here; packets that satisfy those two checks are
//! accepted even if the remaining repetitions differ.

use crate::network::format_mac;

use std::collections::HashSet;

use log::trace;

/// Sync stream plus sixteen MAC repetitions.
pub const MAGIC_PACKET_MIN_LEN: usize = 102;
pub const SYNC_STREAM: [u8; 6] = [0xFF; 6];

const TARGET_MAC_START: usize = SYNC_STREAM.len();
const TARGET_MAC_END: usize = TARGET_MAC_START + 6;

/// Extract the declared target MAC of a well-formed magic packet.
///
/// Returns `None` when the payload is too short or the sync stream is wrong.
pub fn target_mac(payload: &[u8]) -> Option<String> {
    if payload.len() < MAGIC_PACKET_MIN_LEN {
        trace!(
            "Dropping datagram: {} bytes is below the magic packet minimum",
            payload.len()
        );
        return None;
    }

    if payload[..TARGET_MAC_START] != SYNC_STREAM {
        trace!("Dropping datagram: missing 0xFF sync stream");
        return None;
    }

    let mut mac = [0u8; 6];
    mac.copy_from_slice(&payload[TARGET_MAC_START..TARGET_MAC_END]);
    Some(format_mac(&mac))
}

/// Decide whether `payload` is a magic packet addressed to one of `local_macs`.
///
/// `local_macs` must hold normalized 12-digit lowercase addresses.
pub fn is_magic_packet_for_me(payload: &[u8], local_macs: &HashSet<String>) -> bool {
    let Some(target) = target_mac(payload) else {
        return false;
    };

    let for_me = local_macs.contains(&target);
    if !for_me {
        trace!("Ignoring magic packet for foreign MAC {target}");
    }
    for_me
}
