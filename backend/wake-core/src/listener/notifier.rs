use crate::error::listener::ListenerError;

use log::error;

/// Receives user-facing notices from the listener.
///
/// The desktop shell plugs its tray notification in here; the default just
/// logs.
pub trait Notifier: Send + Sync {
    /// Passive wake detection is gone for the rest of the process lifetime.
    fn listener_unavailable(&self, error: &ListenerError);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn listener_unavailable(&self, error: &ListenerError) {
        if error.is_address_in_use() {
            error!(
                "Wake-on-LAN port is already in use by another program; wake detection is disabled: {error}"
            );
        } else {
            error!("Wake-on-LAN listener unavailable; wake detection is disabled: {error}");
        }
    }
}
