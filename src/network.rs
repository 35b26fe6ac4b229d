//! Network availability from NetworkManager over D-Bus.

use calsync_core::NetworkGate;
use tracing::warn;
use zbus::{Connection, Proxy};

const NM_DESTINATION: &str = "org.freedesktop.NetworkManager";
const NM_PATH: &str = "/org/freedesktop/NetworkManager";
const NM_INTERFACE: &str = "org.freedesktop.NetworkManager";

/// `NM_STATE_CONNECTED` before NetworkManager 0.9.
const NM_STATE_CONNECTED_LEGACY: u32 = 3;
const NM_STATE_CONNECTED_GLOBAL: u32 = 70;

pub struct NetworkManagerGate {
    connection: Option<Connection>,
}

impl NetworkManagerGate {
    /// Connect to the system bus. Without one, the network is always
    /// reported as available.
    pub async fn connect() -> Self {
        match Connection::system().await {
            Ok(connection) => NetworkManagerGate {
                connection: Some(connection),
            },
            Err(e) => {
                warn!(error = %e, "No D-Bus system bus. Assuming we have network");
                NetworkManagerGate { connection: None }
            }
        }
    }

    async fn state(connection: &Connection) -> zbus::Result<u32> {
        let proxy = Proxy::new(connection, NM_DESTINATION, NM_PATH, NM_INTERFACE).await?;
        proxy.call("state", &()).await
    }
}

impl NetworkGate for NetworkManagerGate {
    async fn is_available(&self) -> bool {
        let Some(connection) = &self.connection else {
            return true;
        };

        match Self::state(connection).await {
            Ok(state) => is_connected(state),
            Err(e) => {
                warn!(error = %e, "NetworkManager D-Bus error. Assuming we have network");
                true
            }
        }
    }
}

/// Accept both the old and the new "connected" state values.
fn is_connected(state: u32) -> bool {
    matches!(state, NM_STATE_CONNECTED_LEGACY | NM_STATE_CONNECTED_GLOBAL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connected_states() {
        assert!(is_connected(3));
        assert!(is_connected(70));
        // 20 = disconnected, 60 = connected to site only
        assert!(!is_connected(20));
        assert!(!is_connected(60));
    }
}
