use std::sync::Arc;

use serde::{Deserialize, Serialize};

use walletflow_core::transport::WalletTransport;

/// Where the app is running. Determined by the embedding application's
/// feature detection and treated as a pure input here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HostEnvironment {
    /// Sandboxed mini-app host with its own constrained wallet API. No
    /// fallback to browser-extension transports is permitted.
    EmbeddedMiniapp,
    MobileBrowser,
    DesktopBrowser,
}

impl std::fmt::Display for HostEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            HostEnvironment::EmbeddedMiniapp => "embedded-miniapp",
            HostEnvironment::MobileBrowser => "mobile-browser",
            HostEnvironment::DesktopBrowser => "desktop-browser",
        };
        f.write_str(s)
    }
}

/// One injected transport as found in the page, with whatever identity
/// flags it declares about itself (several extensions injecting at once is
/// a real browser conflict condition).
#[derive(Clone)]
pub struct TransportCandidate {
    pub transport: Arc<dyn WalletTransport>,
    /// Self-declared identity labels, e.g. `"metamask"`, in the order the
    /// candidate declares them.
    pub identities: Vec<String>,
}

/// The session resolver's window onto the runtime: environment probing,
/// transport enumeration, and the connection-modal flow. Implemented by the
/// embedding application.
#[async_trait::async_trait]
pub trait TransportDiscovery: Send + Sync {
    fn host_environment(&self) -> HostEnvironment;

    /// The embedded host's injected wallet transport, if the host exposes
    /// one.
    async fn embedded_transport(&self) -> Option<Arc<dyn WalletTransport>>;

    /// All browser-extension transports currently injected, in injection
    /// order.
    fn injected_candidates(&self) -> Vec<TransportCandidate>;

    /// Open the wallet-connection modal. Fire-and-forget: the modal's own
    /// completion drives the application's connection-state observation,
    /// which re-enters the resolver.
    fn open_connection_modal(&self);
}
