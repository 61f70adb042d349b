use serde::{Deserialize, Serialize};

use crate::discovery::TransportCandidate;

/// Ordered identity preferences for disambiguating multiple injected
/// transports. Extending support to a new wallet brand is a data change
/// (one more entry), not a structural one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionPolicy {
    /// Checked in order; the first policy entry matching any candidate
    /// identity wins. Typically seeded from the user's previously-known
    /// wallet choice.
    #[serde(default)]
    pub preferred_identities: Vec<String>,
}

impl SelectionPolicy {
    pub fn preferring(identities: &[&str]) -> Self {
        Self {
            preferred_identities: identities.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Resolve the "pick one" ambiguity: first preference match wins,
    /// otherwise the deterministic last resort is the first candidate in
    /// injection order.
    pub fn select<'a>(
        &self,
        candidates: &'a [TransportCandidate],
    ) -> Option<&'a TransportCandidate> {
        for preferred in &self.preferred_identities {
            if let Some(candidate) = candidates.iter().find(|c| {
                c.identities
                    .iter()
                    .any(|identity| identity.eq_ignore_ascii_case(preferred))
            }) {
                return Some(candidate);
            }
        }
        candidates.first()
    }
}
