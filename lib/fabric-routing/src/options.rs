use ipnetwork::IpNetwork;
use serde::Deserialize;

/// Policy knobs of the route realizer
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RealizerOptions {
    /// Refuse every destination that is not IPv4
    pub ipv4_only: bool,
    /// Load-balancer targets outside this network are not installed locally
    pub preferred_network: Option<IpNetwork>,
}

impl Default for RealizerOptions {
    fn default() -> Self {
        Self {
            ipv4_only: true,
            preferred_network: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = RealizerOptions::default();
        assert!(options.ipv4_only);
        assert_eq!(options.preferred_network, None);
    }
}
