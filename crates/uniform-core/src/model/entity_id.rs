// ── Core identity types ──
//
// MacAddress is the identity every managed object is discovered by;
// ImportId is the opaque string a host hands to `import`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

// ── MacAddress ──────────────────────────────────────────────────────

/// MAC address, normalized to lowercase colon-separated format (aa:bb:cc:dd:ee:ff).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddress(String);

impl MacAddress {
    /// Parse and normalize a MAC from any common format.
    /// Accepts colon-separated, dash-separated, or bare hex.
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, CoreError> {
        let raw = raw.as_ref();
        let hex: String = raw
            .chars()
            .filter(|c| !matches!(c, ':' | '-' | '.'))
            .collect::<String>()
            .to_lowercase();

        if hex.len() != 12 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(CoreError::ValidationFailed {
                field: "mac".into(),
                message: format!("'{raw}' is not a MAC address"),
            });
        }

        let octets: Vec<&str> = (0..6).filter_map(|i| hex.get(i * 2..i * 2 + 2)).collect();
        Ok(Self(octets.join(":")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MacAddress {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for MacAddress {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl From<MacAddress> for String {
    fn from(mac: MacAddress) -> Self {
        mac.0
    }
}

// ── ImportId ────────────────────────────────────────────────────────

/// What an import identifier points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportTarget {
    Id(String),
    Mac(MacAddress),
}

/// Parsed import identifier: `site:id`, `id`, `site:mac`, or `mac`.
///
/// A MAC contains colons itself, so the site prefix is recognised by
/// checking whether the whole string is a MAC before splitting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportId {
    pub site: Option<String>,
    pub target: ImportTarget,
}

impl ImportId {
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let raw = raw.trim();
        let invalid = |reason: &str| CoreError::InvalidImportId {
            id: raw.to_owned(),
            reason: reason.to_owned(),
        };

        if raw.is_empty() {
            return Err(invalid("empty identifier"));
        }

        if let Some(mac) = as_mac(raw) {
            return Ok(Self {
                site: None,
                target: ImportTarget::Mac(mac),
            });
        }

        let (site, rest) = match raw.split_once(':') {
            Some((site, rest)) => (Some(site), rest),
            None => (None, raw),
        };

        if let Some(site) = site {
            if site.is_empty() {
                return Err(invalid("site prefix is empty"));
            }
        }
        if rest.is_empty() {
            return Err(invalid("missing id or MAC after site prefix"));
        }

        let target = if let Some(mac) = as_mac(rest) {
            ImportTarget::Mac(mac)
        } else if rest.contains([':', '-']) {
            return Err(invalid("expected `site:id` or `site:mac`"));
        } else {
            ImportTarget::Id(rest.to_owned())
        };

        Ok(Self {
            site: site.map(str::to_owned),
            target,
        })
    }
}

/// A MAC in any accepted spelling: separated, or exactly 12 bare hex digits.
fn as_mac(s: &str) -> Option<MacAddress> {
    let mac = MacAddress::parse(s).ok()?;
    (s.contains([':', '-']) || s.len() == 12).then_some(mac)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn mac_address_normalizes_dashes() {
        let mac = MacAddress::parse("AA-BB-CC-DD-EE-FF").unwrap();
        assert_eq!(mac.as_str(), "aa:bb:cc:dd:ee:ff");
    }

    #[test]
    fn mac_address_normalizes_bare_hex() {
        let mac: MacAddress = "AABBCCDDEEFF".parse().unwrap();
        assert_eq!(mac.to_string(), "aa:bb:cc:dd:ee:ff");
    }

    #[test]
    fn mac_address_rejects_garbage() {
        assert!(MacAddress::parse("not-a-mac").is_err());
        assert!(MacAddress::parse("aa:bb:cc:dd:ee").is_err());
    }

    #[test]
    fn mac_address_deserialize_validates() {
        assert!(serde_json::from_str::<MacAddress>("\"aa:bb:cc:dd:ee:zz\"").is_err());
        let mac: MacAddress = serde_json::from_str("\"AA:BB:CC:DD:EE:FF\"").unwrap();
        assert_eq!(mac.as_str(), "aa:bb:cc:dd:ee:ff");
    }

    #[test]
    fn import_id_bare_id() {
        let id = ImportId::parse("5f1e2d3c4b5a697887766554").unwrap();
        assert_eq!(id.site, None);
        assert_eq!(
            id.target,
            ImportTarget::Id("5f1e2d3c4b5a697887766554".into())
        );
    }

    #[test]
    fn import_id_site_and_id() {
        let id = ImportId::parse("branch:5f1e2d3c4b5a697887766554").unwrap();
        assert_eq!(id.site.as_deref(), Some("branch"));
        assert!(matches!(id.target, ImportTarget::Id(_)));
    }

    #[test]
    fn import_id_site_and_bare_hex_mac() {
        let id = ImportId::parse("branch:aabbccddeeff").unwrap();
        assert_eq!(id.site.as_deref(), Some("branch"));
        assert_eq!(
            id.target,
            ImportTarget::Mac(MacAddress::parse("aa:bb:cc:dd:ee:ff").unwrap())
        );
    }

    #[test]
    fn import_id_site_and_mac() {
        let id = ImportId::parse("branch:AA:BB:CC:DD:EE:FF").unwrap();
        assert_eq!(id.site.as_deref(), Some("branch"));
        assert_eq!(
            id.target,
            ImportTarget::Mac(MacAddress::parse("aa:bb:cc:dd:ee:ff").unwrap())
        );
    }

    #[test]
    fn import_id_bare_mac() {
        let id = ImportId::parse("aa:bb:cc:dd:ee:ff").unwrap();
        assert_eq!(id.site, None);
        assert!(matches!(id.target, ImportTarget::Mac(_)));
    }

    #[test]
    fn import_id_rejects_malformed() {
        assert!(ImportId::parse("").is_err());
        assert!(ImportId::parse(":abc").is_err());
        assert!(ImportId::parse("site:").is_err());
        assert!(ImportId::parse("site:aa:bb").is_err());
    }
}
