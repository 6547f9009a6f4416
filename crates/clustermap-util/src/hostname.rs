//! Workstation hostnames
//!
//! Every source names workstations slightly differently: the seat directory
//! stores fully qualified names, the exam directory stores short names (or
//! only an IP address), and the oracle returns whatever its own inventory
//! holds. `Hostname` is the normalized form all of them are reduced to, so
//! that the reconciliation engine can compare them with plain equality.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Values some upstream stores write instead of leaving a hostname empty
pub const HOSTNAME_SENTINELS: &[&str] = &["unknown", "null"];

/// Normalized workstation hostname (lower-case, fully qualified)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hostname(String);

impl Hostname {
    /// Normalize a raw hostname.
    ///
    /// Trims whitespace and a trailing root dot, lower-cases, and appends
    /// `domain` when the name is a bare short name. Returns `None` for blank
    /// names and for sentinel values such as `Unknown`.
    pub fn normalize(raw: &str, domain: Option<&str>) -> Option<Self> {
        let trimmed = raw.trim().trim_end_matches('.');
        if trimmed.is_empty() || is_hostname_sentinel(trimmed) {
            return None;
        }

        let name = trimmed.to_ascii_lowercase();
        match domain.map(|d| d.trim_matches('.')).filter(|d| !d.is_empty()) {
            Some(domain) if !name.contains('.') => Some(Self(format!(
                "{}.{}",
                name,
                domain.to_ascii_lowercase()
            ))),
            _ => Some(Self(name)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Hostname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Hostname {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Whether `raw` is one of the placeholder values used for "no hostname"
pub fn is_hostname_sentinel(raw: &str) -> bool {
    HOSTNAME_SENTINELS
        .iter()
        .any(|s| raw.trim().eq_ignore_ascii_case(s))
}

/// Derive a short workstation name from its IPv4 address.
///
/// Cluster addresses follow `10.1F.R.S`, where `F` is the building floor,
/// `R` the row and `S` the seat, and map to `fFrRsS`. The floor is the second
/// character of the second octet.
///
/// Returns `None` unless the address has exactly four decimal octets and the
/// second octet has at least two digits.
pub fn hostname_from_ip(ip: &str) -> Option<String> {
    let octets: Vec<&str> = ip.trim().split('.').collect();
    if octets.len() != 4 {
        return None;
    }

    let mut values = [0u8; 4];
    for (value, octet) in values.iter_mut().zip(&octets) {
        if octet.is_empty() || !octet.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        *value = octet.parse().ok()?;
    }

    let floor = octets[1].chars().nth(1)?;
    Some(format!("f{}r{}s{}", floor, values[2], values[3]))
}
