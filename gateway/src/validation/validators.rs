//! Field validators for request gating
//!
//! Every validator is a pure predicate over the raw string pulled from the
//! request. Empty input is decided by `allow_empty` alone, so the individual
//! rules only ever look at non-empty values.

use std::net::Ipv4Addr;

use lazy_static::lazy_static;
use regex::Regex;

use super::protocol::KnownProtocols;

lazy_static! {
    /// In-game name: 3 to 16 ASCII letters, digits or underscores
    static ref IGN_REGEX: Regex = Regex::new(r"^[a-zA-Z0-9_]{3,16}$").unwrap();

    /// Canonical UUID with version nibble 4 and RFC 4122 variant
    static ref UUID_V4_REGEX: Regex = Regex::new(
        r"^[a-fA-F0-9]{8}-[a-fA-F0-9]{4}-4[a-fA-F0-9]{3}-[89abAB][a-fA-F0-9]{3}-[a-fA-F0-9]{12}$"
    ).unwrap();
}

/// Syntactic rule applied to one request field
#[derive(Debug, Clone, Copy)]
pub enum Validator<'a> {
    Ipv4Unicast,
    InGameName,
    ProtocolVersion(&'a KnownProtocols),
    PositiveInteger,
    UuidV4,
}

impl Validator<'_> {
    /// Returns `true` when `raw` is acceptable. Never panics.
    pub fn validate(&self, raw: &str, allow_empty: bool) -> bool {
        if raw.is_empty() {
            return allow_empty;
        }

        match self {
            Validator::Ipv4Unicast => is_ipv4_unicast(raw),
            Validator::InGameName => is_in_game_name(raw),
            Validator::ProtocolVersion(known) => is_known_protocol(raw, known),
            Validator::PositiveInteger => is_positive_integer(raw),
            Validator::UuidV4 => is_uuid_v4(raw),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Validator::Ipv4Unicast => "ipv4_unicast",
            Validator::InGameName => "in_game_name",
            Validator::ProtocolVersion(_) => "protocol_version",
            Validator::PositiveInteger => "positive_integer",
            Validator::UuidV4 => "uuid_v4",
        }
    }
}

/// Routable-looking IPv4 unicast address in `1.0.0.0..=223.255.255.255`
pub fn is_ipv4_unicast(raw: &str) -> bool {
    let Ok(ip) = raw.parse::<Ipv4Addr>() else {
        return false;
    };

    let first = ip.octets()[0];
    if first == 0 || first >= 224 {
        return false;
    }

    !(ip.is_unspecified() || ip.is_multicast() || ip.is_link_local())
}

pub fn is_in_game_name(raw: &str) -> bool {
    IGN_REGEX.is_match(raw)
}

pub fn is_known_protocol(raw: &str, known: &KnownProtocols) -> bool {
    raw.parse::<i32>()
        .map(|version| known.contains(version))
        .unwrap_or(false)
}

pub fn is_positive_integer(raw: &str) -> bool {
    raw.parse::<i64>().map(|n| n > 0).unwrap_or(false)
}

pub fn is_uuid_v4(raw: &str) -> bool {
    UUID_V4_REGEX.is_match(raw)
}
