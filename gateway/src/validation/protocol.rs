//! Table of game client protocol numbers the gateway accepts

use std::collections::BTreeSet;
use std::num::ParseIntError;

/// Protocol numbers of the Java Edition releases from 1.7.2 through 1.21.4
pub const DEFAULT_PROTOCOLS: &[i32] = &[
    4, 5, // 1.7
    47, // 1.8
    107, 108, 109, 110, // 1.9
    210, // 1.10
    315, 316, // 1.11
    335, 338, 340, // 1.12
    393, 401, 404, // 1.13
    477, 480, 485, 490, 498, // 1.14
    573, 575, 578, // 1.15
    735, 736, 751, 753, 754, // 1.16
    755, 756, // 1.17
    757, 758, // 1.18
    759, 760, 761, 762, // 1.19
    763, 764, 765, 766, // 1.20
    767, 768, 769, // 1.21
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownProtocols(BTreeSet<i32>);

impl KnownProtocols {
    pub fn new(versions: impl IntoIterator<Item = i32>) -> Self {
        Self(versions.into_iter().collect())
    }

    /// Parse a comma separated list such as `"47, 107,210"`.
    pub fn parse_list(raw: &str) -> Result<Self, ParseIntError> {
        raw.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::parse::<i32>)
            .collect::<Result<BTreeSet<_>, _>>()
            .map(Self)
    }

    pub fn contains(&self, version: i32) -> bool {
        self.0.contains(&version)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for KnownProtocols {
    fn default() -> Self {
        Self::new(DEFAULT_PROTOCOLS.iter().copied())
    }
}
