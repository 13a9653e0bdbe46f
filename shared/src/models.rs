use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ═══════════════════════════════════════════════════════════════════════════
// PLAYER STATS RESPONSE TYPES
// ═══════════════════════════════════════════════════════════════════════════

/// Player record returned by `GET /v1/gateway/player`
///
/// An unknown player is answered with the zero value: `uuid` is `null`,
/// `name` is empty and `version` is `0`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInfoResponse {
    pub uuid: Option<Uuid>,
    pub name: String,
    pub version: i32,
}

/// One row of `GET /v1/gateway/ip`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpInfoResponse {
    pub id: i64,
}

/// Login session returned by `GET /v1/gateway/session`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIdResponse {
    pub id: i64,
}
