//! Field sets of the gateway endpoints
//!
//! Each operation names the fields it reads and which of them it needs. The
//! extractor of a field depends on the route and HTTP method the request came
//! in on, mirroring how clients of the gateway send their data.

use axum::http::Method;

use super::extractors::Extractor;
use super::pipeline::{FieldDescriptor, Presence};
use super::protocol::KnownProtocols;
use super::validators::Validator;

use Presence::{Optional, Required};

/// Route family sharing the `{uuid, name, version}` field set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerInfoRoute {
    Player,
    Session,
}

/// Per-field needs of a player-info operation
///
/// `id` only takes part when a session is recorded (POST on the session route).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerInfoRules {
    pub uuid: Presence,
    pub name: Presence,
    pub version: Presence,
    pub id: Presence,
}

/// Every gateway operation that reads request fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    LookupPlayer,
    CreatePlayer,
    UpdatePlayer,
    LookupSession,
    CreateSession,
    LookupIp,
    CreateIp,
    RecordLogin,
}

impl Operation {
    pub fn label(&self) -> &'static str {
        match self {
            Operation::LookupPlayer => "lookup_player",
            Operation::CreatePlayer => "create_player",
            Operation::UpdatePlayer => "update_player",
            Operation::LookupSession => "lookup_session",
            Operation::CreateSession => "create_session",
            Operation::LookupIp => "lookup_ip",
            Operation::CreateIp => "create_ip",
            Operation::RecordLogin => "record_login",
        }
    }

    /// Descriptors for a request that arrived with `method`.
    pub fn descriptors<'a>(
        &self,
        method: &Method,
        protocols: &'a KnownProtocols,
    ) -> Vec<FieldDescriptor<'a>> {
        let player = |route, rules| player_info_fields(route, method, rules, protocols);

        match self {
            Operation::LookupPlayer => player(PlayerInfoRoute::Player, LOOKUP_PLAYER),
            Operation::CreatePlayer => player(PlayerInfoRoute::Player, WRITE_PLAYER),
            Operation::UpdatePlayer => player(PlayerInfoRoute::Player, WRITE_PLAYER),
            Operation::LookupSession => player(PlayerInfoRoute::Session, LOOKUP_SESSION),
            Operation::CreateSession => player(PlayerInfoRoute::Session, CREATE_SESSION),
            Operation::LookupIp | Operation::CreateIp => ip_info_fields(method),
            Operation::RecordLogin => player_login_fields(),
        }
    }
}

pub const LOOKUP_PLAYER: PlayerInfoRules = PlayerInfoRules {
    uuid: Required,
    name: Optional,
    version: Optional,
    id: Optional,
};

pub const WRITE_PLAYER: PlayerInfoRules = PlayerInfoRules {
    uuid: Required,
    name: Required,
    version: Required,
    id: Optional,
};

pub const LOOKUP_SESSION: PlayerInfoRules = LOOKUP_PLAYER;

pub const CREATE_SESSION: PlayerInfoRules = PlayerInfoRules {
    uuid: Optional,
    name: Optional,
    version: Optional,
    id: Required,
};

/// `uuid, name, version` plus `id` for session POSTs.
pub fn player_info_fields<'a>(
    route: PlayerInfoRoute,
    method: &Method,
    rules: PlayerInfoRules,
    protocols: &'a KnownProtocols,
) -> Vec<FieldDescriptor<'a>> {
    let uuid_source = match route {
        PlayerInfoRoute::Player if method == Method::GET || method == Method::PATCH => {
            Extractor::QueryString
        }
        PlayerInfoRoute::Session if method == Method::GET => Extractor::QueryString,
        _ => Extractor::FormBody,
    };

    let mut fields = vec![
        FieldDescriptor::new("uuid", uuid_source, Validator::UuidV4).with_presence(rules.uuid),
        FieldDescriptor::new("name", Extractor::FormBody, Validator::InGameName)
            .with_presence(rules.name),
        FieldDescriptor::new(
            "version",
            Extractor::FormBody,
            Validator::ProtocolVersion(protocols),
        )
        .with_presence(rules.version),
    ];

    if route == PlayerInfoRoute::Session && method == Method::POST {
        fields.push(
            FieldDescriptor::new("id", Extractor::FormBody, Validator::PositiveInteger)
                .with_presence(rules.id),
        );
    }

    fields
}

pub fn ip_info_fields(method: &Method) -> Vec<FieldDescriptor<'static>> {
    vec![
        FieldDescriptor::new("ip", Extractor::for_method(method), Validator::Ipv4Unicast)
            .with_presence(Required),
    ]
}

pub fn player_login_fields() -> Vec<FieldDescriptor<'static>> {
    vec![
        FieldDescriptor::new("uuid", Extractor::FormBody, Validator::UuidV4).with_presence(Required),
        FieldDescriptor::new("ipid", Extractor::FormBody, Validator::PositiveInteger)
            .with_presence(Required),
    ]
}
