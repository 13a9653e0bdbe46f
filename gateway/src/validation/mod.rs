//! Request field validation
//!
//! Every gateway endpoint gates its input through this module before any
//! stored procedure is called.
//!
//! # Overview
//!
//! 1. **Validators** - pure predicates over one raw field value
//! 2. **Extractors** - read a field from the query string or the form body
//! 3. **Pipeline** - run an ordered list of field descriptors, stopping at the
//!    first failure
//! 4. **Requests** - the descriptor lists of each gateway operation
//!
//! # Usage
//!
//! ```ignore
//! pub async fn get_player_info(
//!     State(state): State<AppState>,
//!     method: Method,
//!     fields: RequestFields,
//! ) -> ApiResult<Json<PlayerInfoResponse>> {
//!     let descriptors = Operation::LookupPlayer.descriptors(&method, &state.protocols);
//!     let values = validate_all(&descriptors, &fields, false)?;
//!     // values.value("uuid") is now a well-formed v4 UUID
//! }
//! ```
//!
//! A rejected request is answered with 400 and no detail about which field
//! failed.

pub mod extractors;
pub mod pipeline;
pub mod protocol;
pub mod requests;
pub mod validators;

pub use extractors::{Extractor, FieldSource, RequestFields};
pub use pipeline::{
    validate_all, validate_data, FieldDescriptor, Presence, Rejected, ValidatedFields,
    ValidationOutcome,
};
pub use protocol::KnownProtocols;
pub use requests::{Operation, PlayerInfoRoute, PlayerInfoRules};
pub use validators::Validator;
