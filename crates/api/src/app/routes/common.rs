use axum::http::StatusCode;
use axum::response::Response;

use taxibe_auth::Permission;
use taxibe_core::RecordId;

use crate::app::errors;
use crate::context::{CooperativeContext, PrincipalContext};

/// Permission guard run first in every protected handler.
pub fn require(
    cooperative: &CooperativeContext,
    principal: &PrincipalContext,
    permission: &'static str,
) -> Result<(), Response> {
    crate::authz::authorize_request(cooperative, principal, &Permission::new(permission))
        .map_err(|e| errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string()))
}

pub fn parse_id(raw: &str) -> Result<RecordId, Response> {
    raw.parse::<RecordId>().map_err(errors::domain_error_to_response)
}
