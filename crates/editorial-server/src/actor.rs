//! Actor resolution
//!
//! The upstream gateway authenticates the user and forwards their id in
//! `X-Actor-Id`. Roles always come from the roster, never from the request.

use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts};

use editorial_core::{Actor, UserId};

use crate::error::ApiError;
use crate::AppState;

pub const ACTOR_HEADER: &str = "x-actor-id";

/// The acting member, resolved from the roster
#[derive(Debug, Clone)]
pub struct CurrentActor(pub Actor);

impl FromRequestParts<Arc<AppState>> for CurrentActor {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(ACTOR_HEADER)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ApiError::unauthorized("missing X-Actor-Id header"))?;

        let member = state
            .directory
            .lookup(&UserId::from(id))
            .ok_or_else(|| ApiError::unauthorized(format!("unknown actor {}", id)))?;

        Ok(CurrentActor(member.actor()))
    }
}
