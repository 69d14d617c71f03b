//! Like handlers: record a reaction and look up which entries the caller liked.

use actix_web::{HttpResponse, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::Reaction;
use crate::domain::{EntryId, EntryIndex, Error, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthenticatedUser;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{map_journal_validation, map_user_validation, require};

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct LikedRequest {
    /// Entry ids to check.
    pub entries: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct LikedResponse {
    pub liked: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReactRequest {
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    pub creator_id: Option<String>,
    #[schema(example = "6a3f0d1e-1d2b-4cde-9c6b-0d0b7c6f6f01")]
    pub entry_id: Option<String>,
    #[schema(example = 0)]
    pub index: Option<i64>,
}

impl ReactRequest {
    fn into_reaction(self, liked_by: UserId) -> Result<Reaction, Error> {
        let creator_id = UserId::new(require(self.creator_id, "creatorId")?)
            .map_err(|err| map_user_validation("creatorId", &err))?;
        let entry_id = EntryId::new(require(self.entry_id, "entryId")?)
            .map_err(|err| map_journal_validation("entryId", &err))?;
        let index = EntryIndex::try_from(require(self.index, "index")?)
            .map_err(|err| map_journal_validation("index", &err))?;
        Ok(Reaction {
            creator_id,
            entry_id,
            index,
            liked_by,
        })
    }
}

/// Which of the given entries the caller has liked.
#[utoipa::path(
    post,
    path = "/journal/reactions",
    request_body = LikedRequest,
    responses(
        (status = 200, description = "Liked subset", body = LikedResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Reactions could not be read", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["reactions"],
    operation_id = "likedEntries"
)]
#[post("/journal/reactions")]
pub async fn liked_entries(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    payload: web::Json<LikedRequest>,
) -> ApiResult<web::Json<LikedResponse>> {
    let ids = require(payload.into_inner().entries, "entries")?;
    let liked = state.reactions.liked(user.user_id(), ids).await?;
    Ok(web::Json(LikedResponse { liked }))
}

/// Like one line of a shared entry.
#[utoipa::path(
    post,
    path = "/journal/reactions/react",
    request_body = ReactRequest,
    responses(
        (status = 200, description = "Reaction recorded"),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["reactions"],
    operation_id = "react"
)]
#[post("/journal/reactions/react")]
pub async fn react(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    payload: web::Json<ReactRequest>,
) -> ApiResult<HttpResponse> {
    let reaction = payload.into_inner().into_reaction(user.into_inner())?;
    state.reactions.react(reaction).await?;
    Ok(HttpResponse::Ok().finish())
}
