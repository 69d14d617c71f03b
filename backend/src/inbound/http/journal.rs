//! Journal handlers: submit, read back, share and browse shared entries.

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use crate::domain::{Error, SocialPage, Submission, TodayEntries};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthenticatedUser;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::map_journal_validation;

/// Body for `POST /journal/entries`. Supplying `id` rewrites that submission.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct SubmitRequest {
    #[schema(example = "Morning coffee")]
    pub entry1: Option<String>,
    #[schema(example = "A friend called")]
    pub entry2: Option<String>,
    #[schema(example = "Sunshine")]
    pub entry3: Option<String>,
    pub id: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct SubmitResponse {
    #[schema(example = "6a3f0d1e-1d2b-4cde-9c6b-0d0b7c6f6f01")]
    pub id: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct SocialQuery {
    /// Cursor from the previous page.
    pub next_token: Option<String>,
}

/// Store today's three entries.
#[utoipa::path(
    post,
    path = "/journal/entries",
    request_body = SubmitRequest,
    responses(
        (status = 201, description = "Entries stored", body = SubmitResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["journal"],
    operation_id = "submitEntries"
)]
#[post("/journal/entries")]
pub async fn submit_entries(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    payload: web::Json<SubmitRequest>,
) -> ApiResult<HttpResponse> {
    let SubmitRequest {
        entry1,
        entry2,
        entry3,
        id,
    } = payload.into_inner();
    let submission = Submission::try_from_parts(id.as_deref(), [entry1, entry2, entry3])
        .map_err(|err| map_journal_validation("id", &err))?;
    let id = state.journal.submit(user.user_id(), submission).await?;
    Ok(HttpResponse::Created().json(SubmitResponse { id: id.to_string() }))
}

/// The caller's entries for today.
#[utoipa::path(
    get,
    path = "/journal/today",
    responses(
        (status = 200, description = "Today's entries", body = TodayEntries),
        (status = 400, description = "Token carries no user id", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["journal"],
    operation_id = "todaysEntries"
)]
#[get("/journal/today")]
pub async fn todays_entries(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
) -> ApiResult<web::Json<TodayEntries>> {
    let entries = state.journal_query.today(user.user_id()).await?;
    Ok(web::Json(entries))
}

/// Today's shared entries, one page at a time.
#[utoipa::path(
    get,
    path = "/journal/social",
    params(SocialQuery),
    responses(
        (status = 200, description = "Shared entries", body = SocialPage),
        (status = 400, description = "Unrecognised cursor", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["journal"],
    operation_id = "socialFeed",
    security([])
)]
#[get("/journal/social")]
pub async fn social_feed(
    state: web::Data<HttpState>,
    query: web::Query<SocialQuery>,
) -> ApiResult<web::Json<SocialPage>> {
    let page = state
        .journal_query
        .social_feed(query.into_inner().next_token)
        .await?;
    Ok(web::Json(page))
}

/// Send today's entries for review before they appear on the social feed.
#[utoipa::path(
    post,
    path = "/journal/entries/share",
    responses(
        (status = 200, description = "Entries queued for review"),
        (status = 400, description = "Token carries no user id", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["journal"],
    operation_id = "shareEntries"
)]
#[post("/journal/entries/share")]
pub async fn share_entries(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
) -> ApiResult<HttpResponse> {
    let outcome = state.journal.share_today(user.user_id()).await?;
    info!(
        user_id = %user.user_id(),
        queued = outcome.queued,
        failed = outcome.failed,
        "entries shared"
    );
    Ok(HttpResponse::Ok().finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::ShareOutcome;
    use crate::domain::{EntryId, SharedEntryView};
    use crate::inbound::http::test_utils::{BEARER, StateMocks, USER_ID, test_app};
    use actix_web::http::StatusCode;
    use actix_web::http::header::AUTHORIZATION;
    use actix_web::test;
    use rstest::rstest;
    use serde_json::{Value, json};

    async fn send(mocks: StateMocks, request: test::TestRequest) -> (StatusCode, Value) {
        let app = test::init_service(
            test_app(mocks)
                .service(submit_entries)
                .service(todays_entries)
                .service(social_feed)
                .service(share_entries),
        )
        .await;
        let response = test::call_service(&app, request.to_request()).await;
        let status = response.status();
        let bytes = test::read_body(response).await;
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn authed(request: test::TestRequest) -> test::TestRequest {
        request.insert_header((AUTHORIZATION, BEARER))
    }

    #[rstest]
    #[actix_web::test]
    async fn submit_returns_the_submission_id() {
        let mut mocks = StateMocks::authenticated();
        mocks
            .journal
            .expect_submit()
            .withf(|user, submission| {
                user.to_string() == USER_ID
                    && submission.id.is_none()
                    && submission.texts == ["a".to_owned(), "b".to_owned(), "c".to_owned()]
            })
            .returning(|_, _| Ok(EntryId::new("sub-1").expect("valid id")));
        let request = authed(test::TestRequest::post().uri("/journal/entries"))
            .set_json(json!({"entry1": "a", "entry2": "b", "entry3": "c"}));
        let (status, body) = send(mocks, request).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body, json!({"id": "sub-1"}));
    }

    #[rstest]
    #[case::missing_entry(json!({"entry1": "a", "entry2": "b"}))]
    #[case::bad_id(json!({"entry1": "a", "entry2": "b", "entry3": "c", "id": "x/y"}))]
    #[actix_web::test]
    async fn submit_rejects_incomplete_payloads(#[case] payload: Value) {
        let mut mocks = StateMocks::authenticated();
        mocks.journal.expect_submit().never();
        let request = authed(test::TestRequest::post().uri("/journal/entries")).set_json(payload);
        let (status, _) = send(mocks, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[rstest]
    #[actix_web::test]
    async fn today_returns_the_three_slots() {
        let mut mocks = StateMocks::authenticated();
        mocks.journal_query.expect_today().returning(|_| {
            Ok(TodayEntries {
                id: Some("sub-1".to_owned()),
                entry1: "a".to_owned(),
                entry2: "b".to_owned(),
                entry3: "c".to_owned(),
            })
        });
        let (status, body) = send(mocks, authed(test::TestRequest::get().uri("/journal/today"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"id": "sub-1", "entry1": "a", "entry2": "b", "entry3": "c"})
        );
    }

    #[rstest]
    #[actix_web::test]
    async fn social_feed_is_public_and_forwards_the_cursor() {
        let mut mocks = StateMocks::default();
        mocks
            .journal_query
            .expect_social_feed()
            .withf(|token| token.as_deref() == Some("abc"))
            .returning(|_| {
                Ok(SocialPage {
                    entries: vec![SharedEntryView {
                        entry: "sunshine".to_owned(),
                        user_id: USER_ID.to_owned(),
                        id: "sub-1".to_owned(),
                        index: 0,
                    }],
                    next_token: Some("def".to_owned()),
                })
            });
        let (status, body) = send(
            mocks,
            test::TestRequest::get().uri("/journal/social?nextToken=abc"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["nextToken"], "def");
        assert_eq!(body["entries"][0]["userId"], USER_ID);
        assert_eq!(body["entries"][0]["index"], 0);
    }

    #[rstest]
    #[actix_web::test]
    async fn share_succeeds_despite_partial_send_failures() {
        let mut mocks = StateMocks::authenticated();
        mocks
            .journal
            .expect_share_today()
            .times(1)
            .returning(|_| Ok(ShareOutcome { queued: 2, failed: 1 }));
        let (status, _) = send(
            mocks,
            authed(test::TestRequest::post().uri("/journal/entries/share")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[rstest]
    #[actix_web::test]
    async fn store_failures_are_redacted() {
        let mut mocks = StateMocks::authenticated();
        mocks
            .journal
            .expect_share_today()
            .returning(|_| Err(Error::internal("store request failed: timeout")));
        let (status, body) = send(
            mocks,
            authed(test::TestRequest::post().uri("/journal/entries/share")),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Internal server error");
    }
}
