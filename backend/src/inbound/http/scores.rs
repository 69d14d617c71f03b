//! Aggregate reads: influence score and current streak.
//!
//! Both endpoints degrade to `200 0` when the aggregate cannot be read, so a
//! failing store never breaks the dashboard.

use actix_web::{HttpResponse, get, web};
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::ToSchema;

use crate::domain::Error;
use crate::inbound::http::auth::AuthenticatedUser;
use crate::inbound::http::state::HttpState;

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct StreakResponse {
    #[schema(example = 4)]
    pub streak: u32,
}

fn fallback(err: &Error, aggregate: &'static str) -> HttpResponse {
    warn!(aggregate, code = ?err.code(), message = err.message(), "aggregate read failed");
    HttpResponse::Ok().json(0)
}

/// Reactions received across the caller's shared entries.
#[utoipa::path(
    get,
    path = "/journal/reactions/influence",
    responses(
        (status = 200, description = "Influence score; 0 when unavailable", body = u64),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["reactions"],
    operation_id = "influence"
)]
#[get("/journal/reactions/influence")]
pub async fn influence(state: web::Data<HttpState>, user: AuthenticatedUser) -> HttpResponse {
    match state.scores.influence(user.user_id()).await {
        Ok(score) => HttpResponse::Ok().json(score),
        Err(err) => fallback(&err, "influence"),
    }
}

/// Consecutive days the caller has submitted entries.
#[utoipa::path(
    get,
    path = "/journal/streak",
    responses(
        (status = 200, description = "Current streak; bare 0 when unavailable", body = StreakResponse),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["journal"],
    operation_id = "streak"
)]
#[get("/journal/streak")]
pub async fn streak(state: web::Data<HttpState>, user: AuthenticatedUser) -> HttpResponse {
    match state.scores.streak(user.user_id()).await {
        Ok(streak) => HttpResponse::Ok().json(StreakResponse { streak }),
        Err(err) => fallback(&err, "streak"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inbound::http::test_utils::{BEARER, StateMocks, test_app};
    use actix_web::http::StatusCode;
    use actix_web::http::header::AUTHORIZATION;
    use actix_web::test;
    use rstest::rstest;
    use serde_json::{Value, json};

    async fn get_json(mocks: StateMocks, uri: &str) -> (StatusCode, Value) {
        let app = test::init_service(test_app(mocks).service(influence).service(streak)).await;
        let request = test::TestRequest::get()
            .uri(uri)
            .insert_header((AUTHORIZATION, BEARER))
            .to_request();
        let response = test::call_service(&app, request).await;
        let status = response.status();
        (status, test::read_body_json(response).await)
    }

    #[rstest]
    #[actix_web::test]
    async fn influence_is_a_bare_integer() {
        let mut mocks = StateMocks::authenticated();
        mocks.scores.expect_influence().returning(|_| Ok(12));
        let (status, body) = get_json(mocks, "/journal/reactions/influence").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!(12));
    }

    #[rstest]
    #[actix_web::test]
    async fn streak_is_wrapped() {
        let mut mocks = StateMocks::authenticated();
        mocks.scores.expect_streak().returning(|_| Ok(4));
        let (status, body) = get_json(mocks, "/journal/streak").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"streak": 4}));
    }

    #[rstest]
    #[case::influence("/journal/reactions/influence")]
    #[case::streak("/journal/streak")]
    #[actix_web::test]
    async fn failures_read_as_zero(#[case] uri: &str) {
        let mut mocks = StateMocks::authenticated();
        mocks
            .scores
            .expect_influence()
            .returning(|_| Err(Error::internal("store down")));
        mocks
            .scores
            .expect_streak()
            .returning(|_| Err(Error::internal("store down")));
        let (status, body) = get_json(mocks, uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!(0));
    }
}
