//! Tests for HTTP error mapping.

use super::*;
use actix_web::body::to_bytes;
use actix_web::{App, HttpResponse, test as actix_test, web};
use rstest::{fixture, rstest};
use serde_json::{Value, json};

const TRACE_ID: &str = "00000000-0000-0000-0000-000000000000";

#[fixture]
fn internal_error() -> Error {
    Error::internal("store request failed: table missing")
        .with_trace_id(TRACE_ID)
        .with_details(json!({"table": "journal"}))
}

async fn body_of(error: &Error) -> Value {
    let response = ResponseError::error_response(error);
    let bytes = to_bytes(response.into_body())
        .await
        .expect("reading response body succeeds");
    serde_json::from_slice(&bytes).expect("error JSON")
}

#[rstest]
#[case::bad_request(Error::invalid_request("bad"), StatusCode::BAD_REQUEST)]
#[case::unauthorized(Error::unauthorized("no auth"), StatusCode::UNAUTHORIZED)]
#[case::forbidden(Error::forbidden("denied"), StatusCode::FORBIDDEN)]
#[case::not_found(Error::not_found("missing"), StatusCode::NOT_FOUND)]
#[case::conflict(Error::conflict("taken"), StatusCode::CONFLICT)]
#[case::unavailable(Error::service_unavailable("later"), StatusCode::SERVICE_UNAVAILABLE)]
#[case::internal(Error::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR)]
fn status_code_matches_error_code(#[case] err: Error, #[case] status: StatusCode) {
    assert_eq!(ResponseError::status_code(&err), status);
}

#[rstest]
#[actix_web::test]
async fn internal_errors_are_redacted(internal_error: Error) {
    let response = ResponseError::error_response(&internal_error);
    let header = response
        .headers()
        .get(TRACE_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    assert_eq!(header.as_deref(), Some(TRACE_ID));

    let body = body_of(&internal_error).await;
    assert_eq!(body["code"], "internal_error");
    assert_eq!(body["message"], INTERNAL_MESSAGE);
    assert_eq!(body["traceId"], TRACE_ID);
    assert!(body.get("details").is_none());
}

#[rstest]
#[actix_web::test]
async fn client_errors_keep_message_and_details() {
    let err = Error::invalid_request("email must not be empty")
        .with_details(json!({"field": "email"}));
    let body = body_of(&err).await;
    assert_eq!(body["code"], "invalid_request");
    assert_eq!(body["message"], "email must not be empty");
    assert_eq!(body["details"]["field"], "email");
}

#[rstest]
#[actix_web::test]
async fn malformed_json_bodies_are_bad_requests() {
    async fn echo(body: web::Json<Value>) -> HttpResponse {
        HttpResponse::Ok().json(body.into_inner())
    }
    let app = actix_test::init_service(
        App::new()
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .route("/echo", web::post().to(echo)),
    )
    .await;
    let request = actix_test::TestRequest::post()
        .uri("/echo")
        .insert_header(("content-type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let response = actix_test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["code"], "invalid_request");
}
