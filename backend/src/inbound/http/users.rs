//! Account handlers: signup, the two-step OTP login and the caller's profile.
//!
//! ```text
//! POST /register {"email":"ada@example.com","displayName":"Ada"}
//! POST /login {"email":"ada@example.com"}
//! POST /login/{tokenId} {"email":"ada@example.com","token":"123456"}
//! GET /me
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::domain::ports::LoginConfirmation;
use crate::domain::{DisplayName, Email, Error, OtpCode, Registration, TokenId, UserProfile};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthenticatedUser;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{map_login_validation, map_user_validation, require};

/// Signup body for `POST /register`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[schema(example = "ada@example.com")]
    pub email: Option<String>,
    #[schema(example = "Ada Lovelace")]
    pub display_name: Option<String>,
}

/// Body for `POST /login`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "ada@example.com")]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token_id: String,
}

/// Body for `POST /login/{tokenId}`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ConfirmRequest {
    #[schema(example = "ada@example.com")]
    pub email: Option<String>,
    /// The six-digit code from the login email.
    #[schema(example = "123456")]
    pub token: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ConfirmResponse {
    pub jwt: String,
}

fn parse_email(raw: Option<String>) -> Result<Email, Error> {
    let raw = require(raw, "email")?;
    Email::new(raw).map_err(|err| map_user_validation("email", &err))
}

/// Create an account.
#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created"),
        (status = 400, description = "Invalid request", body = Error),
        (status = 409, description = "Email already registered", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["users"],
    operation_id = "register",
    security([])
)]
#[post("/register")]
pub async fn register(
    state: web::Data<HttpState>,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let RegisterRequest {
        email,
        display_name,
    } = payload.into_inner();
    let email = parse_email(email)?;
    let display_name = DisplayName::new(require(display_name, "displayName")?)
        .map_err(|err| map_user_validation("displayName", &err))?;
    let user_id = state
        .accounts
        .register(Registration {
            email,
            display_name,
        })
        .await?;
    info!(%user_id, "account registered");
    Ok(HttpResponse::Created().finish())
}

/// Email a login code and return the attempt id.
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login code sent", body = LoginResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 404, description = "Unknown email", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["users"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<LoginResponse>> {
    let email = parse_email(payload.into_inner().email)?;
    let token_id = state.login.initiate(&email).await?;
    Ok(web::Json(LoginResponse {
        token_id: token_id.to_string(),
    }))
}

/// Exchange the emailed code for a session token.
#[utoipa::path(
    post,
    path = "/login/{tokenId}",
    params(("tokenId" = String, Path, description = "Attempt id returned by POST /login")),
    request_body = ConfirmRequest,
    responses(
        (status = 200, description = "Session token issued", body = ConfirmResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Wrong, used or exhausted code", body = Error),
        (status = 404, description = "Unknown or expired attempt", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["users"],
    operation_id = "confirmLogin",
    security([])
)]
#[post("/login/{token_id}")]
pub async fn confirm_login(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<ConfirmRequest>,
) -> ApiResult<web::Json<ConfirmResponse>> {
    let ConfirmRequest { email, token } = payload.into_inner();
    let token_id = TokenId::new(path.into_inner()).map_err(|err| map_login_validation(&err))?;
    let email = parse_email(email)?;
    let code = OtpCode::parse(&require(token, "token")?).map_err(|err| map_login_validation(&err))?;
    let session = state
        .login
        .confirm(LoginConfirmation {
            email,
            token_id,
            code,
        })
        .await?;
    Ok(web::Json(ConfirmResponse {
        jwt: session.as_str().to_owned(),
    }))
}

/// Profile of the signed-in user.
#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = 200, description = "Profile", body = UserProfile),
        (status = 400, description = "Token carries no user id", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "No such user", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["users"],
    operation_id = "me"
)]
#[get("/me")]
pub async fn me(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
) -> ApiResult<web::Json<UserProfile>> {
    let profile = state.accounts.profile(user.user_id()).await?;
    Ok(web::Json(profile))
}

#[cfg(test)]
#[path = "users_tests.rs"]
mod tests;
