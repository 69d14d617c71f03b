//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every HTTP endpoint of the inbound layer, the
//! request and response bodies, the error envelope and the bearer-token
//! security scheme. The document is served at `/api-docs/openapi.json`
//! and exported via `cargo run --bin openapi-dump`.

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{Error, ErrorCode, SharedEntryView, SocialPage, TodayEntries, UserProfile};
use crate::inbound::http::journal::{SubmitRequest, SubmitResponse};
use crate::inbound::http::reactions::{LikedRequest, LikedResponse, ReactRequest};
use crate::inbound::http::scores::StreakResponse;
use crate::inbound::http::users::{
    ConfirmRequest, ConfirmResponse, LoginRequest, LoginResponse, RegisterRequest,
};

/// Name of the bearer security scheme in the generated document.
pub const BEARER_SCHEME: &str = "BearerJwt";

/// Enrich the generated document with the bearer JWT security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        let mut scheme = Http::new(HttpAuthScheme::Bearer);
        scheme.bearer_format = Some("JWT".to_owned());
        scheme.description = Some("Session token issued by POST /login/{tokenId}.".to_owned());
        components.add_security_scheme(BEARER_SCHEME, SecurityScheme::Http(scheme));
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Gratitude journal API",
        description = "Accounts, one-time-code login, daily journal entries, sharing and reactions.",
        license(
            name = "Apache-2.0",
            url = "https://www.apache.org/licenses/LICENSE-2.0.html"
        )
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("BearerJwt" = [])),
    paths(
        crate::inbound::http::users::register,
        crate::inbound::http::users::login,
        crate::inbound::http::users::confirm_login,
        crate::inbound::http::users::me,
        crate::inbound::http::journal::submit_entries,
        crate::inbound::http::journal::todays_entries,
        crate::inbound::http::journal::social_feed,
        crate::inbound::http::journal::share_entries,
        crate::inbound::http::reactions::liked_entries,
        crate::inbound::http::reactions::react,
        crate::inbound::http::scores::influence,
        crate::inbound::http::scores::streak,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        RegisterRequest,
        LoginRequest,
        LoginResponse,
        ConfirmRequest,
        ConfirmResponse,
        UserProfile,
        SubmitRequest,
        SubmitResponse,
        TodayEntries,
        SocialPage,
        SharedEntryView,
        LikedRequest,
        LikedResponse,
        ReactRequest,
        StreakResponse,
    )),
    tags(
        (name = "users", description = "Registration, login and profile"),
        (name = "journal", description = "Daily entries and the social feed"),
        (name = "reactions", description = "Likes and influence"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
