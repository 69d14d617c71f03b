//! Server construction and middleware wiring.

mod config;
mod state_builders;

pub use config::ServerConfig;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
#[cfg(not(debug_assertions))]
use actix_web::{HttpResponse, get};
use tokio::task::JoinHandle;
use tracing::info;
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

use gratitude_backend::Trace;
use gratitude_backend::doc::ApiDoc;
use gratitude_backend::inbound::events::{spawn_change_worker, spawn_review_worker};
use gratitude_backend::inbound::http::health::{HealthState, live, ready};
use gratitude_backend::inbound::http::state::HttpState;
use gratitude_backend::inbound::http::{configure, json_error_handler};

use state_builders::build_wiring;

/// Serve the generated OpenAPI document when Swagger UI is compiled out.
#[cfg(not(debug_assertions))]
#[get("/api-docs/openapi.json")]
async fn openapi_json() -> HttpResponse {
    HttpResponse::Ok().json(ApiDoc::openapi())
}

fn build_app(
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .wrap(Trace)
        .configure(configure)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));
    #[cfg(not(debug_assertions))]
    let app = app.service(openapi_json);

    app
}

/// Running server plus the background workers feeding the aggregates.
pub struct Running {
    pub server: Server,
    pub workers: Vec<JoinHandle<()>>,
}

/// Construct the HTTP server and spawn the event workers.
///
/// # Errors
/// Propagates [`std::io::Error`] when the store cannot be selected or the
/// socket cannot be bound.
pub async fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Running> {
    let wiring = build_wiring(&config).await?;
    let http_state = web::Data::new(wiring.http_state);

    let mut workers = vec![spawn_review_worker(
        wiring.review_worker,
        wiring.review_queue,
    )];
    workers.push(spawn_change_worker(wiring.change_worker, wiring.changes));
    if let Some(feed) = wiring.change_feed {
        workers.push(tokio::spawn(feed));
    }

    let server_health_state = health_state.clone();
    let server = HttpServer::new(move || build_app(server_health_state.clone(), http_state.clone()))
        .bind(config.bind_addr())?
        .run();

    info!(addr = %config.bind_addr(), workers = workers.len(), "server listening");
    health_state.mark_ready();
    Ok(Running { server, workers })
}
