//! Request tracing for the journal API.
//!
//! Every request runs inside a fresh [`TraceId`] scope and an `http` span.
//! Domain errors capture the id, the `trace-id` response header echoes it,
//! and one `info` line per request records status and latency.

use std::task::{Context, Poll};
use std::time::Instant;

use actix_web::Error;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{HeaderName, HeaderValue};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::{Instrument, error, info, info_span};

use crate::domain::{TRACE_ID_HEADER, TraceId};

/// Middleware scoping each request to its own [`TraceId`].
///
/// # Examples
/// ```
/// use actix_web::App;
/// use gratitude_backend::Trace;
///
/// let app = App::new().wrap(Trace);
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct Trace;

impl<S, B> Transform<S, ServiceRequest> for Trace
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = TraceService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, inner: S) -> Self::Future {
        ready(Ok(TraceService { inner }))
    }
}

/// Service produced by [`Trace`].
pub struct TraceService<S> {
    inner: S,
}

fn stamp<B>(response: &mut ServiceResponse<B>, trace_id: &TraceId) {
    match HeaderValue::from_str(&trace_id.to_string()) {
        Ok(value) => {
            response
                .response_mut()
                .headers_mut()
                .insert(HeaderName::from_static(TRACE_ID_HEADER), value);
        }
        Err(err) => error!(error = %err, "trace id is not a valid header value"),
    }
}

impl<S, B> Service<ServiceRequest> for TraceService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let trace_id = TraceId::generate();
        let span = info_span!(
            "http",
            trace_id = %trace_id,
            method = %req.method(),
            route = %req.path(),
        );
        let started = Instant::now();
        let pending = TraceId::scope(trace_id, self.inner.call(req));
        Box::pin(
            async move {
                let mut response = pending.await?;
                stamp(&mut response, &trace_id);
                info!(
                    status = response.status().as_u16(),
                    elapsed_ms = started.elapsed().as_millis(),
                    "request finished"
                );
                Ok(response)
            }
            .instrument(span),
        )
    }
}
