//! Request logging middleware.
//!
//! Logs one line when a request starts and one when it completes, with the
//! status and elapsed time. Health probes are logged at debug level to keep
//! the call logs readable.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
};
use futures_util::future::LocalBoxFuture;
use std::{
    future::{ready, Ready},
    time::Instant,
};
use tracing::{debug, info, warn};

pub struct RequestLogging;

impl<S, B> Transform<S, ServiceRequest> for RequestLogging
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestLoggingMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestLoggingMiddleware { service }))
    }
}

pub struct RequestLoggingMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for RequestLoggingMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let start_time = Instant::now();
        let method = req.method().to_string();
        let path = req.uri().path().to_string();
        let remote_addr = req
            .connection_info()
            .realip_remote_addr()
            .unwrap_or("unknown")
            .to_string();
        let is_probe = path == "/health";
        let is_upgrade = req.headers().contains_key("upgrade");

        if is_probe {
            debug!(method = %method, path = %path, "Request started");
        } else if is_upgrade {
            info!(
                method = %method,
                path = %path,
                remote_addr = %remote_addr,
                "WebSocket upgrade requested"
            );
        } else {
            info!(
                method = %method,
                path = %path,
                remote_addr = %remote_addr,
                "Request started"
            );
        }

        let fut = self.service.call(req);

        Box::pin(async move {
            let result = fut.await;
            let duration_ms = start_time.elapsed().as_millis();

            match &result {
                Ok(response) => {
                    let status = response.status();
                    if is_probe {
                        debug!(status = %status, duration_ms = %duration_ms, path = %path, "Request completed");
                    } else if status.is_client_error() || status.is_server_error() {
                        warn!(
                            method = %method,
                            path = %path,
                            status = %status,
                            duration_ms = %duration_ms,
                            "Request failed"
                        );
                    } else {
                        info!(
                            method = %method,
                            path = %path,
                            status = %status,
                            duration_ms = %duration_ms,
                            "Request completed"
                        );
                    }
                }
                Err(err) => {
                    warn!(
                        method = %method,
                        path = %path,
                        duration_ms = %duration_ms,
                        error = %err,
                        "Request errored"
                    );
                }
            }

            result
        })
    }
}
