use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::StatusCode,
    Error,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;
use std::time::Instant;

/// One access line per request: method, path, status and latency.
/// Query strings are left out since reset tokens can travel in them.
pub struct LoggerMiddleware;

impl<S, B> Transform<S, ServiceRequest> for LoggerMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = LoggerMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(LoggerMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct LoggerMiddlewareService<S> {
    service: Rc<S>,
}

fn access_line(method: &str, path: &str, status: StatusCode, elapsed_ms: u128) -> String {
    format!("{} {} -> {} in {}ms", method, path, status.as_u16(), elapsed_ms)
}

impl<S, B> Service<ServiceRequest> for LoggerMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let started = Instant::now();
        let method = req.method().to_string();
        let path = req.path().to_string();
        let service = self.service.clone();

        Box::pin(async move {
            let res = service.call(req).await;
            let elapsed_ms = started.elapsed().as_millis();

            // Rejections from inner middleware (e.g. the JWT check) arrive as Err.
            let status = match &res {
                Ok(res) => res.status(),
                Err(e) => e.as_response_error().status_code(),
            };
            let line = access_line(&method, &path, status, elapsed_ms);
            if status.is_server_error() {
                log::error!("{}", line);
            } else if status.is_client_error() {
                log::warn!("{}", line);
            } else {
                log::info!("{}", line);
            }

            res
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, web, App, HttpResponse};

    #[::core::prelude::v1::test]
    fn test_access_line_format() {
        assert_eq!(
            access_line("POST", "/auth/login", StatusCode::UNAUTHORIZED, 12),
            "POST /auth/login -> 401 in 12ms"
        );
    }

    #[actix_web::test]
    async fn test_responses_pass_through_unchanged() {
        let app = test::init_service(
            App::new()
                .wrap(LoggerMiddleware)
                .route("/ok", web::get().to(|| async { HttpResponse::Ok().body("fine") }))
                .route("/teapot", web::get().to(|| async { HttpResponse::ImATeapot().finish() })),
        )
        .await;

        let ok = test::call_service(&app, test::TestRequest::get().uri("/ok").to_request()).await;
        assert_eq!(ok.status(), StatusCode::OK);
        assert_eq!(test::read_body(ok).await, "fine");

        let teapot =
            test::call_service(&app, test::TestRequest::get().uri("/teapot").to_request()).await;
        assert_eq!(teapot.status(), StatusCode::IM_A_TEAPOT);
    }
}
