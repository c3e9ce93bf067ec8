//! Pretty JSON middleware - indents JSON bodies when `?pretty` is present.

use actix_web::{
    Error,
    body::{self, EitherBody, MessageBody},
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::header::{CONTENT_TYPE, HeaderMap},
};
use std::future::{Future, Ready, ready};
use std::pin::Pin;

/// Re-emits JSON response bodies indented when the query string carries a
/// `pretty` key (`?pretty`, `?pretty=true`, `?a=1&pretty`).
pub struct PrettyJson;

impl<S, B> Transform<S, ServiceRequest> for PrettyJson
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = PrettyJsonService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(PrettyJsonService { service }))
    }
}

pub struct PrettyJsonService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for PrettyJsonService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let pretty = wants_pretty(req.query_string());
        let fut = self.service.call(req);

        Box::pin(async move {
            let res = fut.await?;
            if !pretty || !is_json(res.headers()) {
                return Ok(res.map_into_left_body());
            }

            let (req, res) = res.into_parts();
            let (head, body) = res.into_parts();
            let bytes = match body::to_bytes(body).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    let e: Box<dyn std::error::Error> = e.into();
                    return Err(actix_web::error::ErrorInternalServerError(e.to_string()));
                }
            };

            // Bodies that fail to parse go out untouched.
            let indented = serde_json::from_slice::<serde_json::Value>(&bytes)
                .and_then(|value| serde_json::to_vec_pretty(&value))
                .unwrap_or_else(|_| bytes.to_vec());

            let res = head.set_body(indented).map_into_boxed_body();
            Ok(ServiceResponse::new(req, res).map_into_right_body())
        })
    }
}

fn wants_pretty(query: &str) -> bool {
    query
        .split('&')
        .any(|pair| pair.split('=').next() == Some("pretty"))
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::{TestRequest, call_and_read_body, init_service};
    use actix_web::{App, HttpResponse, web};

    #[test]
    fn test_wants_pretty() {
        assert!(wants_pretty("pretty"));
        assert!(wants_pretty("a=1&pretty=true"));
        assert!(!wants_pretty(""));
        assert!(!wants_pretty("prettyish=1"));
    }

    #[actix_web::test]
    async fn test_indents_only_when_asked() {
        let app = init_service(App::new().wrap(PrettyJson).route(
            "/",
            web::get().to(|| async { HttpResponse::Ok().json(serde_json::json!({"a": 1})) }),
        ))
        .await;

        let req = TestRequest::get().uri("/").to_request();
        let compact = call_and_read_body(&app, req).await;
        assert_eq!(compact, r#"{"a":1}"#.as_bytes());

        let req = TestRequest::get().uri("/?pretty").to_request();
        let indented = call_and_read_body(&app, req).await;
        assert_eq!(indented, "{\n  \"a\": 1\n}".as_bytes());
    }
}
