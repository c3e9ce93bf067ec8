//! Application assembly shared by the server and the HTTP tests.

use actix_cors::Cors;
use actix_web::{
    App, Error,
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    http::{Method, header},
    web,
};
use tracing_actix_web::TracingLogger;

use crate::config::AppConfig;
use crate::handlers;
use crate::middleware::{ErrorBoundary, PrettyJson};
use crate::state::AppState;

fn cors(config: &AppConfig) -> Cors {
    let cors = Cors::default()
        .allowed_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allowed_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .supports_credentials();

    config
        .allowed_origins
        .iter()
        .fold(cors, |cors, origin| match origin.as_str() {
            "*" => cors.allow_any_origin(),
            origin => cors.allowed_origin(origin),
        })
}

/// Build the application: request logging, CORS, pretty JSON and the error
/// boundary, outermost first.
pub fn build_app(
    state: AppState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = Error,
        InitError = (),
    >,
> {
    let cors = cors(&state.config);
    let environment = state.config.environment;

    App::new()
        .app_data(web::Data::new(state))
        .app_data(handlers::json_config())
        .app_data(handlers::path_config())
        .configure(handlers::configure_routes)
        .default_service(web::to(handlers::not_found))
        .wrap(ErrorBoundary::new(environment))
        .wrap(PrettyJson)
        .wrap(cors)
        .wrap(TracingLogger::default())
}
