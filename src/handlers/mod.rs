pub mod submission;
pub mod uploads;

use actix_cors::Cors;
use actix_web::http::Method;
use actix_web::{web, HttpResponse};

/// Cross-origin access is limited to the configured front-end origins.
pub fn cors_policy(allowed_origins: &[String]) -> Cors {
    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "OPTIONS"])
        .allow_any_header()
        .max_age(3600);
    for origin in allowed_origins {
        cors = cors.allowed_origin(origin);
    }
    cors
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/hrminfo")
            .route(web::post().to(submission::create_submission))
            .route(web::method(Method::OPTIONS).to(|| async { HttpResponse::NoContent().finish() })),
    )
    .service(
        web::resource("/uploads/{filename}")
            .route(web::get().to(uploads::serve_upload)),
    );
}
