//! HTTP surface: the browser form, the JSON API and file downloads.

pub mod handlers;
pub mod models;
pub mod pages;

use actix_web::{error, web, HttpResponse};

use crate::ErrorResponse;

/// Malformed JSON bodies get the same error shape as every other API failure.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let response = HttpResponse::BadRequest().json(ErrorResponse::bad_request(&err.to_string()));
        error::InternalError::from_response(err, response).into()
    })
}

/// Register every route on an app or scope.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .service(web::resource("/").route(web::get().to(handlers::index)))
        .service(web::resource("/letters").route(web::post().to(handlers::submit_form)))
        .service(web::resource("/api/letters").route(web::post().to(handlers::create_letter)))
        .service(
            web::resource("/downloads/{id}/{filename}")
                .route(web::get().to(handlers::download)),
        )
        .service(web::resource("/health").route(web::get().to(handlers::health)));
}
