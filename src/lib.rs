use actix_cors::Cors;
use actix_web::middleware::Compress;
use actix_web::{http::header, App, HttpServer};
use actix_web_prometheus::PrometheusMetricsBuilder;
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

pub mod config;
pub mod delivery;
pub mod downloads;
pub mod letter;
pub mod state;
pub mod web;

pub use crate::config::AppConfig;
pub use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    #[schema(example = "ValidationError")]
    pub error: String,
    pub message: String,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_type: &str, message: &str) -> Self {
        Self {
            error: error_type.to_string(),
            message: message.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn not_found(message: &str) -> Self {
        Self::new("NotFound", message)
    }

    pub fn bad_request(message: &str) -> Self {
        Self::new("BadRequest", message)
    }

    pub fn validation(message: &str) -> Self {
        Self::new("ValidationError", message)
    }

    pub fn template_not_found(message: &str) -> Self {
        Self::new("TemplateNotFound", message)
    }

    pub fn internal_error(message: &str) -> Self {
        Self::new("InternalServerError", message)
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::web::handlers::create_letter,
        crate::web::handlers::download,
        crate::web::handlers::health
    ),
    components(
        schemas(
            letter::LetterForm,
            web::models::LetterResponse,
            web::models::FileLink,
            web::models::HealthResponse,
            delivery::Notice,
            delivery::NoticeLevel,
            ErrorResponse,
        )
    ),
    tags(
        (name = "Letters", description = "Recommendation letter generation and downloads.")
    )
)]
pub struct ApiDoc;

fn cors(allowed_origins: &[String]) -> Cors {
    let cors = if allowed_origins.is_empty() {
        Cors::default().allow_any_origin()
    } else {
        allowed_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
    };

    cors.allowed_methods(vec!["GET", "POST", "OPTIONS"])
        .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
        .max_age(3600)
}

pub async fn run() -> std::io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {}. Please check your .env file.", e);
            std::process::exit(1);
        }
    };

    let app_state = match AppState::new(&config) {
        Ok(state) => actix_web::web::Data::new(state),
        Err(e) => {
            log::error!("Failed to set up letter delivery: {}", e);
            std::process::exit(1);
        }
    };

    let templates = app_state.letters.templates();
    for missing in templates.missing() {
        log::warn!(
            "Template file '{}' not found in {}",
            missing,
            templates.dir().display()
        );
    }

    if config.delivery_mode == delivery::DeliveryMode::Pdf {
        let converter = config.converter();
        if !converter.is_available() {
            log::warn!(
                "PDF converter '{}' is not available; letters will be offered as Word documents only",
                converter.name()
            );
        }
    }

    let prometheus = PrometheusMetricsBuilder::new("recommendation_letter_server")
        .endpoint("/metrics")
        .build()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;

    let allowed_origins = config.allowed_origins.clone();
    let bind_address = (config.host.clone(), config.port);

    log::info!(
        "Starting server at http://{}:{} (delivery: {})",
        config.host,
        config.port,
        config.delivery_mode.as_str()
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Compress::default())
            .wrap(prometheus.clone())
            .wrap(cors(&allowed_origins))
            .app_data(app_state.clone())
            .configure(web::config)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
    })
    .keep_alive(actix_web::http::KeepAlive::Os)
    .bind(bind_address)?
    .run()
    .await
}
