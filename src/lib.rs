use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub mod publisher;
pub mod startup_checks;
pub mod static_files;
pub mod submission;
pub mod templating;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub app: AppConfig,
    pub templates: TemplateConfig,
    pub static_files: StaticConfig,
    pub submission: submission::SubmissionConfig,
    pub publisher: publisher::PublisherConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub name: String,
    pub log_level: String,
    #[serde(default)]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TemplateConfig {
    pub directory: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StaticConfig {
    pub directory: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
            },
            app: AppConfig {
                name: "Toukou".to_string(),
                log_level: "info".to_string(),
                base_url: None,
            },
            templates: TemplateConfig {
                directory: PathBuf::from("templates"),
            },
            static_files: StaticConfig {
                directory: PathBuf::from("static"),
            },
            submission: submission::SubmissionConfig::default(),
            publisher: publisher::PublisherConfig::default(),
        }
    }
}

use axum::{
    Router,
    extract::{DefaultBodyLimit, Path, State},
    response::IntoResponse,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub template_engine: Arc<templating::TemplateEngine>,
    pub static_handler: static_files::StaticFileHandler,
    pub image_handler: static_files::StaticFileHandler,
    pub submissions: Arc<submission::SubmissionManager>,
    pub publisher: publisher::DynPublisher,
    pub config: Config,
}

async fn static_file_handler(
    State(app_state): State<AppState>,
    Path(path): Path<String>,
) -> impl IntoResponse {
    app_state.static_handler.serve(&path).await
}

async fn image_file_handler(
    State(app_state): State<AppState>,
    Path(path): Path<String>,
) -> impl IntoResponse {
    app_state.image_handler.serve(&path).await
}

pub async fn create_app(config: Config) -> Result<Router, publisher::PublishError> {
    let template_engine = Arc::new(templating::TemplateEngine::new(
        config.templates.directory.clone(),
    ));

    let static_handler =
        static_files::StaticFileHandler::new(config.static_files.directory.clone());

    // Uploaded images are staged locally and served straight back from disk
    let image_handler =
        static_files::StaticFileHandler::new(config.submission.images_directory.clone());

    let submissions = Arc::new(submission::SubmissionManager::new(
        config.submission.clone(),
    ));

    let publisher = publisher::create_publisher(&config.publisher)?;

    let app_state = AppState {
        template_engine,
        static_handler,
        image_handler,
        submissions,
        publisher,
        config: config.clone(),
    };

    let router = Router::new()
        .route(
            "/",
            axum::routing::get(submission::handlers::submit_form_handler),
        )
        .route(
            "/submit",
            axum::routing::post(submission::handlers::submit_handler),
        )
        .route("/images/{*path}", axum::routing::get(image_file_handler))
        .route("/static/{*path}", axum::routing::get(static_file_handler))
        .layer(DefaultBodyLimit::disable())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    let method = request.method();
                    let uri = request.uri();
                    let matched_path = request
                        .extensions()
                        .get::<axum::extract::MatchedPath>()
                        .map(|matched_path| matched_path.as_str());

                    tracing::info_span!(
                        "http_request",
                        method = %method,
                        uri = %uri,
                        matched_path,
                    )
                })
                .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
                    let method = request.method();
                    let uri = request.uri();
                    let headers = request.headers();
                    let user_agent = headers
                        .get("user-agent")
                        .and_then(|h| h.to_str().ok())
                        .unwrap_or("-");

                    tracing::info!(
                        target: "access_log",
                        method = %method,
                        path = %uri.path(),
                        query = ?uri.query(),
                        user_agent = %user_agent,
                        "request"
                    );
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     _span: &tracing::Span| {
                        let status = response.status();

                        tracing::info!(
                            target: "access_log",
                            status = %status,
                            latency_ms = %latency.as_millis(),
                            "response"
                        );
                    },
                ),
        )
        .with_state(app_state);

    Ok(router)
}
