use std::sync::Arc;

use actix_cors::Cors;
use actix_web::middleware::Compress;
use actix_web::{http::header, web, App, HttpServer};
use actix_web_prometheus::PrometheusMetricsBuilder;
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

pub mod auth;
pub mod config;
pub mod demande;
pub mod documents;
pub mod store;
pub mod uploads;

use crate::config::Config;
use crate::documents::{ChromiumRasterizer, LifecycleManager, Rasterizer};
use crate::store::{DemandeStore, PgDemandeStore};

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
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

    pub fn internal_error(message: &str) -> Self {
        Self::new("InternalServerError", message)
    }
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DemandeStore>,
    pub lifecycle: Arc<LifecycleManager>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn DemandeStore>,
        rasterizer: Arc<dyn Rasterizer>,
        config: Arc<Config>,
    ) -> Self {
        let lifecycle = Arc::new(LifecycleManager::new(
            store.clone(),
            rasterizer,
            config.clone(),
        ));
        AppState {
            store,
            lifecycle,
            config,
        }
    }
}

pub async fn run() -> std::io::Result<()> {
    if std::env::var("RUST_LOG").is_err() {
        unsafe {
            std::env::set_var("RUST_LOG", "info");
        }
    }
    env_logger::init();

    #[derive(OpenApi)]
    #[openapi(
        paths(
            crate::demande::handlers::get_all_demandes,
            crate::demande::handlers::get_demande_by_id,
            crate::demande::handlers::create_demande,
            crate::demande::handlers::get_my_demandes,
            crate::demande::handlers::get_demandes_to_validate,
            crate::demande::handlers::get_validated_documents,
            crate::demande::handlers::generate_document,
            crate::demande::handlers::validate_document,
            crate::demande::handlers::download_document,
            crate::demande::handlers::verify_document,
            crate::demande::handlers::get_all_statuts,
            crate::demande::handlers::generate_wallet_pass,
            crate::uploads::upload_photo,
            crate::auth::handlers::login,
            crate::auth::handlers::refresh
        ),
        components(
            schemas(
                demande::models::DemandeResponse,
                demande::models::CreateDemandeRequest,
                demande::models::Statut,
                demande::models::Citoyen,
                demande::models::Commune,
                demande::models::Province,
                demande::models::Administrateur,
                demande::handlers::DocumentResponse,
                demande::handlers::VerificationResponse,
                demande::handlers::WalletPassResponse,
                documents::DocumentRef,
                uploads::UploadResponse,
                auth::model::LoginRequest,
                auth::model::RefreshRequest,
                auth::model::TokenResponse,
                auth::model::Role,
                ErrorResponse,
            )
        ),
        tags(
            (name = "Demandes", description = "Citizen request endpoints."),
            (name = "Documents", description = "Document generation, validation and verification."),
            (name = "Uploads", description = "Citizen photo uploads."),
            (name = "Authentication", description = "Login and token refresh.")
        )
    )]
    struct ApiDoc;

    let config = Arc::new(Config::from_env());

    let store = match PgDemandeStore::connect(&config.database_url).await {
        Ok(store) => Arc::new(store) as Arc<dyn DemandeStore>,
        Err(e) => {
            log::error!("Failed to connect to database. Please check your DATABASE_URL in .env and ensure the database is running. Error: {}", e);
            std::process::exit(1);
        }
    };

    let rasterizer: Arc<dyn Rasterizer> = Arc::new(ChromiumRasterizer::from_config(&config));

    if let Err(e) = tokio::fs::create_dir_all(&config.documents_dir).await {
        log::error!(
            "Failed to create documents directory {}: {}",
            config.documents_dir.display(),
            e
        );
        std::process::exit(1);
    }

    let app_state = web::Data::new(AppState::new(store, rasterizer, config.clone()));

    let prometheus = PrometheusMetricsBuilder::new("ma_commune_server")
        .endpoint("/metrics")
        .build()
        .expect("Failed to create Prometheus metrics middleware");

    log::info!(
        "Starting server at http://{}:{}",
        config.bind_addr,
        config.bind_port
    );

    let uploads_dir = config.uploads_dir.clone();
    let bind = (config.bind_addr.clone(), config.bind_port);

    HttpServer::new(move || {
        let app_state = app_state.clone();
        let prometheus = prometheus.clone();
        let cors = Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                header::AUTHORIZATION,
                header::ACCEPT,
                header::CONTENT_TYPE,
            ])
            .max_age(3600);

        App::new()
            .wrap(Compress::default())
            .wrap(prometheus)
            .wrap(cors)
            .app_data(app_state)
            .service(
                web::scope("/api")
                    .service(
                        web::resource("/auth/login").route(web::post().to(auth::handlers::login)),
                    )
                    .service(
                        web::resource("/auth/refresh")
                            .route(web::post().to(auth::handlers::refresh)),
                    )
                    .service(
                        web::resource("/demandes")
                            .route(web::get().to(demande::handlers::get_all_demandes))
                            .route(web::post().to(demande::handlers::create_demande)),
                    )
                    .service(
                        web::resource("/demandes/mine")
                            .route(web::get().to(demande::handlers::get_my_demandes)),
                    )
                    .service(
                        web::resource("/demandes/a-valider")
                            .route(web::get().to(demande::handlers::get_demandes_to_validate)),
                    )
                    .service(
                        web::resource("/demandes/validees")
                            .route(web::get().to(demande::handlers::get_validated_documents)),
                    )
                    .service(
                        web::resource("/demandes/{id}")
                            .route(web::get().to(demande::handlers::get_demande_by_id)),
                    )
                    .service(
                        web::resource("/demandes/{id}/document")
                            .route(web::post().to(demande::handlers::generate_document))
                            .route(web::get().to(demande::handlers::download_document)),
                    )
                    .service(
                        web::resource("/demandes/{id}/valider")
                            .route(web::post().to(demande::handlers::validate_document)),
                    )
                    .service(
                        web::resource("/demandes/{id}/wallet-pass")
                            .route(web::post().to(demande::handlers::generate_wallet_pass)),
                    )
                    .service(
                        web::resource("/statuts")
                            .route(web::get().to(demande::handlers::get_all_statuts)),
                    )
                    .service(
                        web::resource("/uploads/photo")
                            .route(web::post().to(uploads::upload_photo)),
                    ),
            )
            .service(
                web::resource("/verify-document")
                    .route(web::get().to(demande::handlers::verify_document)),
            )
            .service(actix_files::Files::new("/uploads", uploads_dir.clone()))
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
    })
    .bind(bind)?
    .run()
    .await
}
