use actix_cors::Cors;
use actix_web::middleware::Compress;
use actix_web::{http::header, web, App, HttpServer};
use actix_web_prometheus::PrometheusMetricsBuilder;
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

pub mod auth;
pub mod db;
pub mod error;
pub mod pengaturan;
pub mod profil;
pub mod renderer;
pub mod storage;
pub mod surat;
pub mod template;

pub use crate::db::AppState;
pub use crate::error::AppError;

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
}

pub async fn run() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    #[derive(OpenApi)]
    #[openapi(
        paths(
            crate::auth::handlers::register,
            crate::auth::handlers::login,
            crate::auth::handlers::refresh_token,
            crate::template::handlers::create_template,
            crate::template::handlers::list_templates,
            crate::template::handlers::get_template,
            crate::template::handlers::update_template,
            crate::template::handlers::delete_template,
            crate::pengaturan::handlers::get_pengaturan,
            crate::pengaturan::handlers::put_pengaturan,
            crate::profil::handlers::get_profile,
            crate::profil::handlers::update_profile,
            crate::profil::handlers::upload_aset,
            crate::surat::handlers::list_templates_aktif,
            crate::surat::handlers::get_template_aktif,
            crate::surat::handlers::create_pengajuan,
            crate::surat::handlers::list_pengajuan,
            crate::surat::handlers::get_pengajuan,
            crate::surat::handlers::list_log,
            crate::surat::handlers::upload_url,
            crate::surat::handlers::catat_berkas,
            crate::surat::handlers::list_berkas,
            crate::surat::handlers::ajukan_verifikasi,
            crate::surat::handlers::list_surat_admin,
            crate::surat::handlers::get_verifikasi,
            crate::surat::handlers::put_verifikasi,
            crate::surat::handlers::list_persetujuan,
            crate::surat::handlers::get_persetujuan,
            crate::surat::handlers::put_persetujuan,
            crate::surat::handlers::unduh
        ),
        components(
            schemas(
                ErrorResponse,
                auth::model::RegisterRequest,
                auth::model::LoginRequest,
                auth::model::RefreshRequest,
                auth::model::TokenResponse,
                auth::model::Role,
                template::models::TemplateSurat,
                template::models::FormField,
                template::models::CreateTemplateRequest,
                template::models::UpdateTemplateRequest,
                surat::models::SuratKeluar,
                surat::models::PengajuanRingkas,
                surat::models::LogAktivitas,
                surat::models::BerkasPersyaratan,
                surat::models::BerkasDenganUrl,
                surat::models::CreatePengajuanRequest,
                surat::models::UploadUrlRequest,
                surat::models::CatatBerkasRequest,
                surat::models::AjukanVerifikasiRequest,
                surat::models::KeputusanRequest,
                surat::status::StatusSurat,
                surat::status::Keputusan,
                profil::models::Profil,
                profil::models::UpdateProfilRequest,
                profil::models::JenisAset,
                profil::models::UploadAsetRequest,
                pengaturan::models::PengaturanDesa,
                pengaturan::models::SimpanPengaturanRequest,
                storage::SignedUpload,
            )
        ),
        tags(
            (name = "Authentication", description = "Account registration and tokens."),
            (name = "Surat", description = "Resident letter submissions and downloads."),
            (name = "Admin", description = "Template registry, verification queue and village settings."),
            (name = "Kepala Desa", description = "Final approval queue."),
            (name = "Users", description = "Profiles and profile image uploads.")
        ),
        servers(
            (url = "http://127.0.0.1:8080", description = "Localhost")
        )
    )]
    struct ApiDoc;

    dotenvy::dotenv().ok();
    let app_state = match AppState::new().await {
        Ok(state) => web::Data::new(state),
        Err(e) => {
            log::error!(
                "Failed to start: check DATABASE_URL and SUPABASE_* in .env and ensure the \
                 database is running. Error: {}",
                e
            );
            std::process::exit(1);
        }
    };

    let prometheus = PrometheusMetricsBuilder::new("desa_surat_server")
        .endpoint("/metrics")
        .build()
        .expect("Failed to create Prometheus metrics middleware");

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);
    log::info!("Starting server at http://0.0.0.0:{port}");

    HttpServer::new(move || {
        let app_state = app_state.clone();
        let prometheus = prometheus.clone();
        let mut cors = Cors::default()
            .allowed_origin("http://localhost:5173")
            .allowed_origin("http://localhost:3000")
            .allowed_origin("http://127.0.0.1:8080")
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                header::AUTHORIZATION,
                header::ACCEPT,
                header::CONTENT_TYPE,
            ])
            .supports_credentials()
            .max_age(3600);
        if let Ok(origin) = std::env::var("FRONTEND_ORIGIN") {
            cors = cors.allowed_origin(&origin);
        }

        App::new()
            .wrap(Compress::default())
            .wrap(prometheus)
            .wrap(cors)
            .app_data(app_state)
            .service(
                web::scope("/api")
                    .service(
                        web::scope("/auth")
                            .route("/register", web::post().to(auth::handlers::register))
                            .route("/login", web::post().to(auth::handlers::login))
                            .route("/refresh", web::post().to(auth::handlers::refresh_token)),
                    )
                    .service(
                        web::scope("/admin")
                            .service(
                                web::resource("/templates")
                                    .route(web::get().to(template::handlers::list_templates))
                                    .route(web::post().to(template::handlers::create_template)),
                            )
                            .service(
                                web::resource("/templates/{id}")
                                    .route(web::get().to(template::handlers::get_template))
                                    .route(web::put().to(template::handlers::update_template))
                                    .route(web::delete().to(template::handlers::delete_template)),
                            )
                            .route("/surat", web::get().to(surat::handlers::list_surat_admin))
                            .service(
                                web::resource("/verifikasi/{id}")
                                    .route(web::get().to(surat::handlers::get_verifikasi))
                                    .route(web::put().to(surat::handlers::put_verifikasi)),
                            )
                            .service(
                                web::resource("/pengaturan")
                                    .route(web::get().to(pengaturan::handlers::get_pengaturan))
                                    .route(web::put().to(pengaturan::handlers::put_pengaturan)),
                            ),
                    )
                    .service(
                        web::scope("/kepala-desa")
                            .route(
                                "/persetujuan",
                                web::get().to(surat::handlers::list_persetujuan),
                            )
                            .service(
                                web::resource("/persetujuan/{id}")
                                    .route(web::get().to(surat::handlers::get_persetujuan))
                                    .route(web::put().to(surat::handlers::put_persetujuan)),
                            ),
                    )
                    .service(
                        web::scope("/surat")
                            .route(
                                "/templates",
                                web::get().to(surat::handlers::list_templates_aktif),
                            )
                            .route(
                                "/templates/{kode_surat}",
                                web::get().to(surat::handlers::get_template_aktif),
                            )
                            .service(
                                web::resource("/pengajuan")
                                    .route(web::get().to(surat::handlers::list_pengajuan))
                                    .route(web::post().to(surat::handlers::create_pengajuan)),
                            )
                            .route(
                                "/pengajuan/{id}",
                                web::get().to(surat::handlers::get_pengajuan),
                            )
                            .route(
                                "/pengajuan/{id}/log",
                                web::get().to(surat::handlers::list_log),
                            )
                            .route("/upload-url", web::post().to(surat::handlers::upload_url))
                            .service(
                                web::resource("/berkas")
                                    .route(web::post().to(surat::handlers::catat_berkas)),
                            )
                            .route(
                                "/berkas/{surat_id}",
                                web::get().to(surat::handlers::list_berkas),
                            )
                            .route(
                                "/ajukan-verifikasi",
                                web::post().to(surat::handlers::ajukan_verifikasi),
                            )
                            .route("/unduh/{id}", web::get().to(surat::handlers::unduh)),
                    )
                    .service(
                        web::scope("/users")
                            .service(
                                web::resource("/profile")
                                    .route(web::get().to(profil::handlers::get_profile))
                                    .route(web::put().to(profil::handlers::update_profile)),
                            )
                            .route(
                                "/profile/aset",
                                web::post().to(profil::handlers::upload_aset),
                            ),
                    ),
            )
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
    })
    .backlog(8192)
    .max_connections(25000)
    .keep_alive(actix_web::http::KeepAlive::Os)
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
