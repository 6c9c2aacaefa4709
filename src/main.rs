use actix_cors::Cors;
use actix_web::{
    http::header,
    middleware::{DefaultHeaders, Logger, NormalizePath, TrailingSlash},
    web, App, HttpServer,
};
use clap::Parser;
use iaa_web::{
    config::Config,
    content::ContentClient,
    middleware::{draft_session, LocaleRedirect},
    routes, AppState,
};
use std::io;
use std::path::PathBuf;
use tera::Tera;

#[derive(Parser, Debug)]
#[command(name = "iaa_server", author, version, about = "Serves the IAA Vietnam website and blog.")]
struct Cli {
    /// Path to the .env configuration file.
    #[arg(long, required = true, value_name = "FILE")]
    env_file: PathBuf,
}

fn fatal(context: &str, err: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, format!("FATAL: {}: {}", context, err))
}

fn build_cors(allowed_origins: &str) -> Cors {
    let cors = if allowed_origins.trim() == "*" {
        Cors::default().allow_any_origin()
    } else {
        allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
    };
    cors.allowed_methods(vec!["GET", "DELETE"])
        .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
        .supports_credentials()
        .max_age(3600)
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    let cli = Cli::parse();

    let config = Config::from_env(&cli.env_file).map_err(|e| fatal("Failed to load configuration", e))?;

    env_logger::init_from_env(env_logger::Env::new().default_filter_or(&config.log_level));
    for warning in config.warnings() {
        log::warn!("{}", warning);
    }

    let tera = Tera::new(&config.templates_glob)
        .map_err(|e| fatal("Template initialization failed", e))?;
    log::info!("Loaded {} templates from '{}'", tera.get_template_names().count(), config.templates_glob);

    let content = ContentClient::from_config(&config.sanity)
        .map_err(|e| fatal("Failed to create the content client", e))?;
    let session_key = config
        .session_key()
        .map_err(|e| fatal("Invalid session key", e))?;

    let app_state = web::Data::new(AppState::new(&config, content));
    let tera = web::Data::new(tera);

    let server_address = config.server_address();
    log::info!(
        "Server starting at http://{} (project '{}', dataset '{}')",
        server_address,
        config.sanity.project_id,
        config.sanity.dataset
    );

    HttpServer::new(move || {
        App::new()
            .wrap(draft_session(session_key.clone(), config.use_secure_cookies))
            .wrap(LocaleRedirect)
            .wrap(
                DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("X-Frame-Options", "DENY"))
                    .add(("Referrer-Policy", "strict-origin-when-cross-origin")),
            )
            .wrap(Logger::default())
            .wrap(build_cors(&config.allowed_origins))
            .wrap(NormalizePath::new(TrailingSlash::Trim))
            .app_data(app_state.clone())
            .app_data(tera.clone())
            .service(actix_files::Files::new("/static", &config.static_dir))
            .configure(routes::configure)
    })
    .bind(server_address)?
    .run()
    .await
}
