use clap::{Parser, Subcommand};
use iaa_web::config::Config;
use iaa_web::content::{ContentClient, Perspective};
use iaa_web::helper::public_helpers;
use iaa_web::routes::pages;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "content_cli", author, version, about = "Operator tasks against the content API.", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the .env configuration file.
    #[arg(long, required = true, value_name = "FILE")]
    env_file: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print every page path that can be rendered ahead of time.
    Paths {
        /// Prefix each path with SITE_URL.
        #[arg(long)]
        absolute: bool,
    },
    /// Run one query against the content API to verify project, dataset and token.
    Check,
}

async fn print_paths(client: &ContentClient, site_url: &str, absolute: bool) -> ExitCode {
    match public_helpers::fetch_all_post_slugs(client).await {
        Ok(slugs) => {
            let prefix = if absolute { site_url } else { "" };
            for path in pages::static_paths(&slugs) {
                println!("{}{}", prefix, path);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("❌ Error: Failed to list post slugs: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn check(client: &ContentClient, config: &Config) -> ExitCode {
    match public_helpers::fetch_all_categories(client, Perspective::Published).await {
        Ok(categories) => {
            println!(
                "✅ Content API reachable: project '{}', dataset '{}', {} categories.",
                config.sanity.project_id,
                config.sanity.dataset,
                categories.len()
            );
            if config.sanity.read_token.is_some() {
                if let Err(e) = public_helpers::fetch_all_categories(client, Perspective::Drafts).await {
                    eprintln!("❌ Error: Draft reads failed, check SANITY_API_READ_TOKEN: {}", e);
                    return ExitCode::FAILURE;
                }
                println!("✅ Draft reads authorized.");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("❌ Error: Content API check failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[actix_web::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::from_env(&cli.env_file) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    env_logger::init_from_env(env_logger::Env::new().default_filter_or(&config.log_level));
    for warning in config.warnings() {
        log::warn!("{}", warning);
    }

    let client = match ContentClient::from_config(&config.sanity) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("❌ Error: Failed to create the content client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match &cli.command {
        Commands::Paths { absolute } => print_paths(&client, &config.site_url, *absolute).await,
        Commands::Check => check(&client, &config).await,
    }
}
