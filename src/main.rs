use clap::{Parser, Subcommand};
use obs_sr_view::config::{
    sanitize_api_url, ObsClientConfig, RenderOptions, Theme, DEFAULT_API_URL,
    DEFAULT_STYLESHEET_URL,
};
use obs_sr_view::error::AppError;
use obs_sr_view::server::{self, AppState};
use obs_sr_view::services::obs_client::{validate_request_id, ObsClient};
use obs_sr_view::services::renderer::Renderer;
use obs_sr_view::services::{credentials, pipeline};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "srview",
    version,
    about = "Fetch and render OBS submit request data"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch a request and write it to <output-dir>/<id>.html
    Run {
        /// OBS request id
        request_id: String,

        /// OBS API base URL
        #[arg(short = 'A', long, default_value = DEFAULT_API_URL)]
        api_url: String,

        /// Page color theme
        #[arg(short, long, value_enum, default_value_t = Theme::Light)]
        theme: Theme,

        /// Stylesheet URL injected into the page
        #[arg(long, default_value = DEFAULT_STYLESHEET_URL)]
        stylesheet_url: String,

        /// Directory the rendered page is written to
        #[arg(long, default_value = "output")]
        output_dir: PathBuf,
    },

    /// Serve request pages over HTTP
    Serve {
        /// OBS API base URL
        #[arg(short = 'A', long, default_value = DEFAULT_API_URL)]
        api_url: String,

        /// Default page color theme (per-request `?theme=` overrides it)
        #[arg(short, long, value_enum, default_value_t = Theme::Light)]
        theme: Theme,

        /// Stylesheet URL injected into pages
        #[arg(long, default_value = DEFAULT_STYLESHEET_URL)]
        stylesheet_url: String,

        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:8000")]
        listen: SocketAddr,
    },
}

/// Build the one immutable client handle every fetch goes through.
fn build_client(api_url: &str) -> Result<(ObsClient, ObsClientConfig), AppError> {
    let config = ObsClientConfig {
        api_url: sanitize_api_url(api_url),
        ..Default::default()
    };
    let creds = credentials::load(&config.api_url)?;
    let client = ObsClient::new(config.clone(), creds)?;
    Ok((client, config))
}

async fn run(cli: Cli) -> Result<(), AppError> {
    match cli.command {
        Command::Run {
            request_id,
            api_url,
            theme,
            stylesheet_url,
            output_dir,
        } => {
            validate_request_id(&request_id)?;
            let (client, config) = build_client(&api_url)?;
            let options = RenderOptions {
                theme,
                stylesheet_url,
            };

            let path = pipeline::render_to_file(
                &client,
                &options,
                config.web_base_url(),
                &output_dir,
                &request_id,
            )
            .await?;
            println!("{}", path.display());
        }

        Command::Serve {
            api_url,
            theme,
            stylesheet_url,
            listen,
        } => {
            let (client, config) = build_client(&api_url)?;
            let state = AppState {
                source: Arc::new(client),
                renderer: Arc::new(Renderer::new()?),
                options: RenderOptions {
                    theme,
                    stylesheet_url,
                },
                web_base_url: config.web_base_url().to_string(),
            };
            server::serve(state, listen).await?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        eprintln!("srview: {}", err);
        std::process::exit(1);
    }
}
