// src/main.rs

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use onchain_agent_server::{
    agent::{initialize_agent, Dispatcher},
    api::create_router,
    config::Config,
    console::{run_autonomous_mode, run_chat_mode},
    AppState,
};
use tokio::io::{self, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Http,
    Chat,
    Auto,
}

fn select_mode() -> Mode {
    let args: Vec<String> = env::args().collect();
    if args.iter().any(|a| a == "--chat") {
        return Mode::Chat;
    }
    if args.iter().any(|a| a == "--auto") {
        return Mode::Auto;
    }
    match env::var("AGENT_MODE").map(|m| m.to_ascii_lowercase()) {
        Ok(m) if m == "chat" => Mode::Chat,
        Ok(m) if m == "auto" => Mode::Auto,
        Ok(m) if m != "http" => {
            warn!("Unknown AGENT_MODE '{}', falling back to http", m);
            Mode::Http
        }
        _ => Mode::Http,
    }
}

// --- HTTP Server Logic ---
async fn run_http_server(config: Config) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    let addr = listener.local_addr()?;
    let state = AppState::new(config);

    // Requests are answered with 503 until this finishes.
    let init_state = state.clone();
    tokio::spawn(async move {
        match initialize_agent(&init_state.config).await {
            Ok(dispatcher) => {
                if let Err(e) = init_state.install_agent(dispatcher) {
                    error!("❌ {}", e);
                } else {
                    info!("✅ Agent system initialized");
                }
            }
            Err(e) => error!("❌ Failed to initialize agent system: {:#}", e),
        }
    });

    let app = create_router(state);

    info!("🚀 HTTP Server listening on {}", addr);
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;
    Ok(())
}

// --- Console Logic ---
async fn run_console(config: Config, mode: Mode) -> anyhow::Result<()> {
    let dispatcher: Dispatcher = initialize_agent(&config).await?;
    let stdin = BufReader::new(io::stdin());
    let stdout = io::stdout();

    let session = async {
        match mode {
            Mode::Auto => {
                let interval = Duration::from_secs(config.autonomous_interval_secs);
                run_autonomous_mode(&dispatcher, interval, None, stdout).await
            }
            _ => run_chat_mode(&dispatcher, "console", stdin, stdout).await,
        }
    };

    tokio::select! {
        result = session => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Goodbye Agent!");
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "onchain_agent_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("❌ Failed to load configuration: {:#}", e);
            std::process::exit(1);
        }
    };
    info!("Loaded configuration: {:?}", config);

    let result = match select_mode() {
        Mode::Http => run_http_server(config).await,
        mode => run_console(config, mode).await,
    };

    if let Err(e) = result {
        error!("❌ {:#}", e);
        std::process::exit(1);
    }
}
