//! The `zeroshot serve` command.

use std::sync::Arc;

use clap::{Args, ValueEnum};
use zeroshot_core::service::{self, AppState, ServiceInfo};
use zeroshot_core::{ClassifierFactory, Config, Predictor};

/// Classifier backends selectable from the command line.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Backend {
    /// Local NLI model on ONNX Runtime
    Onnx,
    /// Hosted inference API
    Remote,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::Onnx => write!(f, "onnx"),
            Backend::Remote => write!(f, "remote"),
        }
    }
}

/// Classifier lifecycle policies.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum LoadPolicy {
    /// Load once, reuse for every request
    Shared,
    /// Load a fresh classifier for every request
    PerRequest,
}

impl std::fmt::Display for LoadPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadPolicy::Shared => write!(f, "shared"),
            LoadPolicy::PerRequest => write!(f, "per_request"),
        }
    }
}

/// Arguments for the `serve` command.
#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Interface to bind (overrides server.host)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on (overrides server.port)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Classifier backend (overrides inference.backend)
    #[arg(long, value_enum)]
    pub backend: Option<Backend>,

    /// Classifier lifecycle (overrides inference.load_policy)
    #[arg(long, value_enum)]
    pub load_policy: Option<LoadPolicy>,

    /// Load the classifier before accepting requests (shared policy only)
    #[arg(long)]
    pub preload: bool,
}

/// Apply command-line overrides on top of the loaded config.
pub fn apply_overrides(args: &ServeArgs, config: &mut Config) -> anyhow::Result<()> {
    if let Some(host) = &args.host {
        config.server.host = host.clone();
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(backend) = args.backend {
        config.inference.backend = backend.to_string();
    }
    if let Some(policy) = args.load_policy {
        config.inference.load_policy = policy.to_string();
    }
    config.validate()?;
    Ok(())
}

/// Execute the serve command.
pub async fn execute(args: ServeArgs, mut config: Config) -> anyhow::Result<()> {
    apply_overrides(&args, &mut config)?;

    let source = ClassifierFactory::create(&config)?;
    if args.preload {
        if source.policy() == "shared" {
            // A failed preload is not fatal; requests retry the load.
            if let Err(e) = source.acquire().await {
                tracing::warn!("Preload failed: {e}");
            }
        } else {
            tracing::warn!("--preload has no effect with the per_request policy");
        }
    }

    let info = ServiceInfo::from_config(&config);
    tracing::info!(
        "Backend: {} ({}), load policy: {}",
        info.backend,
        info.model,
        info.load_policy
    );

    let state = AppState::new(Arc::new(Predictor::new(source)), info);
    let app = service::router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind {addr}: {e}"))?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
