use std::process::ExitCode;

use d_embed::open_file_for_append;
use d_embed::ClusterHarness;
use d_embed::EmbeddedRuntime;
use d_embed::Error;
use d_embed::LogOutput;
use d_embed::LoggingConfig;
use d_embed::Result;
use d_embed::Settings;
use tokio::signal::unix::signal;
use tokio::signal::unix::SignalKind;
use tokio::sync::watch;
use tracing::error;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;

#[tokio::main(flavor = "multi_thread", worker_threads = 4)]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("harness failed: {}", e);
            eprintln!("harness failed: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let settings = Settings::load(None)?;

    // Initializing Logs
    let _guards = init_observability(&settings.logging)?;

    // Initializing Shutdown Signal
    let (graceful_tx, graceful_rx) = watch::channel(());
    tokio::spawn(async move {
        if let Err(e) = graceful_shutdown(graceful_tx).await {
            error!("Failed to shutdown: {:?}", e);
        }
    });

    let runtime = EmbeddedRuntime::new(settings.network.clone());
    let harness = ClusterHarness::new(settings, runtime);
    info!("Bootstrapping cluster. Press CTRL+C to stop once verified.");
    harness.run(graceful_rx).await?;

    info!("Exiting program.");
    Ok(())
}

async fn graceful_shutdown(graceful_tx: watch::Sender<()>) -> Result<()> {
    let mut sigint = signal(SignalKind::interrupt()).map_err(|e| Error::Fatal(e.to_string()))?;
    let mut sigterm = signal(SignalKind::terminate()).map_err(|e| Error::Fatal(e.to_string()))?;
    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT detected.");
        },
        _ = sigterm.recv() => {
            info!("SIGTERM detected.");
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl+C detected.");
        },
    }

    graceful_tx.send(()).map_err(|e| {
        error!("Failed to send shutdown signal: {}", e);
        Error::Fatal(format!("Failed to send shutdown signal: {e}"))
    })?;

    Ok(())
}

/// One non-blocking fmt layer per configured output. The returned guards
/// must live as long as logging is needed.
pub fn init_observability(logging: &LoggingConfig) -> Result<Vec<WorkerGuard>> {
    let mut guards = Vec::new();
    let mut layers = Vec::new();

    for output in logging.log_outputs()? {
        let (non_blocking, guard) = match output {
            LogOutput::Default | LogOutput::Stdout => tracing_appender::non_blocking(std::io::stdout()),
            LogOutput::Stderr => tracing_appender::non_blocking(std::io::stderr()),
            LogOutput::File(path) => tracing_appender::non_blocking(open_file_for_append(&path)?),
        };
        guards.push(guard);
        layers.push(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .boxed(),
        );
    }

    let default_level = if logging.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry().with(layers).with(filter).init();

    Ok(guards)
}
