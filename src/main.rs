use std::sync::Arc;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use helpdesk_assist::config::{ServerConfig, StoreBackend};
use helpdesk_assist::knowledge::{KnowledgeBase, ToolMetrics};
use helpdesk_assist::onboarding::OnboardingManager;
use helpdesk_assist::server::{self, AppState, FEATURES};
use helpdesk_assist::store::{JsonFileBackend, LibSqlBackend, MemoryBackend, ProgressBackend};
use helpdesk_assist::tools::ToolRegistry;

/// Console logging, plus a daily rolling file when a log dir is configured.
/// The returned guard must live until exit so buffered lines are flushed.
fn init_tracing(config: &ServerConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let console = tracing_subscriber::fmt::layer().with_target(false);

    match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "helpdesk-assist.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(console)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_target(false)
                        .with_ansi(false)
                        .with_writer(writer),
                )
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(console)
                .init();
            None
        }
    }
}

async fn open_store(config: &ServerConfig) -> anyhow::Result<Arc<dyn ProgressBackend>> {
    let backend: Arc<dyn ProgressBackend> = match (config.store, &config.db_path) {
        (StoreBackend::Memory, _) => Arc::new(MemoryBackend::new()),
        (StoreBackend::Json, Some(path)) => Arc::new(JsonFileBackend::new(path)),
        (StoreBackend::LibSql, Some(path)) => Arc::new(
            LibSqlBackend::new_local(path)
                .await
                .with_context(|| format!("failed to open database at {}", path.display()))?,
        ),
        (_, None) => anyhow::bail!("store {:?} needs HELPDESK_DB_PATH", config.store),
    };
    Ok(backend)
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => {}
                    _ = tokio::signal::ctrl_c() => {}
                }
            }
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env()?;
    let _log_guard = init_tracing(&config);

    let backend = open_store(&config).await?;
    let manager = Arc::new(OnboardingManager::new(backend));

    let metrics = Arc::new(ToolMetrics::default());
    let knowledge = Arc::new(KnowledgeBase::new(&config.data_dir, Arc::clone(&metrics)));

    let mut tools = ToolRegistry::new();
    tools.register_onboarding_tools(Arc::clone(&manager));
    tools.register_knowledge_tools(knowledge);
    let tools = Arc::new(tools);

    let feature_list: Vec<&str> = FEATURES.iter().map(|(name, _)| *name).collect();
    eprintln!("🚀 Helpdesk Assist v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Listening: http://{}", config.bind_addr());
    eprintln!("   Store: {}", manager.backend_name());
    if let Some(path) = &config.db_path {
        eprintln!("   Store file: {}", path.display());
    }
    eprintln!("   Data dir: {}", config.data_dir.display());
    eprintln!("   Tools: {}", tools.count());
    eprintln!("📋 Available features: {}", feature_list.join(", "));

    let app = server::router(AppState {
        manager,
        tools,
        metrics,
    });

    let listener = tokio::net::TcpListener::bind(config.bind_addr())
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr()))?;
    tracing::info!(addr = %config.bind_addr(), "Helpdesk server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server failed")?;

    Ok(())
}
