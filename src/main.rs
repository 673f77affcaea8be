use std::sync::Arc;

use anyhow::Context;

use chatbatch::client::{Client, DownloaderClient, HttpClient, HttpClientConfig, LoggingClient};
use chatbatch::config::BatchConfig;
use chatbatch::credentials;
use chatbatch::reader;
use chatbatch::service::BatchService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let mut config = BatchConfig::from_env();
    config.validate().context("invalid configuration")?;

    let access_token = credentials::load_access_token(config.credentials.as_deref())
        .context("failed to load credentials")?;

    eprintln!("chatbatch v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Chat URL: {}", config.chat_url);
    eprintln!("   Model: {}", config.model);
    eprintln!("   Input: {}", config.input.display());
    eprintln!("   Output: {}", config.output.display());
    eprintln!("   Concurrency: {}", config.concurrency);
    eprintln!("   Resume: {}\n", config.resume);

    let jobs = reader::load_jobs(&config.input, config.resume)
        .await
        .context("failed to load input jobs")?;

    // Remote capability: HTTP transport wrapped with logging and, when
    // enabled, background downloads of generated files.
    let transport: Arc<dyn Client> = Arc::new(HttpClient::new(HttpClientConfig {
        chat_url: config.chat_url.clone(),
        upload_url: config.upload_url.clone(),
        access_token,
    }));
    let logged: Arc<dyn Client> = Arc::new(LoggingClient::new(transport));
    let client: Arc<dyn Client> = Arc::new(DownloaderClient::new(
        logged,
        config.enable_download,
        config
            .download_dir
            .clone()
            .unwrap_or_else(|| ".".into()),
        config.download_prefix.clone(),
    ));

    let grace = config.shutdown_grace;
    let service = BatchService::new(config, client, jobs);
    service.open().await?;
    service.done().await;
    service
        .close(grace)
        .await
        .context("failed to close batch run")?;

    let progress = service.progress();
    eprintln!(
        "\nDone: {} succeeded, {} failed, {} total",
        progress.success, progress.failed, progress.total
    );
    Ok(())
}
