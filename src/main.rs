use mediadl::{Config, MediaDownloader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mediadl=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let downloader = MediaDownloader::new(config)?;
    tracing::info!(
        address = %downloader.config().api.bind_address,
        download_dir = %downloader.download_root().display(),
        "mediadl starting"
    );

    mediadl::run_with_shutdown(downloader).await?;
    Ok(())
}
