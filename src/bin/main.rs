use clap::Parser;
use sector_enricher::{
    cache::JsonFileCacheStore,
    cli::Args,
    config::ApiConfig,
    llm::OpenAiClient,
    runner::Runner,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    // Credentials first: nothing runs without them
    let api = ApiConfig::from_env()?;

    let model = OpenAiClient::new(api.api_key, args.model.as_str())?.with_base_url(api.base_url);
    let cache_store = JsonFileCacheStore::new(&args.cache);

    info!(
        model = %args.model,
        cache = %args.cache.display(),
        "Sector enricher starting"
    );

    let runner = Runner::new(Box::new(model), Box::new(cache_store), args.run_config());

    match runner.run().await {
        Ok(report) => {
            info!(
                rows = report.rows,
                fallback = report.stats.fallback,
                cache = %report.cache_location,
                "Run finished"
            );
            println!("Wrote: {}", report.out_csv.display());
            println!("Wrote: {}", report.out_summary.display());
            Ok(())
        }
        Err(e) => {
            eprintln!("Enrichment failed: {}", e);
            Err(Box::new(e) as Box<dyn std::error::Error>)
        }
    }
}
