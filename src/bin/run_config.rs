//! Demonstration binary: load a `Config` JSON file, run one scraping job
//! against an in-memory store, and print the job summary.
//!
//! Usage: `run-config <path-to-config.json>`

use std::sync::Arc;

use leadscout_core::core::{load_runtime_config, Config};
use leadscout_core::health_monitor::HealthMonitor;
use leadscout_core::http_client::HttpClient;
use leadscout_core::pipeline::{scrape_configuration, PipelineDeps};
use leadscout_core::progress_bus::ProgressBus;
use leadscout_core::store::memory::MemoryStore;
use uuid::Uuid;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let path = std::env::args().nth(1).unwrap_or_else(|| {
        eprintln!("usage: run-config <path-to-config.json>");
        std::process::exit(1);
    });

    let contents = std::fs::read_to_string(&path).unwrap_or_else(|e| {
        eprintln!("failed to read {path}: {e}");
        std::process::exit(1);
    });
    let config: Config = serde_json::from_str(&contents).unwrap_or_else(|e| {
        eprintln!("failed to parse {path}: {e}");
        std::process::exit(1);
    });

    let runtime_config = load_runtime_config();
    let store = MemoryStore::new();
    let user_id = Uuid::new_v4();
    store.register_user(user_id).await;

    let health = Arc::new(HealthMonitor::new(
        runtime_config.health_max_failures_before_disable,
        runtime_config.health_error_ring_capacity,
    ));

    if let Ok(probe_http) = HttpClient::new(&runtime_config) {
        health.clone().spawn_probe_loop(Arc::new(probe_http));
    }

    let deps = PipelineDeps {
        store: store.clone(),
        health,
        progress: Arc::new(ProgressBus::new()),
        runtime_config,
    };

    let job_id = Uuid::new_v4().to_string();
    match scrape_configuration(&deps, config, user_id, job_id).await {
        Ok(result) => {
            println!(
                "job {}: {} leads saved, {} errors, {} total results",
                result.job_id,
                result.saved_leads,
                result.errors.len(),
                result.total_results
            );
            for lead in &result.leads {
                println!("  - {} ({})", lead.title, lead.url);
            }
            for err in &result.errors {
                eprintln!("  ! {}: {}", err.source, err.error);
            }
        }
        Err(e) => {
            eprintln!("job failed: {e}");
            std::process::exit(1);
        }
    }
}
