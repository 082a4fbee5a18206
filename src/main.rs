use cluster_dashboard::{api, config::Config, logging, metrics};

#[tokio::main]
async fn main() {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = logging::init_logger(config.log_format) {
        eprintln!("{e}");
        std::process::exit(1);
    }

    metrics::init_metrics();

    if let Err(e) = api::start_server(config).await {
        tracing::error!("Dashboard service failed: {}", e);
        std::process::exit(1);
    }
}
