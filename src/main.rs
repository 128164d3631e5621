use icm20948_movement_sensor::config::config_dir;
use icm20948_movement_sensor::{init_tracing, run_movement_sensor};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG=debug for per-transaction logging, RUST_LOG=trace for bus traffic
    init_tracing();

    let config_path = config_dir();
    tracing::info!("[main] configuration path: {}", config_path);

    run_movement_sensor(&config_path).await
}
