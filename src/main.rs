use log::{error, info};
use std::sync::Arc;
use tokio::signal;
use zigbee_capability_bridge::catalog;
use zigbee_capability_bridge::config::{self, Config};
use zigbee_capability_bridge::input::mqtt::MqttIntegration;

fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

fn main() {
    // Load .env file before the runtime spawns its worker threads
    config::load_dotenv();
    init_logger();

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to start async runtime: {}", e);
            std::process::exit(1);
        }
    };
    runtime.block_on(run());
}

async fn run() {
    info!("Starting Zigbee capability bridge");

    let config = Config::from_env();
    info!("Configuration loaded:");
    info!(
        "  MQTT broker: {}:{}",
        config.mqtt.broker_host, config.mqtt.broker_port
    );
    info!("  Base topic: {}", config.bridge.base_topic);
    info!(
        "  Reporting: {}s..{}s, change {}",
        config.reporting.min_interval,
        config.reporting.max_interval,
        config.reporting.reportable_change
    );

    let registry = match catalog::registry() {
        Ok(registry) => Arc::new(registry),
        Err(e) => {
            error!("Failed to build device catalog: {}", e);
            std::process::exit(1);
        }
    };
    info!("{} device models registered", registry.len());

    let mqtt_task = MqttIntegration::new(&config, registry).start();

    info!("Bridge is running, press Ctrl+C to exit");

    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Received shutdown signal");
        }
        Err(e) => {
            error!("Failed to listen for shutdown signal: {}", e);
        }
    }

    mqtt_task.abort();
    info!("Zigbee capability bridge stopped");
}
