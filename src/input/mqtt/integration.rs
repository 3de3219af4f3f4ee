//! MQTT integration orchestrator.
//!
//! Keeps MQTT internals out of main.rs: connects, subscribes to the bridge
//! topics and feeds every message through a [`BridgeRouter`].

use super::client::{MqttClient, MqttMessage, Publisher};
use super::router::BridgeRouter;
use crate::config::{Config, MqttConfig};
use crate::definition::DefinitionRegistry;
use chrono::Utc;
use log::{info, warn};
use rumqttc::QoS;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

pub struct MqttIntegration {
    config: MqttConfig,
    router: BridgeRouter,
}

impl MqttIntegration {
    pub fn new(config: &Config, registry: Arc<DefinitionRegistry>) -> Self {
        Self {
            config: config.mqtt.clone(),
            router: BridgeRouter::new(
                config.bridge.base_topic.clone(),
                registry,
                Arc::new(config.reporting_defaults()),
            ),
        }
    }

    /// Start the MQTT integration.
    ///
    /// Spawns a background task that connects to the broker, subscribes to
    /// the bridge topics and routes messages. Returns a JoinHandle that can
    /// be used to abort the task on shutdown.
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    async fn run(mut self) {
        info!(
            "[MQTT] Connecting to {}:{}",
            self.config.broker_host, self.config.broker_port
        );

        let mqtt_client = MqttClient::new(&self.config);
        let client = mqtt_client.client();

        let (msg_tx, mut msg_rx) = mpsc::channel::<MqttMessage>(64);
        let (connected_tx, connected_rx) = oneshot::channel();

        // Start the event loop first so it can establish the connection
        let mqtt_loop = tokio::spawn(async move {
            mqtt_client.run(msg_tx, Some(connected_tx)).await;
        });

        match tokio::time::timeout(Duration::from_secs(10), connected_rx).await {
            Ok(Ok(())) => {
                info!("[MQTT] Connection established, subscribing to topics");
            }
            Ok(Err(_)) => {
                warn!("[MQTT] Connection signal channel dropped");
                return;
            }
            Err(_) => {
                warn!("[MQTT] Connection timeout after 10 seconds");
                mqtt_loop.abort();
                return;
            }
        }

        for topic in self.router.subscriptions() {
            if let Err(e) = client.subscribe(&topic, QoS::AtLeastOnce).await {
                warn!("[MQTT] Failed to subscribe to {}: {:?}", topic, e);
            }
        }

        info!("[MQTT] Bridge started");

        while let Some(msg) = msg_rx.recv().await {
            dispatch(&mut self.router, &client, &msg).await;
        }

        mqtt_loop.abort();
    }
}

/// Route one message and publish everything it produces.
async fn dispatch(router: &mut BridgeRouter, publisher: &dyn Publisher, msg: &MqttMessage) {
    for out in router.handle(&msg.topic, &msg.payload, Utc::now()) {
        if let Err(e) = publisher.publish(&out.topic, &out.payload).await {
            warn!("[MQTT] Failed to publish to {}: {}", out.topic, e);
        }
    }
}
