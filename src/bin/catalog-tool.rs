//! Inspect the built-in device catalog.
//!
//! Usage:
//!   cargo run --bin catalog-tool -- models
//!   cargo run --bin catalog-tool -- exposes POK001
//!   cargo run --bin catalog-tool -- decode POK014 --cluster msTemperatureMeasurement --payload '{"0":2350,"61441":4}'
//!   cargo run --bin catalog-tool -- encode POK001 stall_time 30 --configure

use clap::{Parser, Subcommand};
use log::warn;
use serde::Serialize;
use std::sync::Arc;
use zigbee_capability_bridge::catalog;
use zigbee_capability_bridge::config::{self, Config};
use zigbee_capability_bridge::converter::ReportingDefaults;
use zigbee_capability_bridge::definition::{DefinitionRegistry, DeviceDefinition};
use zigbee_capability_bridge::error::{BridgeError, Result};
use zigbee_capability_bridge::zcl::{AttributePayload, Cluster, InboundEvent, MessageKind, parse_u16};

#[derive(Parser)]
#[command(name = "catalog-tool")]
#[command(about = "Inspect device definitions and run their converters")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every definition
    Models,
    /// Print the schema of a model
    Exposes { model: String },
    /// Print the decode dispatch table of a model
    Routes { model: String },
    /// Decode one attribute message
    Decode {
        model: String,

        /// Cluster name or id
        #[arg(long, value_parser = parse_cluster)]
        cluster: Cluster,

        /// Primary attribute id (defaults to the lowest id in the payload)
        #[arg(long, value_parser = parse_attribute)]
        attribute: Option<u16>,

        /// attributeReport, readResponse or writeEcho
        #[arg(long, default_value = "attributeReport")]
        kind: MessageKind,

        /// JSON object of attribute id to raw value
        #[arg(long)]
        payload: String,
    },
    /// Encode a command for one capability
    Encode {
        model: String,
        name: String,

        /// JSON value, e.g. 30 or '"ON"'
        value: String,

        /// Treat as first-time configuration and append report subscriptions
        #[arg(long)]
        configure: bool,
    },
}

fn parse_cluster(s: &str) -> std::result::Result<Cluster, String> {
    Cluster::parse(s).map_err(|e| e.to_string())
}

fn parse_attribute(s: &str) -> std::result::Result<u16, String> {
    parse_u16(s).ok_or_else(|| format!("invalid attribute id: {}", s))
}

/// Find a definition by device model id or by definition name.
fn find(registry: &DefinitionRegistry, model: &str) -> Result<Arc<DeviceDefinition>> {
    registry
        .lookup(model)
        .or_else(|| {
            registry
                .definitions()
                .into_iter()
                .find(|d| d.model() == model)
        })
        .ok_or_else(|| BridgeError::UnknownModel(model.to_string()))
}

fn print<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let registry = catalog::registry()?;

    match cli.command {
        Commands::Models => {
            let identities: Vec<_> = registry
                .definitions()
                .iter()
                .map(|d| d.identity().clone())
                .collect();
            print(&identities)
        }
        Commands::Exposes { model } => {
            let definition = find(&registry, &model)?;
            let exposes: Vec<_> = definition.exposes().collect();
            print(&exposes)
        }
        Commands::Routes { model } => print(&find(&registry, &model)?.routes()),
        Commands::Decode {
            model,
            cluster,
            attribute,
            kind,
            payload,
        } => {
            let definition = find(&registry, &model)?;
            let payload: AttributePayload = serde_json::from_str(&payload)?;
            let mut event = InboundEvent::new(cluster, kind, payload);
            if let Some(attribute) = attribute {
                event.attribute = attribute;
            }

            let outcome = definition.decode_with_errors(&event);
            for e in &outcome.errors {
                warn!("{}", e);
            }
            print(&outcome.state)
        }
        Commands::Encode {
            model,
            name,
            value,
            configure,
        } => {
            let definition = find(&registry, &model)?;
            let value: serde_json::Value = serde_json::from_str(&value)?;
            let reporting = Config::from_env().reporting_defaults();
            let defaults: &dyn ReportingDefaults = &reporting;
            let operations = definition.encode(&name, &value, configure.then_some(defaults))?;
            print(&operations)
        }
    }
}

fn main() {
    config::load_dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
