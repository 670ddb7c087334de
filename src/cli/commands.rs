//! CLI commands for the node
//!
//! Implements the command handlers behind the binary's subcommands.

use crate::api::{create_router, ApiState, CommandDispatcher};
use crate::config::NodeConfig;
use crate::crypto::ProgramHash;
use crate::ledger::MemoryChain;
use std::path::Path;
use std::sync::Arc;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Load the configuration, applying a port override
pub fn load_config(path: Option<&Path>, port: Option<u16>) -> CliResult<NodeConfig> {
    let mut config = NodeConfig::load(path)?;
    if let Some(port) = port {
        config.rpc_port = port;
    }
    Ok(config)
}

/// Logger that passes every record, leaving `log::set_max_level` as the only
/// filter so that `setloglevel` can raise or lower verbosity at runtime
pub fn logger_builder() -> env_logger::Builder {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(log::LevelFilter::Trace);
    builder
}

/// Install the logger at the level from `RUST_LOG` or the configuration
pub fn init_logging(config: &NodeConfig) -> CliResult<()> {
    logger_builder().try_init()?;
    let rust_log = std::env::var("RUST_LOG").ok();
    log::set_max_level(config.log_filter(rust_log.as_deref()));
    Ok(())
}

/// Reward address of the development mining service
fn miner_program_hash(config: &NodeConfig) -> CliResult<ProgramHash> {
    match &config.miner_address {
        Some(address) => Ok(ProgramHash::from_address(address)?),
        None => Ok(ProgramHash::default()),
    }
}

/// Dispatcher over a fresh in-memory development chain
pub fn devnet_dispatcher(config: NodeConfig) -> CliResult<CommandDispatcher> {
    let chain = Arc::new(MemoryChain::with_bits(
        miner_program_hash(&config)?,
        config.pow_limit_bits,
    ));
    let state = ApiState::new(
        chain.clone(),
        chain.clone(),
        chain.clone(),
        Some(chain),
        config,
    );
    Ok(CommandDispatcher::new(state))
}

/// Serve the command surface until interrupted
pub fn cmd_serve(config: NodeConfig) -> CliResult<()> {
    let addr = format!("0.0.0.0:{}", config.rpc_port);
    let dispatcher = Arc::new(devnet_dispatcher(config)?);
    let commands = dispatcher.commands();
    let app = create_router(dispatcher);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        log::info!("Serving {} commands on http://{}", commands.len(), addr);
        println!("🚀 Command server listening on http://{}", addr);
        println!("   POST /        - {{\"method\": ..., \"params\": {{...}}}}");
        println!("   GET  /health  - Health check");

        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                tokio::signal::ctrl_c().await.ok();
                println!("\n📴 Shutting down command server...");
            })
            .await?;
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}

/// Print the effective configuration as JSON
pub fn cmd_show_config(config: &NodeConfig) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Params;
    use crate::ledger::memory::tests::test_miner;
    use serde_json::json;

    #[test]
    fn test_port_override() {
        let config = load_config(None, Some(30336)).unwrap();
        assert_eq!(config.rpc_port, 30336);
        assert_eq!(load_config(None, None).unwrap().rpc_port, 20606);
    }

    #[test]
    fn test_devnet_dispatcher_pays_configured_miner() {
        let config = NodeConfig {
            miner_address: Some(test_miner().to_address()),
            ..NodeConfig::default()
        };
        let dispatcher = devnet_dispatcher(config).unwrap();
        let mined = dispatcher.dispatch(
            "discretemining",
            &Params::from_value(json!({"count": 1})).unwrap(),
        );
        assert!(mined.is_success());

        let balance = dispatcher.dispatch(
            "getbalancebyaddr",
            &Params::from_value(json!({"addr": test_miner().to_address()})).unwrap(),
        );
        assert_eq!(balance.result, json!("3.5"));
    }

    #[test]
    fn test_bad_miner_address() {
        let config = NodeConfig {
            miner_address: Some("nope".into()),
            ..NodeConfig::default()
        };
        assert!(devnet_dispatcher(config).is_err());
    }
}
