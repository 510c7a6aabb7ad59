//! Module host (v1)
//!
//! Runs the echo component as a module.
//!
//! # Architecture Overview
//!
//! ```text
//!     args ──▶ config (defaults ◀ file ◀ env ◀ flags)
//!                 │
//!                 ▼
//!              graph ──▶ logger, listener, credentials, server, clients
//!                 │
//!                 ▼
//!            services ──▶ module.ModuleService, echo.EchoService
//!                 │
//!                 ▼
//!     heartbeat (every interval) ──▶ registry
//!                 │
//!     SIGINT/SIGTERM ──▶ stop heartbeat ──▶ drain server ──▶ release graph
//! ```
//!
//! # Usage
//!
//! ```text
//! module-host [-c config.toml] [--name NAME] [-l ADDR] [--heartbeat-interval SECS]
//! ```

use std::process::ExitCode;

use module_host::echo::EchoComponent;
use module_host::lifecycle::wait_for_shutdown_signal;
use module_host::Component;

#[tokio::main]
async fn main() -> ExitCode {
    let module = EchoComponent::new().new_module(std::env::args().skip(1));

    match module.run(wait_for_shutdown_signal()).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("module-host: {e}");
            ExitCode::FAILURE
        }
    }
}
