//! `pathrouter` service binary.
//!
//! Loads the YAML configuration, installs logging, mounts the built-in
//! inspection routes and serves them under the configured API prefix until
//! Ctrl-C.

use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use clap::Parser;
use serde_json::json;
use tracing::{info, warn};

use pathrouter::config::{Config, ConfigFileError};
use pathrouter::context::Context;
use pathrouter::gateway::Gateway;
use pathrouter::{Dispatcher, HandlerResult, Response, RouteTable, Server, StatusCode};

#[derive(Debug, Parser)]
#[command(name = "pathrouter", version, about = "Typed template path router")]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short = 'c', long = "conf", default_value = "pathrouter.yml")]
    conf: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let (config, missing) = match Config::load(&cli.conf) {
        Ok(config) => (config, None),
        Err(ConfigFileError::Io { path, source }) if source.kind() == std::io::ErrorKind::NotFound => {
            (Config::default(), Some(path))
        }
        Err(e) => return Err(e.into()),
    };

    let _log_guard = pathrouter::logging::init(&config.io)?;
    if let Some(path) = missing {
        warn!(path = %path.display(), "configuration file not found, using defaults");
    }

    let descriptions = Arc::new(OnceLock::new());
    let table = routes(Arc::clone(&descriptions))?;
    descriptions.get_or_init(|| table.describe());

    let dispatcher = Arc::new(Dispatcher::new(table, &config.webserver));
    dispatcher.log_routes();
    for route in dispatcher.table().describe() {
        info!("serving {}{route}", dispatcher.mount_url());
    }

    let server = Server::bind(config.webserver.bind_address()).await?;
    Gateway::new(dispatcher, &config.webserver)
        .serve_with_shutdown(server, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "cannot listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        })
        .await?;

    Ok(())
}

fn routes(descriptions: Arc<OnceLock<Vec<String>>>) -> Result<RouteTable, pathrouter::ConfigError> {
    let mut table = RouteTable::new();
    table.mount(
        "/routes",
        move |_ctx| {
            let descriptions = Arc::clone(&descriptions);
            async move { list_routes(&descriptions) }
        },
        ["GET"],
    )?;
    table.mount("/inspect/{name:str}", echo_args, ["GET"])?;
    table.mount("/inspect/int/{n:int64}", echo_args, ["GET"])?;
    table.mount("/inspect/float/{x:float64}", echo_args, ["GET"])?;
    table.mount("/inspect/uuid/{id:uuid4}", echo_args, ["GET"])?;
    Ok(table)
}

fn list_routes(descriptions: &OnceLock<Vec<String>>) -> HandlerResult {
    let routes = descriptions.get().map(Vec::as_slice).unwrap_or_default();
    Ok(Response::json(StatusCode::Ok, &json!({ "success": true, "routes": routes }))?)
}

async fn echo_args(ctx: Context) -> HandlerResult {
    let body = json!({
        "success": true,
        "template": ctx.template(),
        "args": ctx.args(),
    });
    Ok(Response::json(StatusCode::Ok, &body)?)
}
