//! Get command - route one request through the cache

use super::WorkerContext;
use crate::cli::args::GetArgs;
use crate::config::Config;
use crate::error::{AssetSyncError, AssetSyncResult};
use crate::network::{FetchRequest, Fetcher};
use crate::resource::{Method, Request, Response};
use console::style;
use std::io::Write;
use tracing::info;

/// Execute the get command
pub async fn execute(args: GetArgs, config: &Config) -> AssetSyncResult<()> {
    let ctx = WorkerContext::open(config).await?;
    let Ok(method) = args.method.parse::<Method>();
    let request = Request::new(method.clone(), args.url.clone());

    let response = match ctx.worker.router().route(&request) {
        Some(route) => {
            info!("{} {} ({:?})", method, route.key, route.policy);
            ctx.worker.router().respond(&route).await?
        }
        None if method == Method::Get => {
            info!("Passing {} through to the network", args.url);
            ctx.fetcher.fetch(&FetchRequest::new(&args.url)).await?
        }
        None => {
            eprintln!(
                "{} {} requests are not handled by the cache",
                style("→").cyan(),
                method
            );
            return Ok(());
        }
    };

    write_body(&response, args.output.as_deref()).await
}

async fn write_body(response: &Response, output: Option<&std::path::Path>) -> AssetSyncResult<()> {
    if !response.is_ok() {
        eprintln!("{} HTTP {}", style("⚠").yellow(), response.status);
    }

    match output {
        Some(path) => {
            tokio::fs::write(path, &response.body)
                .await
                .map_err(|e| AssetSyncError::io(format!("writing {}", path.display()), e))?;
            eprintln!(
                "{} Wrote {} byte(s) to {}",
                style("✓").green(),
                response.body.len(),
                path.display()
            );
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(&response.body)
                .and_then(|_| stdout.flush())
                .map_err(|e| AssetSyncError::io("writing response to stdout", e))?;
        }
    }

    Ok(())
}
