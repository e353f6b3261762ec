//! Manifest command - fingerprint a build directory into a bundle

use crate::cli::args::ManifestArgs;
use crate::error::{AssetSyncError, AssetSyncResult};
use crate::manifest::{Bundle, ResourceManifest, ShellSet};
use console::style;

/// Execute the manifest command
pub async fn execute(args: ManifestArgs) -> AssetSyncResult<()> {
    if !args.dir.is_dir() {
        return Err(AssetSyncError::User(format!(
            "Not a directory: {}",
            args.dir.display()
        )));
    }

    let dir = args.dir.clone();
    let resources = tokio::task::spawn_blocking(move || ResourceManifest::from_dir(&dir))
        .await
        .map_err(|e| AssetSyncError::Internal(format!("fingerprint task failed: {}", e)))??;

    let shell = ShellSet::new(args.shell.iter().map(|s| s.trim()).filter(|s| !s.is_empty()));
    let bundle = Bundle::new(resources, shell)?;

    match args.output {
        Some(path) => {
            bundle.save(&path).await?;
            eprintln!(
                "{} Wrote {} resource(s), {} shell, to {}",
                style("✓").green(),
                bundle.resources.len(),
                bundle.shell.len(),
                path.display()
            );
        }
        None => println!("{}", serde_json::to_string_pretty(&bundle)?),
    }

    Ok(())
}
