use crate::{Config, publisher::PublisherBackendConfig};
use std::path::Path;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum StartupCheckError {
    #[error("Failed to create staging directory: {0}")]
    StagingDirectoryCreationFailed(#[from] std::io::Error),

    #[error("Static files directory does not exist")]
    StaticDirectoryMissing,

    #[error("Templates directory does not exist")]
    TemplatesDirectoryMissing,

    #[error("git binary is not available: {0}")]
    GitBinaryMissing(String),
}

pub async fn perform_startup_checks(config: &Config) -> Result<(), Vec<StartupCheckError>> {
    let mut errors = Vec::new();

    info!("Performing startup checks...");

    // Staging directories are created on demand too, but creating them here
    // surfaces permission problems before the first submission
    for staging_dir in [
        &config.submission.posts_directory,
        &config.submission.images_directory,
    ] {
        if staging_dir.exists() {
            info!("Staging directory exists: {:?}", staging_dir);
            continue;
        }
        info!("Creating staging directory: {:?}", staging_dir);
        if let Err(e) = tokio::fs::create_dir_all(staging_dir).await {
            error!("Failed to create staging directory {:?}: {}", staging_dir, e);
            errors.push(StartupCheckError::StagingDirectoryCreationFailed(e));
        }
    }

    let static_dir = Path::new(&config.static_files.directory);
    if !static_dir.exists() {
        warn!("Static files directory does not exist: {:?}", static_dir);
        errors.push(StartupCheckError::StaticDirectoryMissing);
    } else {
        info!("Static files directory exists: {:?}", static_dir);
    }

    let templates_dir = Path::new(&config.templates.directory);
    if !templates_dir.exists() {
        warn!("Templates directory does not exist: {:?}", templates_dir);
        errors.push(StartupCheckError::TemplatesDirectoryMissing);
    } else {
        info!("Templates directory exists: {:?}", templates_dir);
    }

    if let PublisherBackendConfig::Git(git_config) = &config.publisher.backend {
        match tokio::process::Command::new("git")
            .arg("--version")
            .output()
            .await
        {
            Ok(output) if output.status.success() => {
                info!(
                    "git binary available: {}",
                    String::from_utf8_lossy(&output.stdout).trim()
                );
            }
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                error!("git --version failed: {}", stderr);
                errors.push(StartupCheckError::GitBinaryMissing(stderr));
            }
            Err(e) => {
                error!("git binary not found: {}", e);
                errors.push(StartupCheckError::GitBinaryMissing(e.to_string()));
            }
        }

        // Publishes fail fast without the credential; the operator may
        // still set it after startup, so this is only a warning
        if std::env::var(&git_config.token_env).is_err() {
            warn!(
                "Publish credential {} is not set; publishes will fail until it is",
                git_config.token_env
            );
        } else {
            info!("Publish credential {} is present", git_config.token_env);
        }
    }

    if errors.is_empty() {
        info!("All startup checks passed");
        Ok(())
    } else {
        error!("Startup checks failed with {} errors", errors.len());
        Err(errors)
    }
}
