use crate::publisher::{GitBackendConfig, PublishError, Publisher};
use crate::submission::StagedPost;
use async_trait::async_trait;
use base64::{Engine, engine::general_purpose};
use std::path::Path;
use tokio::sync::Mutex;
use tracing::{debug, info};
use url::Url;

/// Publishes by re-cloning the content repository into a request-scoped
/// temporary directory, copying the staged files in, committing, and
/// pushing to the remote's default branch.
///
/// Publishes are serialized through a mutex; the working clone is removed
/// when the publish ends, on the failure path as well.
#[derive(Debug)]
pub struct GitPublisher {
    config: GitBackendConfig,
    http_remote: bool,
    publish_lock: Mutex<()>,
}

impl GitPublisher {
    pub fn new(config: GitBackendConfig) -> Result<Self, PublishError> {
        let http_remote = match Url::parse(&config.repository_url) {
            Ok(url) => matches!(url.scheme(), "http" | "https"),
            Err(source) => {
                // Local paths and scp-style ssh remotes are not URLs but
                // are valid clone sources
                let looks_like_path = config.repository_url.starts_with('/')
                    || config.repository_url.starts_with('.');
                let looks_like_scp = config.repository_url.contains('@')
                    && config.repository_url.contains(':');
                if looks_like_path || looks_like_scp {
                    false
                } else {
                    return Err(PublishError::InvalidRepoUrl {
                        url: config.repository_url.clone(),
                        source,
                    });
                }
            }
        };

        Ok(Self {
            config,
            http_remote,
            publish_lock: Mutex::new(()),
        })
    }

    /// Environment for every git invocation of one publish. The credential
    /// never appears in the clone URL or in argv: for http(s) remotes it
    /// travels as an Authorization header injected through GIT_CONFIG_*.
    fn git_env(&self, token: &str) -> Vec<(String, String)> {
        let mut env = vec![("GIT_TERMINAL_PROMPT".to_string(), "0".to_string())];

        if self.http_remote {
            let basic =
                general_purpose::STANDARD.encode(format!("x-access-token:{}", token));
            env.push(("GIT_CONFIG_COUNT".to_string(), "1".to_string()));
            env.push(("GIT_CONFIG_KEY_0".to_string(), "http.extraheader".to_string()));
            env.push((
                "GIT_CONFIG_VALUE_0".to_string(),
                format!("Authorization: Basic {}", basic),
            ));
        }

        env
    }

    async fn run_git(
        &self,
        current_dir: Option<&Path>,
        args: &[&str],
        env: &[(String, String)],
    ) -> Result<String, PublishError> {
        let mut command = tokio::process::Command::new("git");
        command.args(args);
        if let Some(dir) = current_dir {
            command.current_dir(dir);
        }
        for (key, value) in env {
            command.env(key, value);
        }

        debug!("Running git {}", args.join(" "));
        let output = command.output().await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            // Label the error with the subcommand, skipping -c key=value pairs
            let subcommand = args
                .iter()
                .find(|a| !a.starts_with('-') && !a.contains('='))
                .copied()
                .unwrap_or("git");
            return Err(PublishError::CommandFailed {
                command: format!("git {}", subcommand),
                stderr,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[async_trait]
impl Publisher for GitPublisher {
    async fn publish(&self, post: &StagedPost) -> Result<(), PublishError> {
        // Fail fast on a missing credential, before any subprocess runs
        let token = std::env::var(&self.config.token_env)
            .map_err(|_| PublishError::MissingToken(self.config.token_env.clone()))?;

        let _guard = self.publish_lock.lock().await;

        let workdir = tempfile::Builder::new()
            .prefix("toukou-publish-")
            .tempdir()?;
        let clone_dir = workdir.path().join("repo");
        let clone_path = clone_dir.to_string_lossy().into_owned();
        let env = self.git_env(&token);

        info!("Cloning {} for publish", self.config.repository_url);
        self.run_git(
            None,
            &["clone", &self.config.repository_url, &clone_path],
            &env,
        )
        .await?;

        let posts_dir = clone_dir.join(&self.config.posts_subdirectory);
        tokio::fs::create_dir_all(&posts_dir).await?;
        tokio::fs::write(posts_dir.join(&post.filename), &post.content).await?;

        if let Some(image) = &post.image {
            let images_dir = clone_dir.join(&self.config.images_subdirectory);
            tokio::fs::create_dir_all(&images_dir).await?;
            tokio::fs::write(images_dir.join(&image.filename), &image.bytes).await?;
        }

        self.run_git(Some(&clone_dir), &["add", "."], &env).await?;

        let user_name = format!("user.name={}", self.config.committer_name);
        let user_email = format!("user.email={}", self.config.committer_email);
        let message = format!("Add blog post {}", post.filename);
        self.run_git(
            Some(&clone_dir),
            &["-c", &user_name, "-c", &user_email, "commit", "-m", &message],
            &env,
        )
        .await?;

        self.run_git(Some(&clone_dir), &["push"], &env).await?;

        info!(
            "Published {} to {}",
            post.filename, self.config.repository_url
        );

        Ok(())
        // workdir drops here and removes the clone, whether we got this
        // far or bailed on an earlier step
    }

    fn name(&self) -> &str {
        "git"
    }
}
