use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PublisherConfig {
    /// Where the browser is redirected after a successful publish. Without
    /// it, /submit answers with a JSON success payload instead.
    #[serde(default)]
    pub site_url: Option<String>,
    #[serde(flatten)]
    pub backend: PublisherBackendConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum PublisherBackendConfig {
    Git(GitBackendConfig),
    Null(NullBackendConfig),
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GitBackendConfig {
    pub repository_url: String,
    #[serde(default = "default_posts_subdirectory")]
    pub posts_subdirectory: String,
    #[serde(default = "default_images_subdirectory")]
    pub images_subdirectory: String,
    /// Name of the environment variable holding the push credential.
    #[serde(default = "default_token_env")]
    pub token_env: String,
    #[serde(default = "default_committer_name")]
    pub committer_name: String,
    #[serde(default = "default_committer_email")]
    pub committer_email: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct NullBackendConfig {
    /// Report a publish failure instead of succeeding. Exercises the error
    /// path in tests without a git remote.
    #[serde(default)]
    pub fail: bool,
}

fn default_posts_subdirectory() -> String {
    "content/posts".to_string()
}

fn default_images_subdirectory() -> String {
    "content/images".to_string()
}

fn default_token_env() -> String {
    "GH_TOKEN".to_string()
}

fn default_committer_name() -> String {
    "Toukou".to_string()
}

fn default_committer_email() -> String {
    "toukou@localhost".to_string()
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            site_url: None,
            backend: PublisherBackendConfig::Null(NullBackendConfig::default()),
        }
    }
}
