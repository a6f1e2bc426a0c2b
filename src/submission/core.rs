use super::{error::SubmissionError, types::*};
use chrono::{DateTime, Utc};
use std::path::Path;
use tracing::{debug, info};

/// Stages form submissions as Markdown documents with front matter.
///
/// Filenames are derived deterministically: the sanitized slug when the
/// form supplied one, otherwise a UTC `%Y%m%d%H%M%S` timestamp. Either way
/// a colliding name overwrites the previous file (last write wins).
pub struct SubmissionManager {
    config: SubmissionConfig,
}

impl SubmissionManager {
    pub fn new(config: SubmissionConfig) -> Self {
        Self { config }
    }

    pub fn get_config(&self) -> &SubmissionConfig {
        &self.config
    }

    /// Write the post (and its image, if any) into the staging directories
    /// and return the staged artifact for publishing.
    pub async fn stage(&self, post: &NewPost) -> Result<StagedPost, SubmissionError> {
        let now = Utc::now();
        self.stage_at(post, now).await
    }

    /// Staging with an injected clock, so filename derivation stays
    /// deterministic under test.
    pub async fn stage_at(
        &self,
        post: &NewPost,
        now: DateTime<Utc>,
    ) -> Result<StagedPost, SubmissionError> {
        let filename = self.derive_filename(post.slug.as_deref(), now);

        let image = match &post.image {
            Some(upload) => {
                let stored = self.stage_image(upload).await?;
                Some(stored)
            }
            None => None,
        };

        let image_url = image.as_ref().map(|img| {
            format!(
                "{}/{}",
                self.config.image_url_prefix,
                urlencoding::encode(&img.filename)
            )
        });

        let content = compose_document(
            &post.title,
            &post.body,
            now,
            &post.tags,
            sanitized_slug(post.slug.as_deref()).as_deref(),
            image_url.as_deref(),
        );

        tokio::fs::create_dir_all(&self.config.posts_directory).await?;
        let post_path = self.config.posts_directory.join(&filename);
        tokio::fs::write(&post_path, &content).await?;

        info!("Staged post {} at {:?}", filename, post_path);

        Ok(StagedPost {
            filename,
            title: post.title.clone(),
            content,
            image,
        })
    }

    async fn stage_image(&self, upload: &ImageUpload) -> Result<ImageUpload, SubmissionError> {
        // Keep the original name but drop any directory components; a
        // re-upload of the same name overwrites the previous image.
        let filename = Path::new(&upload.filename)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(upload.filename.as_str())
            .to_string();

        tokio::fs::create_dir_all(&self.config.images_directory).await?;
        let image_path = self.config.images_directory.join(&filename);
        tokio::fs::write(&image_path, &upload.bytes).await?;

        debug!("Staged image {:?} ({} bytes)", image_path, upload.bytes.len());

        Ok(ImageUpload {
            filename,
            bytes: upload.bytes.clone(),
        })
    }

    pub fn derive_filename(&self, slug: Option<&str>, now: DateTime<Utc>) -> String {
        let stem = sanitized_slug(slug)
            .unwrap_or_else(|| now.format("%Y%m%d%H%M%S").to_string());
        format!("{}.md", stem)
    }
}

fn sanitized_slug(slug: Option<&str>) -> Option<String> {
    let raw = slug?.trim();
    if raw.is_empty() {
        return None;
    }

    let mut stem = String::with_capacity(raw.len());
    let mut last_dash = true;
    for c in raw.to_lowercase().chars() {
        if c.is_alphanumeric() {
            stem.push(c);
            last_dash = false;
        } else if !last_dash {
            stem.push('-');
            last_dash = true;
        }
    }
    let stem = stem.trim_end_matches('-').to_string();

    if stem.is_empty() { None } else { Some(stem) }
}

/// Split a comma-separated tags field into individual tags, dropping
/// empties.
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|tag| tag.trim())
        .filter(|tag| !tag.is_empty())
        .map(|tag| tag.to_string())
        .collect()
}

/// Assemble the Markdown document: front matter, blank line, optional
/// image embed line, trimmed body. Title and body are written verbatim; a
/// title containing front-matter syntax will corrupt the block.
pub fn compose_document(
    title: &str,
    body: &str,
    date: DateTime<Utc>,
    tags: &[String],
    slug: Option<&str>,
    image_url: Option<&str>,
) -> String {
    let mut lines = vec![
        "---".to_string(),
        format!("title: {}", title),
        format!("date: {}", date.format("%Y-%m-%d")),
    ];

    if !tags.is_empty() {
        lines.push(format!("tags: [{}]", tags.join(", ")));
    }
    if let Some(slug) = slug {
        lines.push(format!("slug: {}", slug));
    }

    lines.push("---".to_string());
    lines.push(String::new());

    if let Some(url) = image_url {
        lines.push(format!("![image]({})", url));
        lines.push(String::new());
    }

    lines.push(body.trim().to_string());

    lines.join("\n")
}
