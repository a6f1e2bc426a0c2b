use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A validated form submission, before any file has been written.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub body: String,
    pub slug: Option<String>,
    pub tags: Vec<String>,
    pub image: Option<ImageUpload>,
}

#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// The staged artifact handed to the publisher: the Markdown document as
/// written to the staging directory, plus the image bytes if one was
/// attached.
#[derive(Debug, Clone)]
pub struct StagedPost {
    pub filename: String,
    pub title: String,
    pub content: String,
    pub image: Option<ImageUpload>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubmissionConfig {
    pub posts_directory: PathBuf,
    pub images_directory: PathBuf,
    pub image_url_prefix: String,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            posts_directory: PathBuf::from("content/posts"),
            images_directory: PathBuf::from("content/images"),
            image_url_prefix: String::from("/images"),
        }
    }
}
