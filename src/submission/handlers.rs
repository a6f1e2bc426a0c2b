use super::core::parse_tags;
use super::error::SubmissionError;
use super::types::{ImageUpload, NewPost};
use crate::AppState;
use crate::publisher::Publisher as _;
use axum::{
    extract::{Multipart, State, multipart::Field},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Redirect, Response},
};
use serde::Serialize;
use tracing::{error, info};

#[derive(Serialize)]
pub struct SubmitResponse {
    success: bool,
    filename: String,
}

pub async fn submit_form_handler(State(app_state): State<AppState>) -> impl IntoResponse {
    let globals = liquid::object!({
        "page_title": "New Post",
        "app_name": app_state.config.app.name,
    });

    match app_state
        .template_engine
        .render_template("pages/submit_form.html.liquid", globals)
        .await
    {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!("Template rendering error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
        }
    }
}

pub async fn submit_handler(
    State(app_state): State<AppState>,
    multipart: Multipart,
) -> Response {
    let post = match read_form(multipart).await {
        Ok(post) => post,
        Err(e) => {
            error!("Rejected submission: {}", e);
            return (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()).into_response();
        }
    };

    info!(
        "Form submission: title={:?}, {} body bytes, image={}",
        post.title,
        post.body.len(),
        post.image.as_ref().map(|i| i.filename.as_str()).unwrap_or("-")
    );

    let staged = match app_state.submissions.stage(&post).await {
        Ok(staged) => staged,
        Err(e) => {
            error!("Failed to stage post: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to stage post: {}", e),
            )
                .into_response();
        }
    };

    if let Err(e) = app_state.publisher.publish(&staged).await {
        error!("Failed to publish {}: {}", staged.filename, e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Publish failed: {}", e),
        )
            .into_response();
    }

    match &app_state.config.publisher.site_url {
        Some(site_url) => Redirect::to(site_url).into_response(),
        None => Json(SubmitResponse {
            success: true,
            filename: staged.filename,
        })
        .into_response(),
    }
}

async fn field_text(field: Field<'_>) -> Result<String, SubmissionError> {
    field
        .text()
        .await
        .map_err(|e| SubmissionError::MalformedForm(e.to_string()))
}

async fn read_form(mut multipart: Multipart) -> Result<NewPost, SubmissionError> {
    let mut title: Option<String> = None;
    let mut body: Option<String> = None;
    let mut slug: Option<String> = None;
    let mut tags: Vec<String> = Vec::new();
    let mut image: Option<ImageUpload> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| SubmissionError::MalformedForm(e.to_string()))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match name.as_str() {
            "title" => title = Some(field_text(field).await?),
            "content" => body = Some(field_text(field).await?),
            "slug" => slug = Some(field_text(field).await?),
            "tags" => tags = parse_tags(&field_text(field).await?),
            "image" => {
                let filename = field.file_name().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| SubmissionError::MalformedForm(e.to_string()))?;

                // Browsers send an empty image part when no file was chosen
                if let Some(filename) = filename.filter(|f| !f.is_empty())
                    && !bytes.is_empty()
                {
                    image = Some(ImageUpload {
                        filename,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            _ => {}
        }
    }

    let title = title
        .filter(|t| !t.trim().is_empty())
        .ok_or(SubmissionError::MissingField("title"))?;
    let body = body.ok_or(SubmissionError::MissingField("content"))?;
    let slug = slug.filter(|s| !s.trim().is_empty());

    Ok(NewPost {
        title,
        body,
        slug,
        tags,
        image,
    })
}
