use axum::body::Bytes;
use axum::http::StatusCode;
use axum_test::TestServer;
use std::fs;
use tempfile::TempDir;
use toukou::publisher::{NullBackendConfig, PublisherBackendConfig, PublisherConfig};
use toukou::submission::SubmissionConfig;
use toukou::{AppConfig, Config, ServerConfig, StaticConfig, TemplateConfig, create_app};

const BOUNDARY: &str = "toukou-test-boundary";

fn multipart_body(fields: &[(&str, &str)], image: Option<(&str, &[u8])>) -> (String, Vec<u8>) {
    let mut body = Vec::new();

    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }

    if let Some((filename, bytes)) = image {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                BOUNDARY, filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    (
        format!("multipart/form-data; boundary={}", BOUNDARY),
        body,
    )
}

struct TestSite {
    _temp_dir: TempDir,
    server: TestServer,
    posts_dir: std::path::PathBuf,
    images_dir: std::path::PathBuf,
}

async fn setup_test_server(site_url: Option<&str>, fail_publish: bool) -> TestSite {
    let temp_dir = TempDir::new().unwrap();
    let templates_dir = temp_dir.path().join("templates");
    let pages_dir = templates_dir.join("pages");
    let partials_dir = templates_dir.join("partials");
    let static_dir = temp_dir.path().join("static");
    let posts_dir = temp_dir.path().join("staging/posts");
    let images_dir = temp_dir.path().join("staging/images");

    fs::create_dir_all(&pages_dir).unwrap();
    fs::create_dir_all(&partials_dir).unwrap();
    fs::create_dir_all(&static_dir).unwrap();
    fs::create_dir_all(&posts_dir).unwrap();
    fs::create_dir_all(&images_dir).unwrap();

    let header_content = r#"<!DOCTYPE html>
<html>
<head>
    <title>{% if page_title %}{{ page_title }} - {% endif %}{{ app_name }}</title>
</head>
<body>
    <main>"#;
    fs::write(partials_dir.join("_header.html.liquid"), header_content).unwrap();

    let footer_content = r#"    </main>
</body>
</html>"#;
    fs::write(partials_dir.join("_footer.html.liquid"), footer_content).unwrap();

    let form_content = r#"{% include "_header.html.liquid" %}

<h1>New Post</h1>
<form action="/submit" method="post" enctype="multipart/form-data">
    <input type="text" name="title">
    <input type="text" name="slug">
    <input type="text" name="tags">
    <textarea name="content"></textarea>
    <input type="file" name="image">
    <button type="submit">Publish</button>
</form>

{% include "_footer.html.liquid" %}"#;
    fs::write(pages_dir.join("submit_form.html.liquid"), form_content).unwrap();

    let config = Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        app: AppConfig {
            name: "TestServer".to_string(),
            log_level: "error".to_string(),
            base_url: None,
        },
        templates: TemplateConfig {
            directory: templates_dir,
        },
        static_files: StaticConfig {
            directory: static_dir,
        },
        submission: SubmissionConfig {
            posts_directory: posts_dir.clone(),
            images_directory: images_dir.clone(),
            image_url_prefix: "/images".to_string(),
        },
        publisher: PublisherConfig {
            site_url: site_url.map(str::to_string),
            backend: PublisherBackendConfig::Null(NullBackendConfig { fail: fail_publish }),
        },
    };

    let app = create_app(config).await.unwrap();
    let server = TestServer::new(app.into_make_service()).unwrap();

    TestSite {
        _temp_dir: temp_dir,
        server,
        posts_dir,
        images_dir,
    }
}

#[tokio::test]
async fn test_form_renders() {
    let site = setup_test_server(Some("https://example.org/blog"), false).await;

    let response = site.server.get("/").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let html = response.text();
    assert!(html.contains("<title>New Post - TestServer</title>"));
    assert!(html.contains(r#"<form action="/submit" method="post" enctype="multipart/form-data">"#));
    assert!(html.contains(r#"name="title""#));
    assert!(html.contains(r#"name="content""#));
    assert!(html.contains(r#"name="image""#));
}

#[tokio::test]
async fn test_submit_without_image_stages_exact_document() {
    let site = setup_test_server(Some("https://example.org/blog"), false).await;

    let (content_type, body) =
        multipart_body(&[("title", "Hello"), ("content", "World")], None);
    let response = site
        .server
        .post("/submit")
        .content_type(&content_type)
        .bytes(Bytes::from(body))
        .await;

    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get("location").unwrap().to_str().unwrap(),
        "https://example.org/blog"
    );

    // Without a slug the filename is a timestamp, so find the single
    // staged file
    let entries: Vec<_> = fs::read_dir(&site.posts_dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(entries.len(), 1);

    let today = chrono::Utc::now().format("%Y-%m-%d");
    let expected = format!("---\ntitle: Hello\ndate: {}\n---\n\nWorld", today);
    assert_eq!(fs::read_to_string(&entries[0]).unwrap(), expected);
}

#[tokio::test]
async fn test_submit_with_slug_and_tags() {
    let site = setup_test_server(Some("https://example.org/blog"), false).await;

    let (content_type, body) = multipart_body(
        &[
            ("title", "Hello"),
            ("content", "World"),
            ("slug", "Hello World"),
            ("tags", "rust, web"),
        ],
        None,
    );
    let response = site
        .server
        .post("/submit")
        .content_type(&content_type)
        .bytes(Bytes::from(body))
        .await;

    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);

    let today = chrono::Utc::now().format("%Y-%m-%d");
    let expected = format!(
        "---\ntitle: Hello\ndate: {}\ntags: [rust, web]\nslug: hello-world\n---\n\nWorld",
        today
    );
    let written = fs::read_to_string(site.posts_dir.join("hello-world.md")).unwrap();
    assert_eq!(written, expected);
}

#[tokio::test]
async fn test_submit_with_image_stages_and_serves_it() {
    let site = setup_test_server(Some("https://example.org/blog"), false).await;

    let image_bytes: &[u8] = &[0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a];
    let (content_type, body) = multipart_body(
        &[
            ("title", "Hello"),
            ("content", "World"),
            ("slug", "with-image"),
        ],
        Some(("photo.png", image_bytes)),
    );
    let response = site
        .server
        .post("/submit")
        .content_type(&content_type)
        .bytes(Bytes::from(body))
        .await;

    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);

    // Image staged next to the post
    assert_eq!(
        fs::read(site.images_dir.join("photo.png")).unwrap(),
        image_bytes
    );

    // Embed line sits between the front matter and the body
    let written = fs::read_to_string(site.posts_dir.join("with-image.md")).unwrap();
    assert!(written.contains("---\n\n![image](/images/photo.png)\n\nWorld"));

    // And the upload is served back under /images
    let image_response = site.server.get("/images/photo.png").await;
    assert_eq!(image_response.status_code(), StatusCode::OK);
    assert_eq!(image_response.as_bytes().as_ref(), image_bytes);
}

#[tokio::test]
async fn test_submit_without_title_is_rejected() {
    let site = setup_test_server(Some("https://example.org/blog"), false).await;

    let (content_type, body) = multipart_body(&[("content", "World")], None);
    let response = site
        .server
        .post("/submit")
        .content_type(&content_type)
        .bytes(Bytes::from(body))
        .await;

    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

    // Rejected before any write
    assert_eq!(fs::read_dir(&site.posts_dir).unwrap().count(), 0);
}

#[tokio::test]
async fn test_blank_title_is_rejected() {
    let site = setup_test_server(Some("https://example.org/blog"), false).await;

    let (content_type, body) = multipart_body(&[("title", "   "), ("content", "World")], None);
    let response = site
        .server
        .post("/submit")
        .content_type(&content_type)
        .bytes(Bytes::from(body))
        .await;

    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(fs::read_dir(&site.posts_dir).unwrap().count(), 0);
}

#[tokio::test]
async fn test_publish_failure_keeps_staged_file() {
    let site = setup_test_server(Some("https://example.org/blog"), true).await;

    let (content_type, body) = multipart_body(
        &[
            ("title", "Hello"),
            ("content", "World"),
            ("slug", "kept-on-failure"),
        ],
        None,
    );
    let response = site
        .server
        .post("/submit")
        .content_type(&content_type)
        .bytes(Bytes::from(body))
        .await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.text().contains("Publish failed"));

    // The staged local file survives a failed publish unchanged
    let written = fs::read_to_string(site.posts_dir.join("kept-on-failure.md")).unwrap();
    assert!(written.contains("title: Hello"));
    assert!(written.ends_with("World"));
}

#[tokio::test]
async fn test_submit_without_site_url_returns_json() {
    let site = setup_test_server(None, false).await;

    let (content_type, body) = multipart_body(
        &[
            ("title", "Hello"),
            ("content", "World"),
            ("slug", "json-response"),
        ],
        None,
    );
    let response = site
        .server
        .post("/submit")
        .content_type(&content_type)
        .bytes(Bytes::from(body))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let payload: serde_json::Value = response.json();
    assert_eq!(payload["success"], true);
    assert_eq!(payload["filename"], "json-response.md");
}
