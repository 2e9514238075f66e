use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use image::{DynamicImage, ImageFormat, RgbImage};
use stash_api::{AuthenticatedUser, SystemSettingStore};
use stash_domain::{Note, ResourceCreate, ResourceLocation, ResourceStore, Visibility};
use stash_infra::security::JwtService;
use stash_infra::{
    LocalAttachmentStorage, MemoryNoteStore, MemoryResourceStore, MemoryStorageRegistry, MemorySystemSettingStore,
    S3ObjectStorageConnector,
};
use stash_service::resource::thumbnail::THUMBNAIL_CACHE_DIR;
use stash_service::{
    BlobPersister, ConcurrencyGate, DefaultThumbnailService, ResourceDeliveryService, ResourceService,
};
use std::io::Cursor;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

use crate::{resource_routes, AppState};

const BOUNDARY: &str = "stash-test-boundary";

struct TestApp {
    temp_dir: TempDir,
    router: Router,
    jwt: Arc<JwtService>,
    resources: Arc<MemoryResourceStore>,
    notes: Arc<MemoryNoteStore>,
    settings: Arc<MemorySystemSettingStore>,
}

impl TestApp {
    fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let resources = Arc::new(MemoryResourceStore::new());
        let notes = Arc::new(MemoryNoteStore::new());
        let settings = Arc::new(MemorySystemSettingStore::new());
        let local = Arc::new(LocalAttachmentStorage::new(temp_dir.path().to_path_buf()));
        let thumbnails = Arc::new(DefaultThumbnailService::new(
            temp_dir.path().join(THUMBNAIL_CACHE_DIR),
            512,
            ConcurrencyGate::new(4),
        ));
        let jwt = Arc::new(JwtService::new("test-secret", "stash"));

        let persister = BlobPersister::new(
            settings.clone(),
            Arc::new(MemoryStorageRegistry::new(Vec::new())),
            Arc::new(S3ObjectStorageConnector),
            local.clone(),
        );
        let state = AppState {
            jwt_service: jwt.clone(),
            resource_service: Arc::new(ResourceService::new(
                resources.clone(),
                settings.clone(),
                persister,
                local.clone(),
                thumbnails.clone(),
            )),
            delivery_service: Arc::new(ResourceDeliveryService::new(
                resources.clone(),
                notes.clone(),
                local,
                thumbnails,
            )),
        };

        Self {
            temp_dir,
            router: resource_routes(state),
            jwt,
            resources,
            notes,
            settings,
        }
    }

    fn token(&self, id: i32) -> String {
        self.jwt
            .generate(&AuthenticatedUser::new(id, format!("user{}", id)), 3600)
            .unwrap()
    }

    async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    async fn inline(&self, filename: &str, mime_type: &str, content: &[u8], note_id: Option<i32>) -> i32 {
        let mut create = ResourceCreate::new(1, filename, mime_type);
        create.location = Some(ResourceLocation::Inline(content.to_vec()));
        create.note_id = note_id;
        self.resources.create_resource(create).await.unwrap().id
    }
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn multipart_upload(token: Option<&str>, filename: &str, content: &[u8]) -> Request<Body> {
    multipart_upload_with_note(token, filename, content, None)
}

fn multipart_upload_with_note(
    token: Option<&str>,
    filename: &str,
    content: &[u8],
    note_id: Option<&str>,
) -> Request<Body> {
    let mut body = Vec::new();
    if let Some(note_id) = note_id {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(b"Content-Disposition: form-data; name=\"noteId\"\r\n\r\n");
        body.extend_from_slice(note_id.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n", filename).as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: text/plain\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/v1/resource/blob")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", BOUNDARY));
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body)).unwrap()
}

async fn body_bytes(response: Response) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec()
}

async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

#[tokio::test]
async fn test_text_is_served_as_plain_text_with_security_headers() {
    let app = TestApp::new();
    let id = app.inline("notes.md", "text/markdown", b"# hello", None).await;

    let response = app.send(get(&format!("/r/{}", id))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers[header::CONTENT_TYPE], "text/plain; charset=utf-8");
    assert_eq!(headers[header::CACHE_CONTROL], "max-age=3600");
    assert_eq!(
        headers[header::CONTENT_SECURITY_POLICY],
        "default-src 'none'; script-src 'none'; img-src 'self'; media-src 'self'; sandbox;"
    );
    assert_eq!(headers[header::CONTENT_DISPOSITION], "filename=\"notes.md\"");
    assert_eq!(body_bytes(response).await, b"# hello");
}

#[tokio::test]
async fn test_audio_supports_range_requests() {
    let app = TestApp::new();
    let id = app.inline("song.mp3", "audio/mpeg", b"0123456789", None).await;

    let request = Request::builder()
        .uri(format!("/r/{}/song.mp3", id))
        .header(header::RANGE, "bytes=0-3")
        .body(Body::empty())
        .unwrap();
    let response = app.send(request).await;

    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(response.headers()[header::CONTENT_RANGE], "bytes 0-3/10");
    assert_eq!(response.headers()[header::CONTENT_TYPE], "audio/mpeg");
    assert!(response.headers().contains_key(header::LAST_MODIFIED));
    assert_eq!(body_bytes(response).await, b"0123");
}

#[tokio::test]
async fn test_other_types_are_served_in_full() {
    let app = TestApp::new();
    let id = app.inline("doc.pdf", "application/pdf", b"%PDF-1.7", None).await;

    let request = Request::builder()
        .uri(format!("/r/{}", id))
        .header(header::RANGE, "bytes=0-3")
        .body(Body::empty())
        .unwrap();
    let response = app.send(request).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
    assert_eq!(body_bytes(response).await, b"%PDF-1.7");
}

#[tokio::test]
async fn test_private_resource_requires_creator() {
    let app = TestApp::new();
    app.notes.upsert(Note::new(5, 1, Visibility::Private)).await;
    let id = app.inline("secret.txt", "text/plain", b"secret", Some(5)).await;

    let response = app.send(get(&format!("/r/{}", id))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "Unauthorized access");

    let request = Request::builder()
        .uri(format!("/r/{}", id))
        .header(header::AUTHORIZATION, format!("Bearer {}", app.token(2)))
        .body(Body::empty())
        .unwrap();
    assert_eq!(app.send(request).await.status(), StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri(format!("/r/{}", id))
        .header(header::COOKIE, format!("access-token={}", app.token(1)))
        .body(Body::empty())
        .unwrap();
    assert_eq!(app.send(request).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_protected_resource_requires_login() {
    let app = TestApp::new();
    app.notes.upsert(Note::new(6, 1, Visibility::Protected)).await;
    let id = app.inline("team.txt", "text/plain", b"team", Some(6)).await;

    assert_eq!(app.send(get(&format!("/r/{}", id))).await.status(), StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri(format!("/r/{}", id))
        .header(header::AUTHORIZATION, format!("Bearer {}", app.token(9)))
        .body(Body::empty())
        .unwrap();
    assert_eq!(app.send(request).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_and_malformed_ids() {
    let app = TestApp::new();
    assert_eq!(app.send(get("/r/404")).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.send(get("/r/abc")).await.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_external_link_redirects() {
    let app = TestApp::new();
    let mut create = ResourceCreate::new(1, "remote.png", "image/png");
    create.location = Some(ResourceLocation::ExternalLink("https://cdn.example.com/remote.png".to_string()));
    let id = app.resources.create_resource(create).await.unwrap().id;

    let response = app.send(get(&format!("/r/{}", id))).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()[header::LOCATION], "https://cdn.example.com/remote.png");
}

#[tokio::test]
async fn test_thumbnail_query() {
    let app = TestApp::new();
    let mut png = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::new(2048, 1024))
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .unwrap();
    let id = app.inline("wide.png", "image/png", &png, None).await;

    let response = app.send(get(&format!("/r/{}?thumbnail=1", id))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let thumbnail = image::load_from_memory(&body_bytes(response).await).unwrap();
    assert_eq!((thumbnail.width(), thumbnail.height()), (512, 256));

    let response = app.send(get(&format!("/r/{}", id))).await;
    assert_eq!(body_bytes(response).await, png);
}

#[tokio::test]
async fn test_upload_requires_authentication() {
    let app = TestApp::new();
    let response = app.send(multipart_upload(None, "hello.txt", b"hello")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_upload_and_download() {
    let app = TestApp::new();
    let response = app.send(multipart_upload(Some(&app.token(1)), "hello.txt", b"hello world")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let resource = body_json(response).await;
    assert_eq!(resource["filename"], "hello.txt");
    assert_eq!(resource["type"], "text/plain");
    assert_eq!(resource["size"], 11);
    assert_eq!(resource["externalLink"], "");

    let id = resource["id"].as_i64().unwrap();
    let response = app.send(get(&format!("/r/{}", id))).await;
    assert_eq!(body_bytes(response).await, b"hello world");
}

#[tokio::test]
async fn test_upload_note_id() {
    let app = TestApp::new();
    let token = app.token(1);

    let response = app
        .send(multipart_upload_with_note(Some(&token), "a.txt", b"a", Some("7")))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["noteId"], 7);

    let response = app
        .send(multipart_upload_with_note(Some(&token), "b.txt", b"b", Some("seven")))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Invalid noteId: seven");
    assert_eq!(app.resources.list_resources(&Default::default()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_upload_to_local_filesystem() {
    let app = TestApp::new();
    app.settings
        .set_setting("storage-service-id", "-1".to_string())
        .await
        .unwrap();
    app.settings
        .set_setting("local-storage-path", "\"files/{filename}\"".to_string())
        .await
        .unwrap();

    let response = app.send(multipart_upload(Some(&app.token(1)), "local.txt", b"on disk")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(std::fs::read(app.temp_dir.path().join("files/local.txt")).unwrap(), b"on disk");
}

#[tokio::test]
async fn test_upload_size_limit() {
    let app = TestApp::new();
    app.settings
        .set_setting("max-upload-size-mib", "0".to_string())
        .await
        .unwrap();

    let response = app.send(multipart_upload(Some(&app.token(1)), "big.txt", b"too big")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "File size exceeds allowed limit of 0 MiB");
    assert!(app.resources.list_resources(&Default::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_create_list_patch_delete() {
    let app = TestApp::new();
    let token = app.token(1);

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/resource")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            r#"{"filename":"logo.svg","externalLink":"https://example.com/logo.svg","type":"image/svg+xml"}"#,
        ))
        .unwrap();
    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::OK);
    let created = body_json(response).await;
    assert_eq!(created["externalLink"], "https://example.com/logo.svg");
    let id = created["id"].as_i64().unwrap();

    let request = Request::builder()
        .uri("/api/v1/resource?limit=10")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let listed = body_json(app.send(request).await).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let request = Request::builder()
        .method("PATCH")
        .uri(format!("/api/v1/resource/{}", id))
        .header(header::AUTHORIZATION, format!("Bearer {}", app.token(2)))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"filename":"stolen.svg"}"#))
        .unwrap();
    assert_eq!(app.send(request).await.status(), StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .method("PATCH")
        .uri(format!("/api/v1/resource/{}", id))
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"filename":"brand.svg"}"#))
        .unwrap();
    let patched = body_json(app.send(request).await).await;
    assert_eq!(patched["filename"], "brand.svg");

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/api/v1/resource/{}", id))
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    assert_eq!(app.send(request).await.status(), StatusCode::OK);
    assert_eq!(app.send(get(&format!("/r/{}", id))).await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_rejects_bad_requests() {
    let app = TestApp::new();
    let token = app.token(1);

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/resource")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"externalLink":"file:///etc/passwd"}"#))
        .unwrap();
    assert_eq!(app.send(request).await.status(), StatusCode::BAD_REQUEST);

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/resource")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    assert_eq!(app.send(request).await.status(), StatusCode::BAD_REQUEST);

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/resource")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"externalLink":"https://example.com/a.png"}"#))
        .unwrap();
    assert_eq!(app.send(request).await.status(), StatusCode::UNAUTHORIZED);
}
