use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use stash_domain::Resource;
use stash_service::{
    CreateResourceRequest, Delivery, ResourceContent, ResourceError, ResourceService, TransferMode,
    UpdateResourceRequest,
};
use tracing::debug;

use crate::error::ApiError;
use crate::extractors::multipart_with_user::MultipartWithUser;
use crate::extractors::{CurrentUser, MaybeUser};
use crate::range;
use crate::AppState;

/// 资源响应的缓存策略
pub const CACHE_CONTROL: &str = "max-age=3600";
/// 资源响应的内容安全策略
pub const CONTENT_SECURITY_POLICY: &str =
    "default-src 'none'; script-src 'none'; img-src 'self'; media-src 'self'; sandbox;";

fn parse_id(raw: &str) -> Result<i32, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::bad_request(format!("ID is not a number: {}", raw)))
}

#[derive(Debug, Default, Deserialize)]
pub struct StreamQuery {
    thumbnail: Option<String>,
}

/// 获取资源内容
/// GET /r/:id
pub async fn stream_resource(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<StreamQuery>,
    MaybeUser(user): MaybeUser,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    serve(state, &id, query, user, headers).await
}

/// 获取资源内容，路径末尾附带文件名
/// GET /r/:id/*filename
pub async fn stream_named_resource(
    State(state): State<AppState>,
    Path((id, _filename)): Path<(String, String)>,
    Query(query): Query<StreamQuery>,
    MaybeUser(user): MaybeUser,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    serve(state, &id, query, user, headers).await
}

async fn serve(
    state: AppState,
    raw_id: &str,
    query: StreamQuery,
    user: Option<stash_api::AuthenticatedUser>,
    request_headers: HeaderMap,
) -> Result<Response, ApiError> {
    let id = parse_id(raw_id)?;
    let wants_thumbnail = query.thumbnail.as_deref() == Some("1");

    match state.delivery_service.deliver(id, user.as_ref(), wants_thumbnail).await? {
        Delivery::Redirect(url) => {
            debug!("Redirecting resource {} to external link", id);
            let location =
                HeaderValue::from_str(&url).map_err(|e| ResourceError::Internal(anyhow::anyhow!(e)))?;
            Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response())
        }
        Delivery::Content(content) => Ok(content_response(&request_headers, content)),
    }
}

/// 文件名中的引号和控制字符会破坏响应头，需要转义或去掉
fn content_disposition(filename: &str) -> HeaderValue {
    let escaped: String = filename
        .chars()
        .filter(|c| !c.is_control())
        .flat_map(|c| match c {
            '"' | '\\' => vec!['\\', c],
            c => vec![c],
        })
        .collect();
    HeaderValue::from_str(&format!("filename=\"{}\"", escaped))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

fn content_response(request_headers: &HeaderMap, content: ResourceContent) -> Response {
    let ResourceContent {
        resource,
        blob,
        content_type,
        mode,
    } = content;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(CACHE_CONTROL));
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static(CONTENT_SECURITY_POLICY),
    );
    headers.insert(header::CONTENT_DISPOSITION, content_disposition(&resource.filename));

    match mode {
        TransferMode::Ranged => range::ranged_response(request_headers, headers, blob, resource.updated_at),
        TransferMode::Full => range::build(StatusCode::OK, headers, axum::body::Body::from(blob)),
    }
}

/// 上传资源文件
/// POST /api/v1/resource/blob
pub async fn upload_blob(
    State(state): State<AppState>,
    MultipartWithUser { mut multipart, user }: MultipartWithUser,
) -> Result<Json<Resource>, ApiError> {
    let user = user.ok_or(ApiError::Unauthorized)?;
    let service = &state.resource_service;
    let limit = service.max_upload_size_bytes().await;

    let mut upload = None;
    let mut note_id = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::bad_request("Failed to parse upload data"))?
    {
        match field.name().unwrap_or("") {
            "file" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);

                // 边读边检查大小，超过上限立即拒绝
                let mut blob = service.new_blob();
                while let Some(chunk) = field
                    .chunk()
                    .await
                    .map_err(|_| ApiError::bad_request("Failed to parse upload data"))?
                {
                    if blob.len() + chunk.len() as u64 > limit {
                        return Err(ResourceService::size_exceeded(limit).into());
                    }
                    blob.push(&chunk).await.map_err(ResourceError::Internal)?;
                }
                upload = Some((filename, content_type, blob));
            }
            "noteId" => {
                let value = field
                    .text()
                    .await
                    .map_err(|_| ApiError::bad_request("Failed to parse upload data"))?;
                let value = value.trim();
                if !value.is_empty() {
                    note_id = Some(
                        value
                            .parse()
                            .map_err(|_| ApiError::bad_request(format!("Invalid noteId: {}", value)))?,
                    );
                }
            }
            _ => {}
        }
    }

    let (filename, content_type, blob) = upload.ok_or_else(|| ApiError::bad_request("Upload file not found"))?;
    let resource = service
        .upload(&user, &filename, content_type.as_deref(), blob, note_id)
        .await?;
    Ok(Json(resource))
}

/// 创建外部链接资源
/// POST /api/v1/resource
pub async fn create_resource(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    request: Result<Json<CreateResourceRequest>, JsonRejection>,
) -> Result<Json<Resource>, ApiError> {
    let Json(request) = request.map_err(|_| ApiError::bad_request("Malformatted post resource request"))?;
    let resource = state.resource_service.create(&user, request).await?;
    Ok(Json(resource))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    limit: Option<usize>,
    offset: Option<usize>,
}

/// 列出当前用户的资源
/// GET /api/v1/resource
pub async fn list_resources(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Resource>>, ApiError> {
    let resources = state
        .resource_service
        .list(&user, query.limit, query.offset)
        .await?;
    Ok(Json(resources))
}

/// 更新资源
/// PATCH /api/v1/resource/:id
pub async fn update_resource(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    request: Result<Json<UpdateResourceRequest>, JsonRejection>,
) -> Result<Json<Resource>, ApiError> {
    let id = parse_id(&id)?;
    let Json(request) = request.map_err(|_| ApiError::bad_request("Malformatted patch resource request"))?;
    let resource = state.resource_service.update(&user, id, request).await?;
    Ok(Json(resource))
}

/// 删除资源
/// DELETE /api/v1/resource/:id
pub async fn delete_resource(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<bool>, ApiError> {
    let id = parse_id(&id)?;
    state.resource_service.delete(&user, id).await?;
    Ok(Json(true))
}
