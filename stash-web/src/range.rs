use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::Response;
use chrono::{DateTime, SubsecRound, Utc};

/// Range请求的解析结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteRange {
    /// 返回完整内容
    Full,
    /// 闭区间 `[start, end]`
    Partial { start: u64, end: u64 },
    /// 范围无法满足
    Unsatisfiable,
}

/// 解析 `Range` 请求头
/// 只支持单个范围，多个范围或格式错误时忽略该请求头
pub fn parse_range(value: &str, len: u64) -> ByteRange {
    let Some(ranges) = value.trim().strip_prefix("bytes=") else {
        return ByteRange::Full;
    };
    if ranges.contains(',') {
        return ByteRange::Full;
    }
    let Some((start, end)) = ranges.trim().split_once('-') else {
        return ByteRange::Full;
    };
    let (start, end) = (start.trim(), end.trim());

    if start.is_empty() {
        // 后缀范围：最后N个字节
        return match end.parse::<u64>() {
            Ok(0) => ByteRange::Unsatisfiable,
            Ok(_) if len == 0 => ByteRange::Unsatisfiable,
            Ok(suffix) => ByteRange::Partial {
                start: len.saturating_sub(suffix),
                end: len - 1,
            },
            Err(_) => ByteRange::Full,
        };
    }

    let Ok(start) = start.parse::<u64>() else {
        return ByteRange::Full;
    };
    let end = if end.is_empty() {
        None
    } else {
        match end.parse::<u64>() {
            Ok(end) if end >= start => Some(end),
            _ => return ByteRange::Full,
        }
    };

    if start >= len {
        return ByteRange::Unsatisfiable;
    }
    ByteRange::Partial {
        start,
        end: end.map_or(len - 1, |end| end.min(len - 1)),
    }
}

/// 格式化为HTTP日期
pub fn http_date(time: DateTime<Utc>) -> String {
    time.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// 解析HTTP日期
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(|time| time.with_timezone(&Utc))
}

fn header_str<'a>(headers: &'a HeaderMap, name: header::HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// 构建支持Range的响应
/// `If-Modified-Since` 命中时返回304，`If-Range` 与修改时间不一致时返回完整内容
pub fn ranged_response(
    request_headers: &HeaderMap,
    mut response_headers: HeaderMap,
    blob: Vec<u8>,
    last_modified: DateTime<Utc>,
) -> Response {
    let last_modified = last_modified.trunc_subsecs(0);
    let len = blob.len() as u64;

    if let Ok(value) = HeaderValue::from_str(&http_date(last_modified)) {
        response_headers.insert(header::LAST_MODIFIED, value);
    }
    response_headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));

    let not_modified = header_str(request_headers, header::IF_MODIFIED_SINCE)
        .and_then(parse_http_date)
        .is_some_and(|since| last_modified <= since);
    if not_modified {
        return build(StatusCode::NOT_MODIFIED, response_headers, Body::empty());
    }

    let range_allowed = match header_str(request_headers, header::IF_RANGE) {
        None => true,
        Some(value) => parse_http_date(value).is_some_and(|time| time == last_modified),
    };
    let range = match header_str(request_headers, header::RANGE) {
        Some(value) if range_allowed => parse_range(value, len),
        _ => ByteRange::Full,
    };

    match range {
        ByteRange::Full => build(StatusCode::OK, response_headers, Body::from(blob)),
        ByteRange::Partial { start, end } => {
            if let Ok(value) = HeaderValue::from_str(&format!("bytes {}-{}/{}", start, end, len)) {
                response_headers.insert(header::CONTENT_RANGE, value);
            }
            let body = blob[start as usize..=end as usize].to_vec();
            build(StatusCode::PARTIAL_CONTENT, response_headers, Body::from(body))
        }
        ByteRange::Unsatisfiable => {
            if let Ok(value) = HeaderValue::from_str(&format!("bytes */{}", len)) {
                response_headers.insert(header::CONTENT_RANGE, value);
            }
            build(StatusCode::RANGE_NOT_SATISFIABLE, response_headers, Body::empty())
        }
    }
}

/// 构建带响应头的响应
pub fn build(status: StatusCode, headers: HeaderMap, body: Body) -> Response {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}
