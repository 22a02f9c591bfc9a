use axum::{
    body::HttpBody,
    http::{header, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use bytes::BufMut;
use etag::EntityTag;
use tracing::{error, trace};

/// Tags successful responses with a strong etag of their body, answering 304 when the client
/// already holds that body.
pub async fn middleware_fn<B>(req: Request<B>, next: Next<B>) -> Response {
    let if_none_match = req
        .headers()
        .get(header::IF_NONE_MATCH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<EntityTag>().ok());
    let path = req.uri().path().to_owned();

    let res = next.run(req).await;
    if !res.status().is_success() {
        return res;
    }

    let (mut parts, mut body) = res.into_parts();

    let mut bytes = vec![];
    while let Some(chunk) = body.data().await {
        match chunk {
            Ok(chunk) => bytes.put(chunk),
            Err(err) => {
                error!(path, %err, "failed to read response body");
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        }
    }

    if bytes.is_empty() {
        trace!(path, "response without body, skipping etag");
        return (parts, bytes).into_response();
    }

    let etag = EntityTag::from_data(&bytes);
    if let Ok(value) = HeaderValue::from_str(&etag.to_string()) {
        parts.headers.insert(header::ETAG, value);
    }

    let some_match = if_none_match
        .as_ref()
        .map_or(false, |if_none_match| etag.strong_eq(if_none_match));

    trace!(path, %etag, some_match, "tagged response");

    if some_match {
        parts.status = StatusCode::NOT_MODIFIED;
        (parts, ()).into_response()
    } else {
        (parts, bytes).into_response()
    }
}
