use std::convert::Infallible;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, HeaderValue},
};

pub const PREVIEW_COOKIE: &str = "io.prismic.preview";

/// The content release being previewed, read from the preview cookie.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PreviewRef(pub Option<String>);

impl PreviewRef {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let reference = headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == PREVIEW_COOKIE)
            .and_then(|(_, value)| {
                url::form_urlencoded::parse(value.as_bytes())
                    .next()
                    .map(|(decoded, _)| decoded.into_owned())
            })
            .filter(|reference| !reference.is_empty());

        PreviewRef(reference)
    }

    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for PreviewRef {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(PreviewRef::from_headers(&parts.headers))
    }
}

pub fn set_cookie(reference: &str) -> Option<HeaderValue> {
    let encoded: String = url::form_urlencoded::byte_serialize(reference.as_bytes()).collect();
    HeaderValue::from_str(&format!(
        "{PREVIEW_COOKIE}={encoded}; Path=/; HttpOnly; SameSite=Lax"
    ))
    .ok()
}

pub fn clear_cookie() -> HeaderValue {
    HeaderValue::from_static("io.prismic.preview=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax")
}
