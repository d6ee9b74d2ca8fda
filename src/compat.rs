use crate::{client::ContentError, listing::ListingError, model::ApiError, page::Templates};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Content(ContentError::NotFound { .. })
            | ApiError::Listing(ListingError::Content(ContentError::NotFound { .. })) => {
                StatusCode::NOT_FOUND
            }

            ApiError::BadRequest(_)
            | ApiError::Listing(ListingError::Exhausted)
            | ApiError::Content(ContentError::ForeignCursor(_) | ContentError::Url(_))
            | ApiError::Listing(ListingError::Content(
                ContentError::ForeignCursor(_) | ContentError::Url(_),
            )) => StatusCode::BAD_REQUEST,

            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn log(&self, status: StatusCode) {
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, %status, "request rejected");
        }
    }
}

/// JSON rendition, for the API routes.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        self.log(status);

        let message = if status.is_server_error() {
            "internal error".to_string()
        } else {
            self.to_string()
        };

        (status, axum::Json(serde_json::json!({ "err": message }))).into_response()
    }
}

/// HTML rendition, for page routes.
pub fn error_page(templates: &Templates, path: &str, error: ApiError) -> Response {
    let status = error.status();
    error.log(status);

    let page = if status == StatusCode::NOT_FOUND {
        templates.not_found(path)
    } else {
        templates.error()
    };

    match page {
        Ok(page) => (status, Html(page.0)).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "could not render the error page");
            (status, status.canonical_reason().unwrap_or("error")).into_response()
        }
    }
}
