pub mod document;
pub mod rich_text;
pub mod timestamp;

use crate::{client::ContentError, listing::ListingError};

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("content repository: {0}")]
    Content(#[from] ContentError),

    #[error("listing: {0}")]
    Listing(#[from] ListingError),

    #[error("template: {0}")]
    Template(#[from] tera::Error),

    #[error("bad request: {0}")]
    BadRequest(String),
}
