pub mod prismic;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;

use crate::model::document::{Document, Page};

pub use prismic::PrismicClient;

#[derive(thiserror::Error, Debug)]
pub enum ContentError {
    #[error("http: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url: {0}")]
    Url(#[from] url::ParseError),

    #[error("no {document_type} with uid {uid:?}")]
    NotFound { document_type: String, uid: String },

    #[error("cursor {0:?} does not point at the content repository")]
    ForeignCursor(String),

    #[error("the repository did not advertise a master ref")]
    NoMasterRef,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ordering {
    pub field: String,
    pub direction: Direction,
}

impl Ordering {
    pub fn by_first_publication(direction: Direction) -> Self {
        Ordering {
            field: "document.first_publication_date".to_string(),
            direction,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// Content release to read from. `None` means the published master ref.
    pub reference: Option<String>,
    pub page_size: Option<u32>,
    /// Only documents after this document id, in `orderings` order.
    pub after: Option<String>,
    pub orderings: Vec<Ordering>,
}

/// Read access to the headless content repository.
#[async_trait]
pub trait ContentClient: Send + Sync {
    async fn query(
        &self,
        document_type: &str,
        options: &QueryOptions,
    ) -> Result<Page<Document>, ContentError>;

    async fn get_by_uid(
        &self,
        document_type: &str,
        uid: &str,
        reference: Option<&str>,
    ) -> Result<Document, ContentError>;

    /// Follows a `next_page` cursor from an earlier page.
    async fn fetch_page(&self, cursor: &str) -> Result<Page<Document>, ContentError>;
}

/// Every document of `document_type`, following cursors to the end.
pub async fn query_all(
    client: &dyn ContentClient,
    document_type: &str,
    options: &QueryOptions,
) -> Result<Vec<Document>, ContentError> {
    let mut page = client.query(document_type, options).await?;
    let mut documents = std::mem::take(&mut page.results);

    while let Some(cursor) = page.next_page.take() {
        page = client.fetch_page(&cursor).await?;
        documents.append(&mut page.results);
    }

    Ok(documents)
}
