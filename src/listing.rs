use serde::{Deserialize, Serialize};
use time::UtcOffset;

use crate::{
    client::{ContentClient, ContentError, Direction, Ordering, QueryOptions},
    format::{format_date, DateVariant},
    model::document::{Document, Page, PostSummary},
};

#[derive(thiserror::Error, Debug)]
pub enum ListingError {
    #[error("there are no more pages to load")]
    Exhausted,

    #[error(transparent)]
    Content(#[from] ContentError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListingState<'a> {
    Idle,
    HasMore(&'a str),
}

/// Posts shown so far plus the cursor of the next page, if any.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Listing {
    pub results: Vec<PostSummary>,
    pub cursor: Option<String>,
}

impl From<Page<Document>> for Listing {
    fn from(page: Page<Document>) -> Self {
        let page = page.map(PostSummary::from);
        Listing {
            results: page.results,
            cursor: page.next_page,
        }
    }
}

impl Listing {
    /// Newest posts first.
    pub async fn first_page(
        client: &dyn ContentClient,
        document_type: &str,
        page_size: u32,
        reference: Option<&str>,
    ) -> Result<Self, ContentError> {
        let options = QueryOptions {
            reference: reference.map(String::from),
            page_size: Some(page_size),
            after: None,
            orderings: vec![Ordering::by_first_publication(Direction::Descending)],
        };
        Ok(client.query(document_type, &options).await?.into())
    }

    pub fn state(&self) -> ListingState<'_> {
        match &self.cursor {
            Some(cursor) => ListingState::HasMore(cursor),
            None => ListingState::Idle,
        }
    }

    /// Appends the next page and moves the cursor along. Returns how many
    /// posts were added.
    pub async fn load_more(&mut self, client: &dyn ContentClient) -> Result<usize, ListingError> {
        let ListingState::HasMore(cursor) = self.state() else {
            return Err(ListingError::Exhausted);
        };

        let page = client.fetch_page(cursor).await?.map(PostSummary::from);
        let added = page.results.len();
        self.results.extend(page.results);
        self.cursor = page.next_page;

        tracing::debug!(added, has_more = self.cursor.is_some(), "loaded more posts");
        Ok(added)
    }

    pub fn views(&self, offset: UtcOffset) -> Vec<SummaryView> {
        self.results
            .iter()
            .map(|summary| SummaryView::new(summary, offset))
            .collect()
    }
}

/// A listing entry ready for the template or the JSON endpoint.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct SummaryView {
    pub uid: String,
    pub href: String,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub date: Option<String>,
}

impl SummaryView {
    pub fn new(summary: &PostSummary, offset: UtcOffset) -> Self {
        SummaryView {
            uid: summary.uid.clone(),
            href: format!("/post/{}", summary.uid),
            title: summary.title.clone(),
            subtitle: summary.subtitle.clone(),
            author: summary.author.clone(),
            date: summary
                .first_publication_date
                .map(|date| format_date(date.to_offset(offset), DateVariant::Short)),
        }
    }
}
