use std::sync::Arc;

use serde::Serialize;
use time::UtcOffset;

use crate::{
    article::{find_neighbors, ArticleView, Neighbors},
    client::ContentClient,
    comments::{CommentWidget, CommentsMount},
    config::Config,
    generate::StaticPages,
    listing::{Listing, ListingState, SummaryView},
    model::{document::Document, ApiError},
    page::{ArticlePage, Html, ListingPage, Templates},
};

/// Everything a request needs, shared by all handlers.
pub struct Site {
    pub client: Arc<dyn ContentClient>,
    pub templates: Templates,
    pub pages: StaticPages,
    pub widget: CommentWidget,
    pub document_type: String,
    pub page_size: u32,
    pub max_pages: u32,
    pub offset: UtcOffset,
}

/// Response of the "load more" endpoint.
#[derive(Serialize, Debug)]
pub struct MorePosts {
    pub results: Vec<SummaryView>,
    pub html: Html,
    pub next_page: Option<String>,
}

impl Site {
    pub fn new(config: &Config, client: Arc<dyn ContentClient>) -> Result<Self, ApiError> {
        Ok(Site {
            client,
            templates: Templates::new(
                config.net.proto_host.clone(),
                &config.net.base_path,
                &config.site.toolbar_repo,
            )?,
            pages: StaticPages::default(),
            widget: CommentWidget::new(&config.comments),
            document_type: config.repository.document_type.clone(),
            page_size: config.repository.page_size,
            max_pages: config.repository.max_pages,
            offset: config.site.display_offset,
        })
    }

    /// The first `pages` pages of the listing, newest first.
    pub async fn render_listing(
        &self,
        pages: u32,
        reference: Option<&str>,
    ) -> Result<Html, ApiError> {
        let mut listing =
            Listing::first_page(&*self.client, &self.document_type, self.page_size, reference)
                .await?;

        let mut loaded = 1;
        while loaded < pages.clamp(1, self.max_pages.max(1)) {
            if listing.state() == ListingState::Idle {
                break;
            }
            listing.load_more(&*self.client).await?;
            loaded += 1;
        }

        Ok(self.templates.listing(&ListingPage {
            posts: listing.views(self.offset),
            cursor: listing.cursor.clone(),
            next_pages: loaded + 1,
            preview: reference.is_some(),
        })?)
    }

    pub async fn more_posts(&self, cursor: &str) -> Result<MorePosts, ApiError> {
        if cursor.is_empty() {
            return Err(ApiError::BadRequest("empty cursor".to_string()));
        }

        let mut listing = Listing {
            results: Vec::new(),
            cursor: Some(cursor.to_string()),
        };
        listing.load_more(&*self.client).await?;

        let results = listing.views(self.offset);
        Ok(MorePosts {
            html: self.templates.summaries(&results)?,
            results,
            next_page: listing.cursor,
        })
    }

    pub fn render_document(
        &self,
        document: &Document,
        neighbors: &Neighbors,
        preview: bool,
    ) -> Result<Html, ApiError> {
        let mut comments = CommentsMount::default();
        comments.ensure_widget(&self.widget);

        Ok(self.templates.article(&ArticlePage {
            article: ArticleView::assemble(document, neighbors, self.offset),
            comments: comments.render(),
            preview,
        })?)
    }

    /// Fetches one article and its neighbors and renders it.
    pub async fn render_article(
        &self,
        slug: &str,
        reference: Option<&str>,
    ) -> Result<Html, ApiError> {
        let document = self
            .client
            .get_by_uid(&self.document_type, slug, reference)
            .await?;
        let neighbors =
            find_neighbors(&*self.client, &self.document_type, &document, reference).await?;

        self.render_document(&document, &neighbors, reference.is_some())
    }
}
