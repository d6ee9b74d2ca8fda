use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::model::rich_text::Block;

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Document {
    pub id: String,
    pub uid: String,
    #[serde(default, with = "crate::model::timestamp::option")]
    pub first_publication_date: Option<OffsetDateTime>,
    #[serde(default, with = "crate::model::timestamp::option")]
    pub last_publication_date: Option<OffsetDateTime>,
    #[serde(default)]
    pub data: DocumentData,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Default)]
#[serde(default)]
pub struct DocumentData {
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub banner: Banner,
    pub content: Vec<Section>,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Default)]
#[serde(default)]
pub struct Banner {
    pub url: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Default)]
#[serde(default)]
pub struct Section {
    pub heading: String,
    pub body: Vec<Block>,
}

/// One page of query results. `next_page` is the cursor for the following
/// page and is absent on the last one.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Page<T> {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub total_pages: u32,
    pub results: Vec<T>,
    #[serde(default)]
    pub next_page: Option<String>,
    #[serde(default)]
    pub prev_page: Option<String>,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            page: self.page,
            total_pages: self.total_pages,
            results: self.results.into_iter().map(f).collect(),
            next_page: self.next_page,
            prev_page: self.prev_page,
        }
    }
}

/// What the listing keeps of a post.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct PostSummary {
    pub uid: String,
    #[serde(default, with = "crate::model::timestamp::option")]
    pub first_publication_date: Option<OffsetDateTime>,
    pub title: String,
    pub subtitle: String,
    pub author: String,
}

impl From<Document> for PostSummary {
    fn from(document: Document) -> Self {
        PostSummary {
            uid: document.uid,
            first_publication_date: document.first_publication_date,
            title: document.data.title,
            subtitle: document.data.subtitle,
            author: document.data.author,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    const SEARCH_RESPONSE: &str = r#"{
        "page": 1,
        "results_per_page": 1,
        "total_pages": 2,
        "next_page": "https://blog.cdn.prismic.io/api/v2/documents/search?page=2",
        "prev_page": null,
        "results": [{
            "id": "YFzH1BIAACMAqz4b",
            "uid": "como-utilizar-hooks",
            "type": "post",
            "first_publication_date": "2021-03-25T19:25:28+0000",
            "last_publication_date": "2021-03-25T19:30:00+0000",
            "data": {
                "title": "Como utilizar Hooks",
                "subtitle": "Pensando em sincronização em vez de ciclos de vida",
                "author": "Joseph Oliveira",
                "banner": {"url": "https://images.prismic.io/banner.png"},
                "content": [{
                    "heading": "Proin et varius",
                    "body": [{"type": "paragraph", "text": "Lorem ipsum", "spans": []}]
                }]
            }
        }]
    }"#;

    #[test]
    fn parses_search_response() {
        let page: Page<Document> = serde_json::from_str(SEARCH_RESPONSE).unwrap();

        assert_eq!(page.total_pages, 2);
        assert!(page.next_page.is_some());
        assert_eq!(page.results.len(), 1);

        let post = &page.results[0];
        assert_eq!(post.uid, "como-utilizar-hooks");
        assert_eq!(
            post.last_publication_date,
            Some(datetime!(2021-03-25 19:30:00 UTC))
        );
        assert_eq!(post.data.content[0].heading, "Proin et varius");
        assert_eq!(
            post.data.banner.url.as_deref(),
            Some("https://images.prismic.io/banner.png")
        );
    }

    #[test]
    fn missing_data_fields_default() {
        let post: Document =
            serde_json::from_str(r#"{"id": "x", "uid": "draft", "first_publication_date": null}"#)
                .unwrap();

        assert_eq!(post.first_publication_date, None);
        assert!(post.data.content.is_empty());
        assert_eq!(post.data.title, "");
    }

    #[test]
    fn summary_keeps_listing_fields() {
        let page: Page<Document> = serde_json::from_str(SEARCH_RESPONSE).unwrap();
        let page = page.map(PostSummary::from);

        assert_eq!(page.results[0].author, "Joseph Oliveira");
        assert_eq!(
            page.results[0].first_publication_date,
            Some(datetime!(2021-03-25 19:25:28 UTC))
        );
    }
}
