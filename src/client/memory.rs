//! In-memory repository for tests. Cursors are `https://memory.test` URLs.

use async_trait::async_trait;
use url::Url;

use crate::{
    client::{ContentClient, ContentError, Direction, QueryOptions},
    model::document::{Document, Page},
};

const DEFAULT_PAGE_SIZE: usize = 20;

#[derive(Default)]
pub struct MemoryClient {
    /// Published documents, oldest first.
    documents: Vec<Document>,
    /// Documents only visible through this preview ref.
    preview: Option<(String, Vec<Document>)>,
    broken: bool,
}

impl MemoryClient {
    pub fn new(mut documents: Vec<Document>) -> Self {
        documents.sort_by_key(|document| document.first_publication_date);
        Self {
            documents,
            ..Self::default()
        }
    }

    pub fn with_preview(mut self, reference: &str, documents: Vec<Document>) -> Self {
        self.preview = Some((reference.to_string(), documents));
        self
    }

    /// Every call fails, like an unreachable repository.
    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Self::default()
        }
    }

    fn documents(&self, reference: Option<&str>) -> &[Document] {
        match (&self.preview, reference) {
            (Some((preview_ref, documents)), Some(reference)) if preview_ref == reference => {
                documents
            }
            _ => &self.documents,
        }
    }

    fn page(
        &self,
        reference: Option<&str>,
        descending: bool,
        offset: usize,
        size: usize,
    ) -> Page<Document> {
        let mut ordered = self.documents(reference).to_vec();
        if descending {
            ordered.reverse();
        }

        let results = ordered.iter().skip(offset).take(size).cloned().collect();
        let next_offset = offset + size;
        let next_page = (next_offset < ordered.len()).then(|| {
            let mut cursor = Url::parse("https://memory.test/search").unwrap();
            cursor
                .query_pairs_mut()
                .append_pair("offset", &next_offset.to_string())
                .append_pair("size", &size.to_string())
                .append_pair("desc", &descending.to_string());
            if let Some(reference) = reference {
                cursor.query_pairs_mut().append_pair("ref", reference);
            }
            cursor.to_string()
        });

        Page {
            page: (offset / size.max(1)) as u32 + 1,
            total_pages: ordered.len().div_ceil(size.max(1)) as u32,
            results,
            next_page,
            prev_page: None,
        }
    }
}

#[async_trait]
impl ContentClient for MemoryClient {
    async fn query(
        &self,
        _document_type: &str,
        options: &QueryOptions,
    ) -> Result<Page<Document>, ContentError> {
        if self.broken {
            return Err(ContentError::NoMasterRef);
        }

        let descending = options
            .orderings
            .first()
            .is_some_and(|ordering| ordering.direction == Direction::Descending);
        let size = options.page_size.map_or(DEFAULT_PAGE_SIZE, |size| size as usize);
        let reference = options.reference.as_deref();

        let offset = match &options.after {
            Some(after) => {
                let mut ordered = self.documents(reference).to_vec();
                if descending {
                    ordered.reverse();
                }
                ordered
                    .iter()
                    .position(|document| &document.id == after)
                    .map_or(ordered.len(), |index| index + 1)
            }
            None => 0,
        };

        Ok(self.page(reference, descending, offset, size))
    }

    async fn get_by_uid(
        &self,
        document_type: &str,
        uid: &str,
        reference: Option<&str>,
    ) -> Result<Document, ContentError> {
        if self.broken {
            return Err(ContentError::NoMasterRef);
        }

        self.documents(reference)
            .iter()
            .find(|document| document.uid == uid)
            .cloned()
            .ok_or_else(|| ContentError::NotFound {
                document_type: document_type.to_string(),
                uid: uid.to_string(),
            })
    }

    async fn fetch_page(&self, cursor: &str) -> Result<Page<Document>, ContentError> {
        if self.broken {
            return Err(ContentError::NoMasterRef);
        }

        let url = Url::parse(cursor)?;
        if url.host_str() != Some("memory.test") {
            return Err(ContentError::ForeignCursor(cursor.to_string()));
        }

        let param = |name: &str| {
            url.query_pairs()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.into_owned())
        };
        let offset = param("offset").and_then(|v| v.parse().ok()).unwrap_or(0);
        let size = param("size")
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_PAGE_SIZE);
        let descending = param("desc").is_some_and(|v| v == "true");

        Ok(self.page(param("ref").as_deref(), descending, offset, size))
    }
}

pub mod fixtures {
    use time::{Duration, OffsetDateTime};

    use crate::model::{
        document::{Banner, Document, DocumentData, Section},
        rich_text::{Block, TextBlock},
    };

    /// A post published `day` days after 2021-03-01 with one section of
    /// `words` words.
    pub fn post(uid: &str, day: i64, words: usize) -> Document {
        let published = time::macros::datetime!(2021-03-01 12:00:00 UTC) + Duration::days(day);
        Document {
            id: format!("id-{uid}"),
            uid: uid.to_string(),
            first_publication_date: Some(published),
            last_publication_date: Some(published),
            data: DocumentData {
                title: format!("Title of {uid}"),
                subtitle: format!("Subtitle of {uid}"),
                author: "Ana Souza".to_string(),
                banner: Banner {
                    url: Some(format!("https://images.example.com/{uid}.png")),
                },
                content: vec![Section {
                    heading: format!("Heading of {uid}"),
                    body: vec![Block::Paragraph(TextBlock {
                        text: vec!["palavra"; words].join(" "),
                        spans: Vec::new(),
                    })],
                }],
            },
        }
    }

    pub fn edited(mut document: Document, at: OffsetDateTime) -> Document {
        document.last_publication_date = Some(at);
        document
    }
}
