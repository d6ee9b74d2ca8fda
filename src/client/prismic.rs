use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize};
use url::Url;

use crate::{
    client::{ContentClient, ContentError, Direction, Ordering, QueryOptions},
    model::document::{Document, Page},
};

/// HTTP client for a Prismic-style REST API, rooted at `.../api/v2`.
pub struct PrismicClient {
    http: Client,
    endpoint: Url,
    access_token: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ApiRoot {
    refs: Vec<ApiRef>,
}

#[derive(Deserialize, Debug)]
struct ApiRef {
    #[serde(rename = "ref")]
    reference: String,
    #[serde(rename = "isMasterRef", default)]
    is_master_ref: bool,
}

impl PrismicClient {
    pub fn new(endpoint: Url, access_token: Option<String>) -> Result<Self, ContentError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .gzip(true)
            .user_agent(concat!("spacetraveling/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            endpoint,
            access_token,
        })
    }

    async fn master_ref(&self) -> Result<String, ContentError> {
        let mut url = self.endpoint.clone();
        if let Some(token) = &self.access_token {
            url.query_pairs_mut().append_pair("access_token", token);
        }

        tracing::debug!(path = url.path(), "reading repository refs");
        let root: ApiRoot = self.get_json(url).await?;

        root.refs
            .into_iter()
            .find(|api_ref| api_ref.is_master_ref)
            .map(|api_ref| api_ref.reference)
            .ok_or(ContentError::NoMasterRef)
    }

    async fn resolve_ref(&self, reference: Option<&str>) -> Result<String, ContentError> {
        match reference {
            Some(reference) => Ok(reference.to_string()),
            None => self.master_ref().await,
        }
    }

    fn search_url(
        &self,
        reference: &str,
        predicates: &[String],
        options: &QueryOptions,
    ) -> Result<Url, ContentError> {
        let mut url = Url::parse(&format!(
            "{}/documents/search",
            self.endpoint.as_str().trim_end_matches('/')
        ))?;

        let mut params = vec![
            ("ref", reference.to_string()),
            ("q", format!("[{}]", predicates.concat())),
        ];
        if let Some(page_size) = options.page_size {
            params.push(("pageSize", page_size.to_string()));
        }
        if let Some(after) = &options.after {
            params.push(("after", after.clone()));
        }
        if !options.orderings.is_empty() {
            params.push(("orderings", render_orderings(&options.orderings)));
        }
        if let Some(token) = &self.access_token {
            params.push(("access_token", token.clone()));
        }

        // only fails on non-string keys, which a list of pairs never has
        let query = serde_urlencoded::to_string(&params).unwrap_or_default();
        url.set_query(Some(&query));
        Ok(url)
    }

    fn check_cursor(&self, cursor: &str) -> Result<Url, ContentError> {
        let url = Url::parse(cursor)?;
        if url.origin() != self.endpoint.origin() {
            return Err(ContentError::ForeignCursor(cursor.to_string()));
        }
        Ok(url)
    }

    async fn search(&self, url: Url) -> Result<Page<Document>, ContentError> {
        tracing::debug!(path = url.path(), "searching content repository");
        self.get_json(url).await
    }

    /// Errors drop the URL, which may carry the access token.
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ContentError> {
        let response: Result<T, reqwest::Error> = async {
            self.http
                .get(url)
                .send()
                .await?
                .error_for_status()?
                .json()
                .await
        }
        .await;

        response.map_err(|error| ContentError::Http(error.without_url()))
    }
}

fn at(path: &str, value: &str) -> String {
    format!("[at({path},{})]", serde_json::Value::from(value))
}

fn render_orderings(orderings: &[Ordering]) -> String {
    let fields = orderings
        .iter()
        .map(|ordering| match ordering.direction {
            Direction::Ascending => ordering.field.clone(),
            Direction::Descending => format!("{} desc", ordering.field),
        })
        .collect::<Vec<_>>();
    format!("[{}]", fields.join(","))
}

#[async_trait]
impl ContentClient for PrismicClient {
    async fn query(
        &self,
        document_type: &str,
        options: &QueryOptions,
    ) -> Result<Page<Document>, ContentError> {
        let reference = self.resolve_ref(options.reference.as_deref()).await?;
        let url = self.search_url(&reference, &[at("document.type", document_type)], options)?;
        self.search(url).await
    }

    async fn get_by_uid(
        &self,
        document_type: &str,
        uid: &str,
        reference: Option<&str>,
    ) -> Result<Document, ContentError> {
        let reference = self.resolve_ref(reference).await?;
        let predicates = [
            at("document.type", document_type),
            at(&format!("my.{document_type}.uid"), uid),
        ];
        let options = QueryOptions {
            page_size: Some(1),
            ..QueryOptions::default()
        };
        let url = self.search_url(&reference, &predicates, &options)?;

        self.search(url)
            .await?
            .results
            .into_iter()
            .next()
            .ok_or_else(|| ContentError::NotFound {
                document_type: document_type.to_string(),
                uid: uid.to_string(),
            })
    }

    async fn fetch_page(&self, cursor: &str) -> Result<Page<Document>, ContentError> {
        let url = self.check_cursor(cursor)?;
        self.search(url).await
    }
}
