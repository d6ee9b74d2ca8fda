use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use indexmap::IndexMap;
use tokio::sync::RwLock;

use crate::{
    article::Neighbors,
    client::{query_all, ContentError, Direction, Ordering, QueryOptions},
    model::ApiError,
    page::Html,
    site::Site,
};

/// Most slugs remembered as missing at once; the oldest is forgotten first.
pub const MISS_CAPACITY: usize = 512;
pub const MISS_TTL: Duration = Duration::from_secs(60);

/// State of one pre-rendered article.
#[derive(Clone, Debug, PartialEq)]
pub enum Slot {
    Ready(Html),
    /// Generation is running; serve the loading placeholder.
    Pending,
    /// The repository recently had no document with this slug.
    Missing,
}

#[derive(Default)]
struct Slots {
    pages: HashMap<String, Slot>,
    misses: IndexMap<String, Instant>,
}

/// Article pages rendered ahead of requests, keyed by slug.
///
/// Misses are kept apart from rendered pages, bounded by [`MISS_CAPACITY`]
/// and forgotten after the miss TTL, so a post published later is picked up
/// and probing random slugs cannot grow the map.
pub struct StaticPages {
    slots: RwLock<Slots>,
    miss_ttl: Duration,
}

impl Default for StaticPages {
    fn default() -> Self {
        StaticPages::with_miss_ttl(MISS_TTL)
    }
}

impl StaticPages {
    pub fn with_miss_ttl(miss_ttl: Duration) -> Self {
        StaticPages {
            slots: RwLock::default(),
            miss_ttl,
        }
    }

    fn is_live(&self, missed_at: &Instant) -> bool {
        missed_at.elapsed() < self.miss_ttl
    }

    pub async fn get(&self, slug: &str) -> Option<Slot> {
        let slots = self.slots.read().await;
        if let Some(slot) = slots.pages.get(slug) {
            return Some(slot.clone());
        }

        slots
            .misses
            .get(slug)
            .filter(|missed_at| self.is_live(missed_at))
            .map(|_| Slot::Missing)
    }

    /// Marks `slug` pending unless it already has a slot. Returns whether
    /// the caller now owns its generation.
    pub async fn claim(&self, slug: &str) -> bool {
        let mut slots = self.slots.write().await;
        if slots.pages.contains_key(slug) {
            return false;
        }
        if let Some(missed_at) = slots.misses.get(slug) {
            if self.is_live(missed_at) {
                return false;
            }
            slots.misses.shift_remove(slug);
        }

        slots.pages.insert(slug.to_string(), Slot::Pending);
        true
    }

    pub async fn store(&self, slug: &str, html: Html) {
        let mut slots = self.slots.write().await;
        slots.misses.shift_remove(slug);
        slots.pages.insert(slug.to_string(), Slot::Ready(html));
    }

    pub async fn store_missing(&self, slug: &str) {
        let mut slots = self.slots.write().await;
        slots.pages.remove(slug);
        slots.misses.shift_remove(slug);
        slots.misses.retain(|_, missed_at| missed_at.elapsed() < self.miss_ttl);
        while slots.misses.len() >= MISS_CAPACITY {
            slots.misses.shift_remove_index(0);
        }
        slots.misses.insert(slug.to_string(), Instant::now());
    }

    pub async fn release(&self, slug: &str) {
        self.slots.write().await.pages.remove(slug);
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        let slots = self.slots.read().await;
        slots.pages.len() + slots.misses.len()
    }
}

/// Slugs are generated on demand only when they look like one.
pub fn is_plausible_slug(slug: &str) -> bool {
    !slug.is_empty() && slug.len() <= 200 && slug::slugify(slug) == slug
}

/// Renders every published article. Neighbors come from the same ordered
/// listing, so no per-article queries are needed.
pub async fn generate_all(site: &Site) -> Result<usize, ApiError> {
    let options = QueryOptions {
        orderings: vec![Ordering::by_first_publication(Direction::Ascending)],
        ..QueryOptions::default()
    };
    let documents = query_all(&*site.client, &site.document_type, &options).await?;

    for (index, document) in documents.iter().enumerate() {
        let neighbors = Neighbors {
            previous: index.checked_sub(1).and_then(|i| documents.get(i)).cloned(),
            next: documents.get(index + 1).cloned(),
        };
        let html = site.render_document(document, &neighbors, false)?;
        site.pages.store(&document.uid, html).await;
        tracing::debug!(slug = %document.uid, "pre-rendered article");
    }

    tracing::info!(count = documents.len(), "pre-rendered articles");
    Ok(documents.len())
}

/// Renders one article outside the initial pass and records the outcome.
pub async fn generate_one(site: &Site, slug: &str) {
    match site.render_article(slug, None).await {
        Ok(html) => {
            tracing::info!(slug, "generated article on demand");
            site.pages.store(slug, html).await;
        }

        Err(ApiError::Content(ContentError::NotFound { .. })) => {
            tracing::info!(slug, "no such article");
            site.pages.store_missing(slug).await;
        }

        Err(error) => {
            tracing::warn!(slug, %error, "article generation failed, will retry on next request");
            site.pages.release(slug).await;
        }
    }
}

/// Starts on-demand generation of `slug` unless it is already known.
pub async fn spawn_generation(site: Arc<Site>, slug: String) {
    if site.pages.claim(&slug).await {
        tokio::spawn(async move { generate_one(&site, &slug).await });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        client::memory::{fixtures::post, MemoryClient},
        site::tests::{seven_posts, site},
    };

    #[tokio::test]
    async fn pre_renders_every_article_with_neighbors() {
        let site = site(seven_posts());
        assert_eq!(generate_all(&site).await.unwrap(), 7);
        assert_eq!(site.pages.len().await, 7);

        let Some(Slot::Ready(first)) = site.pages.get("post-0").await else {
            panic!("post-0 was not rendered");
        };
        assert!(!first.0.contains("Post anterior"));
        assert!(first.0.contains("Próximo post"));
        assert!(first.0.contains("Title of post-1"));

        let Some(Slot::Ready(last)) = site.pages.get("post-6").await else {
            panic!("post-6 was not rendered");
        };
        assert!(last.0.contains("Post anterior"));
        assert!(!last.0.contains("Próximo post"));
    }

    #[tokio::test]
    async fn generation_follows_every_cursor() {
        // page_size only applies to the listing; the full pass uses the
        // repository default and must still walk every page
        let client = MemoryClient::new(
            (0..45)
                .map(|day| post(&format!("p-{day}"), day, 1))
                .collect(),
        );
        let site = site(client);
        assert_eq!(generate_all(&site).await.unwrap(), 45);
    }

    #[tokio::test]
    async fn claim_is_exclusive() {
        let pages = StaticPages::default();
        assert!(pages.claim("a").await);
        assert!(!pages.claim("a").await);
        assert_eq!(pages.get("a").await, Some(Slot::Pending));

        pages.release("a").await;
        assert!(pages.claim("a").await);
    }

    #[tokio::test]
    async fn on_demand_outcomes() {
        let site = site(seven_posts());

        generate_one(&site, "post-2").await;
        assert!(matches!(site.pages.get("post-2").await, Some(Slot::Ready(_))));

        generate_one(&site, "nope").await;
        assert_eq!(site.pages.get("nope").await, Some(Slot::Missing));
    }

    #[tokio::test]
    async fn unknown_slugs_do_not_grow_the_map() {
        let site = site(seven_posts());
        for n in 0..1000 {
            let slug = format!("random-{n}");
            assert!(site.pages.claim(&slug).await);
            generate_one(&site, &slug).await;
        }

        assert_eq!(site.pages.len().await, MISS_CAPACITY);
        assert_eq!(site.pages.get("random-999").await, Some(Slot::Missing));
        assert_eq!(site.pages.get("random-0").await, None);
    }

    #[tokio::test]
    async fn expired_misses_are_generated_again() {
        let mut site = site(seven_posts());
        site.pages = StaticPages::with_miss_ttl(Duration::ZERO);

        assert!(site.pages.claim("later").await);
        generate_one(&site, "later").await;
        assert_eq!(site.pages.get("later").await, None);
        assert!(site.pages.claim("later").await);
        assert_eq!(site.pages.len().await, 1);
    }

    #[tokio::test]
    async fn rendering_clears_an_earlier_miss() {
        let pages = StaticPages::default();
        pages.store_missing("hooks").await;
        assert!(!pages.claim("hooks").await);

        pages.store("hooks", Html("<h1>hooks</h1>".into())).await;
        assert_eq!(pages.get("hooks").await, Some(Slot::Ready(Html("<h1>hooks</h1>".into()))));
        assert_eq!(pages.len().await, 1);
    }

    #[tokio::test]
    async fn failures_release_the_slot() {
        let site = site(MemoryClient::broken());
        assert!(site.pages.claim("post-1").await);

        generate_one(&site, "post-1").await;
        assert_eq!(site.pages.get("post-1").await, None);
    }

    #[test]
    fn plausible_slugs() {
        assert!(is_plausible_slug("como-utilizar-hooks"));
        assert!(!is_plausible_slug(""));
        assert!(!is_plausible_slug("Not A Slug"));
        assert!(!is_plausible_slug("../etc/passwd"));
    }
}
