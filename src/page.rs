use serde::Serialize;
use tera::{Context, Tera};
use url::Url;

use crate::{article::ArticleView, listing::SummaryView};

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(transparent)]
pub struct Html(pub String);

#[derive(Serialize, Clone, Debug)]
pub struct ListingPage {
    pub posts: Vec<SummaryView>,
    pub cursor: Option<String>,
    /// Value of `?pages=` that shows one more page than this one.
    pub next_pages: u32,
    pub preview: bool,
}

#[derive(Serialize, Clone, Debug)]
pub struct ArticlePage {
    pub article: ArticleView,
    pub comments: Html,
    pub preview: bool,
}

#[derive(Serialize, Clone, Debug)]
struct SiteContext<'a> {
    base: &'a str,
    canonical: String,
    toolbar_repo: &'a str,
}

pub struct Templates {
    tera: Tera,
    proto_host: Url,
    base: String,
    toolbar_repo: String,
}

impl Templates {
    pub fn new(proto_host: Url, base_path: &str, toolbar_repo: &str) -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            ("base.html", include_str!("templates/base.html")),
            ("header.html", include_str!("templates/header.html")),
            ("summaries.html", include_str!("templates/summaries.html")),
            ("index.html", include_str!("templates/index.html")),
            ("post.html", include_str!("templates/post.html")),
            ("loading.html", include_str!("templates/loading.html")),
            ("not_found.html", include_str!("templates/not_found.html")),
            ("error.html", include_str!("templates/error.html")),
        ])?;

        Ok(Templates {
            tera,
            proto_host,
            base: base_path.trim_end_matches('/').to_string(),
            toolbar_repo: toolbar_repo.to_string(),
        })
    }

    fn render(
        &self,
        template: &str,
        path: &str,
        page: &impl Serialize,
    ) -> Result<Html, tera::Error> {
        let canonical = self
            .proto_host
            .join(&format!("{}{}", self.base, path))
            .map(String::from)
            .unwrap_or_else(|_| self.proto_host.to_string());

        let mut context = Context::from_serialize(page)?;
        context.insert(
            "site",
            &SiteContext {
                base: &self.base,
                canonical,
                toolbar_repo: &self.toolbar_repo,
            },
        );

        Ok(Html(self.tera.render(template, &context)?))
    }

    /// Prefix of every route, without a trailing slash.
    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn listing(&self, page: &ListingPage) -> Result<Html, tera::Error> {
        self.render("index.html", "/", page)
    }

    /// Just the entries, for appending to an already rendered listing.
    pub fn summaries(&self, posts: &[SummaryView]) -> Result<Html, tera::Error> {
        #[derive(Serialize)]
        struct Posts<'a> {
            posts: &'a [SummaryView],
        }
        self.render("summaries.html", "/", &Posts { posts })
    }

    pub fn article(&self, page: &ArticlePage) -> Result<Html, tera::Error> {
        self.render("post.html", &format!("/post/{}", page.article.uid), page)
    }

    pub fn loading(&self, path: &str) -> Result<Html, tera::Error> {
        self.render("loading.html", path, &serde_json::json!({}))
    }

    pub fn not_found(&self, path: &str) -> Result<Html, tera::Error> {
        self.render("not_found.html", path, &serde_json::json!({}))
    }

    pub fn error(&self) -> Result<Html, tera::Error> {
        self.render("error.html", "/", &serde_json::json!({}))
    }
}
