use std::{path::Path as FsPath, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::{
    client::ContentError,
    compat::error_page,
    generate::{is_plausible_slug, spawn_generation, Slot},
    model::ApiError,
    preview::{self, PreviewRef},
    site::{MorePosts, Site},
};

pub fn router(site: Arc<Site>, static_dir: Option<&FsPath>, base_path: &str) -> Router {
    let mut routes = Router::new()
        .route("/", get(index))
        .route("/post/:slug", get(post))
        .route("/api/posts", get(more_posts))
        .route("/api/preview", get(enter_preview))
        .route("/api/exit-preview", get(exit_preview))
        .with_state(site);

    if let Some(static_dir) = static_dir {
        routes = routes.fallback_service(ServeDir::new(static_dir));
    }

    let base_path = base_path.trim_end_matches('/');
    let routes = if base_path.is_empty() {
        routes
    } else {
        Router::new().nest(base_path, routes)
    };

    routes.layer(TraceLayer::new_for_http())
}

#[derive(Deserialize, Debug)]
struct ListingQuery {
    pages: Option<u32>,
}

async fn index(
    State(site): State<Arc<Site>>,
    preview: PreviewRef,
    Query(query): Query<ListingQuery>,
) -> Response {
    match site
        .render_listing(query.pages.unwrap_or(1), preview.as_deref())
        .await
    {
        Ok(html) => Html(html.0).into_response(),
        Err(error) => error_page(&site.templates, "/", error),
    }
}

async fn post(
    State(site): State<Arc<Site>>,
    Path(slug): Path<String>,
    preview: PreviewRef,
) -> Response {
    let path = format!("/post/{slug}");

    if let Some(reference) = preview.as_deref() {
        return match site.render_article(&slug, Some(reference)).await {
            Ok(html) => Html(html.0).into_response(),
            Err(error) => error_page(&site.templates, &path, error),
        };
    }

    match site.pages.get(&slug).await {
        Some(Slot::Ready(html)) => Html(html.0).into_response(),
        Some(Slot::Pending) => loading(&site, &path),
        Some(Slot::Missing) => not_found(&site, &path, slug),
        None if !is_plausible_slug(&slug) => not_found(&site, &path, slug),
        None => {
            spawn_generation(site.clone(), slug).await;
            loading(&site, &path)
        }
    }
}

fn loading(site: &Site, path: &str) -> Response {
    match site.templates.loading(path) {
        Ok(html) => (
            StatusCode::OK,
            [(header::CACHE_CONTROL, "no-store")],
            Html(html.0),
        )
            .into_response(),
        Err(error) => error_page(&site.templates, path, error.into()),
    }
}

fn not_found(site: &Site, path: &str, slug: String) -> Response {
    let error = ContentError::NotFound {
        document_type: site.document_type.clone(),
        uid: slug,
    };
    error_page(&site.templates, path, error.into())
}

#[derive(Deserialize, Debug)]
struct CursorQuery {
    cursor: String,
}

async fn more_posts(
    State(site): State<Arc<Site>>,
    Query(query): Query<CursorQuery>,
) -> Result<Json<MorePosts>, ApiError> {
    Ok(Json(site.more_posts(&query.cursor).await?))
}

#[derive(Deserialize, Debug)]
struct PreviewQuery {
    token: String,
}

async fn enter_preview(
    State(site): State<Arc<Site>>,
    Query(query): Query<PreviewQuery>,
) -> Response {
    match preview::set_cookie(&query.token).filter(|_| !query.token.is_empty()) {
        Some(cookie) => (
            [(header::SET_COOKIE, cookie)],
            Redirect::to(&format!("{}/", site.templates.base())),
        )
            .into_response(),
        None => ApiError::BadRequest("empty or unusable preview token".to_string()).into_response(),
    }
}

async fn exit_preview(State(site): State<Arc<Site>>) -> Response {
    (
        [(header::SET_COOKIE, preview::clear_cookie())],
        Redirect::to(&format!("{}/", site.templates.base())),
    )
        .into_response()
}
