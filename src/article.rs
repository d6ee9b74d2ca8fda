use std::collections::HashSet;

use serde::Serialize;
use time::UtcOffset;

use crate::{
    client::{ContentClient, ContentError, Direction, Ordering, QueryOptions},
    format::{estimate_read_minutes, format_date, DateVariant},
    model::{document::Document, rich_text},
    page::Html,
};

/// The posts published right before and right after another one.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Neighbors {
    pub previous: Option<Document>,
    pub next: Option<Document>,
}

pub async fn find_neighbors(
    client: &dyn ContentClient,
    document_type: &str,
    document: &Document,
    reference: Option<&str>,
) -> Result<Neighbors, ContentError> {
    let after = |direction| QueryOptions {
        reference: reference.map(String::from),
        page_size: Some(1),
        after: Some(document.id.clone()),
        orderings: vec![Ordering::by_first_publication(direction)],
    };
    let older = after(Direction::Descending);
    let newer = after(Direction::Ascending);

    let (older, newer) = futures_util::try_join!(
        client.query(document_type, &older),
        client.query(document_type, &newer),
    )?;

    Ok(Neighbors {
        previous: older.results.into_iter().next(),
        next: newer.results.into_iter().next(),
    })
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct NeighborLink {
    pub title: String,
    pub href: String,
}

impl From<&Document> for NeighborLink {
    fn from(document: &Document) -> Self {
        NeighborLink {
            title: document.data.title.clone(),
            href: format!("/post/{}", document.uid),
        }
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct SectionView {
    pub heading: String,
    pub anchor: String,
    pub html: Html,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct ArticleView {
    pub uid: String,
    pub title: String,
    pub banner_url: Option<String>,
    pub author: String,
    pub published: Option<String>,
    pub edited: Option<String>,
    pub read_minutes: usize,
    pub sections: Vec<SectionView>,
    pub previous: Option<NeighborLink>,
    pub next: Option<NeighborLink>,
}

impl ArticleView {
    pub fn assemble(document: &Document, neighbors: &Neighbors, offset: UtcOffset) -> Self {
        let published = document.first_publication_date;
        let edited = document
            .last_publication_date
            .filter(|edited| Some(*edited) != published);

        let mut taken = HashSet::new();
        let sections = document
            .data
            .content
            .iter()
            .map(|section| {
                let base = slug::slugify(&section.heading);
                let mut anchor = base.clone();
                let mut seen = 1;
                while !taken.insert(anchor.clone()) {
                    seen += 1;
                    anchor = format!("{base}-{seen}");
                }

                SectionView {
                    heading: section.heading.clone(),
                    anchor,
                    html: Html(rich_text::as_html(&section.body)),
                }
            })
            .collect();

        ArticleView {
            uid: document.uid.clone(),
            title: document.data.title.clone(),
            banner_url: document.data.banner.url.clone(),
            author: document.data.author.clone(),
            published: published
                .map(|date| format_date(date.to_offset(offset), DateVariant::Short)),
            edited: edited.map(|date| format_date(date.to_offset(offset), DateVariant::Edited)),
            read_minutes: estimate_read_minutes(document),
            sections,
            previous: neighbors.previous.as_ref().map(NeighborLink::from),
            next: neighbors.next.as_ref().map(NeighborLink::from),
        }
    }
}
