use time::{Month, OffsetDateTime};

use crate::model::{document::Document, rich_text};

pub const WORDS_PER_MINUTE: usize = 200;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DateVariant {
    /// `25 mar 2021`
    Short,
    /// `25 mar 2021, às 19:30`
    Edited,
}

fn month_abbreviation(month: Month) -> &'static str {
    match month {
        Month::January => "jan",
        Month::February => "fev",
        Month::March => "mar",
        Month::April => "abr",
        Month::May => "mai",
        Month::June => "jun",
        Month::July => "jul",
        Month::August => "ago",
        Month::September => "set",
        Month::October => "out",
        Month::November => "nov",
        Month::December => "dez",
    }
}

/// Formats in pt-BR, in the offset `timestamp` carries. Convert with
/// [`OffsetDateTime::to_offset`] first to display another zone.
pub fn format_date(timestamp: OffsetDateTime, variant: DateVariant) -> String {
    let date = format!(
        "{:02} {} {}",
        timestamp.day(),
        month_abbreviation(timestamp.month()),
        timestamp.year()
    );

    match variant {
        DateVariant::Short => date,
        DateVariant::Edited => format!(
            "{date}, às {:02}:{:02}",
            timestamp.hour(),
            timestamp.minute()
        ),
    }
}

pub fn estimate_read_minutes(document: &Document) -> usize {
    let words: usize = document
        .data
        .content
        .iter()
        .map(|section| rich_text::as_text(&section.body).split_whitespace().count())
        .sum();

    words.div_ceil(WORDS_PER_MINUTE)
}
