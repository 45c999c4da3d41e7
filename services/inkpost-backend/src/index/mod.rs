/// Static index generation.
///
/// Scans a directory of rendered post pages, collects the metadata block
/// of each one, and writes a single index page listing the posts, newest
/// first. Pages without a metadata block are not listed.
use chrono::NaiveDate;
use common::err_context::{ErrorContext, ErrorContextExt};
use std::fmt;
use std::fs;
use std::path::Path;

use crate::domain::PostMeta;

#[derive(Debug)]
pub enum Error {
    Io {
        context: String,
        source: std::io::Error,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io { context, source } => {
                write!(fmt, "Index IO Error: {context} | {source}")
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<ErrorContext<std::io::Error>> for Error {
    fn from(err: ErrorContext<std::io::Error>) -> Self {
        Error::Io {
            context: err.0,
            source: err.1,
        }
    }
}

/// One listed post, extracted from a rendered page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostCard {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub date: Option<String>,
    pub tags: Vec<String>,
    pub bilingual: bool,
}

impl PostCard {
    fn from_page(slug: String, page: &str) -> Option<PostCard> {
        let meta = PostMeta::parse(page)?;
        Some(PostCard {
            title: meta.title().unwrap_or(slug.as_str()).to_string(),
            description: meta.description().unwrap_or_default().to_string(),
            date: meta.date().map(String::from),
            tags: meta.tags(),
            bilingual: meta.bilingual(),
            slug,
        })
    }
}

pub fn build_index(posts_dir: &Path, out: &Path) -> Result<usize, Error> {
    let cards = scan_posts(posts_dir)?;
    let count = cards.len();
    let page = render_index(&cards);
    fs::write(out, page).context(format!("Could not write index to {}", out.display()))?;
    tracing::info!("Wrote index of {} posts to {}", count, out.display());
    Ok(count)
}

/// Reads every html page under `posts_dir` and keeps the ones carrying a
/// metadata block, newest first. The slug is the file name without its
/// extension. An unreadable file fails the whole scan, a stale index is
/// worse than no index.
pub fn scan_posts(posts_dir: &Path) -> Result<Vec<PostCard>, Error> {
    let entries = fs::read_dir(posts_dir).context(format!(
        "Could not read posts directory {}",
        posts_dir.display()
    ))?;

    let mut cards = Vec::new();
    for entry in entries {
        let entry = entry.context("Could not read posts directory entry".to_string())?;
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("html") {
            continue;
        }
        let Some(slug) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };
        let page = fs::read_to_string(&path)
            .context(format!("Could not read post page {}", path.display()))?;
        match PostCard::from_page(slug.to_string(), &page) {
            Some(card) => cards.push(card),
            None => tracing::warn!("Skipping {}: no metadata block", path.display()),
        }
    }

    // Dates are ISO formatted, so the lexicographic order is the
    // chronological one. Undated posts sink to the bottom.
    cards.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.slug.cmp(&b.slug)));
    Ok(cards)
}

pub fn render_index(cards: &[PostCard]) -> String {
    let items: String = cards.iter().map(render_card).collect();
    format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8">
    <title>Posts</title>
    <style>
      body {{ font-family: sans-serif; max-width: 42rem; margin: 4rem auto; }}
      .card {{ margin-bottom: 2rem; }}
      .date {{ color: #666; }}
      .tag {{ background: #eee; border-radius: 4px; padding: 0 0.4rem; }}
    </style>
  </head>
  <body>
    <h1>Posts</h1>
{items}  </body>
</html>
"#
    )
}

fn render_card(card: &PostCard) -> String {
    let date = card
        .date
        .as_deref()
        .map(|date| format!(r#"<span class="date">{}</span>"#, display_date(date)))
        .unwrap_or_default();
    let badges: String = card
        .tags
        .iter()
        .map(|tag| format!(r#"<span class="tag">{tag}</span> "#))
        .collect();
    format!(
        r#"    <div class="card">
      <h2><a href="/posts/{slug}">{title}</a></h2>
      {date}
      <p>{description}</p>
      <p>{badges}</p>
    </div>
"#,
        slug = card.slug,
        title = card.title,
        description = card.description,
    )
}

// A date that does not parse as ISO is shown as written.
fn display_date(date: &str) -> String {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|parsed| parsed.format("%B %-d, %Y").to_string())
        .unwrap_or_else(|_| date.to_string())
}

#[cfg(test)]
mod tests {
    use speculoos::prelude::*;
    use uuid::Uuid;

    use super::*;

    fn page(title: &str, date: &str) -> String {
        format!("<html>\n<!--meta\ntitle: {title}\ndescription: About {title}\ndate: {date}\ntags: rust, notes\n-->\n<h1>{title}</h1>\n</html>")
    }

    #[test]
    fn cards_should_be_ordered_newest_first() {
        let cards = vec![
            PostCard::from_page("old".to_string(), &page("Old", "2024-03-01")).unwrap(),
            PostCard::from_page("new".to_string(), &page("New", "2025-01-15")).unwrap(),
        ];
        let mut sorted = cards.clone();
        sorted.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.slug.cmp(&b.slug)));

        let index = render_index(&sorted);
        let new_pos = index.find("New").unwrap();
        let old_pos = index.find("Old").unwrap();
        assert_that(&new_pos).is_less_than(old_pos);
    }

    #[test]
    fn dates_should_be_displayed_in_long_form() {
        assert_that(&display_date("2025-01-15").as_str()).is_equal_to("January 15, 2025");
        assert_that(&display_date("some day").as_str()).is_equal_to("some day");
    }

    #[test]
    fn a_card_should_carry_its_tag_badges_and_link() {
        let card = PostCard::from_page("hello".to_string(), &page("Hello", "2025-01-15")).unwrap();
        let html = render_card(&card);
        assert_that(&html.contains(r#"<a href="/posts/hello">Hello</a>"#)).is_true();
        assert_that(&html.contains(r#"<span class="tag">rust</span>"#)).is_true();
        assert_that(&html.contains(r#"<span class="tag">notes</span>"#)).is_true();
        assert_that(&html.contains("January 15, 2025")).is_true();
    }

    #[test]
    fn a_page_without_metadata_should_not_become_a_card() {
        let card = PostCard::from_page("hello".to_string(), "<html><h1>Hello</h1></html>");
        assert_that(&card).is_none();
    }

    #[test]
    fn scan_should_skip_pages_without_metadata_and_ignore_other_files() {
        let dir = std::env::temp_dir().join(format!("inkpost-index-{}", Uuid::new_v4()));
        fs::create_dir(&dir).unwrap();

        fs::write(dir.join("hello.html"), page("Hello", "2025-01-15")).unwrap();
        fs::write(dir.join("raw.html"), "<html><h1>No meta</h1></html>").unwrap();
        fs::write(dir.join("notes.txt"), "not a page").unwrap();

        let cards = scan_posts(&dir).unwrap();
        assert_that(&cards).has_length(1);
        assert_that(&cards[0].slug.as_str()).is_equal_to("hello");

        let out = dir.join("index.html");
        let count = build_index(&dir, &out).unwrap();
        assert_that(&count).is_equal_to(1);
        let index = fs::read_to_string(&out).unwrap();
        assert_that(&index.contains("Hello")).is_true();

        fs::remove_dir_all(&dir).unwrap();
    }
}
