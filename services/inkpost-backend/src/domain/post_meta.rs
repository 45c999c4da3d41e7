use std::collections::HashMap;

/// Sentinel lines bounding the metadata block the site generator embeds
/// in every rendered post page.
const META_BLOCK_START: &str = "<!--meta";
const META_BLOCK_END: &str = "-->";

/// The key/value metadata block extracted from one rendered post page.
///
/// Expected keys are `title`, `description`, `tags` (comma separated),
/// `date` and `bilingual`, but the mapping carries whatever the block
/// declares. It is computed fresh from the page markup on every use.
#[derive(Debug, Clone, PartialEq)]
pub struct PostMeta(HashMap<String, String>);

impl PostMeta {
    /// Extracts the metadata block from rendered page markup.
    ///
    /// The scan has two phases: first locate the block bounded by the two
    /// sentinel lines, then split each line of the block on its first `:`.
    /// A missing block yields `None` so callers can branch; it is not an
    /// error. Lines without a separator, or with an empty key or value
    /// after trimming, are skipped. A repeated key keeps its last value.
    pub fn parse(page: &str) -> Option<PostMeta> {
        let mut lines = page.lines();

        lines.find(|line| line.trim() == META_BLOCK_START)?;

        let mut entries = HashMap::new();
        let mut closed = false;
        for line in lines.by_ref() {
            if line.trim() == META_BLOCK_END {
                closed = true;
                break;
            }
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim();
            let value = value.trim();
            if key.is_empty() || value.is_empty() {
                continue;
            }
            entries.insert(key.to_string(), value.to_string());
        }

        if !closed {
            return None;
        }

        Some(PostMeta(entries))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn title(&self) -> Option<&str> {
        self.get("title")
    }

    pub fn description(&self) -> Option<&str> {
        self.get("description")
    }

    pub fn date(&self) -> Option<&str> {
        self.get("date")
    }

    /// Tags as a list, split on commas and trimmed.
    pub fn tags(&self) -> Vec<String> {
        self.get("tags")
            .map(|tags| {
                tags.split(',')
                    .map(str::trim)
                    .filter(|tag| !tag.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn bilingual(&self) -> bool {
        self.get("bilingual") == Some("true")
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use speculoos::prelude::*;

    fn page_with_block(block: &str) -> String {
        format!("<html>\n<body>\n<!--meta\n{block}\n-->\n<h1>Post</h1>\n</body>\n</html>")
    }

    #[test]
    fn should_extract_all_keys_trimmed() {
        let page = page_with_block("title: Hello\ndate: 2025-01-01\ntags: ai, writing");
        let meta = PostMeta::parse(&page).unwrap();
        assert_that(&meta.len()).is_equal_to(3);
        assert_that(&meta.title()).is_equal_to(Some("Hello"));
        assert_that(&meta.date()).is_equal_to(Some("2025-01-01"));
        assert_that(&meta.get("tags")).is_equal_to(Some("ai, writing"));
        assert_that(&meta.tags()).is_equal_to(vec!["ai".to_string(), "writing".to_string()]);
    }

    #[test]
    fn should_return_none_when_no_block_is_present() {
        let page = "<html><body><h1>Post</h1></body></html>";
        assert_that(&PostMeta::parse(page)).is_none();
    }

    #[test]
    fn should_return_none_when_the_block_is_not_closed() {
        let page = "<html>\n<!--meta\ntitle: Hello\n<h1>Post</h1>";
        assert_that(&PostMeta::parse(page)).is_none();
    }

    #[test]
    fn should_skip_lines_without_a_separator() {
        let page = page_with_block("title: Hello\njust some text\ndate: 2025-01-01");
        let meta = PostMeta::parse(&page).unwrap();
        assert_that(&meta.len()).is_equal_to(2);
    }

    #[test]
    fn should_skip_empty_keys_and_values() {
        let page = page_with_block(": nothing\ntitle:   \ndate: 2025-01-01");
        let meta = PostMeta::parse(&page).unwrap();
        assert_that(&meta.len()).is_equal_to(1);
        assert_that(&meta.title()).is_none();
    }

    #[test]
    fn duplicate_keys_should_keep_the_last_value() {
        let page = page_with_block("title: First\ntitle: Second");
        let meta = PostMeta::parse(&page).unwrap();
        assert_that(&meta.title()).is_equal_to(Some("Second"));
    }

    #[test]
    fn values_should_keep_separators_after_the_first() {
        let page = page_with_block("description: One: two: three");
        let meta = PostMeta::parse(&page).unwrap();
        assert_that(&meta.description()).is_equal_to(Some("One: two: three"));
    }

    #[test]
    fn surrounding_whitespace_should_be_trimmed() {
        let page = page_with_block("  title  :   Spaced Out   ");
        let meta = PostMeta::parse(&page).unwrap();
        assert_that(&meta.title()).is_equal_to(Some("Spaced Out"));
    }

    #[test]
    fn bilingual_flag_should_default_to_false() {
        let page = page_with_block("title: Hello");
        let meta = PostMeta::parse(&page).unwrap();
        assert_that(&meta.bilingual()).is_false();

        let page = page_with_block("title: Hello\nbilingual: true");
        let meta = PostMeta::parse(&page).unwrap();
        assert_that(&meta.bilingual()).is_true();
    }
}
