//! Ordered keyword rule tables

/// One row of a first-match-wins table: any keyword substring selects `label`
#[derive(Debug, Clone, Copy)]
pub struct KeywordRule<L: 'static> {
    pub keywords: &'static [&'static str],
    pub label: L,
}

impl<L: Copy> KeywordRule<L> {
    pub const fn new(keywords: &'static [&'static str], label: L) -> Self {
        Self { keywords, label }
    }

    /// `text` is expected to be lowercased already
    pub fn matches(&self, text: &str) -> bool {
        self.keywords.iter().any(|k| text.contains(k))
    }
}

/// Label of the first rule with a keyword in `text`
pub fn first_match<L: Copy>(rules: &[KeywordRule<L>], text: &str) -> Option<L> {
    rules.iter().find(|r| r.matches(text)).map(|r| r.label)
}
