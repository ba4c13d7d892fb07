//! Frequency-filtered, rank-ordered word vocabulary.

use regex::Regex;
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::config::DataConfig;
use crate::parser::ParsedWord;
use crate::Result;

/// Immutable word → rank mapping.
///
/// Ranks are contiguous from zero, ordered by descending presence count with
/// ties in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabulary {
    words: Vec<String>,
    counts: Vec<usize>,
    ranks: HashMap<String, usize>,
}

impl Vocabulary {
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn rank(&self, word: &str) -> Option<usize> {
        self.ranks.get(word).copied()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.ranks.contains_key(word)
    }

    /// Words in rank order
    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Number of documents the word appeared in
    pub fn presence_count(&self, word: &str) -> Option<usize> {
        self.rank(word).map(|rank| self.counts[rank])
    }

    /// Serializable word → rank map with sorted keys
    pub fn to_index_map(&self) -> BTreeMap<String, usize> {
        self.words
            .iter()
            .enumerate()
            .map(|(rank, word)| (word.clone(), rank))
            .collect()
    }
}

/// Presence counter remembering first-seen order
#[derive(Debug, Default)]
struct PresenceCounter {
    order: Vec<String>,
    counts: HashMap<String, usize>,
}

impl PresenceCounter {
    fn observe<'a>(&mut self, document: impl IntoIterator<Item = &'a str>) {
        let mut seen = HashSet::new();
        for word in document {
            if !seen.insert(word) {
                continue;
            }
            match self.counts.get_mut(word) {
                Some(count) => *count += 1,
                None => {
                    self.order.push(word.to_string());
                    self.counts.insert(word.to_string(), 1);
                }
            }
        }
    }

    fn into_vocabulary(self, min_occurrence: usize) -> Vocabulary {
        let counts = self.counts;
        let mut ranked: Vec<(String, usize)> = self
            .order
            .into_iter()
            .filter_map(|word| {
                let count = counts.get(&word).copied().unwrap_or(0);
                (count >= min_occurrence).then_some((word, count))
            })
            .collect();
        // stable: equal counts keep first-seen order
        ranked.sort_by(|a, b| b.1.cmp(&a.1));

        let ranks = ranked
            .iter()
            .enumerate()
            .map(|(rank, (word, _))| (word.clone(), rank))
            .collect();
        let (words, counts) = ranked.into_iter().unzip();

        Vocabulary {
            words,
            counts,
            ranks,
        }
    }
}

/// Builds vocabularies from parsed titles or canonical word sets
#[derive(Debug, Clone)]
pub struct VocabularyBuilder {
    allowed_pos: HashSet<String>,
    ignore_patterns: Vec<Regex>,
    min_occurrence: usize,
}

impl VocabularyBuilder {
    /// Builder with no part-of-speech or pattern filtering
    pub fn new(min_occurrence: usize) -> Self {
        Self {
            allowed_pos: HashSet::new(),
            ignore_patterns: Vec::new(),
            min_occurrence,
        }
    }

    pub fn from_config(config: &DataConfig) -> Result<Self> {
        Ok(Self {
            allowed_pos: config.allowed_pos.iter().cloned().collect(),
            ignore_patterns: config.compiled_word_patterns()?,
            min_occurrence: config.min_word_occur,
        })
    }

    pub fn with_allowed_pos<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_pos = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_ignore_patterns(mut self, patterns: Vec<Regex>) -> Self {
        self.ignore_patterns = patterns;
        self
    }

    pub fn with_min_occurrence(mut self, min_occurrence: usize) -> Self {
        self.min_occurrence = min_occurrence;
        self
    }

    pub fn min_occurrence(&self) -> usize {
        self.min_occurrence
    }

    /// Part of speech allowed (an empty allow-list admits every tag) and
    /// surface not matching any ignore pattern
    pub fn accepts(&self, word: &ParsedWord) -> bool {
        (self.allowed_pos.is_empty() || self.allowed_pos.contains(&word.pos))
            && !self.ignore_patterns.iter().any(|re| re.is_match(&word.surface))
    }

    /// Vocabulary over per-video parsed words, after filtering
    pub fn build_from_parsed<'a, I>(&self, documents: I) -> Vocabulary
    where
        I: IntoIterator<Item = &'a [ParsedWord]>,
    {
        let mut counter = PresenceCounter::default();
        for words in documents {
            counter.observe(
                words
                    .iter()
                    .filter(|w| self.accepts(w))
                    .map(|w| w.surface.as_str()),
            );
        }
        counter.into_vocabulary(self.min_occurrence)
    }

    /// Vocabulary over already filtered per-record word sets
    pub fn build_from_words<'a, I, D>(&self, documents: I) -> Vocabulary
    where
        I: IntoIterator<Item = D>,
        D: IntoIterator<Item = &'a str>,
    {
        let mut counter = PresenceCounter::default();
        for words in documents {
            counter.observe(words);
        }
        counter.into_vocabulary(self.min_occurrence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noun(surface: &str) -> ParsedWord {
        ParsedWord::new(surface, "名詞", 1)
    }

    #[test]
    fn test_inclusion_threshold_and_rank() {
        let docs: Vec<Vec<&str>> = vec![
            vec!["foo", "bar"],
            vec!["foo", "baz"],
            vec!["foo", "bar"],
            vec!["baz", "qux"],
        ];
        let vocab = VocabularyBuilder::new(2).build_from_words(docs.iter().map(|d| d.iter().copied()));

        assert_eq!(vocab.words(), &["foo", "bar", "baz"]);
        assert_eq!(vocab.rank("foo"), Some(0));
        assert_eq!(vocab.rank("bar"), Some(1));
        assert_eq!(vocab.rank("baz"), Some(2));
        assert_eq!(vocab.rank("qux"), None);
        assert_eq!(vocab.presence_count("foo"), Some(3));
    }

    #[test]
    fn test_presence_not_frequency() {
        let docs = vec![vec!["foo", "foo", "foo"], vec!["bar"], vec!["bar"]];
        let vocab = VocabularyBuilder::new(2).build_from_words(docs.iter().map(|d| d.iter().copied()));

        assert_eq!(vocab.words(), &["bar"]);
        assert!(!vocab.contains("foo"));
    }

    #[test]
    fn test_pos_and_pattern_filtering() {
        let builder = VocabularyBuilder::new(1)
            .with_allowed_pos(["名詞", "動詞"])
            .with_ignore_patterns(vec![Regex::new("^[0-9]+$").unwrap()]);
        let docs = vec![vec![
            noun("猫"),
            ParsedWord::new("走る", "動詞", 1),
            ParsedWord::new("は", "助詞", 1),
            noun("2023"),
        ]];

        let vocab = builder.build_from_parsed(docs.iter().map(Vec::as_slice));
        assert_eq!(vocab.words(), &["猫", "走る"]);
    }

    #[test]
    fn test_index_map_is_sorted_by_word() {
        let docs = vec![vec!["b", "a"]];
        let vocab = VocabularyBuilder::new(1).build_from_words(docs.iter().map(|d| d.iter().copied()));
        let map = vocab.to_index_map();

        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(map["b"], 0);
        assert_eq!(map["a"], 1);
    }

    #[test]
    fn test_empty_corpus() {
        let vocab = VocabularyBuilder::new(1).build_from_parsed(std::iter::empty::<&[ParsedWord]>());
        assert!(vocab.is_empty());
    }
}
