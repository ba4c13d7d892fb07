//! Canonical per-video records and the `dataset.tsv` artifact.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

use super::vocabulary::{Vocabulary, VocabularyBuilder};
use crate::artifacts::ArtifactStore;
use crate::config::DataConfig;
use crate::crawler::RawVideoItem;
use crate::{PipelineError, Result};

const FIELD_DELIMITER: char = '\t';
const WORD_DELIMITER: char = '|';
const DATE_FORMAT: &str = "%Y/%m/%d";
const HEADER: [&str; 9] = [
    "id", "date", "wday", "title", "view", "like", "dislike", "comment", "words",
];
/// Words made only of these characters carry no signal on their own
const LATIN_ONLY: &str = "^[a-zA-Z0-9'’]+$";

/// Filtered, normalized row of the dataset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRecord {
    pub id: String,
    pub date: NaiveDate,
    /// 0 = Monday .. 6 = Sunday
    pub weekday: u32,
    pub title: String,
    pub view: u64,
    pub like: u64,
    pub dislike: u64,
    pub comment: u64,
    /// Retained surface words, unique, in title order
    pub words: Vec<String>,
}

impl CanonicalRecord {
    fn to_tsv_line(&self) -> String {
        let fields = [
            self.id.clone(),
            self.date.format(DATE_FORMAT).to_string(),
            self.weekday.to_string(),
            self.title.clone(),
            self.view.to_string(),
            self.like.to_string(),
            self.dislike.to_string(),
            self.comment.to_string(),
            self.words.join(&WORD_DELIMITER.to_string()),
        ];
        fields.join(&FIELD_DELIMITER.to_string())
    }

    fn from_tsv_line(line: &str) -> std::result::Result<Self, String> {
        let fields: Vec<&str> = line.split(FIELD_DELIMITER).collect();
        if fields.len() != HEADER.len() {
            return Err(format!(
                "expected {} fields, found {}",
                HEADER.len(),
                fields.len()
            ));
        }

        let number = |i: usize| -> std::result::Result<u64, String> {
            fields[i]
                .parse()
                .map_err(|e| format!("{} {:?}: {}", HEADER[i], fields[i], e))
        };

        let date = NaiveDate::parse_from_str(fields[1], DATE_FORMAT)
            .map_err(|e| format!("date {:?}: {}", fields[1], e))?;

        Ok(Self {
            id: fields[0].to_string(),
            date,
            weekday: date.weekday().num_days_from_monday(),
            title: fields[3].to_string(),
            view: number(4)?,
            like: number(5)?,
            dislike: number(6)?,
            comment: number(7)?,
            words: fields[8]
                .split(WORD_DELIMITER)
                .filter(|w| !w.is_empty())
                .map(str::to_string)
                .collect(),
        })
    }
}

/// Render records as the tab-separated dataset artifact
pub fn format_dataset(records: &[CanonicalRecord]) -> String {
    let mut out = HEADER.join(&FIELD_DELIMITER.to_string());
    out.push('\n');
    for record in records {
        out.push_str(&record.to_tsv_line());
        out.push('\n');
    }
    out
}

/// Parse the dataset artifact; `path` is only used in error messages
pub fn parse_dataset(content: &str, path: &Path) -> Result<Vec<CanonicalRecord>> {
    let mut lines = content.lines();
    match lines.next() {
        Some(header) if header.split(FIELD_DELIMITER).eq(HEADER.iter().copied()) => {}
        _ => {
            return Err(PipelineError::InvalidArtifact {
                path: path.to_path_buf(),
                reason: "missing or unexpected header".to_string(),
            })
        }
    }

    lines
        .enumerate()
        .filter(|(_, line)| !line.is_empty())
        .map(|(i, line)| {
            CanonicalRecord::from_tsv_line(line).map_err(|reason| PipelineError::InvalidArtifact {
                path: path.to_path_buf(),
                reason: format!("line {}: {}", i + 2, reason),
            })
        })
        .collect()
}

/// Filters raw detail items into canonical records
pub struct DatasetBuilder {
    candidates: VocabularyBuilder,
    ignore_titles: Vec<Regex>,
    latin_only: Regex,
}

impl DatasetBuilder {
    pub fn from_config(config: &DataConfig) -> Result<Self> {
        Ok(Self {
            candidates: VocabularyBuilder::from_config(config)?.with_min_occurrence(1),
            ignore_titles: config.compiled_title_patterns()?,
            latin_only: Regex::new(LATIN_ONLY)?,
        })
    }

    /// Candidate vocabulary: every filtered word seen in any parsed title
    pub fn candidate_vocabulary(&self, items: &[RawVideoItem]) -> Vocabulary {
        self.candidates.build_from_parsed(
            items
                .iter()
                .filter_map(|item| item.parsed_title.as_deref()),
        )
    }

    /// Canonical records for every item that survives filtering
    pub fn build(&self, items: &[RawVideoItem]) -> Vec<CanonicalRecord> {
        let vocabulary = self.candidate_vocabulary(items);
        let mut records = Vec::new();
        let mut malformed = 0usize;
        let mut filtered = 0usize;

        for item in items {
            match self.canonicalize(item, &vocabulary) {
                Ok(Some(record)) => records.push(record),
                Ok(None) => filtered += 1,
                Err(e) => {
                    debug!("Skipping item: {}", e);
                    malformed += 1;
                }
            }
        }

        info!(
            "📊 Built {} records ({} filtered, {} malformed) from {} items",
            records.len(),
            filtered,
            malformed,
            items.len()
        );
        records
    }

    /// `Ok(None)` when the item is filtered out, `MalformedRecord` when it
    /// lacks required metadata
    pub fn canonicalize(
        &self,
        item: &RawVideoItem,
        vocabulary: &Vocabulary,
    ) -> Result<Option<CanonicalRecord>> {
        let malformed = |reason: &str| PipelineError::MalformedRecord {
            id: item.id.clone(),
            reason: reason.to_string(),
        };

        let snippet = item.snippet.as_ref().ok_or_else(|| malformed("missing snippet"))?;
        let statistics = item
            .statistics
            .as_ref()
            .ok_or_else(|| malformed("missing statistics"))?;
        let title = snippet.title.as_deref().ok_or_else(|| malformed("missing title"))?;

        if self.ignore_titles.iter().any(|re| re.is_match(title)) {
            return Ok(None);
        }

        let published_at = snippet
            .published_at
            .as_deref()
            .ok_or_else(|| malformed("missing publishedAt"))?;
        let date = DateTime::parse_from_rfc3339(published_at)
            .map_err(|e| malformed(&format!("publishedAt {:?}: {}", published_at, e)))?
            .with_timezone(&Utc)
            .date_naive();
        let view = statistics.view_count().ok_or_else(|| malformed("missing viewCount"))?;
        let comment = statistics
            .comment_count()
            .ok_or_else(|| malformed("missing commentCount"))?;
        let parsed = item
            .parsed_title
            .as_deref()
            .ok_or_else(|| malformed("title not parsed"))?;

        let mut seen = HashSet::new();
        let words: Vec<String> = parsed
            .iter()
            .map(|w| w.surface.as_str())
            .filter(|surface| vocabulary.contains(surface))
            .filter(|surface| !surface.contains([FIELD_DELIMITER, WORD_DELIMITER, '\n', '\r']))
            .filter(|surface| seen.insert(*surface))
            .map(str::to_string)
            .collect();

        if words.iter().all(|w| self.latin_only.is_match(w)) {
            return Ok(None);
        }

        Ok(Some(CanonicalRecord {
            id: item.id.clone(),
            date,
            weekday: date.weekday().num_days_from_monday(),
            title: title.replace([FIELD_DELIMITER, '\n', '\r'], " "),
            view,
            like: statistics.like_count(),
            dislike: statistics.dislike_count(),
            comment,
            words,
        }))
    }

    /// Rebuild `dataset.tsv` from the detail cache
    pub fn run(&self, store: &ArtifactStore) -> Result<Vec<CanonicalRecord>> {
        let items: Vec<RawVideoItem> = store.require_json(&store.video_detail_list_path())?;
        let records = self.build(&items);
        store.write_text(&store.dataset_path(), &format_dataset(&records))?;
        info!("💾 Dataset written to {}", store.dataset_path().display());
        Ok(records)
    }
}

/// Read `dataset.tsv`
pub fn load_dataset(store: &ArtifactStore) -> Result<Vec<CanonicalRecord>> {
    let path = store.dataset_path();
    let content = store.read_text(&path)?;
    parse_dataset(&content, &path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::{Snippet, Statistics};
    use crate::parser::ParsedWord;
    use serde_json::json;

    fn item(id: &str, published: &str, title: &str, words: Vec<ParsedWord>) -> RawVideoItem {
        let mut item = RawVideoItem::new(id);
        item.snippet = Some(Snippet {
            published_at: Some(published.to_string()),
            title: Some(title.to_string()),
            ..Default::default()
        });
        item.statistics = Some(
            serde_json::from_value::<Statistics>(json!({
                "viewCount": "100",
                "likeCount": "10",
                "commentCount": "3"
            }))
            .unwrap(),
        );
        item.parsed_title = Some(words);
        item
    }

    fn noun(surface: &str) -> ParsedWord {
        ParsedWord::new(surface, "名詞", 1)
    }

    fn builder() -> DatasetBuilder {
        DatasetBuilder::from_config(&DataConfig::default()).unwrap()
    }

    #[test]
    fn test_canonical_record_fields() {
        let items = vec![item(
            "v1",
            "2023-01-05T10:00:00Z",
            "猫と犬",
            vec![noun("猫"), ParsedWord::new("と", "助詞", 1), noun("犬"), noun("猫")],
        )];
        let records = builder().build(&items);

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.id, "v1");
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2023, 1, 5).unwrap());
        assert_eq!(record.weekday, 3); // Thursday
        assert_eq!((record.view, record.like, record.dislike, record.comment), (100, 10, 0, 3));
        assert_eq!(record.words, vec!["猫", "犬"]);
    }

    #[test]
    fn test_latin_only_and_empty_word_sets_are_dropped() {
        let items = vec![
            item("latin", "2023-01-05T10:00:00Z", "Vlog 2", vec![noun("Vlog"), noun("2")]),
            item("empty", "2023-01-05T10:00:00Z", "は", vec![ParsedWord::new("は", "助詞", 1)]),
            item("mixed", "2023-01-05T10:00:00Z", "Vlog 猫", vec![noun("Vlog"), noun("猫")]),
        ];
        let records = builder().build(&items);

        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["mixed"]);
        assert_eq!(records[0].words, vec!["Vlog", "猫"]);
    }

    #[test]
    fn test_malformed_items_are_skipped() {
        let mut no_stats = item("no_stats", "2023-01-05T10:00:00Z", "猫", vec![noun("猫")]);
        no_stats.statistics = None;
        let mut no_parse = item("no_parse", "2023-01-05T10:00:00Z", "猫", vec![]);
        no_parse.parsed_title = None;
        let bad_date = item("bad_date", "yesterday", "猫", vec![noun("猫")]);
        let good = item("good", "2023-01-05T10:00:00Z", "猫", vec![noun("猫")]);

        let builder = builder();
        let vocabulary = builder.candidate_vocabulary(&[good.clone()]);
        assert!(matches!(
            builder.canonicalize(&no_stats, &vocabulary),
            Err(PipelineError::MalformedRecord { .. })
        ));

        let records = builder.build(&[no_stats, no_parse, bad_date, good]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "good");
    }

    #[test]
    fn test_ignore_title_patterns() {
        let config = DataConfig {
            ignore_title_patterns: vec!["^【告知】".to_string()],
            ..Default::default()
        };
        let builder = DatasetBuilder::from_config(&config).unwrap();
        let items = vec![
            item("skip", "2023-01-05T10:00:00Z", "【告知】猫", vec![noun("猫")]),
            item("keep", "2023-01-05T10:00:00Z", "猫", vec![noun("猫")]),
        ];

        let records = builder.build(&items);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "keep");
    }

    #[test]
    fn test_dataset_text_round_trip() {
        let items = vec![item(
            "v1",
            "2023-02-10T23:30:00Z",
            "猫\tの動画",
            vec![noun("猫"), noun("動画")],
        )];
        let records = builder().build(&items);
        let text = format_dataset(&records);

        assert!(text.starts_with("id\tdate\twday\ttitle\tview\tlike\tdislike\tcomment\twords\n"));
        assert!(text.contains("v1\t2023/02/10\t4\t猫 の動画\t100\t10\t0\t3\t猫|動画\n"));
        assert_eq!(parse_dataset(&text, Path::new("dataset.tsv")).unwrap(), records);
    }

    #[test]
    fn test_parse_dataset_rejects_bad_rows() {
        let text = "id\tdate\twday\ttitle\tview\tlike\tdislike\tcomment\twords\nv1\t2023/02/10\n";
        assert!(matches!(
            parse_dataset(text, Path::new("dataset.tsv")),
            Err(PipelineError::InvalidArtifact { .. })
        ));
        assert!(matches!(
            parse_dataset("", Path::new("dataset.tsv")),
            Err(PipelineError::InvalidArtifact { .. })
        ));
    }
}
