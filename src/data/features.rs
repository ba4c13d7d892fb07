//! One-hot feature matrix built from canonical records.
//!
//! Column order: `id`, the four metrics, one column per `YYYY-MM` bucket,
//! seven weekday columns, then one `wNNN` column per vocabulary rank.

use chrono::{Datelike, NaiveDate};
use std::collections::BTreeSet;
use tracing::info;

use super::dataset::{load_dataset, CanonicalRecord};
use super::vocabulary::{Vocabulary, VocabularyBuilder};
use crate::artifacts::ArtifactStore;
use crate::config::DataConfig;
use crate::Result;

/// Labels the regression layer selects weekday columns by
pub const WEEKDAY_LABELS: [&str; 7] = ["Mon", "Tue", "Wed", "Thr", "Fri", "Sat", "Sun"];
const METRIC_COLUMNS: [&str; 5] = ["id", "view", "like", "dislike", "comment"];

/// Ordered column layout of the feature matrix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    months: Vec<(i32, u32)>,
    vocabulary: Vocabulary,
}

impl FeatureSchema {
    /// `months` must be ascending and deduplicated
    pub fn new(months: Vec<(i32, u32)>, vocabulary: Vocabulary) -> Self {
        Self { months, vocabulary }
    }

    /// Month buckets come only from records dated on or before the cutoff
    pub fn from_records(
        records: &[CanonicalRecord],
        vocabulary: Vocabulary,
        before_date: Option<NaiveDate>,
    ) -> Self {
        let months: BTreeSet<(i32, u32)> = records
            .iter()
            .filter(|r| within_cutoff(r.date, before_date))
            .map(|r| (r.date.year(), r.date.month()))
            .collect();
        Self::new(months.into_iter().collect(), vocabulary)
    }

    pub fn months(&self) -> &[(i32, u32)] {
        &self.months
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn month_index(&self, date: NaiveDate) -> Option<usize> {
        self.months.binary_search(&(date.year(), date.month())).ok()
    }

    /// Number of numeric columns (everything but `id`)
    pub fn width(&self) -> usize {
        METRIC_COLUMNS.len() - 1 + self.months.len() + WEEKDAY_LABELS.len() + self.vocabulary.len()
    }

    pub fn columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = METRIC_COLUMNS.iter().map(|c| c.to_string()).collect();
        columns.extend(
            self.months
                .iter()
                .map(|(year, month)| format!("{:04}-{:02}", year, month)),
        );
        columns.extend(WEEKDAY_LABELS.iter().map(|d| d.to_string()));
        columns.extend((0..self.vocabulary.len()).map(|rank| format!("w{:03}", rank)));
        columns
    }

    pub fn encode_row(&self, record: &CanonicalRecord) -> FeatureRow {
        let mut values = Vec::with_capacity(self.width());
        values.extend([record.view, record.like, record.dislike, record.comment]);

        let month_offset = values.len();
        values.resize(month_offset + self.months.len(), 0);
        if let Some(i) = self.month_index(record.date) {
            values[month_offset + i] = 1;
        }

        let weekday_offset = values.len();
        values.resize(weekday_offset + WEEKDAY_LABELS.len(), 0);
        if let Some(slot) = values.get_mut(weekday_offset + record.weekday as usize) {
            *slot = 1;
        }

        let word_offset = values.len();
        values.resize(word_offset + self.vocabulary.len(), 0);
        for word in &record.words {
            if let Some(rank) = self.vocabulary.rank(word) {
                values[word_offset + rank] = 1;
            }
        }

        FeatureRow {
            id: record.id.clone(),
            values,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureRow {
    pub id: String,
    pub values: Vec<u64>,
}

#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    schema: FeatureSchema,
    rows: Vec<FeatureRow>,
}

impl FeatureMatrix {
    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Comma-separated text with a header row
    pub fn to_csv(&self) -> String {
        let mut out = self.schema.columns().join(",");
        out.push('\n');
        for row in &self.rows {
            out.push_str(&row.id);
            for value in &row.values {
                out.push(',');
                out.push_str(&value.to_string());
            }
            out.push('\n');
        }
        out
    }
}

fn within_cutoff(date: NaiveDate, before_date: Option<NaiveDate>) -> bool {
    before_date.map_or(true, |cutoff| date <= cutoff)
}

/// Turns canonical records into the training matrix
#[derive(Debug, Clone)]
pub struct FeatureEncoder {
    min_word_occur: usize,
    before_date: Option<NaiveDate>,
}

impl FeatureEncoder {
    pub fn new(min_word_occur: usize, before_date: Option<NaiveDate>) -> Self {
        Self {
            min_word_occur,
            before_date,
        }
    }

    pub fn from_config(config: &DataConfig) -> Self {
        Self::new(config.min_word_occur, config.before_date)
    }

    pub fn encode(&self, records: &[CanonicalRecord]) -> FeatureMatrix {
        let vocabulary = VocabularyBuilder::new(self.min_word_occur)
            .build_from_words(records.iter().map(|r| r.words.iter().map(String::as_str)));
        let schema = FeatureSchema::from_records(records, vocabulary, self.before_date);

        let rows = records
            .iter()
            .filter(|r| within_cutoff(r.date, self.before_date))
            .map(|r| schema.encode_row(r))
            .collect();

        FeatureMatrix { schema, rows }
    }

    /// Read `dataset.tsv`, write `train.csv` and `words.json`
    pub fn run(&self, store: &ArtifactStore) -> Result<FeatureMatrix> {
        let records = load_dataset(store)?;
        let matrix = self.encode(&records);

        store.write_text(&store.training_data_path(), &matrix.to_csv())?;
        store.save_json(
            &store.word_index_path(),
            &matrix.schema().vocabulary().to_index_map(),
        )?;

        info!(
            "🧮 Encoded {} rows x {} columns ({} words, {} months)",
            matrix.len(),
            matrix.schema().width() + 1,
            matrix.schema().vocabulary().len(),
            matrix.schema().months().len()
        );
        Ok(matrix)
    }
}
