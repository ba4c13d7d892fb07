pub mod yahoo;

pub use yahoo::YahooParser;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::crawler::models::{deserialize_count, RawVideoItem};
use crate::{PipelineError, Result};

/// A word produced by morphological analysis of a title
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedWord {
    pub surface: String,
    pub pos: String,
    #[serde(default = "default_count", deserialize_with = "deserialize_count")]
    pub count: u32,
}

fn default_count() -> u32 {
    1
}

impl ParsedWord {
    pub fn new(surface: impl Into<String>, pos: impl Into<String>, count: u32) -> Self {
        Self {
            surface: surface.into(),
            pos: pos.into(),
            count,
        }
    }
}

/// Text in, ordered word list out
#[async_trait]
pub trait WordParser: Send + Sync {
    async fn parse(&self, text: &str) -> Result<Vec<ParsedWord>>;
}

/// Result of an annotation pass.
///
/// `error` is set when the parser failed partway; the first `annotated`
/// pending items already carry their words and should still be persisted.
#[derive(Debug)]
pub struct AnnotationOutcome {
    pub annotated: usize,
    pub error: Option<PipelineError>,
}

impl AnnotationOutcome {
    pub fn into_result(self) -> Result<usize> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.annotated),
        }
    }
}

/// Attach parsed words to every titled item that has none yet.
///
/// Items already annotated are never parsed again. Parsing stops at the
/// first parser error, keeping the annotations made before it.
pub async fn annotate_titles(items: &mut [RawVideoItem], parser: &dyn WordParser) -> AnnotationOutcome {
    let mut annotated = 0;

    for item in items.iter_mut() {
        let Some(title) = item.title().filter(|_| item.parsed_title.is_none()) else {
            continue;
        };

        let parsed = parser.parse(title).await;
        match parsed {
            Ok(words) => {
                debug!("Parsed {} words from title of {}", words.len(), item.id);
                item.parsed_title = Some(words);
                annotated += 1;
            }
            Err(e) => {
                warn!("⚠️ Title parsing stopped at {} after {} items: {}", item.id, annotated, e);
                return AnnotationOutcome {
                    annotated,
                    error: Some(e),
                };
            }
        }
    }

    if annotated > 0 {
        info!("📝 Annotated {} video titles", annotated);
    }
    AnnotationOutcome {
        annotated,
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::Snippet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct SplitParser {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl WordParser for SplitParser {
        async fn parse(&self, text: &str) -> Result<Vec<ParsedWord>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(text
                .split_whitespace()
                .map(|w| ParsedWord::new(w, "名詞", 1))
                .collect())
        }
    }

    fn titled(id: &str, title: &str) -> RawVideoItem {
        let mut item = RawVideoItem::new(id);
        item.snippet = Some(Snippet {
            title: Some(title.to_string()),
            ..Default::default()
        });
        item
    }

    #[tokio::test]
    async fn test_annotate_only_missing() {
        let parser = SplitParser {
            calls: AtomicUsize::new(0),
        };
        let mut already = titled("a", "old title");
        already.parsed_title = Some(vec![ParsedWord::new("old", "名詞", 1)]);
        let mut items = vec![already, titled("b", "new title"), RawVideoItem::new("c")];

        let annotated = annotate_titles(&mut items, &parser).await.into_result().unwrap();

        assert_eq!(annotated, 1);
        assert_eq!(parser.calls.load(Ordering::SeqCst), 1);
        assert_eq!(items[0].parsed_title.as_ref().unwrap().len(), 1);
        assert_eq!(items[1].parsed_title.as_ref().unwrap().len(), 2);
        assert!(items[2].parsed_title.is_none());

        let again = annotate_titles(&mut items, &parser).await.into_result().unwrap();
        assert_eq!(again, 0);
        assert_eq!(parser.calls.load(Ordering::SeqCst), 1);
    }

    /// Fails every call after the first `ok_calls`
    struct QuotaParser {
        ok_calls: usize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl WordParser for QuotaParser {
        async fn parse(&self, text: &str) -> Result<Vec<ParsedWord>> {
            if self.calls.fetch_add(1, Ordering::SeqCst) >= self.ok_calls {
                return Err(PipelineError::FatalRequest {
                    url: "https://jlp.yahooapis.jp/MAService/V1/parse".to_string(),
                    status: 403,
                    body: "limit exceeded".to_string(),
                });
            }
            Ok(vec![ParsedWord::new(text, "名詞", 1)])
        }
    }

    #[tokio::test]
    async fn test_parser_failure_keeps_earlier_annotations() {
        let parser = QuotaParser {
            ok_calls: 2,
            calls: AtomicUsize::new(0),
        };
        let mut items = vec![
            titled("a", "一"),
            titled("b", "二"),
            titled("c", "三"),
            titled("d", "四"),
        ];

        let outcome = annotate_titles(&mut items, &parser).await;

        assert_eq!(outcome.annotated, 2);
        assert!(matches!(
            outcome.error,
            Some(PipelineError::FatalRequest { status: 403, .. })
        ));
        assert!(items[0].parsed_title.is_some());
        assert!(items[1].parsed_title.is_some());
        assert!(items[2].parsed_title.is_none());
        assert!(items[3].parsed_title.is_none());
        assert_eq!(parser.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_parsed_word_count_formats() {
        let from_str: ParsedWord =
            serde_json::from_str(r#"{"surface": "猫", "pos": "名詞", "count": "2"}"#).unwrap();
        let from_int: ParsedWord =
            serde_json::from_str(r#"{"surface": "猫", "pos": "名詞", "count": 2}"#).unwrap();
        let missing: ParsedWord = serde_json::from_str(r#"{"surface": "猫", "pos": "名詞"}"#).unwrap();

        assert_eq!(from_str, from_int);
        assert_eq!(missing.count, 1);
    }
}
