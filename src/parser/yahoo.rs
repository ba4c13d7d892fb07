/// Yahoo! JAPAN text analysis (MAService V1) client
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::{ParsedWord, WordParser};
use crate::config::ParserConfig;
use crate::http::FetchClient;
use crate::{PipelineError, Result};

/// Morphological parser backed by the JLP MA service (50,000 requests/day)
pub struct YahooParser {
    fetch: FetchClient,
    endpoint: String,
    client_id: String,
}

impl YahooParser {
    pub fn new(config: &ParserConfig, fetch: FetchClient) -> Result<Self> {
        let client_id = config
            .client_id
            .clone()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                PipelineError::MissingPrecondition("Yahoo API client id is not specified".to_string())
            })?;

        Ok(Self {
            fetch,
            endpoint: config.endpoint.clone(),
            client_id,
        })
    }
}

#[async_trait]
impl WordParser for YahooParser {
    async fn parse(&self, text: &str) -> Result<Vec<ParsedWord>> {
        let params = [
            ("appid", self.client_id.clone()),
            ("sentence", text.to_string()),
            ("results", "ma,uniq".to_string()),
            ("uniq_by_baseform", "true".to_string()),
        ];

        let body = self.fetch.fetch(&self.endpoint, &params).await?;
        let words = parse_uniq_words(&String::from_utf8_lossy(&body))?;
        debug!("JLP returned {} unique words", words.len());
        Ok(words)
    }
}

/// Extract the `uniq_result` word list from a MAService response.
///
/// The document is read with the HTML parser, which lowercases element
/// names and ignores the XML namespace. This only holds because no JLP
/// element name (`ResultSet`, `uniq_result`, `word_list`, `word`, `surface`,
/// `pos`, `count`) is special to HTML tree building; a response element such
/// as `table` or `title` would be restructured and break these selectors.
pub fn parse_uniq_words(xml: &str) -> Result<Vec<ParsedWord>> {
    let document = Html::parse_document(xml);
    let word_selector = selector("uniq_result word")?;
    let surface_selector = selector("surface")?;
    let pos_selector = selector("pos")?;
    let count_selector = selector("count")?;

    let words = document
        .select(&word_selector)
        .filter_map(|word| {
            let surface = child_text(&word, &surface_selector)?;
            let pos = child_text(&word, &pos_selector)?;
            let count = child_text(&word, &count_selector)
                .and_then(|c| c.parse().ok())
                .unwrap_or(1);
            Some(ParsedWord { surface, pos, count })
        })
        .collect();

    Ok(words)
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| PipelineError::Config(format!("invalid selector {}: {:?}", css, e)))
}

fn child_text(element: &ElementRef<'_>, selector: &Selector) -> Option<String> {
    let text: String = element.select(selector).next()?.text().collect();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParserConfig;
    use crate::http::ReqwestTransport;
    use std::sync::Arc;

    const RESPONSE: &str = r#"<?xml version="1.0" encoding="UTF-8" ?>
<ResultSet xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xmlns="urn:yahoo:jp:jlp">
<ma_result>
<total_count>3</total_count>
<filtered_count>3</filtered_count>
<word_list>
<word><surface>猫</surface><reading>ねこ</reading><pos>名詞</pos></word>
</word_list>
</ma_result>
<uniq_result>
<total_count>3</total_count>
<filtered_count>2</filtered_count>
<word_list>
<word><count>2</count><surface>猫</surface><pos>名詞</pos></word>
<word><count>1</count><surface>走る</surface><pos>動詞</pos></word>
<word><count>1</count><surface>。</surface></word>
</word_list>
</uniq_result>
</ResultSet>"#;

    #[test]
    fn test_parse_uniq_words() {
        let words = parse_uniq_words(RESPONSE).unwrap();
        assert_eq!(
            words,
            vec![
                ParsedWord::new("猫", "名詞", 2),
                ParsedWord::new("走る", "動詞", 1),
            ]
        );
    }

    #[test]
    fn test_missing_client_id() {
        let fetch = FetchClient::new(Arc::new(ReqwestTransport::new(5).unwrap()));
        let result = YahooParser::new(&ParserConfig::default(), fetch);
        assert!(matches!(result, Err(PipelineError::MissingPrecondition(_))));
    }
}
