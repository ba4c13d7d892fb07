/// Wire and cache representations of YouTube Data API items
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::parser::ParsedWord;

/// Entry of the search (list) endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ListItemId>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListItemId {
    #[serde(rename = "videoId", default, skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ListItem {
    /// Video id, absent for playlist and channel results
    pub fn video_id(&self) -> Option<&str> {
        self.id
            .as_ref()
            .and_then(|id| id.video_id.as_deref())
            .filter(|id| !id.is_empty())
    }
}

/// One page of the search endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchPage {
    #[serde(default)]
    pub items: Vec<ListItem>,

    #[serde(rename = "nextPageToken", default)]
    pub next_page_token: Option<String>,
}

/// Response of the videos (detail) endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoListResponse {
    #[serde(default)]
    pub items: Vec<RawVideoItem>,
}

/// Detail item as cached in `video_detail_list.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawVideoItem {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<Snippet>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statistics: Option<Statistics>,

    /// Attached once by the title annotation stage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parsed_title: Option<Vec<ParsedWord>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snippet {
    #[serde(rename = "publishedAt", default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Statistics block; the API encodes counts as decimal strings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Statistics(pub Map<String, Value>);

impl Statistics {
    pub fn count(&self, key: &str) -> Option<u64> {
        match self.0.get(key)? {
            Value::String(s) => s.trim().parse().ok(),
            Value::Number(n) => n.as_u64(),
            _ => None,
        }
    }

    pub fn view_count(&self) -> Option<u64> {
        self.count("viewCount")
    }

    pub fn like_count(&self) -> u64 {
        self.count("likeCount").unwrap_or(0)
    }

    pub fn dislike_count(&self) -> u64 {
        self.count("dislikeCount").unwrap_or(0)
    }

    pub fn comment_count(&self) -> Option<u64> {
        self.count("commentCount")
    }
}

impl RawVideoItem {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            snippet: None,
            statistics: None,
            parsed_title: None,
            extra: Map::new(),
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.snippet
            .as_ref()
            .and_then(|s| s.title.as_deref())
            .filter(|t| !t.is_empty())
    }

    /// Title present and not yet annotated
    pub fn needs_annotation(&self) -> bool {
        self.title().is_some() && self.parsed_title.is_none()
    }
}

/// Accepts a count encoded either as a JSON number or a numeric string
pub(crate) fn deserialize_count<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawCount {
        Int(u64),
        Str(String),
    }

    match RawCount::deserialize(deserializer)? {
        RawCount::Int(n) => u32::try_from(n).map_err(D::Error::custom),
        RawCount::Str(s) => s.trim().parse().map_err(D::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_list_item_video_id() {
        let video: ListItem = serde_json::from_value(json!({
            "kind": "youtube#searchResult",
            "id": {"kind": "youtube#video", "videoId": "abc"}
        }))
        .unwrap();
        let playlist: ListItem = serde_json::from_value(json!({
            "id": {"kind": "youtube#playlist", "playlistId": "PL1"}
        }))
        .unwrap();

        assert_eq!(video.video_id(), Some("abc"));
        assert_eq!(playlist.video_id(), None);
    }

    #[test]
    fn test_unknown_fields_survive_round_trip() {
        let raw = json!({
            "etag": "xyz",
            "id": "v1",
            "kind": "youtube#video",
            "snippet": {"publishedAt": "2023-01-05T10:00:00Z", "title": "t", "channelTitle": "c"},
            "statistics": {"viewCount": "10", "commentCount": "1", "favoriteCount": "0"}
        });
        let item: RawVideoItem = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(serde_json::to_value(&item).unwrap(), raw);
    }

    #[test]
    fn test_statistics_counts() {
        let stats: Statistics = serde_json::from_value(json!({
            "viewCount": "1200",
            "commentCount": 7
        }))
        .unwrap();

        assert_eq!(stats.view_count(), Some(1200));
        assert_eq!(stats.comment_count(), Some(7));
        assert_eq!(stats.like_count(), 0);
        assert_eq!(stats.dislike_count(), 0);
    }

    #[test]
    fn test_needs_annotation() {
        let mut item = RawVideoItem::new("v1");
        assert!(!item.needs_annotation());

        item.snippet = Some(Snippet {
            title: Some("タイトル".to_string()),
            ..Default::default()
        });
        assert!(item.needs_annotation());

        item.parsed_title = Some(Vec::new());
        assert!(!item.needs_annotation());
    }
}
