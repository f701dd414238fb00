use std::fs;
use std::path::Path;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::error::MvdlError;
use crate::filter::SkipRule;
use crate::mvweb::{QueryClause, Request};

pub const DEFAULT_MAX_RESULTS: u32 = 100;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub name: String,
    pub download_to: Utf8PathBuf,
    pub history_file: Utf8PathBuf,
    pub query: QuerySpec,
    #[serde(default)]
    pub skip_if: Vec<SkipRule>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct QuerySpec {
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub max_results: u32,
}

impl QuerySpec {
    fn clauses(&self) -> Vec<QueryClause> {
        let mut clauses = Vec::with_capacity(2);
        if let Some(channel) = self.channel.as_deref() {
            if !channel.is_empty() {
                clauses.push(QueryClause::new("channel", channel));
            }
        }
        if let Some(topic) = self.topic.as_deref() {
            if !topic.is_empty() {
                clauses.push(QueryClause::new("topic", topic));
            }
        }
        clauses
    }
}

impl Config {
    pub fn to_request(&self) -> Request {
        Request::new(self.query.max_results, self.query.clauses())
    }
}

pub fn load(path: &Path) -> Result<Vec<Config>, MvdlError> {
    let content =
        fs::read_to_string(path).map_err(|_| MvdlError::ConfigRead(path.to_path_buf()))?;
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default();
    let mut configs: Vec<Config> = match ext {
        "json" => serde_json::from_str(&content)
            .map_err(|err| MvdlError::ConfigParse(err.to_string()))?,
        "yml" | "yaml" => serde_yaml::from_str(&content)
            .map_err(|err| MvdlError::ConfigParse(err.to_string()))?,
        other => return Err(MvdlError::ConfigFormat(other.to_string())),
    };

    for config in &mut configs {
        if config.query.max_results == 0 {
            config.query.max_results = DEFAULT_MAX_RESULTS;
        }
    }
    Ok(configs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clauses_skip_absent_fields() {
        let query = QuerySpec {
            channel: Some("ard".to_string()),
            topic: None,
            max_results: 15,
        };
        let clauses = query.clauses();
        assert_eq!(clauses.len(), 1);
        assert_eq!(clauses[0].fields, vec!["channel"]);
        assert_eq!(clauses[0].query, "ard");
    }

    #[test]
    fn clauses_empty_when_unset() {
        let query = QuerySpec::default();
        assert!(query.clauses().is_empty());
    }

    #[test]
    fn request_carries_both_clauses() {
        let config = Config {
            name: "test".to_string(),
            download_to: Utf8PathBuf::from("/tmp/media"),
            history_file: Utf8PathBuf::from("/tmp/history.json"),
            query: QuerySpec {
                channel: Some("ard".to_string()),
                topic: Some("sendung".to_string()),
                max_results: 15,
            },
            skip_if: Vec::new(),
        };
        let request = config.to_request();
        assert_eq!(request.queries.len(), 2);
        assert_eq!(request.size, 15);
        assert_eq!(request.sort_by, "timestamp");
        assert_eq!(request.sort_order, "desc");
        assert!(!request.future);
        assert_eq!(request.offset, 0);
    }
}
