use std::thread;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use serde::{Deserialize, Serialize};

use crate::error::MvdlError;

pub const API_URL: &str = "https://mediathekviewweb.de/api/query";

#[derive(Debug, Clone, Serialize)]
pub struct QueryClause {
    pub fields: Vec<String>,
    pub query: String,
}

impl QueryClause {
    pub fn new(field: &str, query: &str) -> Self {
        Self {
            fields: vec![field.to_string()],
            query: query.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub queries: Vec<QueryClause>,
    pub sort_by: String,
    pub sort_order: String,
    pub future: bool,
    pub offset: u32,
    pub size: u32,
}

impl Request {
    pub fn new(size: u32, queries: Vec<QueryClause>) -> Self {
        Self {
            queries,
            sort_by: "timestamp".to_string(),
            sort_order: "desc".to_string(),
            future: false,
            offset: 0,
            size,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryInfo {
    #[serde(default)]
    pub filmliste_timestamp: String,
    #[serde(default)]
    pub result_count: u64,
    #[serde(default)]
    pub search_engine_time: String,
    #[serde(default)]
    pub total_results: u64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SearchResult {
    #[serde(default)]
    pub channel: String,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub duration: u64,
    pub id: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub url_video: String,
    #[serde(default)]
    pub url_video_hd: String,
    #[serde(default, rename = "url_video_low")]
    pub url_video_sd: String,
}

impl SearchResult {
    pub fn best_url(&self) -> Option<&str> {
        [&self.url_video_hd, &self.url_video_sd, &self.url_video]
            .into_iter()
            .find(|url| !url.is_empty())
            .map(String::as_str)
    }

    pub fn aired_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.timestamp, 0)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Response {
    pub result: ResponseBody,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseBody {
    #[serde(default)]
    pub query_info: QueryInfo,
    #[serde(default)]
    pub results: Vec<SearchResult>,
}

pub trait SearchClient: Send + Sync {
    fn search(&self, request: &Request) -> Result<Response, MvdlError>;
}

#[derive(Clone)]
pub struct MvwebHttpClient {
    client: Client,
    api_url: String,
}

impl MvwebHttpClient {
    pub fn new() -> Result<Self, MvdlError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("mediathek-dl/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| MvdlError::SearchHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| MvdlError::SearchHttp(err.to_string()))?;
        Ok(Self {
            client,
            api_url: API_URL.to_string(),
        })
    }

    pub fn with_api_url(mut self, api_url: &str) -> Self {
        self.api_url = api_url.to_string();
        self
    }

    fn send_with_retries<F>(&self, make_req: F) -> Result<reqwest::blocking::Response, MvdlError>
    where
        F: Fn() -> reqwest::blocking::RequestBuilder,
    {
        const MAX_RETRIES: usize = 3;
        const BASE_DELAY_MS: u64 = 200;
        let mut attempt = 0usize;
        loop {
            match make_req().send() {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    if attempt < MAX_RETRIES && is_retryable_status(status) {
                        thread::sleep(Duration::from_millis(BASE_DELAY_MS * (attempt as u64 + 1)));
                        attempt += 1;
                        continue;
                    }
                    return Ok(resp);
                }
                Err(err) => {
                    if attempt < MAX_RETRIES && is_retryable_error(&err) {
                        thread::sleep(Duration::from_millis(BASE_DELAY_MS * (attempt as u64 + 1)));
                        attempt += 1;
                        continue;
                    }
                    return Err(MvdlError::SearchHttp(err.to_string()));
                }
            }
        }
    }
}

impl SearchClient for MvwebHttpClient {
    fn search(&self, request: &Request) -> Result<Response, MvdlError> {
        let body =
            serde_json::to_vec(request).map_err(|err| MvdlError::SearchHttp(err.to_string()))?;
        let response = self.send_with_retries(|| {
            self.client
                .post(&self.api_url)
                .header(CONTENT_TYPE, "text/plain;charset=UTF-8")
                .body(body.clone())
        })?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "search request failed".to_string());
            return Err(MvdlError::SearchStatus { status, message });
        }
        response
            .json()
            .map_err(|err| MvdlError::SearchHttp(err.to_string()))
    }
}

fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}
