use regex::Regex;

use crate::mvweb::SearchResult;

const TRIM_SET: &[char] = &[' ', '_', '-', '(', ')', '+', '.'];

pub fn filename(result: &SearchResult) -> String {
    let url = result.best_url().unwrap_or_default();
    let ext = url_extension(url);
    let clean = Regex::new(r"[^a-zA-Z0-9äöüßÄÖÜ.()_+ -]").unwrap();
    let name = clean.replace_all(&result.title, "_");
    let name = name.trim_matches(TRIM_SET);
    format!("{name}{ext}")
}

fn url_extension(url: &str) -> &str {
    let segment_start = url.rfind('/').map(|idx| idx + 1).unwrap_or(0);
    let segment = &url[segment_start..];
    match segment.rfind('.') {
        Some(idx) => &segment[idx..],
        None => "",
    }
}
