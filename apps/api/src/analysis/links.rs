//! Deterministic job-board search links, keyed by job title.

use reqwest::Url;

const LINKEDIN_SEARCH: &str = "https://www.linkedin.com/jobs/search/";
const INDEED_BASE: &str = "https://www.indeed.com/";

/// `https://www.linkedin.com/jobs/search/?keywords=Data+Scientist`
pub fn linkedin_search_url(title: &str) -> String {
    let title = normalize_title(title);
    match Url::parse_with_params(LINKEDIN_SEARCH, &[("keywords", title.as_str())]) {
        Ok(url) => url.to_string(),
        // The base is a constant, so parsing cannot fail.
        Err(_) => LINKEDIN_SEARCH.to_string(),
    }
}

/// `https://www.indeed.com/q-Data-Scientist-jobs.html`
pub fn indeed_search_url(title: &str) -> String {
    let slug = normalize_title(title).replace(' ', "-");
    match Url::parse(INDEED_BASE) {
        Ok(mut url) => {
            // set_path percent-encodes anything not valid in a path segment
            url.set_path(&format!("q-{}-jobs.html", slug.replace('/', "-")));
            url.to_string()
        }
        Err(_) => format!("{INDEED_BASE}q-{slug}-jobs.html"),
    }
}

/// Collapses runs of whitespace so "Data   Scientist\n" behaves like "Data Scientist".
fn normalize_title(title: &str) -> String {
    title.split_whitespace().collect::<Vec<_>>().join(" ")
}
