//! HTML presentation for the browser-facing routes.
//!
//! Everything originating from the model or the user is escaped before it is
//! written into markup. Links are only ever the ones built by `analysis::links`.

use axum::response::{Html, IntoResponse, Response};

use crate::analysis::models::{AnalysisResult, JobSearch, MatchAnalysis};
use crate::errors::AppError;

const INDEX_BODY: &str = include_str!("index.html");

const STYLE: &str = "body{font-family:system-ui,sans-serif;max-width:960px;margin:2rem auto;padding:0 1rem;color:#1f2933}\
table{border-collapse:collapse;width:100%;margin:1rem 0}\
th,td{border:1px solid #cbd2d9;padding:.5rem;text-align:left;vertical-align:top}\
th{background:#f0f4f8}\
pre{background:#f5f7fa;padding:1rem;white-space:pre-wrap;word-break:break-word}\
.error{color:#b42318}\
.notice{color:#52606d}";

/// Wraps a body fragment in the shared page chrome.
pub fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n\
         <h1>Resume Analysis and Job Search</h1>\n{body}\n\
         <p><a href=\"/\">&larr; Back</a></p>\n</body>\n</html>\n",
        title = escape_html(title),
    )
}

pub fn index_page() -> String {
    page("Resume Analysis and Job Search", INDEX_BODY)
}

pub fn report(result: &AnalysisResult) -> String {
    match result {
        AnalysisResult::Match(analysis) => match_report(analysis),
        AnalysisResult::JobSearch(search) => job_search_report(search),
    }
}

pub fn match_report(analysis: &MatchAnalysis) -> String {
    let mut body = String::new();

    body.push_str("<h2>Job Description Match</h2>\n");
    body.push_str(&format!(
        "<p><strong>Match Percentage:</strong> {}</p>\n",
        escape_html(&analysis.match_percentage)
    ));

    if !analysis.missing_keywords.is_empty() {
        body.push_str("<h2>Missing Keywords</h2>\n");
        body.push_str("<p>Add these keywords to your resume to increase your chances:</p>\n");
        let rows: Vec<Vec<String>> = analysis
            .missing_keywords
            .iter()
            .map(|k| vec![escape_html(k)])
            .collect();
        body.push_str(&table(&["Keywords"], &rows));
    }

    if !analysis.missing_certifications.is_empty() {
        body.push_str("<h2>Missing Certifications</h2>\n");
        let rows: Vec<Vec<String>> = analysis
            .missing_certifications
            .iter()
            .map(|c| vec![escape_html(&c.name), escape_html(&c.description)])
            .collect();
        body.push_str(&table(&["Name", "Description"], &rows));
    }

    body.push_str("<h2>Profile Summary</h2>\n");
    body.push_str(&format!("<p>{}</p>\n", escape_html(&analysis.profile_summary)));

    page("Resume Analysis", &body)
}

pub fn job_search_report(search: &JobSearch) -> String {
    let mut body = String::from("<h2>Relevant Jobs</h2>\n");

    if search.jobs.is_empty() {
        body.push_str("<p class=\"notice\">No job titles were suggested for this resume.</p>\n");
    } else {
        let rows: Vec<Vec<String>> = search
            .jobs
            .iter()
            .map(|job| {
                vec![
                    escape_html(&job.title),
                    clickable(&job.linkedin),
                    clickable(&job.indeed),
                ]
            })
            .collect();
        body.push_str(&table(&["Job Title", "LinkedIn", "Indeed"], &rows));
    }

    page("Job Search", &body)
}

/// Error page. Parsing failures include the raw model reply for diagnosis.
pub fn error_page(err: &AppError) -> String {
    let mut body = format!(
        "<h2 class=\"error\">Something went wrong</h2>\n<p class=\"error\">{}</p>\n",
        escape_html(&err.user_message())
    );
    if let Some(raw) = err.raw_response() {
        body.push_str("<h3>Raw model response</h3>\n");
        body.push_str(&format!("<pre>{}</pre>\n", escape_html(raw)));
    }
    page("Error", &body)
}

fn clickable(link: &str) -> String {
    let link = escape_html(link);
    format!("<a href=\"{link}\" target=\"_blank\" rel=\"noopener noreferrer\">{link}</a>")
}

/// `cells` must already be escaped.
fn table(headers: &[&str], cells: &[Vec<String>]) -> String {
    let mut out = String::from("<table>\n<thead><tr>");
    for header in headers {
        out.push_str(&format!("<th>{}</th>", escape_html(header)));
    }
    out.push_str("</tr></thead>\n<tbody>\n");
    for row in cells {
        out.push_str("<tr>");
        for cell in row {
            out.push_str(&format!("<td>{cell}</td>"));
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</tbody>\n</table>\n");
    out
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// An `AppError` rendered as an HTML page instead of a JSON body.
#[derive(Debug)]
pub struct HtmlError(pub AppError);

impl From<AppError> for HtmlError {
    fn from(err: AppError) -> Self {
        HtmlError(err)
    }
}

impl IntoResponse for HtmlError {
    fn into_response(self) -> Response {
        self.0.log();
        (self.0.status(), Html(error_page(&self.0))).into_response()
    }
}
