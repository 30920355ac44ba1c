//! Response Pipeline: prompt in, validated `AnalysisResult` out.
//!
//! Flow: backend.complete() → strict JSON decode → schema validation → result.
//! A reply is accepted whole or rejected whole; on rejection the raw text rides
//! along in the error so it can be shown to the user.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::analysis::links::{indeed_search_url, linkedin_search_url};
use crate::analysis::models::{AnalysisResult, Certification, JobListing, JobSearch, MatchAnalysis};
use crate::analysis::prompts::{AnalysisMode, AnalysisPrompt};
use crate::errors::AppError;
use crate::llm_client::CompletionBackend;

const JD_MATCH: &str = "JD Match";
const MISSING_KEYWORDS: &str = "Missing Keywords";
const MISSING_CERTIFICATIONS: &str = "Missing Certifications";
const PROFILE_SUMMARY: &str = "Profile Summary";
const JOBS: &str = "Jobs";

#[derive(Clone)]
pub struct ResponsePipeline {
    backend: Arc<dyn CompletionBackend>,
}

impl ResponsePipeline {
    pub fn new(backend: Arc<dyn CompletionBackend>) -> Self {
        Self { backend }
    }

    /// One remote call, no retry. The prompt's mode picks the expected schema.
    pub async fn run(&self, prompt: &AnalysisPrompt) -> Result<AnalysisResult, AppError> {
        info!(
            "Requesting {:?} analysis ({} prompt chars)",
            prompt.mode(),
            prompt.as_str().len()
        );
        let raw = self.backend.complete(prompt.as_str()).await?;

        let result = parse_reply(prompt.mode(), &raw);
        if let Err(e) = &result {
            warn!("Discarding model reply: {e}");
        }
        result
    }
}

pub fn parse_reply(mode: AnalysisMode, raw: &str) -> Result<AnalysisResult, AppError> {
    match mode {
        AnalysisMode::Match => parse_match_analysis(raw).map(AnalysisResult::Match),
        AnalysisMode::JobSearch => parse_job_search(raw).map(AnalysisResult::JobSearch),
    }
}

pub fn parse_match_analysis(raw: &str) -> Result<MatchAnalysis, AppError> {
    let value = decode(raw)?;
    let root = ObjectView::root(&value, raw, JD_MATCH)?;

    let match_percentage = root.string(JD_MATCH)?;
    let missing_keywords = root.string_list(MISSING_KEYWORDS)?;
    let missing_certifications = root
        .records(MISSING_CERTIFICATIONS)?
        .into_iter()
        .map(|cert| -> Result<Certification, AppError> {
            Ok(Certification {
                name: cert.string("name")?,
                description: cert.string("description")?,
            })
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    Ok(MatchAnalysis {
        match_percentage,
        missing_keywords,
        missing_certifications,
        profile_summary: root.string(PROFILE_SUMMARY)?,
    })
}

/// Links in the reply are checked for presence, then rebuilt from the title
/// so every rendered link follows the fixed board templates.
pub fn parse_job_search(raw: &str) -> Result<JobSearch, AppError> {
    let value = decode(raw)?;
    let root = ObjectView::root(&value, raw, JOBS)?;

    let jobs = root
        .records(JOBS)?
        .into_iter()
        .map(|job| -> Result<JobListing, AppError> {
            let title = job.string("title")?;
            if title.trim().is_empty() {
                return Err(job.schema_error("title"));
            }
            job.string("linkedin")?;
            job.string("indeed")?;
            Ok(JobListing {
                linkedin: linkedin_search_url(&title),
                indeed: indeed_search_url(&title),
                title: title.trim().to_string(),
            })
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    Ok(JobSearch { jobs })
}

fn decode(raw: &str) -> Result<Value, AppError> {
    serde_json::from_str(raw.trim()).map_err(|e| AppError::ResponseFormat {
        message: e.to_string(),
        raw: raw.to_string(),
    })
}

/// A JSON object plus the path used to name fields in schema errors.
struct ObjectView<'a> {
    map: &'a Map<String, Value>,
    path: String,
    raw: &'a str,
}

impl<'a> ObjectView<'a> {
    /// A non-object root is reported as missing the first required field.
    fn root(value: &'a Value, raw: &'a str, first_field: &str) -> Result<Self, AppError> {
        match value.as_object() {
            Some(map) => Ok(Self {
                map,
                path: String::new(),
                raw,
            }),
            None => Err(AppError::Schema {
                field: first_field.to_string(),
                raw: raw.to_string(),
            }),
        }
    }

    fn field_path(&self, key: &str) -> String {
        if self.path.is_empty() {
            key.to_string()
        } else {
            format!("{}.{key}", self.path)
        }
    }

    fn schema_error(&self, key: &str) -> AppError {
        AppError::Schema {
            field: self.field_path(key),
            raw: self.raw.to_string(),
        }
    }

    fn get(&self, key: &str) -> Result<&'a Value, AppError> {
        self.map.get(key).ok_or_else(|| self.schema_error(key))
    }

    fn string(&self, key: &str) -> Result<String, AppError> {
        self.get(key)?
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| self.schema_error(key))
    }

    fn array(&self, key: &str) -> Result<&'a Vec<Value>, AppError> {
        self.get(key)?
            .as_array()
            .ok_or_else(|| self.schema_error(key))
    }

    fn string_list(&self, key: &str) -> Result<Vec<String>, AppError> {
        self.array(key)?
            .iter()
            .enumerate()
            .map(|(i, item)| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| self.schema_error(&format!("{key}[{i}]")))
            })
            .collect()
    }

    fn records(&self, key: &str) -> Result<Vec<ObjectView<'a>>, AppError> {
        self.array(key)?
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let path = self.field_path(&format!("{key}[{i}]"));
                item.as_object()
                    .map(|map| ObjectView {
                        map,
                        path: path.clone(),
                        raw: self.raw,
                    })
                    .ok_or_else(|| AppError::Schema {
                        field: path,
                        raw: self.raw.to_string(),
                    })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::prompts::PromptBuilder;
    use crate::llm_client::stub::StubBackend;
    use crate::llm_client::LlmError;

    const MATCH_REPLY: &str = r#"{"JD Match":"72%","Missing Keywords":["Kubernetes"],"Missing Certifications":[],"Profile Summary":"Strong backend profile."}"#;

    #[test]
    fn test_match_reply_fields_round_trip_exactly() {
        let raw = r#"{
            "JD Match": "87%",
            "Missing Keywords": ["Terraform", "Go", "gRPC"],
            "Missing Certifications": [
                {"name": "CKA", "description": "Certified Kubernetes Administrator"},
                {"name": "AWS SA Pro", "description": "Solutions Architect Professional"}
            ],
            "Profile Summary": "  Seasoned engineer.\nLeads teams.  "
        }"#;

        let analysis = parse_match_analysis(raw).unwrap();
        assert_eq!(analysis.match_percentage, "87%");
        assert_eq!(analysis.missing_keywords, vec!["Terraform", "Go", "gRPC"]);
        assert_eq!(
            analysis.missing_certifications,
            vec![
                Certification {
                    name: "CKA".to_string(),
                    description: "Certified Kubernetes Administrator".to_string(),
                },
                Certification {
                    name: "AWS SA Pro".to_string(),
                    description: "Solutions Architect Professional".to_string(),
                },
            ]
        );
        assert_eq!(analysis.profile_summary, "  Seasoned engineer.\nLeads teams.  ");
    }

    #[test]
    fn test_non_json_reply_keeps_raw_text() {
        let raw = "Sure! Here's the analysis you asked for: 80% match.";
        let err = parse_match_analysis(raw).unwrap_err();
        match err {
            AppError::ResponseFormat { raw: kept, .. } => assert_eq!(kept, raw),
            other => panic!("expected ResponseFormat, got {other:?}"),
        }
    }

    #[test]
    fn test_fenced_json_is_not_valid_json() {
        let raw = format!("```json\n{MATCH_REPLY}\n```");
        let err = parse_match_analysis(&raw).unwrap_err();
        assert!(matches!(err, AppError::ResponseFormat { .. }));
        assert_eq!(err.raw_response(), Some(raw.as_str()));
    }

    #[test]
    fn test_each_missing_match_field_is_named() {
        for field in [JD_MATCH, MISSING_KEYWORDS, MISSING_CERTIFICATIONS, PROFILE_SUMMARY] {
            let mut value: Value = serde_json::from_str(MATCH_REPLY).unwrap();
            value.as_object_mut().unwrap().remove(field);
            let raw = value.to_string();

            match parse_match_analysis(&raw).unwrap_err() {
                AppError::Schema { field: named, raw: kept } => {
                    assert_eq!(named, field);
                    assert_eq!(kept, raw);
                }
                other => panic!("expected Schema error for {field}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_wrongly_typed_field_is_schema_error() {
        let raw = r#"{"JD Match":72,"Missing Keywords":[],"Missing Certifications":[],"Profile Summary":"x"}"#;
        let err = parse_match_analysis(raw).unwrap_err();
        assert!(matches!(err, AppError::Schema { ref field, .. } if field == JD_MATCH));
    }

    #[test]
    fn test_nested_certification_field_is_named_by_path() {
        let raw = r#"{"JD Match":"50%","Missing Keywords":["Go"],
            "Missing Certifications":[{"name":"CKA","description":"k8s"},{"name":"PMP"}],
            "Profile Summary":"x"}"#;
        let err = parse_match_analysis(raw).unwrap_err();
        assert!(
            matches!(err, AppError::Schema { ref field, .. } if field == "Missing Certifications[1].description")
        );
    }

    #[test]
    fn test_non_string_keyword_is_rejected_whole() {
        let raw = r#"{"JD Match":"50%","Missing Keywords":["Go", 7],"Missing Certifications":[],"Profile Summary":"x"}"#;
        let err = parse_match_analysis(raw).unwrap_err();
        assert!(matches!(err, AppError::Schema { ref field, .. } if field == "Missing Keywords[1]"));
    }

    #[test]
    fn test_array_root_is_schema_error() {
        let err = parse_match_analysis("[1, 2, 3]").unwrap_err();
        assert!(matches!(err, AppError::Schema { ref field, .. } if field == JD_MATCH));
    }

    #[test]
    fn test_job_search_links_rebuilt_from_title() {
        let raw = r#"{"Jobs":[
            {"title":"Data Scientist","linkedin":"https://evil.example/phish","indeed":"https://www.indeed.com/q-Data-Scientist-jobs.html"},
            {"title":" ML Engineer ","linkedin":"x","indeed":"y"}
        ]}"#;

        let search = parse_job_search(raw).unwrap();
        assert_eq!(search.jobs.len(), 2);
        assert_eq!(search.jobs[0].title, "Data Scientist");
        assert!(search.jobs[0].linkedin.contains("keywords=Data+Scientist"));
        assert!(search.jobs[0].indeed.contains("Data-Scientist"));
        assert_eq!(search.jobs[1].title, "ML Engineer");
        assert_eq!(
            search.jobs[1].indeed,
            "https://www.indeed.com/q-ML-Engineer-jobs.html"
        );
    }

    #[test]
    fn test_job_search_missing_jobs_key() {
        let err = parse_job_search(r#"{"Titles":[]}"#).unwrap_err();
        assert!(matches!(err, AppError::Schema { ref field, .. } if field == "Jobs"));
    }

    #[test]
    fn test_job_search_missing_link_names_path() {
        let raw = r#"{"Jobs":[{"title":"Analyst","linkedin":"l"}]}"#;
        let err = parse_job_search(raw).unwrap_err();
        assert!(matches!(err, AppError::Schema { ref field, .. } if field == "Jobs[0].indeed"));
    }

    #[test]
    fn test_job_search_blank_title_rejected() {
        let raw = r#"{"Jobs":[{"title":"  ","linkedin":"l","indeed":"i"}]}"#;
        let err = parse_job_search(raw).unwrap_err();
        assert!(matches!(err, AppError::Schema { ref field, .. } if field == "Jobs[0].title"));
    }

    #[test]
    fn test_job_search_empty_list_is_valid() {
        let search = parse_job_search(r#"{"Jobs":[]}"#).unwrap();
        assert!(search.jobs.is_empty());
    }

    #[tokio::test]
    async fn test_end_to_end_match_with_stub_backend() {
        let resume = "5 years Python, AWS certified";
        let jd = "Seeking ML engineer with Kubernetes experience";
        let prompt = PromptBuilder::new("Canadian")
            .build(resume, AnalysisMode::Match, Some(jd))
            .unwrap();
        assert!(prompt.as_str().contains(resume));
        assert!(prompt.as_str().contains(jd));

        let backend = StubBackend::replying(MATCH_REPLY);
        let pipeline = ResponsePipeline::new(backend.clone());
        let result = pipeline.run(&prompt).await.unwrap();

        match result {
            AnalysisResult::Match(analysis) => {
                assert_eq!(analysis.match_percentage, "72%");
                assert_eq!(analysis.missing_keywords, vec!["Kubernetes"]);
                assert!(analysis.missing_certifications.is_empty());
                assert_eq!(analysis.profile_summary, "Strong backend profile.");
            }
            other => panic!("expected match analysis, got {other:?}"),
        }
        assert_eq!(backend.prompts(), vec![prompt.as_str().to_string()]);
    }

    #[tokio::test]
    async fn test_reply_parsed_against_prompt_mode() {
        let prompt = PromptBuilder::new("Canadian")
            .build("Rust developer", AnalysisMode::JobSearch, None)
            .unwrap();
        let pipeline = ResponsePipeline::new(StubBackend::replying(MATCH_REPLY));

        let err = pipeline.run(&prompt).await.unwrap_err();
        assert!(matches!(err, AppError::Schema { ref field, .. } if field == "Jobs"));
    }

    #[tokio::test]
    async fn test_backend_timeout_surfaces_as_timeout_error() {
        let prompt = PromptBuilder::new("Canadian")
            .build("Rust developer", AnalysisMode::JobSearch, None)
            .unwrap();
        let backend =
            StubBackend::failing(|| LlmError::Timeout(std::time::Duration::from_secs(60)));
        let pipeline = ResponsePipeline::new(backend.clone());

        let err = pipeline.run(&prompt).await.unwrap_err();
        assert!(matches!(err, AppError::Timeout(_)));
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn test_backend_failure_surfaces_as_remote_call_error() {
        let prompt = PromptBuilder::new("Canadian")
            .build("Rust developer", AnalysisMode::JobSearch, None)
            .unwrap();
        let backend = StubBackend::failing(|| LlmError::EmptyContent);
        let pipeline = ResponsePipeline::new(backend.clone());

        let err = pipeline.run(&prompt).await.unwrap_err();
        assert!(matches!(err, AppError::RemoteCall(_)));
        assert_eq!(backend.call_count(), 1);
    }
}
