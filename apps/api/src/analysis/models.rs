use serde::{Deserialize, Serialize};

/// A certification the model suggests the candidate is missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Certification {
    pub name: String,
    pub description: String,
}

/// Résumé vs job-description comparison. Field order follows the prompt schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchAnalysis {
    /// Verbatim from the model, e.g. "87%".
    pub match_percentage: String,
    pub missing_keywords: Vec<String>,
    pub missing_certifications: Vec<Certification>,
    pub profile_summary: String,
}

/// One inferred job title with its two board search links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobListing {
    pub title: String,
    pub linkedin: String,
    pub indeed: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSearch {
    pub jobs: Vec<JobListing>,
}

/// Validated structured reply. Only ever constructed from a fully well-formed payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AnalysisResult {
    Match(MatchAnalysis),
    JobSearch(JobSearch),
}
