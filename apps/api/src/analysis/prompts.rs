//! Prompt Builder: renders the two fixed prompt templates. No I/O.

use crate::errors::AppError;

/// Match-mode prompt. Placeholders: {job_market}, {resume_text}, {job_description}
pub const MATCH_PROMPT_TEMPLATE: &str = r#"You are an advanced AI specialized in resume analysis for the {job_market} job market.
Your task is to analyze the following resume based on the job description provided.
Please recommend certifications and skills that are missing from the resume, and
suggest ways to optimize the resume for Applicant Tracking Systems (ATS).
Also, calculate and provide the percentage match between the resume and the job description.

Respond with valid JSON only, with no text outside the JSON object, in exactly this format:
{
    "JD Match": "xx%",
    "Missing Keywords": ["keyword1", "keyword2"],
    "Missing Certifications": [
        {"name": "certification1", "description": "description1"},
        {"name": "certification2", "description": "description2"}
    ],
    "Profile Summary": "Your detailed profile summary here."
}

Only include certifications that are highly valuable for the job position.

Resume:
{resume_text}

Job Description:
{job_description}"#;

/// Search-mode prompt. Placeholders: {job_market}, {resume_text}
pub const JOB_SEARCH_PROMPT_TEMPLATE: &str = r#"You are an advanced AI specialized in the {job_market} job market. Based on the following resume,
identify relevant job titles and provide direct search links to LinkedIn and Indeed job listings
that match the candidate's profile. The jobs should be related to their skills and experience.

Respond with valid JSON only, with no text outside the JSON object, in exactly this format:
{
    "Jobs": [
        {"title": "Job Title 1", "linkedin": "https://www.linkedin.com/jobs/search/?keywords=Job+Title+1", "indeed": "https://www.indeed.com/q-Job-Title-1-jobs.html"},
        {"title": "Job Title 2", "linkedin": "https://www.linkedin.com/jobs/search/?keywords=Job+Title+2", "indeed": "https://www.indeed.com/q-Job-Title-2-jobs.html"}
    ]
}

Resume:
{resume_text}"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisMode {
    /// Résumé vs a specific job description.
    Match,
    /// Job titles and board links from the résumé alone.
    JobSearch,
}

/// A fully rendered prompt. Remembers its mode so the reply is parsed against the right schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisPrompt {
    mode: AnalysisMode,
    text: String,
}

impl AnalysisPrompt {
    pub fn mode(&self) -> AnalysisMode {
        self.mode
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

#[derive(Debug, Clone)]
pub struct PromptBuilder {
    job_market: String,
}

impl PromptBuilder {
    pub fn new(job_market: impl Into<String>) -> Self {
        Self {
            job_market: job_market.into(),
        }
    }

    /// Renders the prompt for `mode`. Both inputs are embedded verbatim.
    pub fn build(
        &self,
        resume_text: &str,
        mode: AnalysisMode,
        job_description: Option<&str>,
    ) -> Result<AnalysisPrompt, AppError> {
        if resume_text.trim().is_empty() {
            return Err(AppError::Validation(
                "The résumé contains no extractable text".to_string(),
            ));
        }

        let text = match mode {
            AnalysisMode::Match => {
                let job_description = job_description
                    .filter(|jd| !jd.trim().is_empty())
                    .ok_or_else(|| {
                        AppError::Validation("A job description is required".to_string())
                    })?;
                render_template(
                    MATCH_PROMPT_TEMPLATE,
                    &[
                        ("job_market", &self.job_market),
                        ("resume_text", resume_text),
                        ("job_description", job_description),
                    ],
                )
            }
            AnalysisMode::JobSearch => render_template(
                JOB_SEARCH_PROMPT_TEMPLATE,
                &[("job_market", &self.job_market), ("resume_text", resume_text)],
            ),
        };

        Ok(AnalysisPrompt { mode, text })
    }
}

/// Single-pass `{name}` substitution. Substituted values are never rescanned, so
/// résumé text that happens to contain `{job_description}` stays literal.
fn render_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len() + vars.iter().map(|(_, v)| v.len()).sum::<usize>());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let replaced = after.find('}').and_then(|close| {
            let name = &after[..close];
            vars.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, close))
        });
        match replaced {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESUME: &str = "5 years Python, AWS certified";
    const JD: &str = "Seeking ML engineer with Kubernetes experience";

    fn builder() -> PromptBuilder {
        PromptBuilder::new("Canadian")
    }

    #[test]
    fn test_match_prompt_embeds_inputs_verbatim() {
        let prompt = builder().build(RESUME, AnalysisMode::Match, Some(JD)).unwrap();
        assert_eq!(prompt.mode(), AnalysisMode::Match);
        assert!(prompt.as_str().contains(RESUME));
        assert!(prompt.as_str().contains(JD));
        assert!(prompt.as_str().contains("Canadian job market"));
        assert!(prompt.as_str().contains("\"JD Match\""));
        assert!(prompt.as_str().contains("\"Missing Certifications\""));
        assert!(prompt.as_str().contains("highly valuable"));
    }

    #[test]
    fn test_match_prompt_requires_job_description() {
        let err = builder().build(RESUME, AnalysisMode::Match, None).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = builder()
            .build(RESUME, AnalysisMode::Match, Some("  \n "))
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_empty_resume_rejected_in_both_modes() {
        for mode in [AnalysisMode::Match, AnalysisMode::JobSearch] {
            let err = builder().build("   ", mode, Some(JD)).unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
    }

    #[test]
    fn test_job_search_prompt_ignores_job_description() {
        let prompt = builder()
            .build(RESUME, AnalysisMode::JobSearch, Some(JD))
            .unwrap();
        assert_eq!(prompt.mode(), AnalysisMode::JobSearch);
        assert!(prompt.as_str().contains(RESUME));
        assert!(!prompt.as_str().contains(JD));
        assert!(prompt.as_str().contains("\"Jobs\""));
        assert!(prompt.as_str().contains("keywords=Job+Title+1"));
        assert!(prompt.as_str().contains("q-Job-Title-1-jobs.html"));
    }

    #[test]
    fn test_builder_is_deterministic() {
        let a = builder().build(RESUME, AnalysisMode::Match, Some(JD)).unwrap();
        let b = builder().build(RESUME, AnalysisMode::Match, Some(JD)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_no_placeholders_left_behind() {
        let prompt = builder().build(RESUME, AnalysisMode::Match, Some(JD)).unwrap();
        for placeholder in ["{job_market}", "{resume_text}", "{job_description}"] {
            assert!(!prompt.as_str().contains(placeholder));
        }
    }

    #[test]
    fn test_inserted_text_is_not_rescanned() {
        let resume = "Skills: {job_description} and {job_market}";
        let prompt = builder().build(resume, AnalysisMode::Match, Some(JD)).unwrap();
        assert!(prompt.as_str().contains(resume));
    }

    #[test]
    fn test_render_template_keeps_unknown_braces() {
        let out = render_template(r#"{"a": {x}} {unknown}"#, &[("x", "1")]);
        assert_eq!(out, r#"{"a": 1} {unknown}"#);
    }
}
