// Résumé analysis: prompt building, the remote call, reply validation.
// All completion calls go through llm_client via the pipeline.

pub mod handlers;
pub mod links;
pub mod models;
pub mod pipeline;
pub mod prompts;
