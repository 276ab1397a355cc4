//! Bundled workflow definitions.

mod llm_summarization;
mod summarization;

pub use llm_summarization::{
    llm_summarization_workflow, sample_llm_summarization_state, LLM_SUMMARY_TARGET_LENGTH,
};
pub use summarization::{sample_summarization_state, summarization_workflow, SUMMARY_LENGTH_LIMIT};
