//! LLM summarization pipeline over the LLM tools.
//!
//! `split_text → llm_generate_summaries → merge_summaries → llm_refine_summary → quality_check`,
//! then back to `llm_refine_summary` while `needs_refinement` is true, else on to `finish`.
//! Runs without a configured model too: every LLM tool falls back to its rule-based version.

use serde_json::json;

use crate::graph::{ConditionSpec, EdgeSpec, GraphDefinition, NodeSpec};
use crate::state::StateMap;
use crate::tools::llm::{TOOL_LLM_QUALITY_ASSESSMENT, TOOL_LLM_REFINE_SUMMARY, TOOL_PROCESS_CHUNKS_LLM};
use crate::tools::text::{TOOL_FINALIZE_SUMMARY, TOOL_MERGE_SUMMARIES, TOOL_SPLIT_TEXT};

/// Target summary length in the sample state.
pub const LLM_SUMMARY_TARGET_LENGTH: u64 = 250;

const SAMPLE_TEXT: &str = "Artificial intelligence is changing how whole industries operate. Manufacturers use \
machine vision to catch defects on production lines, retailers forecast demand from purchase \
histories, and logistics companies plan delivery routes that adapt to traffic in real time. \
These systems learn from large amounts of data and improve as more data arrives.\n\n\
Healthcare and finance show both the promise and the stakes. Diagnostic models flag anomalies \
in medical images and help clinicians prioritize urgent cases, while drug discovery teams \
screen candidate molecules far faster than laboratory work alone allows. Banks detect \
fraudulent transactions within milliseconds, assess credit risk from many signals, and \
automate routine customer questions.\n\n\
Wider adoption raises ethical questions that cannot be left to engineers alone. Models can \
inherit bias from their training data, decisions made by complex systems are hard to explain, \
and automation shifts the kinds of work people do. Clear rules on transparency, privacy and \
accountability are needed so that the benefits of these tools are shared fairly.";

pub fn llm_summarization_workflow() -> GraphDefinition {
    GraphDefinition::new("LLM-Powered Text Summarization + Refinement Pipeline")
        .start_at("split_text")
        .node(
            NodeSpec::new("split_text", TOOL_SPLIT_TEXT)
                .with_description("Split input text into manageable chunks")
                .with_param("text", "$state.input_text")
                .with_param("chunk_size", "$state.chunk_size")
                .with_param("overlap", "$state.overlap"),
        )
        .node(
            NodeSpec::new("llm_generate_summaries", TOOL_PROCESS_CHUNKS_LLM)
                .with_description("Summarize every chunk with the LLM")
                .with_param("chunks", "$state.split_text_result")
                .with_param("max_length", 300),
        )
        .node(
            NodeSpec::new("merge_summaries", TOOL_MERGE_SUMMARIES)
                .with_description("Merge chunk summaries into one")
                .with_param("summaries", "$state.chunk_summaries"),
        )
        .node(
            NodeSpec::new("llm_refine_summary", TOOL_LLM_REFINE_SUMMARY)
                .with_description("Refine the merged summary with the LLM")
                .with_param("original_text", "$state.input_text")
                .with_param("summary", "$state.merge_summaries_result")
                .with_param("target_length", "$state.target_length"),
        )
        .node(
            NodeSpec::new("quality_check", TOOL_LLM_QUALITY_ASSESSMENT)
                .with_description("Score the summary with rules and the LLM")
                .with_param("original_text", "$state.input_text")
                .with_param("summary", "$state.llm_refine_summary_result")
                .with_param("target_length", "$state.target_length"),
        )
        .node(
            NodeSpec::new("finish", TOOL_FINALIZE_SUMMARY)
                .with_description("Publish the accepted summary")
                .with_param("summary", "$state.llm_refine_summary_result"),
        )
        .edge(EdgeSpec::new("split_text", "llm_generate_summaries"))
        .edge(EdgeSpec::new("llm_generate_summaries", "merge_summaries"))
        .edge(EdgeSpec::new("merge_summaries", "llm_refine_summary"))
        .edge(EdgeSpec::new("llm_refine_summary", "quality_check"))
        .edge(
            EdgeSpec::new("quality_check", "llm_refine_summary")
                .when(ConditionSpec::new("eq", "needs_refinement", true)),
        )
        .edge(
            EdgeSpec::new("quality_check", "finish")
                .when(ConditionSpec::new("eq", "needs_refinement", false)),
        )
}

/// Initial state for [`llm_summarization_workflow`] with a three-paragraph sample text.
pub fn sample_llm_summarization_state() -> StateMap {
    let mut state = StateMap::new();
    state.insert("input_text".into(), json!(SAMPLE_TEXT));
    state.insert("target_length".into(), json!(LLM_SUMMARY_TARGET_LENGTH));
    state.insert("chunk_size".into(), json!(800));
    state.insert("overlap".into(), json!(100));
    state
}
