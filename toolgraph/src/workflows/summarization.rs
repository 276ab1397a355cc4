//! Summarize-then-refine pipeline over the built-in text tools.
//!
//! `split_text → generate_summaries → merge_summaries → refine_summary → quality_check`,
//! looping back to `refine_summary` while `summary_length` exceeds 300.

use serde_json::json;

use crate::graph::{ConditionSpec, EdgeSpec, GraphDefinition, NodeSpec};
use crate::state::StateMap;
use crate::tools::text::{
    TOOL_MERGE_SUMMARIES, TOOL_PROCESS_CHUNKS, TOOL_QUALITY_ASSESSMENT, TOOL_REFINE_SUMMARY,
    TOOL_SPLIT_TEXT,
};

/// Summary length above which quality_check routes back to refinement.
pub const SUMMARY_LENGTH_LIMIT: u64 = 300;

const SAMPLE_TEXT: &str = "Artificial Intelligence (AI) refers to the simulation of human intelligence in machines \
that are programmed to think and learn like humans. The term may also be applied to any \
machine that exhibits traits associated with a human mind such as learning and \
problem-solving. The ideal characteristic of artificial intelligence is its ability to \
rationalize and take actions that have the best chance of achieving a specific goal.\n\n\
Machine Learning is a subset of AI that provides systems the ability to automatically \
learn and improve from experience without being explicitly programmed. Machine learning \
focuses on the development of computer programs that can access data and use it to learn \
for themselves. The process of learning begins with observations or data, such as examples, \
direct experience, or instruction, in order to look for patterns in data and make better \
decisions in the future based on the examples that we provide.\n\n\
Deep Learning is a subset of machine learning in artificial intelligence that has networks \
capable of learning unsupervised from data that is unstructured or unlabeled. Also known \
as deep neural learning or deep neural network, it is inspired by the structure and \
function of the brain, specifically the neural network. Deep learning algorithms attempt \
to draw similar conclusions as humans would by continually analyzing data with a logical \
structure. To achieve this, deep learning applications use a layered structure of \
algorithms called an artificial neural network.";

pub fn summarization_workflow() -> GraphDefinition {
    GraphDefinition::new("Text Summarization + Refinement Pipeline")
        .start_at("split_text")
        .node(
            NodeSpec::new("split_text", TOOL_SPLIT_TEXT)
                .with_description("Split input text into manageable chunks")
                .with_param("text", "$state.input_text")
                .with_param("chunk_size", 1000)
                .with_param("overlap", 100),
        )
        .node(
            NodeSpec::new("generate_summaries", TOOL_PROCESS_CHUNKS)
                .with_description("Generate summaries for all text chunks")
                .with_param("chunks", "$state.split_text_result")
                .with_param("max_length", 200),
        )
        .node(
            NodeSpec::new("merge_summaries", TOOL_MERGE_SUMMARIES)
                .with_description("Merge individual summaries into one")
                .with_param("summaries", "$state.chunk_summaries"),
        )
        .node(
            NodeSpec::new("refine_summary", TOOL_REFINE_SUMMARY)
                .with_description("Refine and polish the merged summary")
                .with_param("summary", "$state.merge_summaries_result")
                .with_param("target_length", "$state.target_length"),
        )
        .node(
            NodeSpec::new("quality_check", TOOL_QUALITY_ASSESSMENT)
                .with_description("Check if summary meets quality criteria")
                .with_param("original_text", "$state.input_text")
                .with_param("summary", "$state.refine_summary_result")
                .with_param("target_length", "$state.target_length"),
        )
        .edge(EdgeSpec::new("split_text", "generate_summaries"))
        .edge(EdgeSpec::new("generate_summaries", "merge_summaries"))
        .edge(EdgeSpec::new("merge_summaries", "refine_summary"))
        .edge(EdgeSpec::new("refine_summary", "quality_check"))
        .edge(
            EdgeSpec::new("quality_check", "refine_summary").when(ConditionSpec::new(
                "gt",
                "summary_length",
                SUMMARY_LENGTH_LIMIT,
            )),
        )
}

/// Initial state for [`summarization_workflow`] with a three-paragraph sample text.
pub fn sample_summarization_state() -> StateMap {
    let mut state = StateMap::new();
    state.insert("input_text".into(), json!(SAMPLE_TEXT));
    state.insert("target_length".into(), json!(SUMMARY_LENGTH_LIMIT));
    state.insert("chunk_size".into(), json!(500));
    state.insert("overlap".into(), json!(50));
    state
}
