//! LLM-backed summarization tools with rule-based fallbacks.
//!
//! Each tool calls the configured [`LlmClient`] and falls back to the matching function in
//! [`text`](super::text) when no client is configured or the call fails. The fallback is
//! logged, never surfaced as a tool error.

use std::sync::Arc;

use futures::FutureExt;
use serde_json::{json, Value};

use super::args::{bool_or, optional_str, str_list, usize_or};
use super::text::{
    calculate_summary_score, char_len, generate_summary, refine_summary, round2, ACCEPTABLE_SCORE,
};
use super::{AsyncFnTool, ToolArgs, ToolError, ToolRegistry};
use crate::graph::logging;
use crate::llm::LlmClient;

pub const TOOL_LLM_SUMMARIZE: &str = "llm_summarize";
pub const TOOL_LLM_REFINE_SUMMARY: &str = "llm_refine_summary";
pub const TOOL_HYBRID_SUMMARIZE: &str = "hybrid_summarize";
pub const TOOL_PROCESS_CHUNKS_LLM: &str = "process_chunks_llm";
pub const TOOL_LLM_QUALITY_ASSESSMENT: &str = "llm_quality_assessment";

/// Weights of the rule and model scores in the combined quality score.
const RULE_SCORE_WEIGHT: f64 = 0.3;
const LLM_SCORE_WEIGHT: f64 = 0.7;
/// Combined score at or above which a model-assessed summary is accepted.
const LLM_ACCEPTABLE_SCORE: f64 = 0.7;
/// A summary may exceed its target length by this factor and still pass.
const LENGTH_TOLERANCE: f64 = 1.1;

const SUMMARIZE_SYSTEM: &str = "You write concise, faithful summaries. Reply with the summary text only.";
const REFINE_SYSTEM: &str = "You edit summaries for clarity and length without adding facts. Reply with the revised summary only.";
const ASSESS_SYSTEM: &str = "You grade summaries. Put a score between 0.0 and 1.0 alone on the first line, then one or two sentences of feedback.";

/// Runs one completion; `None` (logged) when there is no client or the call fails.
async fn complete(llm: Option<&dyn LlmClient>, tool: &str, system: &str, prompt: &str) -> Option<String> {
    let Some(llm) = llm else {
        logging::log_llm_unavailable(tool);
        return None;
    };
    match llm.complete(system, prompt).await {
        Ok(text) => Some(text.trim().to_string()),
        Err(e) => {
            logging::log_llm_failure(tool, &e);
            None
        }
    }
}

/// Model summary of `text` in about `max_length` characters; falls back to [`generate_summary`].
pub async fn llm_summarize(llm: Option<&dyn LlmClient>, text: &str, max_length: usize) -> String {
    if text.is_empty() {
        return String::new();
    }
    let prompt = format!(
        "Summarize the following text in at most {} characters.\n\nText:\n{}",
        max_length, text
    );
    match complete(llm, TOOL_LLM_SUMMARIZE, SUMMARIZE_SYSTEM, &prompt).await {
        Some(summary) if !summary.is_empty() => summary,
        _ => generate_summary(text, max_length),
    }
}

/// Model rewrite of `summary` towards `target_length`; falls back to [`refine_summary`].
pub async fn llm_refine_summary(
    llm: Option<&dyn LlmClient>,
    original_text: &str,
    summary: &str,
    target_length: usize,
) -> String {
    if summary.is_empty() {
        return String::new();
    }
    let prompt = format!(
        "Improve this summary so it covers the key points of the original in at most {} characters.\n\n\
         Original:\n{}\n\nSummary:\n{}",
        target_length, original_text, summary
    );
    match complete(llm, TOOL_LLM_REFINE_SUMMARY, REFINE_SYSTEM, &prompt).await {
        Some(refined) if !refined.is_empty() => refined,
        _ => refine_summary(summary, target_length),
    }
}

/// [`llm_summarize`] when `prefer_llm`, otherwise the rule-based summary directly.
pub async fn hybrid_summarize(
    llm: Option<&dyn LlmClient>,
    text: &str,
    max_length: usize,
    prefer_llm: bool,
) -> String {
    if prefer_llm {
        llm_summarize(llm, text, max_length).await
    } else {
        generate_summary(text, max_length)
    }
}

/// `{"chunk_summaries": [...]}` for the non-blank chunks, each via [`hybrid_summarize`].
pub async fn process_chunks_llm(llm: Option<&dyn LlmClient>, chunks: &[String], max_length: usize) -> Value {
    let mut summaries = Vec::with_capacity(chunks.len());
    for chunk in chunks.iter().filter(|c| !c.trim().is_empty()) {
        summaries.push(hybrid_summarize(llm, chunk, max_length, true).await);
    }
    json!({ "chunk_summaries": summaries })
}

/// Leading number of the first line, clamped to [0, 1]: `"0.85\nGood"` → 0.85.
fn parse_score(reply: &str) -> Option<f64> {
    let token = reply.lines().next()?.split_whitespace().next()?;
    let token = token.trim_matches(|c: char| !c.is_ascii_digit() && c != '.');
    token.parse::<f64>().ok().map(|s| s.clamp(0.0, 1.0))
}

/// Grades `summary` against `original_text` and decides whether it needs refinement.
///
/// With a model score, the combined score is 30% rule score and 70% model score; refinement
/// is needed unless the summary is within 10% of `target_length` and scores at least 0.7.
/// Without one, the rule-based decision applies: refine only a summary that is both over
/// the tolerated length and below the acceptable rule score.
pub async fn llm_quality_assessment(
    llm: Option<&dyn LlmClient>,
    original_text: &str,
    summary: &str,
    target_length: usize,
) -> Value {
    if summary.is_empty() {
        return json!({
            "summary_length": 0,
            "quality_score": 0.0,
            "needs_refinement": true,
            "final_summary": "",
            "assessment": "Empty summary",
            "llm_assessment": "No summary to assess",
        });
    }

    let summary_length = char_len(summary);
    let rule_score = calculate_summary_score(original_text, summary);
    let prompt = format!(
        "Target length: {} characters.\n\nOriginal:\n{}\n\nSummary:\n{}",
        target_length, original_text, summary
    );
    let reply = complete(llm, TOOL_LLM_QUALITY_ASSESSMENT, ASSESS_SYSTEM, &prompt).await;
    let llm_score = reply.as_deref().and_then(parse_score);

    let length_ok = summary_length as f64 <= target_length as f64 * LENGTH_TOLERANCE;
    let (quality_score, quality_ok) = match llm_score {
        Some(llm_score) => {
            let combined = round2(rule_score * RULE_SCORE_WEIGHT + llm_score * LLM_SCORE_WEIGHT);
            (combined, combined >= LLM_ACCEPTABLE_SCORE)
        }
        None => (rule_score, rule_score >= ACCEPTABLE_SCORE),
    };
    let needs_refinement = match llm_score {
        Some(_) => !(length_ok && quality_ok),
        None => !length_ok && !quality_ok,
    };

    let assessment = if needs_refinement {
        let mut reasons = Vec::new();
        if !length_ok {
            reasons.push(format!("too long ({} > {})", summary_length, target_length));
        }
        if !quality_ok {
            reasons.push(format!("low quality ({})", quality_score));
        }
        format!("Needs refinement: {}", reasons.join(", "))
    } else {
        format!(
            "Summary meets criteria: length={}, quality={}",
            summary_length, quality_score
        )
    };

    json!({
        "summary_length": summary_length,
        "quality_score": quality_score,
        "rule_score": rule_score,
        "llm_score": llm_score,
        "needs_refinement": needs_refinement,
        "final_summary": if needs_refinement { "" } else { summary },
        "target_length": target_length,
        "assessment": assessment,
        "llm_assessment": reply.unwrap_or_else(|| "LLM assessment unavailable".to_string()),
    })
}

/// Registers the LLM tools on `registry`, all sharing `llm`. With `None`, every tool runs
/// its rule-based fallback.
pub fn register_llm_tools(registry: &mut ToolRegistry, llm: Option<Arc<dyn LlmClient>>) {
    let summarize_llm = llm.clone();
    let refine_llm = llm.clone();
    let hybrid_llm = llm.clone();
    let chunks_llm = llm.clone();
    let assess_llm = llm;

    registry
        .register(AsyncFnTool::new(
            TOOL_LLM_SUMMARIZE,
            "Generate summary using an LLM, rule-based when unavailable",
            move |args: ToolArgs| {
                let llm = summarize_llm.clone();
                async move {
                    let text = optional_str(&args, "text")?.unwrap_or_default();
                    let max_length = usize_or(&args, "max_length", 200)?;
                    Ok::<_, ToolError>(json!(llm_summarize(llm.as_deref(), text, max_length).await))
                }
                .boxed()
            },
        ))
        .register(AsyncFnTool::new(
            TOOL_LLM_REFINE_SUMMARY,
            "Refine summary using an LLM, rule-based when unavailable",
            move |args: ToolArgs| {
                let llm = refine_llm.clone();
                async move {
                    let original = optional_str(&args, "original_text")?.unwrap_or_default();
                    let summary = optional_str(&args, "summary")?.unwrap_or_default();
                    let target_length = usize_or(&args, "target_length", 200)?;
                    let refined = llm_refine_summary(llm.as_deref(), original, summary, target_length).await;
                    Ok::<_, ToolError>(json!(refined))
                }
                .boxed()
            },
        ))
        .register(AsyncFnTool::new(
            TOOL_HYBRID_SUMMARIZE,
            "Smart summarization with LLM and rule-based fallback",
            move |args: ToolArgs| {
                let llm = hybrid_llm.clone();
                async move {
                    let text = optional_str(&args, "text")?.unwrap_or_default();
                    let max_length = usize_or(&args, "max_length", 200)?;
                    let prefer_llm = bool_or(&args, "prefer_llm", true)?;
                    let summary = hybrid_summarize(llm.as_deref(), text, max_length, prefer_llm).await;
                    Ok::<_, ToolError>(json!(summary))
                }
                .boxed()
            },
        ))
        .register(AsyncFnTool::new(
            TOOL_PROCESS_CHUNKS_LLM,
            "Summarize text chunks with an LLM, rule-based when unavailable",
            move |args: ToolArgs| {
                let llm = chunks_llm.clone();
                async move {
                    let chunks = str_list(&args, "chunks")?;
                    let max_length = usize_or(&args, "max_length", 300)?;
                    Ok::<_, ToolError>(process_chunks_llm(llm.as_deref(), &chunks, max_length).await)
                }
                .boxed()
            },
        ))
        .register(AsyncFnTool::new(
            TOOL_LLM_QUALITY_ASSESSMENT,
            "Assess summary quality with rule and LLM scores",
            move |args: ToolArgs| {
                let llm = assess_llm.clone();
                async move {
                    let original = optional_str(&args, "original_text")?.unwrap_or_default();
                    let summary = optional_str(&args, "summary")?.unwrap_or_default();
                    let target_length = usize_or(&args, "target_length", 200)?;
                    Ok::<_, ToolError>(
                        llm_quality_assessment(llm.as_deref(), original, summary, target_length).await,
                    )
                }
                .boxed()
            },
        ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlm;

    const ORIGINAL: &str = "Rust is a systems language. It guarantees memory safety without a garbage collector. \
        Ownership rules are checked at compile time. Many teams adopt it for reliable services.";

    /// **Scenario**: Without a client, llm_summarize equals the rule-based summary.
    #[tokio::test]
    async fn summarize_without_client_uses_rule_based() {
        assert_eq!(llm_summarize(None, ORIGINAL, 60).await, generate_summary(ORIGINAL, 60));
        assert_eq!(llm_summarize(None, "", 60).await, "");
    }

    /// **Scenario**: A configured client's reply is used, trimmed.
    #[tokio::test]
    async fn summarize_uses_client_reply() {
        let llm = MockLlm::new("  Rust is safe and fast.\n");
        assert_eq!(llm_summarize(Some(&llm), ORIGINAL, 60).await, "Rust is safe and fast.");
        assert_eq!(llm.calls(), 1);
    }

    /// **Scenario**: A failing or blank client falls back to the rule-based summary.
    #[tokio::test]
    async fn summarize_falls_back_on_failure() {
        let failing = MockLlm::failing("rate limited");
        assert_eq!(llm_summarize(Some(&failing), ORIGINAL, 60).await, generate_summary(ORIGINAL, 60));
        let blank = MockLlm::new("   ");
        assert_eq!(llm_summarize(Some(&blank), ORIGINAL, 60).await, generate_summary(ORIGINAL, 60));
    }

    /// **Scenario**: Refinement falls back to refine_summary; empty summaries stay empty without a call.
    #[tokio::test]
    async fn refine_fallback_and_empty() {
        let summary = "First sentence here. Second sentence is longer than the first one.";
        assert_eq!(
            llm_refine_summary(None, ORIGINAL, summary, 25).await,
            refine_summary(summary, 25)
        );
        let llm = MockLlm::new("Short.");
        assert_eq!(llm_refine_summary(Some(&llm), ORIGINAL, "", 25).await, "");
        assert_eq!(llm.calls(), 0);
        assert_eq!(llm_refine_summary(Some(&llm), ORIGINAL, summary, 25).await, "Short.");
    }

    /// **Scenario**: hybrid_summarize skips the client when prefer_llm is false.
    #[tokio::test]
    async fn hybrid_respects_prefer_llm() {
        let llm = MockLlm::new("model summary");
        assert_eq!(
            hybrid_summarize(Some(&llm), ORIGINAL, 60, false).await,
            generate_summary(ORIGINAL, 60)
        );
        assert_eq!(llm.calls(), 0);
        assert_eq!(hybrid_summarize(Some(&llm), ORIGINAL, 60, true).await, "model summary");
    }

    /// **Scenario**: process_chunks_llm skips blank chunks.
    #[tokio::test]
    async fn process_chunks_skips_blank() {
        let chunks = vec!["One. Two.".to_string(), "  ".to_string(), "Three.".to_string()];
        let out = process_chunks_llm(None, &chunks, 100).await;
        assert_eq!(out, json!({"chunk_summaries": ["One. Two.", "Three."]}));
    }

    /// **Scenario**: The score is read from the first line's leading number and clamped.
    #[test]
    fn parse_score_reads_first_line() {
        assert_eq!(parse_score("0.85\nClear and complete."), Some(0.85));
        assert_eq!(parse_score("**0.6** fair"), Some(0.6));
        assert_eq!(parse_score("1.7"), Some(1.0));
        assert_eq!(parse_score("Score: good"), None);
        assert_eq!(parse_score(""), None);
    }

    /// **Scenario**: Without a client the rule score decides, and a summary within length passes.
    #[tokio::test]
    async fn assessment_without_client_uses_rule_decision() {
        let summary = generate_summary(ORIGINAL, 60);
        let out = llm_quality_assessment(None, ORIGINAL, &summary, 60).await;
        let rule = calculate_summary_score(ORIGINAL, &summary);
        assert_eq!(out["rule_score"], json!(rule));
        assert_eq!(out["quality_score"], json!(rule));
        assert_eq!(out["llm_score"], Value::Null);
        assert_eq!(out["needs_refinement"], json!(false));
        assert_eq!(out["final_summary"], json!(summary));
        assert_eq!(out["llm_assessment"], json!("LLM assessment unavailable"));
    }

    /// **Scenario**: A model score is weighted 70/30 with the rule score.
    #[tokio::test]
    async fn assessment_combines_scores() {
        let summary = "Rust guarantees memory safety.";
        let llm = MockLlm::new("1.0\nAccurate.");
        let out = llm_quality_assessment(Some(&llm), ORIGINAL, summary, 100).await;
        let rule = calculate_summary_score(ORIGINAL, summary);
        assert_eq!(out["llm_score"], json!(1.0));
        assert_eq!(out["quality_score"], json!(round2(rule * 0.3 + 1.0 * 0.7)));
        assert_eq!(out["llm_assessment"], json!("1.0\nAccurate."));
    }

    /// **Scenario**: A low model score or an over-long summary asks for refinement, naming each reason.
    #[tokio::test]
    async fn assessment_flags_refinement_reasons() {
        let llm = MockLlm::new("0.1\nMisses the point.");
        let out = llm_quality_assessment(Some(&llm), ORIGINAL, ORIGINAL, 20).await;
        assert_eq!(out["needs_refinement"], json!(true));
        assert_eq!(out["final_summary"], json!(""));
        let assessment = out["assessment"].as_str().unwrap();
        assert!(assessment.starts_with("Needs refinement: too long ("), "{}", assessment);
        assert!(assessment.contains("low quality ("), "{}", assessment);
    }

    /// **Scenario**: Length within the 10% tolerance passes with a good model score.
    #[tokio::test]
    async fn assessment_allows_length_tolerance() {
        let summary = "x".repeat(105);
        let llm = MockLlm::new("1.0");
        let out = llm_quality_assessment(Some(&llm), &summary, &summary, 100).await;
        assert_eq!(out["needs_refinement"], json!(false));
    }

    /// **Scenario**: An empty summary always needs refinement and skips the client.
    #[tokio::test]
    async fn assessment_of_empty_summary() {
        let llm = MockLlm::new("1.0");
        let out = llm_quality_assessment(Some(&llm), ORIGINAL, "", 100).await;
        assert_eq!(out["needs_refinement"], json!(true));
        assert_eq!(out["assessment"], json!("Empty summary"));
        assert_eq!(llm.calls(), 0);
    }

    /// **Scenario**: Registered tools run through the registry with no client configured.
    #[tokio::test]
    async fn registered_tools_fall_back_without_client() {
        let mut registry = ToolRegistry::new();
        register_llm_tools(&mut registry, None);
        for name in [
            TOOL_LLM_SUMMARIZE,
            TOOL_LLM_REFINE_SUMMARY,
            TOOL_HYBRID_SUMMARIZE,
            TOOL_PROCESS_CHUNKS_LLM,
            TOOL_LLM_QUALITY_ASSESSMENT,
        ] {
            assert!(registry.get_tools()[name].is_async, "{}", name);
        }
        let args = json!({"text": ORIGINAL, "max_length": 60}).as_object().cloned().unwrap();
        let out = registry.execute(TOOL_HYBRID_SUMMARIZE, args).await.unwrap();
        assert_eq!(out, json!(generate_summary(ORIGINAL, 60)));
    }

    /// **Scenario**: Registered tools share the given client.
    #[tokio::test]
    async fn registered_tools_use_client() {
        let llm = Arc::new(MockLlm::new("0.9\nfine"));
        let mut registry = ToolRegistry::new();
        register_llm_tools(&mut registry, Some(llm.clone()));
        let args = json!({"text": ORIGINAL}).as_object().cloned().unwrap();
        let out = registry.execute(TOOL_LLM_SUMMARIZE, args).await.unwrap();
        assert_eq!(out, json!("0.9\nfine"));
        assert_eq!(llm.calls(), 1);
    }
}
