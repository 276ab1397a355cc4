//! Rule-based text tools for summarization workflows.
//!
//! Lengths are counted in characters, not bytes. Each tool also exists as a plain
//! function so other tools (and tests) can call it directly.

use std::collections::HashSet;

use futures::FutureExt;
use serde_json::{json, Value};

use super::args::{optional_str, required_usize, str_list, usize_or};
use super::{AsyncFnTool, FnTool, ToolArgs, ToolError, ToolRegistry};

pub const TOOL_SPLIT_TEXT: &str = "split_text";
pub const TOOL_GENERATE_SUMMARY: &str = "generate_summary";
pub const TOOL_PROCESS_CHUNKS: &str = "process_chunks";
pub const TOOL_MERGE_SUMMARIES: &str = "merge_summaries";
pub const TOOL_REFINE_SUMMARY: &str = "refine_summary";
pub const TOOL_CALCULATE_SUMMARY_SCORE: &str = "calculate_summary_score";
pub const TOOL_QUALITY_ASSESSMENT: &str = "quality_assessment";
pub const TOOL_FINALIZE_SUMMARY: &str = "finalize_summary";

/// Quality score at or above which a long summary is still accepted.
pub(crate) const ACCEPTABLE_SCORE: f64 = 0.8;

pub(crate) fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn take_chars(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

pub(crate) fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Non-empty, trimmed sentences split on '.'.
fn sentences(text: &str) -> Vec<&str> {
    text.split('.').map(str::trim).filter(|s| !s.is_empty()).collect()
}

/// Leading sentences whose lengths (plus one separator each) fit in `max_len`,
/// joined back with ". ". Falls back to a hard character cut when nothing fits.
fn pack_sentences(text: &str, max_len: usize) -> String {
    let mut picked = Vec::new();
    let mut current = 0;
    for sentence in sentences(text) {
        let len = char_len(sentence);
        if current + len + 1 > max_len {
            break;
        }
        picked.push(sentence);
        current += len + 1;
    }
    if picked.is_empty() {
        take_chars(text, max_len)
    } else {
        format!("{}.", picked.join(". "))
    }
}

/// Splits `text` into chunks of at most `chunk_size` characters, overlapping by `overlap`.
///
/// A chunk that would cut a word is shortened to its last space, but only when that
/// space lies past the middle of the chunk. Empty chunks are dropped.
pub fn split_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    if text.is_empty() || chunk_size == 0 {
        return Vec::new();
    }
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();
    let mut chunks = Vec::new();
    let mut start = 0;
    while start < len {
        let mut end = (start + chunk_size).min(len);
        let mut chunk = &chars[start..end];
        if end < len && chunk.last() != Some(&' ') {
            if let Some(last_space) = chunk.iter().rposition(|c| *c == ' ') {
                if last_space > chunk_size / 2 {
                    chunk = &chunk[..last_space];
                    end = start + last_space;
                }
            }
        }
        chunks.push(chunk.iter().collect::<String>().trim().to_string());
        if end >= len {
            break;
        }
        // overlap >= advance would stall; step past the chunk instead.
        let next = end.saturating_sub(overlap);
        start = if next > start { next } else { end };
    }
    chunks.retain(|c| !c.is_empty());
    chunks
}

/// Extractive summary: leading sentences up to `max_length` characters.
pub fn generate_summary(text: &str, max_length: usize) -> String {
    if text.is_empty() {
        return String::new();
    }
    pack_sentences(text, max_length)
}

/// Joins trimmed summaries with a space, dropping blanks and exact duplicates (first wins).
pub fn merge_summaries(summaries: &[String]) -> String {
    let mut seen = HashSet::new();
    let mut unique = Vec::new();
    for summary in summaries {
        let s = summary.trim();
        if !s.is_empty() && seen.insert(s) {
            unique.push(s);
        }
    }
    unique.join(" ")
}

/// Shortens `summary` to at most `target_length` characters at a sentence boundary.
pub fn refine_summary(summary: &str, target_length: usize) -> String {
    if summary.is_empty() {
        return String::new();
    }
    if char_len(summary) <= target_length {
        return summary.to_string();
    }
    pack_sentences(summary, target_length)
}

/// Score in [.., 1]: 70% word overlap with the original, 30% compression.
pub fn calculate_summary_score(original_text: &str, summary: &str) -> f64 {
    if original_text.is_empty() || summary.is_empty() {
        return 0.0;
    }
    let compression = char_len(summary) as f64 / char_len(original_text) as f64;
    let original_words: HashSet<String> = original_text
        .split_whitespace()
        .map(str::to_lowercase)
        .collect();
    if original_words.is_empty() {
        return 0.0;
    }
    let summary_words: HashSet<String> = summary.split_whitespace().map(str::to_lowercase).collect();
    let overlap =
        original_words.intersection(&summary_words).count() as f64 / original_words.len() as f64;
    round2(overlap * 0.7 + (1.0 - compression).min(1.0) * 0.3)
}

/// Decides whether a summary needs another refinement pass.
///
/// Refinement is needed only when the summary is both longer than `target_length`
/// and scores below the acceptable threshold.
pub fn quality_assessment(original_text: &str, summary: &str, target_length: usize) -> Value {
    if summary.is_empty() {
        return json!({
            "summary_length": 0,
            "quality_score": 0.0,
            "needs_refinement": true,
            "final_summary": "",
            "assessment": "Empty summary",
        });
    }
    let summary_length = char_len(summary);
    let quality_score = calculate_summary_score(original_text, summary);
    let needs_refinement = summary_length > target_length && quality_score < ACCEPTABLE_SCORE;
    let assessment = if needs_refinement {
        format!(
            "Summary too long ({} > {}) or low quality ({})",
            summary_length, target_length, quality_score
        )
    } else {
        format!(
            "Summary meets criteria: length={}, quality={}",
            summary_length, quality_score
        )
    };
    json!({
        "summary_length": summary_length,
        "quality_score": quality_score,
        "needs_refinement": needs_refinement,
        "final_summary": if needs_refinement { "" } else { summary },
        "target_length": target_length,
        "assessment": assessment,
    })
}

pub fn finalize_summary(summary: Option<&str>) -> Value {
    let final_summary = match summary {
        Some(s) if !s.is_empty() => s.trim().to_string(),
        _ => "No summary generated".to_string(),
    };
    json!({
        "summary_length": char_len(&final_summary),
        "final_summary": final_summary,
        "status": "completed",
    })
}

fn process_chunks(chunks: &[String], max_length: usize) -> Value {
    let summaries: Vec<String> = chunks
        .iter()
        .filter(|c| !c.trim().is_empty())
        .map(|c| generate_summary(c, max_length))
        .collect();
    json!({ "chunk_summaries": summaries })
}

/// Registers every text tool on `registry`.
pub fn register_text_tools(registry: &mut ToolRegistry) {
    registry
        .register(FnTool::new(
            TOOL_SPLIT_TEXT,
            "Split text into manageable chunks",
            |args: ToolArgs| {
                let text = optional_str(&args, "text")?.unwrap_or_default();
                let chunk_size = usize_or(&args, "chunk_size", 1000)?;
                if chunk_size == 0 {
                    return Err(ToolError::InvalidInput("chunk_size must be positive".into()));
                }
                let overlap = usize_or(&args, "overlap", 100)?;
                Ok(json!(split_text(text, chunk_size, overlap)))
            },
        ))
        .register(AsyncFnTool::new(
            TOOL_GENERATE_SUMMARY,
            "Generate summary for a text chunk",
            |args: ToolArgs| {
                async move {
                    let text = optional_str(&args, "text")?.unwrap_or_default();
                    let max_length = usize_or(&args, "max_length", 200)?;
                    Ok::<_, ToolError>(json!(generate_summary(text, max_length)))
                }
                .boxed()
            },
        ))
        .register(AsyncFnTool::new(
            TOOL_PROCESS_CHUNKS,
            "Process text chunks to generate summaries",
            |args: ToolArgs| {
                async move {
                    let chunks = str_list(&args, "chunks")?;
                    let max_length = usize_or(&args, "max_length", 200)?;
                    Ok::<_, ToolError>(process_chunks(&chunks, max_length))
                }
                .boxed()
            },
        ))
        .register(FnTool::new(
            TOOL_MERGE_SUMMARIES,
            "Merge multiple summaries into one",
            |args: ToolArgs| Ok(json!(merge_summaries(&str_list(&args, "summaries")?))),
        ))
        .register(AsyncFnTool::new(
            TOOL_REFINE_SUMMARY,
            "Refine and polish the final summary",
            |args: ToolArgs| {
                async move {
                    let summary = optional_str(&args, "summary")?.unwrap_or_default();
                    let target_length = usize_or(&args, "target_length", 500)?;
                    Ok::<_, ToolError>(json!(refine_summary(summary, target_length)))
                }
                .boxed()
            },
        ))
        .register(FnTool::new(
            TOOL_CALCULATE_SUMMARY_SCORE,
            "Calculate quality score for summary",
            |args: ToolArgs| {
                let original = optional_str(&args, "original_text")?.unwrap_or_default();
                let summary = optional_str(&args, "summary")?.unwrap_or_default();
                Ok(json!(calculate_summary_score(original, summary)))
            },
        ))
        .register(FnTool::new(
            TOOL_QUALITY_ASSESSMENT,
            "Assess summary quality and determine next steps",
            |args: ToolArgs| {
                let original = optional_str(&args, "original_text")?.unwrap_or_default();
                let summary = optional_str(&args, "summary")?.unwrap_or_default();
                if summary.is_empty() {
                    return Ok(quality_assessment(original, summary, 0));
                }
                let target_length = required_usize(&args, "target_length")?;
                Ok(quality_assessment(original, summary, target_length))
            },
        ))
        .register(FnTool::new(
            TOOL_FINALIZE_SUMMARY,
            "Finalize the workflow summary",
            |args: ToolArgs| Ok(finalize_summary(optional_str(&args, "summary")?)),
        ));
}
