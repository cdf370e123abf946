//! Transcript post-processing.
//!
//! Three independent extraction passes over the model's final transcript:
//! document identifiers, supporting citations, and the final answer
//! sentence. All heuristics live in declarative pattern tables so each pass
//! stays unit-testable on its own.

use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

/// Error type for transcript post-processing.
///
/// Citation extraction builds per-identifier patterns at runtime, so it is
/// the only fallible pass.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("citation pattern for '{identifier}' failed to compile: {source}")]
    CitationPattern {
        identifier: String,
        source: regex::Error,
    },
}

// =============================================================================
// Identifier extraction
// =============================================================================

/// Ordered identifier patterns, each paired with the capture group to take
/// (0 = the whole match). Evaluated top to bottom by [`extract_identifiers`].
const IDENTIFIER_PATTERNS: &[(&str, usize)] = &[
    (
        r"(?i)\b(?:clause|section|article|paragraph|rule|code|provision|regulation)_[A-Za-z0-9_\-]+\b",
        0,
    ),
    (r"(?i)\bdoc_[A-Za-z0-9_\-]+\b", 0),
    (r"(?i)\bunknown_doc_[A-Za-z0-9_\-]+\b", 0),
    (r"(?i)\bzone_[A-Za-z0-9_\-]+\b", 0),
    (r"(?i)\bID:\s*([A-Za-z0-9_\-]+)", 1),
    (r"(?i)\bDocument\s*#?\d+:\s*([A-Za-z0-9_\-]+)", 1),
];

lazy_static! {
    static ref IDENTIFIER_TABLE: Vec<(Regex, usize)> = IDENTIFIER_PATTERNS
        .iter()
        .map(|(pattern, group)| {
            (
                Regex::new(pattern).expect("identifier pattern is valid"),
                *group,
            )
        })
        .collect();
}

/// Scan the transcript for document identifiers.
///
/// Patterns run in table order; matches are deduplicated case-insensitively
/// with first-seen order preserved across passes. No matches is not an
/// error, just an empty list.
pub fn extract_identifiers(transcript: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut found = Vec::new();

    for (regex, group) in IDENTIFIER_TABLE.iter() {
        for caps in regex.captures_iter(transcript) {
            let Some(m) = caps.get(*group) else { continue };
            let identifier = m.as_str();
            if seen.insert(identifier.to_lowercase()) {
                found.push(identifier.to_string());
            }
        }
    }

    found
}

// =============================================================================
// Citation extraction
// =============================================================================

/// How to locate a supporting quote for one identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteStrategy {
    /// The identifier directly labels the quote: `doc_42: "..."`.
    Labeled,
    /// Any quoted string within 100 characters of an identifier occurrence.
    Nearby,
    /// First long quote in the first paragraph mentioning the identifier.
    Paragraph,
}

/// Default strategy precedence: most specific first, first match wins.
pub const DEFAULT_QUOTE_PRECEDENCE: [QuoteStrategy; 3] = [
    QuoteStrategy::Labeled,
    QuoteStrategy::Nearby,
    QuoteStrategy::Paragraph,
];

/// Radius (in characters) around an identifier occurrence searched by
/// [`QuoteStrategy::Nearby`].
const NEARBY_RADIUS: usize = 100;

/// Minimum quote length considered by [`QuoteStrategy::Paragraph`].
const PARAGRAPH_QUOTE_MIN: usize = 20;

/// Paragraph quotes are truncated to this many characters.
const PARAGRAPH_QUOTE_MAX: usize = 150;

lazy_static! {
    static ref ANY_QUOTE: Regex = Regex::new(r#"["']([^"']+)["']"#).expect("quote pattern");
    static ref LONG_QUOTE: Regex =
        Regex::new(r#"["']([^"']{20,})["']"#).expect("long quote pattern");
}

/// Extract a citation string for the given identifiers with the default
/// strategy precedence.
pub fn extract_citations(
    transcript: &str,
    identifiers: &[String],
) -> Result<String, ExtractError> {
    extract_citations_with(transcript, identifiers, &DEFAULT_QUOTE_PRECEDENCE)
}

/// Extract a citation string with an explicit strategy precedence.
///
/// For each identifier the strategies are attempted in the given order and
/// the first quote found wins; with no quote the entry degrades to the bare
/// identifier. Entries are joined with `"; "`. An empty identifier list
/// yields the literal `No citations extracted`.
pub fn extract_citations_with(
    transcript: &str,
    identifiers: &[String],
    precedence: &[QuoteStrategy],
) -> Result<String, ExtractError> {
    if identifiers.is_empty() {
        return Ok("No citations extracted".to_string());
    }

    let mut entries = Vec::with_capacity(identifiers.len());
    for identifier in identifiers {
        let mut quote = None;
        for strategy in precedence {
            quote = match strategy {
                QuoteStrategy::Labeled => labeled_quote(transcript, identifier)?,
                QuoteStrategy::Nearby => nearby_quote(transcript, identifier)?,
                QuoteStrategy::Paragraph => paragraph_quote(transcript, identifier),
            };
            if quote.is_some() {
                break;
            }
        }

        match quote {
            Some(q) => entries.push(format!("{}: \"{}\"", identifier, q)),
            None => entries.push(identifier.clone()),
        }
    }

    Ok(entries.join("; "))
}

fn citation_regex(pattern: String, identifier: &str) -> Result<Regex, ExtractError> {
    Regex::new(&pattern).map_err(|source| ExtractError::CitationPattern {
        identifier: identifier.to_string(),
        source,
    })
}

/// Strategy 1: the identifier immediately followed by a colon and a quote.
fn labeled_quote(transcript: &str, identifier: &str) -> Result<Option<String>, ExtractError> {
    let regex = citation_regex(
        format!(r#"(?is){}:\s*["']([^"']+)["']"#, regex::escape(identifier)),
        identifier,
    )?;

    Ok(regex
        .captures(transcript)
        .map(|caps| caps[1].to_string()))
}

/// Strategy 2: any quoted string within [`NEARBY_RADIUS`] characters of an
/// occurrence of the identifier.
fn nearby_quote(transcript: &str, identifier: &str) -> Result<Option<String>, ExtractError> {
    let regex = citation_regex(format!("(?i){}", regex::escape(identifier)), identifier)?;

    for m in regex.find_iter(transcript) {
        let window = char_window(transcript, m.start(), m.end(), NEARBY_RADIUS);
        if let Some(caps) = ANY_QUOTE.captures(window) {
            return Ok(Some(caps[1].to_string()));
        }
    }

    Ok(None)
}

/// Strategy 3: split on blank lines and take the first long quote from the
/// first paragraph mentioning the identifier. Quotes containing a literal
/// ellipsis are skipped; the quote is truncated to [`PARAGRAPH_QUOTE_MAX`]
/// characters and must still be longer than 15.
fn paragraph_quote(transcript: &str, identifier: &str) -> Option<String> {
    let paragraph = transcript
        .split("\n\n")
        .find(|para| para.contains(identifier))?;

    for caps in LONG_QUOTE.captures_iter(paragraph) {
        let quote: String = caps[1].chars().take(PARAGRAPH_QUOTE_MAX).collect();
        if !quote.contains("...") && quote.chars().count() > 15 {
            return Some(quote);
        }
    }

    None
}

/// Slice `radius` characters either side of the byte range `start..end`,
/// clamped to the text and kept on char boundaries.
fn char_window(text: &str, start: usize, end: usize, radius: usize) -> &str {
    let begin = text[..start]
        .char_indices()
        .rev()
        .nth(radius.saturating_sub(1))
        .map(|(i, _)| i)
        .unwrap_or(0);
    let stop = text[end..]
        .char_indices()
        .nth(radius)
        .map(|(i, _)| end + i)
        .unwrap_or(text.len());
    &text[begin..stop]
}

// =============================================================================
// Final-answer extraction
// =============================================================================

/// Line-start markers that explicitly label the answer (lowercase).
const ANSWER_MARKERS: &[&str] = &[
    "final determination:",
    "final answer:",
    "conclusion:",
    "answer:",
    "determination:",
    "result:",
    "ruling:",
    "decision:",
];

/// Definitive legal language anchored at line start, matched on the
/// lowercased line.
const DEFINITIVE_PATTERNS: &[&str] = &[
    r"^(yes|no),\s+.{20,}",
    r"^(it depends|conditional|conditionally).{20,}",
    r"^(you can|you cannot|allowed|not allowed|permitted|prohibited).{20,}",
    r"^(the answer is).{20,}",
    r"^(based on|according to).{20,}",
];

/// Prefixes marking structural/metadata lines skipped by the backward scan.
const STRUCTURAL_PREFIXES: &[&str] = &[
    "Document", "ID:", "Score:", "Content:", "**", "##", "- ", "* ",
];

/// Prefixes excluded from the longest-line fallback.
const FALLBACK_SKIP_PREFIXES: &[&str] = &["Document", "Search", "ID:", "Score:"];

/// Returned when no extraction stage produces an answer.
pub const FALLBACK_ANSWER: &str =
    "Unable to extract a definitive answer from the legal analysis.";

lazy_static! {
    static ref DEFINITIVE_TABLE: Vec<Regex> = DEFINITIVE_PATTERNS
        .iter()
        .map(|pattern| Regex::new(pattern).expect("definitive pattern is valid"))
        .collect();
    static ref SEPARATOR_LINE: Regex =
        Regex::new(r"^[=\-·]+$").expect("separator pattern is valid");
}

/// Extract the final answer sentence from the transcript.
///
/// Five stages, first match wins: explicit answer markers, definitive legal
/// language, a backward scan for the last substantive line, the longest
/// substantive line, and finally a fixed placeholder.
pub fn extract_final_answer(transcript: &str) -> String {
    let lines: Vec<&str> = transcript
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    // Stage 1: explicit answer markers.
    for line in &lines {
        let lower = line.to_lowercase();
        for marker in ANSWER_MARKERS {
            if lower.starts_with(marker) {
                let answer: String = line
                    .chars()
                    .skip(marker.chars().count())
                    .collect::<String>()
                    .trim()
                    .to_string();
                if answer.chars().count() > 10 {
                    return answer;
                }
            }
        }
    }

    // Stage 2: definitive legal language (original casing returned).
    for line in &lines {
        let lower = line.to_lowercase();
        if DEFINITIVE_TABLE.iter().any(|p| p.is_match(&lower)) {
            return line.to_string();
        }
    }

    // Stage 3: last substantive line, skipping structure and separators.
    for line in lines.iter().rev() {
        let lower = line.to_lowercase();
        if line.chars().count() > 50
            && !STRUCTURAL_PREFIXES.iter().any(|p| line.starts_with(p))
            && !SEPARATOR_LINE.is_match(line)
            && !lower.contains("search")
            && !lower.contains("citation")
        {
            return line.to_string();
        }
    }

    // Stage 4: longest substantive line (first one on ties).
    let mut best: Option<&str> = None;
    for line in &lines {
        if line.chars().count() > 30
            && !FALLBACK_SKIP_PREFIXES.iter().any(|p| line.starts_with(p))
            && best.map_or(true, |b| line.chars().count() > b.chars().count())
        {
            best = Some(line);
        }
    }
    if let Some(line) = best {
        return line.to_string();
    }

    FALLBACK_ANSWER.to_string()
}
