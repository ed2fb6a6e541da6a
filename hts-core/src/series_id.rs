//! Structured time-series identifiers.
//!
//! The textual wire format is
//! `[locType:]location.source.type.interval[.scenario][[seqId]][~inputType[~inputName]]`
//! with `-` separating main and sub parts inside the location, source,
//! and data-type segments. Single-quoted segments are treated as opaque
//! so a literal period can appear inside a segment.

use crate::error::{HtsError, Result};
use crate::interval::Interval;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A parsed 5-to-7-part series identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesId {
    location_type: String,
    location: String,
    location_sub: String,
    source: String,
    source_sub: String,
    data_type: String,
    data_type_sub: String,
    interval_text: String,
    interval: Option<Interval>,
    scenario: String,
    sequence_id: String,
    input_type: String,
    input_name: String,
}

impl SeriesId {
    pub fn new() -> SeriesId {
        SeriesId::default()
    }

    /// Parse a full identifier string, splitting compound segments on `-`.
    pub fn parse(text: &str) -> Result<SeriesId> {
        Self::parse_with(text, false)
    }

    /// Parse without splitting compound segments: each of location,
    /// source, and data type is kept whole as the main part.
    pub fn parse_no_sub(text: &str) -> Result<SeriesId> {
        Self::parse_with(text, true)
    }

    fn parse_with(text: &str, no_sub: bool) -> Result<SeriesId> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(HtsError::IdentParse("empty identifier".to_string()));
        }
        let mut id = SeriesId::new();

        // Input type/name come off first: the token after the first `~`
        // is the type, and everything after the next `~` is the name
        // even if it itself contains `~`.
        let main_part = match trimmed.find('~') {
            Some(idx) => {
                let rest = &trimmed[idx + 1..];
                match rest.find('~') {
                    Some(jdx) => {
                        id.input_type = rest[..jdx].to_string();
                        id.input_name = rest[jdx + 1..].to_string();
                    }
                    None => {
                        id.input_type = rest.to_string();
                    }
                }
                &trimmed[..idx]
            }
            None => trimmed,
        };

        let segments = Self::split_segments(main_part)?;
        if segments.len() > 5 {
            return Err(HtsError::IdentParse(format!(
                "too many segments ({}) in \"{}\"",
                segments.len(),
                text
            )));
        }

        let mut iter = segments.into_iter();
        if let Some(first) = iter.next() {
            // segment 1 may carry a locationType: prefix
            let (loc_type, loc) = match first.find(':') {
                Some(idx) if !first.starts_with('\'') => {
                    (first[..idx].to_string(), first[idx + 1..].to_string())
                }
                _ => (String::new(), first),
            };
            id.location_type = loc_type;
            id.set_location_full(&loc, no_sub);
        }
        if let Some(source) = iter.next() {
            id.set_source_full(&source, no_sub);
        }
        if let Some(data_type) = iter.next() {
            id.set_data_type_full(&data_type, no_sub);
        }
        let mut interval_seg = iter.next().unwrap_or_default();
        let mut scenario_seg = iter.next().unwrap_or_default();

        // Sequence id extraction happens after all other splitting, by
        // locating bracket pairs on the interval and scenario segments.
        if let Some(seq) = Self::take_bracketed(&mut scenario_seg) {
            id.sequence_id = seq;
        }
        if let Some(seq) = Self::take_bracketed(&mut interval_seg) {
            id.sequence_id = seq;
        }
        id.scenario = scenario_seg;
        id.set_interval(&interval_seg)?;
        Ok(id)
    }

    /// Split on `.`; when a single quote is present a quote-aware
    /// tokenizer treats `'...'` as one opaque segment (quotes preserved)
    /// even if it contains `.`.
    fn split_segments(text: &str) -> Result<Vec<String>> {
        if !text.contains('\'') {
            return Ok(text.split('.').map(str::to_string).collect());
        }
        let mut segments = Vec::new();
        let mut current = String::new();
        let mut in_quote = false;
        for c in text.chars() {
            match c {
                '\'' => {
                    in_quote = !in_quote;
                    current.push(c);
                }
                '.' if !in_quote => {
                    segments.push(std::mem::take(&mut current));
                }
                _ => current.push(c),
            }
        }
        if in_quote {
            return Err(HtsError::IdentParse(format!(
                "unterminated quote in \"{}\"",
                text
            )));
        }
        segments.push(current);
        Ok(segments)
    }

    /// Remove a trailing `[...]` pair from the segment and return its
    /// contents.
    fn take_bracketed(segment: &mut String) -> Option<String> {
        let open = segment.find('[')?;
        let close = segment.rfind(']')?;
        if close < open {
            return None;
        }
        let seq = segment[open + 1..close].to_string();
        segment.truncate(open);
        Some(seq)
    }

    // --- compound segment handling ---

    /// Set location from a full segment, splitting main/sub on the first `-`.
    pub fn set_location_full(&mut self, text: &str, no_sub: bool) {
        let (main, sub) = Self::split_compound(text, no_sub);
        self.location = main;
        self.location_sub = sub;
    }

    pub fn set_source_full(&mut self, text: &str, no_sub: bool) {
        let (main, sub) = Self::split_compound(text, no_sub);
        self.source = main;
        self.source_sub = sub;
    }

    pub fn set_data_type_full(&mut self, text: &str, no_sub: bool) {
        let (main, sub) = Self::split_compound(text, no_sub);
        self.data_type = main;
        self.data_type_sub = sub;
    }

    fn split_compound(text: &str, no_sub: bool) -> (String, String) {
        if no_sub || text.starts_with('\'') {
            return (text.to_string(), String::new());
        }
        match text.split_once('-') {
            Some((main, sub)) => (main.to_string(), sub.to_string()),
            None => (text.to_string(), String::new()),
        }
    }

    fn join_compound(main: &str, sub: &str) -> String {
        if sub.is_empty() {
            main.to_string()
        } else {
            format!("{}-{}", main, sub)
        }
    }

    // --- accessors ---

    pub fn location_type(&self) -> &str {
        &self.location_type
    }

    /// Full location: main part plus `-`-joined sub part.
    pub fn location(&self) -> String {
        Self::join_compound(&self.location, &self.location_sub)
    }

    pub fn location_main(&self) -> &str {
        &self.location
    }

    pub fn location_sub(&self) -> &str {
        &self.location_sub
    }

    pub fn source(&self) -> String {
        Self::join_compound(&self.source, &self.source_sub)
    }

    pub fn data_type(&self) -> String {
        Self::join_compound(&self.data_type, &self.data_type_sub)
    }

    pub fn interval_text(&self) -> &str {
        &self.interval_text
    }

    /// The parsed interval, when the interval segment is non-empty.
    pub fn interval(&self) -> Option<Interval> {
        self.interval
    }

    pub fn scenario(&self) -> &str {
        &self.scenario
    }

    pub fn sequence_id(&self) -> &str {
        &self.sequence_id
    }

    pub fn input_type(&self) -> &str {
        &self.input_type
    }

    pub fn input_name(&self) -> &str {
        &self.input_name
    }

    // --- setters ---

    pub fn set_location_type(&mut self, text: &str) {
        self.location_type = text.to_string();
    }

    /// Set the interval segment, keeping the parsed form in sync.
    pub fn set_interval(&mut self, text: &str) -> Result<()> {
        let trimmed = text.trim();
        self.interval = if trimmed.is_empty() {
            None
        } else {
            Some(Interval::parse(trimmed)?)
        };
        self.interval_text = trimmed.to_string();
        Ok(())
    }

    pub fn set_scenario(&mut self, text: &str) {
        self.scenario = text.to_string();
    }

    pub fn set_sequence_id(&mut self, text: &str) {
        self.sequence_id = text.to_string();
    }

    pub fn set_input_type(&mut self, text: &str) {
        self.input_type = text.to_string();
    }

    pub fn set_input_name(&mut self, text: &str) {
        self.input_name = text.to_string();
    }

    /// Deterministic reconstruction of the full identifier from parts.
    pub fn to_full_string(&self) -> String {
        let mut out = String::new();
        if !self.location_type.is_empty() {
            out.push_str(&self.location_type);
            out.push(':');
        }
        let segments = [
            self.location(),
            self.source(),
            self.data_type(),
            self.interval_text.clone(),
            self.scenario.clone(),
        ];
        // join with '.', omitting empty trailing segments
        let mut last = segments.len();
        while last > 1 && segments[last - 1].is_empty() {
            last -= 1;
        }
        out.push_str(&segments[..last].join("."));
        if !self.sequence_id.is_empty() {
            out.push('[');
            out.push_str(&self.sequence_id);
            out.push(']');
        }
        if !self.input_type.is_empty() {
            out.push('~');
            out.push_str(&self.input_type);
            if !self.input_name.is_empty() {
                out.push('~');
                out.push_str(&self.input_name);
            }
        }
        out
    }

    /// Loose equality used to match a requested identifier against one
    /// found in a file: case-insensitive on the five main parts.
    pub fn matches(&self, other: &SeriesId) -> bool {
        self.location().eq_ignore_ascii_case(&other.location())
            && self.source().eq_ignore_ascii_case(&other.source())
            && self.data_type().eq_ignore_ascii_case(&other.data_type())
            && self
                .interval_text
                .eq_ignore_ascii_case(&other.interval_text)
            && self.scenario.eq_ignore_ascii_case(&other.scenario)
    }
}

impl fmt::Display for SeriesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_full_string())
    }
}

impl FromStr for SeriesId {
    type Err = HtsError;

    fn from_str(s: &str) -> Result<Self> {
        SeriesId::parse(s)
    }
}
