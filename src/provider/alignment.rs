//! Alignment records and the sequence-search report parser.
//!
//! The sequence service reports hits in a line-oriented format: a `>>` header
//! opens one alignment against a target entry/chain, `; key: value` lines
//! carry its scores, and two `>` blocks carry the aligned query and target
//! sequence fragments with their overlap offsets. Fragments arrive split
//! across continuation lines and are accumulated on a partially built record;
//! a record is only exposed once every mandatory part has been seen.

use crate::error::{Result, XJoinError};

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// A fully parsed alignment between the query sequence and one target chain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Alignment {
    /// Target entry identifier, upper-case (e.g. "1ABC").
    pub entry: String,
    /// Target chain within the entry (e.g. "A").
    pub chain: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub e_value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bit_score: Option<f64>,
    pub percent_identity: f64,
    pub query_sequence: String,
    pub query_start: u32,
    pub query_end: u32,
    pub target_sequence: String,
    pub target_start: u32,
    pub target_end: u32,
}

impl Alignment {
    /// "entry_chain" form used by downstream identifiers, e.g. "1ABC_A".
    pub fn entry_chain(&self) -> String {
        format!("{}_{}", self.entry, self.chain)
    }
}

/// Accumulates one alignment during parsing. Sequence fragments and offsets
/// land here incrementally; `complete` refuses to expose a record that is
/// still missing mandatory parts.
#[derive(Debug, Default)]
struct AlignmentBuilder {
    entry: String,
    chain: String,
    description: Option<String>,
    e_value: Option<f64>,
    bit_score: Option<f64>,
    percent_identity: Option<f64>,
    query: FragmentBuilder,
    target: FragmentBuilder,
}

#[derive(Debug, Default)]
struct FragmentBuilder {
    sequence: String,
    start: Option<u32>,
    end: Option<u32>,
}

impl FragmentBuilder {
    fn complete(self, side: &str, context: &str) -> Result<(String, u32, u32)> {
        let start = self
            .start
            .ok_or_else(|| parse_error(context, &format!("{} overlap start not set", side)))?;
        let end = self
            .end
            .ok_or_else(|| parse_error(context, &format!("{} overlap end not set", side)))?;
        if self.sequence.is_empty() {
            return Err(parse_error(context, &format!("{} sequence missing", side)));
        }
        Ok((self.sequence, start, end))
    }
}

impl AlignmentBuilder {
    fn new(entry: String, chain: String, description: Option<String>) -> Self {
        Self {
            entry,
            chain,
            description,
            ..Self::default()
        }
    }

    fn complete(self) -> Result<Alignment> {
        let context = format!("{}_{}", self.entry, self.chain);
        let e_value = self
            .e_value
            .ok_or_else(|| parse_error(&context, "expectation value not set"))?;
        let percent_identity = self
            .percent_identity
            .ok_or_else(|| parse_error(&context, "identity not set"))?;
        let (query_sequence, query_start, query_end) = self.query.complete("query", &context)?;
        let (target_sequence, target_start, target_end) =
            self.target.complete("target", &context)?;

        Ok(Alignment {
            entry: self.entry,
            chain: self.chain,
            description: self.description,
            e_value,
            bit_score: self.bit_score,
            percent_identity,
            query_sequence,
            query_start,
            query_end,
            target_sequence,
            target_start,
            target_end,
        })
    }
}

fn parse_error(context: &str, message: &str) -> XJoinError {
    XJoinError::ResultParse(format!("alignment {}: {}", context, message))
}

fn hit_header_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^>>(?:PDB:)?([0-9A-Za-z]{4})_(\S+)\s*(.*)$").unwrap())
}

fn property_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^;\s*(\S+?):\s*(\S*)").unwrap())
}

/// Which `>` block of the current hit is being read.
#[derive(PartialEq)]
enum Block {
    None,
    Query,
    Target,
}

/// Parses a full report into alignments, in report order.
///
/// Unrecognized property keys are ignored (the service emits more scores than
/// this join consumes); a structurally incomplete hit is an error, never a
/// silently dropped record.
pub fn parse_alignment_report(report: &str) -> Result<Vec<Alignment>> {
    let mut alignments = Vec::new();
    let mut current: Option<AlignmentBuilder> = None;
    let mut block = Block::None;

    for line in report.lines() {
        if let Some(header) = hit_header_regex().captures(line) {
            if let Some(builder) = current.take() {
                alignments.push(builder.complete()?);
            }
            let description = header.get(3).map(|m| m.as_str().trim()).filter(|d| !d.is_empty());
            current = Some(AlignmentBuilder::new(
                header[1].to_uppercase(),
                header[2].to_string(),
                description.map(str::to_string),
            ));
            block = Block::None;
            continue;
        }

        let Some(builder) = current.as_mut() else {
            // Preamble before the first hit (program banner, query summary).
            continue;
        };

        if let Some(property) = property_regex().captures(line) {
            let key = &property[1];
            let value = &property[2];
            match key {
                "fa_expect" => builder.e_value = parse_number(value, key)?,
                "fa_bits" => builder.bit_score = parse_number(value, key)?,
                "sw_ident" => {
                    builder.percent_identity = parse_number(value, key)?.map(|f: f64| f * 100.0)
                }
                "al_start" => {
                    let fragment = match block {
                        Block::Query => &mut builder.query,
                        Block::Target => &mut builder.target,
                        Block::None => continue,
                    };
                    fragment.start = parse_number(value, key)?;
                }
                "al_stop" => {
                    let fragment = match block {
                        Block::Query => &mut builder.query,
                        Block::Target => &mut builder.target,
                        Block::None => continue,
                    };
                    fragment.end = parse_number(value, key)?;
                }
                _ => {}
            }
        } else if let Some(rest) = line.strip_prefix('>') {
            // First '>' block of a hit is the query, the second the target.
            block = match block {
                Block::None => Block::Query,
                _ => Block::Target,
            };
            tracing::trace!("Entering {} block: {}", block_name(&block), rest.trim());
        } else if block != Block::None && !line.trim().is_empty() {
            let fragment = match block {
                Block::Query => &mut builder.query,
                Block::Target => &mut builder.target,
                Block::None => unreachable!(),
            };
            fragment.sequence.push_str(line.trim());
        }
    }

    if let Some(builder) = current.take() {
        alignments.push(builder.complete()?);
    }

    Ok(alignments)
}

fn block_name(block: &Block) -> &'static str {
    match block {
        Block::None => "none",
        Block::Query => "query",
        Block::Target => "target",
    }
}

fn parse_number<T: std::str::FromStr>(value: &str, key: &str) -> Result<Option<T>> {
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse::<T>()
        .map(Some)
        .map_err(|_| XJoinError::ResultParse(format!("non-numeric value for {}: {}", key, value)))
}
