//! Select-spec parsing (`selspec`), §4.E: `"2:ncpus=4:mem=8gb"` is two
//! chunks, each needing 4 cpus and 8gb; `"ncpus=2+ncpus=1"` is two chunks
//! of different shape joined with `+`.

use thiserror::Error;

use crate::resource::req::ResourceReqList;
use crate::resource::value::{ResourceValue, TriBool};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectError {
    #[error("empty select spec")]
    Empty,
    #[error("malformed chunk: {0}")]
    MalformedChunk(String),
    #[error("malformed resource term: {0}")]
    MalformedTerm(String),
}

#[derive(Debug, Clone)]
pub struct Chunk {
    /// How many repetitions of this chunk are requested (the leading
    /// `N:` multiplier, default 1).
    pub count: u32,
    /// This chunk definition's position among the `+`-separated parts
    /// of the select spec, assigned in parse order (§3).
    pub seq: u32,
    pub resources: ResourceReqList,
}

#[derive(Debug, Clone)]
pub struct SelectSpec {
    pub chunks: Vec<Chunk>,
}

impl SelectSpec {
    pub fn parse(s: &str) -> Result<SelectSpec, SelectError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(SelectError::Empty);
        }
        let mut chunks = Vec::new();
        for (i, part) in s.split('+').enumerate() {
            let mut chunk = parse_chunk(part)?;
            chunk.seq = i as u32;
            chunks.push(chunk);
        }
        Ok(SelectSpec { chunks })
    }

    /// Total count across every chunk, useful for a quick feasibility
    /// check before the full placement walk (§4.E step 3).
    pub fn total_chunks(&self) -> u32 {
        self.chunks.iter().map(|c| c.count).sum()
    }
}

fn parse_chunk(part: &str) -> Result<Chunk, SelectError> {
    let terms: Vec<&str> = part.split(':').collect();
    if terms.is_empty() || terms[0].is_empty() {
        return Err(SelectError::MalformedChunk(part.to_string()));
    }

    let (count, rest) = match terms[0].parse::<u32>() {
        Ok(n) => (n, &terms[1..]),
        Err(_) => (1, &terms[..]),
    };
    if rest.is_empty() {
        return Err(SelectError::MalformedChunk(part.to_string()));
    }

    let mut resources = ResourceReqList::new();
    for term in rest {
        let (name, value) = term
            .split_once('=')
            .ok_or_else(|| SelectError::MalformedTerm(term.to_string()))?;
        resources.set(name, parse_term_value(value));
    }
    Ok(Chunk { count, seq: 0, resources })
}

fn parse_term_value(value: &str) -> ResourceValue {
    if let Ok(n) = value.parse::<i64>() {
        return ResourceValue::Long(n);
    }
    if let Ok(f) = value.parse::<f64>() {
        return ResourceValue::Float(f);
    }
    match value {
        "true" | "True" => return ResourceValue::Bool(TriBool::True),
        "false" | "False" => return ResourceValue::Bool(TriBool::False),
        _ => {}
    }
    if let Some(kb) = ResourceValue::parse_size_kb(value) {
        return ResourceValue::Size(kb);
    }
    ResourceValue::Str(value.to_string())
}
