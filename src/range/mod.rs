//! Array-subjob index ranges (§4.L).
//!
//! A `Range` is an ordered union of arithmetic progressions
//! `start..=end` stepped by `step`, each carrying its own cached `count`.
//! Grounded on `original_source/src/lib/Libutil/range.c` and
//! `src/scheduler/range.c`: parsing canonicalizes (adjacent runs merge) and
//! printing drops any `end` that the step progression never actually visits
//! (§8 scenario 6: `"1-10:2,…"` prints back as `"1-9:2,…"`).

use std::fmt;

use thiserror::Error;

/// One arithmetic progression `start, start+step, ..., <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    pub start: i64,
    pub end: i64,
    pub step: i64,
    pub count: i64,
}

impl Run {
    fn new(start: i64, end: i64, step: i64) -> Run {
        let count = (end - start) / step + 1;
        Run { start, end, step, count }
    }

    /// The last value the progression actually lands on (`end` rounded
    /// down to the nearest reachable step), used so printing canonicalizes.
    fn last_value(&self) -> i64 {
        self.start + (self.count - 1) * self.step
    }

    fn contains(&self, v: i64) -> bool {
        v >= self.start && v <= self.end && (v - self.start) % self.step == 0
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RangeError {
    #[error("empty range piece")]
    Empty,
    #[error("end {end} is not greater than start {start}")]
    EndNotGreater { start: i64, end: i64 },
    #[error("step {0} must be >= 1")]
    BadStep(i64),
    #[error("could not parse integer: {0}")]
    NotANumber(String),
}

/// Ordered union of disjoint (after canonicalization, possibly touching)
/// runs. Runs are kept sorted by `start`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Range {
    runs: Vec<Run>,
}

impl Range {
    pub fn new() -> Range {
        Range { runs: Vec::new() }
    }

    /// Parse `START[-END[:STEP]][,…]`. A bare `N` is a one-element run
    /// `N-N:1`.
    pub fn parse(s: &str) -> Result<Range, RangeError> {
        let mut r = Range::new();
        for piece in s.split(',') {
            let piece = piece.trim();
            if piece.is_empty() {
                return Err(RangeError::Empty);
            }
            let (bounds, step) = match piece.split_once(':') {
                Some((b, st)) => (b, parse_i64(st)?),
                None => (piece, 1),
            };
            if step < 1 {
                return Err(RangeError::BadStep(step));
            }
            let (start, end) = match bounds.split_once('-') {
                Some((a, b)) => (parse_i64(a)?, parse_i64(b)?),
                None => {
                    let v = parse_i64(bounds)?;
                    (v, v)
                }
            };
            if end < start {
                return Err(RangeError::EndNotGreater { start, end });
            }
            r.add_run(Run::new(start, end, step));
        }
        Ok(r)
    }

    /// Does the range contain `v`?
    pub fn contains(&self, v: i64) -> bool {
        self.runs.iter().any(|r| r.contains(v))
    }

    /// Smallest value in the range strictly greater than `v`, if any.
    pub fn next_value(&self, v: i64) -> Option<i64> {
        let mut best: Option<i64> = None;
        for r in &self.runs {
            if r.last_value() <= v {
                continue;
            }
            let candidate = if v < r.start {
                r.start
            } else {
                let steps_past = (v - r.start) / r.step + 1;
                r.start + steps_past * r.step
            };
            if candidate <= r.last_value() && best.map_or(true, |b| candidate < b) {
                best = Some(candidate);
            }
        }
        best
    }

    /// Insert a single value, merging into an adjacent run when possible.
    pub fn add_value(&mut self, v: i64) {
        if self.contains(v) {
            return;
        }
        self.add_run(Run::new(v, v, 1));
    }

    /// Remove a single value, splitting a run if `v` is interior.
    pub fn remove_value(&mut self, v: i64) {
        let mut out = Vec::with_capacity(self.runs.len() + 1);
        for r in self.runs.drain(..) {
            if !r.contains(v) {
                out.push(r);
                continue;
            }
            // Split [r.start, v) and (v, r.last_value()] around v.
            if r.start < v {
                let before_count = (v - r.start) / r.step;
                if before_count > 0 {
                    out.push(Run::new(r.start, r.start + (before_count - 1) * r.step, r.step));
                }
            }
            let last = r.last_value();
            if v < last {
                out.push(Run::new(v + r.step, last, r.step));
            }
        }
        self.runs = out;
        self.runs.sort_by_key(|r| r.start);
        self.merge_adjacent();
    }

    /// Pointwise intersection; commutative by construction.
    pub fn intersection(&self, other: &Range) -> Range {
        let mut out = Range::new();
        for v in self.iter() {
            if other.contains(v) {
                out.add_value(v);
            }
        }
        out
    }

    /// Iterate every value in ascending order (small ranges only — this is
    /// O(n) in the number of values, used for tests and intersection).
    pub fn iter(&self) -> impl Iterator<Item = i64> + '_ {
        self.runs.iter().flat_map(|r| {
            let count = r.count;
            (0..count).map(move |i| r.start + i * r.step)
        })
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Merge `run` into the sorted run list, coalescing with a neighbor
    /// when `run` is adjacent and shares the same step.
    fn add_run(&mut self, run: Run) {
        let idx = self.runs.partition_point(|r| r.start < run.start);
        self.runs.insert(idx, run);
        self.runs.sort_by_key(|r| r.start);
        self.merge_adjacent();
    }

    fn merge_adjacent(&mut self) {
        if self.runs.is_empty() {
            return;
        }
        let mut merged: Vec<Run> = Vec::with_capacity(self.runs.len());
        for r in self.runs.drain(..) {
            if let Some(prev) = merged.last_mut() {
                if prev.step == r.step && prev.last_value() + prev.step == r.start {
                    *prev = Run::new(prev.start, r.end, prev.step);
                    continue;
                }
                if prev.step == 1 && r.step == 1 && prev.last_value() + 1 >= r.start {
                    let new_end = prev.last_value().max(r.last_value());
                    *prev = Run::new(prev.start, new_end, 1);
                    continue;
                }
            }
            merged.push(r);
        }
        self.runs = merged;
    }
}

impl fmt::Display for Range {
    /// Canonical print: each run as `start` (count==1), `start-end`
    /// (step==1), or `start-end:step` — `end` rewritten to the last value
    /// the progression actually visits.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pieces: Vec<String> = self
            .runs
            .iter()
            .map(|r| {
                let last = r.last_value();
                if r.count == 1 {
                    r.start.to_string()
                } else if r.step == 1 {
                    format!("{}-{}", r.start, last)
                } else {
                    format!("{}-{}:{}", r.start, last, r.step)
                }
            })
            .collect();
        write!(f, "{}", pieces.join(","))
    }
}

fn parse_i64(s: &str) -> Result<i64, RangeError> {
    s.trim()
        .parse::<i64>()
        .map_err(|_| RangeError::NotANumber(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_canonicalize() {
        let r = Range::parse("1-10:2,20,30-35").unwrap();
        assert!(r.contains(3));
        assert!(!r.contains(4));
        assert!(r.contains(20));
        assert_eq!(r.to_string(), "1-9:2,20,30-35");
    }

    #[test]
    fn round_trip_parse_to_str() {
        let r = Range::parse("1-9:2,20,30-35").unwrap();
        let printed = r.to_string();
        let reparsed = Range::parse(&printed).unwrap();
        assert_eq!(r, reparsed);
    }

    #[test]
    fn add_remove_inverse_when_absent() {
        let mut r = Range::parse("1-5,10-20:2").unwrap();
        let before = r.clone();
        assert!(!r.contains(7));
        r.add_value(7);
        r.remove_value(7);
        assert_eq!(r, before);
    }

    #[test]
    fn remove_splits_interior_value() {
        let mut r = Range::parse("1-5").unwrap();
        r.remove_value(3);
        assert!(r.contains(1) && r.contains(2) && !r.contains(3) && r.contains(4) && r.contains(5));
    }

    #[test]
    fn intersection_is_commutative() {
        let a = Range::parse("1-20:2").unwrap();
        let b = Range::parse("5-15").unwrap();
        let ab = a.intersection(&b);
        let ba = b.intersection(&a);
        assert_eq!(ab, ba);
    }

    #[test]
    fn zero_width_rejected_end_before_start() {
        assert!(Range::parse("10-5").is_err());
    }

    #[test]
    fn step_must_be_positive() {
        assert!(Range::parse("1-10:0").is_err());
    }
}
