//! Place-spec parsing (`place`), §4.E: arrangement, sharing, and an
//! optional placement-set grouping key, e.g. `"scatter:excl"` or
//! `"pack:group=switch"`.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlaceError {
    #[error("unknown arrangement keyword: {0}")]
    UnknownArrangement(String),
    #[error("unknown sharing keyword: {0}")]
    UnknownSharing(String),
    #[error("malformed group term: {0}")]
    MalformedGroup(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arrangement {
    /// No per-chunk spread constraint beyond resource availability.
    Free,
    /// Pick the single set of nodes (ideally a single node) that can
    /// supply every chunk.
    Pack,
    /// Every chunk lands on a different host.
    Scatter,
    /// Every chunk lands on a different vnode.
    VScatter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sharing {
    /// Consume the matched vnode entirely.
    Excl,
    /// Mark every vnode on the matched host exclusive.
    ExclHost,
    /// Allow resource-coexistence within the non-consumable match.
    Shared,
}

#[derive(Debug, Clone)]
pub struct PlaceSpec {
    pub arrangement: Arrangement,
    pub sharing: Sharing,
    /// When set, candidates are restricted to placement sets keyed by
    /// this resource name instead of the server's default priority order
    /// (§4.E step 2).
    pub group: Option<String>,
}

impl Default for PlaceSpec {
    fn default() -> PlaceSpec {
        PlaceSpec { arrangement: Arrangement::Free, sharing: Sharing::Shared, group: None }
    }
}

impl PlaceSpec {
    pub fn parse(s: &str) -> Result<PlaceSpec, PlaceError> {
        let mut place = PlaceSpec::default();
        if s.trim().is_empty() {
            return Ok(place);
        }
        for term in s.split(':') {
            let term = term.trim();
            if term.is_empty() {
                continue;
            }
            match term {
                "free" => place.arrangement = Arrangement::Free,
                "pack" => place.arrangement = Arrangement::Pack,
                "scatter" => place.arrangement = Arrangement::Scatter,
                "vscatter" => place.arrangement = Arrangement::VScatter,
                "excl" => place.sharing = Sharing::Excl,
                "exclhost" => place.sharing = Sharing::ExclHost,
                "shared" => place.sharing = Sharing::Shared,
                _ if term.starts_with("group=") => {
                    let (_, key) = term.split_once('=').ok_or_else(|| PlaceError::MalformedGroup(term.to_string()))?;
                    if key.is_empty() {
                        return Err(PlaceError::MalformedGroup(term.to_string()));
                    }
                    place.group = Some(key.to_string());
                }
                other => {
                    return Err(if other.contains('=') {
                        PlaceError::MalformedGroup(other.to_string())
                    } else {
                        PlaceError::UnknownArrangement(other.to_string())
                    });
                }
            }
        }
        Ok(place)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_arrangement_and_sharing() {
        let p = PlaceSpec::parse("scatter:excl").unwrap();
        assert_eq!(p.arrangement, Arrangement::Scatter);
        assert_eq!(p.sharing, Sharing::Excl);
    }

    #[test]
    fn parses_group_key() {
        let p = PlaceSpec::parse("pack:group=switch").unwrap();
        assert_eq!(p.arrangement, Arrangement::Pack);
        assert_eq!(p.group.as_deref(), Some("switch"));
    }

    #[test]
    fn empty_spec_defaults_to_free_shared() {
        let p = PlaceSpec::parse("").unwrap();
        assert_eq!(p.arrangement, Arrangement::Free);
        assert_eq!(p.sharing, Sharing::Shared);
    }

    #[test]
    fn rejects_unknown_keyword() {
        assert!(PlaceSpec::parse("bogus").is_err());
    }
}
