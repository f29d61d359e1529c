//! Multi-key stable sort (§4.H): the sorted job list is the cycle's
//! outer loop, so key order and stability both matter.

use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// One comparison key, e.g. formula value, fair-share usage factor,
/// eligible time, or queue priority. `key` returns `f64::NAN`-free
/// values; ties fall through to the next key in the vector.
pub struct SortKey<T> {
    pub direction: SortDirection,
    pub key: Box<dyn Fn(&T) -> f64>,
}

impl<T> SortKey<T> {
    pub fn new(direction: SortDirection, key: impl Fn(&T) -> f64 + 'static) -> SortKey<T> {
        SortKey { direction, key }
    }
}

/// Stably sorts `items` by the key vector in order, each key breaking
/// ties left by the previous one.
pub fn multi_key_sort<T>(items: &mut [T], keys: &[SortKey<T>]) {
    items.sort_by(|a, b| {
        for k in keys {
            let (va, vb) = ((k.key)(a), (k.key)(b));
            let ord = va.partial_cmp(&vb).unwrap_or(Ordering::Equal);
            let ord = match k.direction {
                SortDirection::Ascending => ord,
                SortDirection::Descending => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorts_by_primary_then_falls_back_to_secondary() {
        let mut items = vec![(1, 5), (1, 2), (0, 9)];
        let keys: Vec<SortKey<(i32, i32)>> = vec![
            SortKey::new(SortDirection::Descending, |x: &(i32, i32)| x.0 as f64),
            SortKey::new(SortDirection::Ascending, |x: &(i32, i32)| x.1 as f64),
        ];
        multi_key_sort(&mut items, &keys);
        assert_eq!(items, vec![(1, 2), (1, 5), (0, 9)]);
    }
}
