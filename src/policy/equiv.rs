//! Equivalence classes (§4.H): jobs that will have identical placement
//! outcomes cluster together so a class-wide `can_not_run` skips the
//! remainder without retrying placement.

use dashmap::DashMap;

use crate::model::resource_resv::ResResvId;

/// The attributes that must match for two jobs to share a placement
/// outcome: effective select/place, queue, user/group/project, and the
/// configured ATTR_l resource subset rendered as `name=value` pairs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EquivKey {
    pub select: String,
    pub place: String,
    pub queue: String,
    pub user: String,
    pub group: String,
    pub project: Option<String>,
    pub resources: Vec<(String, String)>,
}

/// Classes are built by scanning the job list in parallel (one equivalence
/// key computed per job, independent of every other job), so the backing
/// map takes concurrent inserts without an outer lock.
#[derive(Default)]
pub struct EquivClasses {
    classes: DashMap<EquivKey, Vec<ResResvId>>,
}

impl EquivClasses {
    pub fn new() -> EquivClasses {
        EquivClasses { classes: DashMap::new() }
    }

    pub fn insert(&self, key: EquivKey, resresv: ResResvId) {
        self.classes.entry(key).or_default().push(resresv);
    }

    pub fn members(&self, key: &EquivKey) -> Vec<ResResvId> {
        self.classes.get(key).map(|entry| entry.value().clone()).unwrap_or_default()
    }

    pub fn class_of(&self, resresv: ResResvId) -> Option<EquivKey> {
        self.classes.iter().find(|entry| entry.value().contains(&resresv)).map(|entry| entry.key().clone())
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }
}

impl std::fmt::Debug for EquivClasses {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EquivClasses").field("classes", &self.classes.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> EquivKey {
        EquivKey {
            select: "1:ncpus=4".into(),
            place: "free".into(),
            queue: "workq".into(),
            user: "alice".into(),
            group: "staff".into(),
            project: None,
            resources: vec![],
        }
    }

    #[test]
    fn jobs_with_identical_attrs_share_a_class() {
        let classes = EquivClasses::new();
        classes.insert(key(), ResResvId(1));
        classes.insert(key(), ResResvId(2));
        assert_eq!(classes.len(), 1);
        assert_eq!(classes.members(&key()), vec![ResResvId(1), ResResvId(2)]);
    }

    #[test]
    fn class_of_finds_the_owning_key() {
        let classes = EquivClasses::new();
        classes.insert(key(), ResResvId(7));
        assert_eq!(classes.class_of(ResResvId(7)), Some(key()));
        assert_eq!(classes.class_of(ResResvId(99)), None);
    }
}
