use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::RwLock;

use thiserror::Error;

use crate::family::Trio;
use crate::variant::{FileId, SampleId};

/// Family index status of one sample for one index version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IndexStatus {
    /// Never indexed.
    #[default]
    None,
    /// Scheduled but not completed. Runs only report their queued children
    /// and never persist this state.
    Queued,
    /// Indexed by a completed full run.
    Ready,
}

/// What the store knows about a sample.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SampleMetadata {
    /// Sample id.
    pub id: SampleId,
    /// Sample name.
    pub name: String,
    /// Father link.
    pub father: Option<SampleId>,
    /// Mother link.
    pub mother: Option<SampleId>,
    /// Files the sample was loaded from.
    pub files: BTreeSet<FileId>,
    /// Family index status per index version.
    pub family_index: BTreeMap<u32, IndexStatus>,
    /// Mendelian error index status.
    pub mendelian_error: IndexStatus,
}

impl SampleMetadata {
    /// Metadata for a new sample.
    pub fn new(id: SampleId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ..Self::default()
        }
    }

    /// Record the files the sample was loaded from.
    pub fn with_files<I: IntoIterator<Item = FileId>>(mut self, files: I) -> Self {
        self.files = files.into_iter().collect();
        self
    }

    /// Set both parent links.
    pub fn with_parents(mut self, father: Option<SampleId>, mother: Option<SampleId>) -> Self {
        self.father = father;
        self.mother = mother;
        self
    }

    /// Family index status for `version`.
    pub fn family_index_status(&self, version: u32) -> IndexStatus {
        self.family_index.get(&version).copied().unwrap_or_default()
    }
}

/// Members of a registered cohort.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Cohort {
    /// Children whose parents come from their metadata links.
    Children(Vec<SampleId>),
    /// Trios with explicit parents.
    Trios(Vec<Trio>),
}

impl Cohort {
    /// Child of every member.
    pub fn children(&self) -> Vec<SampleId> {
        match self {
            Cohort::Children(children) => children.clone(),
            Cohort::Trios(trios) => trios.iter().map(|trio| trio.child).collect(),
        }
    }

    /// Resolve members to trios, reading parents of bare children from `store`.
    pub fn into_trios(self, store: &dyn MetadataStore) -> Result<Vec<Trio>, MetadataError> {
        match self {
            Cohort::Children(children) => children
                .into_iter()
                .map(|child| -> Result<Trio, MetadataError> {
                    let sample = store.sample(child)?;
                    Ok(Trio::partial(sample.father, sample.mother, child))
                })
                .collect(),
            Cohort::Trios(trios) => Ok(trios),
        }
    }
}

/// Errors reported by a metadata store.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MetadataError {
    /// No sample with this id.
    #[error("sample {0} not found")]
    SampleNotFound(SampleId),
    /// The store cannot be read or written.
    #[error("metadata store unavailable: {0}")]
    Unavailable(String),
}

/// Persistent sample/cohort metadata shared by every run.
///
/// Only the orchestrator writes, and only outside of worker execution.
pub trait MetadataStore: Send + Sync {
    /// Look up a sample id by name.
    fn sample_id(&self, name: &str) -> Result<Option<SampleId>, MetadataError>;

    /// Fetch sample metadata.
    fn sample(&self, id: SampleId) -> Result<SampleMetadata, MetadataError>;

    /// Apply `update` to a sample and store the result.
    fn update_sample(
        &self,
        id: SampleId,
        update: &mut dyn FnMut(&mut SampleMetadata),
    ) -> Result<(), MetadataError>;

    /// Apply `update` to every sample in `ids` as one change: when any sample
    /// is missing, none is modified.
    fn update_samples(
        &self,
        ids: &[SampleId],
        update: &mut dyn FnMut(&mut SampleMetadata),
    ) -> Result<(), MetadataError>;

    /// Members of a cohort, or `None` when it does not exist.
    fn cohort(&self, name: &str) -> Result<Option<Cohort>, MetadataError>;

    /// Create or replace a cohort.
    fn register_cohort(&self, name: &str, cohort: Cohort) -> Result<(), MetadataError>;

    /// Delete a cohort. Deleting a missing cohort is not an error.
    fn remove_cohort(&self, name: &str) -> Result<(), MetadataError>;
}

#[derive(Debug, Default)]
struct StoreState {
    samples: BTreeMap<SampleId, SampleMetadata>,
    names: HashMap<String, SampleId>,
    cohorts: BTreeMap<String, Cohort>,
}

/// [`MetadataStore`] kept in memory.
#[derive(Debug, Default)]
pub struct InMemoryMetadataStore {
    state: RwLock<StoreState>,
}

impl InMemoryMetadataStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a sample.
    pub fn insert_sample(&self, sample: SampleMetadata) -> Result<(), MetadataError> {
        let mut state = self.write()?;
        state.names.insert(sample.name.clone(), sample.id);
        state.samples.insert(sample.id, sample);
        Ok(())
    }

    /// Names of every registered cohort.
    pub fn cohort_names(&self) -> Result<Vec<String>, MetadataError> {
        Ok(self.read()?.cohorts.keys().cloned().collect())
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, StoreState>, MetadataError> {
        self.state
            .read()
            .map_err(|_| MetadataError::Unavailable("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, StoreState>, MetadataError> {
        self.state
            .write()
            .map_err(|_| MetadataError::Unavailable("lock poisoned".to_string()))
    }
}

impl MetadataStore for InMemoryMetadataStore {
    fn sample_id(&self, name: &str) -> Result<Option<SampleId>, MetadataError> {
        Ok(self.read()?.names.get(name).copied())
    }

    fn sample(&self, id: SampleId) -> Result<SampleMetadata, MetadataError> {
        self.read()?
            .samples
            .get(&id)
            .cloned()
            .ok_or(MetadataError::SampleNotFound(id))
    }

    fn update_sample(
        &self,
        id: SampleId,
        update: &mut dyn FnMut(&mut SampleMetadata),
    ) -> Result<(), MetadataError> {
        let mut state = self.write()?;
        let sample = state
            .samples
            .get_mut(&id)
            .ok_or(MetadataError::SampleNotFound(id))?;
        update(sample);
        Ok(())
    }

    fn update_samples(
        &self,
        ids: &[SampleId],
        update: &mut dyn FnMut(&mut SampleMetadata),
    ) -> Result<(), MetadataError> {
        let mut state = self.write()?;
        if let Some(missing) = ids.iter().find(|id| !state.samples.contains_key(id)) {
            return Err(MetadataError::SampleNotFound(*missing));
        }
        for id in ids {
            if let Some(sample) = state.samples.get_mut(id) {
                update(sample);
            }
        }
        Ok(())
    }

    fn cohort(&self, name: &str) -> Result<Option<Cohort>, MetadataError> {
        Ok(self.read()?.cohorts.get(name).cloned())
    }

    fn register_cohort(&self, name: &str, cohort: Cohort) -> Result<(), MetadataError> {
        self.write()?.cohorts.insert(name.to_string(), cohort);
        Ok(())
    }

    fn remove_cohort(&self, name: &str) -> Result<(), MetadataError> {
        self.write()?.cohorts.remove(name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn updates_are_visible() {
        let store = InMemoryMetadataStore::new();
        store
            .insert_sample(SampleMetadata::new(SampleId(1), "kid"))
            .expect("insert");
        assert_eq!(store.sample_id("kid"), Ok(Some(SampleId(1))));

        store
            .update_sample(SampleId(1), &mut |sample| {
                sample.family_index.insert(2, IndexStatus::Ready);
            })
            .expect("update");
        let sample = store.sample(SampleId(1)).expect("sample");
        assert_eq!(sample.family_index_status(2), IndexStatus::Ready);
        assert_eq!(sample.family_index_status(1), IndexStatus::None);
        assert_eq!(
            store.sample(SampleId(9)),
            Err(MetadataError::SampleNotFound(SampleId(9)))
        );
    }

    #[test]
    fn batch_updates_are_all_or_nothing() {
        let store = InMemoryMetadataStore::new();
        for (id, name) in [(SampleId(1), "a"), (SampleId(2), "b")] {
            store.insert_sample(SampleMetadata::new(id, name)).expect("insert");
        }
        let mut mark_ready = |sample: &mut SampleMetadata| {
            sample.family_index.insert(1, IndexStatus::Ready);
        };

        assert_eq!(
            store.update_samples(&[SampleId(1), SampleId(7)], &mut mark_ready),
            Err(MetadataError::SampleNotFound(SampleId(7)))
        );
        let first = store.sample(SampleId(1)).expect("sample");
        assert_eq!(first.family_index_status(1), IndexStatus::None);

        store
            .update_samples(&[SampleId(1), SampleId(2)], &mut mark_ready)
            .expect("update");
        let second = store.sample(SampleId(2)).expect("sample");
        assert_eq!(second.family_index_status(1), IndexStatus::Ready);
    }

    #[test]
    fn cohorts_can_be_removed() {
        let store = InMemoryMetadataStore::new();
        let trios = Cohort::Trios(vec![Trio::partial(None, Some(SampleId(2)), SampleId(1))]);
        store.register_cohort("c", trios.clone()).expect("register");
        assert_eq!(store.cohort("c"), Ok(Some(trios)));
        assert_eq!(
            store.cohort("c").expect("cohort").map(|c| c.children()),
            Some(vec![SampleId(1)])
        );
        store.remove_cohort("c").expect("remove");
        store.remove_cohort("c").expect("remove twice");
        assert_eq!(store.cohort("c"), Ok(None));
    }
}
