use std::collections::{BTreeSet, HashMap};

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use super::executor::{BatchExecutor, BatchJob, ExecutorError, TrioBatch};
use super::metadata::{Cohort, IndexStatus, MetadataError, MetadataStore};
use crate::config::{ConfigError, IndexConfig};
use crate::family::{parse_trios, Trio};
use crate::variant::{Region, SampleId};

/// Prefix of the cohorts created to pass large trio lists to batches.
pub const TEMP_COHORT_PREFIX: &str = "__FAMILY_INDEX_TMP_";

/// How a run names its trios.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TrioSelection {
    /// `father,mother,child;...` with sample names.
    Spec(String),
    /// Registered cohort of children.
    Cohort(String),
}

/// Parameters of a family index run.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FamilyIndexParams {
    /// Trios to index.
    pub trios: TrioSelection,
    /// Optional `chrom[:start[-end]]` filter. Region runs never update status.
    pub region: Option<String>,
    /// Re-index children that are already READY.
    pub overwrite: bool,
    /// Index version.
    pub version: u32,
    /// Output location.
    pub output: Option<String>,
}

impl FamilyIndexParams {
    /// Run over trios given as text.
    pub fn from_trios(spec: impl Into<String>) -> Self {
        Self::new(TrioSelection::Spec(spec.into()))
    }

    /// Run over a registered cohort.
    pub fn from_cohort(name: impl Into<String>) -> Self {
        Self::new(TrioSelection::Cohort(name.into()))
    }

    fn new(trios: TrioSelection) -> Self {
        Self {
            trios,
            region: None,
            overwrite: false,
            version: 1,
            output: None,
        }
    }

    /// Restrict the run to a region.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Re-index READY children.
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Set the index version.
    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Set the output location.
    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = Some(output.into());
        self
    }
}

/// Errors that fail a run.
#[derive(Debug, Error)]
pub enum JobError {
    /// The job was rejected before any processing.
    #[error("invalid job: {0}")]
    Config(#[from] ConfigError),
    /// Metadata could not be read or written.
    #[error(transparent)]
    Metadata(#[from] MetadataError),
    /// One batch failed; statuses were left untouched.
    #[error("batch {batch} failed")]
    BatchFailed {
        /// Failing batch (1-indexed).
        batch: usize,
        /// Cause.
        #[source]
        source: ExecutorError,
    },
}

/// Summary of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunReport {
    /// Index version.
    pub version: u32,
    /// Children processed.
    pub queued: Vec<SampleId>,
    /// Children skipped because they were already READY.
    pub skipped: Vec<SampleId>,
    /// Batches submitted.
    pub batches: usize,
    /// Entries written.
    pub entries_written: usize,
    /// Entries with a Mendelian error.
    pub mendelian_errors: u64,
    /// Genotype combinations skipped as malformed.
    pub malformed_genotypes: u64,
    /// Child positions with discrepant calls.
    pub discrepancies: u64,
    /// Whether the children were marked READY.
    pub status_updated: bool,
    /// blake3 digest (hex) over every batch's entries.
    pub fingerprint: String,
}

#[derive(Debug, Default)]
struct BatchTotals {
    batches: usize,
    entries_written: usize,
    mendelian_errors: u64,
    malformed_genotypes: u64,
    discrepancies: u64,
}

/// Validates runs, splits them into batches and maintains per-sample status.
#[derive(Debug)]
pub struct BatchOrchestrator<M, E> {
    store: M,
    executor: E,
    config: IndexConfig,
}

impl<M: MetadataStore, E: BatchExecutor> BatchOrchestrator<M, E> {
    /// Orchestrator over `store`, submitting batches to `executor`.
    pub fn new(store: M, executor: E, config: IndexConfig) -> Self {
        Self {
            store,
            executor,
            config,
        }
    }

    /// The metadata store.
    pub fn store(&self) -> &M {
        &self.store
    }

    /// The batch executor.
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Resolve and validate the trios of a run.
    pub fn resolve(&self, selection: &TrioSelection) -> Result<Vec<Trio>, JobError> {
        let trios = match selection {
            TrioSelection::Spec(text) => self.resolve_spec(text)?,
            TrioSelection::Cohort(name) => self.resolve_cohort(name)?,
        };
        if trios.is_empty() {
            return Err(ConfigError::EmptyTrioList.into());
        }
        let mut children = BTreeSet::new();
        for trio in &trios {
            if !children.insert(trio.child) {
                let name = self.store.sample(trio.child)?.name;
                return Err(ConfigError::DuplicateChild { name }.into());
            }
        }
        Ok(trios)
    }

    /// Execute a run: validate, skip READY children, run every batch, then
    /// mark the children READY when the whole genome was processed.
    #[instrument(level = "info", skip_all, fields(version = params.version))]
    pub fn run(&self, params: &FamilyIndexParams) -> Result<RunReport, JobError> {
        self.config.validate()?;
        let output = params.output.clone().ok_or(ConfigError::MissingOutput)?;
        let region = params
            .region
            .as_deref()
            .map(str::parse::<Region>)
            .transpose()
            .map_err(ConfigError::from)?;
        let trios = self.resolve(&params.trios)?;

        let mut queued = Vec::new();
        let mut skipped = Vec::new();
        for trio in trios {
            let status = self.store.sample(trio.child)?.family_index_status(params.version);
            if status == IndexStatus::Ready && !params.overwrite {
                debug!(child = %trio.child, "family index already ready");
                skipped.push(trio.child);
            } else {
                queued.push(trio);
            }
        }
        info!(queued = queued.len(), skipped = skipped.len(), "planned family index run");

        let mut hasher = blake3::Hasher::new();
        let mut temp_cohorts = Vec::new();
        let outcome = self.run_batches(
            &queued,
            region.as_ref(),
            params.version,
            &output,
            &mut temp_cohorts,
            &mut hasher,
        );
        for name in &temp_cohorts {
            if let Err(err) = self.store.remove_cohort(name) {
                warn!(cohort = %name, error = %err, "failed to remove temporary cohort");
            }
        }
        let totals = outcome?;

        let status_updated = region.is_none() && !queued.is_empty();
        if status_updated {
            self.mark_ready(&queued, params.version)?;
        } else if region.is_some() {
            info!("region-limited run, statuses left unchanged");
        }

        Ok(RunReport {
            version: params.version,
            queued: queued.iter().map(|trio| trio.child).collect(),
            skipped,
            batches: totals.batches,
            entries_written: totals.entries_written,
            mendelian_errors: totals.mendelian_errors,
            malformed_genotypes: totals.malformed_genotypes,
            discrepancies: totals.discrepancies,
            status_updated,
            fingerprint: hasher.finalize().to_hex().to_string(),
        })
    }

    /// Mark every child READY and fill parent links that are still unset,
    /// as one store update.
    fn mark_ready(&self, queued: &[Trio], version: u32) -> Result<(), JobError> {
        let parents: HashMap<SampleId, (Option<SampleId>, Option<SampleId>)> = queued
            .iter()
            .map(|trio| (trio.child, (trio.father, trio.mother)))
            .collect();
        let children: Vec<SampleId> = queued.iter().map(|trio| trio.child).collect();
        self.store.update_samples(&children, &mut |sample| {
            sample.family_index.insert(version, IndexStatus::Ready);
            sample.mendelian_error = IndexStatus::Ready;
            if let Some(&(father, mother)) = parents.get(&sample.id) {
                if sample.father.is_none() {
                    sample.father = father;
                }
                if sample.mother.is_none() {
                    sample.mother = mother;
                }
            }
        })?;
        Ok(())
    }

    fn run_batches(
        &self,
        queued: &[Trio],
        region: Option<&Region>,
        version: u32,
        output: &str,
        temp_cohorts: &mut Vec<String>,
        hasher: &mut blake3::Hasher,
    ) -> Result<BatchTotals, JobError> {
        let max = self.config.max_trios_per_batch;
        let use_cohorts = queued.len() > max;
        let mut totals = BatchTotals::default();

        for (index, chunk) in queued.chunks(max).enumerate() {
            let batch = index + 1;
            let trios = if use_cohorts {
                let name = format!("{TEMP_COHORT_PREFIX}{version}_{batch}");
                self.store
                    .register_cohort(&name, Cohort::Trios(chunk.to_vec()))?;
                temp_cohorts.push(name.clone());
                TrioBatch::Cohort(name)
            } else {
                TrioBatch::Inline(chunk.to_vec())
            };
            let job = BatchJob {
                batch,
                trios,
                region: region.cloned(),
                version,
                output: output.to_string(),
            };
            let outcome = self
                .executor
                .execute(&job, &self.store)
                .map_err(|source| JobError::BatchFailed { batch, source })?;

            hasher.update(outcome.fingerprint.as_bytes());
            totals.batches += 1;
            totals.entries_written += outcome.entries_written;
            totals.mendelian_errors += outcome.stats.mendelian_errors;
            totals.malformed_genotypes += outcome.stats.malformed_genotypes;
            totals.discrepancies += outcome.stats.discrepancies;
        }
        Ok(totals)
    }

    fn resolve_spec(&self, text: &str) -> Result<Vec<Trio>, JobError> {
        let names = parse_trios(text)?;
        let mut ids = HashMap::new();
        for trio in &names {
            let members = [
                trio.father.as_deref(),
                trio.mother.as_deref(),
                Some(trio.child.as_str()),
            ];
            for name in members.into_iter().flatten() {
                if !ids.contains_key(name) {
                    if let Some(id) = self.store.sample_id(name)? {
                        ids.insert(name.to_string(), id);
                    }
                }
            }
        }
        let trios = names
            .iter()
            .enumerate()
            .map(|(index, trio)| trio.resolve(index, |name| ids.get(name).copied()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(trios)
    }

    fn resolve_cohort(&self, name: &str) -> Result<Vec<Trio>, JobError> {
        let cohort = self
            .store
            .cohort(name)?
            .ok_or_else(|| ConfigError::UnknownCohort(name.to_string()))?;
        Ok(cohort.into_trios(&self.store)?)
    }
}
