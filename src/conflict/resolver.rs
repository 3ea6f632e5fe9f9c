use std::collections::HashMap;
use std::ops::AddAssign;

use tracing::{debug, instrument};

use super::alternate::{calls_conflict, Alternate};
use super::gaps::missing_regions;
use super::ranking::ranked;
use super::ConflictError;
use crate::variant::{FileId, Variant, VariantCall, NO_CALL, SITE_CONFLICT};

/// Counters describing what a resolution pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResolutionStats {
    /// Records dropped because a sibling split from the same site had a lower allele index.
    pub split_duplicates: usize,
    /// Records dropped because a better call reported one of their alleles.
    pub duplicate_alternates: usize,
    /// Conflict groups seen.
    pub groups: usize,
    /// Reference blocks merged into a wider block.
    pub merged_blocks: usize,
    /// Calls that could not be placed.
    pub misfits: usize,
    /// No-call placeholder records created.
    pub fillers: usize,
}

impl AddAssign for ResolutionStats {
    fn add_assign(&mut self, other: Self) {
        self.split_duplicates += other.split_duplicates;
        self.duplicate_alternates += other.duplicate_alternates;
        self.groups += other.groups;
        self.merged_blocks += other.merged_blocks;
        self.misfits += other.misfits;
        self.fillers += other.fillers;
    }
}

/// Output of [`ConflictResolver::resolve_with_stats`].
#[derive(Debug, Clone)]
pub struct Resolution {
    /// Non-overlapping calls, group by group.
    pub calls: Vec<VariantCall>,
    /// Pass counters.
    pub stats: ResolutionStats,
}

/// Turns overlapping and duplicated calls of one sample set into a
/// non-overlapping list, keeping the best call per region and filling
/// uncovered positions with no-call placeholders.
#[derive(Debug, Clone, Default)]
pub struct ConflictResolver;

impl ConflictResolver {
    /// Create a resolver.
    pub fn new() -> Self {
        Self
    }

    /// Resolve `calls`, discarding the counters.
    pub fn resolve(&self, calls: Vec<VariantCall>) -> Result<Vec<VariantCall>, ConflictError> {
        self.resolve_with_stats(calls).map(|resolution| resolution.calls)
    }

    /// Resolve `calls` and report what was dropped, merged and filled.
    #[instrument(level = "debug", skip_all, fields(calls = calls.len()))]
    pub fn resolve_with_stats(&self, calls: Vec<VariantCall>) -> Result<Resolution, ConflictError> {
        let mut stats = ResolutionStats::default();
        let mut alive = vec![true; calls.len()];
        stats.split_duplicates = drop_split_duplicates(&calls, &mut alive);

        let expanded: Vec<Vec<Alternate>> = calls.iter().map(Alternate::expand).collect();

        // Best call first; a call reporting an allele already owned by an
        // accepted call is dropped, and every allele it reported must stay owned.
        let candidates: Vec<usize> = (0..calls.len()).filter(|&i| alive[i]).collect();
        let mut owner_of: HashMap<&Alternate, usize> = HashMap::new();
        let mut rejected = Vec::new();
        for index in ranked(&calls, candidates) {
            if expanded[index].iter().any(|alternate| owner_of.contains_key(alternate)) {
                alive[index] = false;
                stats.duplicate_alternates += 1;
                rejected.push(index);
                continue;
            }
            for alternate in &expanded[index] {
                owner_of.entry(alternate).or_insert(index);
            }
        }
        check_claims(&expanded, &rejected, &owner_of)?;

        // Arena of surviving alternates, sorted by position.
        let mut arena: Vec<(&Alternate, usize)> = owner_of.into_iter().collect();
        arena.sort_by(|(a, _), (b, _)| a.cmp(b));

        let groups = conflict_groups(&arena, calls.len());
        stats.groups = groups.len();

        let mut resolved = Vec::with_capacity(calls.len());
        for group in groups {
            match group.members.as_slice() {
                [] => {
                    return Err(ConflictError::EmptyGroup {
                        chromosome: group.chromosome.to_string(),
                        start: group.start,
                        end: group.end,
                    })
                }
                [single] => resolved.push(calls[*single].clone()),
                members => {
                    let out = resolve_group(&calls, members, &group, &mut stats);
                    if out.is_empty() {
                        return Err(ConflictError::EmptyGroup {
                            chromosome: group.chromosome.to_string(),
                            start: group.start,
                            end: group.end,
                        });
                    }
                    resolved.extend(out);
                }
            }
        }

        debug!(
            input = calls.len(),
            output = resolved.len(),
            groups = stats.groups,
            fillers = stats.fillers,
            "resolved variant conflicts"
        );
        Ok(Resolution {
            calls: resolved,
            stats,
        })
    }
}

/// Of all records split from the same source site, keep those with the lowest allele index.
fn drop_split_duplicates(calls: &[VariantCall], alive: &mut [bool]) -> usize {
    let mut lowest: HashMap<(FileId, &str), u32> = HashMap::new();
    for call in calls {
        if let Some(origin) = &call.file.call {
            lowest
                .entry((call.file.file_id, origin.variant_id.as_str()))
                .and_modify(|min| *min = (*min).min(origin.allele_index))
                .or_insert(origin.allele_index);
        }
    }
    let mut dropped = 0;
    for (index, call) in calls.iter().enumerate() {
        if let Some(origin) = &call.file.call {
            let key = (call.file.file_id, origin.variant_id.as_str());
            if lowest.get(&key).is_some_and(|&min| origin.allele_index > min) {
                alive[index] = false;
                dropped += 1;
            }
        }
    }
    dropped
}

/// Every allele of a dropped call must be owned by an accepted call.
fn check_claims(
    expanded: &[Vec<Alternate>],
    rejected: &[usize],
    owner_of: &HashMap<&Alternate, usize>,
) -> Result<(), ConflictError> {
    for &index in rejected {
        for alternate in &expanded[index] {
            if !owner_of.contains_key(alternate) {
                return Err(ConflictError::AlternateUnclaimed {
                    chromosome: alternate.chromosome.to_string(),
                    position: alternate.start,
                    alternate: alternate.alternate.clone(),
                });
            }
        }
    }
    Ok(())
}

struct ConflictGroup {
    chromosome: std::sync::Arc<str>,
    start: u32,
    end: u32,
    members: Vec<usize>,
}

/// Union overlapping alternates (and all alternates of one call) into groups,
/// ordered by their first alternate.
fn conflict_groups(arena: &[(&Alternate, usize)], calls: usize) -> Vec<ConflictGroup> {
    let mut sets = DisjointSets::new(calls);
    for (i, (left, left_owner)) in arena.iter().enumerate() {
        for (right, right_owner) in &arena[i + 1..] {
            if right.chromosome != left.chromosome || right.start > left.reach() {
                break;
            }
            if left.conflicts_with(right) {
                sets.union(*left_owner, *right_owner);
            }
        }
    }

    let mut groups: Vec<ConflictGroup> = Vec::new();
    let mut group_of_root: HashMap<usize, usize> = HashMap::new();
    for (alternate, owner) in arena {
        let root = sets.find(*owner);
        let slot = *group_of_root.entry(root).or_insert_with(|| {
            groups.push(ConflictGroup {
                chromosome: alternate.chromosome.clone(),
                start: alternate.start,
                end: alternate.end,
                members: Vec::new(),
            });
            groups.len() - 1
        });
        let group = &mut groups[slot];
        group.start = group.start.min(alternate.start);
        group.end = group.end.max(alternate.end);
        if !group.members.contains(owner) {
            group.members.push(*owner);
        }
    }
    groups
}

fn resolve_group(
    calls: &[VariantCall],
    members: &[usize],
    group: &ConflictGroup,
    stats: &mut ResolutionStats,
) -> Vec<VariantCall> {
    let mut resolved: Vec<VariantCall> = Vec::with_capacity(members.len());
    let mut misfit: Option<usize> = None;

    for index in ranked(calls, members.to_vec()) {
        let query = &calls[index];
        let overlapping: Vec<usize> = resolved
            .iter()
            .enumerate()
            .filter(|(_, accepted)| calls_conflict(accepted, query))
            .map(|(i, _)| i)
            .collect();

        if overlapping.is_empty() {
            resolved.push(query.clone());
            continue;
        }
        if query.variant.is_no_variation()
            && overlapping.iter().all(|&i| same_reference_block(&resolved[i], query))
        {
            let others: Vec<&VariantCall> = overlapping.iter().map(|&i| &resolved[i]).collect();
            let merged = merge_blocks(query, &others);
            for &i in overlapping.iter().rev() {
                resolved.remove(i);
            }
            resolved.push(merged);
            stats.merged_blocks += 1;
            continue;
        }
        stats.misfits += 1;
        misfit.get_or_insert(index);
    }

    // Only the first misfit is turned into placeholders.
    if let Some(index) = misfit {
        let targets: Vec<(u32, u32)> = resolved.iter().map(|r| (r.start(), r.end())).collect();
        for (start, end) in missing_regions(&targets, group.start, group.end) {
            resolved.push(no_call_filler(&calls[index], start, end));
            stats.fillers += 1;
        }
    }
    resolved
}

fn same_reference_block(a: &VariantCall, b: &VariantCall) -> bool {
    a.variant.is_no_variation()
        && b.variant.is_no_variation()
        && a.samples.len() == b.samples.len()
        && a
            .samples
            .iter()
            .zip(&b.samples)
            .all(|(x, y)| x.sample == y.sample && x.genotype == y.genotype)
}

/// Widen the earliest block to span every contributing block.
fn merge_blocks(query: &VariantCall, others: &[&VariantCall]) -> VariantCall {
    let mut earliest = query;
    let (mut start, mut end) = (query.start(), query.end());
    for block in others {
        start = start.min(block.start());
        end = end.max(block.end());
        if (block.start(), block.end()) < (earliest.start(), earliest.end()) {
            earliest = block;
        }
    }
    let mut merged = earliest.clone();
    merged.variant.start = start;
    merged.variant.end = end;
    merged
}

/// Placeholder covering `start..=end` with every genotype set to no-call.
fn no_call_filler(template: &VariantCall, start: u32, end: u32) -> VariantCall {
    let mut filler = template.clone();
    filler.variant = Variant::reference_block(template.variant.chromosome.clone(), start, end);
    filler.secondary_alternates.clear();
    for sample in &mut filler.samples {
        sample.genotype = NO_CALL.to_string();
        sample.filter = Some(SITE_CONFLICT.to_string());
    }
    filler.file.filter = Some(SITE_CONFLICT.to_string());
    filler
}

/// Union-find over call indices.
struct DisjointSets {
    parent: Vec<usize>,
}

impl DisjointSets {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            self.parent[ra.max(rb)] = ra.min(rb);
        }
    }
}
