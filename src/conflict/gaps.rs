/// Inclusive sub-intervals of `start..=end` not covered by `targets`.
///
/// Insertion targets (`start > end`) occupy no positions. When every target is
/// an insertion the span is split around the insertion anchors instead.
/// Returns nothing for an insertion-only span (`end < start`).
pub fn missing_regions(targets: &[(u32, u32)], start: u32, end: u32) -> Vec<(u32, u32)> {
    if end < start {
        return Vec::new();
    }
    let mut covered: Vec<(u32, u32)> = targets.iter().copied().filter(|(s, e)| s <= e).collect();
    covered.sort_unstable();
    covered.dedup();

    if covered.is_empty() {
        return split_around_insertions(targets, start, end);
    }

    let mut holes = Vec::new();
    // u64 so `end + 1` cannot overflow at the top of the coordinate range.
    let mut cursor = start as u64;
    let end = end as u64;
    for &(s, e) in &covered {
        if cursor > end {
            break;
        }
        let (s, e) = (s as u64, e as u64);
        if s > cursor {
            holes.push((cursor as u32, (s - 1).min(end) as u32));
        }
        cursor = cursor.max(e + 1);
    }
    if cursor <= end {
        holes.push((cursor as u32, end as u32));
    }
    holes
}

fn split_around_insertions(targets: &[(u32, u32)], start: u32, end: u32) -> Vec<(u32, u32)> {
    let (Some(min_target), Some(max_target)) = (
        targets.iter().map(|(s, _)| *s).min(),
        targets.iter().map(|(_, e)| *e).max(),
    ) else {
        return vec![(start, end)];
    };
    let mut holes = Vec::with_capacity(2);
    if max_target >= start {
        holes.push((start, max_target.min(end)));
    }
    if min_target <= end {
        holes.push((min_target.max(start), end));
    }
    holes
}
