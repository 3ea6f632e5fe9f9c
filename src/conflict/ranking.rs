use std::cmp::Ordering;

use crate::variant::{VariantCall, PASS, SITE_CONFLICT};

/// Order two calls so that the preferred one sorts first.
///
/// Keys, in order: variant before reference block, PASS before not PASS,
/// no `SiteConflict` before `SiteConflict`, higher QUAL (missing counts as 0),
/// earlier start, earlier end. Callers break remaining ties by input order.
pub fn rank(a: &VariantCall, b: &VariantCall) -> Ordering {
    a.variant
        .is_no_variation()
        .cmp(&b.variant.is_no_variation())
        .then_with(|| prefer_flag(a.effective_filter(), b.effective_filter(), PASS))
        .then_with(|| prefer_flag(a.file.filter.as_deref(), b.file.filter.as_deref(), SITE_CONFLICT).reverse())
        .then_with(|| quality(b).total_cmp(&quality(a)))
        .then_with(|| a.start().cmp(&b.start()))
        .then_with(|| a.end().cmp(&b.end()))
}

/// `Less` when only `a` carries `flag`, `Greater` when only `b` does.
fn prefer_flag(a: Option<&str>, b: Option<&str>, flag: &str) -> Ordering {
    let has = |filter: Option<&str>| filter.is_some_and(|f| f.contains(flag));
    match (has(a), has(b)) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

fn quality(call: &VariantCall) -> f64 {
    call.file.quality.unwrap_or(0.0)
}

/// Sort indices into `calls` by [`rank`], using the index as final tiebreak.
pub(crate) fn ranked(calls: &[VariantCall], mut indices: Vec<usize>) -> Vec<usize> {
    indices.sort_by(|&x, &y| rank(&calls[x], &calls[y]).then(x.cmp(&y)));
    indices
}
