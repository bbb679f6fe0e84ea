// lineage-based fitness delay policies
//
// each policy folds the individual's fresh raw fitness with the raw fitness its
// ancestors recorded when they were evaluated. ancestors are never re-evaluated.

use super::Direction;
use crate::lineage::LineageRecord;
use crate::settings::DelayPolicy;

/// mean of the individual's raw fitness and every walked ancestor's raw fitness.
/// with no ancestors this is just `w_real`.
pub fn mean_delay<'a>(w_real: f64, ancestors: impl Iterator<Item = &'a LineageRecord>) -> f64 {
    let (sum, count) = ancestors.fold((w_real, 1usize), |(sum, count), rec| {
        (sum + rec.w_real_or_default(), count + 1)
    });
    sum / count as f64
}

/// raw fitness of the ancestor exactly `depth` steps back.
/// falls back to `w_real` when the chain ends before reaching that depth.
pub fn generation_delay<'a>(
    w_real: f64,
    ancestors: impl Iterator<Item = &'a LineageRecord>,
    depth: u32,
) -> f64 {
    let mut reached = 0u32;
    let mut deepest = None;
    for rec in ancestors.take(depth as usize) {
        reached += 1;
        deepest = Some(rec);
    }
    match deepest {
        Some(rec) if reached == depth => rec.w_real_or_default(),
        _ => w_real,
    }
}

/// best raw fitness (per direction) over the individual and its walked ancestors
pub fn peak_delay<'a>(
    w_real: f64,
    ancestors: impl Iterator<Item = &'a LineageRecord>,
    direction: Direction,
) -> f64 {
    ancestors.fold(w_real, |w, rec| direction.best(w, rec.w_real_or_default()))
}

/// dispatch to the configured policy. `ancestors` should already be capped at `depth`.
pub fn effective_fitness<'a>(
    policy: DelayPolicy,
    direction: Direction,
    w_real: f64,
    ancestors: impl Iterator<Item = &'a LineageRecord>,
    depth: u32,
) -> f64 {
    profiling::scope!("effective_fitness");
    match policy {
        DelayPolicy::Mean => mean_delay(w_real, ancestors),
        DelayPolicy::Generation => generation_delay(w_real, ancestors, depth),
        DelayPolicy::Peak => peak_delay(w_real, ancestors, direction),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lineage::LineageArchive;
    use crate::individual::IndividualId;

    /// individual 5, parent 2, grandparent 9 (founder)
    fn chain() -> (LineageArchive, IndividualId) {
        let mut archive = LineageArchive::new();
        let grandparent = archive.register(Some(0), None);
        let parent = archive.register(Some(1), Some(grandparent));
        let ind = archive.register(Some(2), Some(parent));
        archive.record_w_real(grandparent, 9.0);
        archive.record_w_real(parent, 2.0);
        archive.record_w_real(ind, 5.0);
        (archive, ind)
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn test_mean_over_window() {
        let (archive, ind) = chain();
        assert!(approx(mean_delay(5.0, archive.walk(ind, 2)), 16.0 / 3.0));
        assert!(approx(mean_delay(5.0, archive.walk(ind, 1)), 3.5));
        assert!(approx(mean_delay(5.0, archive.walk(ind, 0)), 5.0));
    }

    #[test]
    fn test_peak_over_window() {
        let (archive, ind) = chain();
        assert_eq!(peak_delay(5.0, archive.walk(ind, 2), Direction::Maximize), 9.0);
        assert_eq!(peak_delay(5.0, archive.walk(ind, 1), Direction::Maximize), 5.0);
        assert_eq!(peak_delay(5.0, archive.walk(ind, 2), Direction::Minimize), 2.0);
    }

    #[test]
    fn test_peak_never_below_raw_when_maximizing() {
        let (archive, ind) = chain();
        for depth in 0..5 {
            assert!(peak_delay(5.0, archive.walk(ind, depth), Direction::Maximize) >= 5.0);
        }
    }

    #[test]
    fn test_generation_exact_depth() {
        let (archive, ind) = chain();
        assert_eq!(generation_delay(5.0, archive.walk(ind, 1), 1), 2.0);
        assert_eq!(generation_delay(5.0, archive.walk(ind, 2), 2), 9.0);
    }

    #[test]
    fn test_generation_short_chain_uses_self_not_deepest() {
        // the chain only reaches depth 2; asking for 5 yields the individual's
        // own value rather than the grandparent's
        let (archive, ind) = chain();
        assert_eq!(generation_delay(5.0, archive.walk(ind, 5), 5), 5.0);
    }

    #[test]
    fn test_generation_zero_depth_is_self() {
        let (archive, ind) = chain();
        assert_eq!(generation_delay(5.0, archive.walk(ind, 0), 0), 5.0);
    }

    #[test]
    fn test_dispatch_matches_policies() {
        let (archive, ind) = chain();
        let dispatch = |policy| effective_fitness(policy, Direction::Maximize, 5.0, archive.walk(ind, 2), 2);
        assert!(approx(dispatch(DelayPolicy::Mean), 16.0 / 3.0));
        assert_eq!(dispatch(DelayPolicy::Generation), 9.0);
        assert_eq!(dispatch(DelayPolicy::Peak), 9.0);
    }

    #[test]
    fn test_no_ancestors_yields_raw() {
        let mut archive = LineageArchive::new();
        let founder = archive.register(Some(0), None);
        for policy in [DelayPolicy::Mean, DelayPolicy::Generation, DelayPolicy::Peak] {
            let w = effective_fitness(policy, Direction::Maximize, 3.25, archive.walk(founder, 4), 4);
            assert_eq!(w, 3.25);
        }
    }
}
