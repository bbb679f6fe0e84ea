// reproduction-completed hook: per-parent "benefit to offspring" bookkeeping.
// purely observational, never touches fitness or selection.
use crate::context::RunContext;
use crate::individual::Individual;

/// fold one reproduction event into every parent's running statistics.
/// statistics are keyed by id in the lineage archive, so duplicated survivors
/// of one individual see the same totals. a parent listed twice (selfing)
/// counts as two events; parents with the sentinel generation are skipped.
pub fn record_inheritance<'a, G: 'a>(
    parents: impl IntoIterator<Item = &'a Individual<G>>,
    offspring: &Individual<G>,
    ctx: &mut RunContext,
) {
    profiling::scope!("record_inheritance");
    let w = offspring.state.w_eff_or_default();
    for parent in parents {
        if parent.generation.is_some() {
            ctx.lineage.record_offspring(parent.id, w - parent.state.w_eff_or_default());
        }
    }
}
