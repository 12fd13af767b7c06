/// Progress update emitted while download tasks complete.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AcquireProgress {
    /// Tasks finished so far.
    pub processed: usize,
    /// Tasks scheduled in this run.
    pub total: usize,
}

pub(super) fn progress_tick(
    progress: &mut Option<&mut dyn FnMut(AcquireProgress)>,
    processed: usize,
    total: usize,
) {
    if let Some(callback) = progress.as_deref_mut() {
        callback(AcquireProgress { processed, total });
    }
}
