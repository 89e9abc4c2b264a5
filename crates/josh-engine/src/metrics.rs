//! [`StepMetrics`]: counts accumulated over one `Stepper::perform` run.

/// Step- and attribute-resolution counts for one `perform` call.
///
/// `spec.md` §4.H names `perform` as returning the completed step index;
/// this additionally surfaces the resolution-count detail a caller needs
/// to reason about how much work a run actually did, grounded on the
/// teacher's own per-run metrics struct returned alongside its step
/// count.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepMetrics {
    /// How many timesteps completed during this call.
    pub steps_completed: u64,
    /// How many individual attribute resolutions were forced (patches
    /// and organisms, across every sub-step).
    pub attribute_resolutions: u64,
}

impl StepMetrics {
    fn merge(&mut self, other: StepMetrics) {
        self.steps_completed += other.steps_completed;
        self.attribute_resolutions += other.attribute_resolutions;
    }

    pub(crate) fn add_resolutions(&mut self, count: u64) {
        self.attribute_resolutions += count;
    }

    pub(crate) fn record_step(&mut self) {
        self.steps_completed += 1;
    }
}

impl std::ops::AddAssign for StepMetrics {
    fn add_assign(&mut self, other: Self) {
        self.merge(other);
    }
}
