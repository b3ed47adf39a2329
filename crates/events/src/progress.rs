//! Phase weight bookkeeping for orchestration progress
//!
//! Orchestrations report fixed-weight phases. The exact split varies by
//! package type but each plan always sums to a complete bar (100).

/// A named phase weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressWeight {
    pub label: &'static str,
    pub increment: u8,
}

/// The ordered phase plan for one orchestration.
#[derive(Debug, Clone)]
pub struct InstallPlan {
    weights: Vec<ProgressWeight>,
}

impl InstallPlan {
    /// Build a plan from ordered weights.
    ///
    /// # Panics
    ///
    /// Panics if the weights do not sum to exactly 100. Plans are built from
    /// constants, so a bad sum is a programming error caught by tests.
    #[must_use]
    pub fn new(weights: Vec<ProgressWeight>) -> Self {
        let total: u32 = weights.iter().map(|w| u32::from(w.increment)).sum();
        assert_eq!(total, 100, "progress plan must sum to 100, got {total}");
        Self { weights }
    }

    /// The ordered weights of this plan.
    #[must_use]
    pub fn weights(&self) -> &[ProgressWeight] {
        &self.weights
    }

    /// Three roughly equal phases: upload, restore, invoke.
    #[must_use]
    pub fn thirds(first: &'static str, second: &'static str, third: &'static str) -> Self {
        Self::new(vec![
            ProgressWeight {
                label: first,
                increment: 33,
            },
            ProgressWeight {
                label: second,
                increment: 33,
            },
            ProgressWeight {
                label: third,
                increment: 34,
            },
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thirds_sum_to_complete_bar() {
        let plan = InstallPlan::thirds("upload", "restore", "invoke");
        let total: u32 = plan.weights().iter().map(|w| u32::from(w.increment)).sum();
        assert_eq!(total, 100);
    }

    #[test]
    #[should_panic(expected = "must sum to 100")]
    fn unbalanced_plan_is_rejected() {
        let _ = InstallPlan::new(vec![ProgressWeight {
            label: "upload",
            increment: 50,
        }]);
    }
}
