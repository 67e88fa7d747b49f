use crate::error::WizardError;

/// Ordered, immutable list of steps plus a cursor that never leaves
/// `0..steps.len()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepSequencer<S> {
    steps: Vec<S>,
    index: usize,
}

impl<S: Copy> StepSequencer<S> {
    pub fn new(steps: Vec<S>) -> Result<Self, WizardError> {
        if steps.is_empty() {
            return Err(WizardError::EmptyFlow);
        }
        Ok(Self { steps, index: 0 })
    }

    pub fn current(&self) -> S {
        self.steps[self.index]
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[S] {
        &self.steps
    }

    pub fn is_terminal(&self) -> bool {
        self.index + 1 == self.steps.len()
    }

    /// Moves forward one step, clamped at the terminal step.
    pub fn advance(&mut self) -> S {
        self.index = (self.index + 1).min(self.steps.len() - 1);
        self.current()
    }

    pub fn retreat(&mut self) -> S {
        self.index = self.index.saturating_sub(1);
        self.current()
    }

    pub fn reset(&mut self) {
        self.index = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_sequences() {
        assert_eq!(
            StepSequencer::<u8>::new(Vec::new()).expect_err("empty"),
            WizardError::EmptyFlow
        );
    }

    #[test]
    fn clamps_at_both_ends() {
        let mut seq = StepSequencer::new(vec!['a', 'b', 'c']).expect("steps");
        assert_eq!(seq.current(), 'a');
        assert_eq!(seq.retreat(), 'a');
        assert_eq!(seq.advance(), 'b');
        assert_eq!(seq.advance(), 'c');
        assert!(seq.is_terminal());
        for _ in 0..10 {
            assert_eq!(seq.advance(), 'c');
            assert!(seq.index() < seq.len());
        }
        seq.reset();
        assert_eq!(seq.index(), 0);
    }

    #[test]
    fn single_step_sequence_starts_terminal() {
        let seq = StepSequencer::new(vec![1]).expect("steps");
        assert!(seq.is_terminal());
    }
}
