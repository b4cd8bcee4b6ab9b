//! Consecutive-sample debouncing.
//!
//! A [`Debouncer`] commits a value once it has been observed `threshold`
//! times in a row. The count resets to zero whenever the candidate changes,
//! and after a commit it is advanced one past the threshold so the same run
//! of samples never commits twice.

/// Debounce state for one classified signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Debouncer<T> {
    candidate: Option<T>,
    count: u32,
    threshold: u32,
}

impl<T: Copy + PartialEq> Debouncer<T> {
    /// `threshold` must be non-zero and below `u32::MAX`; see
    /// [`crate::HubConfig::validate`].
    pub fn new(threshold: u32) -> Self {
        Self {
            candidate: None,
            count: 0,
            threshold,
        }
    }

    /// Feed one sample. Returns the value on the sample that commits it.
    pub fn observe(&mut self, value: T) -> Option<T> {
        if self.candidate != Some(value) {
            self.candidate = Some(value);
            self.count = 0;
        }

        if self.count < self.threshold {
            self.count += 1;
            if self.count == self.threshold {
                self.count = self.count.saturating_add(1);
                return Some(value);
            }
        }
        None
    }

    /// Restart the count for the current candidate so it can commit again.
    pub fn rearm(&mut self) {
        self.count = 0;
    }

    pub fn candidate(&self) -> Option<T> {
        self.candidate
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Returns `true` once the current candidate has committed.
    pub fn is_settled(&self) -> bool {
        self.count > self.threshold
    }
}
