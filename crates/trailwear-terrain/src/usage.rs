//! Wear counters and the reinforcement feedback that writes them.
//!
//! [`UsageField::reinforce`] is the only mutation of terrain state during
//! steady-state simulation: every completed route bumps the counter of
//! each pixel it crosses, saturating at [`USAGE_CEILING`].

/// Counter value at which a pixel's wear stops increasing.
pub const USAGE_CEILING: u16 = u16::MAX;

/// Per-pixel count of completed routes that crossed the pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageField {
    counts: Vec<u16>,
}

impl UsageField {
    /// A fresh field of `len` zeroed counters.
    pub fn new(len: usize) -> Self {
        Self {
            counts: vec![0; len],
        }
    }

    /// Counter at `index`; zero when out of bounds.
    pub fn get(&self, index: usize) -> u16 {
        self.counts.get(index).copied().unwrap_or(0)
    }

    /// Increment every pixel on `path`, saturating.
    ///
    /// Returns the post-increment counter for each path pixel in order.
    /// Indices outside the field are skipped and reported as zero.
    pub fn reinforce(&mut self, path: &[usize]) -> Vec<u16> {
        path.iter()
            .map(|&index| {
                self.counts.get_mut(index).map_or(0, |count| {
                    *count = count.saturating_add(1).min(USAGE_CEILING);
                    *count
                })
            })
            .collect()
    }

    /// Zero every counter.
    pub fn reset(&mut self) {
        self.counts.fill(0);
    }

    /// Number of pixels crossed by at least one route.
    pub fn worn_count(&self) -> usize {
        self.counts.iter().filter(|&&c| c > 0).count()
    }

    /// Highest counter in the field.
    pub fn peak(&self) -> u16 {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    /// Raw counters in index order.
    pub fn counts(&self) -> &[u16] {
        &self.counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reinforce_increments_path_only() {
        let mut usage = UsageField::new(6);
        let after = usage.reinforce(&[1, 2, 3]);
        assert_eq!(after, vec![1, 1, 1]);
        let after = usage.reinforce(&[3, 4]);
        assert_eq!(after, vec![2, 1]);
        assert_eq!(usage.counts(), &[0, 1, 1, 2, 1, 0]);
        assert_eq!(usage.worn_count(), 4);
        assert_eq!(usage.peak(), 2);
    }

    #[test]
    fn reinforce_saturates() {
        let mut usage = UsageField::new(1);
        if let Some(c) = usage.counts.first_mut() {
            *c = USAGE_CEILING;
        }
        let after = usage.reinforce(&[0]);
        assert_eq!(after, vec![USAGE_CEILING]);
    }

    #[test]
    fn out_of_bounds_is_ignored() {
        let mut usage = UsageField::new(2);
        let after = usage.reinforce(&[0, 9]);
        assert_eq!(after, vec![1, 0]);
        assert_eq!(usage.get(9), 0);
    }

    #[test]
    fn reset_clears() {
        let mut usage = UsageField::new(3);
        let _ = usage.reinforce(&[0, 1, 2]);
        usage.reset();
        assert_eq!(usage.worn_count(), 0);
    }
}
