//! Adaptive Peak Detection
//!
//! Finds local maxima in a short integer sequence. The vitals calculator
//! inverts the infrared channel before calling it, so the peaks found here
//! are the valleys of the PPG waveform, i.e. the start of each cardiac cycle.
//!
//! ## Algorithm
//!
//! 1. **Candidates**: scan left to right for samples above `min_height`
//!    that rise from their left neighbour. A plateau of equal values counts
//!    once, at its first index, and only if the sample after the plateau is
//!    lower. At most [`MAX_PEAKS`] candidates are collected.
//! 2. **Ranking**: order candidates by height, tallest first. Equal heights
//!    keep their scan order.
//! 3. **Separation**: walk the ranking and keep a candidate only if it is
//!    more than `min_distance` samples from every peak already kept and
//!    from the virtual origin at index -1.
//! 4. **Output**: kept indices in ascending order, truncated to
//!    `max_count`.
//!
//! ```text
//!        ^           ^ ^               ^
//!   ____/ \____/\___/   \_____/\______/ \___
//!       |           | x                 |
//!      kept        kept  (too close)   kept
//! ```
//!
//! Everything is integer arithmetic on the stack; a detection pass over a
//! full window is a few hundred comparisons.

use heapless::Vec;

use crate::constants::signal::{MAX_PEAKS, MIN_PEAK_DISTANCE};

/// Ascending peak indices, at most [`MAX_PEAKS`]
pub type PeakList = Vec<usize, MAX_PEAKS>;

/// Local-maximum detector with height threshold and minimum separation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeakDetector {
    min_height: i32,
    min_distance: usize,
    max_count: usize,
}

impl PeakDetector {
    /// Detector with the given height threshold and default separation
    pub const fn new(min_height: i32) -> Self {
        Self {
            min_height,
            min_distance: MIN_PEAK_DISTANCE,
            max_count: MAX_PEAKS,
        }
    }

    /// Peaks at or within this many samples of a taller one are dropped
    pub const fn with_min_distance(mut self, min_distance: usize) -> Self {
        self.min_distance = min_distance;
        self
    }

    /// Cap the number of returned peaks (never above [`MAX_PEAKS`])
    pub fn with_max_count(mut self, max_count: usize) -> Self {
        self.max_count = max_count.min(MAX_PEAKS);
        self
    }

    /// Height threshold in effect
    pub fn min_height(&self) -> i32 {
        self.min_height
    }

    /// Find peaks in `x`
    pub fn find(&self, x: &[i32]) -> PeakList {
        let mut candidates = candidates_above_height(x, self.min_height);
        rank_by_height(&mut candidates, x);

        let mut peaks = remove_close_peaks(&candidates, self.min_distance);
        peaks.sort_unstable();
        peaks.truncate(self.max_count);
        peaks
    }
}

fn candidates_above_height(x: &[i32], min_height: i32) -> PeakList {
    let mut found = PeakList::new();
    let len = x.len();
    let mut i = 1;

    while i + 1 < len {
        if x[i] > min_height && x[i] > x[i - 1] {
            let mut width = 1;
            while i + width < len && x[i] == x[i + width] {
                width += 1;
            }

            // A plateau running into the end of the input has no falling edge
            let falls_after = i + width < len && x[i] > x[i + width];
            if falls_after && found.push(i).is_ok() {
                i += width + 1;
            } else {
                i += width;
            }
        } else {
            i += 1;
        }
    }

    found
}

/// Stable insertion sort, tallest first
fn rank_by_height(indices: &mut [usize], x: &[i32]) {
    for i in 1..indices.len() {
        let current = indices[i];
        let mut j = i;
        while j > 0 && x[current] > x[indices[j - 1]] {
            indices[j] = indices[j - 1];
            j -= 1;
        }
        indices[j] = current;
    }
}

fn remove_close_peaks(ranked: &[usize], min_distance: usize) -> PeakList {
    let mut kept = PeakList::new();

    for &candidate in ranked {
        // Distance from the virtual peak at -1
        let clear_of_origin = candidate + 1 > min_distance;
        let clear_of_kept = kept
            .iter()
            .all(|&peak: &usize| peak.abs_diff(candidate) > min_distance);

        if clear_of_origin && clear_of_kept {
            // ranked never holds more than MAX_PEAKS entries
            let _ = kept.push(candidate);
        }
    }

    kept
}
