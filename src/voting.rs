//! # Disparity voting
//!
//! Per-pixel histograms of the disparities chosen by independent passes.

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// One vote slot per pixel per disparity in `0..=max_disparity`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoteTable {
    num_pixels: usize,
    num_slots: usize,
    votes: Vec<u32>,
    passes: usize
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl VoteTable {
    pub fn new(num_pixels: usize, max_disparity: usize) -> Self {
        let num_slots = max_disparity + 1;

        Self {
            num_pixels,
            num_slots,
            votes: vec![0; num_pixels * num_slots],
            passes: 0
        }
    }

    /// Number of passes tallied so far.
    pub fn passes(&self) -> usize {
        self.passes
    }

    pub fn num_pixels(&self) -> usize {
        self.num_pixels
    }

    /// Add one vote per pixel for the disparity a pass chose.
    ///
    /// # Panics
    ///
    /// If `disparities` does not hold one value per pixel, or a value exceeds the maximum
    /// disparity the table was built for.
    pub fn tally(&mut self, disparities: &[u8]) {
        assert_eq!(disparities.len(), self.num_pixels, "one disparity per pixel expected");

        for (slots, &d) in self.votes.chunks_exact_mut(self.num_slots).zip(disparities) {
            slots[d as usize] += 1;
        }

        self.passes += 1;
    }

    /// Fold another table for the same image into this one.
    pub fn merge(&mut self, other: &VoteTable) {
        assert_eq!(self.votes.len(), other.votes.len(), "vote tables differ in shape");

        for (mine, theirs) in self.votes.iter_mut().zip(other.votes.iter()) {
            *mine += *theirs;
        }

        self.passes += other.passes;
    }

    /// The vote histogram of one pixel, indexed by disparity.
    pub fn votes(&self, pixel: usize) -> &[u32] {
        &self.votes[pixel * self.num_slots..(pixel + 1) * self.num_slots]
    }

    /// The most voted disparity of a pixel, the smallest one on ties. Disparity 0 if no votes
    /// were cast.
    pub fn winner(&self, pixel: usize) -> u8 {
        let mut max_vote = 0;
        let mut max_disp = 0;

        for (d, &count) in self.votes(pixel).iter().enumerate() {
            if count > max_vote {
                max_vote = count;
                max_disp = d;
            }
        }

        max_disp as u8
    }

    /// Winning disparity of every pixel, row-major.
    pub fn finalize(&self) -> Vec<u8> {
        (0..self.num_pixels).map(|i| self.winner(i)).collect()
    }
}
