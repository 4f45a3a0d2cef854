//! Bounded, frame-indexed trajectory history
//!
//! Samples are keyed by the owning space's frame counter so histories of
//! different bodies, recorded over different spans, line up by frame.

use std::collections::VecDeque;

use crate::simulation::states::NVec2;

#[derive(Debug, Clone)]
pub struct Track {
    samples: VecDeque<NVec2>,
    first_frame: u64, // frame index of samples[0]
    capacity: usize,
}

impl Track {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity.min(1024)),
            first_frame: 0,
            capacity,
        }
    }

    /// Append the sample for `frame`. A gap in frame numbers restarts the
    /// history; exceeding capacity drops the oldest sample.
    pub fn push(&mut self, frame: u64, position: NVec2) {
        if self.samples.is_empty() || self.next_frame() != frame {
            self.samples.clear();
            self.first_frame = frame;
        }
        self.samples.push_back(position);
        if self.samples.len() > self.capacity {
            self.samples.pop_front();
            self.first_frame += 1;
        }
    }

    pub fn get(&self, frame: u64) -> Option<NVec2> {
        let offset = frame.checked_sub(self.first_frame)?;
        self.samples.get(usize::try_from(offset).ok()?).copied()
    }

    pub fn first_frame(&self) -> Option<u64> {
        (!self.samples.is_empty()).then_some(self.first_frame)
    }

    pub fn last_frame(&self) -> Option<u64> {
        (!self.samples.is_empty()).then(|| self.next_frame() - 1)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// `(frame, position)` pairs, oldest first
    pub fn iter(&self) -> impl Iterator<Item = (u64, NVec2)> + '_ {
        self.samples
            .iter()
            .enumerate()
            .map(move |(i, p)| (self.first_frame + i as u64, *p))
    }

    fn next_frame(&self) -> u64 {
        self.first_frame + self.samples.len() as u64
    }
}
