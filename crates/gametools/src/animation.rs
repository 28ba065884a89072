use std::rc::Rc;

use crate::geometry::Size;
use crate::raster::Image;

#[derive(Debug, Clone)]
pub struct Animation {
    frames: Rc<[Image]>,
    speed: u32,
    repeats: u32,
    index: usize,
    countdown: u32,
    completed_repeats: u32,
    complete: bool,
}

impl Animation {
    /// `speed` is ticks per frame (0 is treated as 1); `repeats` of 0 loops forever.
    pub fn new(frames: Vec<Image>, speed: u32, repeats: u32) -> Self {
        let speed = speed.max(1);
        Self {
            frames: frames.into(),
            speed,
            repeats,
            index: 0,
            countdown: speed,
            completed_repeats: 0,
            complete: false,
        }
    }

    pub fn restarted(&self) -> Self {
        let mut copy = self.clone();
        copy.reset();
        copy
    }

    pub fn reset(&mut self) {
        self.index = 0;
        self.countdown = self.speed;
        self.completed_repeats = 0;
        self.complete = false;
    }

    pub fn advance(&mut self) {
        if self.complete || self.frames.is_empty() {
            return;
        }

        self.countdown = self.countdown.saturating_sub(1);
        if self.countdown > 0 {
            return;
        }
        self.countdown = self.speed;

        let next = self.index + 1;
        if next < self.frames.len() {
            self.index = next;
            return;
        }

        self.completed_repeats = self.completed_repeats.saturating_add(1);
        if self.repeats != 0 && self.completed_repeats >= self.repeats {
            self.index = self.frames.len() - 1;
            self.complete = true;
        } else {
            self.index = 0;
        }
    }

    pub fn current_frame(&self) -> Option<&Image> {
        self.frames.get(self.index)
    }

    pub fn frame_size(&self) -> Option<Size> {
        self.frames.first().map(Image::size)
    }

    pub fn frame_index(&self) -> usize {
        self.index
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn speed(&self) -> u32 {
        self.speed
    }

    pub fn repeats(&self) -> u32 {
        self.repeats
    }

    pub fn completed_repeats(&self) -> u32 {
        self.completed_repeats
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn shares_frames_with(&self, other: &Animation) -> bool {
        Rc::ptr_eq(&self.frames, &other.frames)
    }
}
