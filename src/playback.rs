//! Frame clock for sequence playback.
//!
//! Converts wall-clock deltas into a pair of neighbouring frame indices and
//! the blend fraction between them.

use serde::Serialize;

/// Lowest accepted speed multiplier
const MIN_SPEED: f32 = 0.01;

/// Frames to sample this tick and the blend fraction between them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlaybackPosition {
    pub frame_a: usize,
    pub frame_b: usize,
    /// 0 = `frame_a`, 1 = `frame_b`
    pub alpha: f32,
}

#[derive(Debug, Clone)]
pub struct PlaybackClock {
    frame_count: usize,
    /// Seconds per frame
    step: f32,
    speed: f32,
    interpolate: bool,
    looped: bool,
    index: usize,
    /// Time accumulated since `index` became current
    elapsed: f32,
}

impl PlaybackClock {
    /// `fps` below 1 is treated as 1; `speed` below 0.01 as 0.01.
    pub fn new(frame_count: usize, fps: f32, speed: f32, interpolate: bool, looped: bool) -> Self {
        Self {
            frame_count: frame_count.max(1),
            step: 1.0 / fps.max(1.0),
            speed: speed.max(MIN_SPEED),
            interpolate,
            looped,
            index: 0,
            elapsed: 0.0,
        }
    }

    /// Advance by `dt` seconds of wall-clock time.
    pub fn advance(&mut self, dt: f32) -> PlaybackPosition {
        if dt > 0.0 {
            self.elapsed += dt * self.speed;
        }

        while self.elapsed >= self.step {
            self.elapsed -= self.step;
            self.index += 1;
            if self.index >= self.frame_count {
                self.index = if self.looped { 0 } else { self.frame_count - 1 };
            }
        }

        self.position()
    }

    /// Current position without advancing.
    pub fn position(&self) -> PlaybackPosition {
        let at_end = !self.looped && self.index + 1 >= self.frame_count;
        let frame_b = if at_end {
            self.index
        } else {
            (self.index + 1) % self.frame_count
        };

        let alpha = if self.interpolate && frame_b != self.index {
            (self.elapsed / self.step).clamp(0.0, 1.0)
        } else {
            0.0
        };

        PlaybackPosition {
            frame_a: self.index,
            frame_b,
            alpha,
        }
    }

    /// Jump to `index` (clamped) and restart its interval.
    pub fn seek(&mut self, index: usize) {
        self.index = index.min(self.frame_count - 1);
        self.elapsed = 0.0;
    }

    pub fn reset(&mut self) {
        self.seek(0);
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn frame_rate(&self) -> f32 {
        1.0 / self.step
    }

    /// Change the speed multiplier; takes effect on the next advance.
    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed.max(MIN_SPEED);
    }

    /// The last frame of a non-looping sequence has been reached.
    pub fn is_finished(&self) -> bool {
        !self.looped && self.index + 1 >= self.frame_count
    }
}
