//! Landmark sequences and their JSON boundary.
//!
//! Accepted layouts:
//! - a bare array of frames: `[{"left_hand": [...], "right_hand": [...], "pose": [...]}, ...]`
//! - a segment object: `{"frames": [...], "fps_sampled": 30.0, "video": "...", ...}`
//!
//! Each frame entry is a list of `{name, x, y, z, visibility}` points. Names are
//! matched case-insensitively; the first occurrence of a name wins and unknown
//! names are dropped.

use serde::Deserialize;

use super::frame::{LandmarkFrame, LandmarkPoint, LandmarkSet};
use super::ids::LandmarkId;
use crate::error::{RetargetError, SequenceError};

/// Descriptive fields carried by segment-style files.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SequenceInfo {
    pub video: Option<String>,
    pub gloss_id: Option<String>,
    pub source: Option<String>,
    pub occurrence: Option<i64>,
    pub start: Option<f32>,
    pub end: Option<f32>,
}

/// An immutable, non-empty, time-ordered list of frames.
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkSequence {
    frames: Vec<LandmarkFrame>,
    /// Sample rate declared by the source, if any
    fps: Option<f32>,
    info: SequenceInfo,
}

impl LandmarkSequence {
    /// Build a sequence from already-parsed frames.
    pub fn new(frames: Vec<LandmarkFrame>, fps: Option<f32>) -> Result<Self, RetargetError> {
        if frames.is_empty() {
            return Err(SequenceError::Empty.into());
        }
        if let Some(f) = fps {
            if !(f.is_finite() && f > 0.0) {
                return Err(SequenceError::InvalidFrameRate(f).into());
            }
        }
        Ok(Self {
            frames,
            fps,
            info: SequenceInfo::default(),
        })
    }

    /// Parse a landmark JSON document.
    pub fn from_json(json: &str) -> Result<Self, RetargetError> {
        let raw: RawSequence =
            serde_json::from_str(json).map_err(|e| SequenceError::Parse(e.to_string()))?;

        let (raw_frames, fps, info) = match raw {
            RawSequence::Frames(frames) => (frames, None, SequenceInfo::default()),
            RawSequence::Segment(seg) => {
                // Non-positive rates mean "not declared"
                let fps = seg.fps_sampled.filter(|f| *f > 0.0);
                (seg.frames, fps, seg.info)
            }
        };

        let frames: Vec<LandmarkFrame> = raw_frames.into_iter().map(RawFrame::resolve).collect();

        let mut sequence = Self::new(frames, fps)?;
        sequence.info = info;

        tracing::info!(
            "Loaded landmark sequence: {} frames, fps={}",
            sequence.len(),
            sequence
                .fps
                .map(|f| format!("{f:.2}"))
                .unwrap_or_else(|| "undeclared".to_string())
        );

        Ok(sequence)
    }

    /// Read and parse a landmark JSON file.
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, RetargetError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn frames(&self) -> &[LandmarkFrame] {
        &self.frames
    }

    pub fn frame(&self, index: usize) -> &LandmarkFrame {
        &self.frames[index % self.frames.len()]
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Declared sample rate, if the source had one
    pub fn declared_fps(&self) -> Option<f32> {
        self.fps
    }

    /// Declared sample rate, or `fallback`
    pub fn frame_rate(&self, fallback: f32) -> f32 {
        self.fps.unwrap_or(fallback)
    }

    pub fn info(&self) -> &SequenceInfo {
        &self.info
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSequence {
    Frames(Vec<RawFrame>),
    Segment(RawSegment),
}

#[derive(Deserialize)]
struct RawSegment {
    #[serde(default)]
    frames: Vec<RawFrame>,
    #[serde(default)]
    fps_sampled: Option<f32>,
    #[serde(flatten)]
    info: SequenceInfo,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawFrame {
    left_hand: Option<Vec<Option<RawPoint>>>,
    right_hand: Option<Vec<Option<RawPoint>>>,
    pose: Option<Vec<Option<RawPoint>>>,
}

#[derive(Deserialize)]
struct RawPoint {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    x: f32,
    #[serde(default)]
    y: f32,
    #[serde(default)]
    z: f32,
    #[serde(default)]
    visibility: f32,
}

impl RawFrame {
    fn resolve(self) -> LandmarkFrame {
        LandmarkFrame {
            left_hand: self.left_hand.map(resolve_points),
            right_hand: self.right_hand.map(resolve_points),
            pose: self.pose.map(resolve_points),
        }
    }
}

fn resolve_points<I: LandmarkId>(raw: Vec<Option<RawPoint>>) -> LandmarkSet<I> {
    let mut set = LandmarkSet::new();
    for p in raw.into_iter().flatten() {
        let Some(name) = p.name.as_deref().filter(|n| !n.is_empty()) else {
            continue;
        };
        match I::from_name(name) {
            Some(id) => {
                set.insert_first(
                    id,
                    LandmarkPoint {
                        x: p.x,
                        y: p.y,
                        z: p.z,
                        visibility: p.visibility,
                    },
                );
            }
            None => tracing::trace!("Dropping unknown landmark name: {}", name),
        }
    }
    set
}
