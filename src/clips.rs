use crate::mixer::LoopMode;
use anyhow::{anyhow, bail, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

pub const DEFAULT_SAMPLE_RATE: f32 = 25.0;

/// Keyframe markers authored into the master animation track. These must
/// match the exported asset; a re-export with shifted frames moves every
/// phase boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct FrameMarkers {
    pub closed: u32,
    pub explosion: u32,
    pub exploded: u32,
    pub unfolding: u32,
    pub unfolded: u32,
    pub folding: u32,
    pub folded: u32,
    pub closing: u32,
    pub end: u32,
}

impl Default for FrameMarkers {
    fn default() -> Self {
        Self {
            closed: 0,
            explosion: 160,
            exploded: 260,
            unfolding: 490,
            unfolded: 608,
            folding: 1152,
            folded: 1219,
            closing: 1411,
            end: 1600,
        }
    }
}

/// How a settling clip jumps back after it loops or finishes.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettleRewind {
    FromStart(f32),
    FromEnd(f32),
}

impl SettleRewind {
    pub fn resolve(self, duration: f32) -> f32 {
        let time = match self {
            SettleRewind::FromStart(seconds) => seconds,
            SettleRewind::FromEnd(seconds) => duration - seconds,
        };
        time.clamp(0.0, duration.max(0.0))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClipDescriptor {
    pub name: Arc<str>,
    pub start_frame: u32,
    pub end_frame: u32,
    pub sample_rate: f32,
    pub looping: LoopMode,
    pub settle: Option<SettleRewind>,
}

impl ClipDescriptor {
    pub fn new(name: &str, start_frame: u32, end_frame: u32, sample_rate: f32) -> Self {
        Self {
            name: Arc::from(name),
            start_frame,
            end_frame,
            sample_rate,
            looping: LoopMode::Once,
            settle: None,
        }
    }

    pub fn frame_count(&self) -> u32 {
        self.end_frame.saturating_sub(self.start_frame)
    }

    pub fn duration(&self) -> f32 {
        if self.sample_rate <= 0.0 {
            return 0.0;
        }
        self.frame_count() as f32 / self.sample_rate
    }
}

/// A frame given either as a number or by marker name.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum FrameRef {
    Frame(u32),
    Marker(String),
}

impl FrameRef {
    pub fn resolve(&self, markers: &FrameMarkers) -> Result<u32> {
        match self {
            FrameRef::Frame(frame) => Ok(*frame),
            FrameRef::Marker(name) => {
                markers.frame(name).ok_or_else(|| anyhow!("Unknown frame marker '{name}'"))
            }
        }
    }
}

impl FrameMarkers {
    pub fn frame(&self, marker: &str) -> Option<u32> {
        let frame = match marker {
            "closed" => self.closed,
            "explosion" => self.explosion,
            "exploded" => self.exploded,
            "unfolding" => self.unfolding,
            "unfolded" => self.unfolded,
            "folding" => self.folding,
            "folded" => self.folded,
            "closing" => self.closing,
            "end" => self.end,
            _ => return None,
        };
        Some(frame)
    }
}

/// A clip entry as written in config. Naming an existing clip adjusts it;
/// spans left out keep their current value. New names add bridge clips and
/// need both ends.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClipSpec {
    pub name: String,
    #[serde(default)]
    pub start: Option<FrameRef>,
    #[serde(default)]
    pub end: Option<FrameRef>,
    #[serde(default)]
    pub looping: Option<LoopMode>,
    #[serde(default)]
    pub settle: Option<SettleRewind>,
}

impl ClipSpec {
    pub fn options(name: &str, looping: LoopMode, settle: Option<SettleRewind>) -> Self {
        Self { name: name.to_string(), start: None, end: None, looping: Some(looping), settle }
    }

    pub fn bridge(name: &str, start: &str, end: &str, settle: Option<SettleRewind>) -> Self {
        Self {
            name: name.to_string(),
            start: Some(FrameRef::Marker(start.to_string())),
            end: Some(FrameRef::Marker(end.to_string())),
            looping: Some(LoopMode::Once),
            settle,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClipIssue {
    Empty { clip: Arc<str> },
    PastTrackEnd { clip: Arc<str>, end_frame: u32, track_frames: u32 },
}

impl fmt::Display for ClipIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClipIssue::Empty { clip } => write!(f, "clip '{clip}' spans no frames"),
            ClipIssue::PastTrackEnd { clip, end_frame, track_frames } => write!(
                f,
                "clip '{clip}' ends at frame {end_frame} but the animation track only has {track_frames} frames"
            ),
        }
    }
}

/// Named sub-ranges of the single master animation track.
#[derive(Debug, Clone, Default)]
pub struct ClipTable {
    clips: BTreeMap<Arc<str>, ClipDescriptor>,
}

impl ClipTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The eight segment clips every variant shares.
    pub fn standard(markers: &FrameMarkers, sample_rate: f32) -> Self {
        let m = markers;
        let mut table = Self::new();
        for (name, start, end) in [
            ("closed", m.closed, m.explosion),
            ("explosion", m.explosion, m.unfolding),
            ("exploded", m.exploded, m.unfolding),
            ("unfolding", m.unfolding, m.folding),
            ("unfolded", m.unfolded, m.folding),
            ("folding", m.folding, m.closing),
            ("folded", m.folded, m.closing),
            ("closing", m.closing, m.end),
        ] {
            table.insert(ClipDescriptor::new(name, start, end, sample_rate));
        }
        table
    }

    /// Builds the standard table, then applies config entries in order.
    pub fn from_specs(markers: &FrameMarkers, sample_rate: f32, specs: &[ClipSpec]) -> Result<Self> {
        let mut table = Self::standard(markers, sample_rate);
        for spec in specs {
            let name = spec.name.trim();
            if name.is_empty() {
                bail!("Clip entries need a name");
            }
            let existing = table.get(name).cloned();
            let start = match (&spec.start, &existing) {
                (Some(frame), _) => frame.resolve(markers)?,
                (None, Some(clip)) => clip.start_frame,
                (None, None) => bail!("Clip '{name}' is new and needs a start frame"),
            };
            let end = match (&spec.end, &existing) {
                (Some(frame), _) => frame.resolve(markers)?,
                (None, Some(clip)) => clip.end_frame,
                (None, None) => bail!("Clip '{name}' is new and needs an end frame"),
            };
            if end <= start {
                bail!("Clip '{name}' must end after it starts ({start}..{end})");
            }
            let mut clip = ClipDescriptor::new(name, start, end, sample_rate);
            clip.looping = spec.looping.or(existing.as_ref().map(|clip| clip.looping)).unwrap_or_default();
            clip.settle = spec.settle.or(existing.and_then(|clip| clip.settle));
            table.insert(clip);
        }
        Ok(table)
    }

    pub fn insert(&mut self, clip: ClipDescriptor) -> Option<ClipDescriptor> {
        self.clips.insert(Arc::clone(&clip.name), clip)
    }

    pub fn get(&self, name: &str) -> Option<&ClipDescriptor> {
        self.clips.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.clips.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClipDescriptor> {
        self.clips.values()
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn last_frame(&self) -> u32 {
        self.clips.values().map(|clip| clip.end_frame).max().unwrap_or(0)
    }

    pub fn validate_against(&self, track_frames: u32) -> Vec<ClipIssue> {
        let mut issues = Vec::new();
        for clip in self.clips.values() {
            if clip.frame_count() == 0 {
                issues.push(ClipIssue::Empty { clip: Arc::clone(&clip.name) });
            } else if clip.end_frame > track_frames {
                issues.push(ClipIssue::PastTrackEnd {
                    clip: Arc::clone(&clip.name),
                    end_frame: clip.end_frame,
                    track_frames,
                });
            }
        }
        issues
    }
}
