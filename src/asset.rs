use crate::clips::{ClipIssue, ClipTable};
use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// What the viewer needs from the packed model: the master animation track.
#[derive(Debug, Clone)]
pub struct ModelAsset {
    pub path: PathBuf,
    pub animation: Arc<str>,
    /// Seconds covered by the longest channel of the first animation.
    pub duration: f32,
    pub channel_count: usize,
    pub mesh_count: usize,
}

impl ModelAsset {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path_ref = path.as_ref();
        let (document, buffers, _) = gltf::import(path_ref)
            .with_context(|| format!("Failed to import model from {}", path_ref.display()))?;

        let mut animations = document.animations();
        let animation = animations
            .next()
            .ok_or_else(|| anyhow!("Model '{}' does not contain an animation track", path_ref.display()))?;
        if animations.next().is_some() {
            eprintln!(
                "[asset] '{}' contains several animations; phases are cut from the first one.",
                path_ref.display()
            );
        }

        let name: Arc<str> = Arc::from(animation.name().unwrap_or("animation_0"));
        let mut duration = 0.0_f32;
        let mut channel_count = 0;
        for channel in animation.channels() {
            let reader = channel.reader(|buffer| Some(&buffers[buffer.index()]));
            let Some(inputs) = reader.read_inputs() else {
                continue;
            };
            channel_count += 1;
            for time in inputs {
                if time.is_finite() {
                    duration = duration.max(time);
                }
            }
        }
        if channel_count == 0 {
            return Err(anyhow!("Animation '{}' in '{}' has no readable channels", name, path_ref.display()));
        }

        Ok(Self {
            path: path_ref.to_path_buf(),
            animation: name,
            duration,
            channel_count,
            mesh_count: document.meshes().count(),
        })
    }

    /// Frames in the master track when sampled at `sample_rate`.
    pub fn frame_count(&self, sample_rate: f32) -> u32 {
        if sample_rate <= 0.0 {
            return 0;
        }
        (self.duration * sample_rate).round().max(0.0) as u32
    }

    pub fn validate(&self, clips: &ClipTable, sample_rate: f32) -> Vec<ClipIssue> {
        clips.validate_against(self.frame_count(sample_rate))
    }
}
