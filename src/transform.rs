use crate::wrap_angle;
use glam::Vec3;
use serde::Deserialize;

/// Position plus Euler rotation (radians, XYZ order) of one scene node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
}

impl Transform {
    pub fn new(position: Vec3, rotation: Vec3) -> Self {
        let mut transform = Self { position, rotation };
        transform.normalize_rotation();
        transform
    }

    pub fn channel(&self, channel: Channel) -> Vec3 {
        match channel {
            Channel::Position => self.position,
            Channel::Rotation => self.rotation,
        }
    }

    /// Writes a channel; rotations are wrapped into [-PI, PI) on the way in.
    pub fn set_channel(&mut self, channel: Channel, value: Vec3) {
        match channel {
            Channel::Position => self.position = value,
            Channel::Rotation => {
                self.rotation = value;
                self.normalize_rotation();
            }
        }
    }

    pub fn normalize_rotation(&mut self) {
        self.rotation = Vec3::new(
            wrap_angle(self.rotation.x),
            wrap_angle(self.rotation.y),
            wrap_angle(self.rotation.z),
        );
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self { position: Vec3::ZERO, rotation: Vec3::ZERO }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    Model,
    Camera,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Position,
    Rotation,
}

/// One animated axis-group: at most one tween may own a slot at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Slot {
    pub node: Node,
    pub channel: Channel,
}

impl Slot {
    pub const MODEL_POSITION: Slot = Slot { node: Node::Model, channel: Channel::Position };
    pub const MODEL_ROTATION: Slot = Slot { node: Node::Model, channel: Channel::Rotation };
    pub const CAMERA_POSITION: Slot = Slot { node: Node::Camera, channel: Channel::Position };
    pub const CAMERA_ROTATION: Slot = Slot { node: Node::Camera, channel: Channel::Rotation };

    pub const ALL: [Slot; 4] =
        [Slot::MODEL_POSITION, Slot::MODEL_ROTATION, Slot::CAMERA_POSITION, Slot::CAMERA_ROTATION];

    pub(crate) fn index(self) -> usize {
        match (self.node, self.channel) {
            (Node::Model, Channel::Position) => 0,
            (Node::Model, Channel::Rotation) => 1,
            (Node::Camera, Channel::Position) => 2,
            (Node::Camera, Channel::Rotation) => 3,
        }
    }
}

/// The live transforms the render loop reads every frame.
#[derive(Debug, Clone, Default)]
pub struct SceneNodes {
    pub model: Transform,
    pub camera: Transform,
}

impl SceneNodes {
    pub fn new(model: Transform, camera: Transform) -> Self {
        Self { model, camera }
    }

    pub fn get(&self, node: Node) -> &Transform {
        match node {
            Node::Model => &self.model,
            Node::Camera => &self.camera,
        }
    }

    pub fn get_mut(&mut self, node: Node) -> &mut Transform {
        match node {
            Node::Model => &mut self.model,
            Node::Camera => &mut self.camera,
        }
    }

    pub fn read(&self, slot: Slot) -> Vec3 {
        self.get(slot.node).channel(slot.channel)
    }

    pub fn write(&mut self, slot: Slot, value: Vec3) {
        self.get_mut(slot.node).set_channel(slot.channel, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn rotation_writes_are_wrapped() {
        let mut nodes = SceneNodes::default();
        nodes.write(Slot::MODEL_ROTATION, Vec3::new(PI, 3.5 * PI, -PI));
        let rot = nodes.model.rotation;
        assert!((rot.x + PI).abs() < 1e-5, "PI wraps to -PI");
        assert!((rot.y + 0.5 * PI).abs() < 1e-4);
        assert!((rot.z + PI).abs() < 1e-5, "-PI is already in range");
    }

    #[test]
    fn position_writes_are_untouched() {
        let mut nodes = SceneNodes::default();
        nodes.write(Slot::CAMERA_POSITION, Vec3::new(10.0, -7.0, 4.0));
        assert_eq!(nodes.camera.position, Vec3::new(10.0, -7.0, 4.0));
    }

    #[test]
    fn slot_indices_are_distinct() {
        let mut seen = [false; 4];
        for slot in Slot::ALL {
            assert!(!seen[slot.index()]);
            seen[slot.index()] = true;
        }
    }
}
