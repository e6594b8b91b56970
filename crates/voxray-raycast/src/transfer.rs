//! Transfer-function thresholds and light position.
//!
//! Both are plain value stores: setters keep exactly what they are given (no
//! clamping, no `min <= max` check) and report that a redraw is needed.

use glam::Vec3;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Channel {
    Red,
    Green,
    Blue,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Red, Channel::Green, Channel::Blue];

    fn index(self) -> usize {
        match self {
            Channel::Red => 0,
            Channel::Green => 1,
            Channel::Blue => 2,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Bound {
    Min,
    Max,
}

impl Bound {
    fn index(self) -> usize {
        match self {
            Bound::Min => 0,
            Bound::Max => 1,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// Shader uniform names, indexed `[channel][bound]`.
const THRESHOLD_UNIFORMS: [[&str; 2]; 3] = [
    ["red_min", "red_max"],
    ["green_min", "green_max"],
    ["blue_min", "blue_max"],
];

pub const LIGHT_UNIFORM: &str = "light_pos";

/// Marker returned by state setters: the next frame must be rendered.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[must_use]
pub struct RedrawNeeded;

/// Six per-channel intensity thresholds.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TransferFunction {
    thresholds: [[f32; 2]; 3],
}

impl Default for TransferFunction {
    fn default() -> Self {
        Self {
            thresholds: [[0.0, 0.3], [0.3, 0.6], [0.6, 1.0]],
        }
    }
}

impl TransferFunction {
    pub fn set_threshold(&mut self, channel: Channel, bound: Bound, value: f32) -> RedrawNeeded {
        self.thresholds[channel.index()][bound.index()] = value;
        log::debug!("threshold {} = {value}", Self::uniform_name(channel, bound));
        RedrawNeeded
    }

    pub fn threshold(&self, channel: Channel, bound: Bound) -> f32 {
        self.thresholds[channel.index()][bound.index()]
    }

    pub fn uniform_name(channel: Channel, bound: Bound) -> &'static str {
        THRESHOLD_UNIFORMS[channel.index()][bound.index()]
    }

    /// The six `(uniform name, value)` pairs in red/green/blue, min/max order.
    pub fn uniforms(&self) -> impl Iterator<Item = (&'static str, f32)> + '_ {
        Channel::ALL.into_iter().flat_map(move |c| {
            [Bound::Min, Bound::Max]
                .into_iter()
                .map(move |b| (Self::uniform_name(c, b), self.threshold(c, b)))
        })
    }
}

/// Point light used by the raycaster's shading.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Light {
    pub position: Vec3,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            position: Vec3::new(1.0, 2.0, -2.0),
        }
    }
}

impl Light {
    pub fn set_axis(&mut self, axis: Axis, value: f32) -> RedrawNeeded {
        match axis {
            Axis::X => self.position.x = value,
            Axis::Y => self.position.y = value,
            Axis::Z => self.position.z = value,
        }
        log::debug!("{LIGHT_UNIFORM}.{axis:?} = {value}");
        RedrawNeeded
    }

    pub fn axis(&self, axis: Axis) -> f32 {
        match axis {
            Axis::X => self.position.x,
            Axis::Y => self.position.y,
            Axis::Z => self.position.z,
        }
    }
}
