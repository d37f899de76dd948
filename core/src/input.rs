use serde::{Deserialize, Serialize};

use crate::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Device {
    Mouse,
    Touch,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Button {
    Primary,
    Secondary,
}

/// Pointer position in whatever units the host reports, usually CSS pixels.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_squared(self, other: Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

/// A press that has not been released yet.
#[derive(Debug)]
pub(crate) struct PendingPress<H> {
    pub(crate) coords: Coord2,
    pub(crate) device: Device,
    pub(crate) origin: Point,
    pub(crate) long_press: Option<H>,
    /// Already handled by a long-press, or abandoned by dragging.
    pub(crate) resolved: bool,
}

impl<H> PendingPress<H> {
    pub(crate) fn new(coords: Coord2, device: Device, origin: Point, long_press: Option<H>) -> Self {
        Self {
            coords,
            device,
            origin,
            long_press,
            resolved: false,
        }
    }

    pub(crate) fn has_drifted(&self, position: Point, tolerance: f32) -> bool {
        self.origin.distance_squared(position) > tolerance * tolerance
    }
}
