use glam::DVec3;

/// A 3D landmark of the sparse map.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MapPoint {
    position: DVec3,
}

impl MapPoint {
    /// Create a map point at `position`.
    pub fn new(position: DVec3) -> Self {
        Self { position }
    }

    /// Position of the landmark.
    pub fn position(&self) -> DVec3 {
        self.position
    }

    /// Move the landmark.
    pub fn set_position(&mut self, position: DVec3) {
        self.position = position;
    }
}

impl From<DVec3> for MapPoint {
    fn from(position: DVec3) -> Self {
        Self::new(position)
    }
}
