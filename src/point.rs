use glam::{U8Vec4, Vec3};

/// One decoded point record.
///
/// Positions are world-space; no recentring is applied, callers wanting
/// origin-relative coordinates subtract the cloud bounding-box minimum
/// themselves. `intensity` is carried in the record but not decoded by this
/// reader.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PotreePoint {
    pub position: Vec3,
    pub intensity: u16,
    pub classification: i8,
    pub color: U8Vec4,
}
