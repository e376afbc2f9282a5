use glam::Vec3;

/// Edge length of a single key cube.
pub const KEY_SIZE: f32 = 0.15;
/// Distance between neighboring key centers on a face.
pub const KEY_SPACING: f32 = 0.20;
/// Distance from the assembly center to a face plane.
pub const FACE_OFFSET: f32 = 0.5;
/// Keys per face edge (faces carry a GRID_DIM x GRID_DIM grid).
pub const GRID_DIM: usize = 4;

/// Base cube tint (#D2B48C).
pub const BASE_CUBE_COLOR: Vec3 = Vec3::new(0.824, 0.706, 0.549);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// One of the five modeled faces of the keycube. The back face (-Z) does not
/// exist in the model; the default camera framing never shows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Face {
    Top,
    Bottom,
    Right,
    Left,
    Front,
}

impl Face {
    pub const ALL: [Face; 5] = [
        Face::Top,
        Face::Bottom,
        Face::Right,
        Face::Left,
        Face::Front,
    ];

    pub fn axis(self) -> Axis {
        match self {
            Face::Top | Face::Bottom => Axis::Y,
            Face::Right | Face::Left => Axis::X,
            Face::Front => Axis::Z,
        }
    }

    pub fn sign(self) -> f32 {
        match self {
            Face::Top | Face::Right | Face::Front => 1.0,
            Face::Bottom | Face::Left => -1.0,
        }
    }

    /// Base key color for this face (CSS named colors of the original theme).
    pub fn color(self) -> Vec3 {
        match self {
            Face::Top => Vec3::new(1.0, 1.0, 0.0),
            Face::Bottom => Vec3::new(1.0, 1.0, 1.0),
            Face::Right => Vec3::new(1.0, 0.0, 0.0),
            Face::Left => Vec3::new(0.0, 0.0, 1.0),
            Face::Front => Vec3::new(0.0, 0.502, 0.0),
        }
    }

    pub fn prefix(self) -> char {
        match self {
            Face::Top => 'Y',
            Face::Bottom => 'W',
            Face::Right => 'R',
            Face::Left => 'B',
            Face::Front => 'G',
        }
    }

    /// Position of the (i, j) key center on this face, in keycube-local
    /// coordinates. The key sits on the face plane `axis = FACE_OFFSET * sign`,
    /// spread across the plane with KEY_SPACING and centered on the face.
    pub fn key_position(self, i: usize, j: usize) -> Vec3 {
        let u = (i as f32 - 1.5) * KEY_SPACING;
        let v = (j as f32 - 1.5) * KEY_SPACING;
        let offset = FACE_OFFSET * self.sign();

        match self.axis() {
            Axis::Y => Vec3::new(u, offset, v),
            Axis::X => Vec3::new(offset, u, v),
            Axis::Z => Vec3::new(u, v, offset),
        }
    }
}

/// Row-major key number within a face, 1..=16. This ordering is a fixed policy;
/// key ids are stable identifiers and must not change between sessions.
pub fn key_index(i: usize, j: usize) -> u8 {
    (i * GRID_DIM + j + 1) as u8
}

/// Identity of a single key: its face and its 1-based row-major index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyTag {
    pub face: Face,
    pub index: u8,
}

impl KeyTag {
    pub fn new(face: Face, i: usize, j: usize) -> Self {
        Self {
            face,
            index: key_index(i, j),
        }
    }

    /// Human-readable id, e.g. "R5" for the fifth key of the right face.
    pub fn id(&self) -> String {
        format!("{}{}", self.face.prefix(), self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::iproduct;

    fn plane_coordinate(face: Face, position: Vec3) -> f32 {
        match face.axis() {
            Axis::X => position.x,
            Axis::Y => position.y,
            Axis::Z => position.z,
        }
    }

    fn in_plane_coordinates(face: Face, position: Vec3) -> (f32, f32) {
        match face.axis() {
            Axis::X => (position.y, position.z),
            Axis::Y => (position.x, position.z),
            Axis::Z => (position.x, position.y),
        }
    }

    #[test]
    fn keys_lie_on_their_face_plane() {
        for (face, i, j) in iproduct!(Face::ALL, 0..GRID_DIM, 0..GRID_DIM) {
            let position = face.key_position(i, j);
            assert_eq!(plane_coordinate(face, position), FACE_OFFSET * face.sign());
        }
    }

    #[test]
    fn keys_spread_across_the_face_grid() {
        for (face, i, j) in iproduct!(Face::ALL, 0..GRID_DIM, 0..GRID_DIM) {
            let (u, v) = in_plane_coordinates(face, face.key_position(i, j));
            assert_eq!(u, (i as f32 - 1.5) * KEY_SPACING);
            assert_eq!(v, (j as f32 - 1.5) * KEY_SPACING);
        }
    }

    #[test]
    fn key_index_is_row_major_from_one() {
        assert_eq!(key_index(0, 0), 1);
        assert_eq!(key_index(0, 3), 4);
        assert_eq!(key_index(1, 0), 5);
        assert_eq!(key_index(3, 3), 16);
    }

    #[test]
    fn key_ids_combine_prefix_and_index() {
        assert_eq!(KeyTag::new(Face::Right, 1, 0).id(), "R5");
        assert_eq!(KeyTag::new(Face::Top, 0, 0).id(), "Y1");
        assert_eq!(KeyTag::new(Face::Front, 3, 3).id(), "G16");
    }

    #[test]
    fn face_colors_are_distinct() {
        for a in Face::ALL {
            for b in Face::ALL {
                if a != b {
                    assert_ne!(a.color(), b.color());
                }
            }
        }
    }
}
