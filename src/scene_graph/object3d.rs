use glam::Vec3;
use id_arena::Id;

use crate::layout::KeyTag;
use crate::mesh::MeshId;
use crate::scene_graph::transform::Transform;

pub type ObjectId = Id<Object3D>;

/// A node in the scene graph. Key objects additionally carry their `KeyTag`
/// and keep `base_color` around so a hover highlight can be undone exactly.
pub struct Object3D {
    pub name: String,
    pub transform: Transform,
    pub mesh_id: Option<MeshId>,
    /// Color the object is drawn with this frame.
    pub color: Vec3,
    /// Color the object reverts to when it is not highlighted.
    pub base_color: Vec3,
    pub key: Option<KeyTag>,
    pub parent_id: Option<ObjectId>,
    pub child_ids: Vec<ObjectId>,
}

impl Default for Object3D {
    fn default() -> Self {
        Self {
            name: String::new(),
            transform: Transform::default(),
            mesh_id: None,
            color: Vec3::ONE,
            base_color: Vec3::ONE,
            key: None,
            parent_id: None,
            child_ids: Vec::new(),
        }
    }
}
