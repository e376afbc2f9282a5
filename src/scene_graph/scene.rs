use glam::{Mat4, Vec3};
use id_arena::Arena;

use crate::mesh::{Mesh, MeshId};
use crate::scene_graph::object3d::{Object3D, ObjectId};

pub struct Scene {
    pub objects: Arena<Object3D>,
    pub meshes: Arena<Mesh>,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            objects: Arena::new(),
            meshes: Arena::new(),
        }
    }

    pub fn add_object(&mut self, object: Object3D) -> ObjectId {
        self.objects.alloc(object)
    }

    pub fn get_object(&self, id: ObjectId) -> Option<&Object3D> {
        self.objects.get(id)
    }

    #[allow(dead_code)]
    pub fn get_object_by_name(&self, name: &str) -> Option<ObjectId> {
        self.objects
            .iter()
            .find(|(_, object)| object.name == name)
            .map(|(id, _)| id)
    }

    pub fn add_mesh(&mut self, mesh: Mesh) -> MeshId {
        self.meshes.alloc(mesh)
    }

    pub fn get_mesh(&self, id: MeshId) -> Option<&Mesh> {
        self.meshes.get(id)
    }

    pub fn set_object_color(&mut self, id: ObjectId, color: Vec3) {
        if let Some(object) = self.objects.get_mut(id) {
            object.color = color;
        }
    }

    /// Updates all object transforms in hierarchical order
    pub fn update_transforms(&self) {
        let root_objects = self.objects.iter().filter_map(|(id, object)| {
            if object.parent_id.is_none() {
                Some(id)
            } else {
                None
            }
        });

        for root_id in root_objects {
            self.update_object_transform_recursive(root_id, Mat4::IDENTITY);
        }
    }

    /// Recursively updates an object's world transform and its children
    fn update_object_transform_recursive(&self, object_id: ObjectId, parent_world_matrix: Mat4) {
        if let Some(object) = self.objects.get(object_id) {
            if object.transform.is_world_dirty() {
                let local_matrix = *object.transform.get_local_matrix();
                let world_matrix = parent_world_matrix * local_matrix;
                object.transform.set_world_matrix(world_matrix);
            }

            let world_matrix = *object.transform.get_world_matrix();
            for &child_id in &object.child_ids {
                self.update_object_transform_recursive(child_id, world_matrix);
            }
        }
    }

    /// Invalidates world transforms for an object and all its descendants
    pub fn invalidate_object_hierarchy(&self, object_id: ObjectId) {
        if let Some(object) = self.objects.get(object_id) {
            object.transform.invalidate_world();

            for &child_id in &object.child_ids {
                self.invalidate_object_hierarchy(child_id);
            }
        }
    }

    /// Sets the parent of an object and updates child relationships
    pub fn set_object_parent(&mut self, child_id: ObjectId, new_parent_id: Option<ObjectId>) {
        if let Some(child) = self.objects.get(child_id) {
            if let Some(old_parent_id) = child.parent_id {
                if let Some(old_parent) = self.objects.get_mut(old_parent_id) {
                    old_parent.child_ids.retain(|&id| id != child_id);
                }
            }
        }

        if let Some(child) = self.objects.get_mut(child_id) {
            child.parent_id = new_parent_id;

            if let Some(new_parent_id) = new_parent_id {
                if let Some(new_parent) = self.objects.get_mut(new_parent_id) {
                    new_parent.child_ids.push(child_id);
                }
            }
        }

        self.invalidate_object_hierarchy(child_id);
    }

    #[allow(dead_code)]
    pub fn set_object_translation(&mut self, object_id: ObjectId, translation: Vec3) {
        if let Some(object) = self.objects.get_mut(object_id) {
            object.transform.set_translation(translation);
        }
        self.invalidate_object_hierarchy(object_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    use crate::scene_graph::transform::Transform;

    fn object_at(name: &str, translation: Vec3) -> Object3D {
        Object3D {
            name: name.to_string(),
            transform: Transform::from_translation(translation),
            ..Default::default()
        }
    }

    #[test]
    fn parenting_rewires_child_lists() {
        let mut scene = Scene::new();
        let root = scene.add_object(object_at("root", Vec3::ZERO));
        let child = scene.add_object(object_at("child", Vec3::X));

        scene.set_object_parent(child, Some(root));
        assert_eq!(scene.get_object(root).unwrap().child_ids, vec![child]);
        assert_eq!(scene.get_object(child).unwrap().parent_id, Some(root));

        let other = scene.add_object(object_at("other", Vec3::ZERO));
        scene.set_object_parent(child, Some(other));
        assert!(scene.get_object(root).unwrap().child_ids.is_empty());
        assert_eq!(scene.get_object(other).unwrap().child_ids, vec![child]);
    }

    #[test]
    fn world_transforms_compose_through_the_hierarchy() {
        let mut scene = Scene::new();
        let root = scene.add_object(object_at("root", Vec3::new(1.0, 0.0, 0.0)));
        let child = scene.add_object(object_at("child", Vec3::new(0.0, 2.0, 0.0)));
        scene.set_object_parent(child, Some(root));

        scene.update_transforms();

        let world = *scene.get_object(child).unwrap().transform.get_world_matrix();
        assert_eq!(
            world.transform_point3(Vec3::ZERO),
            Vec3::new(1.0, 2.0, 0.0)
        );
    }

    #[test]
    fn moving_a_parent_updates_descendants() {
        let mut scene = Scene::new();
        let root = scene.add_object(object_at("root", Vec3::ZERO));
        let child = scene.add_object(object_at("child", Vec3::Z));
        scene.set_object_parent(child, Some(root));
        scene.update_transforms();

        scene.set_object_translation(root, Vec3::new(0.0, 5.0, 0.0));
        scene.update_transforms();

        let world = *scene.get_object(child).unwrap().transform.get_world_matrix();
        assert_eq!(
            world.transform_point3(Vec3::ZERO),
            Vec3::new(0.0, 5.0, 1.0)
        );
    }

    #[test]
    fn lookup_by_name_finds_objects() {
        let mut scene = Scene::new();
        let id = scene.add_object(object_at("R5", Vec3::ZERO));
        assert_eq!(scene.get_object_by_name("R5"), Some(id));
        assert_eq!(scene.get_object_by_name("R17"), None);
    }
}
