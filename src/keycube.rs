use glam::Vec2;
use itertools::iproduct;

use crate::camera::{Camera, OrbitControls};
use crate::hover::{HoverTracker, HoverTransition};
use crate::layout::{Face, KeyTag, BASE_CUBE_COLOR, GRID_DIM, KEY_SIZE};
use crate::mesh::Mesh;
use crate::picking::{pick_nearest, pointer_ndc, Ray};
use crate::scene_graph::{Object3D, ObjectId, Scene, Transform};

/// Everything the demo mutates frame to frame: the scene graph, the camera
/// and its controls, the pointer, and the hover state. Owned by the window
/// driver and passed down explicitly; there is no global scene.
pub struct KeycubeState {
    pub scene: Scene,
    pub camera: Camera,
    pub orbit: OrbitControls,
    pub hover: HoverTracker,
    /// Last pointer position in physical pixels, None until the pointer
    /// first enters the window (or while a HUD widget captures it).
    pub pointer: Option<Vec2>,
    pub start_time: std::time::Instant,

    group: ObjectId,
    base: ObjectId,
}

impl KeycubeState {
    pub fn new() -> Self {
        let camera = Camera {
            eye: glam::Vec3::new(2.0, 2.0, 4.0),
            target: glam::Vec3::ZERO,
            up: glam::Vec3::Y,
            fov_y: 25f32.to_radians(),
            near: 0.1,
            far: 1000.0,
        };

        let mut scene = Scene::new();
        let (group, base) = build_keycube(&mut scene);

        Self {
            scene,
            camera,
            orbit: OrbitControls::new(),
            hover: HoverTracker::new(),
            pointer: None,
            start_time: std::time::Instant::now(),
            group,
            base,
        }
    }

    /// Applies the damped orbit motion for this frame.
    pub fn update(&mut self) {
        self.orbit.update(&mut self.camera);
    }

    /// Raycasts the current pointer against the keycube and advances the
    /// hover state machine. World transforms must be up to date.
    pub fn update_hover(&mut self, resolution: Vec2) -> Option<HoverTransition> {
        let hit = self.raycast_key(resolution);
        self.hover.update(&mut self.scene, hit)
    }

    fn raycast_key(&self, resolution: Vec2) -> Option<ObjectId> {
        if resolution.x <= 0.0 || resolution.y <= 0.0 {
            return None;
        }
        let pointer = self.pointer?;

        let ndc = pointer_ndc(pointer, resolution);
        let ray = Ray::from_camera(&self.camera, ndc, resolution);

        // The base cube occludes keys behind it but is never hovered itself.
        pick_nearest(&self.scene, self.group, &ray)
            .map(|(id, _)| id)
            .filter(|id| *id != self.base)
    }
}

/// Builds the keycube assembly: a mesh-less group root, the base cube, and
/// one key per face grid cell, all sharing a single unit cube mesh.
fn build_keycube(scene: &mut Scene) -> (ObjectId, ObjectId) {
    let cube_mesh = scene.add_mesh(Mesh::cube("Cube", 1.0));

    let group = scene.add_object(Object3D {
        name: "Keycube".to_string(),
        ..Default::default()
    });

    let base = scene.add_object(Object3D {
        name: "Base".to_string(),
        mesh_id: Some(cube_mesh),
        color: BASE_CUBE_COLOR,
        base_color: BASE_CUBE_COLOR,
        ..Default::default()
    });
    scene.set_object_parent(base, Some(group));

    for (face, i, j) in iproduct!(Face::ALL, 0..GRID_DIM, 0..GRID_DIM) {
        let tag = KeyTag::new(face, i, j);
        let color = face.color();

        let key = scene.add_object(Object3D {
            name: tag.id(),
            transform: Transform::from_translation_scale(face.key_position(i, j), KEY_SIZE),
            mesh_id: Some(cube_mesh),
            color,
            base_color: color,
            key: Some(tag),
            ..Default::default()
        });
        scene.set_object_parent(key, Some(group));
    }

    (group, base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use std::collections::HashSet;

    use crate::hover::HIGHLIGHT_COLOR;

    #[test]
    fn the_assembly_has_eighty_keys_with_unique_tags() {
        let state = KeycubeState::new();

        let tags: Vec<KeyTag> = state
            .scene
            .objects
            .iter()
            .filter_map(|(_, object)| object.key)
            .collect();

        assert_eq!(tags.len(), 80);

        let unique: HashSet<(Face, u8)> = tags.iter().map(|tag| (tag.face, tag.index)).collect();
        assert_eq!(unique.len(), 80);

        for face in Face::ALL {
            let indices: HashSet<u8> = tags
                .iter()
                .filter(|tag| tag.face == face)
                .map(|tag| tag.index)
                .collect();
            assert_eq!(indices, (1..=16).collect());
        }
    }

    #[test]
    fn the_group_owns_the_base_and_every_key() {
        let state = KeycubeState::new();
        let group = state.scene.get_object(state.group).unwrap();

        assert_eq!(group.child_ids.len(), 81);
        assert!(group.mesh_id.is_none());
        assert_eq!(state.scene.get_object(state.base).unwrap().base_color, BASE_CUBE_COLOR);
    }

    #[test]
    fn the_highlight_color_collides_with_no_base_color() {
        assert_ne!(HIGHLIGHT_COLOR, BASE_CUBE_COLOR);
        for face in Face::ALL {
            assert_ne!(HIGHLIGHT_COLOR, face.color());
        }
    }

    #[test]
    fn a_ray_into_the_right_face_picks_r5() {
        let mut state = KeycubeState::new();
        state.scene.update_transforms();

        // R5 sits at (0.5, -0.1, -0.3); approach it head-on from +X.
        let ray = Ray {
            origin: Vec3::new(3.0, -0.1, -0.3),
            dir: Vec3::NEG_X,
        };
        let (hit, _) = pick_nearest(&state.scene, state.group, &ray).unwrap();
        assert_eq!(state.scene.get_object(hit).unwrap().name, "R5");
    }

    #[test]
    fn a_ray_through_a_face_center_reaches_only_the_base_cube() {
        let mut state = KeycubeState::new();
        state.scene.update_transforms();

        // The grid leaves a gap at the exact face center.
        let ray = Ray {
            origin: Vec3::new(0.0, 0.0, 3.0),
            dir: Vec3::NEG_Z,
        };
        let (hit, _) = pick_nearest(&state.scene, state.group, &ray).unwrap();
        assert_eq!(hit, state.base);
    }

    #[test]
    fn hovering_r5_end_to_end() {
        let mut state = KeycubeState::new();
        state.scene.update_transforms();

        // Aim the camera straight at R5 so the viewport center hits it.
        state.camera.eye = Vec3::new(3.0, -0.1, -0.3);
        state.camera.target = Vec3::new(0.5, -0.1, -0.3);

        let resolution = Vec2::new(800.0, 600.0);
        state.pointer = Some(Vec2::new(400.0, 300.0));

        let r5 = state.scene.get_object_by_name("R5").unwrap();
        assert_eq!(
            state.update_hover(resolution),
            Some(HoverTransition::Enter(r5))
        );
        assert_eq!(state.scene.get_object(r5).unwrap().color, HIGHLIGHT_COLOR);

        // Pointer leaves every key: the highlight reverts to red.
        state.pointer = None;
        assert_eq!(
            state.update_hover(resolution),
            Some(HoverTransition::Leave(r5))
        );
        assert_eq!(
            state.scene.get_object(r5).unwrap().color,
            Face::Right.color()
        );
    }

    #[test]
    fn hovering_is_stable_across_frames() {
        let mut state = KeycubeState::new();
        state.scene.update_transforms();

        state.camera.eye = Vec3::new(3.0, -0.1, -0.3);
        state.camera.target = Vec3::new(0.5, -0.1, -0.3);

        let resolution = Vec2::new(800.0, 600.0);
        state.pointer = Some(Vec2::new(400.0, 300.0));

        assert!(state.update_hover(resolution).is_some());
        assert_eq!(state.update_hover(resolution), None);
        assert_eq!(state.update_hover(resolution), None);
    }
}
