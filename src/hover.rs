use glam::Vec3;

use crate::scene_graph::{ObjectId, Scene};

/// Highlight tint for the hovered key (#D3D3D3). Distinct from every face
/// color and from the base cube tint, so restoring is unambiguous.
pub const HIGHLIGHT_COLOR: Vec3 = Vec3::new(0.827, 0.827, 0.827);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoverTransition {
    Enter(ObjectId),
    Switch { from: ObjectId, to: ObjectId },
    Leave(ObjectId),
}

/// Tracks which key the pointer is over. At most one key is highlighted at a
/// time; the previous key's base color is restored before anything else is
/// tinted.
#[derive(Debug, Default)]
pub struct HoverTracker {
    hovered: Option<ObjectId>,
}

impl HoverTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hovered(&self) -> Option<ObjectId> {
        self.hovered
    }

    /// Feeds one frame's raycast result. Returns the transition taken, or
    /// None when the hovered key is unchanged (no color writes happen then).
    pub fn update(&mut self, scene: &mut Scene, hit: Option<ObjectId>) -> Option<HoverTransition> {
        if self.hovered == hit {
            return None;
        }

        if let Some(previous) = self.hovered {
            if let Some(base_color) = scene.get_object(previous).map(|object| object.base_color) {
                scene.set_object_color(previous, base_color);
            }
        }

        if let Some(next) = hit {
            scene.set_object_color(next, HIGHLIGHT_COLOR);
            if let Some(object) = scene.get_object(next) {
                log::debug!("Hovered key: {}", object.name);
            }
        }

        let transition = match (self.hovered, hit) {
            (None, Some(to)) => HoverTransition::Enter(to),
            (Some(from), Some(to)) => HoverTransition::Switch { from, to },
            (Some(from), None) => HoverTransition::Leave(from),
            (None, None) => unreachable!("equal states are returned above"),
        };

        self.hovered = hit;
        Some(transition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    use crate::scene_graph::{Object3D, Scene};

    fn key_object(name: &str, base_color: Vec3) -> Object3D {
        Object3D {
            name: name.to_string(),
            color: base_color,
            base_color,
            ..Default::default()
        }
    }

    fn highlighted_count(scene: &Scene) -> usize {
        scene
            .objects
            .iter()
            .filter(|(_, object)| object.color == HIGHLIGHT_COLOR)
            .count()
    }

    #[test]
    fn entering_highlights_the_key() {
        let mut scene = Scene::new();
        let red = Vec3::new(1.0, 0.0, 0.0);
        let key = scene.add_object(key_object("R5", red));

        let mut tracker = HoverTracker::new();
        assert_eq!(
            tracker.update(&mut scene, Some(key)),
            Some(HoverTransition::Enter(key))
        );
        assert_eq!(scene.get_object(key).unwrap().color, HIGHLIGHT_COLOR);
        assert_eq!(tracker.hovered(), Some(key));
    }

    #[test]
    fn leaving_restores_the_exact_base_color() {
        let mut scene = Scene::new();
        let red = Vec3::new(1.0, 0.0, 0.0);
        let key = scene.add_object(key_object("R5", red));

        let mut tracker = HoverTracker::new();
        tracker.update(&mut scene, Some(key));
        assert_eq!(
            tracker.update(&mut scene, None),
            Some(HoverTransition::Leave(key))
        );
        assert_eq!(scene.get_object(key).unwrap().color, red);
        assert_eq!(tracker.hovered(), None);
    }

    #[test]
    fn switching_restores_the_old_key_first() {
        let mut scene = Scene::new();
        let red = Vec3::new(1.0, 0.0, 0.0);
        let blue = Vec3::new(0.0, 0.0, 1.0);
        let a = scene.add_object(key_object("R1", red));
        let b = scene.add_object(key_object("B1", blue));

        let mut tracker = HoverTracker::new();
        tracker.update(&mut scene, Some(a));
        assert_eq!(
            tracker.update(&mut scene, Some(b)),
            Some(HoverTransition::Switch { from: a, to: b })
        );

        assert_eq!(scene.get_object(a).unwrap().color, red);
        assert_eq!(scene.get_object(b).unwrap().color, HIGHLIGHT_COLOR);
        assert_eq!(highlighted_count(&scene), 1);
    }

    #[test]
    fn repeated_hits_are_no_ops() {
        let mut scene = Scene::new();
        let key = scene.add_object(key_object("G3", Vec3::new(0.0, 0.502, 0.0)));

        let mut tracker = HoverTracker::new();
        assert!(tracker.update(&mut scene, Some(key)).is_some());
        assert_eq!(tracker.update(&mut scene, Some(key)), None);
        assert_eq!(tracker.update(&mut scene, Some(key)), None);

        assert!(tracker.update(&mut scene, None).is_some());
        assert_eq!(tracker.update(&mut scene, None), None);
    }

    #[test]
    fn at_most_one_key_is_highlighted_over_any_sequence() {
        let mut scene = Scene::new();
        let colors = [
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(1.0, 1.0, 0.0),
        ];
        let keys: Vec<_> = colors
            .iter()
            .enumerate()
            .map(|(index, color)| scene.add_object(key_object(&format!("K{index}"), *color)))
            .collect();

        let mut tracker = HoverTracker::new();
        let sequence = [
            Some(keys[0]),
            Some(keys[0]),
            Some(keys[1]),
            None,
            Some(keys[2]),
            Some(keys[1]),
            None,
            None,
        ];

        for hit in sequence {
            tracker.update(&mut scene, hit);
            assert!(highlighted_count(&scene) <= 1);
        }

        // Everything released: all base colors are back untouched.
        for (key, color) in keys.iter().zip(colors) {
            assert_eq!(scene.get_object(*key).unwrap().color, color);
        }
    }
}
