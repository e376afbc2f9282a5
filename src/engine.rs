use glam::Vec2;

use crate::keycube::KeycubeState;

/// Advances one frame of simulation: orbit damping, world transforms, the
/// hover raycast, and the HUD. Rendering happens afterwards in the renderer.
pub fn update(
    state: &mut KeycubeState,
    resolution: Vec2,
    ui: &mut imgui::Ui,
) -> anyhow::Result<()> {
    state.update();
    state.scene.update_transforms();

    state.update_hover(resolution);

    draw_hud(state, ui);

    Ok(())
}

fn draw_hud(state: &KeycubeState, ui: &mut imgui::Ui) {
    let hovered = state
        .hover
        .hovered()
        .and_then(|id| state.scene.get_object(id))
        .map(|object| object.name.as_str())
        .unwrap_or("-");
    let framerate = ui.io().framerate;

    ui.window("Keycube")
        .position([16.0, 16.0], imgui::Condition::FirstUseEver)
        .size([200.0, 80.0], imgui::Condition::FirstUseEver)
        .build(|| {
            ui.text(format!("Hovered key: {}", hovered));
            ui.text(format!("{:.1} fps", framerate));
        });
}
