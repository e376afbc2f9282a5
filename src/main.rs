use anyhow::Result;

mod camera;
mod engine;
mod global_uniform;
mod hover;
mod keycube;
mod layout;
mod mesh;
mod passes;
mod picking;
mod render_common;
mod renderer;
mod scene_graph;
mod shader_loader;
mod texture;
mod window;

fn main() -> Result<()> {
    pretty_env_logger::init();

    pollster::block_on(window::run())?;

    Ok(())
}
