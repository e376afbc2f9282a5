use glam::{Mat4, Vec2, Vec3};
use wgpu::util::DeviceExt;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};

#[derive(Debug, Clone)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    pub fn projection_matrix(&self, aspect_ratio: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, aspect_ratio, self.near, self.far)
    }

    pub fn view_projection(&self, resolution: Vec2) -> Mat4 {
        self.projection_matrix(resolution.x / resolution.y) * self.view_matrix()
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable, Default)]
pub struct CameraUniform {
    view_proj: Mat4,
}

impl CameraUniform {
    pub fn update(&mut self, resolution: winit::dpi::PhysicalSize<u32>, camera: &Camera) {
        self.view_proj =
            camera.view_projection(Vec2::new(resolution.width as f32, resolution.height as f32));
    }

    pub fn create_buffer(&self, device: &wgpu::Device) -> wgpu::Buffer {
        device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Uniform Buffer"),
            contents: bytemuck::cast_slice(&[*self]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        })
    }

    pub fn update_buffer(&self, queue: &wgpu::Queue, buffer: &wgpu::Buffer) {
        queue.write_buffer(buffer, 0, bytemuck::cast_slice(&[*self]));
    }
}

const ROTATE_SPEED: f32 = 0.002;
/// Fraction of the orbit velocity shed every tick.
const DAMPING: f32 = 0.15;
const VELOCITY_EPSILON: f32 = 1e-5;
const ZOOM_STEP: f32 = 1.20;
/// Keep the view direction off the poles so the orbit never flips over.
const MAX_PITCH_Y: f32 = 0.995;

/// Damped orbit controls around the camera target: dragging with the left
/// button feeds angular velocity that decays over the following frames, the
/// wheel dollies in and out within distance clamps.
pub struct OrbitControls {
    dragging: bool,
    last_cursor: Option<Vec2>,
    yaw_velocity: f32,
    pitch_velocity: f32,
}

impl OrbitControls {
    pub fn new() -> Self {
        Self {
            dragging: false,
            last_cursor: None,
            yaw_velocity: 0.0,
            pitch_velocity: 0.0,
        }
    }

    pub fn handle_event(&mut self, event: &WindowEvent, camera: &mut Camera) {
        match event {
            WindowEvent::MouseInput { button, state, .. } => {
                if *button == MouseButton::Left {
                    self.set_dragging(*state == ElementState::Pressed);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor_moved(Vec2::new(position.x as f32, position.y as f32));
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let scroll_delta = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => (pos.y as f32) / 120.0,
                };
                self.dolly(scroll_delta, camera);
            }
            _ => {}
        }
    }

    pub fn set_dragging(&mut self, dragging: bool) {
        self.dragging = dragging;
    }

    pub fn cursor_moved(&mut self, position: Vec2) {
        if let Some(last) = self.last_cursor {
            if self.dragging {
                let delta = position - last;
                self.yaw_velocity += delta.x * ROTATE_SPEED;
                self.pitch_velocity += delta.y * ROTATE_SPEED;
            }
        }
        self.last_cursor = Some(position);
    }

    pub fn dolly(&mut self, delta: f32, camera: &mut Camera) {
        let scale = ZOOM_STEP.powf(-delta);

        let mut offset = camera.eye - camera.target;
        if offset.length() < 1e-6 {
            offset = Vec3::Z * (camera.near * 4.0);
        }

        offset *= scale;

        let min_distance = (camera.near * 2.0).max(0.10);
        let max_distance = (camera.far * 0.90).max(min_distance);
        let distance = offset.length();

        if distance < min_distance {
            offset = offset.normalize_or_zero() * min_distance;
        } else if distance > max_distance {
            offset = offset.normalize_or_zero() * max_distance;
        }

        camera.eye = camera.target + offset;
    }

    /// Applies and decays the pending orbit velocity. Called once per frame.
    pub fn update(&mut self, camera: &mut Camera) {
        if self.yaw_velocity.abs() > VELOCITY_EPSILON
            || self.pitch_velocity.abs() > VELOCITY_EPSILON
        {
            self.orbit(camera, self.yaw_velocity, self.pitch_velocity);
        }

        self.yaw_velocity *= 1.0 - DAMPING;
        self.pitch_velocity *= 1.0 - DAMPING;

        if self.yaw_velocity.abs() <= VELOCITY_EPSILON {
            self.yaw_velocity = 0.0;
        }
        if self.pitch_velocity.abs() <= VELOCITY_EPSILON {
            self.pitch_velocity = 0.0;
        }
    }

    fn orbit(&self, camera: &mut Camera, yaw: f32, pitch: f32) {
        let to_target = (camera.target - camera.eye).normalize_or_zero();
        let right = to_target.cross(camera.up).normalize_or_zero();

        let mut dir = Mat4::from_axis_angle(camera.up, -yaw).transform_vector3(to_target);
        dir = Mat4::from_axis_angle(right, -pitch).transform_vector3(dir);

        if dir.y.abs() > MAX_PITCH_Y {
            let horizontal = Vec2::new(dir.x, dir.z).normalize_or_zero()
                * (1.0 - MAX_PITCH_Y * MAX_PITCH_Y).sqrt();
            if horizontal.length_squared() > 0.0 {
                dir = Vec3::new(horizontal.x, dir.y.signum() * MAX_PITCH_Y, horizontal.y);
            }
        }
        let dir = dir.normalize_or_zero();

        let distance = (camera.eye - camera.target).length();
        camera.eye = camera.target - dir * distance;
    }
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_camera() -> Camera {
        Camera {
            eye: Vec3::new(2.0, 2.0, 4.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y: 25f32.to_radians(),
            near: 0.1,
            far: 1000.0,
        }
    }

    #[test]
    fn projection_aspect_follows_the_viewport() {
        let camera = test_camera();

        let proj = camera.projection_matrix(1024.0 / 768.0);
        // Horizontal scale is the vertical scale divided by the aspect ratio.
        assert!((proj.x_axis.x * (1024.0 / 768.0) - proj.y_axis.y).abs() < 1e-5);

        let before = camera.view_projection(Vec2::new(800.0, 600.0));
        let after = camera.view_projection(Vec2::new(1024.0, 768.0));
        assert_ne!(before, after);
    }

    #[test]
    fn resizing_to_the_same_aspect_keeps_the_projection() {
        let camera = test_camera();
        let a = camera.projection_matrix(800.0 / 600.0);
        let b = camera.projection_matrix(1024.0 / 768.0);
        assert!((a.x_axis.x - b.x_axis.x).abs() < 1e-6);
        assert!((a.y_axis.y - b.y_axis.y).abs() < 1e-6);
    }

    #[test]
    fn orbiting_preserves_the_distance_to_the_target() {
        let mut camera = test_camera();
        let distance = (camera.eye - camera.target).length();

        let mut controls = OrbitControls::new();
        controls.set_dragging(true);
        controls.cursor_moved(Vec2::new(100.0, 100.0));
        controls.cursor_moved(Vec2::new(160.0, 80.0));
        controls.update(&mut camera);

        assert!(((camera.eye - camera.target).length() - distance).abs() < 1e-4);
        assert_ne!(camera.eye, test_camera().eye);
    }

    #[test]
    fn orbit_velocity_decays_to_rest() {
        let mut camera = test_camera();
        let mut controls = OrbitControls::new();
        controls.set_dragging(true);
        controls.cursor_moved(Vec2::new(0.0, 0.0));
        controls.cursor_moved(Vec2::new(50.0, 0.0));
        controls.set_dragging(false);

        for _ in 0..200 {
            controls.update(&mut camera);
        }

        let settled = camera.eye;
        controls.update(&mut camera);
        assert_eq!(camera.eye, settled);
    }

    #[test]
    fn idle_controls_leave_the_camera_alone() {
        let mut camera = test_camera();
        let eye = camera.eye;

        let mut controls = OrbitControls::new();
        controls.cursor_moved(Vec2::new(10.0, 10.0));
        controls.cursor_moved(Vec2::new(90.0, 40.0));
        controls.update(&mut camera);

        assert_eq!(camera.eye, eye);
    }

    #[test]
    fn dolly_clamps_to_the_near_range() {
        let mut camera = test_camera();
        let mut controls = OrbitControls::new();

        for _ in 0..100 {
            controls.dolly(5.0, &mut camera);
        }

        let distance = (camera.eye - camera.target).length();
        assert!(distance >= (camera.near * 2.0).max(0.10) - 1e-5);
    }

    #[test]
    fn dolly_out_moves_away_from_the_target() {
        let mut camera = test_camera();
        let before = (camera.eye - camera.target).length();

        let mut controls = OrbitControls::new();
        controls.dolly(-1.0, &mut camera);

        assert!((camera.eye - camera.target).length() > before);
    }
}
