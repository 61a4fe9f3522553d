use std::cell::Cell;

use glam::{Mat4, Vec3};

/// Perspective camera with view and projection cached separately, so moving
/// the eye does not rebuild the projection and resizing does not rebuild
/// the view.
#[derive(Clone, Debug)]
pub struct Camera {
    eye: Vec3,
    target: Vec3,
    up: Vec3,
    fov_y: f32,
    aspect: f32,
    near: f32,
    far: f32,

    view: Cell<Mat4>,
    view_dirty: Cell<bool>,
    projection: Cell<Mat4>,
    projection_dirty: Cell<bool>,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, 0.0, 3.0), Vec3::ZERO, 16.0 / 9.0)
    }
}

impl Camera {
    pub fn new(eye: Vec3, target: Vec3, aspect: f32) -> Self {
        Self {
            eye,
            target,
            up: Vec3::Y,
            fov_y: 45f32.to_radians(),
            aspect,
            near: 0.1,
            far: 100.0,
            view: Cell::new(Mat4::IDENTITY),
            view_dirty: Cell::new(true),
            projection: Cell::new(Mat4::IDENTITY),
            projection_dirty: Cell::new(true),
        }
    }

    pub fn eye(&self) -> Vec3 {
        self.eye
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn set_eye(&mut self, eye: Vec3) {
        self.eye = eye;
        self.view_dirty.set(true);
    }

    pub fn set_target(&mut self, target: Vec3) {
        self.target = target;
        self.view_dirty.set(true);
    }

    pub fn set_up(&mut self, up: Vec3) {
        self.up = up;
        self.view_dirty.set(true);
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
        self.projection_dirty.set(true);
    }

    pub fn set_fov_y(&mut self, fov_y: f32) {
        self.fov_y = fov_y;
        self.projection_dirty.set(true);
    }

    pub fn set_clip(&mut self, near: f32, far: f32) {
        self.near = near;
        self.far = far;
        self.projection_dirty.set(true);
    }

    pub fn view(&self) -> Mat4 {
        if self.view_dirty.replace(false) {
            self.view.set(Mat4::look_at_rh(self.eye, self.target, self.up));
        }
        self.view.get()
    }

    pub fn projection(&self) -> Mat4 {
        if self.projection_dirty.replace(false) {
            self.projection
                .set(Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far));
        }
        self.projection.get()
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection() * self.view()
    }
}
