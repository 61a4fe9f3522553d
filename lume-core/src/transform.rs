use std::cell::Cell;

use glam::{Mat4, Quat, Vec3};

/// Object transform whose local-to-world matrix is rebuilt lazily.
///
/// Every setter marks the cached matrix dirty; [`Transform::matrix`]
/// recomputes it on the first read after a change.
#[derive(Clone, Debug)]
pub struct Transform {
    translation: Vec3,
    rotation: Quat,
    scale: Vec3,
    matrix: Cell<Mat4>,
    dirty: Cell<bool>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            matrix: Cell::new(Mat4::IDENTITY),
            dirty: Cell::new(false),
        }
    }
}

impl Transform {
    pub fn from_translation(translation: Vec3) -> Self {
        let mut t = Self::default();
        t.set_translation(translation);
        t
    }

    pub fn translation(&self) -> Vec3 {
        self.translation
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    pub fn set_translation(&mut self, translation: Vec3) {
        self.translation = translation;
        self.dirty.set(true);
    }

    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation;
        self.dirty.set(true);
    }

    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
        self.dirty.set(true);
    }

    pub fn translate(&mut self, delta: Vec3) {
        self.set_translation(self.translation + delta);
    }

    pub fn rotate(&mut self, delta: Quat) {
        self.set_rotation((delta * self.rotation).normalize());
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    pub fn matrix(&self) -> Mat4 {
        if self.dirty.get() {
            self.matrix.set(Mat4::from_scale_rotation_translation(
                self.scale,
                self.rotation,
                self.translation,
            ));
            self.dirty.set(false);
        }
        self.matrix.get()
    }
}
