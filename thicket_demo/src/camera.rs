use glam::{Mat4, Vec3};

/// First-person camera with view and projection matrices
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    eye: Vec3,
    look: Vec3,
    up: Vec3,
    /// Vertical field of view in radians
    pub height_angle: f32,
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 0.0, 2.0),
            look: Vec3::NEG_Z,
            up: Vec3::Y,
            height_angle: 60.0_f32.to_radians(),
            aspect_ratio: 1.0,
            near: 1.0,
            far: 150.0,
        }
    }
}

impl Camera {
    /// Place the camera at `eye` looking along `look`.
    ///
    /// `look` is normalized and `up` is made orthogonal to it. Degenerate
    /// inputs (zero look, up parallel to look) keep the previous orientation.
    pub fn orient_look(&mut self, eye: Vec3, look: Vec3, up: Vec3) {
        self.eye = eye;

        let Some(look) = look.try_normalize() else {
            log::warn!("Ignoring zero look vector");
            return;
        };
        let Some(up) = (up - look * up.dot(look)).try_normalize() else {
            log::warn!("Ignoring up vector parallel to look {:?}", look);
            return;
        };

        self.look = look;
        self.up = up;
    }

    pub fn set_clip(&mut self, near: f32, far: f32) {
        self.near = near;
        self.far = far;
    }

    /// Update aspect ratio (for window resize)
    pub fn set_aspect_ratio(&mut self, aspect_ratio: f32) {
        self.aspect_ratio = aspect_ratio;
    }

    pub fn set_height_angle(&mut self, degrees: f32) {
        self.height_angle = degrees.to_radians();
    }

    pub fn eye(&self) -> Vec3 {
        self.eye
    }

    pub fn look(&self) -> Vec3 {
        self.look
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    /// Get the view matrix (camera transform)
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_to_rh(self.eye, self.look, self.up)
    }

    /// Get the projection matrix
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.height_angle, self.aspect_ratio, self.near, self.far)
    }

    /// Get combined view-projection matrix
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}
