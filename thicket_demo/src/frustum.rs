use glam::{Mat4, Vec3, Vec4};

/// A view frustum defined by 6 planes for culling
#[derive(Debug, Clone, Copy)]
pub struct Frustum {
    planes: [Vec4; 6], // Left, Right, Bottom, Top, Near, Far
}

impl Frustum {
    /// Extract frustum planes from a view-projection matrix with a `0..1` depth range.
    ///
    /// Each plane is `Ax + By + Cz + D = 0`, stored as `Vec4(A, B, C, D)` with a
    /// unit normal pointing inside.
    pub fn from_view_proj(view_proj: &Mat4) -> Self {
        let [x, y, z, w] = [0, 1, 2, 3].map(|i| view_proj.row(i));

        let planes = [w + x, w - x, w + y, w - y, z, w - z].map(Self::normalize_plane);

        Self { planes }
    }

    fn normalize_plane(plane: Vec4) -> Vec4 {
        let normal_length = plane.truncate().length();
        if normal_length > 0.0 {
            plane / normal_length
        } else {
            plane
        }
    }

    /// Test if a sphere intersects or is inside the frustum
    pub fn contains_sphere(&self, center: Vec3, radius: f32) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.truncate().dot(center) + plane.w >= -radius)
    }
}

/// Bounding sphere of a unit-cylinder placement transform
pub fn branch_bounds(transform: &Mat4) -> (Vec3, f32) {
    let center = transform.transform_point3(Vec3::ZERO);
    let half_length = transform.transform_vector3(Vec3::Z * 0.5).length();
    let radius = transform
        .transform_vector3(Vec3::X)
        .length()
        .max(transform.transform_vector3(Vec3::Y).length());

    (center, half_length.hypot(radius))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frustum_sphere() {
        let vp = Mat4::perspective_rh(1.0, 1.0, 0.1, 100.0);
        let frustum = Frustum::from_view_proj(&vp);

        // Point in front should be visible
        assert!(frustum.contains_sphere(Vec3::new(0.0, 0.0, -10.0), 1.0));

        // Point behind should not be visible
        assert!(!frustum.contains_sphere(Vec3::new(0.0, 0.0, 10.0), 1.0));

        // Beyond the far plane, and far off to the side
        assert!(!frustum.contains_sphere(Vec3::new(0.0, 0.0, -200.0), 1.0));
        assert!(!frustum.contains_sphere(Vec3::new(100.0, 0.0, -10.0), 1.0));

        // Straddling the near plane still counts
        assert!(frustum.contains_sphere(Vec3::new(0.0, 0.0, 0.5), 1.0));
    }

    #[test]
    fn test_branch_bounds() {
        let transform = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0))
            * Mat4::from_scale(Vec3::new(0.5, 0.5, 6.0));
        let (center, radius) = branch_bounds(&transform);

        assert!(center.abs_diff_eq(Vec3::new(1.0, 2.0, 3.0), 1e-6));
        assert!((radius - 3.0f32.hypot(0.5)).abs() < 1e-5);
    }
}
