use glam::{Quat, Vec3};

/// Represents a transformation as translation + scale + rot
#[derive(Debug, Clone, Copy)]
pub struct Transform {
    pub translation: Vec3,
    pub scale: Vec3,
    pub rot: Quat,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        scale: Vec3::ONE,
        rot: Quat::IDENTITY,
    };

    /// Apply rotation then scale then translation
    pub fn point(&self, p: Vec3) -> Vec3 {
        self.scale * self.rot.mul_vec3(p) + self.translation
    }

    /// Apply rotation then scale but not translation !
    pub fn vector(&self, v: Vec3) -> Vec3 {
        self.scale * self.rot.mul_vec3(v)
    }

    /// Normals follow the inverse transpose: rotation then inverse scale
    pub fn normal(&self, n: Vec3) -> Vec3 {
        (self.rot.mul_vec3(n) / self.scale).normalize_or_zero()
    }
}

/// Represent an orthonormal frame
pub struct Frame {
    frame: glam::Mat3,
}

impl Frame {
    /// Construct a Frame from a single vector using the algorithm described in
    /// “Building an Orthonormal Basis, Revisited (JCGT).” https://jcgt.org/published/0006/01/01/.
    /// n is expected to be normalized and will be used as the +z axis
    pub fn new(n: Vec3) -> Self {
        let sign = 1.0_f32.copysign(n.z);
        let a = -1.0 / (sign + n.z);
        let b = n.x * n.y * a;

        Self {
            frame: glam::Mat3::from_cols(
                Vec3::new(1.0 + sign * n.x * n.x * a, sign * b, -sign * n.x),
                Vec3::new(b, sign + n.y * n.y * a, -n.y),
                n,
            ),
        }
    }

    pub fn to_local(&self, global: Vec3) -> Vec3 {
        self.frame.transpose() * global
    }

    pub fn from_local(&self, local: Vec3) -> Vec3 {
        self.frame * local
    }

    pub fn normal(&self) -> Vec3 {
        self.frame.col(2)
    }
}
