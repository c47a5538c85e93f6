/// Orbit camera for the 3D scatter. Angles in degrees; z is up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// Rotation around the vertical axis.
    pub yaw: f64,
    /// Tilt toward the viewer, clamped to [-90, 90] when projecting.
    pub pitch: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            yaw: 35.0,
            pitch: 25.0,
        }
    }
}

impl Camera {
    /// Orthographic projection of a point onto the screen plane.
    pub fn project(&self, [x, y, z]: [f64; 3]) -> [f64; 2] {
        let (sy, cy) = self.yaw.to_radians().sin_cos();
        let (sp, cp) = self.pitch.clamp(-90.0, 90.0).to_radians().sin_cos();
        let rx = x * cy - y * sy;
        let ry = x * sy + y * cy;
        [rx, z * cp + ry * sp]
    }
}

/// Maps each axis of a point cloud onto `[-1, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalizer {
    min: [f64; 3],
    max: [f64; 3],
}

impl Normalizer {
    pub fn from_points(points: &[[f64; 3]]) -> Option<Self> {
        let first = *points.first()?;
        let (min, max) = points.iter().fold((first, first), |(mut lo, mut hi), p| {
            for axis in 0..3 {
                lo[axis] = lo[axis].min(p[axis]);
                hi[axis] = hi[axis].max(p[axis]);
            }
            (lo, hi)
        });
        Some(Self { min, max })
    }

    /// Axes without spread collapse to 0.
    pub fn normalize(&self, p: [f64; 3]) -> [f64; 3] {
        let mut out = [0.0; 3];
        for axis in 0..3 {
            let span = self.max[axis] - self.min[axis];
            if span > 0.0 {
                out[axis] = 2.0 * (p[axis] - self.min[axis]) / span - 1.0;
            }
        }
        out
    }

    /// Data value at the end of a normalized axis.
    pub fn extent(&self, axis: usize) -> (f64, f64) {
        (self.min[axis], self.max[axis])
    }
}

/// The twelve edges of the `[-1, 1]³` cube drawn around the scatter.
pub fn cube_edges() -> Vec<[[f64; 3]; 2]> {
    let corners: Vec<[f64; 3]> = (0..8)
        .map(|bits| {
            let pick = |bit: u8| if bits & (1 << bit) != 0 { 1.0 } else { -1.0 };
            [pick(0), pick(1), pick(2)]
        })
        .collect();
    let mut edges = Vec::with_capacity(12);
    for a in 0..8usize {
        for bit in 0..3 {
            let b = a | (1 << bit);
            if b != a {
                edges.push([corners[a], corners[b]]);
            }
        }
    }
    edges
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: [f64; 2], b: [f64; 2]) -> bool {
        (a[0] - b[0]).abs() < 1e-9 && (a[1] - b[1]).abs() < 1e-9
    }

    #[test]
    fn front_view_drops_depth_axis() {
        let cam = Camera { yaw: 0.0, pitch: 0.0 };
        assert!(close(cam.project([0.5, 0.9, -0.25]), [0.5, -0.25]));
    }

    #[test]
    fn quarter_turn_swaps_horizontal_axes() {
        let cam = Camera { yaw: 90.0, pitch: 0.0 };
        assert!(close(cam.project([0.0, 1.0, 0.0]), [-1.0, 0.0]));
        let top = Camera { yaw: 0.0, pitch: 90.0 };
        assert!(close(top.project([0.0, 1.0, 0.3]), [0.0, 1.0]));
    }

    #[test]
    fn normalizer_spans_unit_cube() {
        let n = Normalizer::from_points(&[[0.0, 10.0, 5.0], [100.0, 20.0, 5.0]]).unwrap();
        assert_eq!(n.normalize([0.0, 10.0, 5.0]), [-1.0, -1.0, 0.0]);
        assert_eq!(n.normalize([50.0, 20.0, 5.0]), [0.0, 1.0, 0.0]);
        assert_eq!(n.extent(0), (0.0, 100.0));
        assert!(Normalizer::from_points(&[]).is_none());
    }

    #[test]
    fn cube_has_twelve_edges() {
        let edges = cube_edges();
        assert_eq!(edges.len(), 12);
        for [a, b] in edges {
            let differing = (0..3).filter(|&k| a[k] != b[k]).count();
            assert_eq!(differing, 1);
        }
    }
}
