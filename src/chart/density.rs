use std::f64::consts::PI;

use super::summary::quantile;

/// Kernel contributions beyond this many bandwidths are skipped.
const KERNEL_CUTOFF: f64 = 4.0;

fn gaussian(u: f64) -> f64 {
    (-0.5 * u * u).exp() / (2.0 * PI).sqrt()
}

/// Silverman's rule of thumb. Falls back to 1.0 when the sample has no spread
/// so a constant column still draws a visible bump.
pub fn silverman_bandwidth(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 1.0;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    let sd = var.sqrt();

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let iqr = match (quantile(&sorted, 0.75), quantile(&sorted, 0.25)) {
        (Some(q3), Some(q1)) => q3 - q1,
        _ => 0.0,
    };

    let spread = if iqr > 0.0 { sd.min(iqr / 1.34) } else { sd };
    let h = 0.9 * spread * (n as f64).powf(-0.2);
    if h.is_finite() && h > 0.0 { h } else { 1.0 }
}

/// One-dimensional Gaussian kernel density estimate sampled at `samples`
/// evenly spaced points covering the data plus three bandwidths either side.
pub fn kde(values: &[f64], samples: usize) -> Vec<[f64; 2]> {
    let values: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if values.is_empty() || samples < 2 {
        return Vec::new();
    }
    let h = silverman_bandwidth(&values);
    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let (lo, hi) = (min - 3.0 * h, max + 3.0 * h);
    let step = (hi - lo) / (samples - 1) as f64;
    let norm = 1.0 / (values.len() as f64 * h);

    (0..samples)
        .map(|i| {
            let x = lo + step * i as f64;
            let density: f64 = values
                .iter()
                .map(|&v| (x - v) / h)
                .filter(|u| u.abs() <= KERNEL_CUTOFF)
                .map(gaussian)
                .sum();
            [x, density * norm]
        })
        .collect()
}

// ---------------------------------------------------------------------------
// 2D density grid + contours
// ---------------------------------------------------------------------------

/// Straight contour segment between two points in data coordinates.
pub type Segment = [[f64; 2]; 2];

/// Kernel density sampled on a regular `nx × ny` lattice spanning the given
/// ranges (lattice nodes sit on the range edges).
#[derive(Debug, Clone, PartialEq)]
pub struct DensityGrid {
    x_range: (f64, f64),
    y_range: (f64, f64),
    nx: usize,
    ny: usize,
    /// Row-major: `values[j * nx + i]` is the density at node `(i, j)`.
    values: Vec<f64>,
}

impl DensityGrid {
    /// Estimate the density of `points`. `None` for an empty sample, a lattice
    /// smaller than 2×2, or an empty range.
    pub fn estimate(
        points: &[[f64; 2]],
        x_range: (f64, f64),
        y_range: (f64, f64),
        nx: usize,
        ny: usize,
    ) -> Option<Self> {
        if points.is_empty() || nx < 2 || ny < 2 {
            return None;
        }
        if !(x_range.0 < x_range.1 && y_range.0 < y_range.1) {
            return None;
        }
        let xs: Vec<f64> = points.iter().map(|p| p[0]).collect();
        let ys: Vec<f64> = points.iter().map(|p| p[1]).collect();
        let (hx, hy) = (silverman_bandwidth(&xs), silverman_bandwidth(&ys));
        let norm = 1.0 / (points.len() as f64 * hx * hy);

        let mut grid = DensityGrid {
            x_range,
            y_range,
            nx,
            ny,
            values: vec![0.0; nx * ny],
        };
        for j in 0..ny {
            for i in 0..nx {
                let [gx, gy] = grid.node(i, j);
                let density: f64 = points
                    .iter()
                    .filter_map(|&[px, py]| {
                        let (u, v) = ((gx - px) / hx, (gy - py) / hy);
                        (u.abs() <= KERNEL_CUTOFF && v.abs() <= KERNEL_CUTOFF)
                            .then(|| gaussian(u) * gaussian(v))
                    })
                    .sum();
                grid.values[j * nx + i] = density * norm;
            }
        }
        Some(grid)
    }

    /// Data coordinates of lattice node `(i, j)`.
    pub fn node(&self, i: usize, j: usize) -> [f64; 2] {
        let fx = i as f64 / (self.nx - 1) as f64;
        let fy = j as f64 / (self.ny - 1) as f64;
        [
            self.x_range.0 + fx * (self.x_range.1 - self.x_range.0),
            self.y_range.0 + fy * (self.y_range.1 - self.y_range.0),
        ]
    }

    pub fn value(&self, i: usize, j: usize) -> f64 {
        self.values[j * self.nx + i]
    }

    pub fn max(&self) -> f64 {
        self.values.iter().copied().fold(0.0, f64::max)
    }

    /// `n` evenly spaced iso-levels strictly between zero and the peak density.
    pub fn levels(&self, n: usize) -> Vec<f64> {
        let peak = self.max();
        if peak <= 0.0 {
            return Vec::new();
        }
        (1..=n).map(|k| peak * k as f64 / (n + 1) as f64).collect()
    }

    /// Marching squares: iso-line segments where the density crosses `level`.
    /// Saddle cells are disambiguated by the cell's mean value.
    pub fn contour(&self, level: f64) -> Vec<Segment> {
        let mut segments = Vec::new();
        for j in 0..self.ny - 1 {
            for i in 0..self.nx - 1 {
                self.march_cell(i, j, level, &mut segments);
            }
        }
        segments
    }

    fn march_cell(&self, i: usize, j: usize, level: f64, out: &mut Vec<Segment>) {
        let bl = self.value(i, j);
        let br = self.value(i + 1, j);
        let tr = self.value(i + 1, j + 1);
        let tl = self.value(i, j + 1);

        let case = (bl >= level) as u8
            | ((br >= level) as u8) << 1
            | ((tr >= level) as u8) << 2
            | ((tl >= level) as u8) << 3;
        if case == 0 || case == 15 {
            return;
        }

        let lerp = |a: [f64; 2], va: f64, b: [f64; 2], vb: f64| -> [f64; 2] {
            let t = if (vb - va).abs() < f64::EPSILON {
                0.5
            } else {
                (level - va) / (vb - va)
            };
            [a[0] + t * (b[0] - a[0]), a[1] + t * (b[1] - a[1])]
        };
        let (p_bl, p_br) = (self.node(i, j), self.node(i + 1, j));
        let (p_tr, p_tl) = (self.node(i + 1, j + 1), self.node(i, j + 1));
        let bottom = lerp(p_bl, bl, p_br, br);
        let right = lerp(p_br, br, p_tr, tr);
        let top = lerp(p_tl, tl, p_tr, tr);
        let left = lerp(p_bl, bl, p_tl, tl);
        let center_inside = (bl + br + tr + tl) / 4.0 >= level;

        match case {
            1 | 14 => out.push([left, bottom]),
            2 | 13 => out.push([bottom, right]),
            3 | 12 => out.push([left, right]),
            4 | 11 => out.push([right, top]),
            6 | 9 => out.push([bottom, top]),
            7 | 8 => out.push([left, top]),
            5 if center_inside => out.extend([[left, top], [bottom, right]]),
            5 => out.extend([[left, bottom], [right, top]]),
            10 if center_inside => out.extend([[left, bottom], [right, top]]),
            10 => out.extend([[bottom, right], [left, top]]),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kde_integrates_to_about_one() {
        let values = [1.0, 2.0, 2.5, 3.0, 7.0];
        let curve = kde(&values, 400);
        let step = curve[1][0] - curve[0][0];
        let area: f64 = curve.iter().map(|p| p[1] * step).sum();
        assert!((area - 1.0).abs() < 0.02, "area = {area}");
    }

    #[test]
    fn kde_handles_constant_and_empty_samples() {
        let curve = kde(&[5.0, 5.0, 5.0], 50);
        assert_eq!(curve.len(), 50);
        let peak = curve.iter().fold([0.0, 0.0], |best, p| if p[1] > best[1] { *p } else { best });
        assert!((peak[0] - 5.0).abs() < 0.5);
        assert!(kde(&[], 50).is_empty());
    }

    #[test]
    fn density_peaks_near_cluster() {
        let points: Vec<[f64; 2]> = (0..50)
            .map(|k| [10.0 + (k % 5) as f64 * 0.1, 20.0 + (k % 7) as f64 * 0.1])
            .collect();
        let grid = DensityGrid::estimate(&points, (0.0, 30.0), (0.0, 40.0), 31, 41).unwrap();
        let mut best = (0, 0);
        for j in 0..41 {
            for i in 0..31 {
                if grid.value(i, j) > grid.value(best.0, best.1) {
                    best = (i, j);
                }
            }
        }
        let [x, y] = grid.node(best.0, best.1);
        assert!((x - 10.0).abs() < 1e-9 && (y - 20.0).abs() < 1e-9, "peak at ({x}, {y})");
        assert!(DensityGrid::estimate(&[], (0.0, 1.0), (0.0, 1.0), 4, 4).is_none());
        assert!(DensityGrid::estimate(&points, (1.0, 1.0), (0.0, 1.0), 4, 4).is_none());
    }

    #[test]
    fn contour_segments_lie_on_level() {
        let points: Vec<[f64; 2]> = vec![[0.0, 0.0], [0.5, -0.5], [-0.5, 0.5], [0.2, 0.1]];
        let grid = DensityGrid::estimate(&points, (-3.0, 3.0), (-3.0, 3.0), 25, 25).unwrap();
        let levels = grid.levels(3);
        assert_eq!(levels.len(), 3);
        assert!(levels.windows(2).all(|w| w[0] < w[1]));

        let segments = grid.contour(levels[0]);
        assert!(!segments.is_empty());
        for [a, b] in &segments {
            for p in [a, b] {
                assert!(p[0] >= -3.0 && p[0] <= 3.0 && p[1] >= -3.0 && p[1] <= 3.0);
            }
        }
        assert!(grid.contour(grid.max() * 2.0).is_empty());
    }
}
