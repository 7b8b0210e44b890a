use super::{Point3, TOLERANCE};

/// Finds the point of a triangle closest to `point`.
///
/// Seven-region barycentric projection: with `B = t0`, `E0 = t1 - B`,
/// `E1 = t2 - B` the closest point is `B + s*E0 + t*E1`, where `(s, t)` is
/// the unconstrained minimizer clamped to the region of the parameter plane
/// it falls into. Every branch keeps `s, t` in `[0, 1]`.
///
/// Zero-area triangles fall back to the closest point on their edges.
#[must_use]
pub fn closest_point_on_triangle(triangle: &[Point3; 3], point: &Point3) -> Point3 {
    let base = triangle[0];
    let e0 = triangle[1] - base;
    let e1 = triangle[2] - base;
    let diff = base - point;

    let a = e0.dot(&e0);
    let b = e0.dot(&e1);
    let c = e1.dot(&e1);
    let d = e0.dot(&diff);
    let e = e1.dot(&diff);

    let det = a * c - b * b;
    if det <= TOLERANCE * a * c || det <= 0.0 {
        return closest_point_on_edges(triangle, point);
    }

    let mut s = b * e - c * d;
    let mut t = b * d - a * e;

    if s + t <= det {
        if s < 0.0 {
            if t < 0.0 {
                // Region 4: vertex B, or one of the two edges meeting there.
                if d < 0.0 {
                    t = 0.0;
                    s = if -d >= a { 1.0 } else { -d / a };
                } else {
                    s = 0.0;
                    t = clamp_ratio(e, c);
                }
            } else {
                // Region 3: edge s = 0.
                s = 0.0;
                t = clamp_ratio(e, c);
            }
        } else if t < 0.0 {
            // Region 5: edge t = 0.
            t = 0.0;
            s = clamp_ratio(d, a);
        } else {
            // Region 0: interior.
            let inv_det = 1.0 / det;
            s = (s * inv_det).clamp(0.0, 1.0);
            t = (t * inv_det).clamp(0.0, 1.0);
        }
    } else if s < 0.0 {
        // Region 2
        let tmp0 = b + d;
        let tmp1 = c + e;
        if tmp1 > tmp0 {
            let numer = tmp1 - tmp0;
            let denom = a - 2.0 * b + c;
            s = if numer >= denom { 1.0 } else { numer / denom };
            t = 1.0 - s;
        } else {
            s = 0.0;
            t = if tmp1 <= 0.0 {
                1.0
            } else if e >= 0.0 {
                0.0
            } else {
                -e / c
            };
        }
    } else if t < 0.0 {
        // Region 6
        let tmp0 = b + e;
        let tmp1 = a + d;
        if tmp1 > tmp0 {
            let numer = tmp1 - tmp0;
            let denom = a - 2.0 * b + c;
            t = if numer >= denom { 1.0 } else { numer / denom };
            s = 1.0 - t;
        } else {
            t = 0.0;
            s = if tmp1 <= 0.0 {
                1.0
            } else if d >= 0.0 {
                0.0
            } else {
                -d / a
            };
        }
    } else {
        // Region 1: edge s + t = 1.
        let numer = c + e - b - d;
        if numer <= 0.0 {
            s = 0.0;
        } else {
            let denom = a - 2.0 * b + c;
            s = if numer >= denom { 1.0 } else { numer / denom };
        }
        t = 1.0 - s;
    }

    base + e0 * s + e1 * t
}

/// Minimizer of `x*x*len_sq + 2*x*proj` over `[0, 1]`.
#[inline]
fn clamp_ratio(proj: f64, len_sq: f64) -> f64 {
    if proj >= 0.0 {
        0.0
    } else if -proj >= len_sq {
        1.0
    } else {
        -proj / len_sq
    }
}

fn closest_point_on_edges(triangle: &[Point3; 3], point: &Point3) -> Point3 {
    let mut best = triangle[0];
    let mut best_dist = f64::INFINITY;
    for i in 0..3 {
        let a = triangle[i];
        let b = triangle[(i + 1) % 3];
        let ab = b - a;
        let len_sq = ab.dot(&ab);
        let candidate = if len_sq < TOLERANCE * TOLERANCE {
            a
        } else {
            a + ab * ((point - a).dot(&ab) / len_sq).clamp(0.0, 1.0)
        };
        let dist = (point - candidate).norm_squared();
        if dist < best_dist {
            best_dist = dist;
            best = candidate;
        }
    }
    best
}
