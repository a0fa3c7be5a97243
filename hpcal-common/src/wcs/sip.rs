//! SIP (Simple Imaging Polynomial) distortion
//!
//! Forward model: `U = u + f(u, v)`, `V = v + g(u, v)` where `(u, v)` are pixel
//! offsets from CRPIX and `f = Σ A[p][q] u^p v^q`, `g = Σ B[p][q] u^p v^q`.
//! Only forward coefficients are stored, so sky → pixel needs an iterative
//! inversion which can fail for pathological coefficients.

use super::WcsError;

/// Convergence threshold on the per-iteration correction, pixels
const TOLERANCE_PX: f64 = 1e-4;

const MAX_ITERATIONS: usize = 20;

/// Forward SIP coefficients, `a[p][q]` multiplies `u^p v^q`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sip {
    pub a: Vec<Vec<f64>>,
    pub b: Vec<Vec<f64>>,
}

impl Sip {
    pub fn new(a: Vec<Vec<f64>>, b: Vec<Vec<f64>>) -> Self {
        Self { a, b }
    }

    /// Parse the JSON 2-D arrays stored alongside the astrometric solution
    pub fn from_json(a: &str, b: &str) -> Result<Self, serde_json::Error> {
        Ok(Self {
            a: serde_json::from_str(a)?,
            b: serde_json::from_str(b)?,
        })
    }

    pub fn is_zero(&self) -> bool {
        self.a.iter().chain(self.b.iter()).flatten().all(|&c| c == 0.0)
    }

    /// Distortion `(f, g)` at offset `(u, v)`
    pub fn correction(&self, u: f64, v: f64) -> (f64, f64) {
        (eval_poly(&self.a, u, v), eval_poly(&self.b, u, v))
    }

    /// Distorted offsets `(U, V)` for undistorted `(u, v)`
    pub fn distort(&self, u: f64, v: f64) -> (f64, f64) {
        let (f, g) = self.correction(u, v);
        (u + f, v + g)
    }

    /// Solve `distort(u, v) = (big_u, big_v)` by fixed-point iteration.
    ///
    /// Stops with `NonConvergence` when a correction step grows (divergence),
    /// goes non-finite, or the iteration limit is reached.
    pub fn invert(&self, big_u: f64, big_v: f64) -> Result<(f64, f64), WcsError> {
        let (mut u, mut v) = (big_u, big_v);
        let mut last_step = f64::INFINITY;

        for iteration in 1..=MAX_ITERATIONS {
            let (f, g) = self.correction(u, v);
            let (next_u, next_v) = (big_u - f, big_v - g);
            let step = (next_u - u).hypot(next_v - v);

            if !step.is_finite() {
                return Err(WcsError::NonConvergence { iterations: iteration });
            }

            u = next_u;
            v = next_v;

            if step < TOLERANCE_PX {
                return Ok((u, v));
            }
            if step > last_step {
                return Err(WcsError::NonConvergence { iterations: iteration });
            }
            last_step = step;
        }

        Err(WcsError::NonConvergence {
            iterations: MAX_ITERATIONS,
        })
    }
}

fn eval_poly(coeffs: &[Vec<f64>], u: f64, v: f64) -> f64 {
    let mut sum = 0.0;
    let mut u_pow = 1.0;
    for row in coeffs {
        let mut v_pow = 1.0;
        for &c in row {
            if c != 0.0 {
                sum += c * u_pow * v_pow;
            }
            v_pow *= v;
        }
        u_pow *= u;
    }
    sum
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(order: usize) -> Vec<Vec<f64>> {
        vec![vec![0.0; order + 1]; order + 1]
    }

    #[test]
    fn test_zero_sip_is_identity() {
        let sip = Sip::new(square(2), square(2));
        assert!(sip.is_zero());
        assert_eq!(sip.invert(123.0, -45.0), Ok((123.0, -45.0)));
    }

    #[test]
    fn test_eval_poly_terms() {
        let mut a = square(2);
        a[2][0] = 1e-3; // u^2
        a[1][1] = 2e-3; // u v
        let sip = Sip::new(a, square(2));
        let (f, g) = sip.correction(10.0, 5.0);
        assert!((f - (0.1 + 0.1)).abs() < 1e-12);
        assert_eq!(g, 0.0);
    }

    #[test]
    fn test_invert_recovers_undistorted_offset() {
        let mut a = square(3);
        let mut b = square(3);
        a[2][0] = 2e-6;
        a[0][2] = -1e-6;
        a[3][0] = 1e-9;
        b[1][1] = 3e-6;
        b[0][3] = -2e-9;
        let sip = Sip::new(a, b);

        let (u, v) = (812.5, -640.25);
        let (big_u, big_v) = sip.distort(u, v);
        assert!((big_u - u).abs() > 0.5, "test distortion should be noticeable");

        let (ru, rv) = sip.invert(big_u, big_v).unwrap();
        assert!((ru - u).abs() < 1e-3, "u: {} vs {}", ru, u);
        assert!((rv - v).abs() < 1e-3, "v: {} vs {}", rv, v);
    }

    #[test]
    fn test_pathological_coefficients_do_not_converge() {
        let mut a = square(2);
        a[2][0] = 0.5;
        let sip = Sip::new(a, square(2));
        assert!(matches!(
            sip.invert(100.0, 0.0),
            Err(WcsError::NonConvergence { .. })
        ));
    }

    #[test]
    fn test_from_json() {
        let sip = Sip::from_json("[[0, 0, 1e-6], [0, 2e-6, 0], [3e-6, 0, 0]]", "[[0]]").unwrap();
        assert_eq!(sip.a[2][0], 3e-6);
        assert_eq!(sip.a[0][2], 1e-6);
        assert_eq!(sip.b, vec![vec![0.0]]);

        assert!(Sip::from_json("not json", "[[0]]").is_err());
        assert!(Sip::from_json("[[0]]", "{\"a\": 1}").is_err());
    }
}
