use tracing::{debug, trace};

use crate::cutoff::error::CutoffError;
use crate::error::AhrComputeErr;

/// Given a non-decreasing function f(x) and lower bound, finds value x' in
/// `(lower_bound, upper_limit]` such that f(x') = target to within `tol`.
///
/// The search window doubles from the lower bound until it brackets the
/// target or hits `upper_limit`; bisection then runs for at most
/// `max_iterations` steps. A jump in `f` across the target ends the search
/// at the jump once the window can no longer be halved.
pub fn root_find_monotonic<F>(
    f: F,
    lower_bound: f64,
    upper_limit: f64,
    target: f64,
    tol: f64,
    max_iterations: usize,
) -> Result<f64, AhrComputeErr>
where
    F: Fn(f64) -> Result<f64, AhrComputeErr>,
{
    let f_lower_bound = f(lower_bound)?;
    if f_lower_bound >= target {
        return Err(CutoffError::BadLowerBound {
            value: f_lower_bound,
            target,
        }
        .into());
    }

    // Set window for search
    let mut lower_bound = lower_bound;
    let mut upper_bound = lower_bound;
    let mut f_upper_bound = f_lower_bound;
    let mut safety = 0;
    while f_upper_bound < target - tol && upper_bound < upper_limit {
        if safety >= max_iterations {
            return Err(CutoffError::FailedToConverge {
                iterations: safety,
                time: upper_bound,
                events: f_upper_bound,
                target,
            }
            .into());
        }
        lower_bound = upper_bound;
        upper_bound = (upper_bound * 2. + 1.).min(upper_limit); // +1 in case lower_bound is zero
        let f_next = f(upper_bound)?;
        if f_next < f_upper_bound {
            return Err(CutoffError::NonMonotonic {
                lower: lower_bound,
                upper: upper_bound,
                f_lower: f_upper_bound,
                f_upper: f_next,
            }
            .into());
        }
        f_upper_bound = f_next;
        safety += 1;
    }
    if f_upper_bound < target - tol {
        return Err(CutoffError::UnreachableTarget {
            target,
            max_events: f_upper_bound,
            horizon: upper_bound,
        }
        .into());
    }

    if f_upper_bound < target {
        // doubling stopped within tolerance of the target
        return Ok(upper_bound);
    }

    // Perform search
    let mut iterations = 0;
    loop {
        let x = (lower_bound + upper_bound) / 2.;
        let y = f(x)?;
        let window_closed = upper_bound - lower_bound <= 4. * f64::EPSILON * upper_bound.max(1.);
        if (y - target).abs() <= tol {
            trace!(x, y, target, iterations, "root find converged");
            return Ok(x);
        }
        if window_closed {
            debug!(
                x,
                y,
                target,
                tol,
                iterations,
                "root find window closed before reaching tolerance"
            );
            return Ok(x);
        }
        if iterations >= max_iterations {
            return Err(CutoffError::FailedToConverge {
                iterations,
                time: x,
                events: y,
                target,
            }
            .into());
        }
        if y <= target {
            lower_bound = x;
        } else {
            upper_bound = x;
        }
        iterations += 1;
    }
}
