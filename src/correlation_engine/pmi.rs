//! Pointwise mutual information kernel.

use crate::types::PmiMetrics;

/// Binarize both series (`>0 -> 1`), apply add-one smoothing to the 2x2
/// contingency counts (and +4 to `n`), and require `pmi >= 1.0` to emit.
/// The reported `co_count` is the *unsmoothed* co-occurrence count.
pub fn evaluate(a: &[u32], b: &[u32], min_support: usize) -> Option<PmiMetrics> {
    if a.len() < 3 || b.len() < 3 {
        return None;
    }

    let n = a.len();
    let n_a = a.iter().filter(|&&c| c > 0).count();
    let n_b = b.iter().filter(|&&c| c > 0).count();
    let n_ab = a.iter().zip(b.iter()).filter(|(&x, &y)| x > 0 && y > 0).count();

    if n_ab < min_support {
        return None;
    }

    let n_s = n as f64 + 4.0;
    let p_a = (n_a as f64 + 1.0) / n_s;
    let p_b = (n_b as f64 + 1.0) / n_s;
    let p_ab = (n_ab as f64 + 1.0) / n_s;

    let pmi = (p_ab / (p_a * p_b)).log2();

    if pmi >= 1.0 {
        Some(PmiMetrics { pmi, co_count: n_ab })
    } else {
        None
    }
}
