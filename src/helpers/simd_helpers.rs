//! Numeric kernels for the filter and aggregation paths.
//!
//! AVX2 variants run when the CPU supports them; every kernel has a scalar
//! fallback and the public functions dispatch at runtime. All filter kernels
//! return ascending row indices.

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::{
    __m256i, _CMP_GE_OQ, _CMP_LE_OQ, _mm256_add_pd, _mm256_and_pd, _mm256_castsi256_pd,
    _mm256_cmp_pd, _mm256_cmpgt_epi64, _mm256_loadu_pd, _mm256_loadu_si256, _mm256_max_pd,
    _mm256_min_pd, _mm256_movemask_pd, _mm256_set1_epi64x, _mm256_set1_pd, _mm256_setzero_pd,
    _mm256_storeu_pd,
};

/// Sum of an f64 slice (0.0 when empty).
pub fn sum_f64(values: &[f64]) -> f64 {
    #[cfg(target_arch = "x86_64")]
    if is_x86_feature_detected!("avx2") {
        return unsafe { sum_f64_avx2(values) };
    }
    values.iter().sum()
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn sum_f64_avx2(values: &[f64]) -> f64 {
    const LANES: usize = 4; // __m256d holds 4 f64s
    let mut sum = _mm256_setzero_pd();

    let chunks = values.chunks_exact(LANES);
    let remainder = chunks.remainder();

    for chunk in chunks {
        let v = unsafe { _mm256_loadu_pd(chunk.as_ptr()) };
        sum = _mm256_add_pd(sum, v);
    }

    // horizontal reduction
    let mut sum_arr = [0f64; LANES];
    unsafe { _mm256_storeu_pd(sum_arr.as_mut_ptr(), sum) };
    let mut total: f64 = sum_arr.iter().sum();

    for &v in remainder {
        total += v;
    }

    total
}

/// Min and max of an f64 slice in one pass. `None` when empty.
pub fn min_max_f64(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }

    #[cfg(target_arch = "x86_64")]
    if is_x86_feature_detected!("avx2") {
        return Some(unsafe { min_max_f64_avx2(values) });
    }

    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &v in values {
        if v < min {
            min = v;
        }
        if v > max {
            max = v;
        }
    }
    Some((min, max))
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn min_max_f64_avx2(values: &[f64]) -> (f64, f64) {
    const LANES: usize = 4;
    let mut min = _mm256_set1_pd(f64::INFINITY);
    let mut max = _mm256_set1_pd(f64::NEG_INFINITY);

    let chunks = values.chunks_exact(LANES);
    let remainder = chunks.remainder();

    for chunk in chunks {
        let v = unsafe { _mm256_loadu_pd(chunk.as_ptr()) };
        min = _mm256_min_pd(min, v);
        max = _mm256_max_pd(max, v);
    }

    let mut min_arr = [f64::INFINITY; LANES];
    let mut max_arr = [f64::NEG_INFINITY; LANES];
    unsafe { _mm256_storeu_pd(min_arr.as_mut_ptr(), min) };
    unsafe { _mm256_storeu_pd(max_arr.as_mut_ptr(), max) };

    let mut total_min = min_arr[0];
    let mut total_max = max_arr[0];
    for i in 1..LANES {
        if min_arr[i] < total_min {
            total_min = min_arr[i];
        }
        if max_arr[i] > total_max {
            total_max = max_arr[i];
        }
    }

    for &v in remainder {
        if v < total_min {
            total_min = v;
        }
        if v > total_max {
            total_max = v;
        }
    }

    (total_min, total_max)
}

/// Min and max of an i64 slice. `None` when empty.
pub fn min_max_i64(values: &[i64]) -> Option<(i64, i64)> {
    if values.is_empty() {
        return None;
    }
    let mut min = values[0];
    let mut max = values[0];
    for &v in &values[1..] {
        if v < min {
            min = v;
        }
        if v > max {
            max = v;
        }
    }
    Some((min, max))
}

/// Indices of values satisfying `v >= threshold`.
pub fn filter_ge_i64(values: &[i64], threshold: i64) -> Vec<usize> {
    #[cfg(target_arch = "x86_64")]
    if is_x86_feature_detected!("avx2") {
        return unsafe { filter_ge_i64_avx2(values, threshold) };
    }
    filter_ge_i64_scalar(values, threshold)
}

fn filter_ge_i64_scalar(values: &[i64], threshold: i64) -> Vec<usize> {
    values
        .iter()
        .enumerate()
        .filter_map(|(i, &v)| if v >= threshold { Some(i) } else { None })
        .collect()
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn filter_ge_i64_avx2(values: &[i64], threshold: i64) -> Vec<usize> {
    const LANES: usize = 4; // __m256i holds 4 i64s
    let mut out = Vec::with_capacity(values.len());

    let chunks = values.chunks_exact(LANES);
    let remainder = chunks.remainder();

    let t = _mm256_set1_epi64x(threshold);

    for (chunk_idx, chunk) in chunks.enumerate() {
        let v = unsafe { _mm256_loadu_si256(chunk.as_ptr() as *const __m256i) };
        // v >= t is the complement of t > v
        let lt = _mm256_cmpgt_epi64(t, v);
        let mask_bits = _mm256_movemask_pd(_mm256_castsi256_pd(lt));
        for i in 0..LANES {
            if (mask_bits & (1 << i)) == 0 {
                out.push(chunk_idx * LANES + i);
            }
        }
    }

    let base = values.len() - remainder.len();
    for (i, &v) in remainder.iter().enumerate() {
        if v >= threshold {
            out.push(base + i);
        }
    }

    out
}

/// Indices of values in the inclusive range `[lo, hi]`.
pub fn filter_between_f64(values: &[f64], lo: f64, hi: f64) -> Vec<usize> {
    #[cfg(target_arch = "x86_64")]
    if is_x86_feature_detected!("avx2") {
        return unsafe { filter_between_f64_avx2(values, lo, hi) };
    }
    filter_between_f64_scalar(values, lo, hi)
}

fn filter_between_f64_scalar(values: &[f64], lo: f64, hi: f64) -> Vec<usize> {
    values
        .iter()
        .enumerate()
        .filter_map(|(i, &v)| if v >= lo && v <= hi { Some(i) } else { None })
        .collect()
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn filter_between_f64_avx2(values: &[f64], lo: f64, hi: f64) -> Vec<usize> {
    const LANES: usize = 4;
    let mut out = Vec::with_capacity(values.len());

    let chunks = values.chunks_exact(LANES);
    let remainder = chunks.remainder();

    let v_lo = _mm256_set1_pd(lo);
    let v_hi = _mm256_set1_pd(hi);

    for (chunk_idx, chunk) in chunks.enumerate() {
        let v = unsafe { _mm256_loadu_pd(chunk.as_ptr()) };
        let ge = _mm256_cmp_pd(v, v_lo, _CMP_GE_OQ);
        let le = _mm256_cmp_pd(v, v_hi, _CMP_LE_OQ);
        let mask = _mm256_and_pd(ge, le);

        let mask_bits = _mm256_movemask_pd(mask);
        for i in 0..LANES {
            if (mask_bits & (1 << i)) != 0 {
                out.push(chunk_idx * LANES + i);
            }
        }
    }

    let base = values.len() - remainder.len();
    for (i, &v) in remainder.iter().enumerate() {
        if v >= lo && v <= hi {
            out.push(base + i);
        }
    }

    out
}
