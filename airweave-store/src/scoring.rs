use airweave_core::entity::SparseVector;

/// Cosine similarity between two dense vectors. Returns `0.0` for a
/// zero-magnitude vector rather than dividing by zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Sparse dot product over matching indices, the BM25-style term-overlap
/// score for a sparse (keyword) vector pair.
pub fn sparse_dot(a: &SparseVector, b: &SparseVector) -> f32 {
    let mut score = 0.0;
    for (idx, value) in a.indices.iter().zip(&a.values) {
        if let Some(pos) = b.indices.iter().position(|i| i == idx) {
            score += value * b.values[pos];
        }
    }
    score
}

/// Combines a dense and a sparse similarity into one hybrid score. Equal
/// weighting; a query missing one side just falls back to the other.
pub fn hybrid_score(dense: Option<f32>, sparse: Option<f32>) -> f32 {
    match (dense, sparse) {
        (Some(d), Some(s)) => 0.5 * d + 0.5 * s,
        (Some(d), None) => d,
        (None, Some(s)) => s,
        (None, None) => 0.0,
    }
}

/// Linear decay over `[0.0, 1.0]`: `1.0` for a point at `age == 0`, `0.0`
/// once `age >= span`. `span <= 0.0` (a collection with a single
/// timestamp, or none) disables decay by returning full weight.
pub fn decay(age_secs: f64, span_secs: f64) -> f32 {
    if span_secs <= 0.0 {
        return 1.0;
    }
    (1.0 - (age_secs / span_secs).clamp(0.0, 1.0)) as f32
}

/// `final = sim * ((1 - weight) + weight * decay)`, the open-question
/// resolution for combining similarity with recency.
pub fn apply_decay(similarity: f32, decay_weight: f32, decay_value: f32) -> f32 {
    similarity * ((1.0 - decay_weight) + decay_weight * decay_value)
}
