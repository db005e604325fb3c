//! Pairwise cosine similarity between sentence embeddings.

/// Square matrix of cosine similarities, stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    size: usize,
    values: Vec<f32>,
}

impl SimilarityMatrix {
    /// Build from L2-normalized dot products of every embedding pair.
    ///
    /// Zero-norm embeddings have similarity 0 with everything except themselves.
    pub fn from_embeddings(embeddings: &[Vec<f32>]) -> Self {
        let normalized: Vec<Vec<f32>> = embeddings.iter().map(|e| l2_normalize(e)).collect();
        let size = normalized.len();
        let mut values = vec![0.0; size * size];

        for i in 0..size {
            values[i * size + i] = 1.0;
            for j in (i + 1)..size {
                let similarity = dot(&normalized[i], &normalized[j]);
                values[i * size + j] = similarity;
                values[j * size + i] = similarity;
            }
        }

        Self { size, values }
    }

    /// Build from explicit rows. Rows shorter than the row count are padded with 0.
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Self {
        let size = rows.len();
        let mut values = vec![0.0; size * size];
        for (i, row) in rows.into_iter().enumerate() {
            for (j, value) in row.into_iter().take(size).enumerate() {
                values[i * size + j] = value;
            }
        }
        Self { size, values }
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f32 {
        self.values[i * self.size + j]
    }

    /// Multiply every entry by `factor`.
    pub fn scale(&mut self, factor: f32) {
        if (factor - 1.0).abs() > f32::EPSILON {
            self.values.iter_mut().for_each(|v| *v *= factor);
        }
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

fn l2_normalize(v: &[f32]) -> Vec<f32> {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm < f32::EPSILON {
        return vec![0.0; v.len()];
    }
    v.iter().map(|x| x / norm).collect()
}

/// Element-wise mean of `embeddings`; empty input gives an empty vector.
pub fn average_embeddings(embeddings: &[Vec<f32>]) -> Vec<f32> {
    let Some(first) = embeddings.first() else {
        return vec![];
    };
    let mut average = vec![0.0f32; first.len()];
    for embedding in embeddings {
        for (acc, value) in average.iter_mut().zip(embedding) {
            *acc += value;
        }
    }
    let count = embeddings.len() as f32;
    average.iter_mut().for_each(|v| *v /= count);
    average
}
