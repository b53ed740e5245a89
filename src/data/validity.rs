use std::num::NonZeroUsize;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Valid-run averaging
// ---------------------------------------------------------------------------

/// Per-block averages over the successful repetitions of a sweep.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidRunAverage {
    /// Indices of blocks with at least one successful repetition, increasing.
    pub valid_indices: Vec<usize>,
    /// Mean over the successful repetitions of each block in `valid_indices`.
    pub valid_means: Vec<f64>,
    /// One entry per block: did *any* repetition of the block succeed.
    pub block_any_success: Vec<bool>,
}

impl ValidRunAverage {
    /// True when every block had at least one success. This is the
    /// condition the plots use to decide whether to connect the markers.
    pub fn all_blocks_valid(&self) -> bool {
        self.block_any_success.iter().all(|&ok| ok)
    }
}

/// Average a metric over the successful repetitions of each block.
///
/// `metric` holds one value per successful repetition, in order;
/// `statuses` holds one flag per repetition and is read in blocks of
/// `repeat`. Inputs are not validated (see [`check_shape`]): surplus
/// values are ignored and a success with no value left contributes
/// nothing to its block's mean.
pub fn average_valid_runs(
    metric: &[f64],
    statuses: &[bool],
    repeat: NonZeroUsize,
) -> ValidRunAverage {
    let mut out = ValidRunAverage::default();
    if metric.is_empty() {
        return out;
    }

    let mut values = metric.iter().copied();
    for (block, flags) in statuses.chunks(repeat.get()).enumerate() {
        let mut sum = 0.0;
        let mut count = 0usize;
        for _ in flags.iter().filter(|&&ok| ok) {
            if let Some(v) = values.next() {
                sum += v;
                count += 1;
            }
        }

        out.block_any_success.push(flags.iter().any(|&ok| ok));
        if count > 0 {
            out.valid_indices.push(block);
            out.valid_means.push(sum / count as f64);
        }
    }
    out
}

/// Plain mean of consecutive chunks of `repeat` values. The last chunk may
/// be shorter and is averaged over its own length.
pub fn block_means(values: &[f64], repeat: NonZeroUsize) -> Vec<f64> {
    values
        .chunks(repeat.get())
        .map(|chunk| chunk.iter().sum::<f64>() / chunk.len() as f64)
        .collect()
}

// ---------------------------------------------------------------------------
// Shape check
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq)]
pub enum ShapeError {
    #[error("{len} statuses do not split into blocks of {repeat}")]
    RaggedBlocks { len: usize, repeat: usize },

    #[error("{successes} successful runs but {values} metric values")]
    CountMismatch { successes: usize, values: usize },
}

/// Check that `metric` and `statuses` line up the way
/// [`average_valid_runs`] expects.
pub fn check_shape(metric: &[f64], statuses: &[bool], repeat: NonZeroUsize) -> Result<(), ShapeError> {
    if statuses.len() % repeat.get() != 0 {
        return Err(ShapeError::RaggedBlocks {
            len: statuses.len(),
            repeat: repeat.get(),
        });
    }
    let successes = statuses.iter().filter(|&&ok| ok).count();
    if successes != metric.len() {
        return Err(ShapeError::CountMismatch {
            successes,
            values: metric.len(),
        });
    }
    Ok(())
}
