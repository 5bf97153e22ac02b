//! Classification of real terrain pixels versus sentinel and padding.
//!
//! The mask is built by running a short list of [`ExclusionStage`]s in
//! order. Each stage takes the mask produced by the previous one and
//! clears the pixels it rejects.

use demraw_core::config::PaddingConfig;

/// Per-pixel validity, row-major. `true` marks real terrain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidityMask {
    width: usize,
    height: usize,
    valid: Vec<bool>,
}

impl ValidityMask {
    /// Mask with every pixel valid.
    pub fn all_valid(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            valid: vec![true; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.valid
    }

    pub fn is_valid(&self, row: usize, col: usize) -> bool {
        row < self.height && col < self.width && self.valid[row * self.width + col]
    }

    pub fn valid_count(&self) -> usize {
        self.valid.iter().filter(|&&v| v).count()
    }

    pub fn excluded_count(&self) -> usize {
        self.valid.len() - self.valid_count()
    }

    pub fn any_valid(&self) -> bool {
        self.valid.iter().any(|&v| v)
    }

    /// Clear every pixel whose sample matches `reject`. Returns how many
    /// previously valid pixels were cleared.
    fn exclude_where(&mut self, samples: &[f32], reject: impl Fn(f32) -> bool) -> usize {
        let mut cleared = 0;
        for (valid, &s) in self.valid.iter_mut().zip(samples) {
            if *valid && reject(s) {
                *valid = false;
                cleared += 1;
            }
        }
        cleared
    }
}

/// One step of the exclusion pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum ExclusionStage {
    /// Drop samples equal to the declared no-data value. A NaN sentinel drops NaN samples.
    Sentinel(f32),
    /// Drop NaN and infinite samples, which carry no elevation.
    NonFinite,
    /// Drop zero samples when zeros cluster in the border band.
    BorderPadding(PaddingConfig),
}

/// What a stage did to the mask.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StageOutcome {
    /// Previously valid pixels the stage cleared.
    pub excluded: usize,
    /// Set by [`ExclusionStage::BorderPadding`] when the heuristic fired.
    pub padding: Option<PaddingStats>,
}

impl ExclusionStage {
    /// Apply this stage to `mask` in place.
    pub fn apply(&self, samples: &[f32], mask: &mut ValidityMask) -> StageOutcome {
        match self {
            ExclusionStage::Sentinel(nodata) => {
                let nodata = *nodata;
                let excluded = if nodata.is_nan() {
                    mask.exclude_where(samples, f32::is_nan)
                } else {
                    mask.exclude_where(samples, |s| s == nodata)
                };
                StageOutcome {
                    excluded,
                    padding: None,
                }
            }
            ExclusionStage::NonFinite => StageOutcome {
                excluded: mask.exclude_where(samples, |s| !s.is_finite()),
                padding: None,
            },
            ExclusionStage::BorderPadding(config) => {
                let stats = padding_stats(samples, mask.width, mask.height, config);
                match stats {
                    Some(stats) if stats.detected => StageOutcome {
                        excluded: mask.exclude_where(samples, |s| s == 0.0),
                        padding: Some(stats),
                    },
                    _ => StageOutcome::default(),
                }
            }
        }
    }
}

/// Zero densities measured by the padding heuristic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaddingStats {
    pub border_size: usize,
    pub border_zero_ratio: f64,
    pub center_zero_ratio: f64,
    /// Whether the ratios classify the zeros as padding.
    pub detected: bool,
}

/// Measure border and center zero density.
///
/// Returns `None` when there are no zeros or nothing but zeros, in which
/// case there is nothing to tell apart.
pub fn padding_stats(
    samples: &[f32],
    width: usize,
    height: usize,
    config: &PaddingConfig,
) -> Option<PaddingStats> {
    let zeros = samples.iter().filter(|&&s| s == 0.0).count();
    if zeros == 0 || zeros == samples.len() {
        return None;
    }

    let border_size = config
        .min_border_pixels
        .max(width.min(height) / config.border_fraction_divisor.max(1));
    let in_border = |row: usize, col: usize| {
        row < border_size
            || col < border_size
            || row + border_size >= height
            || col + border_size >= width
    };

    let (start, end) = config.center_band;
    let band = |dim: usize| {
        let lo = (dim as f64 * start).floor() as usize;
        let hi = (dim as f64 * end).floor() as usize;
        lo..hi
    };
    let (center_rows, center_cols) = (band(height), band(width));

    let (mut border_total, mut border_zeros) = (0usize, 0usize);
    let (mut center_total, mut center_zeros) = (0usize, 0usize);
    for row in 0..height {
        for col in 0..width {
            let zero = samples[row * width + col] == 0.0;
            if in_border(row, col) {
                border_total += 1;
                border_zeros += zero as usize;
            }
            if center_rows.contains(&row) && center_cols.contains(&col) {
                center_total += 1;
                center_zeros += zero as usize;
            }
        }
    }

    let ratio = |zeros: usize, total: usize| {
        if total == 0 {
            0.0
        } else {
            zeros as f64 / total as f64
        }
    };
    let border_zero_ratio = ratio(border_zeros, border_total);
    let center_zero_ratio = ratio(center_zeros, center_total);
    let detected = border_zero_ratio > config.border_zero_ratio_threshold
        && (center_zero_ratio == 0.0
            || border_zero_ratio > config.border_to_center_factor * center_zero_ratio);

    log::debug!(
        "padding check: border {border_size}px, border zeros {border_zero_ratio:.3}, center zeros {center_zero_ratio:.3}, detected {detected}"
    );
    Some(PaddingStats {
        border_size,
        border_zero_ratio,
        center_zero_ratio,
        detected,
    })
}

/// Result of running the full exclusion pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub mask: ValidityMask,
    /// Pixels dropped as no-data or non-finite.
    pub sentinel_excluded: usize,
    pub padding_detected: bool,
    /// Pixels dropped as border padding.
    pub padding_excluded: usize,
}

/// Stages for a raster with an optional sentinel, in the order they run.
pub fn stages(nodata: Option<f32>, padding: &PaddingConfig) -> Vec<ExclusionStage> {
    let mut stages = Vec::with_capacity(3);
    if let Some(value) = nodata {
        stages.push(ExclusionStage::Sentinel(value));
    }
    stages.push(ExclusionStage::NonFinite);
    if padding.enabled {
        stages.push(ExclusionStage::BorderPadding(padding.clone()));
    }
    stages
}

/// Classify every sample of a `width × height` grid.
pub fn classify(
    samples: &[f32],
    width: usize,
    height: usize,
    nodata: Option<f32>,
    padding: &PaddingConfig,
) -> Classification {
    let mut result = Classification {
        mask: ValidityMask::all_valid(width, height),
        sentinel_excluded: 0,
        padding_detected: false,
        padding_excluded: 0,
    };
    for stage in stages(nodata, padding) {
        let outcome = stage.apply(samples, &mut result.mask);
        match stage {
            ExclusionStage::BorderPadding(_) => {
                result.padding_detected = outcome.padding.is_some();
                result.padding_excluded = outcome.excluded;
            }
            ExclusionStage::Sentinel(_) | ExclusionStage::NonFinite => {
                result.sentinel_excluded += outcome.excluded;
            }
        }
    }
    result
}
