use super::conformers::ConformerGroup;
use thiserror::Error;

pub const DEFAULT_B_AVG_MAX: f64 = 40.0;
pub const DEFAULT_B_CV_MAX: f64 = 0.2;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ClassifyError {
    #[error("Conformer group contains no atoms")]
    EmptyGroup,
    #[error("Degenerate B-factor statistics: mean is {mean} (must be positive), coefficient of variation is undefined")]
    DegenerateStatistics { mean: f64 },
}

/// Upper limits above which a conformer group is considered poorly modelled.
///
/// Both comparisons are strict: a value equal to its limit is acceptable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Largest acceptable mean B-factor.
    pub b_avg_max: f64,
    /// Largest acceptable coefficient of variation of the B-factors.
    pub b_cv_max: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            b_avg_max: DEFAULT_B_AVG_MAX,
            b_cv_max: DEFAULT_B_CV_MAX,
        }
    }
}

/// Descriptive statistics over the B-factors of one atom group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BFactorStats {
    pub count: usize,
    /// Arithmetic mean.
    pub mean: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

impl BFactorStats {
    /// Computes statistics over a sequence of B-factors.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifyError::EmptyGroup`] if `values` is empty.
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Result<Self, ClassifyError> {
        let values: Vec<f64> = values.into_iter().collect();
        if values.is_empty() {
            return Err(ClassifyError::EmptyGroup);
        }

        let count = values.len();
        let n = count as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let (min, max) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });

        Ok(Self {
            count,
            mean,
            std_dev: variance.sqrt(),
            min,
            max,
        })
    }

    /// Standard deviation divided by the mean.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifyError::DegenerateStatistics`] when the mean is not
    /// positive or not finite.
    pub fn coefficient_of_variation(&self) -> Result<f64, ClassifyError> {
        if self.mean <= 0.0 || !self.mean.is_finite() {
            return Err(ClassifyError::DegenerateStatistics { mean: self.mean });
        }
        Ok(self.std_dev / self.mean)
    }
}

/// The outcome of checking one conformer group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Verdict {
    pub mean_b: f64,
    pub coefficient_of_variation: f64,
    pub high_mean: bool,
    pub high_cv: bool,
}

impl Verdict {
    pub fn is_anomalous(&self) -> bool {
        self.high_mean || self.high_cv
    }
}

/// Judges conformer groups against a fixed pair of [`Thresholds`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResidueClassifier {
    thresholds: Thresholds,
}

impl ResidueClassifier {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Classifies one conformer group.
    pub fn classify(&self, group: &ConformerGroup<'_>) -> Result<Verdict, ClassifyError> {
        self.classify_values(group.b_factors())
    }

    /// Classifies a bare sequence of B-factors.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifyError::EmptyGroup`] for an empty sequence and
    /// [`ClassifyError::DegenerateStatistics`] when the mean is not positive.
    pub fn classify_values(
        &self,
        values: impl IntoIterator<Item = f64>,
    ) -> Result<Verdict, ClassifyError> {
        let stats = BFactorStats::from_values(values)?;
        let cv = stats.coefficient_of_variation()?;
        Ok(Verdict {
            mean_b: stats.mean,
            coefficient_of_variation: cv,
            high_mean: stats.mean > self.thresholds.b_avg_max,
            high_cv: cv > self.thresholds.b_cv_max,
        })
    }
}
