//! Aggregation of per-class estimates into global totals.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use legality_core::{Material, MaterialClass};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Result, SamplerError};
use crate::observation::SampleObservation;
use crate::stats::{biguint_to_f64, ratio_or_nan, NeumaierSum};
use crate::table::{read_material_table, read_observation_table, write_rows};

/// The observation that stands for a class in the analysis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassEstimate {
    pub legal_ratio: f64,
    pub sample_size: u64,
    pub std_error: f64,
}

impl Default for ClassEstimate {
    /// A class never sampled counts as fully legal with no uncertainty.
    fn default() -> Self {
        Self {
            legal_ratio: 1.0,
            sample_size: 0,
            std_error: 0.0,
        }
    }
}

impl From<&SampleObservation> for ClassEstimate {
    fn from(o: &SampleObservation) -> Self {
        Self {
            legal_ratio: o.legal_ratio,
            sample_size: o.sample_size,
            std_error: o.std_error,
        }
    }
}

impl ClassEstimate {
    /// Picks the largest sample; ties go to the smaller standard error, then
    /// to the earlier row.
    pub fn select<'a>(observations: impl IntoIterator<Item = &'a SampleObservation>) -> Self {
        let mut best: Option<&SampleObservation> = None;
        for o in observations {
            let better = match best {
                None => true,
                Some(b) => {
                    o.sample_size > b.sample_size
                        || (o.sample_size == b.sample_size && o.std_error < b.std_error)
                }
            };
            if better {
                best = Some(o);
            }
        }
        best.map(ClassEstimate::from).unwrap_or_default()
    }

    pub fn is_observed(&self) -> bool {
        self.sample_size > 0
    }
}

/// One row of the analysis table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisRow {
    pub id: u64,
    pub white: Material,
    pub black: Material,
    pub best_legal_ratio: f64,
    pub best_sample_size: u64,
    pub best_std_error: f64,
    pub diagram_count_str: String,
    pub estimated_legal_count: f64,
    pub estimated_legal_count_str: String,
}

impl AnalysisRow {
    pub fn new(class: &MaterialClass, estimate: ClassEstimate) -> Self {
        let estimated_legal_count = biguint_to_f64(&class.diagram_count) * estimate.legal_ratio;
        Self {
            id: class.id,
            white: class.white,
            black: class.black,
            best_legal_ratio: estimate.legal_ratio,
            best_sample_size: estimate.sample_size,
            best_std_error: estimate.std_error,
            diagram_count_str: class.diagram_count.to_string(),
            estimated_legal_count,
            estimated_legal_count_str: estimated_legal_count.to_string(),
        }
    }
}

/// Global totals over all classes.
///
/// Ratios with a zero denominator are NaN.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GlobalSummary {
    pub total_theoretical: f64,
    pub total_estimated_legal: f64,
    pub legal_fraction: f64,
    pub global_variance: f64,
    pub global_std: f64,
    pub relative_uncertainty: f64,
    pub classes_with_observations: usize,
    pub classes_without_observations: usize,
}

impl fmt::Display for GlobalSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total theoretical diagrams: {:.6e}", self.total_theoretical)?;
        writeln!(f, "Estimated legal diagrams:   {:.6e}", self.total_estimated_legal)?;
        writeln!(f, "Legal fraction:             {:.6e}", self.legal_fraction)?;
        writeln!(f, "Global standard error:      {:.6e}", self.global_std)?;
        writeln!(f, "Relative uncertainty:       {:.6e}", self.relative_uncertainty)?;
        write!(
            f,
            "Classes sampled: {} (unsampled: {})",
            self.classes_with_observations, self.classes_without_observations
        )
    }
}

/// Per-class rows and global totals.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub rows: Vec<AnalysisRow>,
    pub summary: GlobalSummary,
}

/// Combines classes with their observations, in class table order.
///
/// Observations of classes absent from `classes` are ignored.
pub fn analyze(classes: &[MaterialClass], observations: &[SampleObservation]) -> Analysis {
    let mut by_class: HashMap<u64, Vec<&SampleObservation>> = HashMap::new();
    for o in observations {
        by_class.entry(o.class_id).or_default().push(o);
    }

    let mut theoretical = NeumaierSum::new();
    let mut estimated = NeumaierSum::new();
    let mut variance = NeumaierSum::new();
    let mut observed = 0;
    let mut rows = Vec::with_capacity(classes.len());

    for class in classes {
        let estimate = by_class
            .remove(&class.id)
            .map(|obs| ClassEstimate::select(obs))
            .unwrap_or_default();
        if estimate.is_observed() {
            observed += 1;
        }

        let diagrams = biguint_to_f64(&class.diagram_count);
        let row = AnalysisRow::new(class, estimate);
        theoretical.add(diagrams);
        estimated.add(row.estimated_legal_count);
        variance.add((diagrams * estimate.std_error).powi(2));
        rows.push(row);
    }

    if !by_class.is_empty() {
        debug!(
            event = "orphan_observations",
            classes = by_class.len(),
            "observations for unknown classes ignored"
        );
    }

    let total_theoretical = theoretical.total();
    let total_estimated_legal = estimated.total();
    let global_variance = variance.total();
    let global_std = global_variance.sqrt();
    let summary = GlobalSummary {
        total_theoretical,
        total_estimated_legal,
        legal_fraction: ratio_or_nan(total_estimated_legal, total_theoretical),
        global_variance,
        global_std,
        relative_uncertainty: ratio_or_nan(global_std, total_estimated_legal),
        classes_with_observations: observed,
        classes_without_observations: classes.len() - observed,
    };

    Analysis { rows, summary }
}

/// Reads the material and results tables, writes the analysis table to
/// `output` and returns the analysis.
///
/// A missing results file is not fatal: every class then keeps the default
/// ratio of `1.0`.
pub fn analyze_files(
    material_file: impl AsRef<Path>,
    results_file: impl AsRef<Path>,
    output: impl AsRef<Path>,
) -> Result<Analysis> {
    let classes = read_material_table(material_file)?;
    let results_file = results_file.as_ref();
    let observations = match read_observation_table(results_file) {
        Ok(rows) => rows,
        Err(SamplerError::InputMissing(path)) => {
            warn!(
                event = "results_missing",
                path = %path.display(),
                "no results table, all ratios default to 1.0"
            );
            Vec::new()
        }
        Err(err) => return Err(err),
    };

    let analysis = analyze(&classes, &observations);
    write_rows(output.as_ref(), &analysis.rows)?;

    let s = &analysis.summary;
    info!(
        event = "analysis_summary",
        classes = analysis.rows.len(),
        sampled = s.classes_with_observations,
        unsampled = s.classes_without_observations,
        total_theoretical = s.total_theoretical,
        total_estimated_legal = s.total_estimated_legal,
        legal_fraction = s.legal_fraction,
        global_std = s.global_std,
        relative_uncertainty = s.relative_uncertainty,
    );
    Ok(analysis)
}

#[cfg(test)]
#[path = "analysis_tests.rs"]
mod tests;
