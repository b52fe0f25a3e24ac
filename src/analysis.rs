//! Analysis collaborator boundary.
//!
//! The catalog does not compute statistics. Collections expose integrated
//! call-outs ([`Collection::signal_to_noise`] and friends) that read record
//! contents, allocate visualization paths, and delegate the math to an
//! implementation of [`AnalysisSuite`] supplied by the caller.
//!
//! [`Collection::signal_to_noise`]: crate::catalog::Collection::signal_to_noise

use crate::content::ArraySlab;
use crate::error::CatalogError;
use std::path::Path;

/// Numeric transforms over full record contents.
///
/// Each method may be handed a visualization output path (allocated inside
/// the collection's `visualization` directory); implementations that do not
/// render can ignore it.
pub trait AnalysisSuite {
    /// Signal-to-noise ratio over a set of traces.
    fn signal_to_noise(
        &self,
        traces: &ArraySlab,
        visualization: Option<&Path>,
    ) -> Result<ArraySlab, CatalogError>;

    /// Difference-of-means t-test between a fixed and a random trace set.
    /// Returns the value series and its running maximum series; the two
    /// optional paths are for the corresponding graphs.
    fn t_test(
        &self,
        fixed: &ArraySlab,
        random: &ArraySlab,
        visualization: Option<(&Path, &Path)>,
    ) -> Result<(ArraySlab, ArraySlab), CatalogError>;

    /// Correlation between predicted and observed leakage.
    fn correlation(
        &self,
        predicted: &ArraySlab,
        observed: &ArraySlab,
        visualization: Option<&Path>,
    ) -> Result<ArraySlab, CatalogError>;
}
