//! Averaging strategies for multi-class metrics

/// Averaging strategy for multi-class metrics
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Average {
    /// Unweighted mean over the label space
    Macro,
    /// Mean weighted by support (number of true instances per label)
    Weighted,
}
