use crate::state::SuperposedState;
use crate::system::WaveVariable;
use rand::seq::SliceRandom;
use rand::Rng;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How ties between equally constrained variables are broken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum SelectionStrategy {
    /// Uniformly random among all variables sharing the lowest entropy.
    #[default]
    RandomLowest,
    /// The first lowest-entropy variable in topology order.
    FirstMinimum,
}

/// Variables sharing the lowest positive entropy, in topology order.
///
/// Resolved and empty variables (entropy 0) are never candidates.
pub fn lowest_entropy_candidates(waves: &[SuperposedState]) -> Vec<WaveVariable> {
    let mut min_entropy = usize::MAX;
    let mut candidates = Vec::new();
    for (index, wave) in waves.iter().enumerate() {
        let entropy = wave.entropy();
        if entropy == 0 || entropy > min_entropy {
            continue;
        }
        if entropy < min_entropy {
            min_entropy = entropy;
            candidates.clear();
        }
        candidates.push(WaveVariable(index));
    }
    candidates
}

/// Picks the next variable to observe, or `None` if nothing is ambiguous.
pub fn select_lowest_entropy<R: Rng + ?Sized>(
    waves: &[SuperposedState],
    strategy: SelectionStrategy,
    rng: &mut R,
) -> Option<WaveVariable> {
    let candidates = lowest_entropy_candidates(waves);
    match strategy {
        SelectionStrategy::FirstMinimum => candidates.first().copied(),
        SelectionStrategy::RandomLowest => candidates.choose(rng).copied(),
    }
}
