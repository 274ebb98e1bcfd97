use bitvec::prelude::*;
use log::{error, warn};
use rand::seq::SliceRandom;
use rand::Rng;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Number of machine words backing a single superposed state.
pub const STATE_WORDS: usize = 1;

/// Maximum number of pure states a single exclusion class may hold.
pub const MAX_LOCAL_DIMENSION: usize = STATE_WORDS * u64::BITS as usize;

type StateBits = BitArray<[u64; STATE_WORDS], Lsb0>;

/// Identifies one concrete assignment ("this variable takes module #k").
///
/// The index is absolute: a pure state of exclusion class `c` lives at
/// `c * global_dimension + offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PureState(pub usize);

impl fmt::Display for PureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors raised when a superposed state is created with an invalid layout.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// The exclusion class declares no pure states at all.
    #[error("Exclusion class {class} has no pure states")]
    EmptyClass { class: usize },
    /// The class holds more states than the global stride between classes.
    #[error("Local dimension {local} of exclusion class {class} exceeds global dimension {global}")]
    LocalExceedsGlobal {
        class: usize,
        local: usize,
        global: usize,
    },
    /// The class does not fit into the fixed state width.
    #[error("Local dimension {0} exceeds the maximum state width of {max} bits", max = MAX_LOCAL_DIMENSION)]
    WidthExceeded(usize),
}

/// The set of pure states a wave variable may still take.
///
/// Bits are stored relative to the start of the state's exclusion class, so
/// two states of different classes are never comparable bit-for-bit.
/// Every bit at or beyond `local_dimension` is kept clear.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SuperposedState {
    bits: StateBits,
    exclusion_class: usize,
    global_dimension: usize,
    local_dimension: usize,
}

impl SuperposedState {
    fn validate(global: usize, local: usize, class: usize) -> Result<(), StateError> {
        if local == 0 {
            return Err(StateError::EmptyClass { class });
        }
        if local > MAX_LOCAL_DIMENSION {
            return Err(StateError::WidthExceeded(local));
        }
        if local > global {
            return Err(StateError::LocalExceedsGlobal {
                class,
                local,
                global,
            });
        }
        Ok(())
    }

    fn zeroed(global: usize, local: usize, class: usize) -> Self {
        Self {
            bits: BitArray::new([0; STATE_WORDS]),
            exclusion_class: class,
            global_dimension: global,
            local_dimension: local,
        }
    }

    /// Creates the maximal-entropy state: every pure state of `class` is possible.
    ///
    /// # Errors
    ///
    /// Returns a `StateError` if `local` is zero, larger than `global`, or wider
    /// than [`MAX_LOCAL_DIMENSION`].
    pub fn equiprobable_in_class(
        global: usize,
        local: usize,
        class: usize,
    ) -> Result<Self, StateError> {
        Self::validate(global, local, class)?;
        let mut state = Self::zeroed(global, local, class);
        state.bits[..local].fill(true);
        Ok(state)
    }

    /// Creates a state with no pure states set.
    ///
    /// # Errors
    ///
    /// Same validation as [`SuperposedState::equiprobable_in_class`].
    pub fn none(global: usize, local: usize, class: usize) -> Result<Self, StateError> {
        Self::validate(global, local, class)?;
        Ok(Self::zeroed(global, local, class))
    }

    /// The empty state of this state's own exclusion class.
    #[must_use]
    pub fn empty_like(&self) -> Self {
        Self::zeroed(
            self.global_dimension,
            self.local_dimension,
            self.exclusion_class,
        )
    }

    pub fn exclusion_class(&self) -> usize {
        self.exclusion_class
    }

    pub fn local_dimension(&self) -> usize {
        self.local_dimension
    }

    pub fn global_dimension(&self) -> usize {
        self.global_dimension
    }

    /// Absolute index of the first pure state of this class.
    pub fn class_offset(&self) -> usize {
        self.exclusion_class * self.global_dimension
    }

    fn offset_of(&self, pure: PureState) -> Option<usize> {
        let base = self.class_offset();
        (pure.0 >= base && pure.0 < base + self.local_dimension).then(|| pure.0 - base)
    }

    fn same_class(&self, other: &Self) -> bool {
        self.exclusion_class == other.exclusion_class
            && self.global_dimension == other.global_dimension
            && self.local_dimension == other.local_dimension
    }

    /// Returns true if `pure` belongs to this class and is still possible.
    ///
    /// Pure states of other exclusion classes are never contained.
    pub fn project(&self, pure: PureState) -> bool {
        self.offset_of(pure).is_some_and(|offset| self.bits[offset])
    }

    /// Marks `pure` as possible.
    ///
    /// Adding a pure state outside this class is a contract violation of the
    /// caller; the state is cleared instead of silently accepting it.
    pub fn add(&mut self, pure: PureState) {
        match self.offset_of(pure) {
            Some(offset) => self.bits.set(offset, true),
            None => {
                error!(
                    "Pure state {} does not belong to exclusion class {} (range {}..{}); clearing state",
                    pure,
                    self.exclusion_class,
                    self.class_offset(),
                    self.class_offset() + self.local_dimension
                );
                self.bits = BitArray::new([0; STATE_WORDS]);
            }
        }
    }

    /// Removes `pure` from the possible states. Foreign states are ignored.
    pub fn remove(&mut self, pure: PureState) {
        if let Some(offset) = self.offset_of(pure) {
            self.bits.set(offset, false);
        }
    }

    /// Intersection with `mask`.
    ///
    /// Masks from a different exclusion class yield the empty state of this
    /// state's class: such variables can never be compatible.
    #[must_use]
    pub fn mask_by(&self, mask: &Self) -> Self {
        if !self.same_class(mask) {
            return self.empty_like();
        }
        let mut masked = self.clone();
        for (word, other) in masked
            .bits
            .as_raw_mut_slice()
            .iter_mut()
            .zip(mask.bits.as_raw_slice())
        {
            *word &= *other;
        }
        masked
    }

    /// In-place union with `other`. Cross-class unions are ignored.
    pub fn union_with(&mut self, other: &Self) {
        if !self.same_class(other) {
            warn!(
                "Ignoring union of exclusion class {} into class {}",
                other.exclusion_class, self.exclusion_class
            );
            return;
        }
        for (word, other) in self
            .bits
            .as_raw_mut_slice()
            .iter_mut()
            .zip(other.bits.as_raw_slice())
        {
            *word |= *other;
        }
    }

    /// Number of pure states still possible.
    pub fn popcount(&self) -> usize {
        self.bits.count_ones()
    }

    /// `max(0, popcount - 1)`: zero for both resolved and empty states.
    pub fn entropy(&self) -> usize {
        self.popcount().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.bits.not_any()
    }

    /// True when exactly one pure state remains.
    pub fn is_resolved(&self) -> bool {
        self.popcount() == 1
    }

    /// The remaining pure state of a resolved variable.
    pub fn resolved_state(&self) -> Option<PureState> {
        if self.is_resolved() {
            self.components().first().copied()
        } else {
            None
        }
    }

    /// All possible pure states in ascending (absolute) order.
    pub fn components(&self) -> Vec<PureState> {
        let base = self.class_offset();
        self.bits[..self.local_dimension]
            .iter_ones()
            .map(|offset| PureState(base + offset))
            .collect()
    }

    /// Collapses the state to one uniformly chosen component.
    ///
    /// A state that is already resolved keeps its component and draws nothing
    /// from `rng`. Returns `None` and leaves the state untouched when it is
    /// empty; observing an empty state is a caller error.
    pub fn observe<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<PureState> {
        let components = self.components();
        let chosen = match components.as_slice() {
            [] => {
                error!(
                    "Attempted to observe an empty state of exclusion class {}",
                    self.exclusion_class
                );
                return None;
            }
            [single] => *single,
            many => *many.choose(rng)?,
        };
        self.bits = BitArray::new([0; STATE_WORDS]);
        self.add(chosen);
        Some(chosen)
    }
}

impl PartialEq for SuperposedState {
    fn eq(&self, other: &Self) -> bool {
        self.exclusion_class == other.exclusion_class
            && self.bits[..self.local_dimension] == other.bits[..other.local_dimension]
    }
}

impl Eq for SuperposedState {}

impl fmt::Display for SuperposedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "class {} {{", self.exclusion_class)?;
        for (index, pure) in self.components().iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{pure}")?;
        }
        write!(f, "}}")
    }
}
