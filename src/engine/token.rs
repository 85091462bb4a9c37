//! Token locations.

use serde::{Deserialize, Serialize};

use super::board::{
    absolute_cell, Color, DIE_FACES, RELEASE_ROLL, STRETCH_ENTRY_STEP, STRETCH_LENGTH, TOKENS_PER_COLOR,
};

/// Where a single token is. A token holds exactly one of these at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "at", rename_all = "snake_case")]
pub enum TokenLocation {
    /// Waiting in the yard for a six
    #[default]
    AtHome,
    /// On the shared path, `step` cells past the color's start cell
    OnMainPath { step: u8 },
    /// In the color's private stretch
    OnHomeStretch { index: u8 },
    /// Reached the goal; never moves again
    Finished,
}

/// All tokens of one color, indexed by ordinal.
pub type TokenSet = [TokenLocation; TOKENS_PER_COLOR];

impl TokenLocation {
    pub fn is_at_home(&self) -> bool {
        matches!(self, Self::AtHome)
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished)
    }

    /// Shared-path cell occupied by this token, if it is on the shared path.
    pub fn absolute_cell(&self, color: Color) -> Option<u8> {
        match self {
            Self::OnMainPath { step } => Some(absolute_cell(color, *step)),
            _ => None,
        }
    }

    /// Total distance travelled. Strictly grows with every legal move.
    pub fn progress(&self) -> u8 {
        match self {
            Self::AtHome => 0,
            Self::OnMainPath { step } => step.saturating_add(1),
            Self::OnHomeStretch { index } => (STRETCH_ENTRY_STEP + 1).saturating_add(*index),
            Self::Finished => STRETCH_ENTRY_STEP + STRETCH_LENGTH,
        }
    }

    /// Check that the stored step or index is in range.
    pub fn is_well_formed(&self) -> bool {
        match self {
            Self::OnMainPath { step } => *step < STRETCH_ENTRY_STEP,
            // the last stretch cell is represented as Finished
            Self::OnHomeStretch { index } => *index < STRETCH_LENGTH - 1,
            _ => true,
        }
    }

    /// Location after moving `roll` cells, walking the path one cell at a
    /// time. `None` when the move is impossible: still at home without a
    /// six, already finished, overshooting the goal, or not a die face.
    pub fn destination(&self, roll: u8) -> Option<TokenLocation> {
        if !(1..=DIE_FACES).contains(&roll) {
            return None;
        }

        match *self {
            Self::AtHome if roll == RELEASE_ROLL => Some(Self::OnMainPath { step: 0 }),
            Self::AtHome | Self::Finished => None,
            Self::OnMainPath { step } => {
                let mut location = Self::OnMainPath { step };
                for _ in 0..roll {
                    location = location.step_once()?;
                }
                Some(location)
            }
            Self::OnHomeStretch { index } => {
                let target = index.checked_add(roll)?;
                let goal = STRETCH_LENGTH - 1;
                if target > goal {
                    None
                } else if target == goal {
                    Some(Self::Finished)
                } else {
                    Some(Self::OnHomeStretch { index: target })
                }
            }
        }
    }

    fn step_once(self) -> Option<TokenLocation> {
        match self {
            Self::OnMainPath { step } if step >= STRETCH_ENTRY_STEP - 1 => {
                Some(Self::OnHomeStretch { index: 0 })
            }
            Self::OnMainPath { step } => Some(Self::OnMainPath { step: step + 1 }),
            Self::OnHomeStretch { index } => match index.checked_add(1)? {
                next if next == STRETCH_LENGTH - 1 => Some(Self::Finished),
                next if next < STRETCH_LENGTH - 1 => Some(Self::OnHomeStretch { index: next }),
                _ => None,
            },
            Self::AtHome | Self::Finished => None,
        }
    }
}
