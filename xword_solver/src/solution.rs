use std::collections::HashMap;

use util::{
  error::{XWordError, XWordResult},
  grid::Grid,
};
use xword_puzzle::{
  crossword::{Crossword, SlotId, Tile},
  word_bank::{WordBank, WordId},
};

/// A complete assignment: every slot of the puzzle mapped to exactly
/// one word from the bank.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Solution {
  entries: HashMap<SlotId, WordId>,
}

impl Solution {
  pub(crate) fn new(entries: HashMap<SlotId, WordId>) -> Self {
    Self { entries }
  }

  pub fn word_for(&self, slot: SlotId) -> Option<WordId> {
    self.entries.get(&slot).copied()
  }

  pub fn iter(&self) -> impl Iterator<Item = (SlotId, WordId)> + '_ {
    self.entries.iter().map(|(&slot, &word)| (slot, word))
  }

  pub fn render(&self, xword: &Crossword, bank: &WordBank) -> XWordResult<Grid<Tile>> {
    xword.render(
      self
        .iter()
        .map(|(slot, word)| {
          bank
            .word(word)
            .map(|word| (slot, word))
            .ok_or_else(|| XWordError::Internal(format!("Unknown word id {word}")).into())
        })
        .collect::<XWordResult<Vec<_>>>()?,
    )
  }
}
