use std::{
  cmp::Reverse,
  collections::{HashMap, HashSet, VecDeque},
};

use itertools::Itertools;
use xword_puzzle::{
  crossword::{Crossword, SlotId},
  word_bank::{WordBank, WordId},
};

use crate::solution::Solution;

/// Directed consistency obligation: the first slot's domain must stay
/// supported by the second's.
type Arc = (SlotId, SlotId);

type Assignment = HashMap<SlotId, WordId>;

/// Stack of (slot, removed word) records. Replaying it puts every
/// domain back to exactly its state from before the recording began.
#[derive(Default)]
struct UndoLog {
  removals: Vec<(SlotId, WordId)>,
}

impl UndoLog {
  fn record(&mut self, slot: SlotId, word: WordId) {
    self.removals.push((slot, word));
  }
}

/// CSP solver over a crossword's slots: node consistency, AC-3
/// propagation, and backtracking search that maintains arc consistency
/// after every tentative assignment.
pub struct Solver<'a> {
  xword: &'a Crossword,
  bank: &'a WordBank,
  domains: Vec<HashSet<WordId>>,
  backtracks: u64,
}

impl<'a> Solver<'a> {
  pub fn new(xword: &'a Crossword, bank: &'a WordBank) -> Self {
    let full_domain: HashSet<_> = bank.ids().collect();
    Self {
      xword,
      bank,
      domains: vec![full_domain; xword.num_slots()],
      backtracks: 0,
    }
  }

  /// Number of tentative assignments abandoned during the search so
  /// far.
  pub fn backtracks(&self) -> u64 {
    self.backtracks
  }

  /// Runs preprocessing and backtracking search. `None` means the
  /// puzzle is proven unsatisfiable with this word bank; malformed
  /// puzzles never get this far (the model fails at construction).
  pub fn solve(&mut self) -> Option<Solution> {
    self.enforce_node_consistency();
    if !self.ac3(None, None, None) {
      return None;
    }
    let mut assignment = Assignment::new();
    self
      .backtrack(&mut assignment)
      .then(|| Solution::new(assignment))
  }

  /// Drops every word whose length differs from its slot's length.
  /// Length never changes afterwards, so one pass suffices.
  fn enforce_node_consistency(&mut self) {
    let bank = self.bank;
    for (slot, domain) in self.xword.slots().iter().zip(&mut self.domains) {
      domain.retain(|&word| {
        bank
          .word(word)
          .is_some_and(|word| word.len() == slot.length as usize)
      });
    }
  }

  fn char_at(&self, word: WordId, idx: u32) -> Option<u8> {
    self.bank.word(word)?.as_bytes().get(idx as usize).copied()
  }

  /// Whether two words agree at an overlap's character indices.
  fn chars_agree(&self, wx: WordId, i: u32, wy: WordId, j: u32) -> bool {
    match (self.char_at(wx, i), self.char_at(wy, j)) {
      (Some(a), Some(b)) => a == b,
      _ => false,
    }
  }

  /// Makes `x` arc consistent with `y` by dropping every word of `x`
  /// with no support in `y`'s domain: a supporting word must differ
  /// (the same word can't fill both slots) and agree at the overlap.
  /// Removals are recorded in `undo` when supplied. Returns whether
  /// `x`'s domain shrank.
  fn revise(&mut self, x: SlotId, y: SlotId, undo: Option<&mut UndoLog>) -> bool {
    let Some((i, j)) = self.xword.overlap(x, y) else {
      return false;
    };

    let unsupported: Vec<_> = self.domains[x as usize]
      .iter()
      .filter(|&&wx| {
        !self.domains[y as usize]
          .iter()
          .any(|&wy| wx != wy && self.chars_agree(wx, i, wy, j))
      })
      .copied()
      .collect();

    let revised = !unsupported.is_empty();
    if let Some(undo) = undo {
      for &word in &unsupported {
        undo.record(x, word);
      }
    }
    for word in unsupported {
      self.domains[x as usize].remove(&word);
    }
    revised
  }

  /// AC-3 worklist propagation. With `arcs` unset, seeds the worklist
  /// with every directed neighbor pair (full preprocessing pass);
  /// otherwise starts from the given subset. When a revision shrinks
  /// `x`, every arc (z, x) for unassigned neighbors z other than the
  /// support slot is re-enqueued unless already pending. Returns false
  /// as soon as any domain empties.
  fn ac3(
    &mut self,
    arcs: Option<Vec<Arc>>,
    assignment: Option<&Assignment>,
    mut undo: Option<&mut UndoLog>,
  ) -> bool {
    let mut queue: VecDeque<Arc> = match arcs {
      Some(arcs) => arcs.into(),
      None => self
        .xword
        .slot_ids()
        .flat_map(|x| self.xword.neighbors(x).iter().map(move |&y| (x, y)))
        .collect(),
    };
    let mut pending: HashSet<Arc> = queue.iter().copied().collect();

    while let Some((x, y)) = queue.pop_front() {
      pending.remove(&(x, y));
      if !self.revise(x, y, undo.as_deref_mut()) {
        continue;
      }
      if self.domains[x as usize].is_empty() {
        return false;
      }
      // Arc (y, x) is exempt: the words removed from x had no support
      // in y, so their absence cannot invalidate any of y's words.
      for &z in self.xword.neighbors(x) {
        if z == y || assignment.is_some_and(|assignment| assignment.contains_key(&z)) {
          continue;
        }
        let arc = (z, x);
        if pending.insert(arc) {
          queue.push_back(arc);
        }
      }
    }
    true
  }

  /// Whole-assignment consistency predicate: lengths match, words are
  /// pairwise distinct, and every assigned neighbor pair agrees at its
  /// overlap.
  fn consistent(&self, assignment: &Assignment) -> bool {
    let mut seen = HashSet::new();
    for (&slot_id, &word) in assignment {
      let Some(slot) = self.xword.slot(slot_id) else {
        return false;
      };
      let length_ok = self
        .bank
        .word(word)
        .is_some_and(|word| word.len() == slot.length as usize);
      if !length_ok || !seen.insert(word) {
        return false;
      }
      for &neighbor in self.xword.neighbors(slot_id) {
        if let (Some(&other), Some((i, j))) =
          (assignment.get(&neighbor), self.xword.overlap(slot_id, neighbor))
        {
          if !self.chars_agree(word, i, other, j) {
            return false;
          }
        }
      }
    }
    true
  }

  /// Minimum remaining values, ties broken by the most unassigned
  /// neighbors, then by enumeration order.
  fn select_unassigned_slot(&self, assignment: &Assignment) -> Option<SlotId> {
    self
      .xword
      .slot_ids()
      .filter(|id| !assignment.contains_key(id))
      .min_by_key(|&id| {
        let degree = self
          .xword
          .neighbors(id)
          .iter()
          .filter(|neighbor| !assignment.contains_key(neighbor))
          .count();
        (self.domains[id as usize].len(), Reverse(degree))
      })
  }

  /// Least constraining value: orders the slot's candidates by how
  /// many options they rule out across unassigned neighbors (identical
  /// word, or disagreement at the overlap), fewest first. Ties broken
  /// by word id. Read-only.
  fn ordered_values(&self, slot: SlotId, assignment: &Assignment) -> Vec<WordId> {
    self.domains[slot as usize]
      .iter()
      .map(|&word| {
        let conflicts: usize = self
          .xword
          .neighbors(slot)
          .iter()
          .filter(|neighbor| !assignment.contains_key(neighbor))
          .map(|&neighbor| {
            let Some((i, j)) = self.xword.overlap(slot, neighbor) else {
              return 0;
            };
            self.domains[neighbor as usize]
              .iter()
              .filter(|&&other| word == other || !self.chars_agree(word, i, other, j))
              .count()
          })
          .sum();
        (word, conflicts)
      })
      .sorted_by_key(|&(word, conflicts)| (conflicts, word))
      .map(|(word, _)| word)
      .collect()
  }

  /// Maintains arc consistency after assigning `word` to `slot`:
  /// collapses the slot's domain to the assigned word, then propagates
  /// along (neighbor, slot) arcs for unassigned neighbors. Every
  /// removal lands in `undo`. On success returns the inferred
  /// assignments (unassigned slots whose domain narrowed to a single
  /// word); `None` means some domain emptied and this branch is dead.
  fn inference(
    &mut self,
    assignment: &Assignment,
    slot: SlotId,
    word: WordId,
    undo: &mut UndoLog,
  ) -> Option<Vec<(SlotId, WordId)>> {
    let others: Vec<_> = self.domains[slot as usize]
      .iter()
      .filter(|&&other| other != word)
      .copied()
      .collect();
    for other in others {
      self.domains[slot as usize].remove(&other);
      undo.record(slot, other);
    }

    let arcs: Vec<_> = self
      .xword
      .neighbors(slot)
      .iter()
      .filter(|neighbor| !assignment.contains_key(neighbor))
      .map(|&neighbor| (neighbor, slot))
      .collect();
    if !self.ac3(Some(arcs), Some(assignment), Some(undo)) {
      return None;
    }

    // Singleton domains of disjoint slots can still duplicate an
    // assigned word; those stay unassigned and are rejected by
    // `consistent` when the search reaches them.
    let mut used: HashSet<_> = assignment.values().copied().collect();
    Some(
      self
        .xword
        .slot_ids()
        .filter(|id| !assignment.contains_key(id))
        .filter_map(|id| {
          let domain = &self.domains[id as usize];
          if domain.len() != 1 {
            return None;
          }
          let word = *domain.iter().next()?;
          used.insert(word).then_some((id, word))
        })
        .collect(),
    )
  }

  fn restore(&mut self, undo: UndoLog) {
    for (slot, word) in undo.removals.into_iter().rev() {
      self.domains[slot as usize].insert(word);
    }
  }

  fn backtrack(&mut self, assignment: &mut Assignment) -> bool {
    if assignment.len() == self.xword.num_slots() {
      return true;
    }
    let Some(slot) = self.select_unassigned_slot(assignment) else {
      return false;
    };

    for word in self.ordered_values(slot, assignment) {
      assignment.insert(slot, word);
      if self.consistent(assignment) {
        let mut undo = UndoLog::default();
        if let Some(inferred) = self.inference(assignment, slot, word, &mut undo) {
          for &(inferred_slot, inferred_word) in &inferred {
            assignment.insert(inferred_slot, inferred_word);
          }
          if self.backtrack(assignment) {
            return true;
          }
          for (inferred_slot, _) in &inferred {
            assignment.remove(inferred_slot);
          }
        }
        self.restore(undo);
      }
      assignment.remove(&slot);
      self.backtracks += 1;
    }
    false
  }
}
