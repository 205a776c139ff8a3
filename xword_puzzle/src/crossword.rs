use std::{collections::HashMap, fmt::Display};

use itertools::Itertools;
use util::{
  error::{XWordError, XWordResult},
  grid::{Grid, Gridlike},
  pos::{Diff, Pos},
};

/// Index of a slot in the crossword's slot enumeration: all across
/// slots in row-major order, then all down slots in column-scan order.
pub type SlotId = u32;

/// Runs shorter than this do not form slots; a lone fillable cell is
/// covered by the crossing run only.
const MIN_SLOT_LEN: u32 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tile {
  Letter(char),
  Empty,
  Wall,
}

impl Tile {
  pub fn fillable(&self) -> bool {
    matches!(self, Tile::Empty | Tile::Letter(_))
  }
}

impl Display for Tile {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(
      f,
      "{}",
      match self {
        Tile::Letter(c) => *c,
        Tile::Empty => ' ',
        Tile::Wall => '█',
      }
    )
  }
}

/// A maximal run of fillable cells, at least `MIN_SLOT_LEN` long.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct Slot {
  pub pos: Pos,
  pub length: u32,
  pub is_row: bool,
}

impl Slot {
  pub fn cells(&self) -> impl Iterator<Item = Pos> + '_ {
    let step = Diff::step(self.is_row);
    (0..self.length as i32).map(move |k| self.pos + step * k)
  }
}

#[derive(Clone, Debug)]
pub struct Crossword {
  grid: Grid<Tile>,
  slots: Vec<Slot>,
  /// For each ordered pair of intersecting slots (a, b), the character
  /// indices (i, j) with word(a)[i] == word(b)[j]. Stored in both
  /// orders.
  overlaps: HashMap<(SlotId, SlotId), (u32, u32)>,
  neighbors: Vec<Vec<SlotId>>,
}

impl Crossword {
  pub fn from_layout(layout: &str) -> XWordResult<Self> {
    let (width, height, tiles) = layout.lines().try_fold(
      (None, 0, vec![]),
      |(width, height, mut tiles), line| -> XWordResult<_> {
        let line = line.trim();
        tiles.extend(
          line
            .chars()
            .map(|c| match c {
              '_' => Ok(Tile::Empty),
              'X' => Ok(Tile::Wall),
              _ => Err(XWordError::Parse(format!("Unrecognized layout character '{c}'")).into()),
            })
            .collect::<XWordResult<Vec<_>>>()?,
        );
        if let Some(width) = width {
          if line.chars().count() != width {
            return Err(
              XWordError::Parse(format!(
                "Layout line lengths differ: {} vs {width}",
                line.chars().count()
              ))
              .into(),
            );
          }
        }

        Ok((Some(line.chars().count()), height + 1, tiles))
      },
    )?;

    let width = width.ok_or_else(|| XWordError::Parse("Empty layout string".to_owned()))? as u32;
    let grid = Grid::from_vec(tiles, width, height as u32)?;

    let slots: Vec<_> = scan_runs(&grid)
      .into_iter()
      .map(|(pos, length)| Slot { pos, length, is_row: true })
      .chain(
        scan_runs(&grid.transpose())
          .into_iter()
          .map(|(pos, length)| Slot {
            pos: pos.transpose(),
            length,
            is_row: false,
          }),
      )
      .collect();

    let (overlaps, neighbors) = build_overlaps(&slots);

    let crossword = Self { grid, slots, overlaps, neighbors };
    crossword.validate()?;
    Ok(crossword)
  }

  pub fn width(&self) -> u32 {
    self.grid.width()
  }

  pub fn height(&self) -> u32 {
    self.grid.height()
  }

  pub fn num_slots(&self) -> usize {
    self.slots.len()
  }

  pub fn slots(&self) -> &[Slot] {
    &self.slots
  }

  pub fn slot_ids(&self) -> impl Iterator<Item = SlotId> {
    0..self.slots.len() as SlotId
  }

  pub fn slot(&self, id: SlotId) -> Option<Slot> {
    self.slots.get(id as usize).copied()
  }

  /// Character indices that must agree between two intersecting slots,
  /// or `None` if the slots don't intersect.
  pub fn overlap(&self, a: SlotId, b: SlotId) -> Option<(u32, u32)> {
    self.overlaps.get(&(a, b)).copied()
  }

  pub fn neighbors(&self, id: SlotId) -> &[SlotId] {
    self
      .neighbors
      .get(id as usize)
      .map(Vec::as_slice)
      .unwrap_or_default()
  }

  /// Structural sanity checks for a model handed to the solver. All
  /// unreachable for grids built by `from_layout`.
  fn validate(&self) -> XWordResult {
    for (id, slot) in self.slots.iter().enumerate() {
      if slot.length < MIN_SLOT_LEN {
        return Err(
          XWordError::Internal(format!("Slot {id} has length {}", slot.length)).into(),
        );
      }
      for pos in slot.cells() {
        if !self.grid.get(pos).is_some_and(Tile::fillable) {
          return Err(
            XWordError::Internal(format!("Slot {id} covers unfillable cell {pos}")).into(),
          );
        }
      }
    }
    for (&(a, b), &(i, j)) in &self.overlaps {
      let (slot_a, slot_b) = match (self.slot(a), self.slot(b)) {
        (Some(slot_a), Some(slot_b)) => (slot_a, slot_b),
        _ => {
          return Err(XWordError::Internal(format!("Overlap references unknown slot {a}/{b}")).into())
        }
      };
      if i >= slot_a.length || j >= slot_b.length {
        return Err(
          XWordError::Internal(format!(
            "Overlap ({i}, {j}) out of range for slots {a} (length {}) and {b} (length {})",
            slot_a.length, slot_b.length
          ))
          .into(),
        );
      }
    }
    Ok(())
  }

  /// Writes the given words into a copy of the grid. Conflicting
  /// letters at a shared cell indicate a solver bug.
  pub fn render<'a>(
    &self,
    entries: impl IntoIterator<Item = (SlotId, &'a str)>,
  ) -> XWordResult<Grid<Tile>> {
    let mut grid = self.grid.clone();
    for (id, word) in entries {
      let slot = self
        .slot(id)
        .ok_or_else(|| XWordError::Internal(format!("Unknown slot id {id}")))?;
      if word.chars().count() != slot.length as usize {
        return Err(
          XWordError::Internal(format!(
            "Word \"{word}\" does not fit slot {id} of length {}",
            slot.length
          ))
          .into(),
        );
      }
      for (pos, c) in slot.cells().zip(word.chars()) {
        let tile = grid
          .get_mut(pos)
          .ok_or_else(|| XWordError::Internal(format!("Position {pos} is out of bounds")))?;
        match tile {
          Tile::Letter(existing) if *existing != c => {
            return Err(
              XWordError::Internal(format!(
                "Conflicting letter assignment at position {pos}: {c} vs {existing}"
              ))
              .into(),
            );
          }
          _ => *tile = Tile::Letter(c),
        }
      }
    }
    Ok(grid)
  }
}

/// Scans each row of `board` for maximal runs of fillable tiles,
/// returning (start, length) pairs in the board's own coordinates.
/// Column runs come from scanning the transposed grid.
fn scan_runs<G: Gridlike<Tile>>(board: &G) -> Vec<(Pos, u32)> {
  let mut runs = vec![];
  for y in 0..board.height() {
    let mut run_start = None;
    for (x, tile) in board.iter_row(y).enumerate() {
      if tile.fillable() {
        run_start.get_or_insert(x);
      } else {
        flush_run(&mut runs, &mut run_start, x, y);
      }
    }
    flush_run(&mut runs, &mut run_start, board.width() as usize, y);
  }
  runs
}

fn flush_run(runs: &mut Vec<(Pos, u32)>, run_start: &mut Option<usize>, end: usize, y: u32) {
  if let Some(start) = run_start.take() {
    let length = (end - start) as u32;
    if length >= MIN_SLOT_LEN {
      runs.push((Pos { x: start as i32, y: y as i32 }, length));
    }
  }
}

/// Pairs every across slot with every down slot sharing a cell. Two
/// parallel slots never intersect (their runs are maximal), so only
/// across/down pairs are considered.
fn build_overlaps(
  slots: &[Slot],
) -> (HashMap<(SlotId, SlotId), (u32, u32)>, Vec<Vec<SlotId>>) {
  let across_cells: HashMap<Pos, (SlotId, u32)> = slots
    .iter()
    .enumerate()
    .filter(|(_, slot)| slot.is_row)
    .flat_map(|(id, slot)| {
      slot
        .cells()
        .enumerate()
        .map(move |(idx, pos)| (pos, (id as SlotId, idx as u32)))
        .collect::<Vec<_>>()
    })
    .collect();

  let mut overlaps = HashMap::new();
  let mut neighbors = vec![vec![]; slots.len()];
  for (b, slot) in slots.iter().enumerate().filter(|(_, slot)| !slot.is_row) {
    let b = b as SlotId;
    for (j, pos) in slot.cells().enumerate() {
      if let Some(&(a, i)) = across_cells.get(&pos) {
        overlaps.insert((a, b), (i, j as u32));
        overlaps.insert((b, a), (j as u32, i));
        neighbors[a as usize].push(b);
        neighbors[b as usize].push(a);
      }
    }
  }
  for adjacent in &mut neighbors {
    *adjacent = adjacent.iter().copied().sorted().dedup().collect();
  }

  (overlaps, neighbors)
}

#[cfg(test)]
mod tests {
  #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

  use googletest::prelude::*;
  use util::pos::Pos;

  use super::{Crossword, Slot, Tile};

  #[gtest]
  fn test_empty_layout() {
    let xword = Crossword::from_layout("");
    expect_that!(xword, err(anything()));
  }

  #[gtest]
  fn test_ragged_layout() {
    let xword = Crossword::from_layout(
      "___
       __",
    );
    expect_that!(xword, err(anything()));
  }

  #[gtest]
  fn test_unknown_character() {
    let xword = Crossword::from_layout("_#_");
    expect_that!(xword, err(anything()));
  }

  #[gtest]
  fn test_slot_enumeration() {
    let xword = Crossword::from_layout(
      "__
       X_",
    );

    assert_that!(xword, ok(anything()));
    let xword = xword.unwrap();
    expect_that!(
      xword.slots().to_vec(),
      container_eq([
        Slot { pos: Pos::zero(), length: 2, is_row: true },
        Slot { pos: Pos { x: 1, y: 0 }, length: 2, is_row: false },
      ])
    );
  }

  #[gtest]
  fn test_single_cells_form_no_slots() {
    let xword = Crossword::from_layout(
      "_X_
       XXX
       _X_",
    );

    assert_that!(xword, ok(anything()));
    expect_that!(xword.unwrap().num_slots(), eq(0));
  }

  #[gtest]
  fn test_overlaps() {
    let xword = Crossword::from_layout(
      "__
       X_",
    )
    .unwrap();

    // Across slot 0 and down slot 1 share the cell (1, 0): index 1 of
    // the across word, index 0 of the down word.
    expect_that!(xword.overlap(0, 1), some(eq((1, 0))));
    expect_that!(xword.overlap(1, 0), some(eq((0, 1))));
    expect_that!(xword.neighbors(0).to_vec(), container_eq([1]));
    expect_that!(xword.neighbors(1).to_vec(), container_eq([0]));
  }

  #[gtest]
  fn test_disjoint_slots() {
    let xword = Crossword::from_layout(
      "___
       XXX
       ___",
    )
    .unwrap();

    assert_that!(xword.num_slots(), eq(2));
    expect_that!(xword.overlap(0, 1), none());
    expect_that!(xword.neighbors(0).to_vec(), empty());
    expect_that!(xword.neighbors(1).to_vec(), empty());
  }

  #[gtest]
  fn test_crossing_slots() {
    let xword = Crossword::from_layout(
      "___
       XX_
       XX_
       XX_
       XX_",
    )
    .unwrap();

    assert_that!(
      xword.slots().to_vec(),
      container_eq([
        Slot { pos: Pos::zero(), length: 3, is_row: true },
        Slot { pos: Pos { x: 2, y: 0 }, length: 5, is_row: false },
      ])
    );
    expect_that!(xword.overlap(0, 1), some(eq((2, 0))));
  }

  #[gtest]
  fn test_render() {
    let xword = Crossword::from_layout(
      "__
       X_",
    )
    .unwrap();

    let grid = xword.render([(0, "ab"), (1, "bc")]);
    assert_that!(grid, ok(anything()));
    expect_that!(grid.unwrap().to_string(), eq("ab\n█c\n"));
  }

  #[gtest]
  fn test_render_conflict() {
    let xword = Crossword::from_layout(
      "__
       X_",
    )
    .unwrap();

    expect_that!(xword.render([(0, "ab"), (1, "cd")]), err(anything()));
  }

  #[gtest]
  fn test_render_wrong_length() {
    let xword = Crossword::from_layout(
      "__
       X_",
    )
    .unwrap();

    expect_that!(xword.render([(0, "abc")]), err(anything()));
  }

  #[gtest]
  fn test_validate_rejects_bad_overlap() {
    let mut xword = Crossword::from_layout(
      "__
       X_",
    )
    .unwrap();

    xword.overlaps.insert((0, 1), (5, 0));
    expect_that!(xword.validate(), err(anything()));
  }

  #[gtest]
  fn test_validate_rejects_short_slot() {
    let mut xword = Crossword::from_layout(
      "__
       X_",
    )
    .unwrap();

    xword.slots.push(Slot { pos: Pos::zero(), length: 1, is_row: false });
    expect_that!(xword.validate(), err(anything()));
  }

  #[gtest]
  fn test_tile_display() {
    expect_that!(Tile::Wall.to_string(), eq("█"));
    expect_that!(Tile::Empty.to_string(), eq(" "));
    expect_that!(Tile::Letter('q').to_string(), eq("q"));
  }
}
