use std::{
  fmt::Display,
  ops::{Add, AddAssign, Mul},
};

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Pos {
  pub x: i32,
  pub y: i32,
}

impl Pos {
  pub const fn zero() -> Self {
    Self { x: 0, y: 0 }
  }

  pub const fn transpose(&self) -> Self {
    Self { x: self.y, y: self.x }
  }
}

impl Add<Diff> for Pos {
  type Output = Self;

  fn add(self, rhs: Diff) -> Self {
    Self { x: self.x + rhs.x, y: self.y + rhs.y }
  }
}

impl AddAssign<Diff> for Pos {
  fn add_assign(&mut self, rhs: Diff) {
    self.x += rhs.x;
    self.y += rhs.y;
  }
}

impl Display for Pos {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "({}, {})", self.x, self.y)
  }
}

#[derive(Clone, Copy, Debug)]
pub struct Diff {
  pub x: i32,
  pub y: i32,
}

impl Diff {
  /// Unit step along an entry: `(1, 0)` for across, `(0, 1)` for down.
  pub const fn step(is_row: bool) -> Self {
    if is_row {
      Self { x: 1, y: 0 }
    } else {
      Self { x: 0, y: 1 }
    }
  }
}

impl Mul<i32> for Diff {
  type Output = Diff;

  fn mul(self, rhs: i32) -> Self {
    Self { x: self.x * rhs, y: self.y * rhs }
  }
}

impl Display for Diff {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "({}, {})", self.x, self.y)
  }
}
