#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod args;

use std::fs;

use args::Args;
use clap::Parser;
use util::{error::XWordResult, time::time_fn};
use xword_puzzle::{crossword::Crossword, word_bank::WordBank};
use xword_solver::solver::Solver;

fn main() -> XWordResult {
  let args = Args::parse();

  let layout = fs::read_to_string(&args.structure)?;
  let words = fs::read_to_string(&args.words)?;
  let bank = WordBank::from_words(words.lines())?;
  let xword = Crossword::from_layout(&layout)?;

  let mut solver = Solver::new(&xword, &bank);
  let (elapsed, solution) = time_fn(|| solver.solve());
  match solution {
    Some(solution) => print!("{}", solution.render(&xword, &bank)?),
    None => println!("No solution."),
  }
  if !args.quiet {
    println!(
      "Search took {elapsed:?} ({} backtracks)",
      solver.backtracks()
    );
  }
  Ok(())
}
