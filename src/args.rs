use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
  /// Grid layout file: '_' marks a fillable cell, 'X' a blocked one.
  pub structure: PathBuf,

  /// Newline-separated candidate word list.
  pub words: PathBuf,

  /// Suppress the timing summary.
  #[arg(long)]
  pub quiet: bool,
}
