pub mod crossword;
pub mod word_bank;
