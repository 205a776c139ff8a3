use std::collections::HashMap;

use util::error::{XWordError, XWordResult};

/// Dense word index, assigned in first-occurrence order so that every
/// id-ordered traversal of the bank is reproducible.
pub type WordId = u32;

#[derive(Clone, Debug)]
pub struct WordBank {
  words: Vec<String>,
  ids: HashMap<String, WordId>,
}

impl WordBank {
  /// Builds a bank from raw word-list entries. Words are lowercased,
  /// blank entries are skipped, and duplicates keep their first id.
  pub fn from_words<S: AsRef<str>>(words: impl IntoIterator<Item = S>) -> XWordResult<Self> {
    let mut bank = Self { words: vec![], ids: HashMap::new() };
    for word in words {
      let word = word.as_ref().trim();
      if word.is_empty() {
        continue;
      }
      if !word.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(
          XWordError::Parse(format!("Word \"{word}\" contains non-alphabetic characters")).into(),
        );
      }

      let word = word.to_ascii_lowercase();
      if !bank.ids.contains_key(&word) {
        let id = bank.words.len() as WordId;
        bank.ids.insert(word.clone(), id);
        bank.words.push(word);
      }
    }
    Ok(bank)
  }

  pub fn len(&self) -> usize {
    self.words.len()
  }

  pub fn is_empty(&self) -> bool {
    self.words.is_empty()
  }

  pub fn word(&self, id: WordId) -> Option<&str> {
    self.words.get(id as usize).map(String::as_str)
  }

  pub fn id_of(&self, word: &str) -> Option<WordId> {
    self.ids.get(word).copied()
  }

  pub fn ids(&self) -> impl Iterator<Item = WordId> {
    0..self.words.len() as WordId
  }

  pub fn words_with_id(&self) -> impl Iterator<Item = (WordId, &str)> {
    self
      .words
      .iter()
      .enumerate()
      .map(|(id, word)| (id as WordId, word.as_str()))
  }
}
