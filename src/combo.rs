use std::collections::BTreeSet;
use std::fmt;

use rand::rngs::StdRng;
use rand::seq::{IteratorRandom, SliceRandom};
use rand::SeedableRng;

use crate::error::GenerateError;
use crate::keys::{CONTROL, SHIFT};

pub const ALPHABET: &str = "abcdefghijklmnopqrstuvwxyz";
pub const COMBO_MODIFIERS: [&str; 2] = [SHIFT, CONTROL];

/// Largest combination the generator can build: one modifier plus every letter
pub const MAX_SUPPORTED_COMBO: usize = 27;

/// The set of keys a participant has to hold down for one trial.
///
/// Keys are kept in display order (modifier first) but compared as a set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetCombo {
    keys: Vec<String>,
}

impl TargetCombo {
    pub fn new(keys: Vec<String>) -> Self {
        Self { keys }
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn as_set(&self) -> BTreeSet<&str> {
        self.keys.iter().map(String::as_str).collect()
    }
}

impl fmt::Display for TargetCombo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.keys.join(" + "))
    }
}

/// Check that a combination of `size` keys can be drawn at all
pub fn check_size(size: usize) -> Result<(), GenerateError> {
    let available = ALPHABET.len();
    match size {
        0 => Err(GenerateError::EmptyCombination),
        n if n - 1 > available => Err(GenerateError::AlphabetExhausted {
            size: n,
            letters: n - 1,
            available,
        }),
        _ => Ok(()),
    }
}

/// Draws target combinations from a seedable RNG
#[derive(Debug)]
pub struct TrialGenerator {
    rng: StdRng,
}

impl TrialGenerator {
    pub fn new(seed: Option<i64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s as u64),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    pub fn generate(&mut self, size: usize) -> Result<TargetCombo, GenerateError> {
        check_size(size)?;

        let rng = &mut self.rng;
        let letters: Vec<char> = ALPHABET.chars().collect();

        if size == 1 {
            let letter = letters.choose(rng).copied().unwrap_or('a');
            return Ok(TargetCombo::new(vec![letter.to_string()]));
        }

        let modifier = COMBO_MODIFIERS.choose(rng).copied().unwrap_or(SHIFT);
        let mut keys = Vec::with_capacity(size);
        keys.push(modifier.to_string());

        // choose_multiple keeps source order, shuffle so the prompt order varies too
        let mut picked = letters.iter().copied().choose_multiple(rng, size - 1);
        picked.shuffle(rng);
        keys.extend(picked.into_iter().map(|c| c.to_string()));

        Ok(TargetCombo::new(keys))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::is_modifier;

    #[test]
    fn test_single_key_is_one_letter() {
        let mut gen = TrialGenerator::new(Some(1));
        for _ in 0..50 {
            let combo = gen.generate(1).unwrap();
            assert_eq!(combo.len(), 1);
            let key = &combo.keys()[0];
            assert_eq!(key.len(), 1);
            assert!(ALPHABET.contains(key.as_str()));
        }
    }

    #[test]
    fn test_multi_key_structure() {
        let mut gen = TrialGenerator::new(Some(7));
        for n in 2..=MAX_SUPPORTED_COMBO {
            for _ in 0..5 {
                let combo = gen.generate(n).unwrap();
                assert_eq!(combo.len(), n);

                let modifiers: Vec<_> = combo.keys().iter().filter(|k| is_modifier(k)).collect();
                assert_eq!(modifiers.len(), 1);
                assert!(COMBO_MODIFIERS.contains(&modifiers[0].as_str()));

                let letters: BTreeSet<_> = combo
                    .keys()
                    .iter()
                    .filter(|k| !is_modifier(k))
                    .collect();
                assert_eq!(letters.len(), n - 1);
                assert!(letters
                    .iter()
                    .all(|l| l.len() == 1 && ALPHABET.contains(l.as_str())));
            }
        }
    }

    #[test]
    fn test_modifier_listed_first() {
        let mut gen = TrialGenerator::new(Some(3));
        let combo = gen.generate(3).unwrap();
        assert!(is_modifier(&combo.keys()[0]));
    }

    #[test]
    fn test_bad_sizes_fail() {
        let mut gen = TrialGenerator::new(Some(0));
        assert_eq!(gen.generate(0), Err(GenerateError::EmptyCombination));
        assert_eq!(
            gen.generate(MAX_SUPPORTED_COMBO + 1),
            Err(GenerateError::AlphabetExhausted {
                size: 28,
                letters: 27,
                available: 26
            })
        );
    }

    #[test]
    fn test_seed_is_reproducible() {
        let mut a = TrialGenerator::new(Some(42));
        let mut b = TrialGenerator::new(Some(42));
        for n in [1, 2, 3, 3, 5] {
            assert_eq!(a.generate(n).unwrap(), b.generate(n).unwrap());
        }
    }

    #[test]
    fn test_negative_seed_accepted() {
        let mut a = TrialGenerator::new(Some(-5));
        let mut b = TrialGenerator::new(Some(-5));
        assert_eq!(a.generate(4).unwrap(), b.generate(4).unwrap());
    }

    #[test]
    fn test_display_joins_with_plus() {
        let combo = TargetCombo::new(vec!["Shift".into(), "a".into(), "q".into()]);
        assert_eq!(combo.to_string(), "Shift + a + q");
    }
}
