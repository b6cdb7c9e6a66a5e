use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

const ADJECTIVES: &[&str] = &[
    "admiring", "brave", "clever", "dazzling", "eager", "festive", "gallant", "happy",
    "jolly", "keen", "lucid", "merry", "nifty", "optimistic", "peaceful", "quirky",
    "relaxed", "serene", "trusting", "upbeat", "vibrant", "witty", "youthful", "zealous",
];

const SURNAMES: &[&str] = &[
    "babbage", "bell", "curie", "darwin", "edison", "faraday", "galileo", "hopper",
    "hypatia", "johnson", "kepler", "lovelace", "meitner", "newton", "noether", "pascal",
    "ritchie", "shannon", "tesla", "turing", "volta", "wozniak", "yalow", "zuse",
];

/// Produces a fresh display name for each pairing cycle.
pub trait RoomNamer: Send + Sync {
    fn next_name(&mut self) -> String;
}

/// "Adjective Surname" names, both words title cased.
pub struct RandomRoomNamer {
    rng: StdRng,
}

impl RandomRoomNamer {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomRoomNamer {
    fn default() -> Self {
        Self::new()
    }
}

impl RoomNamer for RandomRoomNamer {
    fn next_name(&mut self) -> String {
        let adjective = ADJECTIVES.choose(&mut self.rng).copied().unwrap_or("happy");
        let surname = SURNAMES.choose(&mut self.rng).copied().unwrap_or("turing");
        format!("{} {}", title_case(adjective), title_case(surname))
    }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_two_title_cased_words() {
        let mut namer = RandomRoomNamer::with_seed(3);
        for _ in 0..20 {
            let name = namer.next_name();
            let words: Vec<&str> = name.split(' ').collect();
            assert_eq!(words.len(), 2, "{name}");
            for word in words {
                assert!(word.chars().next().unwrap().is_uppercase(), "{name}");
            }
        }
    }
}
