//! The zodiac roster and the small random pickers posts season themselves
//! with.

use rand::seq::SliceRandom;
use rand::Rng;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ZodiacSign {
    pub name: &'static str,
    pub emoji: &'static str,
}

pub const SIGNS: [ZodiacSign; 12] = [
    ZodiacSign { name: "Овен", emoji: "♈" },
    ZodiacSign { name: "Телець", emoji: "♉" },
    ZodiacSign { name: "Близнюки", emoji: "♊" },
    ZodiacSign { name: "Рак", emoji: "♋" },
    ZodiacSign { name: "Лев", emoji: "♌" },
    ZodiacSign { name: "Діва", emoji: "♍" },
    ZodiacSign { name: "Терези", emoji: "♎" },
    ZodiacSign { name: "Скорпіон", emoji: "♏" },
    ZodiacSign { name: "Стрілець", emoji: "♐" },
    ZodiacSign { name: "Козеріг", emoji: "♑" },
    ZodiacSign { name: "Водолій", emoji: "♒" },
    ZodiacSign { name: "Риби", emoji: "♓" },
];

pub const TAROT_EMOJIS: [&str; 8] = ["🔮", "🃏", "🌙", "✨", "🌟", "♾️", "🔥", "💫"];

pub fn random_tarot_emoji() -> &'static str {
    TAROT_EMOJIS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or("🔮")
}

/// Two distinct random signs for the compatibility post.
pub fn random_sign_pair() -> (ZodiacSign, ZodiacSign) {
    let mut rng = rand::thread_rng();
    let first = rng.gen_range(0..SIGNS.len());
    let second = (first + 1 + rng.gen_range(0..SIGNS.len() - 1)) % SIGNS.len();
    (SIGNS[first], SIGNS[second])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn roster_has_twelve_unique_signs() {
        let names: HashSet<_> = SIGNS.iter().map(|s| s.name).collect();
        assert_eq!(names.len(), 12);
    }

    #[test]
    fn sign_pair_is_always_distinct() {
        for _ in 0..200 {
            let (a, b) = random_sign_pair();
            assert_ne!(a.name, b.name);
        }
    }

    #[test]
    fn tarot_emoji_comes_from_the_fixed_set() {
        for _ in 0..20 {
            assert!(TAROT_EMOJIS.contains(&random_tarot_emoji()));
        }
    }
}
