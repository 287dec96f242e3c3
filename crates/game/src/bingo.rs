use std::collections::HashSet;

use adaptive_domain::{BingoCard, BingoLine, BingoType, CompletedLines, Position};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

const CENTER: (usize, usize) = (2, 2);

/// Generates a scrambled 25-career bingo card from `pool` (must have at
/// least 24 entries beyond the center career). The center cell is
/// `center_career` — pre-unlocked for humans, random for AI players — and
/// the remaining 24 cells are a Fisher-Yates shuffle of the rest of the
/// pool (§4.E.2 Bingo card generation).
pub fn generate_card(pool: &[String], center_career: &str, rng: &mut SmallRng) -> BingoCard {
    let mut remaining: Vec<String> = pool.iter().filter(|c| c.as_str() != center_career).cloned().collect();
    remaining.shuffle(rng);

    let mut card: BingoCard = Default::default();
    let mut iter = remaining.into_iter();

    for row in 0..5 {
        for col in 0..5 {
            if (row, col) == CENTER {
                card[row][col] = center_career.to_string();
            } else {
                card[row][col] = iter.next().unwrap_or_default();
            }
        }
    }

    card
}

/// True if `card` has any duplicate career within a single row, column, or
/// diagonal (a card should never fail this by construction, but generation
/// rejects and reshuffles on a uniqueness-window collision per-room, so
/// this is the local self-consistency check).
pub fn card_has_internal_duplicates(card: &BingoCard) -> bool {
    for row in card.iter() {
        let set: HashSet<&String> = row.iter().collect();
        if set.len() != row.len() {
            return true;
        }
    }
    for col in 0..5 {
        let set: HashSet<&String> = (0..5).map(|row| &card[row][col]).collect();
        if set.len() != 5 {
            return true;
        }
    }
    false
}

/// Scans rows, columns, and both diagonals for newly completed lines given
/// `unlocked` positions, returning only lines not already in `completed`.
pub fn check_for_bingos(unlocked: &HashSet<Position>, completed: &CompletedLines) -> Vec<BingoLine> {
    let mut new_lines = Vec::new();

    for row in 0..5u8 {
        let line = BingoLine { bingo_type: BingoType::Row, bingo_index: row };
        if !completed.contains(&line) && (0..5u8).all(|col| unlocked.contains(&(row, col))) {
            new_lines.push(line);
        }
    }

    for col in 0..5u8 {
        let line = BingoLine { bingo_type: BingoType::Col, bingo_index: col };
        if !completed.contains(&line) && (0..5u8).all(|row| unlocked.contains(&(row, col))) {
            new_lines.push(line);
        }
    }

    let diag0 = BingoLine { bingo_type: BingoType::Diag, bingo_index: 0 };
    if !completed.contains(&diag0) && (0..5u8).all(|i| unlocked.contains(&(i, i))) {
        new_lines.push(diag0);
    }
    let diag1 = BingoLine { bingo_type: BingoType::Diag, bingo_index: 1 };
    if !completed.contains(&diag1) && (0..5u8).all(|i| unlocked.contains(&(i, 4 - i))) {
        new_lines.push(diag1);
    }

    new_lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> Vec<String> {
        (0..30).map(|i| format!("career-{i}")).collect()
    }

    #[test]
    fn generated_card_places_center_career_at_2_2() {
        let mut rng = SmallRng::seed_from_u64(42);
        let card = generate_card(&pool(), "Chef", &mut rng);
        assert_eq!(card[2][2], "Chef");
    }

    #[test]
    fn generated_card_has_no_internal_duplicates() {
        let mut rng = SmallRng::seed_from_u64(7);
        let card = generate_card(&pool(), "Chef", &mut rng);
        assert!(!card_has_internal_duplicates(&card));
    }

    #[test]
    fn detects_a_completed_row() {
        let mut unlocked = HashSet::new();
        for col in 0..5u8 {
            unlocked.insert((1u8, col));
        }
        let completed = CompletedLines::default();
        let lines = check_for_bingos(&unlocked, &completed);
        assert!(lines.contains(&BingoLine { bingo_type: BingoType::Row, bingo_index: 1 }));
    }

    #[test]
    fn does_not_redetect_an_already_completed_line() {
        let mut unlocked = HashSet::new();
        for col in 0..5u8 {
            unlocked.insert((1u8, col));
        }
        let mut completed = CompletedLines::default();
        completed.insert(BingoLine { bingo_type: BingoType::Row, bingo_index: 1 });

        let lines = check_for_bingos(&unlocked, &completed);
        assert!(lines.is_empty());
    }

    #[test]
    fn detects_both_diagonals() {
        let mut unlocked = HashSet::new();
        for i in 0..5u8 {
            unlocked.insert((i, i));
            unlocked.insert((i, 4 - i));
        }
        let completed = CompletedLines::default();
        let lines = check_for_bingos(&unlocked, &completed);
        assert!(lines.contains(&BingoLine { bingo_type: BingoType::Diag, bingo_index: 0 }));
        assert!(lines.contains(&BingoLine { bingo_type: BingoType::Diag, bingo_index: 1 }));
    }
}
