use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::db::Question;

/// Category id that selects questions from every category.
pub const ALL_CATEGORIES: i64 = 0;

/// Draws one question uniformly at random from `pool`, skipping every id in
/// `seen`. `None` means the round is exhausted for this pool.
pub fn pick_unseen<'a, R: Rng + ?Sized>(
    pool: &'a [Question],
    seen: &HashSet<i64>,
    rng: &mut R,
) -> Option<&'a Question> {
    let unseen: Vec<&Question> = pool.iter().filter(|q| !seen.contains(&q.id)).collect();
    unseen.choose(rng).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn pool(ids: &[i64]) -> Vec<Question> {
        ids.iter()
            .map(|&id| Question {
                id,
                question: format!("question {id}"),
                answer: format!("answer {id}"),
                category: 1,
                difficulty: 1,
            })
            .collect()
    }

    #[test]
    fn never_returns_a_seen_question() {
        let questions = pool(&[1, 2, 3, 4, 5]);
        let seen: HashSet<i64> = [1, 2, 4, 5].into_iter().collect();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            assert_eq!(pick_unseen(&questions, &seen, &mut rng).unwrap().id, 3);
        }
    }

    #[test]
    fn exhausted_pool_yields_nothing() {
        let questions = pool(&[1, 2]);
        let seen: HashSet<i64> = [1, 2, 99].into_iter().collect();
        let mut rng = StdRng::seed_from_u64(7);
        assert!(pick_unseen(&questions, &seen, &mut rng).is_none());
        assert!(pick_unseen(&[], &HashSet::new(), &mut rng).is_none());
    }

    #[test]
    fn every_unseen_question_can_be_drawn() {
        let questions = pool(&[10, 20, 30]);
        let seen = HashSet::new();
        let mut rng = StdRng::seed_from_u64(42);
        let drawn: HashSet<i64> = (0..200)
            .filter_map(|_| pick_unseen(&questions, &seen, &mut rng))
            .map(|q| q.id)
            .collect();
        assert_eq!(drawn, [10, 20, 30].into_iter().collect());
    }
}
