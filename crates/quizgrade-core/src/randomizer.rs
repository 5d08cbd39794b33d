//! Presentation-order randomization.
//!
//! Shuffles only what the learner sees. Correct answers are compared by
//! value, and index-keyed choice answers are pinned to their labels before
//! options move, so a shuffled presentation grades identically to the
//! canonical one.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::answer::pin_choice_labels;
use crate::model::{Question, Quiz};

/// Questions in canonical order: `question_order`, then `id`.
pub fn canonical_order(questions: &[Question]) -> Vec<Question> {
    let mut ordered = questions.to_vec();
    ordered.sort_by_key(|q| (q.question_order, q.id));
    ordered
}

/// Build the presentation for one attempt.
///
/// Questions are shuffled when `randomize_questions` is set; options of
/// choice questions are shuffled when `randomize_answers` is set. The
/// inputs are left untouched.
pub fn present<R: Rng + ?Sized>(quiz: &Quiz, questions: &[Question], rng: &mut R) -> Vec<Question> {
    let mut presented = canonical_order(questions);

    if quiz.randomize_questions {
        presented.shuffle(rng);
    }

    if quiz.randomize_answers {
        for question in presented
            .iter_mut()
            .filter(|q| q.question_type.has_choice_options())
        {
            pin_choice_labels(question);
            question.options.shuffle(rng);
        }
    }

    presented
}

/// Reproducible presentation for a stored seed.
pub fn present_seeded(quiz: &Quiz, questions: &[Question], seed: u64) -> Vec<Question> {
    let mut rng = StdRng::seed_from_u64(seed);
    present(quiz, questions, &mut rng)
}

/// Presentation with a fresh seed. The seed is returned so the same
/// order can be shown again with [`present_seeded`].
pub fn present_random(quiz: &Quiz, questions: &[Question]) -> (u64, Vec<Question>) {
    let seed = rand::thread_rng().gen();
    (seed, present_seeded(quiz, questions, seed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QuestionType;
    use crate::scoring::score;
    use serde_json::{json, Value};
    use std::collections::BTreeMap;

    fn quiz(randomize_questions: bool, randomize_answers: bool) -> Quiz {
        let mut quiz: Quiz = serde_json::from_str(r#"{"id": 1, "title": "Quiz"}"#).unwrap();
        quiz.randomize_questions = randomize_questions;
        quiz.randomize_answers = randomize_answers;
        quiz
    }

    fn questions() -> Vec<Question> {
        (1..=8)
            .map(|id| Question {
                id,
                quiz_id: Some(1),
                question_type: if id % 2 == 0 {
                    QuestionType::Checkbox
                } else {
                    QuestionType::Radio
                },
                prompt: format!("Q{id}"),
                options: ["alpha", "beta", "gamma", "delta", "epsilon"]
                    .map(String::from)
                    .to_vec(),
                correct_answer: if id % 2 == 0 {
                    json!(["beta", "delta"])
                } else {
                    json!("gamma")
                },
                points: 2.0,
                metadata: Default::default(),
                question_order: 10 - id as i64,
            })
            .collect()
    }

    #[test]
    fn canonical_order_uses_question_order_then_id() {
        let mut qs = questions();
        qs[0].question_order = 2;
        qs[1].question_order = 2;
        let ids: Vec<u64> = canonical_order(&qs).iter().map(|q| q.id).collect();
        assert_eq!(ids[..2], [1, 2]);
        assert_eq!(ids.last(), Some(&3));
    }

    #[test]
    fn no_flags_means_canonical_order() {
        let qs = questions();
        let presented = present_seeded(&quiz(false, false), &qs, 7);
        let ids: Vec<u64> = presented.iter().map(|q| q.id).collect();
        assert_eq!(ids, vec![8, 7, 6, 5, 4, 3, 2, 1]);
        assert_eq!(presented[0].options, qs[7].options);
    }

    #[test]
    fn seeded_presentation_is_reproducible() {
        let qs = questions();
        let a = present_seeded(&quiz(true, true), &qs, 42);
        let b = present_seeded(&quiz(true, true), &qs, 42);
        let ids = |v: &[Question]| v.iter().map(|q| q.id).collect::<Vec<_>>();
        assert_eq!(ids(&a), ids(&b));
        assert_eq!(a[0].options, b[0].options);
    }

    #[test]
    fn shuffling_keeps_the_same_questions_and_options() {
        let qs = questions();
        let presented = present_seeded(&quiz(true, true), &qs, 3);
        let mut ids: Vec<u64> = presented.iter().map(|q| q.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, (1..=8).collect::<Vec<_>>());
        for q in &presented {
            let mut options = q.options.clone();
            options.sort();
            assert_eq!(options, ["alpha", "beta", "delta", "epsilon", "gamma"]);
            let original = qs.iter().find(|o| o.id == q.id).unwrap();
            assert_eq!(q.correct_answer, original.correct_answer);
        }
    }

    #[test]
    fn random_presentation_replays_from_its_seed() {
        let qs = questions();
        let (seed, presented) = present_random(&quiz(true, true), &qs);
        let replay = present_seeded(&quiz(true, true), &qs, seed);
        let ids = |v: &[Question]| v.iter().map(|q| q.id).collect::<Vec<_>>();
        assert_eq!(ids(&presented), ids(&replay));
    }

    #[test]
    fn non_choice_options_are_not_shuffled() {
        let mut qs = questions();
        qs[0].question_type = QuestionType::Sequence;
        let presented = present_seeded(&quiz(false, true), &qs, 11);
        let seq = presented.iter().find(|q| q.id == 1).unwrap();
        assert_eq!(seq.options, qs[0].options);
    }

    #[test]
    fn option_shuffle_does_not_change_score() {
        let qs = questions();
        let answers: BTreeMap<u64, Value> = qs
            .iter()
            .map(|q| {
                let given = if q.question_type == QuestionType::Checkbox {
                    json!(["beta", "epsilon"])
                } else {
                    json!("gamma")
                };
                (q.id, given)
            })
            .collect();
        let baseline = score(&qs, &answers);

        for seed in 0..20 {
            let presented = present_seeded(&quiz(true, true), &qs, seed);
            assert_eq!(score(&presented, &answers), baseline, "seed {seed}");
        }
    }

    #[test]
    fn option_shuffle_keeps_index_keyed_answers() {
        let mut qs = questions();
        for q in &mut qs {
            q.correct_answer = if q.question_type == QuestionType::Checkbox {
                json!([1, 3])
            } else {
                json!(1)
            };
        }
        let answers: BTreeMap<u64, Value> = qs
            .iter()
            .map(|q| {
                let given = if q.question_type == QuestionType::Checkbox {
                    json!(["beta", "delta"])
                } else {
                    json!("beta")
                };
                (q.id, given)
            })
            .collect();
        let baseline = score(&qs, &answers);
        assert_eq!(baseline.obtained, baseline.total);

        for seed in 0..20 {
            let presented = present_seeded(&quiz(true, true), &qs, seed);
            assert_eq!(score(&presented, &answers), baseline, "seed {seed}");
        }
    }
}
