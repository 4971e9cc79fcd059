//! Self-grading quiz state over a generated deck.
//!
//! A [`QuizSession`] is owned by the caller (one per user, per deck), so any
//! number of quizzes can run side by side. Each card can be answered once;
//! the first answer counts.

use crate::output::FlashcardRecord;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Why an answer was not recorded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuizError {
    #[error("No card {index}: the deck has {len} cards")]
    NoSuchCard { index: usize, len: usize },

    #[error("Card {index} has already been answered")]
    AlreadyAnswered { index: usize },

    #[error("'{letter}' is not an option of card {index}")]
    NotAnOption { index: usize, letter: char },
}

/// Outcome of one recorded answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grade {
    pub selected: char,
    pub correct: char,
}

impl Grade {
    pub fn is_correct(&self) -> bool {
        self.selected == self.correct
    }
}

/// Score band shown once the quiz is complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Feedback {
    /// ≥ 90 %
    Excellent,
    /// ≥ 70 %
    Good,
    /// ≥ 50 %
    Average,
    NeedsWork,
}

impl Feedback {
    pub fn from_percentage(pct: u32) -> Self {
        match pct {
            90.. => Feedback::Excellent,
            70..=89 => Feedback::Good,
            50..=69 => Feedback::Average,
            _ => Feedback::NeedsWork,
        }
    }
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Feedback::Excellent => "Excellent!",
            Feedback::Good => "You have a solid understanding!",
            Feedback::Average => "Not bad. Some review might help.",
            Feedback::NeedsWork => "You need more practice. Review the material again.",
        })
    }
}

#[derive(Debug, Clone)]
pub struct QuizSession<'a> {
    cards: &'a [FlashcardRecord],
    grades: Vec<Option<Grade>>,
}

impl<'a> QuizSession<'a> {
    pub fn new(cards: &'a [FlashcardRecord]) -> Self {
        Self {
            cards,
            grades: vec![None; cards.len()],
        }
    }

    pub fn cards(&self) -> &'a [FlashcardRecord] {
        self.cards
    }

    /// Record the answer to card `index` (0-based). Letters are case-insensitive.
    pub fn answer(&mut self, index: usize, letter: char) -> Result<Grade, QuizError> {
        let len = self.cards.len();
        let card = self
            .cards
            .get(index)
            .ok_or(QuizError::NoSuchCard { index, len })?;
        if self.grades[index].is_some() {
            return Err(QuizError::AlreadyAnswered { index });
        }
        let selected = letter.to_ascii_uppercase();
        if !card.options().contains_key(&selected) {
            return Err(QuizError::NotAnOption { index, letter });
        }

        let grade = Grade {
            selected,
            correct: card.answer(),
        };
        self.grades[index] = Some(grade);
        Ok(grade)
    }

    pub fn grade(&self, index: usize) -> Option<Grade> {
        self.grades.get(index).copied().flatten()
    }

    pub fn answered(&self) -> usize {
        self.grades.iter().flatten().count()
    }

    pub fn correct(&self) -> usize {
        self.grades.iter().flatten().filter(|g| g.is_correct()).count()
    }

    pub fn is_complete(&self) -> bool {
        self.answered() == self.cards.len()
    }

    /// Correct answers over deck size, rounded to the nearest whole percent.
    pub fn percentage(&self) -> u32 {
        if self.cards.is_empty() {
            return 0;
        }
        ((self.correct() as f64 / self.cards.len() as f64) * 100.0).round() as u32
    }

    /// `None` until every card has been answered, and for an empty deck.
    pub fn feedback(&self) -> Option<Feedback> {
        (!self.cards.is_empty() && self.is_complete())
            .then(|| Feedback::from_percentage(self.percentage()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::parse::extract_flashcards;

    fn deck() -> Vec<FlashcardRecord> {
        extract_flashcards(
            "Q: What is the capital of France?\nOptions:\nA. Paris\nB. Berlin\nAnswer: A\n\
             Q: Which planet is known as the red planet?\nOptions:\nA. Venus\nB. Mars\nAnswer: B\n\
             Q: Which gas do plants absorb from the air?\nOptions:\nA. Oxygen\nB. Carbon dioxide\nAnswer: B",
        )
    }

    #[test]
    fn scores_a_full_quiz() {
        let cards = deck();
        assert_eq!(cards.len(), 3);
        let mut quiz = QuizSession::new(&cards);

        assert!(quiz.answer(0, 'a').unwrap().is_correct());
        assert!(!quiz.answer(1, 'A').unwrap().is_correct());
        assert_eq!(quiz.feedback(), None);
        assert!(quiz.answer(2, 'B').unwrap().is_correct());

        assert!(quiz.is_complete());
        assert_eq!((quiz.correct(), quiz.answered()), (2, 3));
        assert_eq!(quiz.percentage(), 67);
        assert_eq!(quiz.feedback(), Some(Feedback::Average));
    }

    #[test]
    fn first_answer_counts() {
        let cards = deck();
        let mut quiz = QuizSession::new(&cards);
        quiz.answer(0, 'B').unwrap();
        assert_eq!(quiz.answer(0, 'A'), Err(QuizError::AlreadyAnswered { index: 0 }));
        assert_eq!(quiz.correct(), 0);
    }

    #[test]
    fn rejects_bad_index_and_letter() {
        let cards = deck();
        let mut quiz = QuizSession::new(&cards);
        assert_eq!(quiz.answer(7, 'A'), Err(QuizError::NoSuchCard { index: 7, len: 3 }));
        assert_eq!(
            quiz.answer(0, 'D'),
            Err(QuizError::NotAnOption { index: 0, letter: 'D' })
        );
        assert_eq!(quiz.answered(), 0);
    }

    #[test]
    fn feedback_bands() {
        assert_eq!(Feedback::from_percentage(100), Feedback::Excellent);
        assert_eq!(Feedback::from_percentage(90), Feedback::Excellent);
        assert_eq!(Feedback::from_percentage(89), Feedback::Good);
        assert_eq!(Feedback::from_percentage(70), Feedback::Good);
        assert_eq!(Feedback::from_percentage(50), Feedback::Average);
        assert_eq!(Feedback::from_percentage(49), Feedback::NeedsWork);
    }

    #[test]
    fn empty_deck_has_no_feedback() {
        let quiz = QuizSession::new(&[]);
        assert!(quiz.is_complete());
        assert_eq!(quiz.percentage(), 0);
        assert_eq!(quiz.feedback(), None);
    }
}
