//! Word cards followed by a quiz, then a result summary.
//!
//! ```text
//! Empty ────────────────────────────────────────────▶ complete()
//! Learning ──next() on last card──▶ Quiz ──next_question() on last──▶ Result
//!    ▲ jump_to(i)                    │ (no questions)
//!    └───────────                    └──────────────▶ Result
//! ```
//!
//! `complete()` hands the vocabulary back to the session from any stage.

use crate::session::{LearningSession, QuizQuestion, SessionError, Vocabulary};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VocabStage {
    /// Nothing to learn; the flow can only be completed.
    Empty,
    Learning,
    Quiz,
    Result,
}

/// Feedback revealed as soon as a question is answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerFeedback {
    pub correct: bool,
    pub correct_answer: String,
    pub explanation: String,
}

pub struct VocabFlow {
    vocab: Vec<Vocabulary>,
    questions: Vec<QuizQuestion>,
    stage: VocabStage,
    card: usize,
    question: usize,
    selected: Option<String>,
    score: usize,
}

impl VocabFlow {
    pub fn new(vocab: Vec<Vocabulary>, questions: Vec<QuizQuestion>) -> Self {
        let stage = if vocab.is_empty() {
            VocabStage::Empty
        } else {
            VocabStage::Learning
        };
        Self {
            vocab,
            questions,
            stage,
            card: 0,
            question: 0,
            selected: None,
            score: 0,
        }
    }

    pub fn stage(&self) -> VocabStage {
        self.stage
    }

    pub fn vocab(&self) -> &[Vocabulary] {
        &self.vocab
    }

    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    // ----- Learning ------------------------------------------------------

    pub fn card_index(&self) -> usize {
        self.card
    }

    pub fn current_card(&self) -> Option<&Vocabulary> {
        match self.stage {
            VocabStage::Learning => self.vocab.get(self.card),
            _ => None,
        }
    }

    /// Next card, or the quiz after the last one.
    pub fn next(&mut self) {
        if self.stage != VocabStage::Learning {
            return;
        }
        if self.card + 1 < self.vocab.len() {
            self.card += 1;
        } else {
            self.enter_quiz();
        }
    }

    /// Jump to card `index` from the word list.  Returns `false` when the
    /// index is out of range or the flow is past learning.
    pub fn jump_to(&mut self, index: usize) -> bool {
        if self.stage != VocabStage::Learning || index >= self.vocab.len() {
            return false;
        }
        self.card = index;
        true
    }

    fn enter_quiz(&mut self) {
        self.question = 0;
        self.selected = None;
        self.stage = if self.questions.is_empty() {
            log::debug!("vocab: no quiz questions, straight to result");
            VocabStage::Result
        } else {
            VocabStage::Quiz
        };
    }

    // ----- Quiz ----------------------------------------------------------

    pub fn question_index(&self) -> usize {
        self.question
    }

    pub fn current_question(&self) -> Option<&QuizQuestion> {
        match self.stage {
            VocabStage::Quiz => self.questions.get(self.question),
            _ => None,
        }
    }

    pub fn selected_answer(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn is_answered(&self) -> bool {
        self.selected.is_some()
    }

    /// Answer the current question.  Only the first answer per question
    /// counts; later calls return `None`.
    pub fn answer(&mut self, choice: &str) -> Option<AnswerFeedback> {
        if self.is_answered() {
            return None;
        }
        let question = self.current_question()?;
        let correct = choice == question.correct_answer;
        let feedback = AnswerFeedback {
            correct,
            correct_answer: question.correct_answer.clone(),
            explanation: question.explanation.clone(),
        };

        if correct {
            self.score += 1;
        }
        self.selected = Some(choice.to_string());
        Some(feedback)
    }

    /// Move past an answered question, or to the result after the last one.
    pub fn next_question(&mut self) {
        if self.stage != VocabStage::Quiz || !self.is_answered() {
            return;
        }
        self.selected = None;
        if self.question + 1 < self.questions.len() {
            self.question += 1;
        } else {
            self.stage = VocabStage::Result;
        }
    }

    // ----- Result --------------------------------------------------------

    pub fn score(&self) -> usize {
        self.score
    }

    pub fn total(&self) -> usize {
        self.questions.len()
    }

    /// Rounded percentage; a quiz with no questions counts as 0 %.
    pub fn percent(&self) -> u32 {
        if self.questions.is_empty() {
            return 0;
        }
        ((self.score as f64 / self.questions.len() as f64) * 100.0).round() as u32
    }

    /// Encouragement for the result screen.
    pub fn message(&self) -> &'static str {
        match self.percent() {
            p if p >= 80 => "太棒了！你掌握得非常好！",
            p if p >= 60 => "不错，继续加油！",
            _ => "继续努力！",
        }
    }

    /// Hand the vocabulary to the session and move on to reading.
    pub fn complete(self, session: &mut LearningSession) -> Result<(), SessionError> {
        log::debug!(
            "vocab: completing with {} words, score {}/{}",
            self.vocab.len(),
            self.score,
            self.questions.len()
        );
        session.complete_vocab(self.vocab)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
