//! Learning-session core: data model, phases and the owning state machine.
//!
//! # Architecture
//!
//! ```text
//!  compose::compose_article ──Article──▶ LearningSession::complete
//!  outline::OutlineGuide    ──VideoScript──▶ set_outline
//!  vocab::VocabFlow         ──Vec<Vocabulary>──▶ complete_vocab
//!  reader::Reader           ──Vocabulary / Note──▶ add_vocab / add_note
//!  workshop::Workshop       ◀──SessionSnapshot── snapshot()
//!
//!  watch::Receiver<Phase>   ◀── subscribe()   (navigation, sidebar)
//! ```
//!
//! # Quick start
//!
//! ```
//! use smartread::compose::compose_article;
//! use smartread::session::{LearningSession, Phase};
//!
//! let mut session = LearningSession::new();
//! let article = compose_article("荷塘月色", "第一段。\n\n第二段。").unwrap();
//! session.complete(article).unwrap();
//! session.start_reading().unwrap();
//! assert_eq!(session.phase(), Phase::Reading);
//! ```

pub mod machine;
pub mod model;
pub mod state;
pub mod usage;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use machine::{LearningSession, SessionError};
pub use model::{
    clamp_difficulty, next_id, now_millis, Article, ChatMessage, ChatRole, GeneratedExercise,
    Note, QuestionKind, QuizQuestion, VideoScript, Vocabulary,
};
pub use state::{Phase, SessionSnapshot};
pub use usage::{NoopUsage, UsageRecorder};
