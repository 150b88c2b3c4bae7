//! SmartRead: AI-assisted close reading.
//!
//! A learning session moves an article through five phases:
//!
//! ```text
//! Compose ─▶ Outline ─▶ VocabLearning ─▶ Reading ─▶ Workshop
//!              └──────────(skip)──────────▲    │
//!              ▲──────────(back)───────────────┘
//! ```
//!
//! | Module | Role |
//! |--------|------|
//! | [`session`] | data model and the phase state machine owning it |
//! | [`compose`] | article composition and formatting |
//! | [`outline`] | guided outline with section lectures |
//! | [`vocab`] | word cards and quiz |
//! | [`reader`] | selection analysis and paragraph narration |
//! | [`workshop`] | cloze, flashcards, writing coach and exports |
//! | [`llm`] | generation / speech / image capabilities |
//! | [`audio`] | payload decoding and per-slot playback |
//! | [`config`] | `settings.toml` and platform paths |

pub mod audio;
pub mod compose;
pub mod config;
pub mod llm;
pub mod outline;
pub mod reader;
pub mod session;
pub mod vocab;
pub mod workshop;
