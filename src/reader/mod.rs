//! Close reading: selection analysis, note taking and paragraph narration.
//!
//! [`Reader`] owns the reading view's transient state and the
//! [`AudioEngine`].  Capability calls run as spawned tokio tasks; their
//! results come back over an `mpsc` channel and are applied by
//! [`Reader::pump`] (or awaited one at a time with [`Reader::next_event`]).
//!
//! # Supersession
//!
//! ```text
//! select(S1) ── gen 1 ──▶ pinyin task ─┐
//! select(S2) ── gen 2 ──▶ pinyin task  │ aborted, and if it still lands:
//!                                      └▶ event{gen 1} ≠ current gen 2 → dropped
//! ```
//!
//! The same generation check guards analysis, selection read-aloud, the
//! analysis lecture and paragraph narration.
//!
//! | Slot | Used for |
//! |------|----------|
//! | `Narration` | paragraph narration |
//! | `SelectionRead` | reading the selection aloud |
//! | `AnalysisLecture` | spoken analysis |
//!
//! Selection-tied slots are stopped whenever the selection changes or
//! closes.  The engine's [`tick`](Reader::tick) must be driven from the
//! caller's refresh loop.

pub mod narration;
pub mod popover;
pub mod selection;

use std::future::Future;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::audio::{speak, AudioEngine, AudioError, LocalSpeech, SpeakError, Slot, Spoken};
use crate::config::{AudioConfig, ReaderConfig};
use crate::llm::{truncate_chars, ReadingAssistant, SpeechOutcome};
use crate::session::{Article, LearningSession, Note, SessionError, Vocabulary};

pub use narration::{read_boundary, Narration};
pub use popover::{place_popover, DragState, Point, Rect, Viewport};
pub use selection::{AnalysisState, Selection, ANALYSIS_FAILED};

// ---------------------------------------------------------------------------
// ReaderError
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ReaderError {
    #[error("nothing is selected")]
    NoSelection,

    #[error("the selection has not been analysed")]
    NoAnalysis,

    #[error("no paragraph is being narrated")]
    NoActiveParagraph,

    #[error("paragraph {0} does not exist")]
    UnknownParagraph(usize),

    #[error("speech synthesis failed: {0}")]
    Synthesis(String),

    #[error(transparent)]
    Audio(#[from] AudioError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl From<SpeakError> for ReaderError {
    fn from(e: SpeakError) -> Self {
        match e {
            SpeakError::Unavailable => ReaderError::Synthesis("no audio for this text".into()),
            SpeakError::Audio(e) => ReaderError::Audio(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Task results
// ---------------------------------------------------------------------------

#[derive(Debug)]
enum ReaderEvent {
    Pinyin {
        generation: u64,
        pinyin: String,
    },
    Analysis {
        generation: u64,
        result: Result<String, String>,
    },
    SelectionSpeech {
        generation: u64,
        outcome: SpeechOutcome,
    },
    Lecture {
        generation: u64,
        script: String,
        outcome: SpeechOutcome,
    },
    Narration {
        generation: u64,
        index: usize,
        outcome: SpeechOutcome,
    },
}

// ---------------------------------------------------------------------------
// Reader
// ---------------------------------------------------------------------------

pub struct Reader {
    article: Article,
    assistant: ReadingAssistant,
    engine: AudioEngine,
    local: Arc<dyn LocalSpeech>,
    audio: AudioConfig,
    config: ReaderConfig,

    events_tx: mpsc::Sender<ReaderEvent>,
    events_rx: mpsc::Receiver<ReaderEvent>,

    selection: Option<Selection>,
    selection_generation: u64,
    selection_tasks: Vec<JoinHandle<()>>,

    narration: Narration,
    narration_task: Option<JoinHandle<()>>,
}

impl Reader {
    /// Must be created inside a tokio runtime; capability calls are spawned.
    pub fn new(
        article: Article,
        assistant: ReadingAssistant,
        engine: AudioEngine,
        local: Arc<dyn LocalSpeech>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::channel(32);
        Self {
            article,
            assistant,
            engine,
            local,
            audio: AudioConfig::default(),
            config: ReaderConfig::default(),
            events_tx,
            events_rx,
            selection: None,
            selection_generation: 0,
            selection_tasks: Vec::new(),
            narration: Narration::default(),
            narration_task: None,
        }
    }

    pub fn with_config(mut self, config: ReaderConfig) -> Self {
        self.engine.set_auto_restart(config.auto_restart);
        self.config = config;
        self
    }

    /// PCM format of synthesised speech payloads.
    pub fn with_audio_config(mut self, audio: AudioConfig) -> Self {
        self.audio = audio;
        self
    }

    pub fn article(&self) -> &Article {
        &self.article
    }

    pub fn engine(&self) -> &AudioEngine {
        &self.engine
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn narration(&self) -> &Narration {
        &self.narration
    }

    pub fn set_auto_restart(&mut self, on: bool) {
        self.config.auto_restart = on;
        self.engine.set_auto_restart(on);
    }

    fn spawn<F>(&self, work: F) -> JoinHandle<()>
    where
        F: Future<Output = ReaderEvent> + Send + 'static,
    {
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let event = work.await;
            if tx.send(event).await.is_err() {
                log::debug!("reader closed before a result arrived");
            }
        })
    }

    // -----------------------------------------------------------------------
    // Selection
    // -----------------------------------------------------------------------

    /// Replace the current selection and start its pinyin lookup.
    ///
    /// Returns `false` when the selection was ignored: blank text, or the
    /// popover is being dragged.
    pub fn select(&mut self, text: &str, anchor: Rect, viewport: Viewport) -> bool {
        if self.selection.as_ref().is_some_and(Selection::is_dragging) {
            return false;
        }
        let text = text.trim();
        if text.is_empty() {
            return false;
        }

        self.release_selection();
        self.selection_generation += 1;
        let generation = self.selection_generation;
        let placed = place_popover(anchor, viewport, &self.config);
        self.selection = Some(Selection::new(generation, text.to_string(), anchor, placed));
        log::debug!("reader: selection {generation} ({} chars)", text.chars().count());

        let assistant = self.assistant.clone();
        let owned = text.to_string();
        let task = self.spawn(async move {
            let pinyin = assistant.pinyin(&owned).await;
            ReaderEvent::Pinyin { generation, pinyin }
        });
        self.selection_tasks.push(task);
        true
    }

    /// Ask for a literary analysis of the selection.  Ignored while one is
    /// loading or already available; allowed again after a failure.
    pub fn request_analysis(&mut self) -> Result<(), ReaderError> {
        let selection = self.selection.as_mut().ok_or(ReaderError::NoSelection)?;
        if !selection.can_request_analysis() {
            return Ok(());
        }
        selection.set_analysis(AnalysisState::Loading);
        let generation = selection.generation();
        let text = selection.text().to_string();

        let context =
            truncate_chars(&self.article.content, self.config.analysis_context_chars).to_string();
        let assistant = self.assistant.clone();
        let task = self.spawn(async move {
            let result = assistant
                .analyze_selection(&text, &context)
                .await
                .map_err(|e| e.to_string());
            ReaderEvent::Analysis { generation, result }
        });
        self.selection_tasks.push(task);
        Ok(())
    }

    /// Play or stop the spoken form of the analysis on the lecture slot.
    ///
    /// The synthesised lecture stays loaded for the selection, so playing it
    /// again starts from the beginning without another request.
    pub fn toggle_analysis_narration(&mut self) -> Result<(), ReaderError> {
        let selection = self.selection.as_mut().ok_or(ReaderError::NoSelection)?;
        let analysis = selection
            .analysis()
            .text()
            .ok_or(ReaderError::NoAnalysis)?
            .to_string();

        let player = self.engine.slot(Slot::AnalysisLecture);
        if player.is_playing() {
            self.engine.pause(Slot::AnalysisLecture);
            return Ok(());
        }
        if player.has_buffer() {
            self.engine.restart(Slot::AnalysisLecture)?;
            return Ok(());
        }
        if selection.is_lecture_loading() {
            return Ok(());
        }

        selection.set_lecture_loading(true);
        let generation = selection.generation();
        let original = selection.text().to_string();
        let cached = selection.lecture_script().map(str::to_string);

        let assistant = self.assistant.clone();
        let task = self.spawn(async move {
            let script = match cached {
                Some(script) => script,
                None => assistant.teacher_script(&analysis, &original).await,
            };
            let outcome = assistant.speech(&script).await;
            ReaderEvent::Lecture {
                generation,
                script,
                outcome,
            }
        });
        self.selection_tasks.push(task);
        Ok(())
    }

    /// Read the selection aloud, or stop if it is already being read.
    pub fn read_selection(&mut self) -> Result<(), ReaderError> {
        let selection = self.selection.as_mut().ok_or(ReaderError::NoSelection)?;
        if self.engine.slot(Slot::SelectionRead).is_playing() {
            self.engine.stop(Slot::SelectionRead);
            return Ok(());
        }
        if selection.is_read_loading() {
            return Ok(());
        }

        selection.set_read_loading(true);
        let generation = selection.generation();
        let text = selection.text().to_string();

        let assistant = self.assistant.clone();
        let task = self.spawn(async move {
            let outcome = assistant.speech(&text).await;
            ReaderEvent::SelectionSpeech {
                generation,
                outcome,
            }
        });
        self.selection_tasks.push(task);
        Ok(())
    }

    /// Save the selection as a vocabulary entry with the best-known pinyin.
    /// Works whether or not an analysis was requested.
    pub fn save_vocab(&self, session: &mut LearningSession) -> Result<Vocabulary, ReaderError> {
        let selection = self.selection.as_ref().ok_or(ReaderError::NoSelection)?;
        let vocab =
            Vocabulary::from_selection(selection.text(), selection.pinyin().map(str::to_string));
        session.add_vocab(vocab.clone())?;
        Ok(vocab)
    }

    /// Save the selection and its analysis as a note.
    pub fn save_note(&self, session: &mut LearningSession) -> Result<Note, ReaderError> {
        let selection = self.selection.as_ref().ok_or(ReaderError::NoSelection)?;
        let analysis = selection
            .analysis()
            .text()
            .ok_or(ReaderError::NoAnalysis)?;
        let note = Note::new(selection.text(), analysis);
        session.add_note(note.clone())?;
        Ok(note)
    }

    /// Stop selection audio and forget the selection.  Safe to call when
    /// nothing is selected.
    pub fn close_selection(&mut self) {
        self.release_selection();
        self.selection_generation += 1;
    }

    fn release_selection(&mut self) {
        for task in self.selection_tasks.drain(..) {
            task.abort();
        }
        self.engine.stop(Slot::SelectionRead);
        self.engine.stop(Slot::AnalysisLecture);
        self.local.cancel();
        self.selection = None;
    }

    // ----- popover dragging ----------------------------------------------

    pub fn begin_drag(&mut self, pointer: Point) {
        if let Some(selection) = self.selection.as_mut() {
            selection.popover_mut().begin(pointer);
        }
    }

    pub fn drag_to(&mut self, pointer: Point) -> Option<Point> {
        self.selection
            .as_mut()
            .map(|selection| selection.popover_mut().move_to(pointer))
    }

    pub fn end_drag(&mut self) {
        if let Some(selection) = self.selection.as_mut() {
            selection.popover_mut().end();
        }
    }

    // -----------------------------------------------------------------------
    // Paragraph narration
    // -----------------------------------------------------------------------

    /// Play, pause or resume narration of paragraph `index`.
    ///
    /// A different paragraph stops the current one and loads new speech;
    /// the same paragraph pauses while playing and resumes otherwise.
    pub fn toggle_paragraph(&mut self, index: usize) -> Result<(), ReaderError> {
        let text = self
            .article
            .paragraphs
            .get(index)
            .ok_or(ReaderError::UnknownParagraph(index))?
            .clone();

        if self.narration.active() == Some(index) {
            if self.narration.is_loading() {
                return Ok(());
            }
            let player = self.engine.slot(Slot::Narration);
            if player.is_playing() {
                self.engine.pause(Slot::Narration);
                return Ok(());
            }
            if player.has_buffer() {
                self.engine.resume(Slot::Narration)?;
                return Ok(());
            }
        }

        self.engine.stop(Slot::Narration);
        if let Some(task) = self.narration_task.take() {
            task.abort();
        }
        let generation = self.narration.activate(index);
        log::debug!("reader: narrating paragraph {index}");

        let assistant = self.assistant.clone();
        self.narration_task = Some(self.spawn(async move {
            let outcome = assistant.speech(&text).await;
            ReaderEvent::Narration {
                generation,
                index,
                outcome,
            }
        }));
        Ok(())
    }

    /// Restart the active paragraph from its beginning.
    pub fn restart_paragraph(&mut self, index: usize) -> Result<(), ReaderError> {
        let loaded = self.engine.slot(Slot::Narration).has_buffer();
        if self.narration.active() != Some(index) || !loaded {
            return Err(ReaderError::NoActiveParagraph);
        }
        self.narration.set_progress(0.0);
        self.engine.restart(Slot::Narration)?;
        Ok(())
    }

    pub fn stop_narration(&mut self) {
        if let Some(task) = self.narration_task.take() {
            task.abort();
        }
        self.engine.stop(Slot::Narration);
        self.narration.clear();
    }

    /// Characters of paragraph `index` already read aloud; 0 for any
    /// paragraph that is not active.
    pub fn read_boundary(&self, index: usize) -> usize {
        match self.article.paragraphs.get(index) {
            Some(text) if self.narration.active() == Some(index) => {
                read_boundary(text, self.narration.progress())
            }
            _ => 0,
        }
    }

    /// Poll playback progress; returns `(slot, progress)` for every slot
    /// that was playing.
    pub fn tick(&mut self) -> Vec<(Slot, f64)> {
        let progress = self.engine.tick();
        for &(slot, p) in &progress {
            if slot == Slot::Narration {
                self.narration.set_progress(p);
            }
        }
        progress
    }

    // -----------------------------------------------------------------------
    // Result delivery
    // -----------------------------------------------------------------------

    /// Apply every result that has arrived.  Returns the failures that
    /// should be shown to the user.
    pub fn pump(&mut self) -> Vec<ReaderError> {
        let mut errors = Vec::new();
        while let Ok(event) = self.events_rx.try_recv() {
            if let Err(e) = self.apply(event) {
                errors.push(e);
            }
        }
        errors
    }

    /// Wait for the next result and apply it.  Only call with a request in
    /// flight; otherwise this waits forever.
    pub async fn next_event(&mut self) -> Result<(), ReaderError> {
        match self.events_rx.recv().await {
            Some(event) => self.apply(event),
            None => Ok(()),
        }
    }

    fn current_selection(&mut self, generation: u64) -> Option<&mut Selection> {
        self.selection
            .as_mut()
            .filter(|selection| selection.generation() == generation)
    }

    fn apply(&mut self, event: ReaderEvent) -> Result<(), ReaderError> {
        match event {
            ReaderEvent::Pinyin { generation, pinyin } => {
                let Some(selection) = self.current_selection(generation) else {
                    log::debug!("reader: stale pinyin for selection {generation} dropped");
                    return Ok(());
                };
                // The lookup falls back to echoing the text; that is not pinyin.
                if pinyin.trim() != selection.text() {
                    selection.set_pinyin(pinyin);
                }
                Ok(())
            }

            ReaderEvent::Analysis { generation, result } => {
                let Some(selection) = self.current_selection(generation) else {
                    return Ok(());
                };
                match result {
                    Ok(text) => selection.set_analysis(AnalysisState::Ready(text)),
                    Err(e) => {
                        log::warn!("reader: analysis failed: {e}");
                        selection.set_analysis(AnalysisState::Failed(ANALYSIS_FAILED.to_string()));
                    }
                }
                Ok(())
            }

            ReaderEvent::SelectionSpeech {
                generation,
                outcome,
            } => {
                let Some(selection) = self.current_selection(generation) else {
                    return Ok(());
                };
                selection.set_read_loading(false);
                let text = selection.text().to_string();

                if outcome == SpeechOutcome::Unavailable {
                    return if self.local.speak(&text) {
                        Ok(())
                    } else {
                        Err(ReaderError::Synthesis("no voice available".into()))
                    };
                }
                self.speak(Slot::SelectionRead, outcome).map(|_| ())
            }

            ReaderEvent::Lecture {
                generation,
                script,
                outcome,
            } => {
                let Some(selection) = self.current_selection(generation) else {
                    return Ok(());
                };
                selection.set_lecture_script(script);
                self.speak(Slot::AnalysisLecture, outcome).map(|_| ())
            }

            ReaderEvent::Narration {
                generation,
                index,
                outcome,
            } => {
                if generation != self.narration.generation() {
                    log::debug!("reader: stale narration for paragraph {index} dropped");
                    return Ok(());
                }
                self.narration_task = None;
                self.narration.loaded();
                match self.speak(Slot::Narration, outcome) {
                    Ok(Spoken::Slot(_)) => Ok(()),
                    Ok(Spoken::Local) => {
                        self.narration.clear();
                        Ok(())
                    }
                    Err(e) => {
                        self.narration.clear();
                        Err(e)
                    }
                }
            }
        }
    }

    fn speak(&mut self, slot: Slot, outcome: SpeechOutcome) -> Result<Spoken, ReaderError> {
        speak(&mut self.engine, slot, outcome, self.local.as_ref(), &self.audio).map_err(|e| {
            log::error!("reader: {slot:?} playback failed: {e}");
            ReaderError::from(e)
        })
    }

    /// Stop everything; call when leaving the reading phase.
    pub fn close(&mut self) {
        self.close_selection();
        self.stop_narration();
        self.engine.stop_all();
    }
}

impl Drop for Reader {
    fn drop(&mut self) {
        for task in self.selection_tasks.drain(..) {
            task.abort();
        }
        if let Some(task) = self.narration_task.take() {
            task.abort();
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use crate::audio::playback::tests::{ManualClock, RecordingOutput};
    use crate::audio::{LogSpeech, PlaybackState};
    use crate::compose::{compose_article, sample_article};
    use crate::llm::mock::{assistant, MockGenerator, MockImages, MockSpeech};

    const ANALYSIS: &str = "这里用叠词写出了荷叶的繁密，画面感很强。";
    const VIEWPORT: Viewport = Viewport {
        width: 1280.0,
        height: 800.0,
    };

    struct Rig {
        reader: Reader,
        clock: Arc<ManualClock>,
        output: Arc<RecordingOutput>,
    }

    fn rig_with(assistant: ReadingAssistant, article: Article) -> Rig {
        let clock = Arc::new(ManualClock::default());
        let output = Arc::new(RecordingOutput::default());
        let engine = AudioEngine::new(output.clone(), clock.clone());
        let reader = Reader::new(article, assistant, engine, Arc::new(LogSpeech));
        Rig {
            reader,
            clock,
            output,
        }
    }

    fn rig(generator: MockGenerator) -> Rig {
        rig_with(assistant(generator), sample_article())
    }

    fn reading_session() -> LearningSession {
        let mut session = LearningSession::new();
        session.complete(sample_article()).unwrap();
        session.start_reading().unwrap();
        session
    }

    fn anchor() -> Rect {
        Rect::new(100.0, 100.0, 200.0, 120.0)
    }

    // ----- selection -------------------------------------------------------

    #[tokio::test]
    async fn stale_pinyin_does_not_overwrite_new_selection() {
        let generator = MockGenerator::new(|req| {
            if req.prompt.contains("荷塘") {
                Ok("hé táng".into())
            } else {
                Ok("yuè sè".into())
            }
        })
        .with_delay(Duration::from_millis(20));
        let mut rig = rig(generator);

        assert!(rig.reader.select("荷塘", anchor(), VIEWPORT));
        assert!(rig.reader.select("月色", anchor(), VIEWPORT));
        rig.reader.next_event().await.unwrap();

        assert_eq!(rig.reader.selection().unwrap().pinyin(), Some("yuè sè"));

        // A result for the first selection that slipped past the abort.
        rig.reader
            .apply(ReaderEvent::Pinyin {
                generation: 1,
                pinyin: "hé táng".into(),
            })
            .unwrap();
        assert_eq!(rig.reader.selection().unwrap().pinyin(), Some("yuè sè"));
    }

    #[tokio::test]
    async fn pinyin_fallback_echo_leaves_pinyin_absent() {
        let mut rig = rig(MockGenerator::failing());
        rig.reader.select("荷塘", anchor(), VIEWPORT);
        rig.reader.next_event().await.unwrap();
        assert_eq!(rig.reader.selection().unwrap().pinyin(), None);
    }

    #[tokio::test]
    async fn blank_selection_is_ignored() {
        let mut rig = rig(MockGenerator::fixed(ANALYSIS));
        assert!(!rig.reader.select("  \n", anchor(), VIEWPORT));
        assert!(rig.reader.selection().is_none());
    }

    #[tokio::test]
    async fn analysis_then_note() {
        let mut rig = rig(MockGenerator::fixed(ANALYSIS));
        let mut session = reading_session();
        rig.reader.select("田田的叶子", anchor(), VIEWPORT);

        assert_eq!(rig.reader.save_note(&mut session), Err(ReaderError::NoAnalysis));

        rig.reader.request_analysis().unwrap();
        assert_eq!(
            rig.reader.selection().unwrap().analysis(),
            &AnalysisState::Loading
        );
        // pinyin, then analysis
        rig.reader.next_event().await.unwrap();
        rig.reader.next_event().await.unwrap();

        let note = rig.reader.save_note(&mut session).unwrap();
        assert_eq!(note.selected_text, "田田的叶子");
        assert_eq!(note.ai_analysis, ANALYSIS);
        assert_eq!(session.notes().len(), 1);
    }

    #[tokio::test]
    async fn failed_analysis_is_distinct_and_retryable() {
        let mut rig = rig(MockGenerator::failing());
        rig.reader.select("田田的叶子", anchor(), VIEWPORT);
        rig.reader.request_analysis().unwrap();
        rig.reader.next_event().await.unwrap();
        rig.reader.next_event().await.unwrap();

        let state = rig.reader.selection().unwrap().analysis().clone();
        assert_eq!(state, AnalysisState::Failed(ANALYSIS_FAILED.to_string()));

        rig.reader.request_analysis().unwrap();
        assert_eq!(
            rig.reader.selection().unwrap().analysis(),
            &AnalysisState::Loading
        );
    }

    #[tokio::test]
    async fn save_vocab_uses_known_pinyin() {
        let mut rig = rig(MockGenerator::fixed("mí wàng"));
        let mut session = reading_session();
        rig.reader.select("弥望", anchor(), VIEWPORT);
        rig.reader.next_event().await.unwrap();

        let vocab = rig.reader.save_vocab(&mut session).unwrap();
        assert_eq!(vocab.word, "弥望");
        assert_eq!(vocab.pinyin.as_deref(), Some("mí wàng"));
        assert!(vocab.definition.is_empty());
        assert_eq!(session.vocab().len(), 1);
    }

    #[tokio::test]
    async fn save_outside_reading_is_rejected() {
        let mut rig = rig(MockGenerator::fixed("mí wàng"));
        let mut session = LearningSession::new();
        rig.reader.select("弥望", anchor(), VIEWPORT);

        assert!(matches!(
            rig.reader.save_vocab(&mut session),
            Err(ReaderError::Session(SessionError::InvalidTransition { .. }))
        ));
        assert!(session.vocab().is_empty());
    }

    #[tokio::test]
    async fn lecture_is_synthesised_once_per_selection() {
        let speech = MockSpeech::pcm(24_000);
        let speech_calls = speech.calls();
        let a = ReadingAssistant::new(
            Arc::new(MockGenerator::fixed(ANALYSIS)),
            Arc::new(speech),
            Arc::new(MockImages::none()),
        );
        let mut rig = rig_with(a, sample_article());
        rig.reader.select("田田的叶子", anchor(), VIEWPORT);
        rig.reader.request_analysis().unwrap();
        rig.reader.next_event().await.unwrap();
        rig.reader.next_event().await.unwrap();

        rig.reader.toggle_analysis_narration().unwrap();
        rig.reader.next_event().await.unwrap();
        let lecture = Slot::AnalysisLecture;
        assert!(rig.reader.engine().slot(lecture).is_playing());

        rig.reader.toggle_analysis_narration().unwrap();
        assert!(!rig.reader.engine().slot(lecture).is_playing());

        rig.reader.toggle_analysis_narration().unwrap();
        assert!(rig.reader.engine().slot(lecture).is_playing());
        assert_eq!(rig.output.last_offset(), Some(0.0));
        assert_eq!(speech_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn new_selection_stops_selection_audio() {
        let mut rig = rig(MockGenerator::fixed(ANALYSIS));
        rig.reader.select("曲曲折折的荷塘上面弥望的是田田的叶子", anchor(), VIEWPORT);
        rig.reader.read_selection().unwrap();
        rig.reader.next_event().await.unwrap();
        rig.reader.next_event().await.unwrap();
        assert!(rig.reader.engine().slot(Slot::SelectionRead).is_playing());

        rig.reader.select("月色", anchor(), VIEWPORT);
        assert_eq!(
            rig.reader.engine().slot(Slot::SelectionRead).state(),
            PlaybackState::Idle
        );
        assert_eq!(rig.output.live(), 0);
    }

    #[tokio::test]
    async fn short_selection_is_spoken_locally() {
        let mut rig = rig(MockGenerator::fixed("hé táng"));
        rig.reader.select("荷塘", anchor(), VIEWPORT);
        rig.reader.read_selection().unwrap();
        rig.reader.next_event().await.unwrap();
        rig.reader.next_event().await.unwrap();
        assert!(!rig.reader.engine().slot(Slot::SelectionRead).has_buffer());
    }

    #[tokio::test]
    async fn dragging_blocks_reselection() {
        let mut rig = rig(MockGenerator::fixed("hé táng"));
        rig.reader.select("荷塘", anchor(), VIEWPORT);
        let start = rig.reader.selection().unwrap().popover_position();

        rig.reader.begin_drag(Point::new(0.0, 0.0));
        assert!(!rig.reader.select("月色", anchor(), VIEWPORT));
        let moved = rig.reader.drag_to(Point::new(30.0, -10.0)).unwrap();
        rig.reader.end_drag();

        assert_eq!(moved, Point::new(start.x + 30.0, start.y - 10.0));
        assert_eq!(rig.reader.selection().unwrap().text(), "荷塘");
        assert!(rig.reader.select("月色", anchor(), VIEWPORT));
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let mut rig = rig(MockGenerator::fixed("hé táng"));
        rig.reader.close_selection();
        rig.reader.select("荷塘", anchor(), VIEWPORT);
        rig.reader.close_selection();
        rig.reader.close_selection();
        assert!(rig.reader.selection().is_none());
        assert_eq!(rig.reader.request_analysis(), Err(ReaderError::NoSelection));
    }

    // ----- narration -------------------------------------------------------

    fn narration_rig() -> Rig {
        // 0.1 s of audio per paragraph.
        rig(MockGenerator::fixed(ANALYSIS))
    }

    #[tokio::test]
    async fn paragraph_toggle_pauses_and_resumes() {
        let mut rig = narration_rig();
        rig.reader.toggle_paragraph(0).unwrap();
        assert!(rig.reader.narration().is_loading());
        rig.reader.next_event().await.unwrap();
        assert!(rig.reader.engine().slot(Slot::Narration).is_playing());

        rig.clock.advance(0.05);
        rig.reader.tick();
        rig.reader.toggle_paragraph(0).unwrap();
        assert_eq!(
            rig.reader.engine().slot(Slot::Narration).state(),
            PlaybackState::Paused
        );

        rig.reader.toggle_paragraph(0).unwrap();
        let offset = rig.output.last_offset().unwrap();
        assert!((offset - 0.05).abs() < 1e-9);
    }

    #[tokio::test]
    async fn auto_restart_resumes_from_zero() {
        let mut rig = narration_rig();
        rig.reader.set_auto_restart(true);
        rig.reader.toggle_paragraph(0).unwrap();
        rig.reader.next_event().await.unwrap();
        rig.clock.advance(0.05);
        rig.reader.toggle_paragraph(0).unwrap();
        rig.reader.toggle_paragraph(0).unwrap();
        assert_eq!(rig.output.last_offset(), Some(0.0));
    }

    #[tokio::test]
    async fn progress_drives_read_boundary() {
        let article = compose_article("短文", "a\n\nb").unwrap();
        let a = ReadingAssistant::new(
            Arc::new(MockGenerator::fixed(ANALYSIS)),
            Arc::new(MockSpeech::pcm(2_400)),
            Arc::new(MockImages::none()),
        )
        .with_limits(crate::config::GenerationLimits {
            direct_tts_max_chars: 0,
            ..Default::default()
        });
        let mut rig = rig_with(a, article);

        rig.reader.toggle_paragraph(0).unwrap();
        rig.reader.next_event().await.unwrap();
        assert_eq!(rig.reader.read_boundary(0), 0);

        rig.clock.advance(1.0);
        rig.reader.tick();
        assert_eq!(rig.reader.read_boundary(0), "a".len());
        assert_eq!(rig.reader.read_boundary(1), 0);

        rig.reader.restart_paragraph(0).unwrap();
        assert_eq!(rig.reader.read_boundary(0), 0);
    }

    #[tokio::test]
    async fn switching_paragraph_discards_stale_speech() {
        let mut rig = narration_rig();
        rig.reader.toggle_paragraph(0).unwrap();
        let stale = rig.reader.narration().generation();
        rig.reader.toggle_paragraph(1).unwrap();
        rig.reader.next_event().await.unwrap();

        assert_eq!(rig.reader.narration().active(), Some(1));

        rig.reader
            .apply(ReaderEvent::Narration {
                generation: stale,
                index: 0,
                outcome: SpeechOutcome::Unavailable,
            })
            .unwrap();
        assert_eq!(rig.reader.narration().active(), Some(1));
        assert!(rig.reader.engine().slot(Slot::Narration).is_playing());
    }

    #[tokio::test]
    async fn synthesis_failure_leaves_no_active_paragraph() {
        let a = ReadingAssistant::new(
            Arc::new(MockGenerator::fixed(ANALYSIS)),
            Arc::new(MockSpeech::failing()),
            Arc::new(MockImages::none()),
        );
        let mut rig = rig_with(a, sample_article());
        rig.reader.toggle_paragraph(2).unwrap();
        let result = rig.reader.next_event().await;

        assert!(matches!(result, Err(ReaderError::Synthesis(_))));
        assert_eq!(rig.reader.narration().active(), None);
        assert_eq!(
            rig.reader.restart_paragraph(2),
            Err(ReaderError::NoActiveParagraph)
        );
    }

    #[tokio::test]
    async fn unknown_paragraph_is_rejected() {
        let mut rig = narration_rig();
        assert_eq!(
            rig.reader.toggle_paragraph(9),
            Err(ReaderError::UnknownParagraph(9))
        );
    }

    #[tokio::test]
    async fn close_releases_every_slot() {
        let mut rig = narration_rig();
        rig.reader.toggle_paragraph(0).unwrap();
        rig.reader.next_event().await.unwrap();
        rig.reader.close();
        rig.reader.close();

        assert_eq!(rig.output.live(), 0);
        assert_eq!(rig.reader.narration().active(), None);
    }
}
