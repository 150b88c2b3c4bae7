//! Command-line runner: one headless pass through a learning session.
//!
//! # Sequence
//!
//! 1. Initialise logging (`RUST_LOG`, default `info`).
//! 2. Load [`AppConfig`]; `SMARTREAD_API_KEY` fills a missing key.
//! 3. Compose the article from the given file.
//! 4. Generate the outline.
//! 5. Extract vocabulary and run the quiz, answering the first choice.
//! 6. Narrate the first paragraph when an output device is available.
//! 7. Prepare the workshop, print the exports and save them.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use smartread::{
    audio::{AudioEngine, AudioOutput, CpalOutput, LogSpeech, NullOutput, Slot, SystemClock},
    compose::compose_article,
    config::{AppConfig, AppPaths},
    llm::ReadingAssistant,
    outline::OutlineGuide,
    reader::Reader,
    session::LearningSession,
    vocab::{load_flow, VocabStage},
    workshop::Workshop,
};

#[derive(Parser, Debug)]
#[command(name = "smartread", about = "AI-assisted close reading from the terminal")]
struct Args {
    /// Plain-text article; paragraphs separated by blank lines.
    article: PathBuf,

    /// Article title (defaults to the file stem).
    #[arg(long)]
    title: Option<String>,

    /// Directory for exports (defaults to the platform data dir).
    #[arg(long)]
    out: Option<PathBuf>,
}

/// Upper bound on how long the narration demo plays.
const NARRATION_LIMIT: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = AppConfig::load()
        .context("loading settings.toml")?
        .with_env_api_key("SMARTREAD_API_KEY");
    let assistant = ReadingAssistant::from_config(&config);

    // ----- Compose -------------------------------------------------------
    let content = std::fs::read_to_string(&args.article)
        .with_context(|| format!("reading {}", args.article.display()))?;
    let title = args.title.clone().unwrap_or_else(|| {
        args.article
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    });
    let article = compose_article(&title, &content)?;
    log::info!("article 《{}》: {} paragraphs", article.title, article.paragraphs.len());

    let mut session = LearningSession::new();
    session.complete(article.clone())?;

    // ----- Outline -------------------------------------------------------
    let mut guide = OutlineGuide::new(&session)?;
    let generated = guide.generate(&assistant, &mut session).await.map(|_| ());
    match generated {
        Ok(()) => println!("{}\n", guide.full_text()),
        Err(e) => log::error!("outline unavailable: {e}"),
    }

    // ----- Vocabulary ----------------------------------------------------
    session.start_vocab()?;
    let mut flow = load_flow(&assistant, &article).await;
    while flow.stage() == VocabStage::Learning {
        if let Some(card) = flow.current_card() {
            println!("{} [{}] {}", card.word, card.pinyin.as_deref().unwrap_or(""), card.definition);
        }
        flow.next();
    }
    while flow.stage() == VocabStage::Quiz {
        let Some(choice) = flow.current_question().and_then(|q| q.choices().into_iter().next())
        else {
            break;
        };
        flow.answer(&choice);
        flow.next_question();
    }
    if flow.stage() == VocabStage::Result {
        println!("quiz: {}/{} ({}%) {}\n", flow.score(), flow.total(), flow.percent(), flow.message());
    }
    flow.complete(&mut session)?;

    // ----- Reading -------------------------------------------------------
    let (output, has_device): (Arc<dyn AudioOutput>, bool) = match CpalOutput::new() {
        Ok(out) => (Arc::new(out), true),
        Err(e) => {
            log::warn!("no audio output, narration skipped: {e}");
            (Arc::new(NullOutput::default()), false)
        }
    };
    if has_device && !article.paragraphs.is_empty() {
        let engine = AudioEngine::new(output, Arc::new(SystemClock::new()));
        let mut reader = Reader::new(article.clone(), assistant.clone(), engine, Arc::new(LogSpeech))
            .with_config(config.reader.clone())
            .with_audio_config(config.audio.clone());
        narrate_first_paragraph(&mut reader).await;
        reader.close();
    }
    session.finish_reading()?;

    // ----- Workshop ------------------------------------------------------
    let Some(workshop) = Workshop::prepare(&assistant, &session.snapshot()).await else {
        return Ok(());
    };
    session.apply_enrichment(workshop.vocab());
    let now = chrono::Local::now().naive_local();
    println!("{}\n", workshop.report_text(now));
    println!("{}\n", workshop.share_text());

    let dir = args.out.unwrap_or_else(|| AppPaths::new().exports_dir);
    for path in workshop.save_exports(&dir, now)? {
        println!("saved {}", path.display());
    }
    Ok(())
}

async fn narrate_first_paragraph(reader: &mut Reader) {
    if let Err(e) = reader.toggle_paragraph(0) {
        log::error!("narration failed: {e}");
        return;
    }
    if let Err(e) = reader.next_event().await {
        log::error!("narration failed: {e}");
        return;
    }

    let started = tokio::time::Instant::now();
    while reader.engine().slot(Slot::Narration).is_playing() && started.elapsed() < NARRATION_LIMIT {
        tokio::time::sleep(Duration::from_millis(250)).await;
        reader.tick();
    }
    reader.stop_narration();
}
