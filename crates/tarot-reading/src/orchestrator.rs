use std::str::FromStr;
use std::time::Instant;

use futures::StreamExt;
use tarot_analysis::PatternAnalyzer;
use tarot_analysis::QuestionAnalyzer;
use tarot_cards::CardSelector;
use tarot_cards::DealtCard;
use tarot_cards::SignificatorInput;
use tarot_cards::SignificatorResolver;
use tarot_cards::Spread;
use tarot_cards::Suit;
use tarot_cards::SuitPriority;
use tarot_core::TarotError;
use tarot_dto::CreateReadingRequest;
use tarot_dto::DealtCardDto;
use tarot_dto::Event;
use tarot_dto::QuerentProfile;
use tarot_dto::ReadingResponse;
use tokio::sync::mpsc;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::UnboundedSender;

use crate::cancellation::cancellation_pair;
use crate::cancellation::CancellationHandle;
use crate::cancellation::CancellationToken;
use crate::context::ReadingContext;
use crate::imagery::ImageryGenerator;
use crate::imagery::ImageryOutput;
use crate::interpreter::Interpreter;
use crate::interpreter::OutputLanguage;
use crate::process_row::ProcessRow;
use crate::process_row::STEP_CARD_SELECTION;
use crate::process_row::STEP_IMAGERY;
use crate::process_row::STEP_INTERPRETATION;
use crate::process_row::STEP_PATTERN_ANALYSIS;
use crate::process_row::STEP_QUESTION_ANALYSIS;
use crate::process_row::STEP_RAG_RETRIEVAL;
use crate::reading::Reading;
use crate::retriever::merge_all;
use crate::retriever::Retriever;

/// Drives the eight-step pipeline, emitting SSE events and delegating audit
/// writes to `AuditSink` (spec §4.10 ReadingOrchestrator).
pub struct ReadingOrchestrator;

impl ReadingOrchestrator {
    /// Streamed entry point. Returns the event receiver plus a handle the
    /// caller uses to cancel the reading when its client connection closes
    /// (spec §5 Cancellation).
    pub fn stream_reading(ctx: ReadingContext, request: CreateReadingRequest) -> (UnboundedReceiver<Event>, CancellationHandle) {
        let (handle, token) = cancellation_pair();
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            run_pipeline(ctx, request, token, tx).await;
        });
        (rx, handle)
    }

    /// Non-streamed entry point: runs the identical pipeline to completion
    /// and returns one aggregate response (spec §4.10 — "the non-streamed
    /// variant runs the same pipeline but awaits every stage fully").
    pub async fn create_reading(ctx: ReadingContext, request: CreateReadingRequest) -> ReadingResponse {
        let (_handle, token) = cancellation_pair();
        let (tx, _rx) = mpsc::unbounded_channel();
        let reading = run_pipeline(ctx, request, token, tx).await;
        to_response(&reading)
    }
}

fn to_response(reading: &Reading) -> ReadingResponse {
    ReadingResponse {
        id: reading.id.to_string(),
        question: reading.question.clone(),
        spread: reading.spread_type.clone().unwrap_or_default(),
        significator: reading
            .significator
            .as_ref()
            .map(|dealt| DealtCardDto::from(dealt)),
        cards: reading.cards.iter().map(DealtCardDto::from).collect(),
        imagery: reading.imagery.clone().unwrap_or_default(),
        interpretation: reading.interpretation.clone().unwrap_or_default(),
        created_at: reading.created_at.to_rfc3339(),
    }
}

async fn run_pipeline(ctx: ReadingContext, request: CreateReadingRequest, cancellation: CancellationToken, tx: UnboundedSender<Event>) -> Reading {
    let mut reading = Reading::new(request.question.clone(), request.user_id.clone(), request.source_page.clone());
    let _ = ctx.reading_store.create(&reading).await;
    let _ = tx.send(Event::started(reading.id.to_string(), "casting your reading..."));

    macro_rules! bail {
        ($e:expr) => {{
            fail(&mut reading, &ctx, &tx, $e).await;
            return reading;
        }};
    }

    if cancellation.is_cancelled() {
        return reading;
    }

    // --- 1. Question analysis (C9) ---------------------------------------
    let started_at = Instant::now();
    let analysis = match QuestionAnalyzer::analyze(
        ctx.question_model.as_ref(),
        &reading.question,
        request.user_selected_spread.as_deref(),
    )
    .await
    {
        Ok(analysis) => analysis,
        Err(e) => bail!(e),
    };
    let elapsed = started_at.elapsed().as_millis() as u64;

    let decide_spread = tarot_analysis::QuestionAnalysis::decide_spread(request.user_selected_spread.as_deref());
    let spread_name = decide_spread(&analysis);

    ctx.audit
        .write(ProcessRow::new(
            reading.id,
            "question_analysis",
            STEP_QUESTION_ANALYSIS,
            serde_json::json!({ "question": reading.question }),
            serde_json::to_value(&analysis).unwrap_or_default(),
            elapsed,
        ))
        .await;

    if let Err(e) = ctx.reading_store.save_question_analysis(reading.id, &analysis, &spread_name).await {
        bail!(e);
    }
    let _ = tx.send(Event::question_analysis(
        serde_json::to_value(&analysis).unwrap_or_default(),
        spread_name.clone(),
        "the question has been read",
    ));

    if cancellation.is_cancelled() {
        return reading;
    }

    // --- 2. Spread + significator + card selection (C5, C6, C7) ----------
    let spread = match Spread::parse(&spread_name) {
        Ok(spread) => spread,
        Err(e) => bail!(e),
    };

    let source = request.preferred_source.clone().unwrap_or_else(|| ctx.default_source.clone());

    let started_at = Instant::now();
    let mut significator = None;
    let mut significator_reason = None;
    if spread.uses_significator() {
        match &request.user_profile {
            Some(profile) => {
                let deck = match ctx.deck_repo.load(&source).await {
                    Ok(deck) => deck,
                    Err(e) => bail!(e),
                };
                let input = build_significator_input(profile, analysis.domain.as_str());
                match SignificatorResolver::resolve(&deck, &input) {
                    Ok((card, reason)) => {
                        significator = Some(card);
                        significator_reason = Some(reason);
                    }
                    Err(e) => bail!(e),
                }
            }
            None => {
                log::warn!(
                    "reading {}: celtic cross requested with no profile, proceeding without a significator",
                    reading.id
                );
            }
        }
    }

    let mut rng = rand::rng();
    let dealt = match CardSelector::deal(ctx.deck_repo.as_ref(), &source, spread, significator.as_ref(), &mut rng).await {
        Ok(dealt) => dealt,
        Err(e) => bail!(e),
    };
    let elapsed = started_at.elapsed().as_millis() as u64;

    reading.mark_cards_selected(spread_name.clone(), dealt.clone());
    reading.significator = significator.as_ref().map(|card| significator_as_dealt_card(card));
    reading.significator_reason = significator_reason.clone();

    ctx.audit
        .write(ProcessRow::new(
            reading.id,
            "card_selection",
            STEP_CARD_SELECTION,
            serde_json::json!({ "source": source, "spread": spread_name }),
            serde_json::json!({ "card_count": reading.cards.len() }),
            elapsed,
        ))
        .await;

    if let Err(e) = ctx
        .reading_store
        .save_cards(reading.id, &reading.cards, significator.as_ref().zip(significator_reason.as_deref()))
        .await
    {
        bail!(e);
    }

    let significator_dto = reading.significator.as_ref().map(DealtCardDto::from);
    let cards_dto: Vec<DealtCardDto> = reading.cards.iter().map(DealtCardDto::from).collect();
    let _ = tx.send(Event::cards_selected(cards_dto, significator_dto, "the cards have been drawn"));

    if cancellation.is_cancelled() {
        return reading;
    }

    // --- 3. Pattern analysis (C8) ------------------------------------------
    let started_at = Instant::now();
    let pattern_analysis = PatternAnalyzer::analyze(&reading.cards);
    let elapsed = started_at.elapsed().as_millis() as u64;
    reading.pattern_analysis = Some(pattern_analysis.clone());

    ctx.audit
        .write(ProcessRow::new(
            reading.id,
            "pattern_analysis",
            STEP_PATTERN_ANALYSIS,
            serde_json::json!({ "card_count": reading.cards.len() }),
            serde_json::to_value(&pattern_analysis).unwrap_or_default(),
            elapsed,
        ))
        .await;

    if let Err(e) = ctx.reading_store.save_pattern_analysis(reading.id, &pattern_analysis).await {
        bail!(e);
    }
    let _ = tx.send(Event::pattern_analyzed(
        serde_json::to_value(&pattern_analysis).unwrap_or_default(),
        "patterns in the spread identified",
    ));

    if cancellation.is_cancelled() {
        return reading;
    }

    // --- 4. Retrieval fan-out (C10) ----------------------------------------
    let started_at = Instant::now();
    let per_card = Retriever::retrieve_per_card(ctx.rag.clone(), reading.cards.clone(), tx.clone()).await;
    let background = Retriever::spawn_background(ctx.rag.clone(), reading.cards.clone(), spread_name.clone());
    let retrieval_elapsed = started_at.elapsed().as_millis() as u64;

    ctx.audit
        .write(ProcessRow::new(
            reading.id,
            "rag_retrieval",
            STEP_RAG_RETRIEVAL,
            serde_json::json!({ "card_count": reading.cards.len() }),
            serde_json::json!({ "per_card_chunks": per_card.iter().map(|c| c.merged.len()).sum::<usize>() }),
            retrieval_elapsed,
        ))
        .await;

    if cancellation.is_cancelled() {
        return reading;
    }

    // --- 5. Imagery (C11), overlapping with background retrieval ----------
    let started_at = Instant::now();
    let domain = Some(analysis.domain);
    let imagery_text = match ImageryGenerator::generate(ctx.imagery_model.as_ref(), &reading.cards, domain, &per_card).await {
        Ok(ImageryOutput::Fallback(text)) => {
            let _ = tx.send(Event::imagery_chunk(text.clone()));
            text
        }
        Ok(ImageryOutput::Streamed(mut stream)) => {
            let mut full = String::new();
            while let Some(chunk) = stream.next().await {
                match chunk {
                    Ok(piece) if !piece.is_empty() => {
                        let _ = tx.send(Event::imagery_chunk(piece.clone()));
                        full.push_str(&piece);
                    }
                    Ok(_) => {}
                    Err(e) => log::warn!("reading {}: imagery stream error: {e}", reading.id),
                }
            }
            full
        }
        Err(e) => bail!(e),
    };
    let (spread_chunks, relationship_chunks) = background.join().await;
    let elapsed = started_at.elapsed().as_millis() as u64;

    reading.imagery = Some(imagery_text.clone());
    ctx.audit
        .write(ProcessRow::new(
            reading.id,
            "imagery_description",
            STEP_IMAGERY,
            serde_json::json!({}),
            serde_json::json!({ "imagery": imagery_text }),
            elapsed,
        ))
        .await;
    if let Err(e) = ctx.reading_store.save_imagery(reading.id, &imagery_text).await {
        bail!(e);
    }
    let _ = tx.send(Event::imagery_generated(imagery_text.clone(), "imagery complete"));

    if cancellation.is_cancelled() {
        return reading;
    }

    // --- 6. Interpretation (C12) -------------------------------------------
    let _ = tx.send(Event::interpretation_started("composing your interpretation..."));

    let merged_chunks = merge_all(&per_card, spread_chunks, relationship_chunks);
    let language = OutputLanguage::parse(
        request
            .user_profile
            .as_ref()
            .and_then(|p| p.language.as_deref()),
    );

    let started_at = Instant::now();
    let interpretation_text = match Interpreter::generate(
        ctx.interpretation_model.as_ref(),
        &reading.question,
        &analysis,
        &reading.cards,
        &imagery_text,
        &pattern_analysis,
        &merged_chunks,
        language,
    )
    .await
    {
        Ok(mut stream) => {
            let mut full = String::new();
            while let Some(chunk) = stream.next().await {
                match chunk {
                    Ok(piece) if !piece.is_empty() => {
                        let _ = tx.send(Event::interpretation(piece.clone()));
                        full.push_str(&piece);
                    }
                    Ok(_) => {}
                    Err(e) => log::warn!("reading {}: interpretation stream error: {e}", reading.id),
                }
            }
            full
        }
        Err(e) => bail!(e),
    };
    let elapsed = started_at.elapsed().as_millis() as u64;

    ctx.audit
        .write(ProcessRow::new(
            reading.id,
            "final_interpretation",
            STEP_INTERPRETATION,
            serde_json::json!({ "chunk_count": merged_chunks.len() }),
            serde_json::json!({ "interpretation": interpretation_text }),
            elapsed,
        ))
        .await;

    reading.mark_completed(interpretation_text.clone());
    if ctx.reading_store.complete(reading.id, &interpretation_text).await.is_err() {
        if let Err(e) = ctx.reading_store.complete(reading.id, &interpretation_text).await {
            log::error!("reading {}: final persistence failed after retry: {e}", reading.id);
        }
    }

    let total_time_ms = (chrono::Utc::now() - reading.created_at).num_milliseconds().max(0) as u64;
    let _ = tx.send(Event::complete(
        reading.id.to_string(),
        reading.question.clone(),
        spread_name,
        total_time_ms,
        "reading complete",
    ));

    reading
}

async fn fail(reading: &mut Reading, ctx: &ReadingContext, tx: &UnboundedSender<Event>, error: TarotError) {
    let message = error.to_string();
    log::error!("reading {}: {message}", reading.id);
    reading.mark_error(message.clone());
    ctx.reading_store.fail(reading.id, &message).await;
    let _ = tx.send(Event::error(message, Some(reading.id.to_string())));
}

fn build_significator_input<'a>(profile: &'a QuerentProfile, domain: &'a str) -> SignificatorInput<'a> {
    let personality_suit = profile.personality_type.as_deref().and_then(|s| Suit::from_str(s).ok());
    let priority = profile.priority.as_deref().map(SuitPriority::parse).unwrap_or_default();
    SignificatorInput {
        age: profile.age,
        gender: profile.gender.as_deref(),
        zodiac_sign: profile.zodiac_sign.as_deref(),
        personality_suit,
        question_domain: Some(domain),
        priority,
    }
}

/// Wraps the resolved significator card as a `DealtCard` purely so it can
/// flow through `DealtCardDto::from` for the `cards_selected` event payload;
/// it is never added to `reading.cards` itself (spec §4.5 — the
/// significator is chosen, not drawn).
fn significator_as_dealt_card(card: &tarot_cards::Card) -> DealtCard {
    DealtCard {
        card: card.clone(),
        position: "significator".to_string(),
        position_order: 0,
        position_description: Some("the querent, chosen not drawn".to_string()),
        is_reversed: false,
    }
}
