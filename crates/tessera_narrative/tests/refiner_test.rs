//! Refiner two-stage behavior and vision helper degradation.

mod common;

use common::FakeDriver;
use std::sync::Arc;
use tessera_core::Message;
use tessera_error::BackendErrorKind;
use tessera_narrative::{ProseKind, Refiner, VisionKit, APOLOGY};
use tessera_store::TextBlock;

fn long_answer() -> String {
    "The scene unfolds slowly. ".repeat(12)
}

#[tokio::test]
async fn short_factual_answer_skips_literary_pass() {
    let driver = Arc::new(FakeDriver::new().respond_with("Blue."));
    let refiner = Refiner::new(driver.clone());

    let answer = refiner
        .respond("https://img/p.png", &[], "what color is the sky?", &[])
        .await;

    assert_eq!(answer, "Blue.");
    // One grounding call, no second stage
    assert_eq!(driver.call_count(), 1);
}

#[tokio::test]
async fn long_answer_gets_literary_pass() {
    let driver = Arc::new(
        FakeDriver::new()
            .respond_with(long_answer())
            .respond_with("A sensorily rich rendition."),
    );
    let refiner = Refiner::new(driver.clone());

    let answer = refiner
        .respond("https://img/p.png", &[], "what is happening?", &[])
        .await;

    assert_eq!(answer, "A sensorily rich rendition.");
    assert_eq!(driver.call_count(), 2);
}

#[tokio::test]
async fn narrative_keyword_triggers_pass_even_for_short_answers() {
    let driver = Arc::new(
        FakeDriver::new()
            .respond_with("A boat.")
            .respond_with("A lone boat rests on glassy water."),
    );
    let refiner = Refiner::new(driver);

    let answer = refiner
        .respond("https://img/p.png", &[], "tell me a story about this", &[])
        .await;

    assert_eq!(answer, "A lone boat rests on glassy water.");
}

#[tokio::test]
async fn stage_two_failure_returns_stage_one_output() {
    let driver = Arc::new(
        FakeDriver::new()
            .respond_with(long_answer())
            .fail_with(BackendErrorKind::Timeout),
    );
    let refiner = Refiner::new(driver);

    let answer = refiner
        .respond("https://img/p.png", &[], "what is happening?", &[])
        .await;

    // Refinement is best-effort; the grounded answer stands
    assert_eq!(answer, long_answer());
}

#[tokio::test]
async fn vision_failure_falls_back_to_text_only_with_context() {
    let driver = Arc::new(
        FakeDriver::new()
            .fail_with(BackendErrorKind::Timeout)
            .respond_with("Grounded in text alone."),
    );
    let refiner = Refiner::new(driver.clone());

    let blocks = vec![TextBlock::paragraph("the shoreline passage")];
    let history = vec![Message::text(tessera_core::Role::User, "earlier question")];
    let answer = refiner
        .respond("https://img/p.png", &blocks, "what now?", &history)
        .await;

    assert_eq!(answer, "Grounded in text alone.");
    assert_eq!(driver.call_count(), 2);
}

#[tokio::test]
async fn double_failure_returns_static_apology() {
    let driver = Arc::new(
        FakeDriver::new()
            .fail_with(BackendErrorKind::Timeout)
            .fail_with(BackendErrorKind::Timeout),
    );
    let refiner = Refiner::new(driver);

    let answer = refiner
        .respond("https://img/p.png", &[], "what now?", &[])
        .await;

    assert_eq!(answer, APOLOGY);
}

#[tokio::test]
async fn rewrite_block_keeps_original_on_failure() {
    let driver = Arc::new(FakeDriver::new().fail_with(BackendErrorKind::Timeout));
    let refiner = Refiner::new(driver);

    let rewritten = refiner
        .rewrite_block("https://img/p.png", "the original text", None)
        .await;

    assert_eq!(rewritten, "the original text");
}

#[tokio::test]
async fn rewrite_block_parses_json_payload() {
    let payload = serde_json::json!({"rewritten": "polished text"});
    let driver = Arc::new(FakeDriver::new().respond_with(payload.to_string()));
    let refiner = Refiner::new(driver);

    let rewritten = refiner
        .rewrite_block("https://img/p.png", "rough text", Some("polish it"))
        .await;

    assert_eq!(rewritten, "polished text");
}

#[tokio::test]
async fn prose_suggestion_requires_text_and_degrades_gracefully() {
    let driver = Arc::new(FakeDriver::new());
    let refiner = Refiner::new(driver);

    // No content: no backend call, informative message
    let empty = refiner.suggest_prose(&[], ProseKind::Story, "").await;
    assert!(empty.contains("No text content"));

    // Backend unavailable: apology instead of an empty failure
    let blocks = vec![TextBlock::paragraph("existing prose")];
    let degraded = refiner
        .suggest_prose(&blocks, ProseKind::ShortProse, "")
        .await;
    assert_eq!(degraded, APOLOGY);
}

#[tokio::test]
async fn story_connection_parses_and_clamps() {
    let payload = serde_json::json!({
        "coherence_score": 1.7,
        "explanation": "strong match",
        "visual_elements": ["boat"],
        "thematic_connections": ["solitude"]
    });
    let driver = Arc::new(FakeDriver::new().respond_with(payload.to_string()));
    let kit = VisionKit::new(driver);

    let connection = kit
        .suggest_story_connection("https://img/p.png", "a boat alone")
        .await;

    assert_eq!(connection.coherence_score, 1.0);
    assert_eq!(connection.explanation, "strong match");
    assert_eq!(connection.visual_elements, vec!["boat"]);
}

#[tokio::test]
async fn story_connection_degrades_to_neutral_score() {
    let driver = Arc::new(FakeDriver::new().fail_with(BackendErrorKind::Timeout));
    let kit = VisionKit::new(driver);

    let connection = kit
        .suggest_story_connection("https://img/p.png", "a boat alone")
        .await;

    assert_eq!(connection.coherence_score, 0.5);
}
