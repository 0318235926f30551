//! End-to-end integration tests for cardnews.
//!
//! The scripted tests drive the whole pipeline through the public API with
//! stub collaborators: no network, no API keys, and a skip guard for
//! machines without a usable render font. Live tests against the real
//! Gemini and stock-photo APIs are gated behind the `CARDNEWS_E2E`
//! environment variable so they do not run in CI unless explicitly
//! requested.
//!
//! Run with:
//!   cargo test --test e2e -- --nocapture
//!
//! To include the live tests:
//!   CARDNEWS_E2E=1 GEMINI_API_KEY=... cargo test --test e2e -- --nocapture

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use cardnews::sources::test_credential;
use cardnews::{
    acquire_images, enrich_cards, export_archive, export_document, generate_cards,
    load_render_font, AcquisitionProgressCallback, Card, CardError, DeckConfig, DeckError,
    ImageSource, ImageSourceKind, LayoutSettings, NoopProgressCallback, SearchProvider,
    TextGenerator,
};
use image::{DynamicImage, Rgba, RgbaImage};
use std::collections::VecDeque;
use std::io::{Cursor, Read};
use std::sync::{Arc, Mutex};
use zip::ZipArchive;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Replies handed out one per `generate` call, in order.
struct ScriptedGenerator {
    replies: Mutex<VecDeque<String>>,
}

impl ScriptedGenerator {
    fn new(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
        })
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, DeckError> {
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| DeckError::ApiError {
                message: "script exhausted".into(),
            })
    }
}

/// Source that yields a decodable PNG data URI for every card.
struct InlinePngSource;

#[async_trait]
impl ImageSource for InlinePngSource {
    fn name(&self) -> &'static str {
        "inline-png"
    }

    async fn acquire(
        &self,
        _card: &Card,
        _layout: &LayoutSettings,
    ) -> Result<Option<String>, CardError> {
        Ok(Some(tiny_png_data_uri()))
    }
}

fn tiny_png_data_uri() -> String {
    let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, Rgba([40, 90, 200, 255])));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    format!("data:image/png;base64,{}", STANDARD.encode(&buf))
}

/// A reply in the primary `카드 N: [제목] … / [본문] …` shape.
const CONTENT_REPLY: &str = "\
카드 1: [제목] 물 한 잔 / [본문] 일어나자마자 한 잔 마신다
카드 2: [제목] 가벼운 스트레칭 / [본문] 몸을 깨우는 5분이면 충분하다
카드 3: [제목] 아침 식사 / [본문] 단백질 위주로 간단하게 챙긴다";

const KEYWORD_REPLY: &str = "\
카드 1: [제목] 물 한 잔
🇰🇷 한글 검색어: \"물, 아침, 유리잔\"
🇺🇸 영문 검색어: \"water glass, morning light, hydration\"
카드 2: [제목] 가벼운 스트레칭
🇰🇷 한글 검색어: \"스트레칭, 아침 운동\"
🇺🇸 영문 검색어: \"stretching, morning exercise\"
카드 3: [제목] 아침 식사
🇰🇷 한글 검색어: \"아침 식사, 건강식\"
🇺🇸 영문 검색어: \"healthy breakfast, protein\"";

/// Archive export rasterises text, so it needs a Hangul-capable font.
fn render_font_available() -> bool {
    load_render_font(&DeckConfig::default()).is_ok()
}

// ── Scripted full-pipeline tests (no network, always run) ────────────────────

#[tokio::test]
async fn full_run_from_topic_to_archive() {
    if !render_font_available() {
        println!("SKIP — no usable system font for export rendering");
        return;
    }

    let config = DeckConfig::builder()
        .text_generator(ScriptedGenerator::new(&[CONTENT_REPLY, KEYWORD_REPLY]))
        .image_source(Arc::new(InlinePngSource))
        .card_pacing_ms(0)
        .build()
        .expect("valid config");

    let mut cards = generate_cards("아침 루틴 만들기", &config)
        .await
        .expect("generation should succeed");
    assert_eq!(cards.len(), 3);
    let ids: Vec<u32> = cards.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(cards[0].title, "물 한 잔");

    let applied = enrich_cards(&mut cards, &config)
        .await
        .expect("enrichment should succeed");
    assert_eq!(applied, 3);
    assert_eq!(cards[0].search_query(), "water glass");

    let report = acquire_images(&mut cards, &config)
        .await
        .expect("acquisition should start");
    assert_eq!(report.total, 3);
    assert_eq!(report.acquired, 3);
    assert!(report.is_clean());
    assert!(cards.iter().all(|c| c.image_url.is_some()));

    let export = export_archive(&cards, &config)
        .await
        .expect("export should succeed");
    assert_eq!(export.exported, 3);
    assert!(export.failed_ids.is_empty());
    assert!(export.file_name.starts_with("card-news-"));
    assert!(export.file_name.ends_with(".zip"));

    let mut archive = ZipArchive::new(Cursor::new(export.archive)).expect("valid zip");
    let names: Vec<String> = (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect();
    assert_eq!(names, ["card-1.png", "card-2.png", "card-3.png"]);

    // Every entry must decode as a PNG at the fixed export resolution.
    for i in 0..3 {
        let mut entry = archive.by_index(i).unwrap();
        let mut bytes = Vec::new();
        entry.read_to_end(&mut bytes).unwrap();
        let png = image::load_from_memory(&bytes).expect("entry must be a decodable image");
        assert_eq!((png.width(), png.height()), (1080, 1080));
    }
}

#[tokio::test]
async fn acquisition_events_stay_sequential_per_card() {
    // Record the full event stream; the order must follow the deck exactly,
    // one terminal event per card, with the failure in the middle leaving
    // its neighbours untouched.
    struct Recorder {
        events: Mutex<Vec<String>>,
    }
    impl AcquisitionProgressCallback for Recorder {
        fn on_acquisition_start(&self, total: usize) {
            self.events.lock().unwrap().push(format!("start {total}"));
        }
        fn on_card_start(&self, id: u32, _total: usize) {
            self.events.lock().unwrap().push(format!("card {id} begin"));
        }
        fn on_card_complete(&self, id: u32, _total: usize, set: bool) {
            self.events.lock().unwrap().push(format!("card {id} ok {set}"));
        }
        fn on_card_error(&self, id: u32, _total: usize, _error: &str) {
            self.events.lock().unwrap().push(format!("card {id} err"));
        }
        fn on_acquisition_complete(&self, total: usize, acquired: usize) {
            self.events
                .lock()
                .unwrap()
                .push(format!("done {acquired}/{total}"));
        }
    }

    /// Sets card 1, fails card 2, leaves card 3 blank.
    struct MixedSource;

    #[async_trait]
    impl ImageSource for MixedSource {
        fn name(&self) -> &'static str {
            "mixed"
        }

        async fn acquire(
            &self,
            card: &Card,
            _layout: &LayoutSettings,
        ) -> Result<Option<String>, CardError> {
            match card.id {
                2 => Err(CardError::NoResult {
                    card: card.id,
                    query: card.search_query().to_string(),
                }),
                3 => Ok(None),
                _ => Ok(Some(tiny_png_data_uri())),
            }
        }
    }

    let recorder = Arc::new(Recorder {
        events: Mutex::new(Vec::new()),
    });
    let config = DeckConfig::builder()
        .image_source(Arc::new(MixedSource))
        .progress(recorder.clone())
        .card_pacing_ms(0)
        .build()
        .expect("valid config");

    let mut cards = vec![
        Card::new(1, "하나", "본문"),
        Card::new(2, "둘", "본문"),
        Card::new(3, "셋", "본문"),
    ];
    let report = acquire_images(&mut cards, &config)
        .await
        .expect("resolve must pick the injected source");

    assert_eq!(report.acquired, 1);
    assert_eq!(report.failed(), 1);
    assert_eq!(report.errors[0].card(), 2);
    assert!(cards[0].image_url.is_some());
    assert!(cards[1].image_url.is_none());
    assert!(cards[2].image_url.is_none());

    let events = recorder.events.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![
            "start 3",
            "card 1 begin",
            "card 1 ok true",
            "card 2 begin",
            "card 2 err",
            "card 3 begin",
            "card 3 ok false",
            "done 1/3",
        ]
    );
}

#[tokio::test]
async fn manual_source_flows_into_a_document() {
    // Positional manual URLs through the real resolver: card 1 carries an
    // inline image, card 2 is deliberately blank, card 3 has no slot.
    let uri = tiny_png_data_uri();
    let config = DeckConfig::builder()
        .source_kind(ImageSourceKind::Manual)
        .manual_urls(vec![uri.clone(), String::new()])
        .card_pacing_ms(0)
        .build()
        .expect("valid config");

    let mut cards = vec![
        Card::new(1, "첫 번째", "본문 하나"),
        Card::new(2, "두 번째", "본문 둘"),
        Card::new(3, "세 번째", "본문 셋"),
    ];
    let report = acquire_images(&mut cards, &config)
        .await
        .expect("manual source needs no credentials");

    assert_eq!(report.acquired, 1);
    assert!(report.is_clean(), "blanks are not failures");
    assert_eq!(cards[0].image_url.as_deref(), Some(uri.as_str()));
    assert!(cards[1].image_url.is_none());
    assert!(cards[2].image_url.is_none());

    let doc = export_document(&cards, &config).expect("document export");
    assert_eq!(doc.file_name, "card-news.html");
    assert!(doc.html.contains(&uri), "inline image stays inline");
    assert!(doc.html.contains("두 번째"));
    assert!(doc.html.contains("Image 2"), "blank card gets a placeholder");
    assert!(!doc.html.contains("http://"), "document must be self-contained");
}

#[test]
fn deck_serialises_for_host_applications() {
    let mut card = Card::new(1, "물 한 잔", "일어나자마자 마신다");
    card.english_keywords = Some("water, morning".into());
    card.image_url = Some("https://example.invalid/1.jpg".into());

    let json = serde_json::to_string_pretty(&vec![card.clone()]).expect("must serialise");
    assert!(json.contains("\"englishKeywords\""));
    assert!(json.contains("\"imageUrl\""));

    let back: Vec<Card> = serde_json::from_str(&json).expect("must deserialise");
    assert_eq!(back, vec![card]);
}

/// The callback type the library stores must move freely into spawned tasks.
#[tokio::test]
async fn callback_moves_into_spawned_tasks() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<NoopProgressCallback>();

    let cb: Arc<dyn AcquisitionProgressCallback> = Arc::new(NoopProgressCallback);
    tokio::spawn(async move {
        cb.on_acquisition_start(5);
        cb.on_card_complete(1, 5, true);
        cb.on_card_error(2, 5, "timeout");
    })
    .await
    .expect("spawn must succeed");
}

// ── Live API tests (gated, need keys) ────────────────────────────────────────

/// Skip unless CARDNEWS_E2E is set *and* `var` holds a non-blank key.
fn live_key(var: &str) -> Option<String> {
    if std::env::var("CARDNEWS_E2E").is_err() {
        println!("SKIP — set CARDNEWS_E2E=1 and {var} to run live tests");
        return None;
    }
    match std::env::var(var) {
        Ok(key) if !key.trim().is_empty() => Some(key),
        _ => {
            println!("SKIP — {var} not set");
            None
        }
    }
}

#[tokio::test]
async fn live_gemini_generates_a_korean_deck() {
    let Some(_key) = live_key("GEMINI_API_KEY") else {
        return;
    };

    let config = DeckConfig::builder()
        .source_kind(ImageSourceKind::Synthesis)
        .build()
        .expect("valid config");

    let mut cards = generate_cards("건강한 아침 루틴", &config)
        .await
        .expect("live generation should succeed");
    assert!(!cards.is_empty(), "model should produce at least one card");
    assert!(cards.iter().all(|c| !c.title.trim().is_empty()));
    assert!(cards.iter().enumerate().all(|(i, c)| c.id == i as u32 + 1));

    let applied = enrich_cards(&mut cards, &config)
        .await
        .expect("live enrichment should succeed");

    println!("[live-gemini] {} cards, {applied} enriched", cards.len());
    for card in &cards {
        println!("  {}: {} / {:?}", card.id, card.title, card.english_keywords);
    }
}

#[tokio::test]
async fn live_pexels_credential_roundtrip() {
    let Some(key) = live_key("PEXELS_API_KEY") else {
        return;
    };
    assert!(
        test_credential(SearchProvider::Pexels, &key).await,
        "Pexels must accept the configured key"
    );
    assert!(
        !test_credential(SearchProvider::Pexels, "definitely-not-a-key").await,
        "Pexels must reject a bogus key"
    );
}

#[tokio::test]
async fn live_search_source_finds_stock_photos() {
    let Some(key) = live_key("PIXABAY_API_KEY") else {
        return;
    };

    let config = DeckConfig::builder()
        .source_kind(ImageSourceKind::Search)
        .provider(SearchProvider::Pixabay)
        .search_api_key(key)
        .card_pacing_ms(250)
        .build()
        .expect("valid config");

    let mut cards = vec![Card::new(1, "아침 식사", "본문")];
    cards[0].english_keywords = Some("healthy breakfast".into());

    let report = acquire_images(&mut cards, &config)
        .await
        .expect("search source should resolve");
    assert!(report.is_clean(), "errors: {:?}", report.errors);
    assert!(
        cards[0]
            .image_url
            .as_deref()
            .unwrap_or("")
            .starts_with("https://"),
        "expected a hosted photo URL, got {:?}",
        cards[0].image_url
    );
}
