//! End-to-end pipeline tests with the offline provider

mod common;

use autoppt::ai::{AIConfig, LLMProvider, MockProvider};
use autoppt::ai::providers::OpenAIProvider;
use autoppt::config::Config;
use autoppt::error::Error;
use autoppt::generator::{Generator, GeneratorOptions};
use autoppt::render::{select_layout, Layout, SlideKind};
use autoppt::research::OfflineResearcher;
use autoppt::types::{ChartData, ChartType, SlideConfig, SlideType, StatisticData};
use common::{memory_generator, CountingResearcher, FailingSlideProvider};
use proptest::prelude::*;
use serde_json::{json, Value};

#[tokio::test]
async fn test_offline_end_to_end() {
    let (researcher, calls) = CountingResearcher::new();
    let (generator, handle) = memory_generator(Box::new(MockProvider::new()), Box::new(researcher));
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("ai.json");

    let outline = generator
        .generate_outline("Artificial Intelligence", 6, "English")
        .await
        .unwrap();
    assert!(outline.sections.len() >= 2);
    assert!(outline.sections.iter().all(|s| !s.slides.is_empty()));

    let saved = generator
        .generate("Artificial Intelligence", "minimalist", &output, 6, "English")
        .await
        .unwrap();
    assert_eq!(saved, output);
    assert!(std::fs::metadata(&output).unwrap().len() > 0);

    let record = handle.lock();
    assert_eq!(record.slides_of(SlideKind::Title).len(), 1);
    assert_eq!(
        record.slides_of(SlideKind::SectionHeader).len(),
        outline.sections.len()
    );
    assert_eq!(record.slides_of(SlideKind::Content).len(), outline.total_slides());
    assert_eq!(record.slides_of(SlideKind::Placeholder).len(), 0);
    assert_eq!(record.slides_of(SlideKind::References).len(), 1);
    assert_eq!(
        record.slides.len(),
        1 + outline.sections.len() + outline.total_slides() + 1
    );

    // One research query per slide topic, built from slide, section and topic
    assert_eq!(calls.searches(), outline.total_slides());
    let queries = calls.queries.lock();
    assert_eq!(
        queries[0],
        "Introduction to Artificial Intelligence Fundamentals of Artificial Intelligence Artificial Intelligence"
    );

    let title = record.slides_of(SlideKind::Title)[0];
    assert!(title.texts().contains(&"Topic: Artificial Intelligence"));
}

#[tokio::test]
async fn test_failed_slide_becomes_placeholder() {
    let (generator, handle) = memory_generator(
        Box::new(FailingSlideProvider::new("Economic Impact")),
        Box::new(OfflineResearcher),
    );
    let dir = tempfile::tempdir().unwrap();

    generator
        .generate("Solar Power", "corporate", &dir.path().join("solar.json"), 6, "English")
        .await
        .unwrap();

    let record = handle.lock();
    let placeholders = record.slides_of(SlideKind::Placeholder);
    assert_eq!(placeholders.len(), 1);
    let texts = placeholders[0].texts();
    assert_eq!(texts[0], "Economic Impact");
    assert!(texts[1].starts_with("Content generation failed"));
    assert_eq!(
        placeholders[0].notes.as_deref(),
        Some("Please regenerate this slide.")
    );

    // Body slide count still matches the outline
    let body = record.slides_of(SlideKind::Content).len() + placeholders.len();
    assert_eq!(body, 6);
}

#[tokio::test]
async fn test_rejected_key_mid_run_keeps_the_deck() {
    let (generator, handle) = memory_generator(
        Box::new(FailingSlideProvider::with_failure("Economic Impact", |provider| {
            Error::api_key(provider)
        })),
        Box::new(OfflineResearcher),
    );
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("solar.json");

    let saved = generator
        .generate("Solar Power", "corporate", &output, 6, "English")
        .await
        .unwrap();
    assert_eq!(saved, output);
    assert!(output.exists());

    let record = handle.lock();
    let placeholders = record.slides_of(SlideKind::Placeholder);
    assert_eq!(placeholders.len(), 1);
    let texts = placeholders[0].texts();
    assert_eq!(texts[0], "Economic Impact");
    assert!(texts[1].starts_with("Content generation failed: synthesizing 'Economic Impact'"));

    // Slides after the rejected one are still generated
    assert_eq!(record.slides_of(SlideKind::Content).len(), 5);
    assert_eq!(record.slides_of(SlideKind::References).len(), 1);
}

fn slide_without_citations(topic: &str) -> Value {
    json!({
        "title": format!("Notes on {topic}"),
        "bullets": ["First point", "Second point"],
        "citations": [],
    })
}

#[tokio::test]
async fn test_no_references_slide_without_citations() {
    let provider = MockProvider::new().with_builder("SlideConfig", slide_without_citations);
    let (generator, handle) = memory_generator(Box::new(provider), Box::new(OfflineResearcher));
    let dir = tempfile::tempdir().unwrap();

    generator
        .generate("Gardening", "nature", &dir.path().join("g.json"), 4, "English")
        .await
        .unwrap();

    assert!(handle.lock().slides_of(SlideKind::References).is_empty());
}

#[tokio::test]
async fn test_references_list_each_source_once() {
    let (generator, handle) =
        memory_generator(Box::new(MockProvider::new()), Box::new(OfflineResearcher));
    let dir = tempfile::tempdir().unwrap();

    generator
        .generate("Ocean Currents", "ocean", &dir.path().join("o.json"), 6, "English")
        .await
        .unwrap();

    let record = handle.lock();
    let references = record.slides_of(SlideKind::References);
    assert_eq!(references.len(), 1);

    // Every slide cites the same three sources
    let lines: Vec<&str> = references[0].texts().into_iter().skip(1).collect();
    assert_eq!(lines.len(), 3);
    let mut unique = lines.clone();
    unique.sort_unstable();
    unique.dedup();
    assert_eq!(unique.len(), lines.len());
    assert!(lines.iter().all(|l| l.contains("Ocean Currents")));
}

#[tokio::test]
async fn test_missing_credential_fails_before_any_work() {
    let mut ai = AIConfig::default();
    if let Some(openai) = ai.providers.get_mut("openai") {
        openai.api_key = Some("${AUTOPPT_TEST_UNSET_OPENAI_KEY}".to_string());
    }
    let config = Config {
        ai,
        ..Config::default()
    };
    let err = Generator::from_config(&config, Some("openai"), None, GeneratorOptions::default())
        .unwrap_err();
    assert!(matches!(err, Error::ApiKey { ref provider } if provider == "openai"));

    // A provider that rejects the credential on first use
    let (researcher, calls) = CountingResearcher::new();
    let provider: Box<dyn LLMProvider> = Box::new(OpenAIProvider::new("", "gpt-4o"));
    let (generator, handle) = memory_generator(provider, Box::new(researcher));
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("never.json");

    let err = generator
        .generate("Anything", "minimalist", &output, 5, "English")
        .await
        .unwrap_err();
    assert!(matches!(err.root(), Error::ApiKey { .. }));
    assert!(err.to_string().contains("generating outline"));
    assert_eq!(calls.total(), 0);
    assert!(handle.lock().slides.is_empty());
    assert!(!output.exists());
}

#[tokio::test]
async fn test_unknown_provider_is_configuration_error() {
    let err = Generator::from_config(
        &Config::default(),
        Some("deepmind"),
        None,
        GeneratorOptions::default(),
    )
    .unwrap_err();
    assert!(err.is_configuration());
    assert!(err.to_string().contains("Supported: openai, google, anthropic, ollama, mock"));
}

fn slide_type() -> impl Strategy<Value = SlideType> {
    prop_oneof![
        Just(SlideType::Content),
        Just(SlideType::Chart),
        Just(SlideType::Statistics),
        Just(SlideType::Image),
    ]
}

fn arb_slide() -> impl Strategy<Value = SlideConfig> {
    (
        slide_type(),
        proptest::option::of(0usize..6),
        any::<bool>(),
    )
        .prop_map(|(slide_type, stats, chart)| {
            let mut slide = SlideConfig::content("Slide", vec!["point".to_string()]);
            slide.slide_type = slide_type;
            slide.statistics = stats.map(|n| {
                (0..n)
                    .map(|i| StatisticData {
                        value: format!("{i}"),
                        label: "label".to_string(),
                    })
                    .collect()
            });
            slide.chart_data = chart.then(|| ChartData {
                chart_type: ChartType::Bar,
                title: "Chart".to_string(),
                categories: vec!["a".to_string()],
                values: vec![1.0],
                series_name: "Series 1".to_string(),
            });
            slide
        })
}

proptest! {
    #[test]
    fn prop_layout_selection_is_total_and_pure(slide in arb_slide(), fetched in any::<bool>()) {
        let layout = select_layout(&slide, fetched);
        prop_assert_eq!(layout, select_layout(&slide.clone(), fetched));

        let expected = match slide.slide_type {
            SlideType::Statistics if !slide.statistics().is_empty() => Layout::Statistics,
            SlideType::Image if fetched => Layout::FullscreenImage,
            SlideType::Chart if slide.chart_data.is_some() => Layout::Chart,
            _ => Layout::Content,
        };
        prop_assert_eq!(layout, expected);
    }
}
