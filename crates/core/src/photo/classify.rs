//! Heuristic photo classification.
//!
//! Layered strategy, first success wins: an optional vision step, keyword
//! scoring over the photo's textual signals, a deterministic hash bucket for
//! opaque provider references, and an absolute "other" fallback. Every layer
//! is deterministic, so identical input always classifies identically.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinSet;

use super::types::{Classification, PhotoCategory};

/// Lightweight metadata available at ingestion time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifierInput {
    pub url: Option<String>,
    pub filename: Option<String>,
    pub alt_text: Option<String>,
    /// Opaque provider photo reference (e.g. a place-photo handle).
    pub external_ref: Option<String>,
    /// Position of the photo within an imported set, when known.
    pub position_hint: Option<usize>,
}

/// A vision-model result. Absence (and any provider error, which
/// implementers map to absence) falls through to the heuristic layers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisionResult {
    pub category: PhotoCategory,
    pub confidence: f64,
}

/// Extension point for a real vision classifier. Implementations should
/// impose their own timeout and honor caller cancellation.
#[async_trait]
pub trait VisionStep: Send + Sync {
    async fn classify_image(&self, input: &ClassifierInput) -> Option<VisionResult>;
}

/// Keyword phrases per category, in canonical declaration order. A phrase
/// matches when every one of its tokens is present; ties between categories
/// go to the earlier entry.
const CATEGORY_KEYWORDS: [(PhotoCategory, &[&str]); 6] = [
    (
        PhotoCategory::Exterior,
        &["exterior", "outside", "outdoor", "storefront", "building", "facade", "front"],
    ),
    (
        PhotoCategory::Interior,
        &["interior", "inside", "indoor", "dining room", "table", "bar area", "counter"],
    ),
    (
        PhotoCategory::Food,
        &["food", "dish", "meal", "plate", "dessert", "pizza", "burger", "pasta", "salad"],
    ),
    (PhotoCategory::Menu, &["menu", "board", "menu-board", "price-list"]),
    (
        PhotoCategory::Drink,
        &["drink", "cocktail", "coffee", "tea", "beer", "wine", "latte"],
    ),
    (
        PhotoCategory::People,
        &["people", "person", "staff", "team", "chef", "customer", "group", "portrait"],
    ),
];

/// Buckets for the deterministic fallback. Photo sets without any textual
/// signal fan out across these instead of collapsing onto one category.
const FALLBACK_BUCKETS: [PhotoCategory; 3] =
    [PhotoCategory::Exterior, PhotoCategory::Interior, PhotoCategory::Food];

const FALLBACK_TAG: &str = "deterministic-fallback";
const FALLBACK_CONFIDENCE: f64 = 0.56;
pub const DEFAULT_BATCH_CHUNK: usize = 10;

/// Polynomial hash over UTF-8 bytes: `h = h * 31 + byte`, wrapping u32.
/// Fixed so the same reference buckets identically across implementations.
fn hash_ref(value: &str) -> u32 {
    value
        .bytes()
        .fold(0u32, |hash, byte| hash.wrapping_mul(31).wrapping_add(u32::from(byte)))
}

/// Lowercase alphanumeric tokens from every available text field.
fn tokenize(input: &ClassifierInput) -> Vec<String> {
    let joined = [
        input.url.as_deref(),
        input.filename.as_deref(),
        input.alt_text.as_deref(),
        input.external_ref.as_deref(),
    ]
    .iter()
    .flatten()
    .filter(|part| !part.trim().is_empty())
    .map(|part| part.to_lowercase())
    .collect::<Vec<_>>()
    .join(" ");

    joined
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

fn phrase_matches(phrase: &str, tokens: &[String]) -> bool {
    let mut parts = phrase
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty());
    parts.all(|part| tokens.iter().any(|token| token == part))
}

/// Highest-scoring category, ties broken by table order. `None` when
/// nothing scored.
fn score_keywords(tokens: &[String]) -> Option<(PhotoCategory, usize)> {
    let mut best: Option<(PhotoCategory, usize)> = None;
    for (category, phrases) in CATEGORY_KEYWORDS {
        let score = phrases
            .iter()
            .filter(|phrase| phrase_matches(phrase, tokens))
            .count();
        if score > 0 && best.is_none_or(|(_, top)| score > top) {
            best = Some((category, score));
        }
    }
    best
}

fn bucket_fallback(input: &ClassifierInput, tokens: &[String]) -> Option<Classification> {
    let external_ref = input.external_ref.as_deref().filter(|r| !r.trim().is_empty())?;
    let index = match input.position_hint {
        Some(position) => position % FALLBACK_BUCKETS.len(),
        None => hash_ref(external_ref) as usize % FALLBACK_BUCKETS.len(),
    };
    let category = FALLBACK_BUCKETS[index];

    let mut tags = vec![FALLBACK_TAG.to_string(), category.as_str().to_string()];
    tags.extend(tokens.iter().take(4).cloned());

    Some(Classification {
        category,
        confidence: FALLBACK_CONFIDENCE,
        tags,
    })
}

/// Low-confidence results never carry a real category: the category is
/// forced to "other" while the confidence is left as evidence.
fn finalize(mut result: Classification) -> Classification {
    if result.confidence < 0.5 {
        result.category = PhotoCategory::Other;
    }
    result
}

/// The layered classifier. Cheap to clone; the optional vision step is
/// shared.
#[derive(Clone, Default)]
pub struct PhotoClassifier {
    vision: Option<Arc<dyn VisionStep>>,
}

impl PhotoClassifier {
    /// Heuristics only.
    pub fn new() -> Self {
        Self { vision: None }
    }

    pub fn with_vision(vision: Arc<dyn VisionStep>) -> Self {
        Self {
            vision: Some(vision),
        }
    }

    /// Classify one photo. Never fails; the worst input degrades to
    /// category "other".
    pub async fn classify(&self, input: &ClassifierInput) -> Classification {
        let tokens = tokenize(input);

        if let Some(vision) = &self.vision {
            if let Some(result) = vision.classify_image(input).await {
                let confidence = result.confidence.clamp(0.0, 1.0);
                if confidence >= 0.5 && result.category != PhotoCategory::Other {
                    let mut tags = vec!["vision".to_string()];
                    tags.extend(tokens.iter().take(8).cloned());
                    return finalize(Classification {
                        category: result.category,
                        confidence,
                        tags,
                    });
                }
            }
        }

        if tokens.is_empty() {
            if let Some(fallback) = bucket_fallback(input, &tokens) {
                return finalize(fallback);
            }
            return finalize(Classification {
                category: PhotoCategory::Other,
                confidence: 0.2,
                tags: Vec::new(),
            });
        }

        if let Some((category, score)) = score_keywords(&tokens) {
            let confidence = (0.45 + 0.2 * score as f64).min(0.95);
            return finalize(Classification {
                category,
                confidence,
                tags: tokens.into_iter().take(8).collect(),
            });
        }

        if let Some(fallback) = bucket_fallback(input, &tokens) {
            return finalize(fallback);
        }

        finalize(Classification {
            category: PhotoCategory::Other,
            confidence: 0.35,
            tags: tokens.into_iter().take(6).collect(),
        })
    }

    /// Classify a set of photos, `chunk_size` at a time, preserving input
    /// order. Photos have no ordering dependency between each other, so any
    /// concurrency degree is safe.
    pub async fn classify_batch(
        &self,
        inputs: Vec<ClassifierInput>,
        chunk_size: usize,
    ) -> Vec<Classification> {
        let chunk_size = if chunk_size == 0 { DEFAULT_BATCH_CHUNK } else { chunk_size };
        let mut results = Vec::with_capacity(inputs.len());

        for chunk in inputs.chunks(chunk_size) {
            let mut tasks = JoinSet::new();
            for (index, input) in chunk.iter().cloned().enumerate() {
                let classifier = self.clone();
                tasks.spawn(async move { (index, classifier.classify(&input).await) });
            }

            let mut chunk_results: Vec<Option<Classification>> = vec![None; chunk.len()];
            while let Some(joined) = tasks.join_next().await {
                if let Ok((index, classification)) = joined {
                    chunk_results[index] = Some(classification);
                }
            }

            results.extend(chunk_results.into_iter().map(|result| {
                result.unwrap_or(Classification {
                    category: PhotoCategory::Other,
                    confidence: 0.2,
                    tags: Vec::new(),
                })
            }));
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn named(filename: &str) -> ClassifierInput {
        ClassifierInput {
            filename: Some(filename.to_string()),
            ..Default::default()
        }
    }

    fn by_ref(external_ref: &str) -> ClassifierInput {
        ClassifierInput {
            external_ref: Some(external_ref.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn exterior_filename_end_to_end() {
        let classifier = PhotoClassifier::new();
        let result = classifier.classify(&named("front-exterior-01.jpg")).await;
        assert_eq!(result.category, PhotoCategory::Exterior);
        assert!(result.confidence >= 0.65);
    }

    #[tokio::test]
    async fn multi_word_phrases_need_all_tokens() {
        let classifier = PhotoClassifier::new();

        let result = classifier.classify(&named("dining-room-view.jpg")).await;
        assert_eq!(result.category, PhotoCategory::Interior);

        // "room" alone matches nothing.
        let result = classifier.classify(&named("room-view.jpg")).await;
        assert_eq!(result.category, PhotoCategory::Other);
    }

    #[tokio::test]
    async fn ties_break_by_table_order() {
        // "front" scores exterior, "table" scores interior; exterior wins.
        let classifier = PhotoClassifier::new();
        let result = classifier.classify(&named("front table")).await;
        assert_eq!(result.category, PhotoCategory::Exterior);
    }

    #[tokio::test]
    async fn classification_is_deterministic() {
        let classifier = PhotoClassifier::new();
        let inputs = [
            named("front-exterior-01.jpg"),
            by_ref("AUjq9jkN4x"),
            ClassifierInput::default(),
        ];
        for input in inputs {
            let first = classifier.classify(&input).await;
            let second = classifier.classify(&input).await;
            assert_eq!(first, second);
        }
    }

    #[tokio::test]
    async fn opaque_refs_spread_across_buckets() {
        let classifier = PhotoClassifier::new();
        let mut categories = HashSet::new();

        for letter in b'a'..=b't' {
            let reference = (letter as char).to_string();
            let result = classifier.classify(&by_ref(&reference)).await;
            assert_eq!(result.confidence, FALLBACK_CONFIDENCE);
            assert_eq!(result.tags[0], FALLBACK_TAG);
            assert!(FALLBACK_BUCKETS.contains(&result.category));
            categories.insert(result.category);
        }

        assert!(categories.len() >= 3, "expected bucket spread, got {categories:?}");
    }

    #[tokio::test]
    async fn position_hint_overrides_the_hash() {
        let classifier = PhotoClassifier::new();
        for (position, expected) in FALLBACK_BUCKETS.iter().enumerate() {
            let input = ClassifierInput {
                external_ref: Some("AUjq9jkN4x".to_string()),
                position_hint: Some(position),
                ..Default::default()
            };
            let result = classifier.classify(&input).await;
            assert_eq!(result.category, *expected);
        }
    }

    #[tokio::test]
    async fn no_signal_at_all_is_other() {
        let classifier = PhotoClassifier::new();
        let result = classifier.classify(&ClassifierInput::default()).await;
        assert_eq!(result.category, PhotoCategory::Other);
        assert_eq!(result.confidence, 0.2);
        assert!(result.tags.is_empty());
    }

    #[tokio::test]
    async fn unmatched_tokens_without_ref_are_other() {
        let classifier = PhotoClassifier::new();
        let result = classifier.classify(&named("vacation-snapshot-129.jpg")).await;
        assert_eq!(result.category, PhotoCategory::Other);
        assert_eq!(result.confidence, 0.35);
        assert!(!result.tags.is_empty());
    }

    #[tokio::test]
    async fn low_confidence_never_keeps_a_real_category() {
        let classifier = PhotoClassifier::new();
        let inputs = [
            ClassifierInput::default(),
            named("vacation-snapshot-129.jpg"),
            by_ref("AUjq9jkN4x"),
            named("front-exterior-01.jpg"),
        ];
        for input in inputs {
            let result = classifier.classify(&input).await;
            if result.confidence < 0.5 {
                assert_eq!(result.category, PhotoCategory::Other);
            }
        }
    }

    struct FixedVision(Option<VisionResult>);

    #[async_trait]
    impl VisionStep for FixedVision {
        async fn classify_image(&self, _input: &ClassifierInput) -> Option<VisionResult> {
            self.0
        }
    }

    #[tokio::test]
    async fn confident_vision_result_wins() {
        let vision = Arc::new(FixedVision(Some(VisionResult {
            category: PhotoCategory::Food,
            confidence: 1.7,
        })));
        let classifier = PhotoClassifier::with_vision(vision);

        let result = classifier.classify(&named("front-exterior-01.jpg")).await;
        assert_eq!(result.category, PhotoCategory::Food);
        assert_eq!(result.confidence, 1.0);
        assert_eq!(result.tags[0], "vision");
    }

    #[tokio::test]
    async fn weak_or_missing_vision_falls_through() {
        for vision_result in [
            None,
            Some(VisionResult {
                category: PhotoCategory::Food,
                confidence: 0.4,
            }),
            Some(VisionResult {
                category: PhotoCategory::Other,
                confidence: 0.9,
            }),
        ] {
            let classifier = PhotoClassifier::with_vision(Arc::new(FixedVision(vision_result)));
            let result = classifier.classify(&named("front-exterior-01.jpg")).await;
            assert_eq!(result.category, PhotoCategory::Exterior);
        }
    }

    #[tokio::test]
    async fn batch_preserves_input_order() {
        let classifier = PhotoClassifier::new();
        let inputs = vec![
            named("front-exterior-01.jpg"),
            named("latte-art.jpg"),
            by_ref("a"),
            ClassifierInput::default(),
            named("team-photo.jpg"),
        ];
        let expected = {
            let mut sequential = Vec::new();
            for input in &inputs {
                sequential.push(classifier.classify(input).await);
            }
            sequential
        };

        let batched = classifier.classify_batch(inputs.clone(), 2).await;
        assert_eq!(batched, expected);

        // Chunk size 0 falls back to the default.
        let batched = classifier.classify_batch(inputs, 0).await;
        assert_eq!(batched, expected);
    }
}
