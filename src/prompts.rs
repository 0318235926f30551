//! Prompts for card-content generation, keyword suggestion and image
//! synthesis.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth** - the `카드 N: [제목] … / [본문] …` format
//!    the content prompt demands is the same format the parser recovers;
//!    the two must evolve together.
//!
//! 2. **Testability** - unit tests can inspect prompts directly without
//!    calling a real model, making format regressions easy to catch.

use crate::card::Card;
use crate::config::AiImageStyle;

/// Prompt asking for 5–8 cards of content on `topic`, one card per line in
/// the `카드 N: [제목] … / [본문] …` format the parser understands.
pub fn content_prompt(topic: &str) -> String {
    format!(
        "주제: \"{topic}\"\n\n\
         위 주제에 대해 5-8장 분량의 카드뉴스 콘텐츠를 생성해줘. \
         각 카드는 [제목]과 2-3줄의 [본문]으로 구성해줘. 다음 형식을 반드시 지켜줘:\n\
         카드 1: [제목] 제목 내용 / [본문] 본문 내용\n\
         카드 2: [제목] 제목 내용 / [본문] 본문 내용\n\
         ..."
    )
}

/// Prompt asking for three Korean and three English search keywords per
/// card, echoing the current deck's titles below a `--- 콘텐츠 ---` rule.
pub fn keyword_prompt(cards: &[Card]) -> String {
    let content: String = cards
        .iter()
        .map(|card| format!("카드 {}: [제목] {}", card.id, card.title))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "다음 카드뉴스 콘텐츠 각 카드에 어울리는 이미지 검색어를 한글과 영문으로 3개씩 추천해줘. \
         다음 형식을 반드시 지켜줘:\n\
         카드 1: [제목] {{카드1 제목}}\n\
         🇰🇷 한글 검색어: \"검색어1, 검색어2, 검색어3\"\n\
         🇺🇸 영문 검색어: \"keyword1, keyword2, keyword3\"\n\n\
         --- 콘텐츠 ---\n\
         {content}\n"
    )
}

/// Style prefix prepended to every synthesis prompt. Each ends with a
/// trailing space so the subject can be appended directly.
pub fn style_enhancer(style: AiImageStyle) -> &'static str {
    match style {
        AiImageStyle::Photorealistic => {
            "A photorealistic, cinematic, high-resolution 8k photograph of "
        }
        AiImageStyle::DigitalArt => "A vibrant, detailed, digital art illustration of ",
        AiImageStyle::Minimalist => "A minimalist, clean, vector style illustration of ",
    }
}

/// Subject line for synthesising one card's image.
pub fn synthesis_subject(card: &Card) -> String {
    format!(
        "a high-quality image for a social media card titled \"{}\". Keywords: {}.",
        card.title,
        card.english_keywords.as_deref().unwrap_or("")
    )
}

/// Full synthesis prompt: style prefix plus card subject.
pub fn synthesis_prompt(card: &Card, style: AiImageStyle) -> String {
    format!("{}{}", style_enhancer(style), synthesis_subject(card))
}
