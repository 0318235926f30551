//! Font resolution for export rendering.
//!
//! Card decks are Korean-first, so discovery prefers the common Korean
//! sans families before falling back to whatever generic sans-serif the
//! host exposes. An explicit `font_path` in the config bypasses discovery
//! entirely, which is also the escape hatch for headless CI images that
//! ship no fonts at all.

use crate::config::DeckConfig;
use crate::error::DeckError;
use ab_glyph::FontVec;
use tracing::debug;

/// Families tried in order when no font file is configured.
const PREFERRED_FAMILIES: [&str; 4] = [
    "Noto Sans KR",
    "Noto Sans CJK KR",
    "NanumGothic",
    "Malgun Gothic",
];

/// Resolve the face used for all card text.
pub fn load_render_font(config: &DeckConfig) -> Result<FontVec, DeckError> {
    if let Some(path) = &config.font_path {
        let data = std::fs::read(path).map_err(|e| DeckError::FontUnavailable {
            detail: format!("cannot read font file {}: {e}", path.display()),
        })?;
        return FontVec::try_from_vec(data).map_err(|_| DeckError::FontUnavailable {
            detail: format!("{} is not a parsable TTF/OTF font", path.display()),
        });
    }
    discover_system_font()
}

/// Query the system font database for a usable sans face.
pub(crate) fn discover_system_font() -> Result<FontVec, DeckError> {
    let mut db = fontdb::Database::new();
    db.load_system_fonts();

    let mut families: Vec<fontdb::Family> =
        PREFERRED_FAMILIES.into_iter().map(fontdb::Family::Name).collect();
    families.push(fontdb::Family::SansSerif);

    let query = fontdb::Query {
        families: &families,
        weight: fontdb::Weight::NORMAL,
        stretch: fontdb::Stretch::Normal,
        style: fontdb::Style::Normal,
    };

    let id = db.query(&query).ok_or_else(|| DeckError::FontUnavailable {
        detail: "no sans-serif face found in the system font database".into(),
    })?;
    let face = db.face(id).ok_or_else(|| DeckError::FontUnavailable {
        detail: "font database returned a face it cannot describe".into(),
    })?;
    debug!(family = ?face.families.first(), source = ?face.post_script_name, "resolved render font");

    let index = face.index;
    let data = match &face.source {
        fontdb::Source::Binary(data) => data.as_ref().as_ref().to_vec(),
        fontdb::Source::File(path) => {
            std::fs::read(path).map_err(|e| DeckError::FontUnavailable {
                detail: format!("cannot read system font {}: {e}", path.display()),
            })?
        }
        _ => {
            return Err(DeckError::FontUnavailable {
                detail: "system font has an unsupported source".into(),
            })
        }
    };

    FontVec::try_from_vec_and_index(data, index).map_err(|_| DeckError::FontUnavailable {
        detail: "system font data failed to parse".into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DeckConfig;

    #[test]
    fn explicit_path_errors_cleanly_when_missing() {
        let config = DeckConfig::builder()
            .font_path("/definitely/not/here.ttf")
            .build()
            .unwrap();
        let err = load_render_font(&config).unwrap_err();
        assert!(matches!(err, DeckError::FontUnavailable { .. }));
    }

    #[test]
    fn explicit_path_rejects_non_font_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.ttf");
        std::fs::write(&path, b"not a font at all").unwrap();
        let config = DeckConfig::builder().font_path(&path).build().unwrap();
        let err = load_render_font(&config).unwrap_err();
        assert!(matches!(err, DeckError::FontUnavailable { .. }));
    }

    #[test]
    fn discovery_yields_a_parsable_face_when_fonts_exist() {
        // Headless images may genuinely have no fonts; that case is the
        // error path asserted above, so only the Ok shape is checked here.
        if let Ok(font) = discover_system_font() {
            use ab_glyph::Font;
            assert!(font.glyph_count() > 0);
        }
    }
}
