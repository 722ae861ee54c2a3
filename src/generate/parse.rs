//! Turns raw model text into structured idea content.
//!
//! Models wrap JSON in prose, markup or typographic quotes. We strip tags,
//! normalize quotes and flatten newlines, then take the outermost `{...}` and
//! parse it against the fixed content schema. Entities are decoded per field
//! after parsing; decoding `&quot;` earlier would break the JSON.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::IdeaContent;

static RE_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("tag regex"));

/// Cleanup applied before JSON extraction.
pub fn clean_response(raw: &str) -> String {
    RE_TAGS
        .replace_all(raw, "")
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'")
        .replace(['\r', '\n'], " ")
        .trim()
        .to_string()
}

fn decode(s: &mut String) {
    if s.contains('&') {
        *s = html_escape::decode_html_entities(s.as_str()).into_owned();
    }
}

fn decode_fields(c: &mut IdeaContent) {
    for s in [
        &mut c.title,
        &mut c.description,
        &mut c.what_it_is,
        &mut c.why_it_matters,
        &mut c.build_difficulty_reason,
        &mut c.tweetable_summary,
    ] {
        decode(s);
    }
    for list in [
        &mut c.tools_youd_use,
        &mut c.mvp_feature_set,
        &mut c.monetization_ideas,
        &mut c.variations,
    ] {
        list.iter_mut().for_each(decode);
    }
}

/// Slice from the first `{` to the last `}`.
pub fn extract_json_object(s: &str) -> Option<&str> {
    let start = s.find('{')?;
    let end = s.rfind('}')?;
    (start < end).then(|| &s[start..=end])
}

/// Parse model output into content. The error string says what was wrong.
pub fn parse_idea(raw: &str) -> Result<IdeaContent, String> {
    let cleaned = clean_response(raw);
    let json = extract_json_object(&cleaned).ok_or_else(|| "no JSON object in response".to_string())?;
    let mut content: IdeaContent =
        serde_json::from_str(json).map_err(|e| format!("invalid idea JSON: {e}"))?;

    if !(1..=5).contains(&content.build_difficulty) {
        return Err(format!(
            "buildDifficulty {} outside 1..=5",
            content.build_difficulty
        ));
    }
    if content.title.trim().is_empty() {
        return Err("empty title".to_string());
    }
    decode_fields(&mut content);
    Ok(content)
}
