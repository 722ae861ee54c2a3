use crate::aggregate::AggregatedTrend;

/// Prompt asking the model for exactly one idea in the fixed JSON shape.
pub fn build_prompt(trend: &AggregatedTrend) -> String {
    let sources = trend
        .signals
        .iter()
        .filter(|(_, v)| !v.is_empty())
        .map(|(k, v)| format!("{} ({} signals)", k.as_str(), v.len()))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"You are powering a platform that gives users one high-signal, highly buildable app idea per day for indie hackers, creators and solo builders who ship with AI assistants and low-code platforms.

Based on this trending signal data:
- Keywords: {keywords}
- Category: {category}
- Strength: {strength:.2}
- Suggested app types: {uses}
- Signal sources: {sources}

Generate ONE specific, buildable app idea that is concrete and shippable, slightly clever or unexpected, useful or monetizable, and backed by the trend data above.

Respond with ONLY valid JSON, no other text, in exactly this shape:

{{
  "title": "Catchy, tweetable title",
  "description": "1-2 sentence description focusing on value",
  "whatItIs": "What the app does in 1-2 clear sentences.",
  "whyItMatters": "The problem, trend or use case this taps into.",
  "toolsYoudUse": ["Tool 1", "Tool 2"],
  "mvpFeatureSet": ["Feature 1", "Feature 2", "Feature 3"],
  "monetizationIdeas": ["Revenue idea 1", "Revenue idea 2"],
  "buildDifficulty": 3,
  "buildDifficultyReason": "Why this difficulty (integer 1-5)",
  "variations": ["Variation 1", "Variation 2"],
  "tweetableSummary": "One bold takeaway in tweet style"
}}"#,
        keywords = trend.keywords.join(", "),
        category = trend.category,
        strength = trend.strength,
        uses = trend.suggested_uses.join(", "),
        sources = if sources.is_empty() { "none".to_string() } else { sources },
    )
}
