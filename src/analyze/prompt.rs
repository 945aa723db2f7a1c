// src/analyze/prompt.rs
use once_cell::sync::OnceCell;

use crate::analyze::bucket::TopicBucket;

pub const SYSTEM_PROMPT: &str = r#"You are a financial news analyst.
For every ticker you receive, read the provided articles and decide whether the stock is likely to move UP, DOWN, or stay NEUTRAL in the next one-week window. Base your call solely on the news supplied, taking NO OTHER DATA INTO ACCOUNT.
Return valid JSON in exactly this format:

{
  "TICKER": {"direction": "up|down|neutral", "confidence": 0.0-1.0, "reason": "..."},
  ...
}

Confidence should reflect the strength of the evidence. Keep each reason under 150 characters.
"#;

pub const BLOCK_SEPARATOR: &str = "\n\n###\n\n";
pub const NO_ARTICLES: &str = "(no relevant articles)";

/// Prompt-side cleanup of feed text: HTML decode, tag strip, whitespace collapse.
/// Stored rows are never rewritten with this.
pub fn normalize_text(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, " ").to_string();

    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();

    out.trim().to_string()
}

/// `Ticker: SYM` header plus one dated line per article, or the explicit no-articles line.
pub fn build_topic_block(bucket: &TopicBucket<'_>) -> String {
    let mut block = format!("Ticker: {}\n\nNews:\n", bucket.symbol);
    if bucket.is_empty() {
        block.push_str(NO_ARTICLES);
        return block;
    }

    let lines: Vec<String> = bucket
        .articles
        .iter()
        .map(|a| {
            format!(
                "[{}] {} - {}",
                a.published_at.format("%Y-%m-%d %H:%M"),
                normalize_text(&a.title),
                normalize_text(&a.summary)
            )
        })
        .collect();
    block.push_str(&lines.join("\n"));
    block
}

pub fn build_user_message(buckets: &[TopicBucket<'_>]) -> String {
    buckets
        .iter()
        .map(build_topic_block)
        .collect::<Vec<_>>()
        .join(BLOCK_SEPARATOR)
}
