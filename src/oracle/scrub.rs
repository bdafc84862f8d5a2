use std::borrow::Cow;

const MAX_API_ERROR_CHARS: usize = 200;
const REDACTED: &str = "[REDACTED]";

const PREFIXES: [&str; 6] = ["sk-", "sk-ant-", "ghp_", "github_pat_", "eyJ", "bot"];

const MARKERS: [&str; 8] = [
    "Authorization: Bearer ",
    "authorization: bearer ",
    "x-api-key: ",
    "api_key=",
    "access_token=",
    "\"api_key\":\"",
    "\"access_token\":\"",
    "\"token\":\"",
];

fn is_secret_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':' | '+' | '/' | '=')
}

fn token_end(input: &str, from: usize) -> usize {
    input[from..]
        .char_indices()
        .find(|&(_, c)| !is_secret_char(c))
        .map_or(input.len(), |(i, _)| from + i)
}

/// Redact the token following each occurrence of `marker`. With
/// `min_len`, short runs (ordinary words such as "bottle") are left alone.
fn scrub_after(scrubbed: &mut String, marker: &str, keep_marker: bool, min_len: usize) {
    let mut search_from = 0;
    while let Some(rel) = scrubbed[search_from..].find(marker) {
        let start = search_from + rel;
        let content_start = start + marker.len();
        let end = token_end(scrubbed, content_start);
        if end - content_start < min_len.max(1) {
            search_from = content_start;
            continue;
        }
        let from = if keep_marker { content_start } else { start };
        scrubbed.replace_range(from..end, REDACTED);
        search_from = from + REDACTED.len();
    }
}

/// Redact key-shaped tokens from text that is about to be logged or
/// surfaced. Telegram bot tokens ride inside URLs as `bot<id>:<secret>`.
pub fn scrub_secret_patterns(input: &str) -> Cow<'_, str> {
    let hit = PREFIXES.iter().chain(MARKERS.iter()).any(|p| input.contains(p));
    if !hit {
        return Cow::Borrowed(input);
    }

    let mut scrubbed = input.to_string();
    for marker in MARKERS {
        scrub_after(&mut scrubbed, marker, true, 1);
    }
    for prefix in PREFIXES {
        scrub_after(&mut scrubbed, prefix, false, 16);
    }
    Cow::Owned(scrubbed)
}

/// Scrub and truncate a provider error body.
pub fn sanitize_api_error(input: &str) -> String {
    let scrubbed = scrub_secret_patterns(input);
    if scrubbed.chars().count() <= MAX_API_ERROR_CHARS {
        return scrubbed.into_owned();
    }
    let cut: String = scrubbed.chars().take(MAX_API_ERROR_CHARS).collect();
    format!("{cut}...")
}

/// Build a sanitized provider error from a failed HTTP response.
pub async fn api_error(provider: &str, response: reqwest::Response) -> anyhow::Error {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<failed to read provider error body>".to_string());
    anyhow::anyhow!("{provider} API error ({status}): {}", sanitize_api_error(&body))
}
