use serde::Deserialize;
use serde_json::Value;

/// What the oracle decided on a proactive tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub should_message: bool,
    pub rationale: Option<String>,
    pub message: String,
}

impl Decision {
    /// The message to send, if any.
    pub fn outgoing(&self) -> Option<&str> {
        let trimmed = self.message.trim();
        (self.should_message && !trimmed.is_empty()).then_some(trimmed)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecisionError {
    #[error("no JSON object with should_message found")]
    NotFound,
    #[error("decision JSON is invalid: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize)]
struct RawDecision {
    should_message: bool,
    #[serde(default, alias = "hypothesis")]
    rationale: Option<String>,
    #[serde(default)]
    message: Option<Value>,
}

/// Parse a decision from oracle text. A fenced ```json block wins; otherwise
/// the first balanced `{...}` that mentions `should_message` is used.
pub fn parse_decision(text: &str) -> Result<Decision, DecisionError> {
    let candidate = fenced_json(text)
        .filter(|block| block.contains("should_message"))
        .or_else(|| first_object_with(text, "should_message"))
        .ok_or(DecisionError::NotFound)?;

    let raw: RawDecision =
        serde_json::from_str(candidate).map_err(|e| DecisionError::Invalid(e.to_string()))?;

    let message = match raw.message {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s,
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.as_str()),
                other => Err(DecisionError::Invalid(format!(
                    "message array holds a non-string: {other}"
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?
            .join("\n"),
        Some(other) => {
            return Err(DecisionError::Invalid(format!(
                "message must be a string or array, got {other}"
            )));
        }
    };

    Ok(Decision {
        should_message: raw.should_message,
        rationale: raw.rationale.filter(|r| !r.trim().is_empty()),
        message,
    })
}

fn fenced_json(text: &str) -> Option<&str> {
    let start = text.find("```json")? + "```json".len();
    let rest = &text[start..];
    let end = rest.find("```")?;
    Some(rest[..end].trim())
}

/// First brace-balanced object containing `needle`, honoring JSON strings.
fn first_object_with<'a>(text: &'a str, needle: &str) -> Option<&'a str> {
    let mut search_from = 0;
    while let Some(rel) = text[search_from..].find('{') {
        let start = search_from + rel;
        if let Some(end) = balanced_end(&text[start..]) {
            let candidate = &text[start..start + end];
            if candidate.contains(needle) {
                return Some(candidate);
            }
        }
        search_from = start + 1;
    }
    None
}

/// Byte length of the balanced object starting at `text[0] == '{'`.
fn balanced_end(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}
