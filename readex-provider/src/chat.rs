use crate::error::ProviderError;
use crate::provider::{ContentProvider, Passages, Profiles, SelectionContext};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

#[derive(Debug, Clone)]
pub struct ChatSettings {
    /// Base URL of an OpenAI-compatible API, e.g. `https://api.openai.com/v1`
    pub endpoint: String,
    pub model: String,
    pub api_key: String,
    /// Environment variable the key was read from, named in errors
    pub api_key_env: String,
    pub timeout: Duration,
    pub temperature: Option<f32>,
    pub system_prompt: String,
    /// Source text rewritten in each generated round
    pub round_sources: Vec<String>,
}

/// Content provider backed by a chat-completions endpoint
pub struct ChatProvider {
    client: reqwest::blocking::Client,
    settings: ChatSettings,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    response_format: ResponseFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ProfilesReply {
    profile: String,
    opposite_profile: String,
}

#[derive(Deserialize)]
struct PassagesReply {
    passages: Vec<String>,
}

impl ChatProvider {
    pub fn new(settings: ChatSettings) -> Result<Self, ProviderError> {
        if settings.api_key.trim().is_empty() {
            return Err(ProviderError::MissingApiKey(settings.api_key_env.clone()));
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(settings.timeout)
            .build()?;
        Ok(Self { client, settings })
    }

    fn complete(&self, user: &str) -> Result<String, ProviderError> {
        let url = format!(
            "{}/chat/completions",
            self.settings.endpoint.trim_end_matches('/')
        );
        let body = ChatRequest {
            model: &self.settings.model,
            messages: vec![
                Message {
                    role: "system",
                    content: &self.settings.system_prompt,
                },
                Message {
                    role: "user",
                    content: user,
                },
            ],
            response_format: ResponseFormat {
                kind: "json_object",
            },
            temperature: self.settings.temperature,
        };

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.settings.api_key)
            .json(&body)
            .send()?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let reply: ChatResponse = resp.json()?;
        reply
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| ProviderError::Malformed("response has no message content".into()))
    }
}

impl ContentProvider for ChatProvider {
    #[instrument(skip_all, fields(selections = selections.len()))]
    fn profiles(&self, selections: &[SelectionContext]) -> Result<Profiles, ProviderError> {
        let content = self.complete(&profile_prompt(selections))?;
        debug!(bytes = content.len(), "profile reply received");
        parse_profiles(&content)
    }

    #[instrument(skip(self, profile))]
    fn passages(&self, profile: &str, round: usize) -> Result<Passages, ProviderError> {
        let source = self
            .settings
            .round_sources
            .get(round)
            .ok_or(ProviderError::UnknownRound(round))?;
        let content = self.complete(&passages_prompt(profile, source))?;
        debug!(bytes = content.len(), "passages reply received");
        parse_passages(&content)
    }
}

fn profile_prompt(selections: &[SelectionContext]) -> String {
    let mut out = String::from(
        "A student chose between pairs of paragraphs. For each pair, the chosen and the \
         rejected paragraph follow.\n\n",
    );
    for (i, s) in selections.iter().enumerate() {
        out.push_str(&format!(
            "Pair {} ({})\nChosen: {}\nRejected: {}\n\n",
            i + 1,
            s.title,
            s.chosen,
            s.rejected
        ));
    }
    out.push_str(
        "Describe the student's learning preferences in one short paragraph, and a second \
         paragraph describing the opposite preferences. Reply as JSON: \
         {\"profile\": string, \"opposite_profile\": string}",
    );
    out
}

fn passages_prompt(profile: &str, source: &str) -> String {
    format!(
        "Learner profile:\n{profile}\n\nSource text:\n{source}\n\n\
         Rewrite the source text twice for this learner, as two different paragraphs. \
         Reply as JSON: {{\"passages\": [string, string]}}"
    )
}

pub(crate) fn parse_profiles(content: &str) -> Result<Profiles, ProviderError> {
    let reply: ProfilesReply = serde_json::from_str(content)
        .map_err(|e| ProviderError::Malformed(format!("profile reply: {e}")))?;
    if reply.profile.trim().is_empty() || reply.opposite_profile.trim().is_empty() {
        return Err(ProviderError::Malformed("empty profile text".into()));
    }
    Ok(Profiles {
        actual: reply.profile,
        opposite: reply.opposite_profile,
    })
}

pub(crate) fn parse_passages(content: &str) -> Result<Passages, ProviderError> {
    let reply: PassagesReply = serde_json::from_str(content)
        .map_err(|e| ProviderError::Malformed(format!("passages reply: {e}")))?;
    let count = reply.passages.len();
    let [first, second]: [String; 2] = reply
        .passages
        .try_into()
        .map_err(|_| ProviderError::Malformed(format!("expected 2 passages, got {count}")))?;
    if first.trim().is_empty() || second.trim().is_empty() {
        return Err(ProviderError::Malformed("empty passage".into()));
    }
    Ok([first, second])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_two_passages() {
        let got = parse_passages(r#"{"passages": ["first", "second"]}"#).unwrap();
        assert_eq!(got, ["first".to_string(), "second".to_string()]);
    }

    #[test]
    fn rejects_wrong_passage_count() {
        let err = parse_passages(r#"{"passages": ["only one"]}"#).unwrap_err();
        assert!(matches!(err, ProviderError::Malformed(msg) if msg.contains("got 1")));
    }

    #[test]
    fn rejects_blank_passage() {
        assert!(parse_passages(r#"{"passages": ["text", "  "]}"#).is_err());
    }

    #[test]
    fn rejects_non_json() {
        assert!(matches!(
            parse_passages("Sure! Here are two passages"),
            Err(ProviderError::Malformed(_))
        ));
    }

    #[test]
    fn parses_profiles() {
        let got =
            parse_profiles(r#"{"profile": "likes stories", "opposite_profile": "likes lists"}"#)
                .unwrap();
        assert_eq!(got.actual, "likes stories");
        assert_eq!(got.opposite, "likes lists");
    }

    #[test]
    fn profile_prompt_lists_every_pair() {
        let prompt = profile_prompt(&[
            SelectionContext {
                title: "Water Cycle".into(),
                chosen: "story".into(),
                rejected: "facts".into(),
            },
            SelectionContext {
                title: "Photosynthesis".into(),
                chosen: "diagram".into(),
                rejected: "poem".into(),
            },
        ]);
        assert!(prompt.contains("Pair 1 (Water Cycle)"));
        assert!(prompt.contains("Pair 2 (Photosynthesis)"));
    }

    #[test]
    fn blank_key_is_rejected() {
        let settings = ChatSettings {
            endpoint: "http://localhost".into(),
            model: "m".into(),
            api_key: " ".into(),
            api_key_env: "STUDY_KEY".into(),
            timeout: Duration::from_secs(1),
            temperature: None,
            system_prompt: String::new(),
            round_sources: Vec::new(),
        };
        assert!(matches!(
            ChatProvider::new(settings),
            Err(ProviderError::MissingApiKey(name)) if name == "STUDY_KEY"
        ));
    }
}
