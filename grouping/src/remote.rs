use std::time::Duration;

use atlas_layout::Grouping;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::RemoteConfig;
use crate::error::GroupingError;
use crate::grouper::{Grouper, GroupingRequest, build_grouping};

const SYSTEM_PROMPT: &str = "You sort short documents into topical groups. \
Reply with a single JSON object of the form \
{\"groups\":[{\"name\":\"<short topic name>\",\"items\":[\"<id>\", ...]}]}. \
Every id must appear in exactly one group. Use only the ids you are given.";

/// Primary grouper backed by an OpenAI-compatible chat completions API.
pub struct RemoteGrouper {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl RemoteGrouper {
    pub fn new(api_key: &str, cfg: &RemoteConfig) -> Result<Self, GroupingError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs.max(1)))
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.to_string(),
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            model: cfg.model.clone(),
        })
    }

    async fn call_api(&self, req: &GroupingRequest) -> Result<String, GroupingError> {
        let url = format!("{}/chat/completions", self.base_url);
        let user = user_prompt(req)?;
        let body = ChatRequest {
            model: &self.model,
            messages: [
                Message {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                Message {
                    role: "user",
                    content: &user,
                },
            ],
            temperature: 0.0,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(GroupingError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let data: ChatResponse = resp
            .json()
            .await
            .map_err(|e| GroupingError::Malformed(e.to_string()))?;
        data.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| GroupingError::Malformed("no choices in reply".to_string()))
    }
}

#[async_trait::async_trait]
impl Grouper for RemoteGrouper {
    async fn group(&self, req: &GroupingRequest) -> Result<Grouping, GroupingError> {
        if req.items.is_empty() {
            return Err(GroupingError::EmptyInput);
        }
        let content = self.call_api(req).await?;
        let grouping = parse_reply(req, &content)?;
        debug!(
            model = %self.model,
            groups = grouping.group_count(),
            "grouping: remote reply accepted"
        );
        Ok(grouping)
    }

    fn name(&self) -> &str {
        "remote"
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 2],
    temperature: f32,
    response_format: ResponseFormat<'a>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: String,
}

#[derive(Serialize)]
struct PromptItem<'a> {
    id: &'a str,
    text: &'a str,
}

#[derive(Deserialize)]
struct GroupsReply {
    groups: Vec<ReplyGroup>,
}

#[derive(Deserialize)]
struct ReplyGroup {
    #[serde(default)]
    name: String,
    items: Vec<String>,
}

fn user_prompt(req: &GroupingRequest) -> Result<String, GroupingError> {
    let listing: Vec<PromptItem<'_>> = req
        .items
        .iter()
        .map(|i| PromptItem {
            id: &i.id,
            text: &i.text,
        })
        .collect();
    let listing = serde_json::to_string(&listing)
        .map_err(|e| GroupingError::Malformed(format!("encode prompt: {e}")))?;
    Ok(format!(
        "Split these {} documents into about {} groups.\n{listing}",
        req.items.len(),
        req.target_groups.max(1),
    ))
}

/// Parses the model's message content. Tolerates a Markdown code fence
/// around the JSON object.
fn parse_reply(req: &GroupingRequest, content: &str) -> Result<Grouping, GroupingError> {
    let json = strip_fence(content);
    let reply: GroupsReply =
        serde_json::from_str(json).map_err(|e| GroupingError::Malformed(e.to_string()))?;
    build_grouping(req, reply.groups.into_iter().map(|g| (g.name, g.items)))
}

fn strip_fence(content: &str) -> &str {
    let s = content.trim();
    let Some(rest) = s.strip_prefix("```") else {
        return s;
    };
    // Drop an optional language tag on the opening line.
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}
