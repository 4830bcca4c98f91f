//! Chatbot proxy
//!
//! Answers dragon-fruit questions through a Gemini-style language-model
//! upstream. Off-domain questions are redirected without an upstream call,
//! and every upstream failure degrades to a canned reply: the chat widget
//! always gets a `text` to render.

use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use crate::AppState;

/// Upstream request timeout.
const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(15);

/// Keywords that mark a question as in-domain for the assistant.
const DOMAIN_KEYWORDS: &[&str] = &[
    "dragon fruit",
    "dragonfruit",
    "pitaya",
    "pitahaya",
    "tropiscan",
    "grading",
    "grade",
    "harvest",
    "orchard",
    "farm",
    "fertilizer",
    "pruning",
    "disease",
    "fungus",
    "pest",
    "brix",
    "sweetness",
    "size",
    "quality",
    "storage",
    "shelf life",
];

const SYSTEM_PROMPT: &str = "You are an expert assistant for Tropiscan, a dragon fruit quality \
and farming app. You only answer questions that are directly related to dragon fruit, pitaya, \
or pitahaya. If a question is not about dragon fruit, politely say you can only help with \
dragon-fruit-related topics. Give clear, step-by-step practical advice for farmers, traders, \
and operators. Be concise but detailed enough to answer complex questions.";

/// Chat request body.
#[derive(Debug, Default, Deserialize)]
pub struct ChatRequest {
    /// The user's question.
    #[serde(default)]
    pub message: Option<String>,
    /// Optional requester context echoed into the prompt.
    #[serde(default)]
    pub user: Option<UserContext>,
}

/// Optional requester identity forwarded by the client.
#[derive(Debug, Deserialize)]
pub struct UserContext {
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Email address.
    #[serde(default)]
    pub email: Option<String>,
}

/// Chat response body. `text` is always present so the widget can render;
/// `message` carries a machine-readable note on non-200 answers.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    /// Machine-readable note (only on error responses).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Text for the chat widget.
    pub text: String,
}

fn reply(status: StatusCode, message: Option<&str>, text: &str) -> Response {
    (
        status,
        Json(ChatResponse {
            message: message.map(str::to_string),
            text: text.to_string(),
        }),
    )
        .into_response()
}

fn is_domain_question(message: &str) -> bool {
    let lower = message.to_lowercase();
    DOMAIN_KEYWORDS.iter().any(|keyword| lower.contains(keyword))
}

fn build_prompt(message: &str, user: Option<&UserContext>) -> String {
    let mut context_parts = Vec::new();
    if let Some(user) = user {
        if let Some(name) = user.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            context_parts.push(format!("User name: {name}"));
        }
        if let Some(email) = user
            .email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
        {
            context_parts.push(format!("User email: {email}"));
        }
    }

    let context = if context_parts.is_empty() {
        String::new()
    } else {
        format!("\n\nUser context: {}", context_parts.join(" / "))
    };

    format!("{SYSTEM_PROMPT}{context}\n\nUser question: {message}")
}

/// Extract the first candidate text from a generateContent response.
fn extract_candidate_text(body: &serde_json::Value) -> Option<String> {
    let parts = body
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;
    parts
        .iter()
        .find_map(|part| part.get("text").and_then(|t| t.as_str()))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// POST /api/chatbot
pub async fn chat(
    State(state): State<AppState>,
    payload: Option<Json<ChatRequest>>,
) -> Response {
    let request = payload.map(|Json(body)| body).unwrap_or_default();
    let message = request
        .message
        .as_deref()
        .map(str::trim)
        .unwrap_or_default()
        .to_string();

    if message.is_empty() {
        return reply(
            StatusCode::BAD_REQUEST,
            Some("Message is required"),
            "Please type a question about dragon fruit so I can help.",
        );
    }

    if !is_domain_question(&message) {
        debug!("Chatbot question outside the dragon fruit domain; not forwarding");
        return reply(
            StatusCode::OK,
            None,
            "I can only answer questions about dragon fruit quality, farming, diseases, \
             storage, and the Tropiscan scanning system. Try asking a dragon-fruit-related \
             question.",
        );
    }

    let Some(api_key) = state.chatbot.api_key.as_deref() else {
        return reply(
            StatusCode::OK,
            None,
            "The advanced Tropiscan assistant is not fully configured on the server yet. Ask \
             shorter questions about dragon fruit quality, grading, or farming, or contact the \
             admin to add a Gemini API key.",
        );
    };

    let prompt = build_prompt(&message, request.user.as_ref());
    let url = format!(
        "{}/v1beta/models/{}:generateContent",
        state.chatbot.api_url.trim_end_matches('/'),
        state.chatbot.model
    );

    let upstream = state
        .http_client
        .post(&url)
        .query(&[("key", api_key)])
        .timeout(UPSTREAM_TIMEOUT)
        .json(&json!({
            "contents": [
                {
                    "role": "user",
                    "parts": [{ "text": prompt }]
                }
            ]
        }))
        .send()
        .await;

    let body: serde_json::Value = match upstream {
        Ok(response) if response.status().is_success() => match response.json().await {
            Ok(body) => body,
            Err(err) => {
                warn!(error = %err, "Chatbot upstream returned a malformed body");
                return reply(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Some("Error from chatbot service"),
                    "Something went wrong while generating an answer. Please try again.",
                );
            }
        },
        Ok(response) => {
            warn!(status = %response.status(), "Chatbot upstream rejected the request");
            return reply(
                StatusCode::INTERNAL_SERVER_ERROR,
                Some("Error from chatbot service"),
                "Something went wrong while generating an answer. Please try again.",
            );
        }
        Err(err) => {
            warn!(error = %err, "Chatbot upstream request failed");
            return reply(
                StatusCode::INTERNAL_SERVER_ERROR,
                Some("Error from chatbot service"),
                "Something went wrong while generating an answer. Please try again.",
            );
        }
    };

    match extract_candidate_text(&body) {
        Some(text) => reply(StatusCode::OK, None, &text),
        None => reply(
            StatusCode::BAD_GATEWAY,
            Some("No response from language model"),
            "I could not generate a reply right now. Please try again in a moment.",
        ),
    }
}
