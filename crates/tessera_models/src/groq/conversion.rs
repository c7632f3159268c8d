//! Conversion between Tessera request types and the wire format.

use super::dto::{
    ChatContent, ChatMessage, ChatRequest, ContentPart, ImageUrl, WireResponseFormat,
};
use tessera_core::{GenerateRequest, Input, MediaSource, ResponseFormat, Role};

fn role_name(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
    }
}

/// Build the wire request from a generic generation request.
///
/// Text-only messages serialize as bare strings; messages carrying an
/// image serialize as typed content parts with `image_url` entries.
pub fn to_chat_request(req: &GenerateRequest, default_model: &str) -> ChatRequest {
    let messages = req
        .messages
        .iter()
        .map(|message| {
            let multimodal = message
                .content
                .iter()
                .any(|input| matches!(input, Input::Image { .. }));

            let content = if multimodal {
                let parts = message
                    .content
                    .iter()
                    .map(|input| match input {
                        Input::Text(text) => ContentPart::Text { text: text.clone() },
                        Input::Image { source, .. } => ContentPart::ImageUrl {
                            image_url: ImageUrl {
                                url: media_url(source),
                            },
                        },
                    })
                    .collect();
                ChatContent::Parts(parts)
            } else {
                let text = message
                    .content
                    .iter()
                    .filter_map(|input| match input {
                        Input::Text(text) => Some(text.as_str()),
                        Input::Image { .. } => None,
                    })
                    .collect::<Vec<_>>()
                    .join("\n");
                ChatContent::Text(text)
            };

            ChatMessage {
                role: role_name(message.role).to_string(),
                content,
            }
        })
        .collect();

    let response_format = match req.response_format {
        ResponseFormat::Text => None,
        ResponseFormat::JsonObject => Some(WireResponseFormat {
            kind: "json_object".to_string(),
        }),
    };

    ChatRequest {
        model: req.model.clone().unwrap_or_else(|| default_model.to_string()),
        messages,
        temperature: req.temperature,
        max_tokens: req.max_tokens,
        response_format,
    }
}

fn media_url(source: &MediaSource) -> String {
    match source {
        MediaSource::Url(url) => url.clone(),
        // Data URI form accepted by OpenAI-compatible endpoints
        MediaSource::Base64(data) => format!("data:image/jpeg;base64,{}", data),
    }
}
