use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One entry in the chat-completions `messages` array.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: Vec<ContentPart>,
}

impl ChatMessage {
    pub fn user(content: Vec<ContentPart>) -> Self {
        Self {
            role: Role::User,
            content,
        }
    }
}

/// Text or inline-image content part, OpenAI-compatible wire shape.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrlPart },
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageUrlPart {
    pub url: String,
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Accepts data URLs and http(s) URLs; bare base64 is wrapped as JPEG.
    pub fn image(image_data: impl Into<String>) -> Self {
        let data = image_data.into();
        let url = if data.starts_with("data:") || data.starts_with("http") {
            data
        } else {
            format!("data:image/jpeg;base64,{data}")
        };
        Self::ImageUrl {
            image_url: ImageUrlPart { url },
        }
    }
}

/// Sampling parameters for one call. Fixed per call site, never retried.
#[derive(Debug, Clone)]
pub struct ChatOptions {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Ask the provider for native structured output (`json_object` mode).
    pub json_mode: bool,
}

impl ChatOptions {
    pub fn json(model: impl Into<String>, max_tokens: u32, temperature: f32) -> Self {
        Self {
            model: model.into(),
            max_tokens,
            temperature,
            json_mode: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_base64_is_wrapped_as_jpeg_data_url() {
        let part = ContentPart::image("/9j/4AAQ");
        match part {
            ContentPart::ImageUrl { image_url } => {
                assert!(image_url.url.starts_with("data:image/jpeg;base64,"));
            }
            _ => panic!("expected image part"),
        }
    }

    #[test]
    fn urls_pass_through_unchanged() {
        for input in ["data:image/png;base64,AAAA", "https://i.redd.it/x.jpg"] {
            match ContentPart::image(input) {
                ContentPart::ImageUrl { image_url } => assert_eq!(image_url.url, input),
                _ => panic!("expected image part"),
            }
        }
    }

    #[test]
    fn message_serializes_to_openai_shape() {
        let msg = ChatMessage::user(vec![
            ContentPart::text("describe this"),
            ContentPart::image("https://i.redd.it/x.jpg"),
        ]);
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["content"][0]["type"], "text");
        assert_eq!(json["content"][1]["type"], "image_url");
        assert_eq!(json["content"][1]["image_url"]["url"], "https://i.redd.it/x.jpg");
    }
}
