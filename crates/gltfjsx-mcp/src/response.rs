//! Uniform tool responses

use rmcp::model::{CallToolResult, Content};

use crate::error::ToolError;

/// One block of response content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentBlock {
    Text(String),
}

impl ContentBlock {
    pub fn as_text(&self) -> &str {
        match self {
            ContentBlock::Text(text) => text,
        }
    }
}

/// Result of a tool call, success or failure.
///
/// Always holds at least one content block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResponse {
    content: Vec<ContentBlock>,
    is_error: bool,
}

impl ToolResponse {
    /// Successful response with a single text block
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::Text(text.into())],
            is_error: false,
        }
    }

    /// Failed response with a single text block
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::Text(message.into())],
            is_error: true,
        }
    }

    /// Append another text block
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.content.push(ContentBlock::Text(text.into()));
        self
    }

    pub fn content(&self) -> &[ContentBlock] {
        &self.content
    }

    pub fn is_error(&self) -> bool {
        self.is_error
    }

    /// Text of every block, in order
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.content.iter().map(ContentBlock::as_text)
    }
}

impl From<ToolError> for ToolResponse {
    fn from(error: ToolError) -> Self {
        Self::error(error.to_string())
    }
}

impl From<ToolResponse> for CallToolResult {
    fn from(response: ToolResponse) -> Self {
        let content = response
            .content
            .into_iter()
            .map(|block| match block {
                ContentBlock::Text(text) => Content::text(text),
            })
            .collect();
        if response.is_error {
            CallToolResult::error(content)
        } else {
            CallToolResult::success(content)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion() {
        let response = ToolResponse::from(ToolError::not_found("/tmp/x.glb"));
        assert!(response.is_error());
        assert_eq!(response.content().len(), 1);

        let result = CallToolResult::from(response);
        assert_eq!(result.is_error, Some(true));
        assert_eq!(result.content.len(), 1);
    }

    #[test]
    fn test_blocks_keep_order() {
        let response = ToolResponse::text("a").with_text("b").with_text("c");
        assert!(!response.is_error());
        assert_eq!(response.texts().collect::<Vec<_>>(), ["a", "b", "c"]);
        assert_eq!(CallToolResult::from(response).is_error, Some(false));
    }
}
