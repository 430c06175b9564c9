//! Conversion between catalog descriptors and `rmcp::model` types.
//!
//! The single place the crate's domain types meet the MCP SDK's wire
//! structs.

use gh_tools_core::catalog as c;
use rmcp::model as m;
use rmcp::model::AnnotateAble;
use std::sync::Arc;

pub(crate) fn tool_to_wire(spec: &c::ToolSpec) -> m::Tool {
    let schema = spec
        .input_schema
        .as_object()
        .cloned()
        .unwrap_or_default();

    m::Tool {
        name: spec.name.clone().into(),
        title: spec
            .title
            .clone()
            .unwrap_or_else(|| spec.name.clone())
            .into(),
        description: Some(spec.description.clone().into()),
        input_schema: Arc::new(schema),
        annotations: Some(annotations_to_wire(&spec.annotations)),
        output_schema: None,
        icons: None,
        meta: None,
    }
}

fn annotations_to_wire(annotations: &c::ToolAnnotations) -> m::ToolAnnotations {
    m::ToolAnnotations {
        title: annotations.title.clone(),
        read_only_hint: annotations.read_only_hint,
        destructive_hint: annotations.destructive_hint,
        idempotent_hint: annotations.idempotent_hint,
        open_world_hint: annotations.open_world_hint,
    }
}

pub(crate) fn tool_result_to_wire(result: c::ToolResult) -> m::CallToolResult {
    let contents: Vec<m::Content> = result
        .content
        .into_iter()
        .map(|block| match block {
            c::ToolContent::Text(text) => m::Content::text(text),
        })
        .collect();

    let mut wire = if result.is_error {
        m::CallToolResult::error(contents)
    } else {
        m::CallToolResult::success(contents)
    };
    wire.structured_content = result.structured;
    wire
}

pub(crate) fn prompt_to_wire(spec: &c::PromptSpec) -> m::Prompt {
    let arguments: Vec<m::PromptArgument> = spec
        .arguments
        .iter()
        .map(|arg| m::PromptArgument {
            name: arg.name.clone(),
            title: None,
            description: arg.description.clone(),
            required: Some(arg.required),
        })
        .collect();
    let arguments = if arguments.is_empty() {
        None
    } else {
        Some(arguments)
    };

    m::Prompt::new(spec.name.clone(), spec.description.clone(), arguments)
}

pub(crate) fn prompt_result_to_wire(result: c::PromptResult) -> m::GetPromptResult {
    m::GetPromptResult {
        description: result.description,
        messages: result
            .messages
            .into_iter()
            .map(|message| m::PromptMessage {
                role: match message.role {
                    c::PromptRole::User => m::PromptMessageRole::User,
                    c::PromptRole::Assistant => m::PromptMessageRole::Assistant,
                },
                content: m::PromptMessageContent::Text { text: message.text },
            })
            .collect(),
    }
}

pub(crate) fn resource_template_to_wire(spec: &c::ResourceTemplateSpec) -> m::ResourceTemplate {
    m::RawResourceTemplate {
        uri_template: spec.uri_template.clone(),
        name: spec.name.clone(),
        title: spec.title.clone(),
        description: spec.description.clone(),
        mime_type: spec.mime_type.clone(),
    }
    .no_annotation()
}

pub(crate) fn resource_result_to_wire(result: c::ResourceResult) -> m::ReadResourceResult {
    m::ReadResourceResult {
        contents: result
            .contents
            .into_iter()
            .map(|content| m::ResourceContents::text(content.text, content.uri))
            .collect(),
    }
}
