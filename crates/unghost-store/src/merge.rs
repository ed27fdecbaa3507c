//! Applying one payload to one message.
//!
//! Every merge checks its preconditions before touching the message, so a
//! rejected payload leaves the message exactly as it was.

use unghost_types::json::parse_partial_value;
use unghost_types::{Agent, EventPayload, Message, ToolCall, ToolCallChunk};

use crate::error::{Result, StoreError};

pub(crate) fn merge_payload(message: &mut Message, payload: EventPayload) -> Result<()> {
    let kind = payload.kind();
    if !message.is_streaming && !accepted_after_finalization(&payload) {
        return Err(StoreError::AlreadyFinalized {
            message_id: message.id.clone(),
            kind,
        });
    }

    match payload {
        EventPayload::ContentDelta { text } => {
            if !text.is_empty() {
                message.content.push_str(&text);
                message.content_chunks.push(text);
            }
        }
        EventPayload::ContentReplace { text } => {
            message.content_chunks = vec![text.clone()];
            message.content = text;
        }
        EventPayload::ReasoningDelta { text } => {
            if !text.is_empty() {
                message
                    .reasoning_content
                    .get_or_insert_with(String::new)
                    .push_str(&text);
                message.reasoning_content_chunks.push(text);
            }
        }
        EventPayload::Options { options } => {
            message.options = options;
        }
        EventPayload::Resources { resources } => {
            message.resources = resources;
        }
        EventPayload::ToolCalls { calls } => {
            message.tool_calls = calls
                .into_iter()
                .map(|call| ToolCall::new(call.id, call.name, call.args))
                .collect();
        }
        EventPayload::ToolCallChunks { chunks } => {
            merge_tool_call_chunks(message, chunks)?;
        }
        EventPayload::ToolCallResult {
            tool_call_id,
            content,
        } => {
            let call = message
                .tool_calls
                .iter_mut()
                .find(|call| call.id == tool_call_id)
                .ok_or(StoreError::ToolCallNotFound(tool_call_id))?;
            call.result = Some(content);
        }
        EventPayload::PodcastUpdate { podcast } => {
            if !message.is_agent(&Agent::Podcast) {
                return Err(StoreError::NotAPodcast(message.id.clone()));
            }
            let content = serde_json::to_string(&podcast).unwrap_or_default();
            message.content_chunks = vec![content.clone()];
            message.content = content;
            if podcast.is_settled() {
                finalize(message, None);
            }
        }
        EventPayload::StreamEnd { finish_reason } => {
            if message.is_streaming {
                finalize(message, finish_reason);
            }
        }
    }

    Ok(())
}

/// Tool results arrive after the calling message has finished, and users may
/// rewrite a finished report.
fn accepted_after_finalization(payload: &EventPayload) -> bool {
    matches!(
        payload,
        EventPayload::StreamEnd { .. }
            | EventPayload::ToolCallResult { .. }
            | EventPayload::ContentReplace { .. }
    )
}

fn merge_tool_call_chunks(message: &mut Message, chunks: Vec<ToolCallChunk>) -> Result<()> {
    let mut calls = message.tool_calls.clone();

    for chunk in chunks {
        match chunk.id.filter(|id| !id.is_empty()) {
            Some(id) => match calls.iter_mut().find(|call| call.id == id) {
                Some(call) => call.args_chunks = vec![chunk.args],
                None => {
                    let name = chunk.name.ok_or(StoreError::ToolCallNotFound(id.clone()))?;
                    let mut call = ToolCall::new(id, name, serde_json::Value::Null);
                    call.args_chunks.push(chunk.args);
                    calls.push(call);
                }
            },
            None => {
                let position = continuation_target(&calls, chunk.index)
                    .ok_or_else(|| StoreError::OrphanToolCallChunk(message.id.clone()))?;
                calls[position].args_chunks.push(chunk.args);
            }
        }
    }

    message.tool_calls = calls;
    Ok(())
}

/// Call continued by a chunk without an id: the one at `index` when given,
/// else the latest call whose arguments are already streaming, else the last.
fn continuation_target(calls: &[ToolCall], index: Option<u32>) -> Option<usize> {
    if let Some(position) = index.map(|i| i as usize).filter(|&i| i < calls.len()) {
        return Some(position);
    }
    calls
        .iter()
        .rposition(|call| !call.args_chunks.is_empty())
        .or_else(|| calls.len().checked_sub(1))
}

pub(crate) fn finalize(message: &mut Message, finish_reason: Option<unghost_types::FinishReason>) {
    message.is_streaming = false;
    if finish_reason.is_some() {
        message.finish_reason = finish_reason;
    }

    for call in &mut message.tool_calls {
        if call.args_chunks.is_empty() {
            continue;
        }
        let raw = call.args_chunks.concat();
        call.args = match parse_partial_value(&raw) {
            Some(partial) => {
                if !partial.complete {
                    tracing::warn!(tool_call_id = %call.id, "tool call arguments were truncated");
                }
                partial.value
            }
            None => serde_json::Value::String(raw),
        };
        call.args_chunks.clear();
    }
}
