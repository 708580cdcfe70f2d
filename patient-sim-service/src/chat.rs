use thiserror::Error;
use tracing::{debug, info};

use crate::{
    llm::{ChatTurn, ModelClient, ModelError, Role},
    models::{Message, PatientType, Sender},
    persona::system_instruction,
};

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("conversation has no messages")]
    EmptyConversation,

    #[error(transparent)]
    Upstream(#[from] ModelError),
}

/// History the model is seeded with: everything between the opening patient
/// line and the nurse's latest message. Empty when fewer than two messages
/// would remain.
pub fn build_chat_history(messages: &[Message]) -> Vec<ChatTurn> {
    if messages.len() <= 2 {
        return Vec::new();
    }

    messages[1..messages.len() - 1]
        .iter()
        .map(|msg| {
            let role = match msg.sender {
                Sender::User => Role::User,
                Sender::Ai => Role::Model,
            };
            ChatTurn::new(role, msg.text.clone())
        })
        .collect()
}

/// Sends the nurse's latest message to the simulated patient and returns the
/// patient's reply.
pub async fn continue_conversation(
    model: &dyn ModelClient,
    messages: &[Message],
    patient_type: PatientType,
) -> Result<String, ChatError> {
    let latest = messages.last().ok_or(ChatError::EmptyConversation)?;
    let history = build_chat_history(messages);

    info!(
        message_count = messages.len(),
        history_len = history.len(),
        patient_type = ?patient_type,
        "Continuing conversation"
    );
    debug!(latest = %latest.text, "Latest nurse message");

    let reply = model
        .chat(history, system_instruction(patient_type), &latest.text)
        .await?;

    debug!(reply = %reply, "Patient reply");
    Ok(reply)
}
