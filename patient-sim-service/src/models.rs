use serde::{Deserialize, Serialize};

/// Who wrote a transcript entry. Anything that is not the nurse is treated as
/// the simulated patient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    #[serde(other)]
    Ai,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub sender: Sender,
    pub text: String,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
        }
    }

    pub fn ai(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Ai,
            text: text.into(),
        }
    }
}

/// Selects the simulated patient's persona.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatientType {
    /// Newly diagnosed and anxious
    New,
    /// Repeatedly readmitted, resists guidance
    Compliance,
    #[default]
    #[serde(other)]
    General,
}

/// Body shared by `/api/chat` and `/api/evaluate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequest {
    pub messages: Vec<Message>,
    #[serde(default)]
    pub patient_type: Option<PatientType>,
}

impl SessionRequest {
    pub fn patient_type(&self) -> PatientType {
        self.patient_type.unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub score: u8,
    pub feedback: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_sender_is_patient() {
        let msg: Message = serde_json::from_value(json!({"sender": "bot", "text": "hi"})).unwrap();
        assert_eq!(msg.sender, Sender::Ai);

        let msg: Message = serde_json::from_value(json!({"sender": "user", "text": "hi"})).unwrap();
        assert_eq!(msg.sender, Sender::User);
    }

    #[test]
    fn test_patient_type_normalization() {
        let cases = [
            (json!({"messages": [], "patientType": "new"}), PatientType::New),
            (
                json!({"messages": [], "patientType": "compliance"}),
                PatientType::Compliance,
            ),
            (
                json!({"messages": [], "patientType": "elderly"}),
                PatientType::General,
            ),
            (json!({"messages": [], "patientType": null}), PatientType::General),
            (json!({"messages": []}), PatientType::General),
        ];

        for (body, expected) in cases {
            let request: SessionRequest = serde_json::from_value(body.clone()).unwrap();
            assert_eq!(request.patient_type(), expected, "body: {body}");
        }
    }

    #[test]
    fn test_missing_messages_is_rejected() {
        let result = serde_json::from_value::<SessionRequest>(json!({"patientType": "new"}));
        assert!(result.is_err());
    }
}
