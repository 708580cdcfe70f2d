//! Scoring of a finished teaching session.

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::{
    llm::{ModelClient, ModelError},
    models::{EvaluationResult, Message, PatientType, Sender},
    persona::evaluation_label,
};

const NURSE_LABEL: &str = "看護師";
const PATIENT_LABEL: &str = "患者";

const GUIDELINE_URL: &str = "https://www.jds.or.jp/modules/publication/index.php?content_id=4";

pub const MAX_SCORE: f64 = 100.0;

#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error("transcript has no messages")]
    EmptyTranscript,

    #[error(transparent)]
    Upstream(#[from] ModelError),

    #[error("evaluation is not valid JSON: {0}")]
    MalformedOutput(#[from] serde_json::Error),

    #[error("evaluation failed validation: {0}")]
    InvalidResult(String),
}

/// Shape the model is asked to answer with.
#[derive(Debug, Deserialize)]
struct RawEvaluation {
    score: f64,
    feedback: String,
}

/// One `"<label>: <text>"` line per message, nurse lines for `user`.
pub fn render_transcript(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|msg| {
            let label = match msg.sender {
                Sender::User => NURSE_LABEL,
                Sender::Ai => PATIENT_LABEL,
            };
            format!("{}: {}", label, msg.text)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn build_evaluation_prompt(messages: &[Message], patient_type: PatientType) -> String {
    let patient = evaluation_label(patient_type);
    let transcript = render_transcript(messages);

    format!(
        r#"あなたは糖尿病療養指導シミュレーターの評価者です。看護師の成長を支援するため、建設的かつ公平なフィードバックを提供してください。
以下の会話履歴は、看護師（プレイヤー）と糖尿病患者（AI）の間の指導セッションです。
患者のタイプは「{patient}」です。

会話履歴:
{transcript}

以下の基準に基づいて、看護師の指導を100点満点で評価し、具体的なフィードバックを提供してください。

**良い点:** 患者に寄り添った共感的な姿勢、適切な情報提供、効果的なコミュニケーションなど、優れていた点を具体的に評価し、積極的に褒めてください。これらの点は点数に反映しますが、**誤った指導があった場合は、その影響を上回ることはありません。**

**改善点:** 誤った指導や不適切な指導があった場合は、その点を明確に指摘し、**糖尿病診療ガイドライン（{GUIDELINE_URL}）を根拠に**なぜそれが不適切なのかを詳細に説明してください。誤った指導があった場合、点数は厳しく減点し、低く設定してください。

フィードバックは、良い点と改善点の両方をバランス良く記述し、看護師が次回の指導に活かせるような具体的な内容にしてください。

出力は以下の形式のJSONのみで返してください。JSON以外の文章は含めないでください。
{{
  "score": (点数, 0-100の整数),
  "feedback": "具体的なフィードバック。良い点と改善点（誤った指導の指摘と根拠を含む）をバランス良く記述。"
}}"#
    )
}

/// Removes a surrounding ```` ```json ```` / ```` ``` ```` fence. Text without
/// fences is returned untouched.
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();

    let (body, opened) = match trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
    {
        Some(body) => (body, true),
        None => (trimmed, false),
    };
    let (body, closed) = match body.strip_suffix("```") {
        Some(body) => (body, true),
        None => (body, false),
    };

    if !opened && !closed {
        return raw;
    }
    body.trim()
}

/// Parses and validates the model's answer.
pub fn parse_evaluation(raw: &str) -> Result<EvaluationResult, EvaluationError> {
    let parsed: RawEvaluation = serde_json::from_str(strip_code_fences(raw))?;

    if !parsed.score.is_finite() || !(0.0..=MAX_SCORE).contains(&parsed.score) {
        return Err(EvaluationError::InvalidResult(format!(
            "score {} is outside 0-100",
            parsed.score
        )));
    }
    if parsed.feedback.trim().is_empty() {
        return Err(EvaluationError::InvalidResult(
            "feedback is empty".to_string(),
        ));
    }

    Ok(EvaluationResult {
        score: parsed.score.round() as u8,
        feedback: parsed.feedback,
    })
}

/// Asks the model to grade the nurse's teaching in `messages`.
pub async fn evaluate_session(
    model: &dyn ModelClient,
    messages: &[Message],
    patient_type: PatientType,
) -> Result<EvaluationResult, EvaluationError> {
    if messages.is_empty() {
        return Err(EvaluationError::EmptyTranscript);
    }

    info!(
        message_count = messages.len(),
        patient_type = ?patient_type,
        "Evaluating session"
    );

    let prompt = build_evaluation_prompt(messages, patient_type);
    debug!(prompt = %prompt, "Evaluation prompt");

    let raw = model.generate(&prompt).await?;

    parse_evaluation(&raw).inspect_err(|e| {
        error!(error = %e, raw = %raw, "Could not use evaluation response");
    })
}
