//! Persona instructions for the simulated patient.

use crate::models::PatientType;

const NEW_PATIENT_INSTRUCTION: &str = "あなたは初めて糖尿病と診断された患者です。看護師の指導に対して、不安な気持ちや分からないことを質問してください。";

const COMPLIANCE_PATIENT_INSTRUCTION: &str = "あなたは糖尿病で入退院を繰り返しているコンプライアンスの悪い患者です。看護師の指導に対して、「そんなことできないよ」「分からない」など否定的な気持ちを表出してください。";

const GENERAL_PATIENT_INSTRUCTION: &str =
    "あなたは糖尿病患者です。看護師の指導に答えてください。";

/// System instruction that primes the chat session with the patient's persona.
pub fn system_instruction(patient_type: PatientType) -> &'static str {
    match patient_type {
        PatientType::New => NEW_PATIENT_INSTRUCTION,
        PatientType::Compliance => COMPLIANCE_PATIENT_INSTRUCTION,
        PatientType::General => GENERAL_PATIENT_INSTRUCTION,
    }
}

/// How the patient is described to the evaluator. Only newly diagnosed
/// patients get their own label; everyone else is framed as the
/// non-adherent case.
pub fn evaluation_label(patient_type: PatientType) -> &'static str {
    match patient_type {
        PatientType::New => "初めて糖尿病と診断された患者",
        PatientType::Compliance | PatientType::General => {
            "入退院を繰り返すコンプライアンスの悪い患者"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_persona_has_its_own_instruction() {
        let new = system_instruction(PatientType::New);
        let compliance = system_instruction(PatientType::Compliance);
        let general = system_instruction(PatientType::General);

        assert!(new.contains("初めて糖尿病と診断された"));
        assert!(compliance.contains("コンプライアンスの悪い"));
        assert_eq!(general, GENERAL_PATIENT_INSTRUCTION);
        assert_ne!(new, compliance);
        assert_ne!(new, general);
    }

    #[test]
    fn test_unrecognized_patient_type_gets_general_instruction() {
        let parsed: PatientType = serde_json::from_str("\"pediatric\"").unwrap();
        assert_eq!(system_instruction(parsed), GENERAL_PATIENT_INSTRUCTION);
        assert_eq!(
            system_instruction(PatientType::default()),
            GENERAL_PATIENT_INSTRUCTION
        );
    }

    #[test]
    fn test_evaluation_label_is_two_way() {
        assert_eq!(
            evaluation_label(PatientType::New),
            "初めて糖尿病と診断された患者"
        );
        assert_eq!(
            evaluation_label(PatientType::Compliance),
            evaluation_label(PatientType::General)
        );
    }
}
