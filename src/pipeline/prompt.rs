pub const CARE_INSTRUCTION_SYSTEM_PROMPT: &str = "Você é um assistente médico especializado em criar orientações pós-atendimento.

REGRAS IMPORTANTES:
- Use linguagem simples e acessível
- NÃO use markdown (sem **, ##, -, *)
- Use apenas texto simples e organizado
- Separe seções com linhas em branco
- Use números (1. 2. 3.) para listas
- Seja empático e claro
- Responda em português brasileiro";

/// Fixed section headings, in the order the model must emit them.
pub const INSTRUCTION_SECTIONS: [(&str, &str); 5] = [
    ("CUIDADOS GERAIS", "orientações para as próximas 24-48 horas"),
    ("MEDICAÇÕES", "instruções sobre medicações se aplicável"),
    ("SINAIS DE ALERTA", "quando procurar atendimento de urgência"),
    ("RESTRIÇÕES", "atividades a evitar"),
    ("RETORNO", "próximos passos e quando retornar"),
];

/// Placeholder for appointments without notes.
const NO_NOTES: &str = "Nenhuma";

/// Visit data the prompt is built from.
#[derive(Debug, Clone, Copy)]
pub struct VisitSummary<'a> {
    pub patient_name: &'a str,
    pub procedure: &'a str,
    pub diagnosis: &'a str,
    pub notes: Option<&'a str>,
}

/// Build the aftercare prompt for one visit. Deterministic for equal input.
pub fn build_instruction_prompt(visit: &VisitSummary<'_>) -> String {
    let notes = visit
        .notes
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(NO_NOTES);

    let sections = INSTRUCTION_SECTIONS
        .iter()
        .map(|(title, hint)| format!("{title}\n[{hint}]"))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "Crie orientações de pós-atendimento em TEXTO SIMPLES (sem markdown) para:

Paciente: {}
Procedimento: {}
Diagnóstico: {}
Observações: {notes}

Organize assim (sem usar markdown):

{sections}",
        visit.patient_name, visit.procedure, visit.diagnosis
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn visit(notes: Option<&'static str>) -> VisitSummary<'static> {
        VisitSummary {
            patient_name: "Maria Silva",
            procedure: "Extração de siso",
            diagnosis: "Terceiro molar incluso",
            notes,
        }
    }

    #[test]
    fn prompt_contains_visit_fields() {
        let prompt = build_instruction_prompt(&visit(Some("Alergia a dipirona")));
        assert!(prompt.contains("Paciente: Maria Silva"));
        assert!(prompt.contains("Procedimento: Extração de siso"));
        assert!(prompt.contains("Diagnóstico: Terceiro molar incluso"));
        assert!(prompt.contains("Observações: Alergia a dipirona"));
    }

    #[test]
    fn missing_or_blank_notes_become_nenhuma() {
        for notes in [None, Some("   ")] {
            let prompt = build_instruction_prompt(&visit(notes));
            assert!(prompt.contains("Observações: Nenhuma"));
        }
    }

    #[test]
    fn sections_appear_in_order() {
        let prompt = build_instruction_prompt(&visit(None));
        let positions: Vec<usize> = INSTRUCTION_SECTIONS
            .iter()
            .map(|(title, _)| prompt.find(title).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn prompt_is_deterministic() {
        assert_eq!(
            build_instruction_prompt(&visit(None)),
            build_instruction_prompt(&visit(None))
        );
    }

    #[test]
    fn system_prompt_forbids_markdown_and_sets_language() {
        assert!(CARE_INSTRUCTION_SYSTEM_PROMPT.contains("NÃO use markdown"));
        assert!(CARE_INSTRUCTION_SYSTEM_PROMPT.contains("português brasileiro"));
    }
}
