//! 终端视图 - 编排层
//!
//! 只负责把说明页、题目页和结果页格式化成文本，不持有任何状态。

use crate::models::{QuestionKind, TestMetadata};
use crate::services::CodeLanguage;
use crate::workflow::QuestionFlow;

pub const ALREADY_SUBMITTED: &str = "Test déjà soumis avec succès";
pub const START_PROMPT: &str = "Appuyez sur Entrée pour démarrer le test";
pub const TEST_COMPLETED: &str = "Test terminé avec succès";

/// 说明页
pub fn instructions_screen(test: &TestMetadata, already_submitted: bool) -> String {
    let mut lines = vec![
        "=".repeat(60),
        test.title.clone(),
        "=".repeat(60),
    ];
    if !test.description.is_empty() {
        lines.push(test.description.clone());
    }
    lines.push(String::new());

    if let Some(count) = test.question_count() {
        lines.push(format!("Ce test comporte {} questions", count));
    }
    if let Some(minutes) = test.max_time_minutes() {
        lines.push(format!("Durée maximum : {} minutes", minutes));
    }
    lines.push(format!("Poste visé : {}", test.target_job_label()));
    lines.push(format!("Niveau : {}", test.seniority_label()));

    if !test.categories.is_empty() {
        lines.push("Catégories :".to_string());
        lines.extend(test.categories.iter().map(|c| format!("  - {}", c.label())));
    }

    lines.push(String::new());
    lines.push(if already_submitted {
        ALREADY_SUBMITTED.to_string()
    } else {
        START_PROMPT.to_string()
    });
    lines.join("\n")
}

/// 题目页
pub fn question_screen(flow: &mut QuestionFlow) -> String {
    let label = flow.submit_label();
    let Some(question) = flow.question() else {
        return String::new();
    };

    let mut lines = vec![
        "─".repeat(60),
        format!("Temps restant : {}", flow.remaining_display()),
        String::new(),
        flow.rendered_instruction().to_string(),
        String::new(),
    ];

    match question.kind() {
        QuestionKind::MultipleChoice => {
            lines.extend(
                question
                    .possible_responses
                    .iter()
                    .enumerate()
                    .map(|(i, option)| format!("  {}. {}", i + 1, option.possible_response)),
            );
            lines.push(String::new());
            lines.push("Tapez le numéro de votre réponse".to_string());
        }
        QuestionKind::FreeText => {
            lines.push("Saisissez votre réponse (une ligne à la fois)".to_string());
        }
        QuestionKind::Code => {
            if let Some(lang) = flow.language() {
                lines.push(format!("Langage : {}", lang.label()));
            }
            lines.push(format!("Langages disponibles : {}", language_values()));
            lines.push("Saisissez votre code (:lang <langage> pour changer)".to_string());
        }
    }

    lines.push(format!("[:submit] {}", label));
    lines.join("\n")
}

/// 计时提示只在整 30 秒和最后 10 秒显示
pub fn countdown_line(remaining: u32) -> Option<String> {
    if remaining > 0 && (remaining <= 10 || remaining % 30 == 0) {
        Some(format!(
            "Temps restant : {}",
            crate::services::format_remaining(remaining)
        ))
    } else {
        None
    }
}

fn language_values() -> String {
    CodeLanguage::ALL
        .iter()
        .map(|l| l.value())
        .collect::<Vec<_>>()
        .join(", ")
}
