//! Per-register instructions for the completion call.

use std::collections::HashMap;

use super::routing::Register;

/// Placeholder replaced with the user's original text.
const TEXT_PLACEHOLDER: &str = "{text}";

/// Instruction pair for one register.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterPrompt {
    /// Sent ahead of the user prompt.
    pub system: String,
    /// User prompt with a `{text}` placeholder.
    pub template: String,
}

/// Immutable register → prompt table, built once at startup.
#[derive(Debug, Clone)]
pub struct PromptTable {
    entries: HashMap<Register, RegisterPrompt>,
}

impl PromptTable {
    /// The built-in Japanese prompts.
    pub fn builtin() -> Self {
        let entries = Register::ALL
            .into_iter()
            .map(|register| {
                let (persona, scene) = register_wording(register);
                let prompt = RegisterPrompt {
                    system: format!(
                        "あなたは与えられたテキストを、{persona}に変換するAIです。\n\
                         変換後のテキストは、元のテキストの意図を正確に伝えつつ、{}に対して失礼のないようにしてください。\n\
                         返答は変換後のテキストのみを返してください。",
                        audience(register)
                    ),
                    template: format!(
                        "以下のテキストを、{scene}に適した丁寧な言葉遣いに変換してください。\n\n{TEXT_PLACEHOLDER}"
                    ),
                };
                (register, prompt)
            })
            .collect();
        Self { entries }
    }

    pub fn get(&self, register: Register) -> &RegisterPrompt {
        // `builtin` fills every register.
        &self.entries[&register]
    }

    pub fn system_instruction(&self, register: Register) -> &str {
        &self.get(register).system
    }

    /// Substitute `text` into the register's template.
    pub fn user_prompt(&self, register: Register, text: &str) -> String {
        self.get(register).template.replacen(TEXT_PLACEHOLDER, text, 1)
    }
}

impl Default for PromptTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// (persona clause, scene) per register.
fn register_wording(register: Register) -> (&'static str, &'static str) {
    match register {
        Register::Club => (
            "部活の先輩に送るメッセージとして適切な、丁寧な言葉遣い",
            "部活の場面",
        ),
        Register::Circle => (
            "サークルのメンバーに送るメッセージとして適切な、少し丁寧でカジュアルな言葉遣い",
            "サークルの場面",
        ),
        Register::JobHunting => (
            "就職活動の場面で使うような最も硬く丁寧な言葉遣い",
            "就職活動の場面",
        ),
        Register::Adult => (
            "目上の大人に送るメッセージとして適切な、丁寧な言葉遣い",
            "目上の大人",
        ),
    }
}

fn audience(register: Register) -> &'static str {
    match register {
        Register::Club => "部活の先輩",
        Register::Circle => "サークルのメンバー",
        Register::JobHunting => "採用担当者",
        Register::Adult => "目上の大人",
    }
}
