//! Persona and prompt table bundled at compile time.
//!
//! The table is immutable for the life of the process; every debate run
//! reads the same three entries in the same order.

use super::viewpoint::Viewpoint;

/// Advocate - argues in favor of the idea
pub const FAVOR: &str = include_str!("defaults/favor.md");

/// Critic - argues against the idea
pub const CONTRA: &str = include_str!("defaults/contra.md");

/// Analyst - balanced pros and cons
pub const NEUTRAL: &str = include_str!("defaults/neutral.md");

/// Rebuttal of a quoted argument; `{stance}` is replaced with the reply's stance
pub const REPLY_OPPOSING: &str = include_str!("defaults/reply_opposing.md");

/// Continuation of a neutral analysis from another angle
pub const REPLY_CONTINUE: &str = include_str!("defaults/reply_continue.md");

/// One row of the persona table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersonaSpec {
    pub viewpoint: Viewpoint,
    pub system_prompt: &'static str,
    pub persona: &'static str,
}

/// Initial debate personas, in generation order
pub static PERSONAS: [PersonaSpec; 3] = [
    PersonaSpec {
        viewpoint: Viewpoint::Favor,
        system_prompt: FAVOR,
        persona: "IA Defensor",
    },
    PersonaSpec {
        viewpoint: Viewpoint::Contra,
        system_prompt: CONTRA,
        persona: "IA Crítico",
    },
    PersonaSpec {
        viewpoint: Viewpoint::Neutral,
        system_prompt: NEUTRAL,
        persona: "IA Analista",
    },
];

/// Look up the table row for a viewpoint
pub fn persona_for(viewpoint: Viewpoint) -> &'static PersonaSpec {
    match viewpoint {
        Viewpoint::Favor => &PERSONAS[0],
        Viewpoint::Contra => &PERSONAS[1],
        Viewpoint::Neutral => &PERSONAS[2],
    }
}

/// User message for the initial debate calls
pub fn idea_message(title: &str, content: &str) -> String {
    format!("Idea: \"{}\"\n\nDescripción: {}", title, content)
}

/// System prompt for a reply to a response with `parent` viewpoint
pub fn reply_prompt(parent: Viewpoint) -> String {
    match parent.opposite() {
        Viewpoint::Neutral => REPLY_CONTINUE.to_string(),
        target => REPLY_OPPOSING.replace("{stance}", stance_label(target)),
    }
}

/// User message quoting the response being answered
pub fn reply_message(parent_content: &str) -> String {
    format!("Argumento a responder:\n\n\"{}\"", parent_content)
}

fn stance_label(viewpoint: Viewpoint) -> &'static str {
    match viewpoint {
        Viewpoint::Favor => "A FAVOR",
        Viewpoint::Contra => "EN CONTRA",
        Viewpoint::Neutral => "NEUTRAL",
    }
}
