//! System prompts and per-round prompts for the two debate roles.
//!
//! Prompt versioning: bump `PROMPT_VERSION` whenever preamble content changes,
//! so a saved transcript can be traced back to the instructions that produced it.

use debate_protocol::{AgentResponse, DebateError, Role};

/// Prompt version. Bump on any preamble content change.
pub const PROMPT_VERSION: &str = "1.2.0";

/// Agent A. Proposes the design and revises it against the reviewer's feedback.
pub const ARCHITECT_PREAMBLE: &str = "\
You are Agent A, the Architect, in a two-agent design debate. You propose a \
complete design for the task and revise it each round in response to Agent B, \
the Reviewer.

## Response Format (strict)
Your response is parsed by a program. Follow this layout exactly.

1. The FIRST line of your response must be `## Design`. Nothing may come \
   before it: no greeting, no acknowledgement of feedback, no summary of what \
   you are about to do.
2. Under `## Design`, write the complete current design. Always restate the \
   whole design, never only the changes.
3. After the design you may add any of these sections: `## Rationale`, \
   `## What I Changed`, `## What I Kept`, `## Open Questions`, \
   `## Remaining Work`. They are not part of the design.
4. Then write `## Convergence Status` followed by exactly one token on its own line:
   - `ITERATING` if the design still needs work
   - `PROPOSING_FINAL` if you believe the design is complete
5. End with a line starting `PROMPT_FOR_CRITIC:` followed by what the \
   Reviewer should examine next.

## Example
## Design

# Rate Limiter
Token bucket per API key.

## Rationale
Allows short bursts.

## Convergence Status
ITERATING

PROMPT_FOR_CRITIC: Is the bucket store a single point of failure?
";

/// Agent B. Critiques the architect's design and returns an improved version.
pub const REVIEWER_PREAMBLE: &str = "\
You are Agent B, the Reviewer, in a two-agent design debate. Each round you \
receive the Architect's current design. Find its weaknesses and return an \
improved version of the complete design.

## Response Format (strict)
Your response is parsed by a program. Follow this layout exactly.

1. The FIRST line of your response must be `## Design`. Nothing may come \
   before it: no greeting, no verdict, no preface.
2. Under `## Design`, write the complete improved design. Always restate the \
   whole design, never only the changes.
3. After the design you may add any of these sections: `## What I Improved`, \
   `## What I Kept`, `## What I Incorporated`, `## Open Questions`, \
   `## Remaining Work`. They are not part of the design.
4. Then write `## Convergence Status` followed by exactly one token on its own line:
   - `ITERATING` if the design still needs work
   - `PROPOSING_FINAL` if you believe your version is complete
   - `ACCEPTING_FINAL` only if the Architect proposed a final design and you agree with it
5. End with a line starting `PROMPT_FOR_ARCHITECT:` followed by what the \
   Architect should address next.
";

/// System prompt for `role`.
pub fn system_prompt(role: Role) -> &'static str {
    match role {
        Role::Architect => ARCHITECT_PREAMBLE,
        Role::Reviewer => REVIEWER_PREAMBLE,
    }
}

/// Round prompt for the architect. `reviewer` is the previous round's
/// reviewer turn, absent in round 1.
pub fn architect_prompt(task: &str, round: u32, reviewer: Option<&AgentResponse>) -> String {
    let mut prompt = String::new();
    prompt.push_str(&format!("## Task\n{}\n\n", task.trim()));
    prompt.push_str(&format!("## Round\n{}\n\n", round));

    match reviewer {
        None => {
            prompt.push_str("Produce the initial design for the task.\n\n");
        }
        Some(previous) => {
            prompt.push_str(&format!(
                "## Reviewer's Design\n{}\n\n",
                previous.content()
            ));
            prompt.push_str(&format!(
                "## Reviewer's Signal\n{}\n\n",
                previous.convergence_signal()
            ));
            if !previous.prompt_for_other().is_empty() {
                prompt.push_str(&format!(
                    "## Reviewer's Request\n{}\n\n",
                    previous.prompt_for_other()
                ));
            }
            prompt.push_str("Revise your design in response to the review.\n\n");
        }
    }

    prompt.push_str("Begin your response with `## Design`.\n");
    prompt
}

/// Round prompt for the reviewer, built from this round's architect turn.
pub fn reviewer_prompt(task: &str, round: u32, architect: &AgentResponse) -> String {
    let mut prompt = String::new();
    prompt.push_str(&format!("## Task\n{}\n\n", task.trim()));
    prompt.push_str(&format!("## Round\n{}\n\n", round));
    prompt.push_str(&format!("## Architect's Design\n{}\n\n", architect.content()));
    prompt.push_str(&format!(
        "## Architect's Signal\n{}\n\n",
        architect.convergence_signal()
    ));
    if !architect.prompt_for_other().is_empty() {
        prompt.push_str(&format!(
            "## Architect's Request\n{}\n\n",
            architect.prompt_for_other()
        ));
    }
    prompt.push_str("Review the design and return your improved version.\n\n");
    prompt.push_str("Begin your response with `## Design`.\n");
    prompt
}

/// Appended to a round prompt when the previous attempt was rejected.
pub fn format_reminder(error: &DebateError) -> String {
    format!(
        "## Format Correction\n\
         Your previous response was rejected: {}\n\
         Respond again. The very first line must be `## Design`, with nothing before it.\n",
        error
    )
}
