//! Design extraction: reduce a raw response to its canonical design text.
//!
//! Everything before the Design heading is preamble; everything from the first
//! meta-section heading onward is protocol metadata. What remains is the design.

use super::signal::{BYTE_ORDER_MARK, DESIGN_HEADER, DESIGN_HEADER_ALT};

/// Heading titles that mark protocol metadata rather than design content.
pub const META_SECTIONS: [&str; 10] = [
    "Rationale",
    "What I Changed",
    "What I Kept",
    "What I Incorporated",
    "Open Questions",
    "Convergence",
    "Prompt for",
    "Remaining",
    "What I Improved",
    "PROMPT_FOR",
];

/// Whether a trimmed line is the Design heading at depth 2 or 3.
fn is_design_heading(trimmed: &str) -> bool {
    trimmed == DESIGN_HEADER || trimmed == DESIGN_HEADER_ALT
}

/// Title of a level-2 or level-3 heading, if the line is one.
fn section_title(trimmed: &str) -> Option<&str> {
    trimmed
        .strip_prefix("### ")
        .or_else(|| trimmed.strip_prefix("## "))
}

/// Whether a line opens a meta-section that ends the design body.
pub fn is_meta_heading(line: &str) -> bool {
    section_title(line.trim())
        .map(|title| META_SECTIONS.iter().any(|meta| title.contains(meta)))
        .unwrap_or(false)
}

/// Extract the design section from a response.
///
/// Starts at the first `## Design` / `### Design` line and stops before the
/// first meta-section heading. Returns the input unchanged when there is no
/// Design heading (minus a leading byte-order mark), and never turns a
/// non-empty input into an empty design.
pub fn extract_design_section(response: &str) -> String {
    let response = response.trim_start_matches(BYTE_ORDER_MARK);
    let lines: Vec<&str> = response.split('\n').collect();

    let Some(start) = lines.iter().position(|line| is_design_heading(line.trim())) else {
        return response.to_string();
    };

    let mut design_lines = vec![lines[start]];
    for &line in &lines[start + 1..] {
        if is_meta_heading(line) {
            break;
        }
        design_lines.push(line);
    }

    let design = design_lines.join("\n").trim().to_string();
    if design.is_empty() {
        response.to_string()
    } else {
        design
    }
}
