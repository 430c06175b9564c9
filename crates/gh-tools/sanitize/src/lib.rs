//! Content hygiene for model-visible text.
//!
//! Author-controlled text coming back from GitHub (issue bodies, PR
//! descriptions, comments, commit messages) is a prompt-injection surface.
//! [`sanitize`] strips the known vectors in three passes: invisible
//! characters first, then hostile code-fence info strings, then an HTML
//! allowlist. The composition is idempotent.

mod fence;
mod html;
mod invisible;

pub use fence::filter_code_fence_metadata;
pub use html::filter_html_tags;
pub use invisible::filter_invisible_characters;

/// Sanitize one model-visible text field.
pub fn sanitize(input: &str) -> String {
    filter_html_tags(&filter_code_fence_metadata(&filter_invisible_characters(
        input,
    )))
}
