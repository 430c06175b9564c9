//! Toolset identity and metadata.

use std::fmt;
use std::sync::Arc;

/// Selection keyword meaning "every declared toolset".
pub const KEYWORD_ALL: &str = "all";
/// Selection keyword expanding to the default-marked toolsets.
pub const KEYWORD_DEFAULT: &str = "default";

/// Hook producing extra server instructions while the owning toolset is
/// enabled.
pub type InstructionsHook = Arc<dyn Fn() -> String + Send + Sync>;

/// Identity group for catalog items.
///
/// Toolsets are created at program start and never destroyed. Items hold an
/// `Arc<Toolset>` and compare by `id`; ids are case-sensitive. The tokens
/// `all` and `default` are configuration keywords and must not be used as
/// ids.
#[derive(Clone)]
pub struct Toolset {
    pub id: String,
    pub description: String,
    pub default: bool,
    pub icon: Option<String>,
    pub instructions: Option<InstructionsHook>,
}

impl Toolset {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            default: false,
            icon: None,
            instructions: None,
        }
    }

    /// Mark this toolset as part of the default selection.
    pub fn default_enabled(mut self) -> Self {
        self.default = true;
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Attach an instructions hook contributing to the server system prompt.
    pub fn with_instructions<F>(mut self, hook: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.instructions = Some(Arc::new(hook));
        self
    }

    pub fn into_arc(self) -> Arc<Toolset> {
        Arc::new(self)
    }
}

impl fmt::Debug for Toolset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Toolset")
            .field("id", &self.id)
            .field("default", &self.default)
            .field("icon", &self.icon)
            .field("instructions", &self.instructions.is_some())
            .finish()
    }
}
