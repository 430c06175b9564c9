//! Configured registry: the immutable catalog plus per-request filter
//! settings.
//!
//! A [`Registry`] is built once at process start and never mutated
//! afterwards, with one exception: the enabled-toolset map, whose entries
//! may transition from false to true while the process runs (dynamic
//! toolset enablement). Clones are shallow; catalog backing arrays, the
//! alias map and the enabled-toolset map are shared by reference.

use crate::catalog::{ServerPrompt, ServerResourceTemplate, ServerTool};
use crate::context::RequestContext;
use crate::error::ToolError;
use crate::toolset::{KEYWORD_ALL, KEYWORD_DEFAULT, Toolset};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::warn;

/// Pluggable feature-flag resolver keyed off the caller context.
pub type FlagResolver =
    Arc<dyn Fn(&RequestContext, &str) -> Result<bool, ToolError> + Send + Sync>;

/// Custom per-tool filter; false or error hides the tool.
pub type ToolFilter =
    Arc<dyn Fn(&RequestContext, &ServerTool) -> Result<bool, ToolError> + Send + Sync>;

/// Enabled-toolset map covering every declared id.
///
/// Entries only ever flip false -> true; a stale read is therefore either
/// correct or a benign re-evaluation.
pub struct EnabledToolsets {
    state: Mutex<HashMap<String, bool>>,
}

impl EnabledToolsets {
    fn new(declared: &BTreeSet<String>, selected: &HashSet<String>) -> Self {
        let state = declared
            .iter()
            .map(|id| (id.clone(), selected.contains(id)))
            .collect();
        Self {
            state: Mutex::new(state),
        }
    }

    pub fn is_enabled(&self, id: &str) -> bool {
        self.lock().get(id).copied().unwrap_or(false)
    }

    /// Flip a toolset on. Unknown ids are reported, already-enabled ids are
    /// a no-op; nothing ever flips back off.
    fn enable(&self, id: &str) -> bool {
        match self.lock().get_mut(id) {
            Some(entry) => {
                *entry = true;
                true
            }
            None => false,
        }
    }

    fn snapshot(&self) -> Vec<(String, bool)> {
        let mut entries: Vec<(String, bool)> = self
            .lock()
            .iter()
            .map(|(id, on)| (id.clone(), *on))
            .collect();
        entries.sort();
        entries
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, bool>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The configured, immutable registry.
#[derive(Clone)]
pub struct Registry {
    pub(crate) tools: Arc<Vec<ServerTool>>,
    pub(crate) resource_templates: Arc<Vec<ServerResourceTemplate>>,
    pub(crate) prompts: Arc<Vec<ServerPrompt>>,
    pub(crate) read_only: bool,
    /// None means "no toolset filter": everything is enabled.
    pub(crate) enabled_toolsets: Option<Arc<EnabledToolsets>>,
    /// Canonical tool names that bypass the toolset gate only.
    pub(crate) additional_tools: Arc<HashSet<String>>,
    pub(crate) flag_resolver: Option<FlagResolver>,
    pub(crate) custom_filters: Arc<Vec<ToolFilter>>,
    pub(crate) aliases: Arc<HashMap<String, String>>,
    pub(crate) toolset_ids: Arc<BTreeSet<String>>,
    pub(crate) toolsets: Arc<Vec<Arc<Toolset>>>,
    pub(crate) default_toolsets: Arc<Vec<String>>,
    pub(crate) toolset_descriptions: Arc<HashMap<String, String>>,
    pub(crate) unrecognized_toolsets: Arc<Vec<String>>,
}

/// Shared handle stored in the request context by the dispatcher so
/// dynamic-toolset handlers can reach the registry that dispatched them.
#[derive(Clone)]
pub struct RegistryHandle(pub Registry);

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    pub fn tools(&self) -> &[ServerTool] {
        &self.tools
    }

    pub fn resource_templates(&self) -> &[ServerResourceTemplate] {
        &self.resource_templates
    }

    pub fn prompts(&self) -> &[ServerPrompt] {
        &self.prompts
    }

    pub fn read_only(&self) -> bool {
        self.read_only
    }

    /// Declared toolset metadata, sorted by id, one entry per id.
    pub fn toolsets(&self) -> &[Arc<Toolset>] {
        &self.toolsets
    }

    /// Ids of toolsets marked default in the catalog.
    pub fn default_toolsets(&self) -> &[String] {
        &self.default_toolsets
    }

    pub fn has_toolset(&self, id: &str) -> bool {
        self.toolset_ids.contains(id)
    }

    pub fn toolset_description(&self, id: &str) -> Option<&str> {
        self.toolset_descriptions.get(id).map(String::as_str)
    }

    /// Selection tokens that named no declared toolset. Diagnostic only.
    pub fn unrecognized_toolsets(&self) -> &[String] {
        &self.unrecognized_toolsets
    }

    /// Whether a toolset is currently enabled.
    pub fn toolset_enabled(&self, id: &str) -> bool {
        match &self.enabled_toolsets {
            None => self.has_toolset(id),
            Some(map) => map.is_enabled(id),
        }
    }

    /// Per-toolset enabled state, sorted by id.
    pub fn toolset_states(&self) -> Vec<(String, bool)> {
        match &self.enabled_toolsets {
            None => self.toolset_ids.iter().map(|id| (id.clone(), true)).collect(),
            Some(map) => map.snapshot(),
        }
    }

    /// Dynamically enable a toolset. The only mutation the registry permits
    /// after build, and it only ever flips entries to true.
    pub fn enable_toolset(&self, id: &str) -> Result<(), ToolError> {
        if !self.has_toolset(id) {
            return Err(ToolError::not_found(format!("toolset does not exist: {id}")));
        }
        if let Some(map) = &self.enabled_toolsets {
            map.enable(id);
        }
        Ok(())
    }

    /// Resolve a possibly-deprecated item name to its canonical form,
    /// warning once per rewrite.
    pub fn resolve_alias(&self, name: &str) -> String {
        match self.aliases.get(name) {
            Some(canonical) => {
                warn!(alias = name, canonical = %canonical, "rewrote deprecated tool name");
                canonical.clone()
            }
            None => name.to_string(),
        }
    }

    pub(crate) fn alias_target(&self, name: &str) -> Option<&str> {
        self.aliases.get(name).map(String::as_str)
    }

    /// Assemble the instructions contributed by the hooks of enabled
    /// toolsets, in toolset order.
    pub fn instructions(&self) -> Option<String> {
        let parts: Vec<String> = self
            .toolsets
            .iter()
            .filter(|ts| self.toolset_enabled(&ts.id))
            .filter_map(|ts| ts.instructions.as_ref().map(|hook| hook()))
            .filter(|text| !text.is_empty())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("\n\n"))
        }
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("tools", &self.tools.len())
            .field("resource_templates", &self.resource_templates.len())
            .field("prompts", &self.prompts.len())
            .field("read_only", &self.read_only)
            .field("toolsets", &self.toolset_ids)
            .field("unrecognized_toolsets", &self.unrecognized_toolsets)
            .finish()
    }
}

/// Builder validating and normalizing the registry configuration.
#[derive(Default)]
pub struct RegistryBuilder {
    tools: Vec<ServerTool>,
    resource_templates: Vec<ServerResourceTemplate>,
    prompts: Vec<ServerPrompt>,
    aliases: HashMap<String, String>,
    read_only: bool,
    toolset_selection: Option<Vec<String>>,
    additional_tools: Vec<String>,
    flag_resolver: Option<FlagResolver>,
    custom_filters: Vec<ToolFilter>,
}

impl RegistryBuilder {
    pub fn tools(mut self, tools: impl IntoIterator<Item = ServerTool>) -> Self {
        self.tools.extend(tools);
        self
    }

    pub fn resource_templates(
        mut self,
        templates: impl IntoIterator<Item = ServerResourceTemplate>,
    ) -> Self {
        self.resource_templates.extend(templates);
        self
    }

    pub fn prompts(mut self, prompts: impl IntoIterator<Item = ServerPrompt>) -> Self {
        self.prompts.extend(prompts);
        self
    }

    /// Register deprecated-name rewrites (`old -> canonical`).
    pub fn aliases(mut self, aliases: impl IntoIterator<Item = (String, String)>) -> Self {
        self.aliases.extend(aliases);
        self
    }

    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Toolset selection. `None` means the default toolsets; `["all"]`
    /// disables toolset filtering; the `default` keyword expands to the
    /// default set; an empty list enables nothing.
    pub fn toolsets(mut self, selection: Option<Vec<String>>) -> Self {
        self.toolset_selection = selection;
        self
    }

    /// Allowlist of tool names that bypass the toolset gate (and only that
    /// gate). Aliases are resolved at build.
    pub fn additional_tools<S: Into<String>>(
        mut self,
        names: impl IntoIterator<Item = S>,
    ) -> Self {
        self.additional_tools.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn flag_resolver<F>(mut self, resolver: F) -> Self
    where
        F: Fn(&RequestContext, &str) -> Result<bool, ToolError> + Send + Sync + 'static,
    {
        self.flag_resolver = Some(Arc::new(resolver));
        self
    }

    /// Append a custom filter; filters run in registration order.
    pub fn custom_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&RequestContext, &ServerTool) -> Result<bool, ToolError> + Send + Sync + 'static,
    {
        self.custom_filters.push(Arc::new(filter));
        self
    }

    pub fn build(self) -> Registry {
        let RegistryBuilder {
            mut tools,
            mut resource_templates,
            mut prompts,
            aliases,
            read_only,
            toolset_selection,
            additional_tools,
            flag_resolver,
            custom_filters,
        } = self;

        // One pass over the three catalogs: declared ids, default-marked
        // ids, descriptions (last writer wins), one metadata Arc per id.
        let mut toolset_ids: BTreeSet<String> = BTreeSet::new();
        let mut default_set: BTreeSet<String> = BTreeSet::new();
        let mut descriptions: HashMap<String, String> = HashMap::new();
        let mut metas: HashMap<String, Arc<Toolset>> = HashMap::new();
        {
            let mut visit = |ts: &Arc<Toolset>| {
                toolset_ids.insert(ts.id.clone());
                if ts.default {
                    default_set.insert(ts.id.clone());
                }
                descriptions.insert(ts.id.clone(), ts.description.clone());
                metas.insert(ts.id.clone(), Arc::clone(ts));
            };
            for tool in &tools {
                visit(&tool.toolset);
            }
            for template in &resource_templates {
                visit(&template.toolset);
            }
            for prompt in &prompts {
                visit(&prompt.toolset);
            }
        }

        let (enabled_toolsets, unrecognized) = normalize_selection(
            toolset_selection,
            &toolset_ids,
            &default_set,
        );
        for name in &unrecognized {
            warn!(toolset = %name, "ignoring unrecognized toolset in configuration");
        }

        // Canonicalize the additional-tool allowlist through the alias map.
        // Names that match no tool are kept as-is: the narrower simply won't
        // match them, which keeps newer clients working against older
        // catalogs.
        let additional: HashSet<String> = additional_tools
            .into_iter()
            .map(|name| match aliases.get(&name) {
                Some(canonical) => {
                    warn!(alias = %name, canonical = %canonical, "rewrote deprecated tool name");
                    canonical.clone()
                }
                None => name,
            })
            .collect();

        // Canonical order: (toolset-id, name). Two identically-configured
        // registries list items byte-identically.
        tools.sort_by(|a, b| {
            (a.toolset.id.as_str(), a.spec.name.as_str())
                .cmp(&(b.toolset.id.as_str(), b.spec.name.as_str()))
        });
        resource_templates.sort_by(|a, b| {
            (a.toolset.id.as_str(), a.spec.uri_template.as_str())
                .cmp(&(b.toolset.id.as_str(), b.spec.uri_template.as_str()))
        });
        prompts.sort_by(|a, b| {
            (a.toolset.id.as_str(), a.spec.name.as_str())
                .cmp(&(b.toolset.id.as_str(), b.spec.name.as_str()))
        });

        let toolsets: Vec<Arc<Toolset>> = toolset_ids
            .iter()
            .filter_map(|id| metas.get(id).cloned())
            .collect();
        let default_toolsets: Vec<String> = default_set.into_iter().collect();

        Registry {
            tools: Arc::new(tools),
            resource_templates: Arc::new(resource_templates),
            prompts: Arc::new(prompts),
            read_only,
            enabled_toolsets,
            additional_tools: Arc::new(additional),
            flag_resolver,
            custom_filters: Arc::new(custom_filters),
            aliases: Arc::new(aliases),
            toolset_ids: Arc::new(toolset_ids),
            toolsets: Arc::new(toolsets),
            default_toolsets: Arc::new(default_toolsets),
            toolset_descriptions: Arc::new(descriptions),
            unrecognized_toolsets: Arc::new(unrecognized),
        }
    }
}

/// Normalize a toolset selection: trim, drop empties, dedupe preserving
/// first occurrence, expand the `default` keyword, short-circuit on `all`.
/// Unknown tokens go to the diagnostic list, never fail the build.
fn normalize_selection(
    selection: Option<Vec<String>>,
    declared: &BTreeSet<String>,
    defaults: &BTreeSet<String>,
) -> (Option<Arc<EnabledToolsets>>, Vec<String>) {
    let Some(raw) = selection else {
        // Nil selection means the default toolsets.
        let selected: HashSet<String> = defaults.iter().cloned().collect();
        return (
            Some(Arc::new(EnabledToolsets::new(declared, &selected))),
            Vec::new(),
        );
    };

    let mut tokens: Vec<String> = Vec::new();
    for token in raw {
        let token = token.trim().to_string();
        if token.is_empty() || tokens.contains(&token) {
            continue;
        }
        tokens.push(token);
    }

    if tokens.iter().any(|t| t == KEYWORD_ALL) {
        return (None, Vec::new());
    }

    let mut selected: HashSet<String> = HashSet::new();
    let mut unrecognized: Vec<String> = Vec::new();
    for token in tokens {
        if token == KEYWORD_DEFAULT {
            selected.extend(defaults.iter().cloned());
        } else if declared.contains(&token) {
            selected.insert(token);
        } else {
            unrecognized.push(token);
        }
    }

    (
        Some(Arc::new(EnabledToolsets::new(declared, &selected))),
        unrecognized,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ToolAnnotations, ToolHandler, ToolResult, ToolSpec};

    fn noop() -> ToolHandler {
        Arc::new(|_req| Box::pin(async { Ok(ToolResult::text("ok")) }))
    }

    fn tool(name: &str, toolset: &Arc<Toolset>) -> ServerTool {
        ServerTool::new(
            ToolSpec {
                name: name.to_string(),
                title: None,
                description: format!("{name} description"),
                input_schema: serde_json::json!({"type": "object"}),
                annotations: ToolAnnotations::read_only(),
            },
            Arc::clone(toolset),
            noop(),
        )
    }

    fn two_toolset_catalog() -> (Arc<Toolset>, Arc<Toolset>, Vec<ServerTool>) {
        let ts1 = Toolset::new("ts1", "first").default_enabled().into_arc();
        let ts2 = Toolset::new("ts2", "second").into_arc();
        let tools = vec![tool("b_tool", &ts2), tool("a_tool", &ts1), tool("c_tool", &ts1)];
        (ts1, ts2, tools)
    }

    #[test]
    fn build_sorts_by_toolset_then_name() {
        let (_, _, tools) = two_toolset_catalog();
        let reg = Registry::builder().tools(tools).build();
        let names: Vec<&str> = reg.tools().iter().map(ServerTool::name).collect();
        assert_eq!(names, vec!["a_tool", "c_tool", "b_tool"]);
    }

    #[test]
    fn nil_selection_enables_defaults() {
        let (_, _, tools) = two_toolset_catalog();
        let reg = Registry::builder().tools(tools).toolsets(None).build();
        assert!(reg.toolset_enabled("ts1"));
        assert!(!reg.toolset_enabled("ts2"));
    }

    #[test]
    fn all_keyword_disables_filtering() {
        let (_, _, tools) = two_toolset_catalog();
        let reg = Registry::builder()
            .tools(tools)
            .toolsets(Some(vec!["all".to_string()]))
            .build();
        assert!(reg.enabled_toolsets.is_none());
        assert!(reg.toolset_enabled("ts1"));
        assert!(reg.toolset_enabled("ts2"));
    }

    #[test]
    fn empty_selection_enables_nothing() {
        let (_, _, tools) = two_toolset_catalog();
        let reg = Registry::builder().tools(tools).toolsets(Some(vec![])).build();
        assert!(!reg.toolset_enabled("ts1"));
        assert!(!reg.toolset_enabled("ts2"));
    }

    #[test]
    fn default_keyword_expands() {
        let (_, _, tools) = two_toolset_catalog();
        let reg = Registry::builder()
            .tools(tools)
            .toolsets(Some(vec!["default".to_string(), "ts2".to_string()]))
            .build();
        assert!(reg.toolset_enabled("ts1"));
        assert!(reg.toolset_enabled("ts2"));
    }

    #[test]
    fn selection_is_trimmed_and_deduped() {
        let (_, _, tools) = two_toolset_catalog();
        let reg = Registry::builder()
            .tools(tools)
            .toolsets(Some(vec![
                "  ts1 ".to_string(),
                String::new(),
                "ts1".to_string(),
                "nope".to_string(),
            ]))
            .build();
        assert!(reg.toolset_enabled("ts1"));
        assert_eq!(reg.unrecognized_toolsets(), ["nope"]);
    }

    #[test]
    fn additional_tools_resolve_aliases() {
        let (_, _, tools) = two_toolset_catalog();
        let reg = Registry::builder()
            .tools(tools)
            .aliases([("old_a".to_string(), "a_tool".to_string())])
            .additional_tools(["old_a"])
            .build();
        assert!(reg.additional_tools.contains("a_tool"));
        assert!(!reg.additional_tools.contains("old_a"));
    }

    #[test]
    fn unmatched_additional_tools_are_kept() {
        let (_, _, tools) = two_toolset_catalog();
        let reg = Registry::builder()
            .tools(tools)
            .additional_tools(["future_tool"])
            .build();
        // Builder does not validate the name; the narrower simply won't
        // match it.
        assert!(reg.additional_tools.contains("future_tool"));
    }

    #[test]
    fn enable_toolset_only_flips_on() {
        let (_, _, tools) = two_toolset_catalog();
        let reg = Registry::builder().tools(tools).toolsets(Some(vec![])).build();
        assert!(!reg.toolset_enabled("ts2"));
        reg.enable_toolset("ts2").expect("ts2 is declared");
        assert!(reg.toolset_enabled("ts2"));
        // Repeat enable is a no-op, and clones observe the shared state.
        let clone = reg.clone();
        reg.enable_toolset("ts2").expect("still declared");
        assert!(clone.toolset_enabled("ts2"));
    }

    #[test]
    fn enable_unknown_toolset_errors() {
        let (_, _, tools) = two_toolset_catalog();
        let reg = Registry::builder().tools(tools).build();
        assert!(matches!(
            reg.enable_toolset("ghost"),
            Err(ToolError::NotFound(_))
        ));
    }

    #[test]
    fn resolve_alias_is_idempotent() {
        let (_, _, tools) = two_toolset_catalog();
        let reg = Registry::builder()
            .tools(tools)
            .aliases([("old_a".to_string(), "a_tool".to_string())])
            .build();
        let once = reg.resolve_alias("old_a");
        assert_eq!(once, "a_tool");
        assert_eq!(reg.resolve_alias(&once), "a_tool");
    }

    #[test]
    fn instructions_come_from_enabled_toolsets_only() {
        let ts1 = Toolset::new("ts1", "first")
            .default_enabled()
            .with_instructions(|| "use ts1 well".to_string())
            .into_arc();
        let ts2 = Toolset::new("ts2", "second")
            .with_instructions(|| "use ts2 well".to_string())
            .into_arc();
        let reg = Registry::builder()
            .tools(vec![tool("a", &ts1), tool("b", &ts2)])
            .toolsets(None)
            .build();
        assert_eq!(reg.instructions().as_deref(), Some("use ts1 well"));

        reg.enable_toolset("ts2").expect("declared");
        assert_eq!(
            reg.instructions().as_deref(),
            Some("use ts1 well\n\nuse ts2 well")
        );
    }

    #[test]
    fn toolset_states_are_sorted() {
        let (_, _, tools) = two_toolset_catalog();
        let reg = Registry::builder().tools(tools).toolsets(None).build();
        assert_eq!(
            reg.toolset_states(),
            vec![("ts1".to_string(), true), ("ts2".to_string(), false)]
        );
    }
}
