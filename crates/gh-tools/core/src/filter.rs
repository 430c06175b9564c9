//! The per-request filter pipeline.
//!
//! For tools the gates run in a fixed order: per-item predicate, feature
//! flags, read-only policy, custom filters, toolset gate. The early steps
//! are pure and cheap; custom filters may consult caller identity. The
//! pipeline never mutates the registry and is applied identically to full
//! and narrowed views.

use crate::catalog::{ServerPrompt, ServerResourceTemplate, ServerTool};
use crate::context::RequestContext;
use crate::registry::Registry;
use tracing::warn;

impl Registry {
    /// Every tool the caller may currently see, in canonical
    /// `(toolset-id, name)` order.
    pub fn available_tools(&self, ctx: &RequestContext) -> Vec<ServerTool> {
        self.tools
            .iter()
            .filter(|tool| self.tool_available(ctx, tool))
            .cloned()
            .collect()
    }

    /// Resource templates visible to the caller: feature flags and toolset
    /// gate only.
    pub fn available_resource_templates(&self, ctx: &RequestContext) -> Vec<ServerResourceTemplate> {
        self.resource_templates
            .iter()
            .filter(|template| {
                self.flags_allow(
                    ctx,
                    &template.spec.name,
                    template.feature_flag_enable.as_deref(),
                    template.feature_flag_disable.as_deref(),
                ) && self.toolset_gate_allows(None, &template.toolset.id)
            })
            .cloned()
            .collect()
    }

    /// Prompts visible to the caller: feature flags and toolset gate only.
    pub fn available_prompts(&self, ctx: &RequestContext) -> Vec<ServerPrompt> {
        self.prompts
            .iter()
            .filter(|prompt| {
                self.flags_allow(
                    ctx,
                    &prompt.spec.name,
                    prompt.feature_flag_enable.as_deref(),
                    prompt.feature_flag_disable.as_deref(),
                ) && self.toolset_gate_allows(None, &prompt.toolset.id)
            })
            .cloned()
            .collect()
    }

    fn tool_available(&self, ctx: &RequestContext, tool: &ServerTool) -> bool {
        // 1. Per-item predicate; errors hide the tool.
        if let Some(enabled) = &tool.enabled {
            match enabled(ctx) {
                Ok(true) => {}
                Ok(false) => return false,
                Err(err) => {
                    warn!(tool = %tool.spec.name, error = %err, "enabled predicate failed, hiding tool");
                    return false;
                }
            }
        }

        // 2. Feature flags. Disable wins when both are set and both true.
        if !self.flags_allow(
            ctx,
            &tool.spec.name,
            tool.feature_flag_enable.as_deref(),
            tool.feature_flag_disable.as_deref(),
        ) {
            return false;
        }

        // 3. Read-only policy.
        if self.read_only && !tool.is_read_only() {
            return false;
        }

        // 4. Custom filters in registration order.
        for filter in self.custom_filters.iter() {
            match filter(ctx, tool) {
                Ok(true) => {}
                Ok(false) => return false,
                Err(err) => {
                    warn!(tool = %tool.spec.name, error = %err, "custom filter failed, hiding tool");
                    return false;
                }
            }
        }

        // 5. Toolset gate, with the additional-tools bypass.
        self.toolset_gate_allows(Some(&tool.spec.name), &tool.toolset.id)
    }

    fn flags_allow(
        &self,
        ctx: &RequestContext,
        item: &str,
        enable: Option<&str>,
        disable: Option<&str>,
    ) -> bool {
        if let Some(flag) = enable {
            match self.resolve_flag(ctx, flag) {
                Ok(true) => {}
                Ok(false) => return false,
                Err(err) => {
                    warn!(item, flag, error = %err, "feature flag resolver failed, hiding item");
                    return false;
                }
            }
        }
        if let Some(flag) = disable {
            match self.resolve_flag(ctx, flag) {
                Ok(false) => {}
                Ok(true) => return false,
                Err(err) => {
                    warn!(item, flag, error = %err, "feature flag resolver failed, hiding item");
                    return false;
                }
            }
        }
        true
    }

    /// A missing resolver means no flag can evaluate true.
    fn resolve_flag(&self, ctx: &RequestContext, flag: &str) -> Result<bool, crate::ToolError> {
        match &self.flag_resolver {
            Some(resolver) => resolver(ctx, flag),
            None => Ok(false),
        }
    }

    fn toolset_gate_allows(&self, tool_name: Option<&str>, toolset_id: &str) -> bool {
        if let Some(name) = tool_name
            && self.additional_tools.contains(name)
        {
            return true;
        }
        match &self.enabled_toolsets {
            None => true,
            Some(map) => map.is_enabled(toolset_id),
        }
    }
}
