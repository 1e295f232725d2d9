//! Configuration for the page enhancements.
//!
//! Every field has a default matching the stock portfolio markup, so an
//! empty JSON object (or no config at all) yields a working setup. The
//! browser entry point reads overrides from an optional
//! `<script type="application/json" id="enhance-config">` element and keeps
//! the defaults, with a warning, when that text does not parse.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::Result;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EnhanceConfig {
    pub theme: ThemeConfig,
    pub panels: PanelConfig,
    pub links: LinkConfig,
    pub accessibility: AccessibilityConfig,
    pub analytics: AnalyticsConfig,
    pub bootstrap: BootstrapConfig,
    /// Maximum `tracing` level forwarded to the console
    pub log_level: String,
}

impl Default for EnhanceConfig {
    fn default() -> Self {
        Self {
            theme: ThemeConfig::default(),
            panels: PanelConfig::default(),
            links: LinkConfig::default(),
            accessibility: AccessibilityConfig::default(),
            analytics: AnalyticsConfig::default(),
            bootstrap: BootstrapConfig::default(),
            log_level: "info".into(),
        }
    }
}

/// Icon class and accessible label shown on the theme toggle.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IconState {
    pub class: String,
    pub label: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    /// Preference store key
    pub storage_key: String,
    /// Attribute set on the document root
    pub attribute: String,
    /// Id of the toggle control
    pub toggle_id: String,
    /// Icon while the dark theme is active (offers light)
    pub dark_icon: IconState,
    /// Icon while the light theme is active (offers dark)
    pub light_icon: IconState,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            storage_key: "theme".into(),
            attribute: "data-theme".into(),
            toggle_id: "theme-toggle".into(),
            dark_icon: IconState {
                class: "fas fa-sun".into(),
                label: "Switch to light mode".into(),
            },
            light_icon: IconState {
                class: "fas fa-adjust".into(),
                label: "Switch to dark mode".into(),
            },
        }
    }
}

/// Markup written into a panel control for each state.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LabelPair {
    pub expanded: String,
    pub collapsed: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    /// Class carried by every description toggle control
    pub control_class: String,
    /// Attribute on the control naming its project
    pub project_attribute: String,
    /// Class carried by every description panel
    pub panel_class: String,
    /// Panel id is `{project}{panel_id_suffix}`
    pub panel_id_suffix: String,
    /// State class marking an expanded panel
    pub expanded_class: String,
    /// Labels for projects without an override
    pub labels: LabelPair,
    /// Per-project labels
    pub overrides: BTreeMap<String, LabelPair>,
}

const HIDE_LABEL: &str = r#"<i class="fas fa-chevron-up"></i> Hide"#;

impl Default for PanelConfig {
    fn default() -> Self {
        let mut overrides = BTreeMap::new();
        // Expanded text is the same as every other project; only the
        // collapsed text differs.
        overrides.insert(
            "research".to_string(),
            LabelPair {
                expanded: HIDE_LABEL.into(),
                collapsed: r#"<i class="fas fa-info-circle"></i> Abstract"#.into(),
            },
        );
        Self {
            control_class: "desc-btn".into(),
            project_attribute: "data-project".into(),
            panel_class: "project-description".into(),
            panel_id_suffix: "-desc".into(),
            expanded_class: "expanded".into(),
            labels: LabelPair {
                expanded: HIDE_LABEL.into(),
                collapsed: r#"<i class="fas fa-info-circle"></i> Desc"#.into(),
            },
            overrides,
        }
    }
}

impl PanelConfig {
    /// Labels used for `project`.
    pub fn labels_for(&self, project: &str) -> &LabelPair {
        self.overrides.get(project).unwrap_or(&self.labels)
    }

    /// Id of the panel belonging to `project`.
    pub fn panel_id(&self, project: &str) -> String {
        format!("{project}{}", self.panel_id_suffix)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// `target` value marking links that open a new browsing context
    pub new_context_target: String,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            new_context_target: "_blank".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AccessibilityConfig {
    /// `KeyboardEvent.key` values that activate a control
    pub activation_keys: Vec<String>,
    pub focus_outline: String,
    pub focus_outline_offset: String,
    /// Root custom property holding the shared transition timing
    pub motion_variable: String,
}

impl Default for AccessibilityConfig {
    fn default() -> Self {
        Self {
            activation_keys: vec!["Enter".into(), " ".into()],
            focus_outline: "2px solid var(--accent-primary)".into(),
            focus_outline_offset: "2px".into(),
            motion_variable: "--transition".into(),
        }
    }
}

impl AccessibilityConfig {
    pub fn is_activation_key(&self, key: &str) -> bool {
        self.activation_keys.iter().any(|k| k == key)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Global function the sink calls, e.g. `gtag`
    pub sink_function: String,
    /// Measurement id passed with page views
    pub measurement_id: String,
    /// `event_category` for interaction events
    pub category: String,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            sink_function: "gtag".into(),
            measurement_id: "G-DZVLQ4YQ5E".into(),
            category: "User Interaction".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Background worker script; empty disables registration
    pub worker_script: String,
    /// Body class added once components are wired
    pub loaded_class: String,
    /// Body class present while the document is hidden
    pub hidden_class: String,
    /// Install the fault reporter before the other components
    pub fault_reporter_first: bool,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            worker_script: "/sw.js".into(),
            loaded_class: "loaded".into(),
            hidden_class: "page-hidden".into(),
            fault_reporter_first: false,
        }
    }
}

impl EnhanceConfig {
    /// Parse a JSON config. Missing fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Configured log level, `INFO` when unrecognised.
    pub fn log_level(&self) -> tracing::Level {
        self.log_level.parse().unwrap_or(tracing::Level::INFO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = EnhanceConfig::default();
        assert_eq!(config.theme.storage_key, "theme");
        assert_eq!(config.theme.toggle_id, "theme-toggle");
        assert_eq!(config.panels.panel_id("ml"), "ml-desc");
        assert_eq!(config.bootstrap.worker_script, "/sw.js");
        assert!(!config.bootstrap.fault_reporter_first);
        assert_eq!(config.log_level(), tracing::Level::INFO);
    }

    #[test]
    fn test_research_labels() {
        let panels = PanelConfig::default();
        let research = panels.labels_for("research");
        let other = panels.labels_for("compiler");

        assert_eq!(research.expanded, other.expanded);
        assert!(research.collapsed.ends_with("Abstract"));
        assert!(other.collapsed.ends_with("Desc"));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = EnhanceConfig::from_json(
            r#"{
                "theme": { "toggle_id": "mode-switch" },
                "analytics": { "measurement_id": "G-TEST" },
                "bootstrap": { "fault_reporter_first": true },
                "log_level": "debug"
            }"#,
        )
        .expect("valid config");

        assert_eq!(config.theme.toggle_id, "mode-switch");
        assert_eq!(config.theme.storage_key, "theme");
        assert_eq!(config.analytics.measurement_id, "G-TEST");
        assert_eq!(config.analytics.category, "User Interaction");
        assert!(config.bootstrap.fault_reporter_first);
        assert_eq!(config.log_level(), tracing::Level::DEBUG);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let err = EnhanceConfig::from_json("{ not json").expect_err("invalid");
        assert!(err.to_string().starts_with("invalid config"));

        let config = EnhanceConfig::from_json("{}").expect("empty object");
        assert_eq!(config.links.new_context_target, "_blank");
        assert_eq!(config.analytics.sink_function, "gtag");
    }

    #[test]
    fn test_unknown_log_level_defaults_to_info() {
        let config = EnhanceConfig::from_json(r#"{ "log_level": "chatty" }"#).expect("valid");
        assert_eq!(config.log_level(), tracing::Level::INFO);
    }

    const THESIS_OVERRIDE: &str = r#"{
        "panels": { "overrides": { "thesis": { "expanded": "Less", "collapsed": "More" } } }
    }"#;

    #[test]
    fn test_override_map_from_json() {
        let config = EnhanceConfig::from_json(THESIS_OVERRIDE).expect("valid config");

        assert_eq!(config.panels.labels_for("thesis").collapsed, "More");
        // Replacing the map drops the default research entry.
        let research = config.panels.labels_for("research");
        assert!(research.collapsed.ends_with("Desc"));
    }

    #[test]
    fn test_activation_keys() {
        let a11y = AccessibilityConfig::default();
        assert!(a11y.is_activation_key("Enter"));
        assert!(a11y.is_activation_key(" "));
        assert!(!a11y.is_activation_key("Tab"));
    }
}
