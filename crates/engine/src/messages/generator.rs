use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::rng::FeignRng;

use super::{FakeMessage, FAKE_ERROR_TYPE, GENERIC_CATEGORY};

/// Fills category-specific templates with randomly chosen component values to
/// fabricate realistic-looking error text. Stateless after load apart from its
/// random stream.
pub struct FakeMessageGenerator {
    templates: BTreeMap<String, Vec<String>>,
    components: BTreeMap<String, Vec<String>>,
    rng: FeignRng,
}

impl FakeMessageGenerator {
    pub fn new(rng: FeignRng) -> Self {
        Self {
            templates: BTreeMap::new(),
            components: BTreeMap::new(),
            rng,
        }
    }

    /// Ingests template and component sections from a loaded config,
    /// replacing previously loaded data for the keys present there. Keys not
    /// mentioned by the config survive, so reloads are per-key, not additive.
    pub fn load_from_config(&mut self, config: &EngineConfig) {
        for (category, templates) in &config.templates {
            self.templates.insert(category.clone(), templates.clone());
        }
        for (key, values) in &config.components {
            self.components.insert(key.clone(), values.clone());
        }
        debug!(
            template_categories = self.templates.len(),
            component_keys = self.components.len(),
            "generator loaded templates"
        );
    }

    /// Direct registration, mainly for hosts that assemble templates in code.
    pub fn set_templates(&mut self, category: impl Into<String>, templates: Vec<String>) {
        self.templates.insert(category.into(), templates);
    }

    pub fn set_components(&mut self, key: impl Into<String>, values: Vec<String>) {
        self.components.insert(key.into(), values);
    }

    /// Never fails: an unconfigured category falls back to "generic", and an
    /// empty store yields the hardcoded default message.
    pub fn generate(&mut self, category: &str) -> FakeMessage {
        let not_empty = |templates: &&Vec<String>| !templates.is_empty();
        let template = {
            let pool = self
                .templates
                .get(category)
                .filter(not_empty)
                .or_else(|| self.templates.get(GENERIC_CATEGORY).filter(not_empty));
            match pool {
                Some(pool) => self.rng.pick(pool).cloned(),
                None => None,
            }
        };

        let Some(template) = template else {
            warn!(category, "no templates configured; using the default message");
            return FakeMessage::fallback();
        };

        let text = self.fill_template(&template);
        FakeMessage::new(FAKE_ERROR_TYPE, text)
    }

    pub fn generate_system_message(&mut self) -> FakeMessage {
        self.generate("system")
    }

    pub fn generate_permission_error(&mut self) -> FakeMessage {
        self.generate("permission")
    }

    pub fn generate_dependency_error(&mut self) -> FakeMessage {
        self.generate("dependency")
    }

    pub fn generate_resource_error(&mut self) -> FakeMessage {
        self.generate("resource")
    }

    /// Replaces every `{key}` occurrence for known keys with an independently
    /// drawn candidate. Unknown tokens and keys without candidates are left
    /// verbatim.
    fn fill_template(&mut self, template: &str) -> String {
        let mut text = template.to_string();
        let rng = &mut self.rng;
        for (key, values) in &self.components {
            if values.is_empty() {
                continue;
            }
            let token = format!("{{{key}}}");
            let mut search_from = 0usize;
            while let Some(offset) = text[search_from..].find(&token) {
                let start = search_from + offset;
                let Some(value) = rng.pick(values) else {
                    break;
                };
                let value = value.clone();
                text.replace_range(start..start + token.len(), &value);
                // Resume after the substitution so a value containing the
                // token cannot loop forever.
                search_from = start + value.len();
            }
        }
        text
    }
}
