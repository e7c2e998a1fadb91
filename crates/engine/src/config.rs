use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use roxmltree::{Document, Node};
use thiserror::Error;
use tracing::info;

const ROOT_ELEMENT: &str = "FeignConfig";
const TEMPLATE_SECTION_PREFIX: &str = "template_";
const COMPONENTS_SECTION_PREFIX: &str = "components_";
const TUNING_SECTION: &str = "indicator_tuning";
const WEIGHTS_SECTION: &str = "behavior_weights";

pub const DEFAULT_STALL_PROBABILITY: f32 = 0.3;
pub const DEFAULT_JUMP_FACTOR_MIN: f32 = 0.5;
pub const DEFAULT_JUMP_FACTOR_MAX: f32 = 1.5;
pub const DEFAULT_STUCK_AT: f32 = 0.99;
pub const DEFAULT_NESTED_CHILD_COUNT: usize = 2;
pub const DEFAULT_BAR_WIDTH: usize = 40;
pub const DEFAULT_BAR_FILL: char = '=';

/// Tuning knobs for the indicator variants. Every field has a documented
/// default and may be omitted from the `<indicator_tuning>` section.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorTuning {
    /// Probability that an unreliable indicator adds nothing on an update.
    pub stall_probability: f32,
    /// Lower bound of the unreliable jump multiplier applied to the delta.
    pub jump_factor_min: f32,
    /// Upper bound (exclusive) of the unreliable jump multiplier.
    pub jump_factor_max: f32,
    /// Threshold at which a stuck indicator freezes when none is supplied.
    pub default_stuck_at: f32,
    /// Child count for factory-built nested indicators.
    pub nested_child_count: usize,
    /// Rendered bar width in characters.
    pub bar_width: usize,
    /// Rendered bar fill character.
    pub bar_fill: char,
}

impl Default for IndicatorTuning {
    fn default() -> Self {
        Self {
            stall_probability: DEFAULT_STALL_PROBABILITY,
            jump_factor_min: DEFAULT_JUMP_FACTOR_MIN,
            jump_factor_max: DEFAULT_JUMP_FACTOR_MAX,
            default_stuck_at: DEFAULT_STUCK_AT,
            nested_child_count: DEFAULT_NESTED_CHILD_COUNT,
            bar_width: DEFAULT_BAR_WIDTH,
            bar_fill: DEFAULT_BAR_FILL,
        }
    }
}

/// Relative odds used by `IndicatorFactory::create_random`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BehaviorWeights {
    pub reliable: f32,
    pub unreliable: f32,
    pub stuck: f32,
    pub nested: f32,
}

impl Default for BehaviorWeights {
    fn default() -> Self {
        Self {
            reliable: 0.3,
            unreliable: 0.4,
            stuck: 0.2,
            nested: 0.1,
        }
    }
}

/// Loaded configuration: message templates and substitution components keyed
/// by section name, plus variant tuning. Never mutated after load except by
/// re-loading.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub templates: BTreeMap<String, Vec<String>>,
    pub components: BTreeMap<String, Vec<String>>,
    pub tuning: IndicatorTuning,
    pub weights: BehaviorWeights,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed XML in {path} (line {line}, column {column}): {message}")]
    XmlMalformed {
        path: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },
    #[error("root element must be <{ROOT_ELEMENT}>, found <{found}> in {path}")]
    InvalidRoot { path: PathBuf, found: String },
    #[error(
        "unknown section <{section}> in {path}; expected template_<category>, \
components_<key>, <{TUNING_SECTION}> or <{WEIGHTS_SECTION}>"
    )]
    UnknownSection { path: PathBuf, section: String },
    #[error("unknown field <{field}> in <{section}> in {path}")]
    UnknownField {
        path: PathBuf,
        section: String,
        field: String,
    },
    #[error("duplicate field <{field}> in <{section}> in {path}")]
    DuplicateField {
        path: PathBuf,
        section: String,
        field: String,
    },
    #[error("section <{section}> is missing required field <{field}> in {path}")]
    MissingField {
        path: PathBuf,
        section: String,
        field: String,
    },
    #[error("invalid value for <{field}> in <{section}>: {message}")]
    InvalidValue {
        section: String,
        field: String,
        message: String,
    },
}

pub fn load_config(path: &Path) -> Result<EngineConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&raw, path)
}

pub fn parse_config(raw: &str, path: &Path) -> Result<EngineConfig, ConfigError> {
    let doc = Document::parse(raw).map_err(|error| ConfigError::XmlMalformed {
        path: path.to_path_buf(),
        line: error.pos().row as usize,
        column: error.pos().col as usize,
        message: error.to_string(),
    })?;

    let root = doc.root_element();
    if root.tag_name().name() != ROOT_ELEMENT {
        return Err(ConfigError::InvalidRoot {
            path: path.to_path_buf(),
            found: root.tag_name().name().to_string(),
        });
    }

    let mut config = EngineConfig::default();
    for section in root.children().filter(|node| node.is_element()) {
        let section_name = section.tag_name().name();
        if let Some(category) = section_name.strip_prefix(TEMPLATE_SECTION_PREFIX) {
            let lines = multi_line_field(section, section_name, "messages", path)?;
            config.templates.insert(category.to_string(), lines);
        } else if let Some(key) = section_name.strip_prefix(COMPONENTS_SECTION_PREFIX) {
            let lines = multi_line_field(section, section_name, "values", path)?;
            config.components.insert(key.to_string(), lines);
        } else if section_name == TUNING_SECTION {
            parse_tuning_section(section, &mut config.tuning, path)?;
        } else if section_name == WEIGHTS_SECTION {
            parse_weights_section(section, &mut config.weights, path)?;
        } else {
            return Err(ConfigError::UnknownSection {
                path: path.to_path_buf(),
                section: section_name.to_string(),
            });
        }
    }

    info!(
        path = %path.display(),
        template_categories = config.templates.len(),
        component_keys = config.components.len(),
        "engine config loaded"
    );
    Ok(config)
}

/// One entry per non-blank line; surrounding whitespace trimmed.
fn multi_line_field(
    section: Node<'_, '_>,
    section_name: &str,
    field_name: &str,
    path: &Path,
) -> Result<Vec<String>, ConfigError> {
    let mut found: Option<Vec<String>> = None;
    for field in section.children().filter(|child| child.is_element()) {
        let name = field.tag_name().name();
        if name != field_name {
            return Err(ConfigError::UnknownField {
                path: path.to_path_buf(),
                section: section_name.to_string(),
                field: name.to_string(),
            });
        }
        if found.is_some() {
            return Err(ConfigError::DuplicateField {
                path: path.to_path_buf(),
                section: section_name.to_string(),
                field: name.to_string(),
            });
        }
        let text = field.text().unwrap_or_default();
        found = Some(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(ToString::to_string)
                .collect(),
        );
    }

    found.ok_or_else(|| ConfigError::MissingField {
        path: path.to_path_buf(),
        section: section_name.to_string(),
        field: field_name.to_string(),
    })
}

fn parse_tuning_section(
    section: Node<'_, '_>,
    tuning: &mut IndicatorTuning,
    path: &Path,
) -> Result<(), ConfigError> {
    let mut seen = std::collections::HashSet::<String>::new();
    for field in section.children().filter(|child| child.is_element()) {
        let field_name = field.tag_name().name().to_string();
        if !seen.insert(field_name.clone()) {
            return Err(ConfigError::DuplicateField {
                path: path.to_path_buf(),
                section: TUNING_SECTION.to_string(),
                field: field_name,
            });
        }

        match field_name.as_str() {
            "stallProbability" => {
                tuning.stall_probability =
                    unit_interval_value(TUNING_SECTION, &field_name, field_text(field))?;
            }
            "jumpFactorMin" => {
                tuning.jump_factor_min =
                    non_negative_value(TUNING_SECTION, &field_name, field_text(field))?;
            }
            "jumpFactorMax" => {
                tuning.jump_factor_max =
                    non_negative_value(TUNING_SECTION, &field_name, field_text(field))?;
            }
            "defaultStuckAt" => {
                tuning.default_stuck_at =
                    unit_interval_value(TUNING_SECTION, &field_name, field_text(field))?;
            }
            "nestedChildCount" => {
                let raw = field_text(field);
                tuning.nested_child_count =
                    raw.parse::<usize>()
                        .map_err(|_| ConfigError::InvalidValue {
                            section: TUNING_SECTION.to_string(),
                            field: field_name.clone(),
                            message: format!("'{raw}' is not a valid non-negative integer"),
                        })?;
            }
            "barWidth" => {
                let raw = field_text(field);
                let width = raw.parse::<usize>().map_err(|_| ConfigError::InvalidValue {
                    section: TUNING_SECTION.to_string(),
                    field: field_name.clone(),
                    message: format!("'{raw}' is not a valid non-negative integer"),
                })?;
                if width == 0 {
                    return Err(ConfigError::InvalidValue {
                        section: TUNING_SECTION.to_string(),
                        field: field_name,
                        message: "bar width must be >= 1".to_string(),
                    });
                }
                tuning.bar_width = width;
            }
            "barFill" => {
                let raw = field_text(field);
                let mut chars = raw.chars();
                match (chars.next(), chars.next()) {
                    (Some(fill), None) => tuning.bar_fill = fill,
                    _ => {
                        return Err(ConfigError::InvalidValue {
                            section: TUNING_SECTION.to_string(),
                            field: field_name,
                            message: format!("'{raw}' must be exactly one character"),
                        })
                    }
                }
            }
            _ => {
                return Err(ConfigError::UnknownField {
                    path: path.to_path_buf(),
                    section: TUNING_SECTION.to_string(),
                    field: field_name,
                })
            }
        }
    }

    if tuning.jump_factor_max < tuning.jump_factor_min {
        return Err(ConfigError::InvalidValue {
            section: TUNING_SECTION.to_string(),
            field: "jumpFactorMax".to_string(),
            message: format!(
                "jump factor range [{}, {}] is inverted",
                tuning.jump_factor_min, tuning.jump_factor_max
            ),
        });
    }

    Ok(())
}

fn parse_weights_section(
    section: Node<'_, '_>,
    weights: &mut BehaviorWeights,
    path: &Path,
) -> Result<(), ConfigError> {
    let mut seen = std::collections::HashSet::<String>::new();
    for field in section.children().filter(|child| child.is_element()) {
        let field_name = field.tag_name().name().to_string();
        if !seen.insert(field_name.clone()) {
            return Err(ConfigError::DuplicateField {
                path: path.to_path_buf(),
                section: WEIGHTS_SECTION.to_string(),
                field: field_name,
            });
        }

        let value = non_negative_value(WEIGHTS_SECTION, &field_name, field_text(field))?;
        match field_name.as_str() {
            "reliable" => weights.reliable = value,
            "unreliable" => weights.unreliable = value,
            "stuck" => weights.stuck = value,
            "nested" => weights.nested = value,
            _ => {
                return Err(ConfigError::UnknownField {
                    path: path.to_path_buf(),
                    section: WEIGHTS_SECTION.to_string(),
                    field: field_name,
                })
            }
        }
    }
    Ok(())
}

fn field_text(field: Node<'_, '_>) -> String {
    field.text().unwrap_or_default().trim().to_string()
}

fn parse_f32_value(section: &str, field: &str, raw: String) -> Result<f32, ConfigError> {
    let value = raw.parse::<f32>().map_err(|_| ConfigError::InvalidValue {
        section: section.to_string(),
        field: field.to_string(),
        message: format!("'{raw}' is not a valid number"),
    })?;
    if !value.is_finite() {
        return Err(ConfigError::InvalidValue {
            section: section.to_string(),
            field: field.to_string(),
            message: format!("'{raw}' must be finite"),
        });
    }
    Ok(value)
}

fn non_negative_value(section: &str, field: &str, raw: String) -> Result<f32, ConfigError> {
    let value = parse_f32_value(section, field, raw)?;
    if value < 0.0 {
        return Err(ConfigError::InvalidValue {
            section: section.to_string(),
            field: field.to_string(),
            message: format!("{value} must be >= 0"),
        });
    }
    Ok(value)
}

fn unit_interval_value(section: &str, field: &str, raw: String) -> Result<f32, ConfigError> {
    let value = parse_f32_value(section, field, raw)?;
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::InvalidValue {
            section: section.to_string(),
            field: field.to_string(),
            message: format!("{value} must be within [0.0, 1.0]"),
        });
    }
    Ok(value)
}
