//! Declarative YAML scenario descriptions

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{E2eError, E2eResult};
use crate::locator::{Locator, PageMap};

/// A complete scenario parsed from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Short identifier, e.g. `TC001`
    pub id: String,

    /// Human-readable name
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Tags for filtering
    #[serde(default)]
    pub tags: Vec<String>,

    /// Page the session opens before the first step
    #[serde(default = "default_start")]
    pub start: String,

    /// Interactions, executed in order
    #[serde(default)]
    pub steps: Vec<Step>,

    /// Checks evaluated in order once every step succeeded
    #[serde(default)]
    pub assertions: Vec<Assertion>,

    /// Validation the app is known to be missing. A failing scenario with
    /// this set is reported as a known defect instead of a failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub known_defect: Option<String>,
}

fn default_start() -> String {
    "/".to_string()
}

/// A single interaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Navigate to a URL (relative to the base URL)
    Navigate { url: String },

    /// Fill an input; an empty value clears it
    Fill { locator: Locator, value: String },

    /// Click an element
    Click { locator: Locator },

    /// Wait until the current URL contains `contains`
    WaitForUrl {
        contains: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_ms: Option<u64>,
    },

    /// Wait for an element to reach a state
    Wait {
        locator: Locator,
        #[serde(default)]
        state: WaitState,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_ms: Option<u64>,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitState {
    #[default]
    Visible,
    Hidden,
    Attached,
    Detached,
}

impl WaitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WaitState::Visible => "visible",
            WaitState::Hidden => "hidden",
            WaitState::Attached => "attached",
            WaitState::Detached => "detached",
        }
    }
}

/// A terminal check on page state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "expect", rename_all = "snake_case")]
pub enum Assertion {
    /// The current URL contains `value` (polled until the timeout)
    UrlContains {
        value: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_ms: Option<u64>,
    },

    /// The current URL never contains `value` during the window
    UrlNotContains {
        value: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_ms: Option<u64>,
    },

    /// `text` is visible, inside `locator` when given, anywhere otherwise
    TextVisible {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        locator: Option<Locator>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_ms: Option<u64>,
    },

    /// No visible element shows `text`
    TextHidden {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_ms: Option<u64>,
    },

    /// The element is visible
    Visible { locator: Locator },

    /// One of the candidates carries `text` in its value or text content
    /// (case-insensitive)
    AnyContains {
        text: String,
        candidates: Vec<Locator>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_ms: Option<u64>,
    },
}

impl Step {
    /// Short name used in logs and reports
    pub fn label(&self) -> String {
        match self {
            Step::Navigate { url } => format!("navigate:{}", url),
            Step::WaitForUrl { contains, .. } => format!("wait_for_url:{}", contains),
            Step::Fill { locator, .. } => format!("fill:{}", locator),
            Step::Click { locator } => format!("click:{}", locator),
            Step::Wait { locator, state, .. } => format!("wait:{}:{}", locator, state.as_str()),
        }
    }

    pub fn locators(&self) -> Vec<&Locator> {
        match self {
            Step::Navigate { .. } | Step::WaitForUrl { .. } => Vec::new(),
            Step::Fill { locator, .. } | Step::Click { locator } | Step::Wait { locator, .. } => {
                vec![locator]
            }
        }
    }

    fn resolved(&self, pages: &PageMap) -> E2eResult<Step> {
        Ok(match self {
            Step::Navigate { .. } | Step::WaitForUrl { .. } => self.clone(),
            Step::Fill { locator, value } => Step::Fill {
                locator: pages.resolve(locator)?,
                value: value.clone(),
            },
            Step::Click { locator } => Step::Click {
                locator: pages.resolve(locator)?,
            },
            Step::Wait { locator, state, timeout_ms } => Step::Wait {
                locator: pages.resolve(locator)?,
                state: *state,
                timeout_ms: *timeout_ms,
            },
        })
    }
}

impl Assertion {
    /// Short name used in logs and reports
    pub fn label(&self) -> String {
        match self {
            Assertion::UrlContains { value, .. } => format!("url_contains:{}", value),
            Assertion::UrlNotContains { value, .. } => format!("url_not_contains:{}", value),
            Assertion::TextVisible { text, locator: Some(locator), .. } => {
                format!("text_visible:{}@{}", text, locator)
            }
            Assertion::TextVisible { text, locator: None, .. } => format!("text_visible:{}", text),
            Assertion::TextHidden { text, .. } => format!("text_hidden:{}", text),
            Assertion::Visible { locator } => format!("visible:{}", locator),
            Assertion::AnyContains { text, candidates, .. } => {
                format!("any_contains:{} ({} candidates)", text, candidates.len())
            }
        }
    }

    pub fn locators(&self) -> Vec<&Locator> {
        match self {
            Assertion::TextVisible { locator: Some(locator), .. } | Assertion::Visible { locator } => {
                vec![locator]
            }
            Assertion::AnyContains { candidates, .. } => candidates.iter().collect(),
            _ => Vec::new(),
        }
    }

    fn resolved(&self, pages: &PageMap) -> E2eResult<Assertion> {
        Ok(match self {
            Assertion::TextVisible { text, locator, timeout_ms } => Assertion::TextVisible {
                text: text.clone(),
                locator: locator.as_ref().map(|l| pages.resolve(l)).transpose()?,
                timeout_ms: *timeout_ms,
            },
            Assertion::Visible { locator } => Assertion::Visible {
                locator: pages.resolve(locator)?,
            },
            Assertion::AnyContains { text, candidates, timeout_ms } => Assertion::AnyContains {
                text: text.clone(),
                timeout_ms: *timeout_ms,
                candidates: candidates
                    .iter()
                    .map(|l| pages.resolve(l))
                    .collect::<E2eResult<Vec<_>>>()?,
            },
            other => other.clone(),
        })
    }
}

impl Scenario {
    /// Parse a scenario from YAML string
    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        serde_yaml::from_str(yaml).map_err(E2eError::from)
    }

    /// Parse a scenario from a YAML file
    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
            .map_err(|e| E2eError::ScenarioParse(format!("{}: {}", path.display(), e)))
    }

    /// Load all scenarios from a directory, ordered by file name
    pub fn load_all(dir: &Path) -> E2eResult<Vec<Self>> {
        if !dir.is_dir() {
            return Err(E2eError::ScenarioParse(format!(
                "not a directory: {}",
                dir.display()
            )));
        }

        let mut scenarios = Vec::new();

        for entry in walkdir::WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
        {
            scenarios.push(Self::from_file(entry.path())?);
        }

        Ok(scenarios)
    }

    /// Filter scenarios by tag
    pub fn filter_by_tag<'a>(scenarios: &'a [Self], tag: &str) -> Vec<&'a Self> {
        scenarios.iter().filter(|s| s.has_tag(tag)).collect()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Check the scenario is runnable against `pages`
    pub fn validate(&self, pages: &PageMap) -> E2eResult<()> {
        if self.id.trim().is_empty() {
            return Err(E2eError::ScenarioParse(format!(
                "scenario '{}' has an empty id",
                self.name
            )));
        }
        if self.steps.is_empty() && self.assertions.is_empty() {
            return Err(E2eError::ScenarioParse(format!(
                "{}: no steps and no assertions",
                self.id
            )));
        }
        let empty_search = self.assertions.iter().any(
            |a| matches!(a, Assertion::AnyContains { candidates, .. } if candidates.is_empty()),
        );
        if empty_search {
            return Err(E2eError::ScenarioParse(format!(
                "{}: any_contains needs at least one candidate",
                self.id
            )));
        }

        let locators = self
            .steps
            .iter()
            .flat_map(Step::locators)
            .chain(self.assertions.iter().flat_map(Assertion::locators));
        for locator in locators {
            pages.resolve(locator)?;
        }
        Ok(())
    }

    /// Copy of this scenario with every alias replaced by its locator
    pub fn resolved(&self, pages: &PageMap) -> E2eResult<Scenario> {
        Ok(Scenario {
            steps: self
                .steps
                .iter()
                .map(|s| s.resolved(pages))
                .collect::<E2eResult<Vec<_>>>()?,
            assertions: self
                .assertions
                .iter()
                .map(|a| a.resolved(pages))
                .collect::<E2eResult<Vec<_>>>()?,
            ..self.clone()
        })
    }

    /// Reject duplicate ids across a suite
    pub fn ensure_unique_ids(scenarios: &[Scenario]) -> E2eResult<()> {
        let mut seen = HashSet::new();
        for scenario in scenarios {
            if !seen.insert(scenario.id.as_str()) {
                return Err(E2eError::ScenarioParse(format!(
                    "duplicate scenario id {}",
                    scenario.id
                )));
            }
        }
        Ok(())
    }
}
