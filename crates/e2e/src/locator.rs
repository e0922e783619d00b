//! Element locators and the page map of named aliases

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{E2eError, E2eResult};

/// An element-selection expression.
///
/// Written in scenario files as a prefixed string (`xpath=`, `css=`, `text=`,
/// `role=`, `testid=`, or `@alias`). Anything starting with `/` is XPath and
/// unprefixed strings are CSS.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Locator {
    XPath(String),
    Css(String),
    Text(String),
    Role { role: String, name: Option<String> },
    TestId(String),
    Alias(String),
}

impl Locator {
    pub fn xpath(path: impl Into<String>) -> Self {
        Locator::XPath(path.into())
    }

    pub fn text(text: impl Into<String>) -> Self {
        Locator::Text(text.into())
    }

    pub fn is_alias(&self) -> bool {
        matches!(self, Locator::Alias(_))
    }

    /// Render as a Playwright selector. Aliases must be resolved first.
    pub fn to_selector(&self) -> E2eResult<String> {
        Ok(match self {
            Locator::XPath(path) => format!("xpath={}", path),
            Locator::Css(css) => format!("css={}", css),
            Locator::Text(text) => format!("text={}", text),
            Locator::Role { role, name: Some(name) } => {
                format!("role={}[name=\"{}\"]", role, name.replace('"', "\\\""))
            }
            Locator::Role { role, name: None } => format!("role={}", role),
            Locator::TestId(id) => format!("data-testid={}", id),
            Locator::Alias(name) => return Err(E2eError::UnknownLocator(name.clone())),
        })
    }
}

fn parse_role(body: &str) -> Option<Locator> {
    let body = body.trim();
    let Some(open) = body.find('[') else {
        return (!body.is_empty()).then(|| Locator::Role {
            role: body.to_string(),
            name: None,
        });
    };

    let role = body[..open].trim();
    let filter = body[open..].strip_prefix('[')?.strip_suffix(']')?;
    let value = filter.trim().strip_prefix("name")?.trim_start().strip_prefix('=')?;
    let value = value.trim();
    let quoted = value.strip_prefix('"').and_then(|v| v.strip_suffix('"'));
    let name = quoted.unwrap_or(value).replace("\\\"", "\"");

    if role.is_empty() {
        return None;
    }
    Some(Locator::Role {
        role: role.to_string(),
        name: Some(name),
    })
}

impl FromStr for Locator {
    type Err = E2eError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let s = raw.trim();
        let invalid = || E2eError::InvalidLocator(raw.to_string());

        let locator = if let Some(rest) = s.strip_prefix("xpath=") {
            Locator::XPath(rest.to_string())
        } else if s.starts_with('/') || s.starts_with("(/") {
            Locator::XPath(s.to_string())
        } else if let Some(rest) = s.strip_prefix("css=") {
            Locator::Css(rest.to_string())
        } else if let Some(rest) = s.strip_prefix("text=") {
            Locator::Text(rest.to_string())
        } else if let Some(rest) = s.strip_prefix("role=") {
            parse_role(rest).ok_or_else(invalid)?
        } else if let Some(rest) = s.strip_prefix("testid=") {
            Locator::TestId(rest.to_string())
        } else if let Some(rest) = s.strip_prefix('@') {
            Locator::Alias(rest.to_string())
        } else {
            Locator::Css(s.to_string())
        };

        let empty = match &locator {
            Locator::XPath(v) | Locator::Css(v) | Locator::Text(v) | Locator::TestId(v) | Locator::Alias(v) => {
                v.trim().is_empty()
            }
            Locator::Role { .. } => false,
        };
        if empty {
            return Err(invalid());
        }
        Ok(locator)
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::XPath(path) => write!(f, "xpath={}", path),
            Locator::Css(css) => write!(f, "css={}", css),
            Locator::Text(text) => write!(f, "text={}", text),
            Locator::Role { role, name: Some(name) } => {
                write!(f, "role={}[name=\"{}\"]", role, name.replace('"', "\\\""))
            }
            Locator::Role { role, name: None } => write!(f, "role={}", role),
            Locator::TestId(id) => write!(f, "testid={}", id),
            Locator::Alias(name) => write!(f, "@{}", name),
        }
    }
}

impl TryFrom<String> for Locator {
    type Error = E2eError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Locator> for String {
    fn from(locator: Locator) -> Self {
        locator.to_string()
    }
}

const FORM: &str = "/html/body/div[2]/div[2]/div[2]/form";

/// Named locator aliases for the booking app's pages.
///
/// The defaults are the structural paths observed on the app. They live here
/// and nowhere else so a markup change is a one-line fix (or a `[locators]`
/// override in the config file).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageMap {
    entries: BTreeMap<String, Locator>,
}

impl Default for PageMap {
    fn default() -> Self {
        let mut map = PageMap::empty();

        map.insert("login.email", Locator::xpath(format!("{FORM}/div[1]/input")));
        map.insert("login.password", Locator::xpath(format!("{FORM}/div[2]/input")));
        map.insert("login.submit", Locator::xpath(format!("{FORM}/button")));
        map.insert("login.signup_link", Locator::xpath("/html/body/div[2]/div[2]/div[2]/p/a"));

        map.insert("signup.full_name", Locator::xpath(format!("{FORM}/div[1]/input")));
        map.insert("signup.university_id", Locator::xpath(format!("{FORM}/div[2]/input")));
        map.insert("signup.email", Locator::xpath(format!("{FORM}/div[3]/input")));
        map.insert("signup.password", Locator::xpath(format!("{FORM}/div[4]/input")));
        map.insert("signup.role_group", Locator::xpath(format!("{FORM}/div[5]/div")));
        map.insert("signup.role_student_label", Locator::xpath(format!("{FORM}/div[5]/div/label[1]")));
        map.insert("signup.role_student", Locator::xpath(format!("{FORM}/div[5]/div/label[1]/button")));
        map.insert("signup.role_professor_label", Locator::xpath(format!("{FORM}/div[5]/div/label[2]")));
        map.insert("signup.role_professor", Locator::xpath(format!("{FORM}/div[5]/div/label[2]/button")));
        map.insert("signup.submit", Locator::xpath(format!("{FORM}/button")));
        map.insert("signup.login_link", Locator::xpath("/html/body/div[2]/div[2]/div[2]/p/a"));

        map.insert("notifications", Locator::xpath("/html/body/section"));

        map
    }
}

impl PageMap {
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, locator: Locator) {
        self.entries.insert(name.into(), locator);
    }

    pub fn get(&self, name: &str) -> Option<&Locator> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Locator)> {
        self.entries.iter()
    }

    /// Overlay `overrides` on top of this map.
    pub fn merge(&mut self, overrides: &PageMap) {
        for (name, locator) in &overrides.entries {
            self.entries.insert(name.clone(), locator.clone());
        }
    }

    /// Resolve an alias to a concrete locator; other locators pass through.
    ///
    /// An alias may point at another alias, up to a small depth.
    pub fn resolve(&self, locator: &Locator) -> E2eResult<Locator> {
        let mut current = locator;
        for _ in 0..8 {
            match current {
                Locator::Alias(name) => {
                    current = self
                        .entries
                        .get(name)
                        .ok_or_else(|| E2eError::UnknownLocator(name.clone()))?;
                }
                other => return Ok(other.clone()),
            }
        }
        Err(E2eError::InvalidLocator(format!("alias cycle at {}", locator)))
    }
}
