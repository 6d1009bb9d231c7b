//! Driver trait used by the UI flows.

use super::error::AppiumError;
use std::fmt::{self, Display, Formatter};

/// Element lookup strategy.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum By {
    XPath(String),
    /// Android resource id, e.g. `org.telegram.messenger.web:id/title`.
    Id(String),
    ClassName(String),
}

impl By {
    pub fn xpath(xpath: impl Into<String>) -> Self {
        Self::XPath(xpath.into())
    }

    pub fn id(id: impl Into<String>) -> Self {
        Self::Id(id.into())
    }

    pub fn class_name(class: impl Into<String>) -> Self {
        Self::ClassName(class.into())
    }

    /// W3C `using` value.
    pub fn strategy(&self) -> &'static str {
        match self {
            Self::XPath(_) => "xpath",
            Self::Id(_) => "id",
            Self::ClassName(_) => "class name",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Self::XPath(v) | Self::Id(v) | Self::ClassName(v) => v,
        }
    }
}

impl Display for By {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.strategy(), self.value())
    }
}

/// Opaque WebDriver element reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementId(String);

impl ElementId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ElementId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Minimal set of UI commands the registration and login flows need.
///
/// [`AppiumDriver`](super::AppiumDriver) talks to a real device; tests use
/// scripted fakes.
#[allow(async_fn_in_trait)]
pub trait UiDriver {
    /// All elements matching `by`; empty when none match.
    async fn find_elements(&self, by: &By) -> Result<Vec<ElementId>, AppiumError>;

    async fn click(&self, element: &ElementId) -> Result<(), AppiumError>;

    async fn clear(&self, element: &ElementId) -> Result<(), AppiumError>;

    /// Type `text` into the element.
    async fn send_keys(&self, element: &ElementId, text: &str) -> Result<(), AppiumError>;

    /// Visible text of the element.
    async fn text(&self, element: &ElementId) -> Result<String, AppiumError>;

    /// PNG screenshot of the current screen.
    async fn screenshot(&self) -> Result<Vec<u8>, AppiumError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_by_strategy() {
        assert_eq!(By::xpath("//a").strategy(), "xpath");
        assert_eq!(By::class_name("android.widget.TextView").strategy(), "class name");
        assert_eq!(By::id("x:id/y").to_string(), "id=x:id/y");
    }
}
