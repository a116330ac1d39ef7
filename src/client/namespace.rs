use serde::{Deserialize, Serialize};
use std::fmt;

/// The user/app context a REST resource is addressed under.
///
/// With both owner and app set, resources live under `servicesNS/{owner}/{app}`;
/// otherwise under the default `services` root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespace {
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub app: Option<String>,
}

impl Namespace {
    pub fn new(owner: impl Into<String>, app: impl Into<String>) -> Self {
        Self {
            owner: Some(owner.into()),
            app: Some(app.into()),
        }
    }

    pub fn is_default(&self) -> bool {
        self.owner.is_none() || self.app.is_none()
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.owner, &self.app) {
            (Some(owner), Some(app)) => write!(f, "servicesNS/{}/{}", owner, app),
            _ => write!(f, "services"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_namespace() {
        assert_eq!(Namespace::default().to_string(), "services");
        assert!(Namespace::default().is_default());
    }

    #[test]
    fn test_owner_app_namespace() {
        let ns = Namespace::new("nobody", "search");
        assert_eq!(ns.to_string(), "servicesNS/nobody/search");
        assert!(!ns.is_default());
    }

    #[test]
    fn test_partial_namespace_falls_back_to_default() {
        let ns = Namespace {
            owner: Some("admin".to_string()),
            app: None,
        };
        assert_eq!(ns.to_string(), "services");
    }
}
