//! Navigation targets and capability

use crate::error::NavigationError;
use std::fmt::{self, Display, Formatter};
use url::Url;

/// Query parameter carrying the pre-filled email on the checkout page
pub const PREFILLED_EMAIL_PARAM: &str = "prefilled_email";

/// Where a page sends the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Relative page route
    Route(String),
    /// Absolute external URL
    External(Url),
}

impl Destination {
    /// Relative route destination
    #[inline]
    pub fn route(path: impl Into<String>) -> Self {
        Self::Route(path.into())
    }

    /// Absolute URL destination
    ///
    /// # Errors
    /// Returns [`NavigationError::InvalidUrl`] if `raw` does not parse.
    pub fn external(raw: &str) -> Result<Self, NavigationError> {
        Url::parse(raw)
            .map(Self::External)
            .map_err(|source| NavigationError::InvalidUrl {
                url: raw.to_string(),
                source,
            })
    }

    /// Checkout handoff with the email pre-filled
    ///
    /// The email is URL-encoded into the `prefilled_email` parameter; a
    /// missing email leaves the parameter empty.
    ///
    /// # Errors
    /// Returns [`NavigationError::InvalidUrl`] if `payment_url` does not
    /// parse.
    pub fn payment_handoff(payment_url: &str, email: Option<&str>) -> Result<Self, NavigationError> {
        Url::parse_with_params(payment_url, [(PREFILLED_EMAIL_PARAM, email.unwrap_or_default())])
            .map(Self::External)
            .map_err(|source| NavigationError::InvalidUrl {
                url: payment_url.to_string(),
                source,
            })
    }

    /// True for external URLs
    #[inline]
    #[must_use]
    pub fn is_external(&self) -> bool {
        matches!(self, Self::External(_))
    }
}

impl Display for Destination {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Route(path) => f.write_str(path),
            Self::External(url) => f.write_str(url.as_str()),
        }
    }
}

/// Navigation capability
pub trait Navigator: Send + Sync {
    /// Leave the current page for `destination`
    fn go_to(&self, destination: &Destination);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handoff_encodes_email() {
        let destination = Destination::payment_handoff(
            "https://checkout.example.com/b/abc",
            Some("ada+funnel@example.com"),
        )
        .unwrap();
        assert_eq!(
            destination.to_string(),
            "https://checkout.example.com/b/abc?prefilled_email=ada%2Bfunnel%40example.com"
        );
        assert!(destination.is_external());
    }

    #[test]
    fn handoff_without_email_leaves_param_empty() {
        let destination =
            Destination::payment_handoff("https://checkout.example.com/b/abc", None).unwrap();
        assert_eq!(
            destination.to_string(),
            "https://checkout.example.com/b/abc?prefilled_email="
        );
    }

    #[test]
    fn invalid_url_rejected() {
        let err = Destination::external("/relative").unwrap_err();
        assert!(matches!(err, NavigationError::InvalidUrl { .. }));
        assert!(Destination::payment_handoff("nope", None).is_err());
    }

    #[test]
    fn route_display() {
        let destination = Destination::route("/signup-Zba2");
        assert_eq!(destination.to_string(), "/signup-Zba2");
        assert!(!destination.is_external());
    }
}
