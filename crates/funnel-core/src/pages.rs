//! The standard four-page signup funnel

use crate::config::{FunnelConfig, RouteTable};
use crate::page::{FieldSpec, PageRole, PageSpec, Step};
use crate::validator::ValidationPolicy;
use funnel_record::BUSINESS_KEY_FIELD;

/// Page 1: the trust name, which becomes the business key
#[must_use]
pub fn trust_name_page(routes: &RouteTable) -> PageSpec {
    PageSpec::new(1, "trust name", PageRole::Origin, Step::route(&routes.primary_contact))
        .with_field(FieldSpec::scalar(BUSINESS_KEY_FIELD))
        .with_required_message("Error: Trust Name is required.")
        .with_inline_errors()
}

/// Page 2: primary contact names
#[must_use]
pub fn primary_contact_page(routes: &RouteTable) -> PageSpec {
    PageSpec::new(
        2,
        "primary contact",
        PageRole::Continuation,
        Step::route(&routes.contact_details),
    )
    .with_field(FieldSpec::scalar("firstName"))
    .with_field(FieldSpec::scalar("lastName"))
    .with_required_message("Error: Both First Name and Last Name are required.")
    .with_back(Step::route(&routes.trust_name))
}

/// Page 3: primary email and postal address
#[must_use]
pub fn contact_details_page(routes: &RouteTable) -> PageSpec {
    PageSpec::new(
        3,
        "contact details",
        PageRole::Continuation,
        Step::route(&routes.secondary_contact),
    )
    .with_field(FieldSpec::scalar("email"))
    .with_field(FieldSpec::structured("address"))
    .with_required_message("Error: Both Email and Address are required.")
    .with_back(Step::route(&routes.primary_contact))
}

/// Page 4: optional secondary contact, then checkout
///
/// Validation is advisory here: navigation is always allowed.
#[must_use]
pub fn secondary_contact_page(routes: &RouteTable) -> PageSpec {
    PageSpec::new(4, "secondary contact", PageRole::Continuation, Step::PaymentHandoff)
        .with_field(FieldSpec::scalar("firstName2"))
        .with_field(FieldSpec::scalar("lastName2"))
        .with_field(FieldSpec::scalar("email2"))
        .with_field(FieldSpec::structured("address2"))
        .with_policy(ValidationPolicy::Advisory)
        .with_back(Step::route(&routes.contact_details))
        .with_skip(Step::PaymentHandoff)
}

/// Ordered set of funnel pages
#[derive(Debug, Clone)]
pub struct FunnelPlan {
    pages: Vec<PageSpec>,
}

impl FunnelPlan {
    /// The standard four-page funnel
    #[must_use]
    pub fn standard(config: &FunnelConfig) -> Self {
        let routes = &config.routes;
        Self {
            pages: vec![
                trust_name_page(routes),
                primary_contact_page(routes),
                contact_details_page(routes),
                secondary_contact_page(routes),
            ],
        }
    }

    /// Page by 1-based number
    #[must_use]
    pub fn page(&self, number: u8) -> Option<&PageSpec> {
        self.pages.iter().find(|page| page.number == number)
    }

    /// Every page in order
    #[inline]
    #[must_use]
    pub fn pages(&self) -> &[PageSpec] {
        &self.pages
    }

    /// Number of pages
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// True when the plan has no pages
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn standard_plan_shape() {
        let plan = FunnelPlan::standard(&FunnelConfig::default());
        assert_eq!(plan.len(), 4);
        assert_eq!(plan.page(1).unwrap().role, PageRole::Origin);
        assert!(plan.pages()[1..].iter().all(|p| p.role == PageRole::Continuation));
        assert_eq!(plan.page(4).unwrap().policy, ValidationPolicy::Advisory);
        assert!(plan.page(5).is_none());
    }

    #[test]
    fn pages_own_disjoint_fields() {
        let plan = FunnelPlan::standard(&FunnelConfig::default());
        let mut seen = HashSet::new();
        for page in plan.pages() {
            for field in &page.fields {
                assert!(seen.insert(field.name.clone()), "{} owned twice", field.name);
            }
        }
    }

    #[test]
    fn routes_chain_pages() {
        let config = FunnelConfig::default();
        let plan = FunnelPlan::standard(&config);
        assert_eq!(plan.page(1).unwrap().next, Step::route("/signup-Zba1"));
        assert_eq!(plan.page(2).unwrap().back, Some(Step::route("/signup-Zba")));
        assert_eq!(plan.page(3).unwrap().next, Step::route("/signup-Zba3"));
        assert_eq!(plan.page(4).unwrap().next, Step::PaymentHandoff);
        assert_eq!(plan.page(4).unwrap().skip, Some(Step::PaymentHandoff));
        assert_eq!(plan.page(1).unwrap().back, None);
    }
}
