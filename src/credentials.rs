/// In-memory index over one session's credentials
///
/// Built once from the fetched presentation bundle and never mutated.
/// Lookups return the first match in input order.
use crate::{
    config::HandleMatchPolicy,
    presentation::{CredentialPresentation, CredentialTemplate},
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CredentialIndex {
    credentials: Vec<CredentialPresentation>,
}

impl CredentialIndex {
    pub fn build(credentials: Vec<CredentialPresentation>) -> Self {
        Self { credentials }
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CredentialPresentation> {
        self.credentials.iter()
    }

    /// First credential whose `type[0]` is the template
    pub fn find_by_template(&self, template: CredentialTemplate) -> Option<&CredentialPresentation> {
        self.credentials
            .iter()
            .find(|credential| credential.template() == Some(template))
    }

    /// First credential of the template whose handle claim equals the observed handle
    pub fn find_social_match(
        &self,
        template: CredentialTemplate,
        observed_handle: &str,
    ) -> Option<&CredentialPresentation> {
        self.find_social_match_with(template, observed_handle, HandleMatchPolicy::Exact)
    }

    /// `find_social_match` with an explicit comparison policy
    pub fn find_social_match_with(
        &self,
        template: CredentialTemplate,
        observed_handle: &str,
        policy: HandleMatchPolicy,
    ) -> Option<&CredentialPresentation> {
        let field = template.handle_field()?;

        self.credentials.iter().find(|credential| {
            credential.template() == Some(template)
                && credential
                    .claim(field)
                    .is_some_and(|claimed| policy.matches(claimed, observed_handle))
        })
    }
}
