use serde::{Deserialize, Serialize};

/// Kind of a link in an authentication chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthLinkType {
    /// The signing address itself; carries no signature.
    Signer,
    /// Signature over the entity id.
    EcdsaSignedEntity,
}

impl AuthLinkType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Signer => "SIGNER",
            Self::EcdsaSignedEntity => "ECDSA_SIGNED_ENTITY",
        }
    }
}

/// One link of an authentication chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthLink {
    #[serde(rename = "type")]
    pub link_type: AuthLinkType,
    pub payload: String,
    #[serde(default)]
    pub signature: String,
}

/// Ordered proof that an address authorised an entity.
///
/// Immutable once built and deliberately not `Clone`: a chain is moved
/// into exactly one upload.
#[derive(Debug, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AuthChain {
    links: Vec<AuthLink>,
}

impl AuthChain {
    /// Builds the two-link chain for a direct signature by `address`
    /// over `entity_id`.
    pub fn simple(entity_id: &str, address: &str, signature: &str) -> Self {
        Self {
            links: vec![
                AuthLink {
                    link_type: AuthLinkType::Signer,
                    payload: address.to_string(),
                    signature: String::new(),
                },
                AuthLink {
                    link_type: AuthLinkType::EcdsaSignedEntity,
                    payload: entity_id.to_string(),
                    signature: signature.to_string(),
                },
            ],
        }
    }

    pub fn links(&self) -> &[AuthLink] {
        &self.links
    }

    /// Address of the signer (payload of the first `SIGNER` link).
    pub fn signer(&self) -> Option<&str> {
        self.links
            .iter()
            .find(|l| l.link_type == AuthLinkType::Signer)
            .map(|l| l.payload.as_str())
    }

    /// Entity id the chain authorises (payload of the last link).
    pub fn entity_id(&self) -> Option<&str> {
        self.links.last().map(|l| l.payload.as_str())
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_chain_shape() {
        let chain = AuthChain::simple("bafyentity", "0xabc", "0xsig");
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.links()[0].link_type, AuthLinkType::Signer);
        assert_eq!(chain.links()[0].payload, "0xabc");
        assert!(chain.links()[0].signature.is_empty());
        assert_eq!(chain.links()[1].link_type, AuthLinkType::EcdsaSignedEntity);
        assert_eq!(chain.links()[1].signature, "0xsig");
        assert_eq!(chain.signer(), Some("0xabc"));
        assert_eq!(chain.entity_id(), Some("bafyentity"));
    }

    #[test]
    fn chain_serializes_as_array() {
        let chain = AuthChain::simple("e1", "0xabc", "0xsig");
        let json = serde_json::to_value(&chain).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"type": "SIGNER", "payload": "0xabc", "signature": ""},
                {"type": "ECDSA_SIGNED_ENTITY", "payload": "e1", "signature": "0xsig"},
            ])
        );
    }
}
