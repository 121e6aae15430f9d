use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use taxibe_core::{CooperativeId, DomainError, DomainResult, Entity, RecordId};
use taxibe_core::error::require_text;

/// A passenger known to the cooperative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    id: RecordId,
    cooperative_id: CooperativeId,
    nom: String,
    telephone: Option<String>,
    /// National identity card number (CIN).
    cin: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewClient {
    pub cooperative_id: CooperativeId,
    pub nom: String,
    pub telephone: Option<String>,
    pub cin: Option<String>,
    pub now: DateTime<Utc>,
}

/// Partial update. `Some("")` on an optional field clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientUpdate {
    pub nom: Option<String>,
    pub telephone: Option<String>,
    pub cin: Option<String>,
}

impl Entity for Client {
    type Id = RecordId;
    const KIND: &'static str = "client";

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn cooperative_id(&self) -> CooperativeId {
        self.cooperative_id
    }
}

impl Client {
    pub fn register(cmd: NewClient) -> DomainResult<Self> {
        Ok(Self {
            id: RecordId::new(),
            cooperative_id: cmd.cooperative_id,
            nom: require_text("nom", &cmd.nom, 120)?,
            telephone: cmd.telephone.as_deref().map(normalize_phone).transpose()?.flatten(),
            cin: cmd.cin.as_deref().map(normalize_cin).transpose()?.flatten(),
            created_at: cmd.now,
        })
    }

    pub fn nom(&self) -> &str {
        &self.nom
    }

    pub fn telephone(&self) -> Option<&str> {
        self.telephone.as_deref()
    }

    pub fn cin(&self) -> Option<&str> {
        self.cin.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn update(&mut self, update: ClientUpdate) -> DomainResult<()> {
        let nom = update.nom.as_deref().map(|n| require_text("nom", n, 120)).transpose()?;
        let telephone = update.telephone.as_deref().map(normalize_phone).transpose()?;
        let cin = update.cin.as_deref().map(normalize_cin).transpose()?;

        if let Some(n) = nom {
            self.nom = n;
        }
        if let Some(t) = telephone {
            self.telephone = t;
        }
        if let Some(c) = cin {
            self.cin = c;
        }
        Ok(())
    }
}

/// `Ok(None)` for blank input, which clears the field.
fn normalize_phone(raw: &str) -> DomainResult<Option<String>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let len = trimmed.chars().count();
    let allowed = trimmed
        .chars()
        .enumerate()
        .all(|(i, c)| c.is_ascii_digit() || c == ' ' || (c == '+' && i == 0));
    if !allowed || !(7..=20).contains(&len) {
        return Err(DomainError::field(
            "telephone",
            "must be 7 to 20 characters of digits and spaces, optionally starting with +",
        ));
    }
    Ok(Some(trimmed.to_string()))
}

fn normalize_cin(raw: &str) -> DomainResult<Option<String>> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Ok(None);
    }
    if compact.len() > 20 || !compact.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(DomainError::field("cin", "must be at most 20 letters or digits"));
    }
    Ok(Some(compact))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_client(telephone: Option<&str>) -> DomainResult<Client> {
        Client::register(NewClient {
            cooperative_id: CooperativeId::new(),
            nom: "Rasoanaivo Hanta".into(),
            telephone: telephone.map(String::from),
            cin: Some("101 231 456 789".into()),
            now: Utc::now(),
        })
    }

    #[test]
    fn register_normalizes_contact_fields() {
        let c = new_client(Some(" +261 34 12 345 67 ")).unwrap();
        assert_eq!(c.telephone(), Some("+261 34 12 345 67"));
        assert_eq!(c.cin(), Some("101231456789"));
    }

    #[test]
    fn register_rejects_bad_phone() {
        let err = new_client(Some("034-12-345")).unwrap_err();
        assert!(matches!(err, DomainError::InvalidField { field, .. } if field == "telephone"));
        assert!(new_client(Some("12+3456789")).is_err());
    }

    #[test]
    fn blank_update_clears_optional_field() {
        let mut c = new_client(Some("0341234567")).unwrap();
        c.update(ClientUpdate {
            telephone: Some("  ".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(c.telephone(), None);
        assert_eq!(c.nom(), "Rasoanaivo Hanta");
    }
}
