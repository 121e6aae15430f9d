use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use taxibe_booking::VoitureClass;
use taxibe_core::{Ariary, CooperativeId, DomainError, DomainResult, Entity};
use taxibe_core::error::require_text;

/// A cooperative's configuration: fares, reduction rate and opening cash.
///
/// One per cooperative, keyed by the cooperative id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tarif {
    cooperative_id: CooperativeId,
    nom_cooperative: String,
    logo_url: Option<String>,
    prix_place: Ariary,
    prix_vip: Ariary,
    /// Percentage taken off a reduced fare (children, students...).
    taux_reduction: u8,
    /// Cash on hand before the first monthly closure.
    solde_initial: Ariary,
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TarifSettings {
    pub nom_cooperative: String,
    pub logo_url: Option<String>,
    pub prix_place: Ariary,
    pub prix_vip: Ariary,
    pub taux_reduction: u8,
    pub solde_initial: Ariary,
}

impl Entity for Tarif {
    type Id = CooperativeId;
    const KIND: &'static str = "tarif";

    fn id(&self) -> &CooperativeId {
        &self.cooperative_id
    }

    fn cooperative_id(&self) -> CooperativeId {
        self.cooperative_id
    }
}

impl Tarif {
    pub const DEFAULT_PRIX_PLACE: Ariary = Ariary(20_000);
    pub const DEFAULT_PRIX_VIP: Ariary = Ariary(35_000);

    /// Configuration served until the cooperative saves its own.
    pub fn default_for(cooperative_id: CooperativeId) -> Self {
        Self {
            cooperative_id,
            nom_cooperative: "Coopérative".to_string(),
            logo_url: None,
            prix_place: Self::DEFAULT_PRIX_PLACE,
            prix_vip: Self::DEFAULT_PRIX_VIP,
            taux_reduction: 0,
            solde_initial: Ariary::ZERO,
            updated_at: None,
        }
    }

    pub fn configure(
        cooperative_id: CooperativeId,
        settings: TarifSettings,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if !settings.prix_place.is_positive() {
            return Err(DomainError::field("prix_place", "must be greater than 0"));
        }
        if !settings.prix_vip.is_positive() {
            return Err(DomainError::field("prix_vip", "must be greater than 0"));
        }
        if settings.taux_reduction > 100 {
            return Err(DomainError::field("taux_reduction", "must be between 0 and 100"));
        }
        if settings.solde_initial.amount() < 0 {
            return Err(DomainError::field("solde_initial", "must not be negative"));
        }
        let logo_url = settings
            .logo_url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());

        Ok(Self {
            cooperative_id,
            nom_cooperative: require_text("nom_cooperative", &settings.nom_cooperative, 120)?,
            logo_url,
            prix_place: settings.prix_place,
            prix_vip: settings.prix_vip,
            taux_reduction: settings.taux_reduction,
            solde_initial: settings.solde_initial,
            updated_at: Some(now),
        })
    }

    pub fn nom_cooperative(&self) -> &str {
        &self.nom_cooperative
    }

    pub fn logo_url(&self) -> Option<&str> {
        self.logo_url.as_deref()
    }

    pub fn prix_place(&self) -> Ariary {
        self.prix_place
    }

    pub fn prix_vip(&self) -> Ariary {
        self.prix_vip
    }

    pub fn taux_reduction(&self) -> u8 {
        self.taux_reduction
    }

    pub fn solde_initial(&self) -> Ariary {
        self.solde_initial
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Fare for one seat. Reduced fares lose `taux_reduction` percent,
    /// rounded in the passenger's favour.
    pub fn fare(&self, classe: VoitureClass, reduced: bool) -> Ariary {
        let base = match classe {
            VoitureClass::Regular => self.prix_place,
            VoitureClass::Vip => self.prix_vip,
        };
        if reduced {
            Ariary(base.amount() - base.percent_of(self.taux_reduction).amount())
        } else {
            base
        }
    }
}
