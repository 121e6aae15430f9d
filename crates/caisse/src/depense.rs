use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use taxibe_core::{Ariary, CooperativeId, DomainError, DomainResult, Entity, RecordId};
use taxibe_core::error::require_text;

use crate::periode::Periode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DepenseCategorie {
    Carburant,
    Entretien,
    Salaire,
    Taxe,
    Autre,
}

/// An expense paid out of the cooperative's cash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Depense {
    id: RecordId,
    cooperative_id: CooperativeId,
    libelle: String,
    categorie: DepenseCategorie,
    montant: Ariary,
    date: NaiveDate,
    /// Departure the expense was made for (fuel, road tax...), if any.
    voiture_id: Option<RecordId>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDepense {
    pub cooperative_id: CooperativeId,
    pub libelle: String,
    pub categorie: DepenseCategorie,
    pub montant: Ariary,
    pub date: NaiveDate,
    pub voiture_id: Option<RecordId>,
    pub now: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DepenseUpdate {
    pub libelle: Option<String>,
    pub categorie: Option<DepenseCategorie>,
    pub montant: Option<Ariary>,
    pub date: Option<NaiveDate>,
}

impl Entity for Depense {
    type Id = RecordId;
    const KIND: &'static str = "depense";

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn cooperative_id(&self) -> CooperativeId {
        self.cooperative_id
    }
}

impl Depense {
    pub fn record(cmd: NewDepense) -> DomainResult<Self> {
        ensure_positive(cmd.montant)?;
        ensure_dated(cmd.date)?;
        Ok(Self {
            id: RecordId::new(),
            cooperative_id: cmd.cooperative_id,
            libelle: require_text("libelle", &cmd.libelle, 200)?,
            categorie: cmd.categorie,
            montant: cmd.montant,
            date: cmd.date,
            voiture_id: cmd.voiture_id,
            created_at: cmd.now,
        })
    }

    pub fn libelle(&self) -> &str {
        &self.libelle
    }

    pub fn categorie(&self) -> DepenseCategorie {
        self.categorie
    }

    pub fn montant(&self) -> Ariary {
        self.montant
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn periode(&self) -> Periode {
        Periode::of(self.date)
    }

    pub fn voiture_id(&self) -> Option<RecordId> {
        self.voiture_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn update(&mut self, update: DepenseUpdate) -> DomainResult<()> {
        let libelle = update
            .libelle
            .as_deref()
            .map(|l| require_text("libelle", l, 200))
            .transpose()?;
        if let Some(m) = update.montant {
            ensure_positive(m)?;
        }
        if let Some(d) = update.date {
            ensure_dated(d)?;
        }

        if let Some(l) = libelle {
            self.libelle = l;
        }
        if let Some(c) = update.categorie {
            self.categorie = c;
        }
        if let Some(m) = update.montant {
            self.montant = m;
        }
        if let Some(d) = update.date {
            self.date = d;
        }
        Ok(())
    }
}

fn ensure_positive(montant: Ariary) -> DomainResult<()> {
    if montant.is_positive() {
        Ok(())
    } else {
        Err(DomainError::field("montant", "must be greater than 0"))
    }
}

/// Same year range as a closable `Periode`.
fn ensure_dated(date: NaiveDate) -> DomainResult<()> {
    if (2000..=2100).contains(&date.year()) {
        Ok(())
    } else {
        Err(DomainError::field("date", "year must be between 2000 and 2100"))
    }
}
