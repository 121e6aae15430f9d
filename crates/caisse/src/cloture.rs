//! Monthly closure: rolls the cash balance forward one month at a time.
//!
//! `solde_final = solde_initial - total_depenses`, where `solde_initial` is the
//! `solde_final` of the latest earlier closure, or the configured opening
//! cash for the very first one.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use taxibe_core::{Ariary, CooperativeId, DomainError, DomainResult, Entity};

use crate::depense::Depense;
use crate::periode::Periode;
use crate::tarif::Tarif;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClotureMensuelle {
    cooperative_id: CooperativeId,
    periode: Periode,
    solde_initial: Ariary,
    total_depenses: Ariary,
    solde_final: Ariary,
    nb_depenses: u32,
    closed_at: DateTime<Utc>,
}

impl Entity for ClotureMensuelle {
    type Id = Periode;
    const KIND: &'static str = "cloture";

    fn id(&self) -> &Periode {
        &self.periode
    }

    fn cooperative_id(&self) -> CooperativeId {
        self.cooperative_id
    }
}

impl ClotureMensuelle {
    pub fn periode(&self) -> Periode {
        self.periode
    }

    pub fn solde_initial(&self) -> Ariary {
        self.solde_initial
    }

    pub fn total_depenses(&self) -> Ariary {
        self.total_depenses
    }

    pub fn solde_final(&self) -> Ariary {
        self.solde_final
    }

    pub fn nb_depenses(&self) -> u32 {
        self.nb_depenses
    }

    pub fn closed_at(&self) -> DateTime<Utc> {
        self.closed_at
    }
}

/// Close `periode`.
///
/// `closures` are the cooperative's existing closures (any order) and
/// `depenses` may span any months; only those dated in `periode` count.
pub fn close_month(
    cooperative_id: CooperativeId,
    periode: Periode,
    today: NaiveDate,
    tarif: &Tarif,
    closures: &[ClotureMensuelle],
    depenses: &[Depense],
    now: DateTime<Utc>,
) -> DomainResult<ClotureMensuelle> {
    if periode > Periode::of(today) {
        return Err(DomainError::field("month", format!("{periode} has not started yet")));
    }
    if closures.iter().any(|c| c.periode == periode) {
        return Err(DomainError::conflict(format!("{periode} is already closed")));
    }
    if let Some(latest) = closures.iter().map(|c| c.periode).max() {
        if latest > periode {
            return Err(DomainError::invariant(format!(
                "cannot close {periode}: {latest} is already closed"
            )));
        }
    }

    let solde_initial = closures
        .iter()
        .max_by_key(|c| c.periode)
        .map(|c| c.solde_final)
        .unwrap_or_else(|| tarif.solde_initial());

    let in_month: Vec<&Depense> = depenses
        .iter()
        .filter(|d| Entity::cooperative_id(*d) == cooperative_id && d.periode() == periode)
        .collect();
    let total_depenses = Ariary::sum(in_month.iter().map(|d| d.montant()))?;

    Ok(ClotureMensuelle {
        cooperative_id,
        periode,
        solde_initial,
        total_depenses,
        solde_final: solde_initial.checked_sub(total_depenses)?,
        nb_depenses: in_month.len() as u32,
        closed_at: now,
    })
}

/// Expenses dated at or before the latest closed month are frozen. A skipped
/// month behind the latest closure can never be closed, so it is frozen too.
pub fn ensure_month_open(closures: &[ClotureMensuelle], date: NaiveDate) -> DomainResult<()> {
    let periode = Periode::of(date);
    match closures.iter().map(|c| c.periode).max() {
        Some(latest) if latest >= periode => Err(DomainError::conflict(format!(
            "{periode} is frozen: closures run through {latest}; reopen them before changing its expenses"
        ))),
        _ => Ok(()),
    }
}

/// Only the most recent closure can be reopened, so the roll-forward chain
/// never has a hole in the middle.
pub fn ensure_reopenable(closures: &[ClotureMensuelle], periode: Periode) -> DomainResult<()> {
    if !closures.iter().any(|c| c.periode == periode) {
        return Err(DomainError::NotFound);
    }
    match closures.iter().map(|c| c.periode).max() {
        Some(latest) if latest > periode => Err(DomainError::invariant(format!(
            "cannot reopen {periode}: reopen {latest} first"
        ))),
        _ => Ok(()),
    }
}
