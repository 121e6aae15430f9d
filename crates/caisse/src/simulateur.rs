//! Cash reconciliation: what the till should hold given the passengers
//! carried and the expenses paid, compared with what was counted.

use serde::{Deserialize, Serialize};

use taxibe_booking::{Voiture, VoitureClass};
use taxibe_core::{Ariary, DomainError, DomainResult, Entity};

use crate::depense::Depense;
use crate::tarif::Tarif;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationInput {
    /// Regular passengers paying the full fare.
    pub nb_places: u32,
    pub nb_vip: u32,
    /// Regular passengers paying the reduced fare.
    pub nb_reduits: u32,
    pub depenses: Ariary,
    pub montant_compte: Option<Ariary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatutCaisse {
    Equilibre,
    Excedent,
    Deficit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Simulation {
    pub input: SimulationInput,
    pub prix_place: Ariary,
    pub prix_vip: Ariary,
    pub prix_reduit: Ariary,
    pub recette_normale: Ariary,
    pub recette_vip: Ariary,
    pub recette_reduite: Ariary,
    pub recette_totale: Ariary,
    pub net_attendu: Ariary,
    pub ecart: Option<Ariary>,
    pub statut: Option<StatutCaisse>,
}

pub fn simulate(tarif: &Tarif, input: SimulationInput) -> DomainResult<Simulation> {
    if input.depenses.amount() < 0 {
        return Err(DomainError::field("depenses", "must not be negative"));
    }
    if input.montant_compte.is_some_and(|m| m.amount() < 0) {
        return Err(DomainError::field("montant_compte", "must not be negative"));
    }

    let prix_place = tarif.fare(VoitureClass::Regular, false);
    let prix_vip = tarif.fare(VoitureClass::Vip, false);
    let prix_reduit = tarif.fare(VoitureClass::Regular, true);

    let recette_normale = prix_place.checked_mul(input.nb_places)?;
    let recette_vip = prix_vip.checked_mul(input.nb_vip)?;
    let recette_reduite = prix_reduit.checked_mul(input.nb_reduits)?;
    let recette_totale = Ariary::sum([recette_normale, recette_vip, recette_reduite])?;
    let net_attendu = recette_totale.checked_sub(input.depenses)?;

    let ecart = input
        .montant_compte
        .map(|compte| compte.checked_sub(net_attendu))
        .transpose()?;
    let statut = ecart.map(|e| match e.amount() {
        0 => StatutCaisse::Equilibre,
        n if n > 0 => StatutCaisse::Excedent,
        _ => StatutCaisse::Deficit,
    });

    Ok(Simulation {
        input,
        prix_place,
        prix_vip,
        prix_reduit,
        recette_normale,
        recette_vip,
        recette_reduite,
        recette_totale,
        net_attendu,
        ecart,
        statut,
    })
}

/// Passenger counts from a departure's seat map, plus the expenses linked to
/// it. Every occupied seat of a VIP departure counts as a VIP passenger.
pub fn input_for_voiture(
    voiture: &Voiture,
    depenses: &[Depense],
    montant_compte: Option<Ariary>,
) -> DomainResult<SimulationInput> {
    let (mut nb_places, mut nb_vip, mut nb_reduits) = (0u32, 0u32, 0u32);
    for (_, occupant) in voiture.seats().occupants() {
        match (voiture.classe(), occupant.reduced) {
            (VoitureClass::Vip, _) => nb_vip += 1,
            (VoitureClass::Regular, true) => nb_reduits += 1,
            (VoitureClass::Regular, false) => nb_places += 1,
        }
    }

    let linked = depenses
        .iter()
        .filter(|d| d.voiture_id().as_ref() == Some(voiture.id()))
        .map(|d| d.montant());

    Ok(SimulationInput {
        nb_places,
        nb_vip,
        nb_reduits,
        depenses: Ariary::sum(linked)?,
        montant_compte,
    })
}
