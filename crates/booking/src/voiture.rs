use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use taxibe_core::{Ariary, CooperativeId, DomainError, DomainResult, Entity, RecordId};
use taxibe_core::error::require_text;

use crate::seats::{Occupant, SeatMap, SeatView};

/// Vehicle class. Determines seat count and fare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoitureClass {
    Regular,
    Vip,
}

impl VoitureClass {
    pub fn capacity(self) -> u8 {
        match self {
            VoitureClass::Regular => 16,
            VoitureClass::Vip => 10,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            VoitureClass::Regular => "regular",
            VoitureClass::Vip => "vip",
        }
    }
}

impl core::str::FromStr for VoitureClass {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "regular" => Ok(VoitureClass::Regular),
            "vip" => Ok(VoitureClass::Vip),
            _ => Err(DomainError::field("classe", "must be one of: regular, vip")),
        }
    }
}

/// Departure lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoitureStatus {
    Scheduled,
    Departed,
    Cancelled,
}

/// A client waiting for a seat on a full departure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitlistEntry {
    pub client_id: RecordId,
    pub client_nom: String,
    pub reduced: bool,
    pub joined_at: DateTime<Utc>,
}

/// Outcome of freeing a seat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleasedSeat {
    pub seat: u8,
    pub freed: Occupant,
    /// Waitlist head moved into the freed seat, if anyone was waiting.
    pub promoted: Option<Occupant>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleVoiture {
    pub cooperative_id: CooperativeId,
    pub classe: VoitureClass,
    pub immatriculation: String,
    pub chauffeur: String,
    pub destination: String,
    pub depart_at: DateTime<Utc>,
    pub now: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoitureDetailsUpdate {
    pub immatriculation: Option<String>,
    pub chauffeur: Option<String>,
    pub destination: Option<String>,
    pub depart_at: Option<DateTime<Utc>>,
}

/// A scheduled departure (regular 16-seat or VIP 10-seat) with its seat map
/// and waitlist.
///
/// Every seat/waitlist change goes through this type so that a client id
/// appears at most once across seats and waitlist, and the waitlist is only
/// non-empty while the departure is full.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voiture {
    id: RecordId,
    cooperative_id: CooperativeId,
    classe: VoitureClass,
    immatriculation: String,
    chauffeur: String,
    destination: String,
    depart_at: DateTime<Utc>,
    status: VoitureStatus,
    seats: SeatMap,
    waitlist: Vec<WaitlistEntry>,
    created_at: DateTime<Utc>,
}

impl Entity for Voiture {
    type Id = RecordId;
    const KIND: &'static str = "voiture";

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn cooperative_id(&self) -> CooperativeId {
        self.cooperative_id
    }
}

impl Voiture {
    pub fn schedule(cmd: ScheduleVoiture) -> DomainResult<Self> {
        Ok(Self {
            id: RecordId::new(),
            cooperative_id: cmd.cooperative_id,
            classe: cmd.classe,
            immatriculation: normalize_plate(&cmd.immatriculation)?,
            chauffeur: require_text("chauffeur", &cmd.chauffeur, 100)?,
            destination: require_text("destination", &cmd.destination, 100)?,
            depart_at: cmd.depart_at,
            status: VoitureStatus::Scheduled,
            seats: SeatMap::with_capacity(cmd.classe.capacity()),
            waitlist: Vec::new(),
            created_at: cmd.now,
        })
    }

    pub fn classe(&self) -> VoitureClass {
        self.classe
    }

    pub fn immatriculation(&self) -> &str {
        &self.immatriculation
    }

    pub fn chauffeur(&self) -> &str {
        &self.chauffeur
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn depart_at(&self) -> DateTime<Utc> {
        self.depart_at
    }

    pub fn status(&self) -> VoitureStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn seats(&self) -> &SeatMap {
        &self.seats
    }

    pub fn seat_map(&self) -> Vec<SeatView> {
        self.seats.views()
    }

    pub fn waitlist(&self) -> &[WaitlistEntry] {
        &self.waitlist
    }

    pub fn is_full(&self) -> bool {
        self.seats.is_full()
    }

    /// Sum of fares of every occupied seat.
    pub fn revenue(&self) -> DomainResult<Ariary> {
        Ariary::sum(self.seats.occupants().map(|(_, o)| o.fare))
    }

    pub fn update_details(&mut self, update: VoitureDetailsUpdate) -> DomainResult<()> {
        self.ensure_scheduled()?;

        // Validate everything before touching state.
        let plate = update.immatriculation.as_deref().map(normalize_plate).transpose()?;
        let driver = update
            .chauffeur
            .as_deref()
            .map(|v| require_text("chauffeur", v, 100))
            .transpose()?;
        let destination = update
            .destination
            .as_deref()
            .map(|v| require_text("destination", v, 100))
            .transpose()?;

        if let Some(v) = plate {
            self.immatriculation = v;
        }
        if let Some(v) = driver {
            self.chauffeur = v;
        }
        if let Some(v) = destination {
            self.destination = v;
        }
        if let Some(v) = update.depart_at {
            self.depart_at = v;
        }
        Ok(())
    }

    /// Put `occupant` in `seat`, or in the first free seat when `seat` is `None`.
    pub fn assign_seat(&mut self, seat: Option<u8>, occupant: Occupant) -> DomainResult<u8> {
        self.ensure_scheduled()?;
        self.ensure_not_booked(occupant.client_id)?;

        let number = match seat {
            Some(n) => n,
            None => self
                .seats
                .first_free()
                .ok_or_else(|| DomainError::conflict("voiture is full"))?,
        };
        self.seats.occupy(number, occupant)?;
        Ok(number)
    }

    /// Free `seat`. The first waiting client, if any, takes it at the fare
    /// computed by `fare_for`.
    pub fn release_seat<F>(&mut self, seat: u8, now: DateTime<Utc>, fare_for: F) -> DomainResult<ReleasedSeat>
    where
        F: FnOnce(VoitureClass, bool) -> Ariary,
    {
        self.ensure_scheduled()?;
        let freed = self.seats.vacate(seat)?;

        let promoted = if self.waitlist.is_empty() {
            None
        } else {
            let entry = self.waitlist.remove(0);
            let occupant = Occupant {
                client_id: entry.client_id,
                client_nom: entry.client_nom,
                fare: fare_for(self.classe, entry.reduced),
                reduced: entry.reduced,
                booked_at: now,
            };
            self.seats.occupy(seat, occupant.clone())?;
            Some(occupant)
        };

        Ok(ReleasedSeat { seat, freed, promoted })
    }

    /// Queue a client for this departure. Only allowed once every seat is taken.
    pub fn join_waitlist(&mut self, entry: WaitlistEntry) -> DomainResult<usize> {
        self.ensure_scheduled()?;
        self.ensure_not_booked(entry.client_id)?;
        if !self.seats.is_full() {
            return Err(DomainError::conflict(
                "seats are still available; book a seat instead",
            ));
        }
        self.waitlist.push(entry);
        Ok(self.waitlist.len())
    }

    pub fn leave_waitlist(&mut self, client_id: RecordId) -> DomainResult<WaitlistEntry> {
        let pos = self
            .waitlist
            .iter()
            .position(|e| e.client_id == client_id)
            .ok_or(DomainError::NotFound)?;
        Ok(self.waitlist.remove(pos))
    }

    /// Mark the vehicle as gone. Anyone still waiting is dropped.
    pub fn depart(&mut self) -> DomainResult<()> {
        self.ensure_scheduled()?;
        self.status = VoitureStatus::Departed;
        self.waitlist.clear();
        Ok(())
    }

    pub fn cancel(&mut self) -> DomainResult<()> {
        self.ensure_scheduled()?;
        self.status = VoitureStatus::Cancelled;
        self.seats.clear();
        self.waitlist.clear();
        Ok(())
    }

    /// A departure with passengers on board cannot be deleted.
    pub fn ensure_deletable(&self) -> DomainResult<()> {
        match self.seats.occupied_count() {
            0 => Ok(()),
            n => Err(DomainError::conflict(format!(
                "voiture has {n} occupied seat(s); release them or cancel first"
            ))),
        }
    }

    fn ensure_scheduled(&self) -> DomainResult<()> {
        match self.status {
            VoitureStatus::Scheduled => Ok(()),
            VoitureStatus::Departed => Err(DomainError::conflict("voiture has already departed")),
            VoitureStatus::Cancelled => Err(DomainError::conflict("voiture is cancelled")),
        }
    }

    fn ensure_not_booked(&self, client_id: RecordId) -> DomainResult<()> {
        if let Some(seat) = self.seats.seat_of(client_id) {
            return Err(DomainError::conflict(format!("client already holds seat {seat}")));
        }
        if self.waitlist.iter().any(|e| e.client_id == client_id) {
            return Err(DomainError::conflict("client is already on the waitlist"));
        }
        Ok(())
    }
}

fn normalize_plate(raw: &str) -> DomainResult<String> {
    require_text("immatriculation", raw, 20).map(|p| p.to_uppercase())
}
