//! Fixed-size seat map of a departure.
//!
//! Seats are numbered from 1. The map never grows or shrinks after creation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use taxibe_core::{Ariary, DomainError, DomainResult, RecordId};

/// Who sits in a seat, and what they paid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occupant {
    pub client_id: RecordId,
    /// Client name at booking time (printed on the passenger list).
    pub client_nom: String,
    pub fare: Ariary,
    pub reduced: bool,
    pub booked_at: DateTime<Utc>,
}

/// Read-only view of one seat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeatView {
    pub number: u8,
    pub occupied: bool,
    pub occupant: Option<Occupant>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeatMap {
    seats: Vec<Option<Occupant>>,
}

impl SeatMap {
    pub fn with_capacity(capacity: u8) -> Self {
        Self {
            seats: vec![None; capacity as usize],
        }
    }

    pub fn capacity(&self) -> u8 {
        self.seats.len() as u8
    }

    pub fn occupied_count(&self) -> u8 {
        self.seats.iter().filter(|s| s.is_some()).count() as u8
    }

    pub fn free_count(&self) -> u8 {
        self.capacity() - self.occupied_count()
    }

    pub fn is_full(&self) -> bool {
        self.seats.iter().all(Option::is_some)
    }

    /// Lowest-numbered free seat.
    pub fn first_free(&self) -> Option<u8> {
        self.seats
            .iter()
            .position(Option::is_none)
            .map(|idx| idx as u8 + 1)
    }

    /// Seat number held by `client_id`, if any.
    pub fn seat_of(&self, client_id: RecordId) -> Option<u8> {
        self.seats
            .iter()
            .position(|s| s.as_ref().is_some_and(|o| o.client_id == client_id))
            .map(|idx| idx as u8 + 1)
    }

    pub fn get(&self, number: u8) -> DomainResult<Option<&Occupant>> {
        let idx = self.index(number)?;
        Ok(self.seats[idx].as_ref())
    }

    pub fn occupy(&mut self, number: u8, occupant: Occupant) -> DomainResult<()> {
        let idx = self.index(number)?;
        if self.seats[idx].is_some() {
            return Err(DomainError::conflict(format!("seat {number} is already taken")));
        }
        self.seats[idx] = Some(occupant);
        Ok(())
    }

    pub fn vacate(&mut self, number: u8) -> DomainResult<Occupant> {
        let idx = self.index(number)?;
        self.seats[idx].take().ok_or(DomainError::NotFound)
    }

    pub fn clear(&mut self) {
        self.seats.iter_mut().for_each(|s| *s = None);
    }

    pub fn occupants(&self) -> impl Iterator<Item = (u8, &Occupant)> {
        self.seats
            .iter()
            .enumerate()
            .filter_map(|(idx, s)| s.as_ref().map(|o| (idx as u8 + 1, o)))
    }

    pub fn views(&self) -> Vec<SeatView> {
        self.seats
            .iter()
            .enumerate()
            .map(|(idx, s)| SeatView {
                number: idx as u8 + 1,
                occupied: s.is_some(),
                occupant: s.clone(),
            })
            .collect()
    }

    fn index(&self, number: u8) -> DomainResult<usize> {
        if number == 0 || number > self.capacity() {
            return Err(DomainError::field(
                "seat",
                format!("must be between 1 and {}", self.capacity()),
            ));
        }
        Ok(number as usize - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn occupant() -> Occupant {
        Occupant {
            client_id: RecordId::new(),
            client_nom: "Rabe".into(),
            fare: Ariary(20_000),
            reduced: false,
            booked_at: Utc::now(),
        }
    }

    #[test]
    fn first_free_scans_from_seat_one() {
        let mut map = SeatMap::with_capacity(4);
        assert_eq!(map.first_free(), Some(1));
        map.occupy(1, occupant()).unwrap();
        map.occupy(3, occupant()).unwrap();
        assert_eq!(map.first_free(), Some(2));
        map.occupy(2, occupant()).unwrap();
        assert_eq!(map.first_free(), Some(4));
    }

    #[test]
    fn out_of_range_seat_is_a_field_error() {
        let mut map = SeatMap::with_capacity(10);
        assert!(matches!(map.occupy(0, occupant()), Err(DomainError::InvalidField { .. })));
        assert!(matches!(map.occupy(11, occupant()), Err(DomainError::InvalidField { .. })));
    }

    #[test]
    fn vacating_a_free_seat_is_not_found() {
        let mut map = SeatMap::with_capacity(10);
        assert_eq!(map.vacate(5), Err(DomainError::NotFound));
    }

    #[test]
    fn views_cover_every_seat() {
        let mut map = SeatMap::with_capacity(16);
        map.occupy(7, occupant()).unwrap();
        let views = map.views();
        assert_eq!(views.len(), 16);
        assert!(views[6].occupied);
        assert_eq!(views.iter().filter(|v| v.occupied).count(), 1);
        assert_eq!(map.free_count(), 15);
    }
}
