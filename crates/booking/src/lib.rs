//! Booking domain: vehicle departures, their seats and waitlists, and the
//! clients who ride them.
//!
//! Pure domain logic (no IO, no HTTP, no storage).

pub mod client;
pub mod seats;
pub mod voiture;

pub use client::{Client, ClientUpdate, NewClient};
pub use seats::{Occupant, SeatMap, SeatView};
pub use voiture::{
    ReleasedSeat, ScheduleVoiture, Voiture, VoitureClass, VoitureDetailsUpdate, VoitureStatus,
    WaitlistEntry,
};
