//! Cash-register ("caisse") domain: fares, expenses, monthly closures and the
//! reconciliation simulator.
//!
//! Pure domain logic; callers load the records and persist the results.

pub mod cloture;
pub mod depense;
pub mod periode;
pub mod simulateur;
pub mod tarif;

pub use cloture::{ClotureMensuelle, close_month, ensure_month_open, ensure_reopenable};
pub use depense::{Depense, DepenseCategorie, DepenseUpdate, NewDepense};
pub use periode::Periode;
pub use simulateur::{Simulation, SimulationInput, StatutCaisse, input_for_voiture, simulate};
pub use tarif::{Tarif, TarifSettings};
