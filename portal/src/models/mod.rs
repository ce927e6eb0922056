pub mod appointment;
pub mod doctor;
pub mod envelope;
pub mod facility;
pub mod prescription;
pub mod profile;
pub mod report;
pub mod user;

pub use appointment::*;
pub use doctor::*;
pub use envelope::*;
pub use facility::*;
pub use prescription::*;
pub use profile::*;
pub use report::*;
pub use user::*;

use serde::{Deserialize, Deserializer};

/// Treat an explicit `null` like a missing key
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}
