//! Bubble departure frequency.

use super::WallConditions;
use cf_config::{ConfigError, ConfigResult, Dict};
use cf_core::constants::G0_MPS2;
use cf_registry::{ModelFamily, register_model};

/// Rate at which bubbles leave a nucleation site [1/s].
pub trait DepartureFrequencyModel: Send {
    fn type_name(&self) -> &'static str;

    /// `d_departure` is the departure diameter computed for the same cell.
    fn departure_frequency(&self, wall: &WallConditions, d_departure: f64) -> f64;

    fn read_coeffs(&mut self, dict: &Dict) -> ConfigResult<bool>;
}

pub struct DepartureFrequencyModels;

impl ModelFamily for DepartureFrequencyModels {
    const NAME: &'static str = "departureFrequencyModel";
    type Model = dyn DepartureFrequencyModel;
    type Context = ();
}

/// Cole (1960): f = sqrt(4 g (rhoL - rhoV) / (3 dDep rhoL)).
#[derive(Debug, Clone, Copy, Default)]
pub struct Cole;

impl DepartureFrequencyModel for Cole {
    fn type_name(&self) -> &'static str {
        "Cole"
    }

    fn departure_frequency(&self, wall: &WallConditions, d_departure: f64) -> f64 {
        let drho = (wall.rho_liquid - wall.rho_vapour).abs();
        (4.0 * G0_MPS2 * drho / (3.0 * d_departure * wall.rho_liquid)).sqrt()
    }

    fn read_coeffs(&mut self, _dict: &Dict) -> ConfigResult<bool> {
        Ok(false)
    }
}

/// Kocamustafaogullari and Ishii (1983):
/// f = (Cf / dDep) (sigma g (rhoL - rhoV) / rhoL^2)^1/4.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KocamustafaogullariIshii {
    pub cf: f64,
}

fn read_cf(dict: &Dict) -> ConfigResult<f64> {
    let cf: f64 = dict.lookup_or("Cf", 1.18)?;
    if !(cf.is_finite() && cf > 0.0) {
        return Err(ConfigError::BadValue {
            dict: dict.path().to_string(),
            key: "Cf".to_string(),
            reason: format!("must be positive, got {cf}"),
        });
    }
    Ok(cf)
}

impl KocamustafaogullariIshii {
    pub fn new(dict: &Dict) -> ConfigResult<Self> {
        Ok(Self { cf: read_cf(dict)? })
    }
}

impl DepartureFrequencyModel for KocamustafaogullariIshii {
    fn type_name(&self) -> &'static str {
        "KocamustafaogullariIshii"
    }

    fn departure_frequency(&self, wall: &WallConditions, d_departure: f64) -> f64 {
        let drho = (wall.rho_liquid - wall.rho_vapour).abs();
        (self.cf / d_departure)
            * (wall.sigma * G0_MPS2 * drho / (wall.rho_liquid * wall.rho_liquid)).powf(0.25)
    }

    fn read_coeffs(&mut self, dict: &Dict) -> ConfigResult<bool> {
        let cf = read_cf(dict)?;
        let changed = cf != self.cf;
        self.cf = cf;
        Ok(changed)
    }
}

fn cole(_dict: &Dict, _ctx: &()) -> ConfigResult<Box<dyn DepartureFrequencyModel>> {
    Ok(Box::new(Cole))
}

fn kocamustafaogullari_ishii(
    dict: &Dict,
    _ctx: &(),
) -> ConfigResult<Box<dyn DepartureFrequencyModel>> {
    Ok(Box::new(KocamustafaogullariIshii::new(dict)?))
}

register_model!(DepartureFrequencyModels, "Cole", cole);
register_model!(
    DepartureFrequencyModels,
    "KocamustafaogullariIshii",
    kocamustafaogullari_ishii
);
