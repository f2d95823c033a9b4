//! Active nucleation site density.

use super::WallConditions;
use cf_config::{ConfigError, ConfigResult, Dict};
use cf_registry::{ModelFamily, register_model};

/// Number of active nucleation sites per unit wall area [1/m^2].
pub trait NucleationSiteModel: Send {
    fn type_name(&self) -> &'static str;

    fn site_density(&self, wall: &WallConditions) -> f64;

    fn read_coeffs(&mut self, dict: &Dict) -> ConfigResult<bool>;
}

pub struct NucleationSiteModels;

impl ModelFamily for NucleationSiteModels {
    const NAME: &'static str = "nucleationSiteModel";
    type Model = dyn NucleationSiteModel;
    type Context = ();
}

/// Lemmert and Chawla (1977): N = Cn NRef (dTsup / deltaTRef)^1.805.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LemmertChawla {
    pub cn: f64,
    pub n_ref: f64,
    pub delta_t_ref: f64,
}

impl LemmertChawla {
    pub fn new(dict: &Dict) -> ConfigResult<Self> {
        let model = Self {
            cn: dict.lookup_or("Cn", 1.0)?,
            n_ref: dict.lookup_or("NRef", 9.922e5)?,
            delta_t_ref: dict.lookup_or("deltaTRef", 10.0)?,
        };
        for (key, value) in [
            ("Cn", model.cn),
            ("NRef", model.n_ref),
            ("deltaTRef", model.delta_t_ref),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::BadValue {
                    dict: dict.path().to_string(),
                    key: key.to_string(),
                    reason: format!("must be positive, got {value}"),
                });
            }
        }
        Ok(model)
    }
}

impl NucleationSiteModel for LemmertChawla {
    fn type_name(&self) -> &'static str {
        "LemmertChawla"
    }

    fn site_density(&self, wall: &WallConditions) -> f64 {
        self.cn * self.n_ref * (wall.superheat() / self.delta_t_ref).powf(1.805)
    }

    fn read_coeffs(&mut self, dict: &Dict) -> ConfigResult<bool> {
        let next = Self::new(dict)?;
        let changed = next != *self;
        *self = next;
        Ok(changed)
    }
}

fn lemmert_chawla(dict: &Dict, _ctx: &()) -> ConfigResult<Box<dyn NucleationSiteModel>> {
    Ok(Box::new(LemmertChawla::new(dict)?))
}

register_model!(NucleationSiteModels, "LemmertChawla", lemmert_chawla);
