//! Bubble departure diameter.

use super::WallConditions;
use cf_config::{ConfigError, ConfigResult, Dict};
use cf_core::{Length, m};
use cf_registry::{ModelFamily, register_model};

/// Diameter at which bubbles leave the wall [m].
pub trait DepartureDiameterModel: Send {
    fn type_name(&self) -> &'static str;

    fn departure_diameter(&self, wall: &WallConditions) -> f64;

    fn read_coeffs(&mut self, dict: &Dict) -> ConfigResult<bool>;
}

pub struct DepartureDiameterModels;

impl ModelFamily for DepartureDiameterModels {
    const NAME: &'static str = "departureDiameterModel";
    type Model = dyn DepartureDiameterModel;
    type Context = ();
}

/// Tolubinski and Kostanchuk (1970): d = dRef exp(-dTsub / 45 K), clipped to
/// [dMin, dMax].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TolubinskiKostanchuk {
    pub d_ref: Length,
    pub d_max: Length,
    pub d_min: Length,
}

impl TolubinskiKostanchuk {
    pub fn new(dict: &Dict) -> ConfigResult<Self> {
        let d_ref: f64 = dict.lookup_or("dRef", 6.0e-4)?;
        let d_max: f64 = dict.lookup_or("dMax", 0.0014)?;
        let d_min: f64 = dict.lookup_or("dMin", 1.0e-6)?;
        if !(d_min > 0.0 && d_min <= d_max && d_ref > 0.0) {
            return Err(ConfigError::BadValue {
                dict: dict.path().to_string(),
                key: "dMin".to_string(),
                reason: format!("need 0 < dMin <= dMax and dRef > 0, got {d_min}, {d_max}, {d_ref}"),
            });
        }
        Ok(Self {
            d_ref: m(d_ref),
            d_max: m(d_max),
            d_min: m(d_min),
        })
    }
}

impl DepartureDiameterModel for TolubinskiKostanchuk {
    fn type_name(&self) -> &'static str {
        "TolubinskiKostanchuk"
    }

    fn departure_diameter(&self, wall: &WallConditions) -> f64 {
        (self.d_ref.value * (-wall.subcooling() / 45.0).exp())
            .clamp(self.d_min.value, self.d_max.value)
    }

    fn read_coeffs(&mut self, dict: &Dict) -> ConfigResult<bool> {
        let next = Self::new(dict)?;
        let changed = next != *self;
        *self = next;
        Ok(changed)
    }
}

fn tolubinski_kostanchuk(dict: &Dict, _ctx: &()) -> ConfigResult<Box<dyn DepartureDiameterModel>> {
    Ok(Box::new(TolubinskiKostanchuk::new(dict)?))
}

register_model!(DepartureDiameterModels, "TolubinskiKostanchuk", tolubinski_kostanchuk);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wall_boiling::water_at_one_bar;

    #[test]
    fn saturated_liquid_gives_reference_diameter() {
        let model = TolubinskiKostanchuk::new(&Dict::new("d")).unwrap();
        let wall = WallConditions {
            t_liquid: 373.15,
            ..water_at_one_bar()
        };
        assert!((model.departure_diameter(&wall) - 6.0e-4).abs() < 1e-15);
    }

    #[test]
    fn superheated_liquid_is_clipped() {
        let model = TolubinskiKostanchuk::new(&Dict::new("d")).unwrap();
        let wall = WallConditions {
            t_liquid: 420.0,
            ..water_at_one_bar()
        };
        assert_eq!(model.departure_diameter(&wall), 0.0014);
    }

    #[test]
    fn subcooling_shrinks_bubbles() {
        let model = TolubinskiKostanchuk::new(&Dict::new("d")).unwrap();
        assert!(model.departure_diameter(&water_at_one_bar()) < 6.0e-4);
    }
}
