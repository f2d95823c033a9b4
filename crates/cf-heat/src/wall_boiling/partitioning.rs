//! Wall heat-flux partitioning: the fraction of the wall wetted by liquid.

use cf_config::{ConfigError, ConfigResult, Dict};
use cf_registry::{ModelFamily, register_model};
use std::f64::consts::PI;

/// Maps the near-wall liquid fraction to the wetted wall fraction in [0, 1].
pub trait PartitioningModel: Send {
    fn type_name(&self) -> &'static str;

    fn wetted_fraction(&self, alpha_liquid: f64) -> f64;

    fn read_coeffs(&mut self, dict: &Dict) -> ConfigResult<bool>;
}

pub struct PartitioningModels;

impl ModelFamily for PartitioningModels {
    const NAME: &'static str = "partitioningModel";
    type Model = dyn PartitioningModel;
    type Context = ();
}

/// Wetted fraction equals the liquid fraction.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhaseFraction;

impl PartitioningModel for PhaseFraction {
    fn type_name(&self) -> &'static str {
        "phaseFraction"
    }

    fn wetted_fraction(&self, alpha_liquid: f64) -> f64 {
        alpha_liquid.clamp(0.0, 1.0)
    }

    fn read_coeffs(&mut self, _dict: &Dict) -> ConfigResult<bool> {
        Ok(false)
    }
}

/// Liquid-fraction bounds shared by the ramp models.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Ramp {
    alpha_liquid0: f64,
    alpha_liquid1: f64,
}

impl Ramp {
    fn read(dict: &Dict) -> ConfigResult<Self> {
        let alpha_liquid1 = dict.lookup_or("alphaLiquid1", 0.2)?;
        let alpha_liquid0 = dict.lookup_or("alphaLiquid0", 0.05)?;
        if !(0.0..=1.0).contains(&alpha_liquid0)
            || !(0.0..=1.0).contains(&alpha_liquid1)
            || alpha_liquid0 >= alpha_liquid1
        {
            return Err(ConfigError::BadValue {
                dict: dict.path().to_string(),
                key: "alphaLiquid0".to_string(),
                reason: format!(
                    "need 0 <= alphaLiquid0 < alphaLiquid1 <= 1, got {alpha_liquid0} and {alpha_liquid1}"
                ),
            });
        }
        Ok(Self {
            alpha_liquid0,
            alpha_liquid1,
        })
    }

    /// Position of `alpha` along the ramp, clamped to [0, 1].
    fn position(&self, alpha: f64) -> f64 {
        ((alpha - self.alpha_liquid0) / (self.alpha_liquid1 - self.alpha_liquid0)).clamp(0.0, 1.0)
    }

    fn update(&mut self, dict: &Dict) -> ConfigResult<bool> {
        let next = Self::read(dict)?;
        let changed = next != *self;
        *self = next;
        Ok(changed)
    }
}

/// Linear ramp between `alphaLiquid0` and `alphaLiquid1`.
#[derive(Debug, Clone, Copy)]
pub struct Linear {
    ramp: Ramp,
}

impl Linear {
    pub fn new(dict: &Dict) -> ConfigResult<Self> {
        Ok(Self {
            ramp: Ramp::read(dict)?,
        })
    }
}

impl PartitioningModel for Linear {
    fn type_name(&self) -> &'static str {
        "linear"
    }

    fn wetted_fraction(&self, alpha_liquid: f64) -> f64 {
        self.ramp.position(alpha_liquid)
    }

    fn read_coeffs(&mut self, dict: &Dict) -> ConfigResult<bool> {
        self.ramp.update(dict)
    }
}

/// Cosine ramp between `alphaLiquid0` and `alphaLiquid1`.
#[derive(Debug, Clone, Copy)]
pub struct Cosine {
    ramp: Ramp,
}

impl Cosine {
    pub fn new(dict: &Dict) -> ConfigResult<Self> {
        Ok(Self {
            ramp: Ramp::read(dict)?,
        })
    }
}

impl PartitioningModel for Cosine {
    fn type_name(&self) -> &'static str {
        "cosine"
    }

    fn wetted_fraction(&self, alpha_liquid: f64) -> f64 {
        0.5 * (1.0 - (PI * self.ramp.position(alpha_liquid)).cos())
    }

    fn read_coeffs(&mut self, dict: &Dict) -> ConfigResult<bool> {
        self.ramp.update(dict)
    }
}

/// Lavieville et al. (2005) exponential partitioning.
#[derive(Debug, Clone, Copy)]
pub struct Lavieville {
    pub alpha_crit: f64,
}

fn read_alpha_crit(dict: &Dict) -> ConfigResult<f64> {
    let alpha_crit: f64 = dict.lookup_or("alphaCrit", 0.2)?;
    if !(alpha_crit > 0.0 && alpha_crit < 1.0) {
        return Err(ConfigError::BadValue {
            dict: dict.path().to_string(),
            key: "alphaCrit".to_string(),
            reason: format!("must lie in (0, 1), got {alpha_crit}"),
        });
    }
    Ok(alpha_crit)
}

impl Lavieville {
    pub fn new(dict: &Dict) -> ConfigResult<Self> {
        Ok(Self {
            alpha_crit: read_alpha_crit(dict)?,
        })
    }
}

impl PartitioningModel for Lavieville {
    fn type_name(&self) -> &'static str {
        "Lavieville"
    }

    fn wetted_fraction(&self, alpha_liquid: f64) -> f64 {
        let ac = self.alpha_crit;
        let alpha = alpha_liquid.clamp(0.0, 1.0);
        if alpha >= ac {
            1.0 - 0.5 * (-20.0 * (alpha - ac)).exp()
        } else {
            0.5 * (alpha / ac).powf(20.0 * ac)
        }
    }

    fn read_coeffs(&mut self, dict: &Dict) -> ConfigResult<bool> {
        let alpha_crit = read_alpha_crit(dict)?;
        let changed = alpha_crit != self.alpha_crit;
        self.alpha_crit = alpha_crit;
        Ok(changed)
    }
}

fn phase_fraction(_dict: &Dict, _ctx: &()) -> ConfigResult<Box<dyn PartitioningModel>> {
    Ok(Box::new(PhaseFraction))
}

fn linear(dict: &Dict, _ctx: &()) -> ConfigResult<Box<dyn PartitioningModel>> {
    Ok(Box::new(Linear::new(dict)?))
}

fn cosine(dict: &Dict, _ctx: &()) -> ConfigResult<Box<dyn PartitioningModel>> {
    Ok(Box::new(Cosine::new(dict)?))
}

fn lavieville(dict: &Dict, _ctx: &()) -> ConfigResult<Box<dyn PartitioningModel>> {
    Ok(Box::new(Lavieville::new(dict)?))
}

register_model!(PartitioningModels, "phaseFraction", phase_fraction);
register_model!(PartitioningModels, "linear", linear);
register_model!(PartitioningModels, "cosine", cosine);
register_model!(PartitioningModels, "Lavieville", lavieville);

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn lavieville_is_continuous_at_critical_fraction() {
        let model = Lavieville { alpha_crit: 0.2 };
        let below = model.wetted_fraction(0.2 - 1e-9);
        let at = model.wetted_fraction(0.2);
        assert!((below - 0.5).abs() < 1e-6);
        assert!((at - 0.5).abs() < 1e-12);
        assert!(model.wetted_fraction(1.0) > 0.99);
    }

    #[test]
    fn ramps_hit_their_ends() {
        let dict = Dict::new("p").with("alphaLiquid0", 0.1).with("alphaLiquid1", 0.3);
        for model in [
            Box::new(Linear::new(&dict).unwrap()) as Box<dyn PartitioningModel>,
            Box::new(Cosine::new(&dict).unwrap()),
        ] {
            assert_eq!(model.wetted_fraction(0.05), 0.0);
            assert_eq!(model.wetted_fraction(0.5), 1.0);
            assert!((model.wetted_fraction(0.2) - 0.5).abs() < 1e-12);
        }
    }

    #[test]
    fn inverted_ramp_is_rejected() {
        let dict = Dict::new("p").with("alphaLiquid0", 0.5).with("alphaLiquid1", 0.3);
        assert!(matches!(Linear::new(&dict), Err(ConfigError::BadValue { .. })));
    }

    #[test]
    fn read_coeffs_detects_change() {
        let mut model = Lavieville::new(&Dict::new("p")).unwrap();
        assert!(!model.read_coeffs(&Dict::new("p").with("alphaCrit", 0.2)).unwrap());
        assert!(model.read_coeffs(&Dict::new("p").with("alphaCrit", 0.3)).unwrap());
    }

    proptest! {
        #[test]
        fn wetted_fraction_is_bounded(alpha in 0.0f64..=1.0, crit in 0.01f64..0.99) {
            let models: [Box<dyn PartitioningModel>; 3] = [
                Box::new(PhaseFraction),
                Box::new(Lavieville { alpha_crit: crit }),
                Box::new(Cosine::new(&Dict::new("p")).unwrap()),
            ];
            for model in &models {
                let f = model.wetted_fraction(alpha);
                prop_assert!((0.0..=1.0).contains(&f), "{} gave {f}", model.type_name());
            }
        }
    }
}
