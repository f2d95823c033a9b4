//! Uniform, constant flame wrinkling.

use crate::model::{XiContext, XiModel, XiModels};
use cf_config::{ConfigError, ConfigResult, Dict};
use cf_mesh::{DistributionMap, MeshAdaptive, MeshMap, MeshResult, ScalarField, TopoChangeMap};
use cf_registry::register_model;

/// Xi fixed to a configured value everywhere.
///
/// ```yaml
/// XiModel:
///   type: uniformConstant
///   Xi: 1.6
/// ```
#[derive(Debug)]
pub struct UniformConstant {
    value: f64,
    field: ScalarField,
}

impl UniformConstant {
    pub const TYPE_NAME: &'static str = "uniformConstant";

    pub fn new(dict: &Dict, ctx: &XiContext) -> ConfigResult<Self> {
        let value = read_xi(dict)?;
        tracing::debug!(Xi = value, n_cells = ctx.n_cells(), "uniformConstant Xi model");
        Ok(Self {
            value,
            field: ScalarField::uniform("Xi", ctx.n_cells(), value),
        })
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    fn refill(&mut self) {
        self.field.fill(self.value);
    }
}

fn read_xi(dict: &Dict) -> ConfigResult<f64> {
    let value: f64 = dict.lookup("Xi")?;
    if !value.is_finite() || value < 1.0 {
        return Err(ConfigError::BadValue {
            dict: dict.path().to_string(),
            key: "Xi".to_string(),
            reason: format!("flame wrinkling must be finite and >= 1, got {value}"),
        });
    }
    Ok(value)
}

fn build(dict: &Dict, ctx: &XiContext) -> ConfigResult<Box<dyn XiModel>> {
    Ok(Box::new(UniformConstant::new(dict, ctx)?))
}

register_model!(XiModels, "uniformConstant", build);

impl XiModel for UniformConstant {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn xi(&self) -> &ScalarField {
        &self.field
    }

    fn correct(&mut self) {}

    fn read_coeffs(&mut self, dict: &Dict) -> ConfigResult<bool> {
        let value = read_xi(dict)?;
        let changed = value != self.value;
        if changed {
            self.value = value;
            self.refill();
        }
        Ok(changed)
    }
}

impl MeshAdaptive for UniformConstant {
    fn topo_change(&mut self, map: &TopoChangeMap) -> MeshResult<()> {
        self.field.resize(map.n_new_cells(), self.value);
        Ok(())
    }

    fn map_mesh(&mut self, map: &MeshMap) -> MeshResult<()> {
        self.field.resize(map.n_new_cells(), self.value);
        Ok(())
    }

    fn distribute(&mut self, map: &DistributionMap) -> MeshResult<()> {
        self.field.resize(map.n_new_cells(), self.value);
        Ok(())
    }
}
