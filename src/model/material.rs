slotmap::new_key_type! {
    /// Unique identifier for a material in the model store.
    pub struct MaterialId;
}

/// Physical constants of a material record.
///
/// Permittivity and permeability are relative values, conductivity is in S/m.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialData {
    /// Display name.
    pub name: String,
    /// Perfect electric conductor.
    pub is_pec: bool,
    /// Relative permittivity.
    pub permittivity: f64,
    /// Relative permeability.
    pub permeability: f64,
    /// Electric conductivity.
    pub conductivity: f64,
}

impl MaterialData {
    /// Creates a dielectric material.
    #[must_use]
    pub fn dielectric(
        name: impl Into<String>,
        permittivity: f64,
        permeability: f64,
        conductivity: f64,
    ) -> Self {
        Self {
            name: name.into(),
            is_pec: false,
            permittivity,
            permeability,
            conductivity,
        }
    }

    /// Vacuum: unit permittivity and permeability, no conductivity.
    #[must_use]
    pub fn vacuum() -> Self {
        Self::dielectric("vacuum", 1.0, 1.0, 0.0)
    }

    /// Perfect electric conductor.
    #[must_use]
    pub fn pec() -> Self {
        Self {
            is_pec: true,
            ..Self::dielectric("PEC", 1.0, 1.0, 0.0)
        }
    }
}
