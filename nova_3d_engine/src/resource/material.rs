//! Surface material: two textures and the specular scalars

use std::fmt;
use std::sync::Arc;
use crate::graphics_device::Texture;
use crate::resource::uniform::MaterialUniform;

pub struct Material {
    name: String,
    diffuse: Arc<dyn Texture>,
    specular: Arc<dyn Texture>,
    shininess: f32,
    specular_strength: f32,
}

impl Material {
    pub fn new(
        name: impl Into<String>,
        diffuse: Arc<dyn Texture>,
        specular: Arc<dyn Texture>,
        shininess: f32,
        specular_strength: f32,
    ) -> Self {
        Self {
            name: name.into(),
            diffuse,
            specular,
            shininess,
            specular_strength,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn diffuse(&self) -> &Arc<dyn Texture> {
        &self.diffuse
    }

    pub fn specular(&self) -> &Arc<dyn Texture> {
        &self.specular
    }

    pub fn shininess(&self) -> f32 {
        self.shininess
    }

    pub fn specular_strength(&self) -> f32 {
        self.specular_strength
    }

    pub fn set_shininess(&mut self, shininess: f32) {
        self.shininess = shininess;
    }

    pub fn set_specular_strength(&mut self, specular_strength: f32) {
        self.specular_strength = specular_strength;
    }

    /// Scalars as laid out in the fragment uniform
    pub fn uniform(&self) -> MaterialUniform {
        MaterialUniform::new(self.specular_strength, self.shininess)
    }
}

impl fmt::Debug for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Material")
            .field("name", &self.name)
            .field("shininess", &self.shininess)
            .field("specular_strength", &self.specular_strength)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "material_tests.rs"]
mod tests;
