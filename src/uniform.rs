//! Uniform location caching.
//!
//! Looking a uniform up by name costs a string hash inside the driver, so
//! every name is resolved once right after the program is linked and the
//! resulting locations are used for all later uploads. A relinked program
//! needs a fresh [`UniformLocations`]; the cache is never patched in place.

use std::collections::HashMap;

use glam::{Mat4, Vec3};
use log::debug;
use thiserror::Error;

/// Errors raised when resolving uniforms.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UniformError {
    /// The name is not active in the linked program. Either it was never
    /// declared or the compiler optimised it out.
    #[error("uniform `{0}` is not active in the linked program")]
    UnknownUniform(String),

    #[error("{requested} point lights requested but the shader supports at most {max}")]
    TooManyPointLights { requested: usize, max: usize },
}

/// Read access to the active uniforms of a linked program.
pub trait ProgramIntrospection {
    type Program: Copy;
    type Location: Clone;

    /// Number of active uniforms in the program.
    fn active_uniform_count(&self, program: Self::Program) -> u32;

    /// Name of the active uniform at `index`, if the driver reports one.
    fn active_uniform_name(&self, program: Self::Program, index: u32) -> Option<String>;

    /// Location of the uniform called `name`. Uniform block members have none.
    fn uniform_location(&self, program: Self::Program, name: &str) -> Option<Self::Location>;
}

/// Writes values into the currently bound program by resolved location.
pub trait UniformWriter {
    type Location;

    fn write_mat4(&self, location: &Self::Location, value: &Mat4);
    fn write_vec3(&self, location: &Self::Location, value: Vec3);
    fn write_f32(&self, location: &Self::Location, value: f32);
    fn write_i32(&self, location: &Self::Location, value: i32);
}

/// Name to location map of every active uniform of one linked program.
#[derive(Debug, Clone)]
pub struct UniformLocations<L> {
    locations: HashMap<String, L>,
}

impl<L: Clone> UniformLocations<L> {
    /// Enumerates the active uniforms of `program` and resolves each one.
    pub fn build<D>(driver: &D, program: D::Program) -> Self
    where
        D: ProgramIntrospection<Location = L>,
    {
        let count = driver.active_uniform_count(program);
        let mut locations = HashMap::with_capacity(count as usize);
        for index in 0..count {
            let Some(name) = driver.active_uniform_name(program, index) else {
                debug!("active uniform {index} has no name");
                continue;
            };
            match driver.uniform_location(program, &name) {
                Some(location) => {
                    locations.insert(name, location);
                }
                None => debug!("uniform `{name}` has no location, skipping"),
            }
        }
        debug!("resolved {} of {count} active uniforms", locations.len());
        Self { locations }
    }

    /// Returns the location of `name` or [`UniformError::UnknownUniform`].
    pub fn get(&self, name: &str) -> Result<&L, UniformError> {
        self.find(name)
            .ok_or_else(|| UniformError::UnknownUniform(name.to_string()))
    }

    /// Returns the location of `name` if it is active.
    ///
    /// Drivers report arrays of plain values as `name[0]`, so a bare array
    /// name falls back to its first element.
    pub fn find(&self, name: &str) -> Option<&L> {
        self.locations
            .get(name)
            .or_else(|| self.locations.get(&format!("{name}[0]")))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.locations.keys().map(String::as_str)
    }
}

/// Locations of `array[i].field` for every element of a uniform struct array.
#[derive(Debug, Clone)]
pub struct IndexedUniforms<L> {
    array: String,
    elements: Vec<HashMap<&'static str, L>>,
}

impl<L: Clone> IndexedUniforms<L> {
    /// Resolves `fields` for elements `0..count` of `array`.
    pub fn resolve(
        locations: &UniformLocations<L>,
        array: &str,
        count: usize,
        fields: &[&'static str],
    ) -> Result<Self, UniformError> {
        let elements = (0..count)
            .map(|index| {
                fields
                    .iter()
                    .map(|&field| {
                        let name = indexed_name(array, index, field);
                        locations.get(&name).map(|location| (field, location.clone()))
                    })
                    .collect::<Result<HashMap<_, _>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            array: array.to_string(),
            elements,
        })
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Location of `field` in element `index`.
    pub fn get(&self, index: usize, field: &str) -> Result<&L, UniformError> {
        self.elements
            .get(index)
            .and_then(|element| element.get(field))
            .ok_or_else(|| UniformError::UnknownUniform(indexed_name(&self.array, index, field)))
    }
}

/// Formats the GLSL name of a struct array member, e.g. `pointLights[2].position`.
pub fn indexed_name(array: &str, index: usize, field: &str) -> String {
    format!("{array}[{index}].{field}")
}
