//! Networked character appearance and the collaborator that applies it.

use serde::{Deserialize, Serialize};

/// A single tint layer painted over the base face texture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tint {
    pub texture_path: String,
    /// Packed `0xAARRGGBB` colour.
    pub argb: u32,
    pub tint_type: i32,
}

/// Cosmetic payload received alongside a spawn request.
///
/// Only meaningful when the spawn target turns out to be actor-capable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appearance {
    #[serde(default)]
    pub is_female: bool,
    #[serde(default)]
    pub race_id: u32,
    #[serde(default)]
    pub weight: f32,
    #[serde(default)]
    pub skin_color: u32,
    #[serde(default)]
    pub hair_color: u32,
    #[serde(default)]
    pub headpart_ids: Vec<u32>,
    #[serde(default)]
    pub head_texture_set_id: u32,
    #[serde(default)]
    pub name: String,
    pub tints: Vec<Tint>,
}

impl Appearance {
    /// An appearance carrying only tint layers.
    pub fn with_tints(tints: Vec<Tint>) -> Self {
        Self {
            is_female: false,
            race_id: 0,
            weight: 0.0,
            skin_color: 0,
            hair_color: 0,
            headpart_ids: Vec::new(),
            head_texture_set_id: 0,
            name: String::new(),
            tints,
        }
    }
}

/// Applies an [`Appearance`] to an actor.
///
/// Called synchronously between repositioning and enabling, so the change
/// is already in place when the actor becomes visible.
pub trait AppearanceApplier<A> {
    fn apply_appearance(&self, actor: &A, appearance: &Appearance);
}
