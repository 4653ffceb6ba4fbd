use thiserror::Error;

use crate::atlas::AtlasCategory;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("Unknown material: {0}")]
    UnknownMaterial(String),

    #[error("Texture not found: {category:?}/{name}")]
    UnknownTexture { category: AtlasCategory, name: String },

    #[error("Unknown tool variant: {0}")]
    UnknownTool(String),

    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(String),

    #[error("Invalid mass: {0}")]
    InvalidMass(f32),

    #[error("Cell out of range: row {row}, col {col}")]
    CellOutOfRange { row: u32, col: u32 },

    #[error("Physics body not found")]
    MissingBody,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to read configuration")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration")]
    Parse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;
