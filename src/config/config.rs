use serde::{Deserialize, Serialize};

use crate::utils::color::LipColor;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FaceMeshConfig {
    pub max_num_faces: i32,
    pub refine_landmarks: bool,
    pub min_detection_confidence: f32,
    pub min_tracking_confidence: f32,
}

impl FaceMeshConfig {
    pub fn new() -> Self {
        FaceMeshConfig {
            max_num_faces: 1,
            refine_landmarks: true,
            min_detection_confidence: 0.5,
            min_tracking_confidence: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LipRenderConfig {
    /// Per-channel offset applied to the base color for the bottom
    /// gradient stop.
    pub shade_offset: i32,
    /// Inner contours with a shoelace area (px^2) below this threshold are
    /// treated as a closed mouth and excluded from the mask.
    pub min_inner_area: f32,
    /// Stroke the selected contours on top of the rendered image.
    pub debug_contours: bool,
}

impl LipRenderConfig {
    pub fn new() -> Self {
        LipRenderConfig {
            shade_offset: -30,
            min_inner_area: 1.0,
            debug_contours: false,
        }
    }
}

/// default_shades returns the stock lipstick catalogue offered by the
/// try-on UI.
pub fn default_shades() -> Vec<LipColor> {
    vec![
        LipColor::new("Classic Red", "#C41E3A"),
        LipColor::new("Nude Pink", "#FFB6C1"),
        LipColor::new("Deep Plum", "#8E4585"),
        LipColor::new("Coral", "#FF7F50"),
        LipColor::new("Berry", "#8B0000"),
        LipColor::new("Rose Gold", "#B76E79"),
        LipColor::new("Mauve", "#E0B0FF"),
        LipColor::new("Burgundy", "#800020"),
        LipColor::new("Peach", "#FFDAB9"),
        LipColor::new("Fuchsia", "#FF00FF"),
        LipColor::new("Rosy Brown", "#BC8F8F"),
        LipColor::new("Black Honey", "#4A2C2A"),
        LipColor::new("Dusty Pink", "#DCAE96"),
        LipColor::new("Mocha", "#8A624A"),
        LipColor::new("Warm Brown", "#6F4E37"),
        LipColor::new("Brick Red", "#8C2F1B"),
        LipColor::new("Baby Pink", "#F4C2C2"),
        LipColor::new("Metallic Mauve", "#A47C9B"),
        LipColor::new("Nostalgic Pink", "#FF9999"),
        LipColor::new("Fiery Peach", "#FF9966"),
        LipColor::new("Chocolate Raspberry", "#5C4033"),
        LipColor::new("Pearly White", "#F5F6F5"),
        LipColor::new("Frosty Lilac", "#D8BFD8"),
        LipColor::new("True Cherry Red", "#D2122E"),
        LipColor::new("Plum Red", "#6B1C2D"),
        LipColor::new("Orange Red", "#E34234"),
        LipColor::new("Savvy Sienna", "#A0522D"),
        LipColor::new("Deep Violet", "#4B0082"),
        LipColor::new("Black", "#000000"),
        LipColor::new("Blue", "#0000FF"),
        LipColor::new("Gray", "#808080"),
        LipColor::new("Yellow", "#FFFF00"),
        LipColor::new("Green", "#008000"),
    ]
}
