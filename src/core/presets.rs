use glam::Vec3;

/// Named camera positions around the head. The table is fixed at build time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CameraPreset {
    Defaulting,
    Vision,
    Tunes,
    Words,
    Ambience,
}

impl CameraPreset {
    pub const ALL: [CameraPreset; 5] = [
        CameraPreset::Defaulting,
        CameraPreset::Vision,
        CameraPreset::Tunes,
        CameraPreset::Words,
        CameraPreset::Ambience,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            CameraPreset::Defaulting => "defaulting",
            CameraPreset::Vision => "vision",
            CameraPreset::Tunes => "tunes",
            CameraPreset::Words => "words",
            CameraPreset::Ambience => "ambience",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CameraPreset::Defaulting => "Default",
            CameraPreset::Vision => "Vision",
            CameraPreset::Tunes => "Tunes",
            CameraPreset::Words => "Words",
            CameraPreset::Ambience => "Ambience",
        }
    }

    pub fn position(self) -> Vec3 {
        match self {
            CameraPreset::Defaulting => Vec3::new(0.0, 0.0, 5.0),
            CameraPreset::Vision => Vec3::new(-0.047_434_535, -0.178_898_16, 1.607_045_2),
            CameraPreset::Tunes => Vec3::new(-1.585_911_9, -0.614_620_2, 0.565_623_04),
            CameraPreset::Words => Vec3::new(0.400_235_83, -0.801_428_9, 2.267_861_4),
            CameraPreset::Ambience => Vec3::new(0.080_312_55, -0.474_932_5, 1.378_197_6),
        }
    }

    /// Id of the dedicated header button, if the page has one for this preset.
    pub fn button_id(self) -> Option<&'static str> {
        match self {
            CameraPreset::Defaulting => None,
            CameraPreset::Vision => Some("vision-btn"),
            CameraPreset::Tunes => Some("tunes-btn"),
            CameraPreset::Words => Some("words-btn"),
            CameraPreset::Ambience => Some("ambience-btn"),
        }
    }
}

