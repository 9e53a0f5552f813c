use serde::{Deserialize, Serialize};

/// Loudspeaker layout of a channel-based audio element.
///
/// Only stereo and 5.1 have a defined code for the counts this encoder
/// produces; every other count is written as the reserved/custom sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoudspeakerLayout {
    Stereo,
    Surround5_1,
    Custom,
}

impl LoudspeakerLayout {
    pub fn for_channel_count(channels: u32) -> Self {
        match channels {
            2 => Self::Stereo,
            6 => Self::Surround5_1,
            _ => Self::Custom,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::Stereo => 1,
            Self::Surround5_1 => 2,
            Self::Custom => 15,
        }
    }
}

/// Sound system written into the mix presentation's loudspeaker layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SoundSystem {
    /// 0+2+0 (stereo); also the generic fallback.
    #[default]
    A,
    /// 0+5+0 (5.1).
    B,
}

impl SoundSystem {
    pub fn for_channel_count(channels: u32) -> Self {
        match channels {
            6 => Self::B,
            _ => Self::A,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::A => 0,
            Self::B => 1,
        }
    }
}

/// Layout type of the single mix presentation layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutType {
    LoudspeakersSsConvention,
    Binaural,
}

impl LayoutType {
    pub fn for_element(is_scene_based: bool) -> Self {
        if is_scene_based {
            Self::Binaural
        } else {
            Self::LoudspeakersSsConvention
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::LoudspeakersSsConvention => 2,
            Self::Binaural => 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defined_layouts() {
        assert_eq!(LoudspeakerLayout::for_channel_count(2).code(), 1);
        assert_eq!(LoudspeakerLayout::for_channel_count(6).code(), 2);
    }

    #[test]
    fn other_counts_are_custom() {
        for channels in [1, 4, 8, 10, 12, 14] {
            assert_eq!(LoudspeakerLayout::for_channel_count(channels), LoudspeakerLayout::Custom);
        }
    }

    #[test]
    fn sound_system_falls_back_to_a() {
        assert_eq!(SoundSystem::for_channel_count(2), SoundSystem::A);
        assert_eq!(SoundSystem::for_channel_count(6), SoundSystem::B);
        assert_eq!(SoundSystem::for_channel_count(14), SoundSystem::default());
    }

    #[test]
    fn layout_type_codes() {
        assert_eq!(LayoutType::for_element(true).code(), 3);
        assert_eq!(LayoutType::for_element(false).code(), 2);
    }
}
