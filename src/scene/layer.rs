//! Render layers

use serde::{Deserialize, Serialize};

/// Render bucket. Layers are drawn back to front in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum Layer {
    /// Drawn first
    #[default]
    Background = 0,
    /// Above the background
    Bottom = 1,
    /// Above the bottom layer
    Middle = 2,
    /// Drawn last
    Top = 3,
}

impl Layer {
    /// Number of layers
    pub const COUNT: usize = 4;

    /// Every layer in render order
    pub const ALL: [Layer; Self::COUNT] = [Self::Background, Self::Bottom, Self::Middle, Self::Top];

    /// Bucket index
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Layer for a bucket index
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Background),
            1 => Some(Self::Bottom),
            2 => Some(Self::Middle),
            3 => Some(Self::Top),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layers_round_trip_index() {
        for layer in Layer::ALL {
            assert_eq!(Layer::from_index(layer.index()), Some(layer));
        }
        assert_eq!(Layer::from_index(4), None);
    }

    #[test]
    fn test_render_order_is_ascending() {
        assert!(Layer::Background < Layer::Bottom);
        assert!(Layer::Middle < Layer::Top);
    }
}
