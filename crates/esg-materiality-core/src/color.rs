//! Deterministic matrix colors.
//!
//! A topic's color depends only on its index in the catalog and on the
//! catalog length: hues are spread evenly around the wheel while saturation
//! and lightness alternate so neighbours stay distinguishable. Reordering or
//! resizing the catalog recolors every topic.

use std::fmt;

use serde::{Serialize, Serializer};

const BASE_SATURATION: u8 = 70;
const BASE_LIGHTNESS: u8 = 45;
const HOVER_LIGHTNESS_DROP: u8 = 5;
const SELECTED_SATURATION_BOOST: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HslColor {
    pub hue: f64,
    pub saturation: u8,
    pub lightness: u8,
}

impl HslColor {
    pub fn css(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for HslColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hsl({}, {}%, {}%)",
            self.hue, self.saturation, self.lightness
        )
    }
}

impl Serialize for HslColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TopicColor {
    pub base: HslColor,
    pub hover: HslColor,
    pub selected: HslColor,
}

fn clamp_percent(v: u16) -> u8 {
    u8::try_from(v.min(100)).unwrap_or(100)
}

/// Color for position `index` in a catalog of `len` topics. `None` when the
/// index does not fall inside the catalog.
pub fn topic_color(index: usize, len: usize) -> Option<TopicColor> {
    if index >= len {
        return None;
    }
    let hue = (index as f64 * 360.0 / len as f64) % 360.0;
    let saturation = clamp_percent(u16::from(BASE_SATURATION) + (index % 3) as u16 * 10);
    let lightness = clamp_percent(u16::from(BASE_LIGHTNESS) + (index % 2) as u16 * 10);

    let base = HslColor {
        hue,
        saturation,
        lightness,
    };
    Some(TopicColor {
        base,
        hover: HslColor {
            lightness: lightness.saturating_sub(HOVER_LIGHTNESS_DROP),
            ..base
        },
        selected: HslColor {
            saturation: clamp_percent(u16::from(saturation) + u16::from(SELECTED_SATURATION_BOOST)),
            ..base
        },
    })
}

pub fn catalog_colors(len: usize) -> Vec<TopicColor> {
    (0..len).filter_map(|i| topic_color(i, len)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_indices_are_half_a_wheel_apart() {
        let first = topic_color(0, 24).expect("index 0");
        let opposite = topic_color(12, 24).expect("index 12");
        assert_eq!(opposite.base.hue - first.base.hue, 180.0);
    }

    #[test]
    fn colors_are_byte_identical_across_runs() {
        let a = catalog_colors(24)
            .iter()
            .map(|c| c.base.css())
            .collect::<Vec<_>>();
        let b = catalog_colors(24)
            .iter()
            .map(|c| c.base.css())
            .collect::<Vec<_>>();
        assert_eq!(a, b);
        assert_eq!(a[0], "hsl(0, 70%, 45%)");
        assert_eq!(a[1], "hsl(15, 80%, 55%)");
        assert_eq!(a[12], "hsl(180, 70%, 45%)");
    }

    #[test]
    fn saturation_and_lightness_cycle() {
        let colors = catalog_colors(6);
        let sat = colors.iter().map(|c| c.base.saturation).collect::<Vec<_>>();
        let light = colors.iter().map(|c| c.base.lightness).collect::<Vec<_>>();
        assert_eq!(sat, vec![70, 80, 90, 70, 80, 90]);
        assert_eq!(light, vec![45, 55, 45, 55, 45, 55]);
    }

    #[test]
    fn variants_shift_one_channel() {
        let color = topic_color(2, 24).expect("index 2");
        assert_eq!(color.hover.lightness, color.base.lightness - 5);
        assert_eq!(color.hover.saturation, color.base.saturation);
        assert_eq!(color.selected.saturation, 100);
        assert_eq!(color.selected.lightness, color.base.lightness);
    }

    #[test]
    fn color_depends_on_catalog_length() {
        let short = topic_color(1, 4).expect("short");
        let long = topic_color(1, 8).expect("long");
        assert_ne!(short.base.hue, long.base.hue);
    }

    #[test]
    fn out_of_range_index_has_no_color() {
        assert!(topic_color(3, 3).is_none());
        assert!(topic_color(0, 0).is_none());
    }

    #[test]
    fn serializes_as_css_string() {
        let color = topic_color(0, 2).expect("color");
        let json = serde_json::to_value(color).expect("serialize");
        assert_eq!(json["base"], "hsl(0, 70%, 45%)");
        assert_eq!(json["hover"], "hsl(0, 70%, 40%)");
        assert_eq!(json["selected"], "hsl(0, 80%, 45%)");
    }
}
