use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::color::{generate_palette, HexColor};

// Seaborn "colorblind" palette, the colours used in the paper figures.
pub const SNS_BLUE: HexColor = HexColor::rgb(0x01, 0x73, 0xb2);
pub const SNS_ORANGE: HexColor = HexColor::rgb(0xde, 0x8f, 0x05);
pub const SNS_GREEN: HexColor = HexColor::rgb(0x02, 0x9e, 0x73);
pub const SNS_RED: HexColor = HexColor::rgb(0xd5, 0x5e, 0x00);
pub const SNS_PURPLE: HexColor = HexColor::rgb(0xcc, 0x78, 0xbc);
pub const SNS_GREY: HexColor = HexColor::rgb(0x94, 0x94, 0x94);

// ---------------------------------------------------------------------------
// Per-method style
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Marker {
    Circle,
    Diamond,
    Cross,
    Star,
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
}

/// How one method is drawn: legend name, colour, marker and line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MethodStyle {
    pub name: String,
    pub color: HexColor,
    pub marker: Marker,
    #[serde(default)]
    pub line_style: LineStyle,
    /// Lower values are drawn first (further back).
    #[serde(default)]
    pub z_order: i32,
}

impl MethodStyle {
    fn new(name: &str, color: HexColor, marker: Marker, z_order: i32) -> Self {
        Self {
            name: name.to_string(),
            color,
            marker,
            line_style: LineStyle::Solid,
            z_order,
        }
    }
}

// ---------------------------------------------------------------------------
// StyleSheet – method key → style
// ---------------------------------------------------------------------------

/// Method styles handed explicitly to the figure builder, the renderer and
/// the viewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StyleSheet {
    styles: BTreeMap<String, MethodStyle>,
}

impl Default for StyleSheet {
    fn default() -> Self {
        let entries = [
            ("centralized", MethodStyle::new("Centralized", SNS_GREY, Marker::Circle, 0)),
            ("independent", MethodStyle::new("Independent", SNS_PURPLE, Marker::Diamond, 1)),
            ("ddfsam2", MethodStyle::new("DDF-SAM2", SNS_GREEN, Marker::Cross, 2)),
            ("imesa", MethodStyle::new("iMESA", SNS_BLUE, Marker::Star, 3)),
            ("raido", MethodStyle::new("RaiDO", SNS_ORANGE, Marker::Square, 4)),
            ("raido_kn", MethodStyle::new("RaiDOInit", SNS_RED, Marker::Square, 5)),
        ];
        Self {
            styles: entries
                .into_iter()
                .map(|(key, style)| (key.to_string(), style))
                .collect(),
        }
    }
}

impl StyleSheet {
    pub fn get(&self, method: &str) -> Option<&MethodStyle> {
        self.styles.get(method)
    }

    /// Resolve styles for `methods` and return them in drawing order
    /// (ascending z-order, ties by key).
    ///
    /// Methods without an entry get an evenly spaced fallback colour and
    /// are drawn after every styled method.
    pub fn resolve<'a, I>(&self, methods: I) -> Vec<(String, MethodStyle)>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut known = Vec::new();
        let mut unknown = Vec::new();
        for method in methods {
            match self.get(method) {
                Some(style) => known.push((method.to_string(), style.clone())),
                None => unknown.push(method.to_string()),
            }
        }

        known.sort_by(|(ka, a), (kb, b)| a.z_order.cmp(&b.z_order).then_with(|| ka.cmp(kb)));

        // Fallbacks follow the styled methods, in input order.
        let back = known.last().map_or(0, |(_, s)| s.z_order);
        let palette = generate_palette(unknown.len());
        for (i, (method, color)) in unknown.into_iter().zip(palette).enumerate() {
            log::warn!("No style for method '{method}', using a fallback colour");
            let z_order = back
                .saturating_add(1)
                .saturating_add(i32::try_from(i).unwrap_or(i32::MAX));
            let style = MethodStyle::new(&method, color, Marker::Circle, z_order);
            known.push((method, style));
        }
        known
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_sheet_matches_paper_styles() {
        let sheet = StyleSheet::default();
        let keys = ["centralized", "independent", "ddfsam2", "imesa", "raido", "raido_kn"];
        let resolved = sheet.resolve(keys);
        assert_eq!(resolved.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>(), keys);
        let imesa = sheet.get("imesa").unwrap();
        assert_eq!(imesa.name, "iMESA");
        assert_eq!(imesa.color.to_string(), "#0173b2");
        assert_eq!(imesa.marker, Marker::Star);
        assert_eq!(sheet.get("raido_kn").unwrap().color, SNS_RED);
    }

    #[test]
    fn resolve_orders_by_z_then_appends_unknown() {
        let sheet = StyleSheet::default();
        let order: Vec<String> = sheet
            .resolve(["zeta", "raido", "centralized", "alpha"])
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(order, vec!["centralized", "raido", "zeta", "alpha"]);
    }

    #[test]
    fn unknown_methods_get_distinct_colours() {
        let sheet = StyleSheet::default();
        let resolved = sheet.resolve(["a", "b"]);
        assert_eq!(resolved[0].1.name, "a");
        assert_ne!(resolved[0].1.color, resolved[1].1.color);
    }

    #[test]
    fn fallback_after_maximal_z_order_does_not_overflow() {
        let text = r##"{"imesa": {"name": "iMESA", "color": "#0173b2", "marker": "star", "z_order": 2147483647}}"##;
        let sheet: StyleSheet = serde_json::from_str(text).unwrap();
        let resolved = sheet.resolve(["other", "imesa", "another"]);
        let order: Vec<&str> = resolved.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(order, vec!["imesa", "other", "another"]);
        assert!(resolved.iter().all(|(_, s)| s.z_order == i32::MAX));
    }

    #[test]
    fn sheet_deserializes_from_json() {
        let text = r##"{"imesa": {"name": "iMESA (ours)", "color": "#000000", "marker": "star", "line_style": "dashed"}}"##;
        let sheet: StyleSheet = serde_json::from_str(text).unwrap();
        let style = sheet.get("imesa").unwrap();
        assert_eq!(style.name, "iMESA (ours)");
        assert_eq!(style.line_style, LineStyle::Dashed);
        assert_eq!(style.z_order, 0);
    }

    #[test]
    fn sheet_rejects_unknown_style_fields() {
        let text = r##"{"imesa": {"name": "x", "color": "#000000", "marker": "star", "size": 3}}"##;
        assert!(serde_json::from_str::<StyleSheet>(text).is_err());
    }
}
