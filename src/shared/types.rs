use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use ts_rs::TS;
use chrono::Utc;

/// Type tag the host gives to plain text layers
pub const TEXT_NODE_TYPE: &str = "TEXT";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings.ts")]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// True when both axes differ by strictly less than `tolerance`
    pub fn is_near(&self, other: &Position, tolerance: f64) -> bool {
        (self.x - other.x).abs() < tolerance && (self.y - other.y).abs() < tolerance
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings.ts")]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn is_near(&self, other: &Size, tolerance: f64) -> bool {
        (self.width - other.width).abs() < tolerance && (self.height - other.height).abs() < tolerance
    }
}

/// Absolute placement of a node: position plus size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings.ts")]
pub struct Geometry {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Geometry {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

// ===== Style snapshot =====

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings.ts")]
pub struct FontName {
    pub family: String,
    pub style: String,
}

impl FontName {
    pub fn new(family: impl Into<String>, style: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            style: style.into(),
        }
    }
}

impl std::fmt::Display for FontName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.family, self.style)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings.ts")]
pub enum TextAlignHorizontal {
    Left,
    Center,
    Right,
    Justified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings.ts")]
pub enum TextAlignVertical {
    Top,
    Center,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings.ts")]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub a: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings.ts")]
pub enum PaintType {
    Solid,
    GradientLinear,
    GradientRadial,
    GradientAngular,
    GradientDiamond,
    Image,
    Video,
    Pattern,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings.ts")]
pub struct ColorStop {
    pub position: f64,
    pub color: Rgba,
    #[serde(flatten)]
    #[ts(skip)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings.ts")]
pub struct Paint {
    #[serde(rename = "type")]
    pub paint_type: PaintType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Rgba>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blend_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gradient_stops: Option<Vec<ColorStop>>,
    /// 2x3 affine matrix
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gradient_transform: Option<Vec<Vec<f64>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_mode: Option<String>,
    /// Host keys without a typed field, kept so they are written back as read
    #[serde(flatten)]
    #[ts(skip)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings.ts")]
pub enum EffectType {
    DropShadow,
    InnerShadow,
    LayerBlur,
    BackgroundBlur,
    Noise,
    Texture,
    Glass,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings.ts")]
pub struct Effect {
    #[serde(rename = "type")]
    pub effect_type: EffectType,
    pub radius: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Rgba>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spread: Option<f64>,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blend_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_shadow_behind_node: Option<bool>,
    #[serde(flatten)]
    #[ts(skip)]
    pub extra: Map<String, Value>,
}

fn default_visible() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings.ts")]
pub enum ConstraintType {
    Min,
    Center,
    Max,
    Stretch,
    Scale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings.ts")]
pub struct Constraints {
    pub horizontal: ConstraintType,
    pub vertical: ConstraintType,
}

/// Point-in-time copy of the style attributes of a text node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings.ts")]
pub struct TextStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_name: Option<FontName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_align_horizontal: Option<TextAlignHorizontal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_align_vertical: Option<TextAlignVertical>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fills: Option<Vec<Paint>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effects: Option<Vec<Effect>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<Constraints>,
}

impl TextStyle {
    /// Same style with the font reference dropped
    pub fn without_font(&self) -> Self {
        Self {
            font_name: None,
            ..self.clone()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

// ===== Translation history =====

/// Snapshot of one text node taken right after it was translated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings.ts")]
pub struct TranslationItem {
    pub source_text: String,
    pub translated_text: String,
    /// Identifier of the node at capture time. Only a hint.
    pub element_id: String,
    pub element_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<TextStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
}

impl TranslationItem {
    pub fn font_name(&self) -> Option<&FontName> {
        self.style.as_ref().and_then(|s| s.font_name.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings.ts")]
pub struct ParentNodeSnapshot {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: String,
}

/// One completed translation pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings.ts")]
pub struct TranslationRecord {
    pub id: String,
    /// Capture time in milliseconds since the Unix epoch
    #[ts(type = "number")]
    pub timestamp: i64,
    pub parent_node: ParentNodeSnapshot,
    pub translations: Vec<TranslationItem>,
}

impl TranslationRecord {
    pub fn new(parent_node: ParentNodeSnapshot, translations: Vec<TranslationItem>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now().timestamp_millis(),
            parent_node,
            translations,
        }
    }
}

// ===== UI payloads =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "kebab-case")]
#[ts(export, export_to = "bindings.ts")]
pub enum TranslateMode {
    /// Translate a clone placed next to the selection
    #[default]
    Copy,
    /// Translate the selection itself
    InPlace,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings.ts")]
pub struct SupportedLanguage {
    pub code: String,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_uses_camel_case_keys() {
        let item = TranslationItem {
            source_text: "确认".to_string(),
            translated_text: "Confirm".to_string(),
            element_id: "1:2".to_string(),
            element_type: TEXT_NODE_TYPE.to_string(),
            target_language: Some("en".to_string()),
            position: Some(Position::new(10.0, 20.0)),
            style: Some(TextStyle {
                font_name: Some(FontName::new("Inter", "Regular")),
                text_align_horizontal: Some(TextAlignHorizontal::Center),
                ..Default::default()
            }),
            size: None,
        };

        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["sourceText"], "确认");
        assert_eq!(json["elementType"], "TEXT");
        assert_eq!(json["style"]["fontName"]["family"], "Inter");
        assert_eq!(json["style"]["textAlignHorizontal"], "CENTER");
        assert!(json.get("size").is_none());
    }

    #[test]
    fn test_record_parses_stored_shape() {
        let raw = serde_json::json!({
            "id": "abc",
            "timestamp": 1700000000000i64,
            "parentNode": { "id": "1:1", "name": "Card", "type": "FRAME" },
            "translations": [{
                "sourceText": "你好",
                "translatedText": "Hello",
                "elementId": "1:5",
                "elementType": "TEXT",
                "style": {
                    "fills": [{ "type": "SOLID", "color": { "r": 0.0, "g": 0.0, "b": 0.0 } }]
                }
            }]
        });

        let record: TranslationRecord = serde_json::from_value(raw).unwrap();
        assert_eq!(record.parent_node.node_type, "FRAME");
        let fills = record.translations[0].style.as_ref().unwrap().fills.as_ref().unwrap();
        assert_eq!(fills[0].paint_type, PaintType::Solid);
        assert!(fills[0].visible);
    }

    #[test]
    fn test_tolerances_are_strict() {
        let a = Position::new(10.0, 10.0);
        assert!(a.is_near(&Position::new(10.5, 9.6), 1.0));
        assert!(!a.is_near(&Position::new(11.0, 10.0), 1.0));
        assert!(Size::new(100.0, 20.0).is_near(&Size::new(104.0, 16.0), 5.0));
    }

    #[test]
    fn test_gradient_paint_keeps_every_key() {
        let raw = serde_json::json!({
            "fills": [{
                "type": "GRADIENT_LINEAR",
                "visible": true,
                "opacity": 0.8,
                "blendMode": "MULTIPLY",
                "gradientStops": [
                    { "position": 0.0, "color": { "r": 1.0, "g": 0.0, "b": 0.0, "a": 1.0 } },
                    { "position": 1.0, "color": { "r": 0.0, "g": 0.0, "b": 1.0, "a": 1.0 },
                      "boundVariables": {} }
                ],
                "gradientTransform": [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]
            }, {
                "type": "IMAGE",
                "visible": true,
                "imageHash": "abc123",
                "scaleMode": "FILL",
                "rotation": 90,
                "filters": { "exposure": 0.2 }
            }],
            "effects": [{
                "type": "DROP_SHADOW",
                "radius": 4.0,
                "visible": true,
                "blendMode": "NORMAL",
                "showShadowBehindNode": false
            }]
        });

        let style: TextStyle = serde_json::from_value(raw.clone()).unwrap();
        let fills = style.fills.as_ref().unwrap();
        assert_eq!(fills[0].gradient_stops.as_ref().unwrap().len(), 2);
        assert_eq!(fills[1].image_hash.as_deref(), Some("abc123"));
        assert_eq!(fills[1].extra["rotation"], 90);
        assert_eq!(style.effects.as_ref().unwrap()[0].show_shadow_behind_node, Some(false));

        assert_eq!(serde_json::to_value(&style).unwrap(), raw);
    }

    #[test]
    fn test_newer_effect_types_parse() {
        let effect: Effect = serde_json::from_value(serde_json::json!({
            "type": "NOISE",
            "radius": 0.0,
            "noiseSize": 2.0
        }))
        .unwrap();
        assert_eq!(effect.effect_type, EffectType::Noise);
        assert_eq!(effect.extra["noiseSize"], 2.0);
    }
}
