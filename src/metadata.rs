//! Typed document metadata.
//!
//! Documents report a fixed set of known [`Property`]s with
//! typed values; presentation (labels, precision) is derived
//! here rather than by the host inspecting opaque objects.

use inflector::Inflector;
use serde_derive::*;

use crate::{flir::fixed_str, flir::FlirCameraParams, temperature::ThermalSettings};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Property {
    FrameCount,
    FrameWidth,
    FrameHeight,
    Emissivity,
    ObjectDistance,
    ReflectedApparentTemperature,
    AtmosphericTemperature,
    IrWindowTemperature,
    IrWindowTransmission,
    RelativeHumidity,
    PlanckR1,
    PlanckR2,
    PlanckB,
    PlanckF,
    PlanckO,
    CameraModel,
    CameraPartNumber,
    CameraSerialNumber,
    CameraSoftware,
    LensModel,
    LensPartNumber,
    LensSerialNumber,
    FilterModel,
}

impl Property {
    pub fn key(self) -> &'static str {
        match self {
            Property::FrameCount => "frame_count",
            Property::FrameWidth => "frame_width",
            Property::FrameHeight => "frame_height",
            Property::Emissivity => "emissivity",
            Property::ObjectDistance => "object_distance",
            Property::ReflectedApparentTemperature => "reflected_apparent_temperature",
            Property::AtmosphericTemperature => "atmospheric_temperature",
            Property::IrWindowTemperature => "ir_window_temperature",
            Property::IrWindowTransmission => "ir_window_transmission",
            Property::RelativeHumidity => "relative_humidity",
            Property::PlanckR1 => "planck_r1",
            Property::PlanckR2 => "planck_r2",
            Property::PlanckB => "planck_b",
            Property::PlanckF => "planck_f",
            Property::PlanckO => "planck_o",
            Property::CameraModel => "camera_model",
            Property::CameraPartNumber => "camera_part_number",
            Property::CameraSerialNumber => "camera_serial_number",
            Property::CameraSoftware => "camera_software",
            Property::LensModel => "lens_model",
            Property::LensPartNumber => "lens_part_number",
            Property::LensSerialNumber => "lens_serial_number",
            Property::FilterModel => "filter_model",
        }
    }

    /// Human readable label, e.g. "Relative humidity".
    pub fn label(self) -> String {
        self.key().to_sentence_case()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Real { value: f64, suffix: &'static str },
    Integer(i64),
    Text(String),
}

impl MetadataValue {
    pub fn real(value: f64, suffix: &'static str) -> Self {
        MetadataValue::Real { value, suffix }
    }

    /// Format with `decimals` (1 to 4) for real values.
    pub fn format(&self, decimals: usize) -> String {
        match self {
            MetadataValue::Real { value, suffix } => {
                let decimals = decimals.max(1).min(4);
                if suffix.is_empty() {
                    format!("{:.*}", decimals, value)
                } else {
                    format!("{:.*} {}", decimals, value, suffix)
                }
            }
            MetadataValue::Integer(v) => v.to_string(),
            MetadataValue::Text(s) => s.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Metadata {
    entries: Vec<(Property, MetadataValue)>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, property: Property, value: MetadataValue) {
        self.entries.push((property, value));
    }

    /// Add a text property; blank strings are skipped.
    pub fn push_text(&mut self, property: Property, text: String) {
        if !text.is_empty() {
            self.push(property, MetadataValue::Text(text));
        }
    }

    pub fn get(&self, property: Property) -> Option<&MetadataValue> {
        self.entries
            .iter()
            .find(|(p, _)| *p == property)
            .map(|(_, v)| v)
    }

    pub fn entries(&self) -> &[(Property, MetadataValue)] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(label, value)` pairs ready for a two-column table.
    pub fn rows(&self, decimals: usize) -> Vec<(String, String)> {
        self.entries
            .iter()
            .map(|(p, v)| (p.label(), v.format(decimals)))
            .collect()
    }

    /// Frame geometry entries shared by every document.
    pub(crate) fn with_geometry(frame_count: usize, (width, height): (usize, usize)) -> Self {
        let mut meta = Metadata::new();
        meta.push(Property::FrameCount, MetadataValue::Integer(frame_count as i64));
        meta.push(Property::FrameWidth, MetadataValue::Integer(width as i64));
        meta.push(Property::FrameHeight, MetadataValue::Integer(height as i64));
        meta
    }

    pub(crate) fn extend_settings(&mut self, s: &ThermalSettings) {
        use crate::metadata::MetadataValue as V;
        self.push(Property::Emissivity, V::real(s.emissivity, ""));
        self.push(Property::ObjectDistance, V::real(s.object_distance, "m"));
        self.push(
            Property::ReflectedApparentTemperature,
            V::real(s.reflected_apparent_temperature, "°C"),
        );
        self.push(
            Property::AtmosphericTemperature,
            V::real(s.atmospheric_temperature, "°C"),
        );
        self.push(Property::IrWindowTemperature, V::real(s.ir_window_temperature, "°C"));
        self.push(Property::IrWindowTransmission, V::real(s.ir_window_transmission, ""));
        self.push(
            Property::RelativeHumidity,
            V::real(s.relative_humidity_percentage, "%"),
        );
        self.push(Property::PlanckR1, V::real(s.planck_r1, ""));
        self.push(Property::PlanckR2, V::real(s.planck_r2, ""));
        self.push(Property::PlanckB, V::real(s.planck_b, ""));
        self.push(Property::PlanckF, V::real(s.planck_f, ""));
        self.push(Property::PlanckO, V::real(s.planck_o, ""));
    }

    pub(crate) fn extend_camera(&mut self, params: &FlirCameraParams) {
        let camera = &params.camera_info;
        let lens = &params.lens_info;
        self.push_text(Property::CameraModel, fixed_str(&camera.camera_model));
        self.push_text(Property::CameraPartNumber, fixed_str(&camera.camera_part_number));
        self.push_text(Property::CameraSerialNumber, fixed_str(&camera.camera_serial_number));
        self.push_text(Property::CameraSoftware, fixed_str(&camera.camera_software));
        self.push_text(Property::LensModel, fixed_str(&lens.lens_model));
        self.push_text(Property::LensPartNumber, fixed_str(&lens.lens_part_number));
        self.push_text(Property::LensSerialNumber, fixed_str(&lens.lens_serial_number));
        self.push_text(Property::FilterModel, fixed_str(&params.filter_info.filter_model));
    }
}
