//! Conversion of raw sensor values to object radiance and
//! temperature.
//!
//! Follows the Planck / atmospheric transmission model of
//! the [Thermimage R library].
//!
//! [Thermimage R library]: //github.com/gtatters/Thermimage/blob/master/R/raw2temp.R

use serde_derive::*;

use crate::flir::FlirCameraParams;

/// Parameters to compute temperatures from raw sensor
/// values.
///
/// Read either from the FLIR camera-info record of an FFF
/// block or from ExifTool JSON.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct ThermalSettings {
    #[serde(
        rename = "RelativeHumidity",
        deserialize_with = "serde_helpers::float_with_suffix"
    )]
    pub(crate) relative_humidity_percentage: f64,

    pub(crate) emissivity: f64,
    #[serde(
        default = "default_distance",
        deserialize_with = "serde_helpers::float_with_suffix"
    )]
    pub(crate) object_distance: f64,
    #[serde(deserialize_with = "serde_helpers::float_with_suffix")]
    pub(crate) reflected_apparent_temperature: f64,

    #[serde(
        rename = "IRWindowTemperature",
        deserialize_with = "serde_helpers::float_with_suffix"
    )]
    pub(crate) ir_window_temperature: f64,
    #[serde(rename = "IRWindowTransmission")]
    pub(crate) ir_window_transmission: f64,

    pub(crate) planck_r1: f64,
    pub(crate) planck_b: f64,
    pub(crate) planck_f: f64,
    pub(crate) planck_o: f64,
    pub(crate) planck_r2: f64,

    #[serde(deserialize_with = "serde_helpers::float_with_suffix")]
    pub(crate) atmospheric_temperature: f64,
    #[serde(rename = "AtmosphericTransAlpha1")]
    pub(crate) atmospheric_transmission_alpha_1: f64,
    #[serde(rename = "AtmosphericTransAlpha2")]
    pub(crate) atmospheric_transmission_alpha_2: f64,
    #[serde(rename = "AtmosphericTransBeta1")]
    pub(crate) atmospheric_transmission_beta_1: f64,
    #[serde(rename = "AtmosphericTransBeta2")]
    pub(crate) atmospheric_transmission_beta_2: f64,
    #[serde(rename = "AtmosphericTransX")]
    pub(crate) atmospheric_transmission_x: f64,
}

fn default_distance() -> f64 {
    1.0
}

const CELSIUS_OFFSET: f64 = 273.15;

impl From<&FlirCameraParams> for ThermalSettings {
    fn from(params: &FlirCameraParams) -> Self {
        let t = &params.temperature_params;
        let x = &params.extra_params;
        // FLIR stores temperatures in kelvin and humidity
        // as a fraction.
        ThermalSettings {
            relative_humidity_percentage: t.relative_humidity as f64 * 100.,
            emissivity: t.emissivity as f64,
            object_distance: t.object_distance as f64,
            reflected_apparent_temperature: t.reflected_apparent_temperature as f64
                - CELSIUS_OFFSET,
            ir_window_temperature: t.ir_window_temperature as f64 - CELSIUS_OFFSET,
            ir_window_transmission: t.ir_window_transmission as f64,
            planck_r1: t.planck_r1 as f64,
            planck_b: t.planck_b as f64,
            planck_f: t.planck_f as f64,
            planck_o: x.planck_o as f64,
            planck_r2: x.planck_r2 as f64,
            atmospheric_temperature: t.atmospheric_temperature as f64 - CELSIUS_OFFSET,
            atmospheric_transmission_alpha_1: t.atmospheric_transmission_alpha_1 as f64,
            atmospheric_transmission_alpha_2: t.atmospheric_transmission_alpha_2 as f64,
            atmospheric_transmission_beta_1: t.atmospheric_transmission_beta_1 as f64,
            atmospheric_transmission_beta_2: t.atmospheric_transmission_beta_2 as f64,
            atmospheric_transmission_x: t.atmospheric_transmission_x as f64,
        }
    }
}

impl ThermalSettings {
    pub fn object_distance(&self) -> f64 {
        self.object_distance
    }

    // raw = PR1/(PR2*(exp(PB/(temp+273.15))-PF))-PO
    fn planck_temp_to_raw(&self, temp: f64) -> f64 {
        self.planck_r1
            / (self.planck_r2 * ((self.planck_b / (temp + CELSIUS_OFFSET)).exp() - self.planck_f))
            - self.planck_o
    }

    fn planck_raw_to_temp(&self, raw: f64) -> f64 {
        self.planck_b
            / (self.planck_r1 / (self.planck_r2 * (raw + self.planck_o)) + self.planck_f).ln()
            - CELSIUS_OFFSET
    }

    fn atmospheric_affine1(&self, val: f64) -> f64 {
        self.atmospheric_transmission_alpha_1 + self.atmospheric_transmission_beta_1 * val
    }

    fn atmospheric_affine2(&self, val: f64) -> f64 {
        self.atmospheric_transmission_alpha_2 + self.atmospheric_transmission_beta_2 * val
    }

    fn atmospheric_interpolate(&self, val1: f64, val2: f64) -> f64 {
        self.atmospheric_transmission_x * val1 + (1. - self.atmospheric_transmission_x) * val2
    }

    /// Transmission of the air column between object and
    /// camera, with the window assumed at its mid-point.
    fn transmission(&self, distance: f64) -> f64 {
        // water vapour pressure from relative humidity
        const ATMOSPHERIC_SERIES: [f64; 4] = [1.5587, 0.06939, -0.00027816, 0.00000068455];
        let h2o = (self.relative_humidity_percentage / 100.)
            * power_series_at(&ATMOSPHERIC_SERIES, self.atmospheric_temperature).exp();
        let h2o_sqrt = h2o.sqrt();
        let dist_factor = (distance / 2.).sqrt();

        self.atmospheric_interpolate(
            (-dist_factor * self.atmospheric_affine1(h2o_sqrt)).exp(),
            (-dist_factor * self.atmospheric_affine2(h2o_sqrt)).exp(),
        )
    }

    /// Affine map from a raw sensor value to the radiance
    /// emitted by the object, in sensor units, after
    /// removing atmosphere, window and reflected components.
    pub fn radiance_transform(&self, distance: f64) -> impl Fn(f64) -> f64 {
        let emiss_wind = 1. - self.ir_window_transmission;
        // anti-reflective coating on the window
        let refl_wind = 0.;
        let e = self.emissivity;
        let irt = self.ir_window_transmission;
        let tau = self.transmission(distance);

        let refl = self.planck_temp_to_raw(self.reflected_apparent_temperature);
        let atm = self.planck_temp_to_raw(self.atmospheric_temperature);
        let wind = self.planck_temp_to_raw(self.ir_window_temperature);

        let refl1_attn = (1. - e) / e * refl;
        let atm1_attn = (1. - tau) / tau / e * atm;
        let wind_attn = emiss_wind / e / tau / irt * wind;
        let refl2_attn = refl_wind / e / tau / irt * refl;
        let atm2_attn = (1. - tau) / e / tau / irt / tau * atm;

        let coeffs = [
            -atm1_attn - atm2_attn - wind_attn - refl1_attn - refl2_attn,
            1. / e / tau / irt / tau,
        ];

        move |raw| power_series_at(&coeffs, raw)
    }

    pub fn temperature_transform(&self, distance: f64) -> impl Fn(f64) -> f64 + '_ {
        let t = self.radiance_transform(distance);
        move |raw| self.planck_raw_to_temp(t(raw))
    }

    pub fn raw_to_temp(&self, distance: f64, raw: f64) -> f64 {
        self.temperature_transform(distance)(raw)
    }
}

#[inline]
fn power_series_at(coeffs: &[f64], x: f64) -> f64 {
    let mut pow = 1.;
    let mut sum = 0.;
    for coeff in coeffs.iter() {
        sum += pow * coeff;
        pow *= x;
    }
    sum
}

mod serde_helpers {
    use lazy_static::lazy_static;
    use regex::Regex;
    use serde::*;
    use serde_derive::Deserialize;

    /// Accepts plain numbers as well as ExifTool strings
    /// such as `"21.5 C"` or `"1.00 m"`.
    pub fn float_with_suffix<'de, D>(de: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        lazy_static! {
            static ref RE: Regex = Regex::new(r"^\s*-?\d*\.?\d+").unwrap();
        }

        use serde::de::Error;
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Num(f64),
            Str(String),
        }
        let str_rep = match Repr::deserialize(de)? {
            Repr::Num(val) => return Ok(val),
            Repr::Str(s) => s,
        };
        let val = RE
            .find(&str_rep)
            .ok_or_else(|| Error::custom("unexpected format: must begin with float"))?
            .as_str()
            .trim()
            .parse()
            .map_err(Error::custom)?;

        Ok(val)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Typical parameters of a FLIR E-series camera.
    pub(crate) fn sample_settings() -> ThermalSettings {
        serde_json::from_str(
            r#"{
                "RelativeHumidity": "50.0 %",
                "Emissivity": 0.95,
                "ObjectDistance": "1.00 m",
                "ReflectedApparentTemperature": "20.0 C",
                "IRWindowTemperature": "20.0 C",
                "IRWindowTransmission": 1.0,
                "PlanckR1": 21106.77,
                "PlanckB": 1501.0,
                "PlanckF": 1.0,
                "PlanckO": -7340.0,
                "PlanckR2": 0.012545258,
                "AtmosphericTemperature": "20.0 C",
                "AtmosphericTransAlpha1": 0.006569,
                "AtmosphericTransAlpha2": 0.01262,
                "AtmosphericTransBeta1": -0.002276,
                "AtmosphericTransBeta2": -0.00667,
                "AtmosphericTransX": 1.9
            }"#,
        )
        .expect("valid settings")
    }

    #[test]
    fn parses_suffixed_and_negative_values() {
        let mut json: serde_json::Value = serde_json::from_str(
            &serde_json::to_string(&sample_settings()).unwrap(),
        )
        .unwrap();
        json["AtmosphericTemperature"] = "-5.5 C".into();
        let settings: ThermalSettings = serde_json::from_value(json).unwrap();
        assert_eq!(settings.atmospheric_temperature, -5.5);
        assert_eq!(sample_settings().relative_humidity_percentage, 50.0);
        assert_eq!(sample_settings().object_distance(), 1.0);
    }

    #[test]
    fn planck_round_trip() {
        let settings = sample_settings();
        for temp in [-10., 0., 25., 80.].iter() {
            let raw = settings.planck_temp_to_raw(*temp);
            assert!((settings.planck_raw_to_temp(raw) - temp).abs() < 1e-6);
        }
    }

    #[test]
    fn hotter_raw_reads_hotter() {
        let settings = sample_settings();
        let temp = settings.temperature_transform(1.0);
        let (cold, warm) = (temp(13000.), temp(15000.));
        assert!(cold.is_finite() && warm.is_finite());
        assert!(warm > cold, "{} > {}", warm, cold);
        let radiance = settings.radiance_transform(1.0);
        assert!(radiance(15000.) > radiance(13000.));
    }
}
