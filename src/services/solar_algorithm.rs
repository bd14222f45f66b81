//! ============================================================
//!  Plane-of-array irradiance & DC power model
//!
//!  Algorithm pipeline:
//!   1. Solar geometry  – declination, equation of time, true solar
//!                        time, hour angle, elevation (with refraction),
//!                        azimuth
//!   2. Transposition   – isotropic sky, measured horizontal total used
//!                        as both DNI and GHI, DHI = 0
//!   3. Cell temperature – SAPM, open-rack glass-glass mounting
//!   4. Power output     – PVWatts: P = P_rated × (G_poa/1000) × η_temp
//! ============================================================

use chrono::{DateTime, Datelike, Timelike, Utc};
use std::f64::consts::PI;
use thiserror::Error;

// ─── Constants ───────────────────────────────────────────────
const DEG: f64 = PI / 180.0;
/// Ground albedo used for the reflected component
pub const ALBEDO: f64 = 0.25;
/// SAPM coefficients, open_rack_glass_glass
pub const SAPM_A: f64 = -3.47;
pub const SAPM_B: f64 = -0.0594;
pub const SAPM_DELTA_T: f64 = 3.0;
const IRRAD_REF: f64 = 1000.0;
const TEMP_REF: f64 = 25.0;

#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("non-finite input: {0}")]
    NonFiniteInput(&'static str),
    #[error("non-finite result: {0}")]
    NonFiniteResult(&'static str),
}

// ─── Public input / output ───────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct ModelInputs {
    pub latitude: f64,
    pub longitude: f64,
    pub tilt_deg: f64,
    pub azimuth_deg: f64,
    pub direct_radiation_w_m2: f64,
    pub diffuse_radiation_w_m2: f64,
    pub ambient_temp_c: f64,
    pub wind_speed_m_s: f64,
    pub rated_power_w: f64,
    pub temp_coefficient: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelOutput {
    pub poa_global_w_m2: f64,
    pub cell_temp_c: f64,
    /// DC power (W), clamped at zero
    pub power_w: f64,
    pub solar_zenith_deg: f64,
    pub solar_azimuth_deg: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolarPosition {
    /// Refraction-corrected zenith (deg)
    pub apparent_zenith_deg: f64,
    /// Degrees from North, clockwise
    pub azimuth_deg: f64,
}

/// Main entry point – call once per estimation cycle.
pub fn evaluate(inputs: &ModelInputs, utc_now: DateTime<Utc>) -> Result<ModelOutput, ModelError> {
    check_inputs(inputs)?;

    let sun = solar_position(inputs.latitude, inputs.longitude, utc_now);

    // The provider only gives horizontal components; their sum stands in for
    // both DNI and GHI.
    let ghi = inputs.direct_radiation_w_m2 + inputs.diffuse_radiation_w_m2;
    let poa = poa_global_isotropic(
        inputs.tilt_deg,
        inputs.azimuth_deg,
        sun.apparent_zenith_deg,
        sun.azimuth_deg,
        ghi,
        ghi,
        0.0,
    );
    let cell_temp = sapm_cell_temperature(poa, inputs.ambient_temp_c, inputs.wind_speed_m_s);
    let power = pvwatts_dc(poa, cell_temp, inputs.rated_power_w, inputs.temp_coefficient);

    if !poa.is_finite() {
        return Err(ModelError::NonFiniteResult("poa_global"));
    }
    if !cell_temp.is_finite() {
        return Err(ModelError::NonFiniteResult("cell_temp"));
    }
    if !power.is_finite() {
        return Err(ModelError::NonFiniteResult("power"));
    }

    Ok(ModelOutput {
        poa_global_w_m2: poa,
        cell_temp_c: cell_temp,
        power_w: power,
        solar_zenith_deg: sun.apparent_zenith_deg,
        solar_azimuth_deg: sun.azimuth_deg,
    })
}

fn check_inputs(i: &ModelInputs) -> Result<(), ModelError> {
    let fields = [
        ("latitude", i.latitude),
        ("longitude", i.longitude),
        ("tilt", i.tilt_deg),
        ("azimuth", i.azimuth_deg),
        ("direct_radiation", i.direct_radiation_w_m2),
        ("diffuse_radiation", i.diffuse_radiation_w_m2),
        ("ambient_temp", i.ambient_temp_c),
        ("wind_speed", i.wind_speed_m_s),
        ("rated_power", i.rated_power_w),
        ("temp_coefficient", i.temp_coefficient),
    ];
    match fields.iter().find(|(_, v)| !v.is_finite()) {
        Some((name, _)) => Err(ModelError::NonFiniteInput(*name)),
        None => Ok(()),
    }
}

// ─── 1. Solar geometry ───────────────────────────────────────

pub fn solar_position(lat_deg: f64, lon_deg: f64, utc_now: DateTime<Utc>) -> SolarPosition {
    let doy = utc_now.ordinal() as f64;
    let ut_h = utc_now.hour() as f64
        + utc_now.minute() as f64 / 60.0
        + utc_now.second() as f64 / 3600.0;

    // Declination (Spencer 1971)
    let b = 2.0 * PI * (doy - 1.0) / 365.0;
    let decl = 0.006918
        - 0.399912 * b.cos()
        + 0.070257 * b.sin()
        - 0.006758 * (2.0 * b).cos()
        + 0.000907 * (2.0 * b).sin()
        - 0.002697 * (3.0 * b).cos()
        + 0.00148 * (3.0 * b).sin();

    // Equation of time (minutes, Spencer 1971)
    let eot_min = 229.18
        * (0.000075
            + 0.001868 * b.cos()
            - 0.032077 * b.sin()
            - 0.014615 * (2.0 * b).cos()
            - 0.04089 * (2.0 * b).sin());

    // True solar time straight from UTC and longitude
    let tst_h = (ut_h + lon_deg / 15.0 + eot_min / 60.0).rem_euclid(24.0);
    let omega_deg = 15.0 * (tst_h - 12.0);
    let omega = omega_deg * DEG;

    let lat = lat_deg * DEG;
    let sin_alpha = (lat.sin() * decl.sin() + lat.cos() * decl.cos() * omega.cos()).clamp(-1.0, 1.0);
    let alpha_rad = sin_alpha.asin();
    let alpha_deg = alpha_rad / DEG;

    let denom = alpha_rad.cos() * lat.cos();
    let cos_az = if denom.abs() > 1e-9 {
        (decl.sin() - sin_alpha * lat.sin()) / denom
    } else {
        0.0
    };
    let az_abs = cos_az.clamp(-1.0, 1.0).acos() / DEG;
    let azimuth_deg = if omega_deg > 0.0 { 360.0 - az_abs } else { az_abs };

    SolarPosition {
        apparent_zenith_deg: 90.0 - (alpha_deg + refraction_deg(alpha_deg)),
        azimuth_deg,
    }
}

/// Atmospheric refraction (Sæmundsson), zero well below the horizon.
fn refraction_deg(elevation_deg: f64) -> f64 {
    if elevation_deg <= -1.0 {
        return 0.0;
    }
    let arcmin = 1.02 / ((elevation_deg + 10.3 / (elevation_deg + 5.11)) * DEG).tan();
    arcmin.max(0.0) / 60.0
}

// ─── 2. Transposition ────────────────────────────────────────

/// Isotropic-sky plane-of-array global irradiance (W/m²).
pub fn poa_global_isotropic(
    surface_tilt_deg: f64,
    surface_azimuth_deg: f64,
    solar_zenith_deg: f64,
    solar_azimuth_deg: f64,
    dni: f64,
    ghi: f64,
    dhi: f64,
) -> f64 {
    let tilt = surface_tilt_deg * DEG;
    let zen = solar_zenith_deg * DEG;
    let az_diff = (solar_azimuth_deg - surface_azimuth_deg) * DEG;

    let cos_aoi = (zen.cos() * tilt.cos() + zen.sin() * tilt.sin() * az_diff.cos()).clamp(-1.0, 1.0);

    let beam = (dni * cos_aoi).max(0.0);
    let sky_diffuse = dhi * (1.0 + tilt.cos()) / 2.0;
    let ground = ghi * ALBEDO * (1.0 - tilt.cos()) / 2.0;

    beam + sky_diffuse + ground
}

// ─── 3. Cell temperature ─────────────────────────────────────

/// SAPM cell temperature (°C) for an open-rack glass-glass module.
pub fn sapm_cell_temperature(poa_w_m2: f64, ambient_c: f64, wind_m_s: f64) -> f64 {
    let module = poa_w_m2 * (SAPM_A + SAPM_B * wind_m_s).exp() + ambient_c;
    module + poa_w_m2 / IRRAD_REF * SAPM_DELTA_T
}

// ─── 4. DC power ─────────────────────────────────────────────

/// P = P_rated × (G/1000) × [1 + γ × (T_cell − 25)], never negative.
pub fn pvwatts_dc(poa_w_m2: f64, cell_temp_c: f64, rated_power_w: f64, gamma: f64) -> f64 {
    let temp_factor = 1.0 + gamma * (cell_temp_c - TEMP_REF);
    (rated_power_w * (poa_w_m2 / IRRAD_REF) * temp_factor).max(0.0)
}
