use crate::api::models::VitalSigns;

/// Body-mass index from weight in kilograms and height in centimetres.
///
/// Rounded to one decimal. `None` when either value is missing or height is not
/// positive.
pub fn bmi(weight_kg: Option<f64>, height_cm: Option<f64>) -> Option<f64> {
    let weight = weight_kg?;
    let height = height_cm.filter(|h| *h > 0.0)? / 100.0;
    let value = weight / (height * height);
    Some((value * 10.0).round() / 10.0)
}

pub fn bmi_category(bmi: f64) -> &'static str {
    match bmi {
        b if b < 18.5 => "Underweight",
        b if b < 25.0 => "Normal",
        b if b < 30.0 => "Overweight",
        _ => "Obese",
    }
}

/// Most recently recorded entry; undated entries lose to dated ones.
pub fn latest(vitals: &[VitalSigns]) -> Option<&VitalSigns> {
    vitals.iter().max_by_key(|v| v.recorded_at)
}
