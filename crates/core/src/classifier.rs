//! Rule-based priority classifier.
//!
//! Maps a referral's raw clinical attributes plus a [`ClassifierConfig`] to
//! a ROJO/VERDE priority label. This is a pure, deterministic computation:
//! no I/O, no global state, and no access to the configuration store — the
//! caller passes the configuration in explicitly and persists the result.
//!
//! The score is a weighted sum of four factor scores (age, severity,
//! specialty criticality, alarm symptoms). Weights are renormalised to sum
//! to 1 before use, so the weighted sum always lands in [0,1] for valid
//! factor scores.
//!
//! Scores at or above `red_threshold` classify ROJO, scores at or below
//! `green_threshold` classify VERDE. A score strictly between the two
//! thresholds also classifies ROJO: the mid band deliberately tends toward
//! the critical bucket so an ambiguous case is never under-triaged. Do not
//! "fix" this to a symmetric rule.

use crate::model::{Priority, Severity};
use crate::{TriageError, TriageResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Specialties whose referrals score high regardless of other factors.
const CRITICAL_SPECIALTIES: [&str; 4] = ["cardiología", "neurología", "urgencias", "cirugía"];

/// Alarm symptoms. Each match adds 0.3 to the symptom factor, capped at 1.0.
const CRITICAL_SYMPTOMS: [&str; 5] = [
    "dolor_toracico",
    "disnea",
    "confusion",
    "perdida_conciencia",
    "hemorragia",
];

/// Weights and thresholds for the priority classifier.
///
/// Weights live in [0,1] and need not sum to 1; they are renormalised
/// before scoring. Thresholds must satisfy
/// `0 < green_threshold < red_threshold <= 1`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    pub w_age: f64,
    pub w_severity: f64,
    pub w_specialty: f64,
    pub w_symptoms: f64,
    pub red_threshold: f64,
    pub green_threshold: f64,
}

impl Default for ClassifierConfig {
    /// The bootstrap configuration served until an administrator saves one.
    fn default() -> Self {
        Self {
            w_age: 0.3,
            w_severity: 0.5,
            w_specialty: 0.2,
            w_symptoms: 0.4,
            red_threshold: 0.7,
            green_threshold: 0.3,
        }
    }
}

impl ClassifierConfig {
    /// Validates weights and thresholds.
    ///
    /// # Errors
    ///
    /// Returns `TriageError::Configuration` if any weight is non-finite or
    /// outside [0,1], if the weights sum to zero, or if the thresholds do
    /// not satisfy `0 < green < red <= 1`.
    pub fn validate(&self) -> TriageResult<()> {
        for (name, w) in [
            ("w_age", self.w_age),
            ("w_severity", self.w_severity),
            ("w_specialty", self.w_specialty),
            ("w_symptoms", self.w_symptoms),
        ] {
            if !w.is_finite() || !(0.0..=1.0).contains(&w) {
                return Err(TriageError::Configuration(format!(
                    "{name} must be a number in [0,1], got {w}"
                )));
            }
        }
        let sum = self.w_age + self.w_severity + self.w_specialty + self.w_symptoms;
        if sum <= 0.0 {
            return Err(TriageError::Configuration(
                "weights sum to zero; at least one weight must be positive".into(),
            ));
        }
        for (name, t) in [
            ("red_threshold", self.red_threshold),
            ("green_threshold", self.green_threshold),
        ] {
            if !t.is_finite() {
                return Err(TriageError::Configuration(format!(
                    "{name} must be a finite number"
                )));
            }
        }
        if !(self.green_threshold > 0.0
            && self.green_threshold < self.red_threshold
            && self.red_threshold <= 1.0)
        {
            return Err(TriageError::Configuration(format!(
                "thresholds must satisfy 0 < green < red <= 1, got green={} red={}",
                self.green_threshold, self.red_threshold
            )));
        }
        Ok(())
    }

    /// Weights renormalised to sum to 1, in factor order
    /// (age, severity, specialty, symptoms). Call after [`validate`](Self::validate).
    fn normalised_weights(&self) -> [f64; 4] {
        let sum = self.w_age + self.w_severity + self.w_specialty + self.w_symptoms;
        [
            self.w_age / sum,
            self.w_severity / sum,
            self.w_specialty / sum,
            self.w_symptoms / sum,
        ]
    }
}

/// The clinical attributes the classifier scores.
#[derive(Clone, Debug)]
pub struct ClinicalPicture {
    pub age: u32,
    pub severity: Severity,
    pub specialty: String,
    pub symptoms: Vec<String>,
}

impl ClinicalPicture {
    /// Rejects pictures missing required fields, before any scoring.
    pub fn validate(&self) -> TriageResult<()> {
        if self.specialty.trim().is_empty() {
            return Err(TriageError::InvalidInput(
                "requested specialty is required".into(),
            ));
        }
        Ok(())
    }
}

/// One factor's contribution, recorded for audit.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FactorScore {
    /// Raw factor score in [0,1], before weighting.
    pub impact: f64,
    pub description: String,
}

/// Per-factor breakdown persisted with every classified referral.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FactorBreakdown {
    pub age: FactorScore,
    pub severity: FactorScore,
    pub specialty: FactorScore,
    pub symptoms: FactorScore,
}

/// The classifier's output.
#[derive(Clone, Debug, PartialEq)]
pub struct Classification {
    pub priority: Priority,
    /// Weighted score in [0,1].
    pub score: f64,
    /// Distance-from-threshold confidence in [0.5,1].
    pub confidence: f64,
    pub factors: FactorBreakdown,
}

/// Classifies a clinical picture against a configuration.
///
/// # Errors
///
/// - `TriageError::Configuration` if `config` is invalid; no score is
///   computed. The caller decides whether to retry with a last-known-good
///   configuration.
/// - `TriageError::InvalidInput` if required patient fields are missing.
pub fn classify(picture: &ClinicalPicture, config: &ClassifierConfig) -> TriageResult<Classification> {
    config.validate()?;
    picture.validate()?;

    let factors = score_factors(picture);
    let [w_age, w_severity, w_specialty, w_symptoms] = config.normalised_weights();

    let raw = factors.age.impact * w_age
        + factors.severity.impact * w_severity
        + factors.specialty.impact * w_specialty
        + factors.symptoms.impact * w_symptoms;
    let score = raw.min(1.0);

    let priority = if score >= config.red_threshold {
        Priority::Rojo
    } else if score <= config.green_threshold {
        Priority::Verde
    } else {
        // Mid band: tend toward ROJO. See module docs.
        Priority::Rojo
    };

    Ok(Classification {
        priority,
        score,
        confidence: confidence(score, config),
        factors,
    })
}

fn score_factors(picture: &ClinicalPicture) -> FactorBreakdown {
    FactorBreakdown {
        age: age_factor(picture.age),
        severity: severity_factor(picture.severity),
        specialty: specialty_factor(&picture.specialty),
        symptoms: symptom_factor(&picture.symptoms),
    }
}

fn age_factor(age: u32) -> FactorScore {
    let (impact, description) = if age > 65 {
        (0.8, "older adult")
    } else if age > 45 {
        (0.5, "middle-aged adult")
    } else {
        (0.2, "younger patient")
    };
    FactorScore {
        impact,
        description: description.into(),
    }
}

fn severity_factor(severity: Severity) -> FactorScore {
    let (impact, description) = match severity {
        Severity::Alta => (0.9, "high reported severity"),
        Severity::Media => (0.5, "moderate reported severity"),
        Severity::Baja => (0.1, "low reported severity"),
        Severity::Unknown => (0.3, "severity not reported"),
    };
    FactorScore {
        impact,
        description: description.into(),
    }
}

fn specialty_factor(specialty: &str) -> FactorScore {
    let lowered = specialty.trim().to_lowercase();
    if CRITICAL_SPECIALTIES.contains(&lowered.as_str()) {
        FactorScore {
            impact: 0.8,
            description: "critical specialty requested".into(),
        }
    } else {
        FactorScore {
            impact: 0.3,
            description: "routine specialty requested".into(),
        }
    }
}

fn symptom_factor(symptoms: &[String]) -> FactorScore {
    let normalised: HashSet<String> = symptoms.iter().map(|s| normalise_symptom(s)).collect();
    let matches = CRITICAL_SYMPTOMS
        .iter()
        .filter(|s| normalised.contains(**s))
        .count();
    FactorScore {
        impact: (matches as f64 * 0.3).min(1.0),
        description: format!("{matches} alarm symptom(s) reported"),
    }
}

/// Canonical form of a clinic-supplied symptom list: every token
/// lower-cased with spaces collapsed to underscores, empties dropped, and
/// duplicates removed (first occurrence wins). Referral records persist
/// this form, so `"Dolor Toracico"` and `"dolor_toracico"` never coexist
/// in one record.
pub fn normalise_symptoms(symptoms: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    symptoms
        .iter()
        .map(|s| normalise_symptom(s))
        .filter(|s| !s.is_empty() && seen.insert(s.clone()))
        .collect()
}

/// Symptoms are matched as lower-cased tokens with spaces collapsed to
/// underscores, so `"Dolor Toracico"` and `"dolor_toracico"` are the same
/// symptom.
fn normalise_symptom(symptom: &str) -> String {
    symptom
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// Confidence grows with the score's distance from the nearest threshold:
/// `min(0.5 + 2 * min(|score - red|, |score - green|), 1.0)`.
fn confidence(score: f64, config: &ClassifierConfig) -> f64 {
    let to_red = (score - config.red_threshold).abs();
    let to_green = (score - config.green_threshold).abs();
    (0.5 + 2.0 * to_red.min(to_green)).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn picture(age: u32, severity: Severity, specialty: &str, symptoms: &[&str]) -> ClinicalPicture {
        ClinicalPicture {
            age,
            severity,
            specialty: specialty.into(),
            symptoms: symptoms.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Config with all weight on severity, so the score equals the severity
    /// factor exactly.
    fn severity_only(red: f64, green: f64) -> ClassifierConfig {
        ClassifierConfig {
            w_age: 0.0,
            w_severity: 1.0,
            w_specialty: 0.0,
            w_symptoms: 0.0,
            red_threshold: red,
            green_threshold: green,
        }
    }

    #[test]
    fn worked_example_scores_rojo() {
        let result = classify(
            &picture(
                70,
                Severity::Alta,
                "Cardiología",
                &["dolor_toracico", "disnea"],
            ),
            &ClassifierConfig::default(),
        )
        .expect("classify");

        // (0.8, 0.9, 0.8, 0.6) · (0.3, 0.5, 0.2, 0.4)/1.4
        assert!((result.score - 0.7785714285714286).abs() < 1e-9);
        assert_eq!(result.priority, Priority::Rojo);
        assert_eq!(result.factors.symptoms.impact, 0.6);
    }

    #[test]
    fn routine_case_scores_verde() {
        let result = classify(
            &picture(30, Severity::Baja, "Dermatología", &[]),
            &ClassifierConfig::default(),
        )
        .expect("classify");

        assert!(result.score <= 0.3, "score was {}", result.score);
        assert_eq!(result.priority, Priority::Verde);
    }

    #[test]
    fn score_stays_in_unit_interval() {
        let config = ClassifierConfig::default();
        for age in [0, 46, 66, 120] {
            for severity in [Severity::Alta, Severity::Media, Severity::Baja, Severity::Unknown] {
                for specialty in ["Urgencias", "Dermatología"] {
                    let all_symptoms: Vec<&str> = CRITICAL_SYMPTOMS.to_vec();
                    let result = classify(
                        &picture(age, severity, specialty, &all_symptoms),
                        &config,
                    )
                    .expect("classify");
                    assert!((0.0..=1.0).contains(&result.score));
                    assert!((0.5..=1.0).contains(&result.confidence));
                }
            }
        }
    }

    #[test]
    fn score_is_monotone_in_each_factor() {
        let config = ClassifierConfig::default();
        let base = picture(30, Severity::Baja, "Dermatología", &[]);
        let score = |p: &ClinicalPicture| classify(p, &config).expect("classify").score;
        let base_score = score(&base);

        for age in [50, 70] {
            assert!(score(&picture(age, base.severity, "Dermatología", &[])) >= base_score);
        }
        for severity in [Severity::Unknown, Severity::Media, Severity::Alta] {
            assert!(score(&picture(30, severity, "Dermatología", &[])) >= base_score);
        }
        assert!(score(&picture(30, Severity::Baja, "Cardiología", &[])) >= base_score);
        let mut previous = base_score;
        for n in 1..=5 {
            let symptoms: Vec<&str> = CRITICAL_SYMPTOMS[..n].to_vec();
            let s = score(&picture(30, Severity::Baja, "Dermatología", &symptoms));
            assert!(s >= previous);
            previous = s;
        }
    }

    #[test]
    fn score_equal_to_red_threshold_is_rojo() {
        // Severity alta scores exactly 0.9; make that the red threshold.
        let result = classify(
            &picture(30, Severity::Alta, "Dermatología", &[]),
            &severity_only(0.9, 0.3),
        )
        .expect("classify");
        assert!((result.score - 0.9).abs() < 1e-12);
        assert_eq!(result.priority, Priority::Rojo);
    }

    #[test]
    fn mid_band_defaults_to_rojo() {
        // Severity media scores 0.5, strictly between green 0.3 and red 0.7.
        let result = classify(
            &picture(30, Severity::Media, "Dermatología", &[]),
            &severity_only(0.7, 0.3),
        )
        .expect("classify");
        assert!(result.score > 0.3 && result.score < 0.7);
        assert_eq!(result.priority, Priority::Rojo);
    }

    #[test]
    fn weights_are_renormalised_before_scoring() {
        // Doubling every weight must not change the score.
        let config = ClassifierConfig::default();
        let doubled = ClassifierConfig {
            w_age: config.w_age * 2.0,
            w_severity: config.w_severity * 2.0,
            w_specialty: config.w_specialty * 2.0,
            w_symptoms: config.w_symptoms * 2.0,
            ..config.clone()
        };
        let p = picture(70, Severity::Alta, "Cardiología", &["disnea"]);
        let a = classify(&p, &config).expect("classify").score;
        let b = classify(&p, &doubled).expect("classify").score;
        assert!((a - b).abs() < 1e-12);
    }

    #[test]
    fn zero_weight_sum_is_a_configuration_error() {
        let config = ClassifierConfig {
            w_age: 0.0,
            w_severity: 0.0,
            w_specialty: 0.0,
            w_symptoms: 0.0,
            ..ClassifierConfig::default()
        };
        let result = classify(&picture(70, Severity::Alta, "Cardiología", &[]), &config);
        assert!(matches!(result, Err(TriageError::Configuration(_))));
    }

    #[test]
    fn out_of_range_weight_is_a_configuration_error() {
        for bad in [-0.1, 1.5, f64::NAN] {
            let config = ClassifierConfig {
                w_age: bad,
                ..ClassifierConfig::default()
            };
            assert!(matches!(config.validate(), Err(TriageError::Configuration(_))));
        }
    }

    #[test]
    fn inverted_thresholds_are_a_configuration_error() {
        let config = ClassifierConfig {
            red_threshold: 0.3,
            green_threshold: 0.7,
            ..ClassifierConfig::default()
        };
        assert!(matches!(config.validate(), Err(TriageError::Configuration(_))));
    }

    #[test]
    fn empty_specialty_is_an_input_error() {
        let result = classify(
            &picture(70, Severity::Alta, "  ", &[]),
            &ClassifierConfig::default(),
        );
        assert!(matches!(result, Err(TriageError::InvalidInput(_))));
    }

    #[test]
    fn symptom_matching_normalises_case_and_spaces() {
        let result = classify(
            &picture(
                30,
                Severity::Baja,
                "Dermatología",
                &["Dolor Toracico", "DISNEA", "dolor_toracico"],
            ),
            &ClassifierConfig::default(),
        )
        .expect("classify");
        // Duplicate after normalisation counts once: two distinct matches.
        assert!((result.factors.symptoms.impact - 0.6).abs() < 1e-12);
    }

    #[test]
    fn normalise_symptoms_yields_deduped_lowercase_tokens() {
        let input = vec![
            "Dolor Toracico".to_string(),
            "dolor_toracico".to_string(),
            "  Fiebre ".to_string(),
            "   ".to_string(),
        ];
        assert_eq!(normalise_symptoms(&input), vec!["dolor_toracico", "fiebre"]);
    }

    #[test]
    fn confidence_reflects_distance_from_nearest_threshold() {
        let result = classify(
            &picture(
                70,
                Severity::Alta,
                "Cardiología",
                &["dolor_toracico", "disnea"],
            ),
            &ClassifierConfig::default(),
        )
        .expect("classify");
        let expected = 0.5 + 2.0 * (result.score - 0.7);
        assert!((result.confidence - expected).abs() < 1e-9);
    }
}
