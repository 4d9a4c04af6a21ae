use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::InputError;

/// Default starting age offered by the input form
pub const DEFAULT_AGE: i32 = 20;

/// Default starting VO2max (ml/kg/min) offered by the input form
pub const DEFAULT_VO2MAX: f64 = 48.0;

/// Youngest starting age accepted from user input
pub const MIN_AGE: i32 = 0;

/// Gender selecting the percentile regression.
///
/// Only the two normed populations exist; anything else is rejected when
/// parsed, so a projection never carries a missing percentile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[serde(alias = "m")]
    Male,
    #[serde(alias = "f")]
    Female,
}

impl FromStr for Gender {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "m" | "male" => Ok(Gender::Male),
            "f" | "female" => Ok(Gender::Female),
            _ => Err(InputError::InvalidGender {
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Male => write!(f, "Male"),
            Gender::Female => write!(f, "Female"),
        }
    }
}

/// Activities with a fixed minimum VO2max requirement (ml/kg/min)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activity {
    /// Running at 6 MPH
    Run,
    /// Hiking
    Hike,
    /// Slow walk at 3.5 MPH
    Walk,
}

impl Activity {
    pub const ALL: [Activity; 3] = [Activity::Run, Activity::Hike, Activity::Walk];

    /// VO2max needed to sustain the activity
    pub fn threshold(&self) -> f64 {
        match self {
            Activity::Run => 34.3,
            Activity::Hike => 25.5,
            Activity::Walk => 15.0,
        }
    }

    /// Short label drawn next to the reference line
    pub fn label(&self) -> &'static str {
        match self {
            Activity::Run => "Running",
            Activity::Hike => "Hiking",
            Activity::Walk => "Slow Walk",
        }
    }

    /// Longer description shown next to the checkbox
    pub fn description(&self) -> &'static str {
        match self {
            Activity::Run => "Run at 6 MPH",
            Activity::Hike => "Hiking",
            Activity::Walk => "Slow walk (3.5MPH)",
        }
    }

    /// Key used in query strings and on the command line
    pub fn key(&self) -> &'static str {
        match self {
            Activity::Run => "run",
            Activity::Hike => "hike",
            Activity::Walk => "walk",
        }
    }
}

impl FromStr for Activity {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "run" => Ok(Activity::Run),
            "hike" => Ok(Activity::Hike),
            "walk" => Ok(Activity::Walk),
            _ => Err(InputError::InvalidActivity {
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Selected activities, in selection order, without duplicates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivitySet(Vec<Activity>);

impl ActivitySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, activity: Activity) -> bool {
        if self.contains(activity) {
            return false;
        }
        self.0.push(activity);
        true
    }

    pub fn contains(&self, activity: Activity) -> bool {
        self.0.contains(&activity)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Activity> + '_ {
        self.0.iter().copied()
    }

    /// Parse a comma-separated list such as `run,hike`
    pub fn parse_list(s: &str) -> Result<Self, InputError> {
        let mut set = ActivitySet::new();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            set.insert(part.parse()?);
        }
        Ok(set)
    }
}

impl FromIterator<Activity> for ActivitySet {
    fn from_iter<I: IntoIterator<Item = Activity>>(iter: I) -> Self {
        let mut set = ActivitySet::new();
        for activity in iter {
            set.insert(activity);
        }
        set
    }
}

impl FromStr for ActivitySet {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActivitySet::parse_list(s)
    }
}

/// One step of the projected VO2max trend
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectionPoint {
    /// Age in years
    pub age: i32,

    /// Projected VO2max in ml/kg/min
    pub vo2max: f64,

    /// Age/gender-normed percentile in [0, 1], rounded to 2 decimals
    pub percentile: f64,
}

/// Fully parsed inputs for one projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionRequest {
    pub gender: Gender,

    /// Starting age in years
    pub age: i32,

    /// Starting VO2max in ml/kg/min
    pub vo2max: f64,

    #[serde(default)]
    pub activities: ActivitySet,
}

impl ProjectionRequest {
    pub fn new(gender: Gender, age: i32, vo2max: f64) -> Self {
        Self {
            gender,
            age,
            vo2max,
            activities: ActivitySet::new(),
        }
    }

    pub fn with_activities(mut self, activities: ActivitySet) -> Self {
        self.activities = activities;
        self
    }

    /// Reject values the arithmetic cannot carry meaningfully.
    ///
    /// Ages below [`MIN_AGE`] are refused since the trend length grows with
    /// the distance to the projection limit. There is no upper bound: ages at
    /// or past the limit simply produce an empty trend.
    pub fn validate(&self) -> Result<(), InputError> {
        if self.age < MIN_AGE {
            return Err(InputError::AgeOutOfRange {
                value: self.age,
                min: MIN_AGE,
            });
        }
        if !self.vo2max.is_finite() {
            return Err(InputError::NonFinite {
                field: "vo2max".to_string(),
                value: self.vo2max,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gender_parsing() {
        assert_eq!("m".parse::<Gender>().unwrap(), Gender::Male);
        assert_eq!("Female".parse::<Gender>().unwrap(), Gender::Female);
        assert_eq!(" F ".parse::<Gender>().unwrap(), Gender::Female);

        let err = "x".parse::<Gender>().unwrap_err();
        assert_eq!(
            err,
            InputError::InvalidGender {
                value: "x".to_string()
            }
        );
        assert!("".parse::<Gender>().is_err());
    }

    #[test]
    fn test_gender_serde_aliases() {
        let g: Gender = serde_json::from_str("\"m\"").unwrap();
        assert_eq!(g, Gender::Male);
        assert_eq!(serde_json::to_string(&Gender::Female).unwrap(), "\"female\"");
    }

    #[test]
    fn test_activity_thresholds() {
        assert_eq!(Activity::Run.threshold(), 34.3);
        assert_eq!(Activity::Hike.threshold(), 25.5);
        assert_eq!(Activity::Walk.threshold(), 15.0);
        assert_eq!(Activity::Walk.label(), "Slow Walk");
    }

    #[test]
    fn test_activity_set_parsing() {
        let set: ActivitySet = "run, hike,run".parse().unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![Activity::Run, Activity::Hike]);

        assert!(ActivitySet::parse_list("").unwrap().is_empty());
        assert!(ActivitySet::parse_list("run,swim").is_err());
    }

    #[test]
    fn test_request_validation() {
        let request = ProjectionRequest::new(Gender::Male, 20, f64::NAN);
        assert!(request.validate().is_err());

        let request = ProjectionRequest::new(Gender::Male, 120, 48.0);
        assert!(request.validate().is_ok());

        let request = ProjectionRequest::new(Gender::Male, MIN_AGE, 48.0);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_request_rejects_negative_age() {
        let request = ProjectionRequest::new(Gender::Female, -1, 48.0);
        assert_eq!(
            request.validate(),
            Err(InputError::AgeOutOfRange { value: -1, min: 0 })
        );

        let request = ProjectionRequest::new(Gender::Male, i32::MIN, 48.0);
        assert!(matches!(
            request.validate(),
            Err(InputError::AgeOutOfRange { .. })
        ));
    }
}
