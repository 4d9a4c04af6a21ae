//! VO2max projection module
//!
//! Projects aerobic capacity forward in ten-year steps and ranks each step
//! against an age/gender-normed population.
//!
//! VO2max is assumed to fall by 10% per decade. The percentile comes from a
//! logistic regression whose coefficients are quadratic in age:
//!
//! ```text
//! z          = a(age) + b(age) × VO2max
//! percentile = e^z / (1 + e^z)
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{Activity, Gender, ProjectionPoint, ProjectionRequest};

/// Years between projected points
pub const AGE_STEP: i32 = 10;

/// Projection stops before reaching this age
pub const AGE_LIMIT: i32 = 105;

/// Fraction of VO2max kept after each step
pub const DECAY_PER_STEP: f64 = 0.9;

/// Regression pair for one age and gender
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegressionCoefficients {
    /// Intercept
    pub a: f64,
    /// VO2max slope
    pub b: f64,
}

impl RegressionCoefficients {
    pub fn for_age(age: i32, gender: Gender) -> Self {
        let age = age as f64;
        let age_sq = age * age;
        match gender {
            Gender::Male => Self {
                a: -9.27 - 0.0722 * age + 0.001209 * age_sq,
                b: 0.209 + 0.0012 * age - 0.000006 * age_sq,
            },
            Gender::Female => Self {
                a: -9.3 + 0.0069 * age - 0.0003 * age_sq,
                b: 0.25 - 0.0012 * age + 0.00004 * age_sq,
            },
        }
    }

    /// Logit score for a VO2max value
    pub fn logit(&self, vo2max: f64) -> f64 {
        self.a + self.b * vo2max
    }
}

/// First projected age at which an activity becomes hard to sustain
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActivityOutlook {
    pub activity: Activity,

    /// Required VO2max (ml/kg/min)
    pub threshold: f64,

    /// First projected age with VO2max strictly below the threshold
    pub limited_from_age: Option<i32>,
}

impl ActivityOutlook {
    pub fn summary(&self) -> String {
        match self.limited_from_age {
            Some(age) => format!(
                "You will have difficulty with {} starting at {} years old",
                self.activity.label().to_lowercase(),
                age
            ),
            None => format!(
                "{} stays above {:.1} ml/kg/min for the whole projection",
                self.activity.label(),
                self.threshold
            ),
        }
    }
}

/// Complete result of one projection request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub request: ProjectionRequest,
    pub points: Vec<ProjectionPoint>,
    pub outlooks: Vec<ActivityOutlook>,
}

/// VO2max projector for age trends and percentile ranking
pub struct Vo2MaxProjector;

impl Vo2MaxProjector {
    /// Project VO2max from a starting age until the age limit
    ///
    /// Ages advance by [`AGE_STEP`] while below [`AGE_LIMIT`]; each step keeps
    /// [`DECAY_PER_STEP`] of the previous VO2max. A starting age at or past the
    /// limit yields an empty trend. Inputs are not range-checked.
    ///
    /// # Arguments
    /// * `start_age` - Age in years at the first point
    /// * `start_vo2max` - Measured VO2max in ml/kg/min
    /// * `gender` - Selects the percentile regression
    pub fn project(start_age: i32, start_vo2max: f64, gender: Gender) -> Vec<ProjectionPoint> {
        let mut vo2max = start_vo2max;
        let points: Vec<ProjectionPoint> = (start_age..AGE_LIMIT)
            .step_by(AGE_STEP as usize)
            .enumerate()
            .map(|(i, age)| {
                if i > 0 {
                    vo2max *= DECAY_PER_STEP;
                }
                ProjectionPoint {
                    age,
                    vo2max,
                    percentile: Self::percentile(age, vo2max, gender),
                }
            })
            .collect();

        debug!(
            start_age,
            start_vo2max,
            gender = %gender,
            points = points.len(),
            "Projected VO2max trend"
        );

        points
    }

    /// Logit score of a VO2max value for an age and gender
    pub fn logit(age: i32, vo2max: f64, gender: Gender) -> f64 {
        RegressionCoefficients::for_age(age, gender).logit(vo2max)
    }

    /// Percentile in [0, 1], rounded to 2 decimals
    pub fn percentile(age: i32, vo2max: f64, gender: Gender) -> f64 {
        round_to_hundredths(logistic(Self::logit(age, vo2max, gender)))
    }

    /// Locate where each activity's requirement is first missed
    pub fn activity_outlooks(
        points: &[ProjectionPoint],
        activities: impl IntoIterator<Item = Activity>,
    ) -> Vec<ActivityOutlook> {
        activities
            .into_iter()
            .map(|activity| {
                let threshold = activity.threshold();
                ActivityOutlook {
                    activity,
                    threshold,
                    limited_from_age: points
                        .iter()
                        .find(|p| p.vo2max < threshold)
                        .map(|p| p.age),
                }
            })
            .collect()
    }

    /// Run a full request: trend plus activity outlooks
    pub fn run(request: &ProjectionRequest) -> Projection {
        let points = Self::project(request.age, request.vo2max, request.gender);
        let outlooks = Self::activity_outlooks(&points, request.activities.iter());
        Projection {
            request: request.clone(),
            points,
            outlooks,
        }
    }
}

/// Project VO2max and percentiles from a starting age (see [`Vo2MaxProjector::project`])
pub fn project(start_age: i32, start_vo2max: f64, gender: Gender) -> Vec<ProjectionPoint> {
    Vo2MaxProjector::project(start_age, start_vo2max, gender)
}

/// Standard logistic function, stable for large |z|
fn logistic(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// Round to 2 decimal places. Ties go away from zero, not to even (`0.125` becomes `0.13`)
fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
