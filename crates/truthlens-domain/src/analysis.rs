//! Analysis module - the validated assessment of an article

use std::fmt;

/// Political leaning detected in an article
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bias {
    /// Leans left
    Left,

    /// Leans right
    Right,

    /// No detectable leaning
    Neutral,
}

impl Bias {
    /// Every accepted value, in the order the prompt lists them
    pub const ALL: [Bias; 3] = [Bias::Left, Bias::Right, Bias::Neutral];

    /// Get the wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Bias::Left => "left",
            Bias::Right => "right",
            Bias::Neutral => "neutral",
        }
    }

    /// Parse from the exact wire name
    ///
    /// Matching is case-sensitive: the completion contract names the values
    /// in lowercase and anything else is out of domain.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "left" => Some(Bias::Left),
            "right" => Some(Bias::Right),
            "neutral" => Some(Bias::Neutral),
            _ => None,
        }
    }
}

impl fmt::Display for Bias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Bias {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid bias: {}", s))
    }
}

/// Emotional register of an article
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmotionalTone {
    /// Measured, matter-of-fact
    Neutral,

    /// Fear-inducing or sensational
    Alarmist,

    /// Overly celebratory
    Euphoric,
}

impl EmotionalTone {
    /// Every accepted value, in the order the prompt lists them
    pub const ALL: [EmotionalTone; 3] = [
        EmotionalTone::Neutral,
        EmotionalTone::Alarmist,
        EmotionalTone::Euphoric,
    ];

    /// Get the wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            EmotionalTone::Neutral => "neutral",
            EmotionalTone::Alarmist => "alarmist",
            EmotionalTone::Euphoric => "euphoric",
        }
    }

    /// Parse from the exact wire name
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "neutral" => Some(EmotionalTone::Neutral),
            "alarmist" => Some(EmotionalTone::Alarmist),
            "euphoric" => Some(EmotionalTone::Euphoric),
            _ => None,
        }
    }
}

impl fmt::Display for EmotionalTone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EmotionalTone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid emotional tone: {}", s))
    }
}

/// Lowest accepted factual accuracy score
pub const MIN_FACTUAL_ACCURACY: u8 = 0;

/// Highest accepted factual accuracy score
pub const MAX_FACTUAL_ACCURACY: u8 = 100;

/// A validated bias/accuracy assessment
///
/// Fields are private so a result can only come out of [`AnalysisResult::new`],
/// which enforces the score range. The enums cover the rest of the domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisResult {
    factual_accuracy: u8,
    bias: Bias,
    emotional_tone: EmotionalTone,
    recommendation: String,
}

impl AnalysisResult {
    /// Create a result, rejecting a score above [`MAX_FACTUAL_ACCURACY`]
    ///
    /// # Examples
    ///
    /// ```
    /// use truthlens_domain::{AnalysisResult, Bias, EmotionalTone};
    ///
    /// let result = AnalysisResult::new(72, Bias::Neutral, EmotionalTone::Neutral, "Read on.")
    ///     .unwrap();
    /// assert_eq!(result.factual_accuracy(), 72);
    /// assert!(AnalysisResult::new(101, Bias::Left, EmotionalTone::Euphoric, "").is_err());
    /// ```
    pub fn new(
        factual_accuracy: u8,
        bias: Bias,
        emotional_tone: EmotionalTone,
        recommendation: impl Into<String>,
    ) -> Result<Self, String> {
        if factual_accuracy > MAX_FACTUAL_ACCURACY {
            return Err(format!(
                "factual_accuracy must be between {} and {}, got {}",
                MIN_FACTUAL_ACCURACY, MAX_FACTUAL_ACCURACY, factual_accuracy
            ));
        }

        Ok(Self {
            factual_accuracy,
            bias,
            emotional_tone,
            recommendation: recommendation.into(),
        })
    }

    /// Factual accuracy score in [0, 100]
    pub fn factual_accuracy(&self) -> u8 {
        self.factual_accuracy
    }

    /// Detected political leaning
    pub fn bias(&self) -> Bias {
        self.bias
    }

    /// Detected emotional register
    pub fn emotional_tone(&self) -> EmotionalTone {
        self.emotional_tone
    }

    /// Free-form advice for the reader
    pub fn recommendation(&self) -> &str {
        &self.recommendation
    }
}
