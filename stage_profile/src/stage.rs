//! Stage metadata and results as stored for the trivia game.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StageError {
    #[error("unknown grand tour code `{0}`")]
    UnknownGrandTour(String),
    #[error("unknown stage type code `{0}`")]
    UnknownStageType(String),
    #[error("unknown classification `{0}`")]
    UnknownClassification(String),
    #[error("unknown stage info field `{0}`")]
    UnknownField(String),
    #[error("result has neither rider nor team")]
    MissingTeam,
}

/// The three grand tours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GrandTour {
    #[serde(rename = "Tour de France")]
    Tour,
    #[serde(rename = "Giro d'Italia")]
    Giro,
    #[serde(rename = "Vuelta a España")]
    Vuelta,
}

impl GrandTour {
    /// Display name used in answers.
    pub fn name(&self) -> &'static str {
        match self {
            GrandTour::Tour => "Tour de France",
            GrandTour::Giro => "Giro d'Italia",
            GrandTour::Vuelta => "Vuelta a España",
        }
    }

    /// Parses the code stored in the database (`TOUR`, `GIRO`, `VUELTA`).
    pub fn from_code(code: &str) -> Result<Self, StageError> {
        match code {
            "TOUR" => Ok(GrandTour::Tour),
            "GIRO" => Ok(GrandTour::Giro),
            "VUELTA" => Ok(GrandTour::Vuelta),
            other => Err(StageError::UnknownGrandTour(other.to_string())),
        }
    }
}

impl fmt::Display for GrandTour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageType {
    Road,
    #[serde(rename = "ITT")]
    Itt,
    #[serde(rename = "TTT")]
    Ttt,
    Prologue,
}

impl StageType {
    pub fn name(&self) -> &'static str {
        match self {
            StageType::Road => "Road",
            StageType::Itt => "ITT",
            StageType::Ttt => "TTT",
            StageType::Prologue => "Prologue",
        }
    }

    pub fn from_code(code: &str) -> Result<Self, StageError> {
        match code {
            "ROAD" => Ok(StageType::Road),
            "ITT" => Ok(StageType::Itt),
            "TTT" => Ok(StageType::Ttt),
            "PROLOGUE" => Ok(StageType::Prologue),
            other => Err(StageError::UnknownStageType(other.to_string())),
        }
    }
}

impl fmt::Display for StageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Descriptive information about a stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageInfo {
    pub grand_tour: GrandTour,
    pub year: i32,
    pub stage_number: i32,
    pub stage_type: StageType,
    pub stage_start: String,
    pub stage_end: String,
}

/// A guessable field of [`StageInfo`], named as in its JSON form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InfoField {
    GrandTour,
    Year,
    StageNumber,
    StageType,
    StageStart,
    StageEnd,
}

impl InfoField {
    pub const ALL: [InfoField; 6] = [
        InfoField::GrandTour,
        InfoField::Year,
        InfoField::StageNumber,
        InfoField::StageType,
        InfoField::StageStart,
        InfoField::StageEnd,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            InfoField::GrandTour => "grand_tour",
            InfoField::Year => "year",
            InfoField::StageNumber => "stage_number",
            InfoField::StageType => "stage_type",
            InfoField::StageStart => "stage_start",
            InfoField::StageEnd => "stage_end",
        }
    }
}

impl FromStr for InfoField {
    type Err = StageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InfoField::ALL
            .into_iter()
            .find(|f| f.name() == s)
            .ok_or_else(|| StageError::UnknownField(s.to_string()))
    }
}

impl StageInfo {
    /// Correct answer for `field`, rendered as text.
    pub fn answer(&self, field: InfoField) -> String {
        match field {
            InfoField::GrandTour => self.grand_tour.to_string(),
            InfoField::Year => self.year.to_string(),
            InfoField::StageNumber => self.stage_number.to_string(),
            InfoField::StageType => self.stage_type.to_string(),
            InfoField::StageStart => self.stage_start.clone(),
            InfoField::StageEnd => self.stage_end.clone(),
        }
    }
}

/// Result classification within a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Stage,
    Gc,
    Points,
    Mountains,
    Youth,
    Teams,
}

impl Classification {
    /// Code used by the results table.
    pub fn code(&self) -> &'static str {
        match self {
            Classification::Stage => "stage",
            Classification::Gc => "general",
            Classification::Points => "points",
            Classification::Mountains => "mountains",
            Classification::Youth => "youth",
            Classification::Teams => "teams",
        }
    }

    pub fn from_code(code: &str) -> Result<Self, StageError> {
        match code {
            "stage" => Ok(Classification::Stage),
            "general" => Ok(Classification::Gc),
            "points" => Ok(Classification::Points),
            "mountains" => Ok(Classification::Mountains),
            "youth" => Ok(Classification::Youth),
            "teams" => Ok(Classification::Teams),
            other => Err(StageError::UnknownClassification(other.to_string())),
        }
    }
}

impl FromStr for Classification {
    type Err = StageError;

    /// Accepts both the store code (`general`) and the JSON name (`gc`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gc" => Ok(Classification::Gc),
            other => Classification::from_code(other),
        }
    }
}

/// One row of a stage's results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageResult {
    pub rank: u32,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub rider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub team: Option<String>,
    /// Finishing time in seconds.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub time: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub points: Option<i64>,
    pub classification: Classification,
}

/// Number of answerable results in each classification of a stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidResultCounts {
    pub stage: u32,
    pub general: u32,
    pub points: u32,
    pub mountains: u32,
    pub youth: u32,
    pub teams: u32,
}

impl ValidResultCounts {
    pub fn get(&self, classification: Classification) -> u32 {
        match classification {
            Classification::Stage => self.stage,
            Classification::Gc => self.general,
            Classification::Points => self.points,
            Classification::Mountains => self.mountains,
            Classification::Youth => self.youth,
            Classification::Teams => self.teams,
        }
    }

    pub fn set(&mut self, classification: Classification, count: u32) {
        let slot = match classification {
            Classification::Stage => &mut self.stage,
            Classification::Gc => &mut self.general,
            Classification::Points => &mut self.points,
            Classification::Mountains => &mut self.mountains,
            Classification::Youth => &mut self.youth,
            Classification::Teams => &mut self.teams,
        };
        *slot = count;
    }
}

/// The name a player has to guess for a result row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RiderOrTeam {
    Rider(String),
    Team(String),
}

impl RiderOrTeam {
    /// Prefers the rider; falls back to the team. Every row carries a team.
    pub fn from_result(result: &StageResult) -> Result<Self, StageError> {
        match (&result.rider, &result.team) {
            (_, None) => Err(StageError::MissingTeam),
            (Some(rider), Some(_)) => Ok(RiderOrTeam::Rider(rider.clone())),
            (None, Some(team)) => Ok(RiderOrTeam::Team(team.clone())),
        }
    }

    pub fn is_rider(&self) -> bool {
        matches!(self, RiderOrTeam::Rider(_))
    }

    pub fn name(&self) -> &str {
        match self {
            RiderOrTeam::Rider(name) | RiderOrTeam::Team(name) => name,
        }
    }
}
