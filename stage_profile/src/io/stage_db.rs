use log::debug;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use thiserror::Error;

use crate::config::ProfileConfig;
use crate::profile::{ElevationPoint, ElevationProfile, GradientPoint, ProfileError};
use crate::stage::{
    Classification, GrandTour, InfoField, StageError, StageInfo, StageResult, StageType,
    ValidResultCounts,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sql(#[from] rusqlite::Error),
    #[error("stage {0} not found")]
    StageNotFound(i64),
    #[error("no {classification:?} result ranked {rank} for stage {stage_id}")]
    ResultNotFound {
        stage_id: i64,
        classification: Classification,
        rank: u32,
    },
    #[error(transparent)]
    Stage(#[from] StageError),
    #[error(transparent)]
    Profile(#[from] ProfileError),
}

pub const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS stages (
        stage_id INTEGER PRIMARY KEY,
        grand_tour TEXT NOT NULL,
        year INTEGER NOT NULL,
        stage_number INTEGER NOT NULL,
        stage_type TEXT NOT NULL,
        stage_start TEXT NOT NULL,
        stage_end TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS stages_elevation (
        stage_id INTEGER NOT NULL,
        distance REAL NOT NULL,
        elevation REAL NOT NULL
    );
    CREATE TABLE IF NOT EXISTS results (
        stage_id INTEGER NOT NULL,
        classification TEXT NOT NULL,
        rank INTEGER NOT NULL,
        rider TEXT,
        team TEXT,
        time_seconds INTEGER,
        points INTEGER
    );";

type ResultRow = (String, u32, Option<String>, Option<String>, Option<u32>, Option<i64>);

const RESULT_COLUMNS: &str = "classification, rank, rider, team, time_seconds, points";

/// Orders store codes the way [`Classification`] declares its variants.
const CLASSIFICATION_ORDER: &str = "CASE classification
        WHEN 'stage' THEN 0
        WHEN 'general' THEN 1
        WHEN 'points' THEN 2
        WHEN 'mountains' THEN 3
        WHEN 'youth' THEN 4
        WHEN 'teams' THEN 5
        ELSE 6
    END";

fn result_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ResultRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

fn to_result(row: ResultRow) -> Result<StageResult, StageError> {
    let (classification, rank, rider, team, time, points) = row;
    Ok(StageResult {
        rank,
        rider,
        team,
        time,
        points,
        classification: Classification::from_code(&classification)?,
    })
}

/// Read-only access to a SQLite store of stages, elevation samples and results.
pub struct StageDb {
    conn: Connection,
}

impl StageDb {
    /// Opens an existing store without write access.
    pub fn open(path: &str) -> Result<Self, StoreError> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self { conn })
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    /// Creates the store tables on a writable connection.
    pub fn create_schema(conn: &Connection) -> rusqlite::Result<()> {
        conn.execute_batch(SCHEMA)
    }

    pub fn stage_ids(&self) -> Result<Vec<i64>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT stage_id FROM stages ORDER BY stage_id")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<i64>>>()?;
        Ok(ids)
    }

    pub fn stage_info(&self, stage_id: i64) -> Result<StageInfo, StoreError> {
        let row = self
            .conn
            .query_row(
                "SELECT grand_tour, year, stage_number, stage_type, stage_start, stage_end
                 FROM stages WHERE stage_id = ?1",
                params![stage_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i32>(1)?,
                        row.get::<_, i32>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, String>(5)?,
                    ))
                },
            )
            .optional()?;
        let (grand_tour, year, stage_number, stage_type, stage_start, stage_end) =
            row.ok_or(StoreError::StageNotFound(stage_id))?;
        Ok(StageInfo {
            grand_tour: GrandTour::from_code(&grand_tour)?,
            year,
            stage_number,
            stage_type: StageType::from_code(&stage_type)?,
            stage_start,
            stage_end,
        })
    }

    /// Raw elevation samples of a stage, ordered by distance.
    pub fn elevation_profile(&self, stage_id: i64) -> Result<Vec<ElevationPoint>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT distance, elevation FROM stages_elevation
             WHERE stage_id = ?1 ORDER BY distance",
        )?;
        let pts = stmt
            .query_map(params![stage_id], |row| {
                Ok(ElevationPoint::new(row.get(0)?, row.get(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        debug!("stage {}: {} elevation samples", stage_id, pts.len());
        Ok(pts)
    }

    /// Gradient profile of a stage. A stage without samples fails with
    /// [`ProfileError::EmptyInput`].
    pub fn gradient_profile(
        &self,
        stage_id: i64,
        config: &ProfileConfig,
    ) -> Result<Vec<GradientPoint>, StoreError> {
        let profile = ElevationProfile::try_from(self.elevation_profile(stage_id)?)?;
        Ok(profile.gradient_profile(config.resolution, config.final_point)?)
    }

    /// Correct answer for one field of a stage's info.
    pub fn answer(&self, stage_id: i64, field: InfoField) -> Result<String, StoreError> {
        Ok(self.stage_info(stage_id)?.answer(field))
    }

    /// Results ranked `top_n` or better in every classification, ordered by
    /// classification then rank.
    pub fn results(&self, stage_id: i64, top_n: u32) -> Result<Vec<StageResult>, StoreError> {
        let sql = format!(
            "SELECT {} FROM results WHERE stage_id = ?1 AND rank <= ?2
             ORDER BY {}, rank",
            RESULT_COLUMNS, CLASSIFICATION_ORDER
        );
        self.query_results(&sql, params![stage_id, top_n])
    }

    /// Results ranked `top_n` or better in one classification, ordered by rank.
    pub fn results_for_classification(
        &self,
        stage_id: i64,
        classification: Classification,
        top_n: u32,
    ) -> Result<Vec<StageResult>, StoreError> {
        let sql = format!(
            "SELECT {} FROM results
             WHERE stage_id = ?1 AND classification = ?2 AND rank <= ?3
             ORDER BY rank",
            RESULT_COLUMNS
        );
        self.query_results(&sql, params![stage_id, classification.code(), top_n])
    }

    fn query_results(
        &self,
        sql: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<StageResult>, StoreError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, result_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        let results = rows
            .into_iter()
            .map(to_result)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(results)
    }

    /// Counts the answerable results of a stage per classification. A row is
    /// answerable when it names a team.
    pub fn valid_result_counts(&self, stage_id: i64) -> Result<ValidResultCounts, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT classification, COUNT(*) FROM results
             WHERE stage_id = ?1 AND team IS NOT NULL
             GROUP BY classification",
        )?;
        let rows = stmt
            .query_map(params![stage_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, u32>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        let mut counts = ValidResultCounts::default();
        for (code, count) in rows {
            counts.set(Classification::from_code(&code)?, count);
        }
        debug!("stage {}: valid result counts {:?}", stage_id, counts);
        Ok(counts)
    }

    pub fn result_for_rank(
        &self,
        stage_id: i64,
        classification: Classification,
        rank: u32,
    ) -> Result<StageResult, StoreError> {
        let sql = format!(
            "SELECT {} FROM results
             WHERE stage_id = ?1 AND classification = ?2 AND rank = ?3",
            RESULT_COLUMNS
        );
        let row = self
            .conn
            .query_row(
                &sql,
                params![stage_id, classification.code(), rank],
                result_row,
            )
            .optional()?
            .ok_or(StoreError::ResultNotFound {
                stage_id,
                classification,
                rank,
            })?;
        Ok(to_result(row)?)
    }

    pub fn riders(&self, stage_id: i64) -> Result<Vec<String>, StoreError> {
        self.distinct_names("rider", stage_id)
    }

    pub fn teams(&self, stage_id: i64) -> Result<Vec<String>, StoreError> {
        self.distinct_names("team", stage_id)
    }

    fn distinct_names(&self, column: &str, stage_id: i64) -> Result<Vec<String>, StoreError> {
        let sql = format!(
            "SELECT DISTINCT {col} FROM results
             WHERE stage_id = ?1 AND {col} IS NOT NULL ORDER BY {col}",
            col = column
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let names = stmt
            .query_map(params![stage_id], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_db() -> StageDb {
        let conn = Connection::open_in_memory().unwrap();
        StageDb::create_schema(&conn).unwrap();
        conn.execute_batch(
            "INSERT INTO stages VALUES (3, 'TOUR', 2021, 1, 'PROLOGUE', 'Brest', 'Landerneau');
             INSERT INTO results VALUES (3, 'maillot', 1, 'Julian Alaphilippe', 'Deceuninck', NULL, NULL);",
        )
        .unwrap();
        StageDb::from_connection(conn)
    }

    #[test]
    fn unknown_codes_surface_as_stage_errors() {
        let db = memory_db();
        assert_eq!(db.stage_info(3).unwrap().stage_type, StageType::Prologue);
        assert!(matches!(
            db.results(3, 10),
            Err(StoreError::Stage(StageError::UnknownClassification(_)))
        ));
    }

    #[test]
    fn infinite_store_samples_are_rejected() {
        let db = memory_db();
        db.conn
            .execute_batch("INSERT INTO stages_elevation VALUES (3, 0, 0), (3, 9e999, 1);")
            .unwrap();
        assert!(matches!(
            db.gradient_profile(3, &ProfileConfig::default()),
            Err(StoreError::Profile(ProfileError::NonFiniteSample { index: 1 }))
        ));
    }

    #[test]
    fn unknown_stage_has_no_samples() {
        let db = memory_db();
        assert!(db.elevation_profile(42).unwrap().is_empty());
        assert!(matches!(
            db.gradient_profile(42, &ProfileConfig::default()),
            Err(StoreError::Profile(ProfileError::EmptyInput))
        ));
    }
}
