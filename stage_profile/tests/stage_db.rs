use rusqlite::{params, Connection};
use stage_profile::answer::{verify_info, verify_result};
use stage_profile::io::stage_db::{StageDb, StoreError};
use stage_profile::stage::{Classification, GrandTour, InfoField, StageType, ValidResultCounts};
use stage_profile::{FinalPoint, ProfileConfig, ProfileError};

fn fixture() -> (tempfile::TempDir, String) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stages.db");
    let conn = Connection::open(&path).unwrap();
    StageDb::create_schema(&conn).unwrap();
    conn.execute(
        "INSERT INTO stages VALUES (1, 'TOUR', 2023, 13, 'ROAD', 'Châtillon-sur-Chalaronne', 'Grand Colombier')",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO stages VALUES (2, 'GIRO', 2024, 7, 'ITT', 'Foligno', 'Perugia')",
        [],
    )
    .unwrap();
    // Deliberately out of order.
    for (d, e) in [(200.0, 10.0), (0.0, 0.0), (305.0, 1.0), (100.0, 10.0), (300.0, 0.0)] {
        conn.execute(
            "INSERT INTO stages_elevation VALUES (1, ?1, ?2)",
            params![d, e],
        )
        .unwrap();
    }
    let rows: [(&str, u32, Option<&str>, &str, Option<u32>, Option<i64>); 4] = [
        ("stage", 1, Some("Michał Kwiatkowski"), "INEOS Grenadiers", Some(14_998), None),
        ("stage", 2, Some("Maxim Van Gils"), "Lotto Dstny", Some(15_000), None),
        ("general", 1, Some("Jonas Vingegaard"), "Jumbo-Visma", Some(179_000), None),
        ("teams", 1, None, "Jumbo-Visma", Some(537_000), None),
    ];
    for (class, rank, rider, team, time, points) in rows {
        conn.execute(
            "INSERT INTO results VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6)",
            params![class, rank, rider, team, time, points],
        )
        .unwrap();
    }
    (dir, path.to_str().unwrap().to_string())
}

#[test]
fn reads_stage_info() {
    let (_dir, path) = fixture();
    let db = StageDb::open(&path).unwrap();
    assert_eq!(db.stage_ids().unwrap(), vec![1, 2]);
    let info = db.stage_info(2).unwrap();
    assert_eq!(info.grand_tour, GrandTour::Giro);
    assert_eq!(info.stage_type, StageType::Itt);
    assert_eq!(info.stage_number, 7);
    assert!(matches!(db.stage_info(99), Err(StoreError::StageNotFound(99))));
}

#[test]
fn elevation_comes_back_ordered() {
    let (_dir, path) = fixture();
    let db = StageDb::open(&path).unwrap();
    let pts = db.elevation_profile(1).unwrap();
    assert_eq!(pts.len(), 5);
    assert!(pts.windows(2).all(|w| w[0].distance <= w[1].distance));
}

#[test]
fn stage_gradient_profile() {
    let (_dir, path) = fixture();
    let db = StageDb::open(&path).unwrap();
    let out = db.gradient_profile(1, &ProfileConfig::default()).unwrap();
    assert_eq!(out.len(), 32);
    let last = out.last().unwrap();
    assert!((last.distance - 305.0).abs() < 1e-9);
    assert!((last.gradient.unwrap() - 20.0).abs() < 1e-9);

    let coarse = ProfileConfig {
        resolution: 100.0,
        final_point: FinalPoint::Skip,
    };
    assert_eq!(db.gradient_profile(1, &coarse).unwrap().len(), 5);
}

#[test]
fn stage_without_samples_is_empty_input() {
    let (_dir, path) = fixture();
    let db = StageDb::open(&path).unwrap();
    assert!(matches!(
        db.gradient_profile(2, &ProfileConfig::default()),
        Err(StoreError::Profile(ProfileError::EmptyInput))
    ));
}

#[test]
fn results_and_verification() {
    let (_dir, path) = fixture();
    let db = StageDb::open(&path).unwrap();

    let top = db.results(1, 1).unwrap();
    assert_eq!(top.len(), 3);
    assert_eq!(top[0].classification, Classification::Stage);

    let winner = db.result_for_rank(1, Classification::Stage, 1).unwrap();
    assert!(verify_result(&winner, "michal kwiatkowski").unwrap());
    assert!(!verify_result(&winner, "Van Gils").unwrap());

    let teams = db.result_for_rank(1, Classification::Teams, 1).unwrap();
    assert!(verify_result(&teams, "jumbo-visma").unwrap());

    assert!(matches!(
        db.result_for_rank(1, Classification::Youth, 1),
        Err(StoreError::ResultNotFound { rank: 1, .. })
    ));

    let info = db.stage_info(1).unwrap();
    assert!(verify_info(&info, InfoField::StageStart, "chatillon-sur-chalaronne"));
    assert!(verify_info(&info, InfoField::Year, " 2023 "));
    assert!(!verify_info(&info, InfoField::StageEnd, "Colombier"));
}

#[test]
fn rider_and_team_lists() {
    let (_dir, path) = fixture();
    let db = StageDb::open(&path).unwrap();
    assert_eq!(
        db.riders(1).unwrap(),
        vec!["Jonas Vingegaard", "Maxim Van Gils", "Michał Kwiatkowski"]
    );
    assert_eq!(
        db.teams(1).unwrap(),
        vec!["INEOS Grenadiers", "Jumbo-Visma", "Lotto Dstny"]
    );
}


#[test]
fn results_are_ordered_by_classification_then_rank() {
    let (_dir, path) = fixture();
    let db = StageDb::open(&path).unwrap();
    let all = db.results(1, 10).unwrap();
    let order: Vec<_> = all.iter().map(|r| (r.classification, r.rank)).collect();
    assert_eq!(
        order,
        vec![
            (Classification::Stage, 1),
            (Classification::Stage, 2),
            (Classification::Gc, 1),
            (Classification::Teams, 1),
        ]
    );
}

#[test]
fn results_for_one_classification() {
    let (_dir, path) = fixture();
    let db = StageDb::open(&path).unwrap();

    let stage = db.results_for_classification(1, Classification::Stage, 10).unwrap();
    assert_eq!(stage.len(), 2);
    assert_eq!(stage[0].rider.as_deref(), Some("Michał Kwiatkowski"));
    assert_eq!(stage[1].rank, 2);

    let top = db.results_for_classification(1, Classification::Stage, 1).unwrap();
    assert_eq!(top.len(), 1);
    assert!(db
        .results_for_classification(1, Classification::Youth, 10)
        .unwrap()
        .is_empty());
}

#[test]
fn valid_result_counts_skip_rows_without_team() {
    let (_dir, path) = fixture();
    let conn = Connection::open(&path).unwrap();
    conn.execute(
        "INSERT INTO results VALUES (1, 'points', 1, 'Mads Pedersen', NULL, NULL, 40)",
        [],
    )
    .unwrap();
    drop(conn);

    let db = StageDb::open(&path).unwrap();
    let counts = db.valid_result_counts(1).unwrap();
    assert_eq!(counts.get(Classification::Stage), 2);
    assert_eq!(counts.get(Classification::Gc), 1);
    assert_eq!(counts.get(Classification::Teams), 1);
    assert_eq!(counts.get(Classification::Points), 0);
    assert_eq!(counts.get(Classification::Mountains), 0);

    assert_eq!(db.valid_result_counts(2).unwrap(), ValidResultCounts::default());
}

#[test]
fn correct_answers_from_the_store() {
    let (_dir, path) = fixture();
    let db = StageDb::open(&path).unwrap();
    assert_eq!(db.answer(1, InfoField::StageEnd).unwrap(), "Grand Colombier");
    assert_eq!(db.answer(2, InfoField::GrandTour).unwrap(), "Giro d'Italia");
    assert_eq!(db.answer(2, InfoField::StageType).unwrap(), "ITT");
    assert!(matches!(
        db.answer(5, InfoField::Year),
        Err(StoreError::StageNotFound(5))
    ));
}
