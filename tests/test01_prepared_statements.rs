use d1_middleware::prelude::*;

const SCHEMA: &str = "CREATE TABLE colours (id INTEGER PRIMARY KEY, name TEXT NOT NULL, rgb INTEGER NOT NULL);
INSERT INTO colours (id, name, rgb) VALUES (1, 'red', 0xff0000), (2, 'green', 0x00ff00), (3, 'blue', 0x0000ff);";

async fn colours_db() -> Result<D1Database, D1Error> {
    let db = D1Database::builder("colours").build().await?;
    db.exec(SCHEMA).await?;
    Ok(db)
}

fn names(result: &D1Result) -> Vec<String> {
    result
        .results
        .iter()
        .filter_map(|row| row.get("name").and_then(D1Value::as_text).map(str::to_string))
        .collect()
}

#[tokio::test]
async fn all_returns_object_rows_and_meta() -> Result<(), Box<dyn std::error::Error>> {
    let db = colours_db().await?;
    let result = db.prepare("SELECT * FROM colours ORDER BY id").all().await?;

    assert!(result.success);
    assert_eq!(names(&result), vec!["red", "green", "blue"]);
    assert_eq!(result.results[0].column_names(), vec!["id", "name", "rgb"]);
    assert_eq!(result.results[2].get("rgb"), Some(&D1Value::Integer(0x0000ff)));

    let meta = &result.meta;
    assert_eq!(meta.changes, 0);
    assert_eq!(meta.rows_written, 0);
    assert!(!meta.changed_db);
    assert!(meta.rows_read >= 3);
    assert!(meta.duration >= 0.0);
    assert!(meta.size_after > 0);
    assert_eq!(meta.served_by, "d1-middleware.local");
    Ok(())
}

#[tokio::test]
async fn run_reports_changes_without_rows() -> Result<(), Box<dyn std::error::Error>> {
    let db = colours_db().await?;
    let result = db
        .prepare("INSERT INTO colours (id, name, rgb) VALUES (?, ?, ?)")
        .bind([D1Value::from(4), "yellow".into(), 0xffff00_i64.into()])
        .run()
        .await?;

    assert!(result.success);
    assert!(result.results.is_empty());
    assert_eq!(result.meta.changes, 1);
    assert_eq!(result.meta.rows_written, 1);
    assert_eq!(result.meta.last_row_id, 4);
    assert!(result.meta.changed_db);

    // A read through `run` executes but surfaces no rows.
    let read = db.prepare("SELECT * FROM colours").run().await?;
    assert!(read.results.is_empty());
    assert!(!read.meta.changed_db);
    Ok(())
}

#[tokio::test]
async fn update_matching_nothing_does_not_change_db() -> Result<(), Box<dyn std::error::Error>> {
    let db = colours_db().await?;
    let result = db
        .prepare("UPDATE colours SET name = 'none' WHERE id = 99")
        .run()
        .await?;
    assert_eq!(result.meta.changes, 0);
    assert!(!result.meta.changed_db);

    let ddl = db.prepare("CREATE TABLE other (a)").run().await?;
    assert!(ddl.meta.changed_db);
    assert_eq!(ddl.meta.changes, 0);
    Ok(())
}

#[tokio::test]
async fn schema_statements_that_change_nothing_report_unchanged() -> Result<(), Box<dyn std::error::Error>> {
    let db = colours_db().await?;

    let existing = db
        .prepare("CREATE TABLE IF NOT EXISTS colours (id INTEGER PRIMARY KEY, name TEXT, rgb INTEGER)")
        .run()
        .await?;
    assert_eq!(existing.meta.changes, 0);
    assert!(!existing.meta.changed_db);

    let absent = db.prepare("DROP TABLE IF EXISTS nothere").run().await?;
    assert!(!absent.meta.changed_db);

    let dropped = db.prepare("DROP TABLE colours").run().await?;
    assert!(dropped.meta.changed_db);

    let version = db.prepare("PRAGMA user_version = 7").run().await?;
    assert!(version.meta.changed_db);
    let same_version = db.prepare("PRAGMA user_version = 7").run().await?;
    assert!(!same_version.meta.changed_db);
    Ok(())
}

#[tokio::test]
async fn insert_returning_yields_inserted_rows() -> Result<(), Box<dyn std::error::Error>> {
    let db = colours_db().await?;
    let result = db
        .prepare(
            "INSERT INTO colours (id, name, rgb) VALUES (?1, ?2, ?3), (?4, ?5, ?6) RETURNING id, name",
        )
        .bind([
            D1Value::from(4),
            "yellow".into(),
            0xffff00_i64.into(),
            D1Value::from(5),
            "cyan".into(),
            0x00ffff_i64.into(),
        ])
        .run()
        .await?;

    assert_eq!(result.results.len(), 2);
    assert_eq!(result.results[0].get("id"), Some(&D1Value::Integer(4)));
    assert_eq!(result.results[1].get("name"), Some(&D1Value::from("cyan")));
    assert_eq!(result.meta.last_row_id, 5);
    assert_eq!(result.meta.changes, 2);
    Ok(())
}

#[tokio::test]
async fn numbered_placeholders_bind_by_index() -> Result<(), Box<dyn std::error::Error>> {
    let db = colours_db().await?;
    db.prepare("INSERT INTO colours (id, name, rgb) VALUES (?3, ?1, ?2)")
        .bind([D1Value::from("yellow"), 0xffff00_i64.into(), 4_i64.into()])
        .run()
        .await?;

    let row = db
        .prepare("SELECT * FROM colours WHERE id = ?1 AND id = ?1")
        .bind([4_i64])
        .first()
        .await?
        .expect("row 4 exists");
    assert_eq!(row.get("name"), Some(&D1Value::from("yellow")));
    assert_eq!(row.get("rgb"), Some(&D1Value::Integer(0xffff00)));
    Ok(())
}

#[tokio::test]
async fn first_returns_a_single_row_or_none() -> Result<(), Box<dyn std::error::Error>> {
    let db = colours_db().await?;
    let stmt = db.prepare("SELECT * FROM colours WHERE id >= ? ORDER BY id");

    let row = stmt.bind([2_i64]).first().await?.expect("rows match");
    assert_eq!(row.get("name"), Some(&D1Value::from("green")));
    assert_eq!(
        stmt.bind([1_i64]).first_column("name").await?,
        Some(D1Value::from("red"))
    );
    assert_eq!(stmt.bind([10_i64]).first().await?, None);
    assert_eq!(stmt.bind([10_i64]).first_column("name").await?, None);

    let err = stmt.bind([1_i64]).first_column("missing").await.unwrap_err();
    assert_eq!(err.kind(), D1ErrorKind::ColumnNotFound);
    Ok(())
}

#[tokio::test]
async fn first_still_applies_mutations() -> Result<(), Box<dyn std::error::Error>> {
    let db = colours_db().await?;
    let value = db
        .prepare("UPDATE colours SET name = 'crimson' WHERE id = 1")
        .first_column("name")
        .await?;
    assert_eq!(value, None);

    let name = db
        .prepare("SELECT name FROM colours WHERE id = 1")
        .first_column("name")
        .await?;
    assert_eq!(name, Some(D1Value::from("crimson")));
    Ok(())
}

#[tokio::test]
async fn raw_keeps_column_order_and_duplicates() -> Result<(), Box<dyn std::error::Error>> {
    let db = colours_db().await?;
    let stmt = db.prepare(
        "SELECT a.id, a.name, b.id FROM colours a JOIN colours b ON b.id = a.id + 1 ORDER BY a.id",
    );

    let rows = stmt.raw(RawOptions::default()).await?;
    assert_eq!(
        rows,
        vec![
            vec![D1Value::from(1), D1Value::from("red"), D1Value::from(2)],
            vec![D1Value::from(2), D1Value::from("green"), D1Value::from(3)],
        ]
    );

    let with_header = stmt.raw(RawOptions::default().with_column_names(true)).await?;
    assert_eq!(
        with_header[0],
        vec![D1Value::from("id"), D1Value::from("name"), D1Value::from("id")]
    );
    assert_eq!(with_header.len(), 3);

    // Object shape collapses the duplicate `id` to the last column.
    let objects = stmt.all().await?;
    assert_eq!(objects.results[0].len(), 2);
    assert_eq!(objects.results[0].get("id"), Some(&D1Value::Integer(2)));
    Ok(())
}

#[tokio::test]
async fn blobs_round_trip_through_every_shape() -> Result<(), Box<dyn std::error::Error>> {
    let db = D1Database::builder("blobs").build().await?;
    db.exec("CREATE TABLE blobs (id INTEGER PRIMARY KEY, data BLOB, label TEXT)")
        .await?;
    let bytes: Vec<u8> = vec![0, 1, 2, 127, 128, 255];
    db.prepare("INSERT INTO blobs (id, data, label) VALUES (1, ?, ?)")
        .bind([D1Value::from(bytes.clone()), D1Value::from("plain")])
        .run()
        .await?;

    let select = db.prepare("SELECT data, label FROM blobs WHERE id = 1");
    let all = select.all().await?;
    assert_eq!(all.results[0].get("data"), Some(&D1Value::Blob(bytes.clone())));
    assert_eq!(all.results[0].get("label"), Some(&D1Value::from("plain")));

    let raw = select.raw(RawOptions::default()).await?;
    assert_eq!(raw[0][0].as_blob(), Some(bytes.as_slice()));

    let first = select.first_column("data").await?;
    assert_eq!(first, Some(D1Value::Blob(bytes.clone())));

    let json_bound = db
        .prepare("SELECT ? AS data")
        .bind_json(&[serde_json::json!([0, 1, 2, 127, 128, 255])])?
        .first_column("data")
        .await?;
    assert_eq!(json_bound, Some(D1Value::Blob(bytes)));
    Ok(())
}

#[tokio::test]
async fn multi_statement_text_is_rejected_before_execution() -> Result<(), Box<dyn std::error::Error>>
{
    let db = colours_db().await?;
    let err = db
        .prepare("DELETE FROM colours; SELECT * FROM colours")
        .all()
        .await
        .unwrap_err();
    assert_eq!(err.kind(), D1ErrorKind::MultiStatement);
    assert!(err.to_string().contains("must contain only one statement"));

    let remaining = db.prepare("SELECT COUNT(*) AS n FROM colours").first_column("n").await?;
    assert_eq!(remaining, Some(D1Value::Integer(3)));
    Ok(())
}

#[tokio::test]
async fn final_statement_with_params_runs_alone() -> Result<(), Box<dyn std::error::Error>> {
    let db = colours_db().await?;
    let result = db
        .prepare("DELETE FROM colours WHERE id = 1; SELECT * FROM colours WHERE id = ?")
        .bind([3_i64])
        .all()
        .await?;
    assert_eq!(names(&result), vec!["blue"]);

    // The earlier statement was skipped, not executed.
    let count = db.prepare("SELECT COUNT(*) AS n FROM colours").first_column("n").await?;
    assert_eq!(count, Some(D1Value::Integer(3)));
    Ok(())
}

#[tokio::test]
async fn strict_policy_rejects_every_multi_statement() -> Result<(), Box<dyn std::error::Error>> {
    let db = D1Database::builder("strict")
        .multi_statement_policy(MultiStatementPolicy::Strict)
        .build()
        .await?;
    db.exec(SCHEMA).await?;
    let err = db
        .prepare("SELECT 1; SELECT * FROM colours WHERE id = ?")
        .bind([3_i64])
        .all()
        .await
        .unwrap_err();
    assert_eq!(err.kind(), D1ErrorKind::MultiStatement);
    Ok(())
}

#[tokio::test]
async fn bound_statements_are_reusable() -> Result<(), Box<dyn std::error::Error>> {
    let db = colours_db().await?;
    let stmt = db.prepare("SELECT name FROM colours WHERE id = ?");
    let red = stmt.bind([1_i64]);
    let blue = stmt.bind([3_i64]);

    assert!(stmt.params().is_empty());
    assert_eq!(red.first_column("name").await?, Some(D1Value::from("red")));
    assert_eq!(blue.first_column("name").await?, Some(D1Value::from("blue")));
    assert_eq!(red.first_column("name").await?, Some(D1Value::from("red")));
    Ok(())
}

#[tokio::test]
async fn booleans_and_nulls_bind_as_sqlite_values() -> Result<(), Box<dyn std::error::Error>> {
    let db = D1Database::builder("values").build().await?;
    let row = db
        .prepare("SELECT ?1 AS t, ?2 AS f, ?3 AS n, ?4 AS r, typeof(?3) AS nt")
        .bind([
            D1Value::from(true),
            D1Value::from(false),
            D1Value::from(None::<i64>),
            D1Value::from(1.25),
        ])
        .first()
        .await?
        .expect("one row");
    assert_eq!(row.get("t"), Some(&D1Value::Integer(1)));
    assert_eq!(row.get("f"), Some(&D1Value::Integer(0)));
    assert_eq!(row.get("n"), Some(&D1Value::Null));
    assert_eq!(row.get("r"), Some(&D1Value::Real(1.25)));
    assert_eq!(row.get("nt"), Some(&D1Value::from("null")));
    Ok(())
}
