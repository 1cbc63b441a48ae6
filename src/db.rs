use anyhow::Context;
use chrono::NaiveDate;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{MoodRecord, Selection};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Contact numbers are stored digits-only; whatever arrives over the
/// messaging channel gets stripped of spaces, dashes and the leading plus.
pub fn normalize_contact(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let company_atlas = Uuid::parse_str("7b1e9d5a-6a54-4f3e-9d7b-0f6f4f8a2c11")?;
    let company_horizon = Uuid::parse_str("3e8c2f4d-91b7-4c2a-b7aa-5c9f1d2e6a42")?;
    let group_people_ops = Uuid::parse_str("5d2a7c81-43f6-4b9e-8f1d-9e3b6a7c5d20")?;

    let employees = vec![
        (
            Uuid::parse_str("cf3a1d62-8e4b-4a7f-b2c9-d1e5f6a7b801")?,
            "Amira Hassan",
            "971509784398",
            company_atlas,
            Some(group_people_ops),
            false,
        ),
        (
            Uuid::parse_str("2b9e4c17-5f3d-4a86-9c2e-7d1b8f6a3e02")?,
            "Dan Okafor",
            "971504412765",
            company_atlas,
            Some(group_people_ops),
            false,
        ),
        (
            Uuid::parse_str("8d5f2a93-1c7e-4b64-a8f1-3e9c6d2b7f03")?,
            "Mei Chen",
            "97155298310",
            company_horizon,
            None,
            false,
        ),
        (
            Uuid::parse_str("4a7c9e25-6d1f-4832-b5a9-8c3e7f1d2604")?,
            "Lucia Alvarez",
            "971561177204",
            company_horizon,
            None,
            true,
        ),
    ];

    for (id, full_name, contact_number, company_id, group_id, is_deleted) in employees {
        sqlx::query(
            r#"
            INSERT INTO workpulse.employees
            (id, full_name, contact_number, company_id, group_id, is_deleted)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (contact_number) DO UPDATE
            SET full_name = EXCLUDED.full_name,
                company_id = EXCLUDED.company_id,
                group_id = EXCLUDED.group_id,
                is_deleted = EXCLUDED.is_deleted
            "#,
        )
        .bind(id)
        .bind(full_name)
        .bind(contact_number)
        .bind(company_id)
        .bind(group_id)
        .bind(is_deleted)
        .execute(pool)
        .await?;
    }

    let checks = vec![
        (
            "a1d4f7b2-0c3e-4961-8d5a-2f7b9c1e6a11",
            "971509784398",
            "1",
            NaiveDate::from_ymd_opt(2026, 7, 6).context("invalid date")?,
            None,
        ),
        (
            "b2e5a8c3-1d4f-4072-9e6b-3a8c0d2f7b12",
            "971509784398",
            "2",
            NaiveDate::from_ymd_opt(2026, 7, 13).context("invalid date")?,
            Some("Busy sprint but manageable"),
        ),
        (
            "c3f6b9d4-2e5a-4183-af7c-4b9d1e3a8c13",
            "971509784398",
            "2",
            NaiveDate::from_ymd_opt(2026, 7, 20).context("invalid date")?,
            None,
        ),
        (
            "d4a7c0e5-3f6b-4294-b08d-5c0e2f4b9d14",
            "971504412765",
            "3",
            NaiveDate::from_ymd_opt(2026, 7, 6).context("invalid date")?,
            None,
        ),
        (
            "e5b8d1f6-4a7c-43a5-c19e-6d1f3a5c0e15",
            "971504412765",
            "4",
            NaiveDate::from_ymd_opt(2026, 7, 13).context("invalid date")?,
            Some("Workload has been overwhelming"),
        ),
        (
            "f6c9e2a7-5b8d-44b6-d2af-7e2a4b6d1f16",
            "97155298310",
            "1",
            NaiveDate::from_ymd_opt(2026, 7, 20).context("invalid date")?,
            None,
        ),
    ];

    for (check_id, contact_number, mood, checked_on, comment) in checks {
        let employee_id: Uuid =
            sqlx::query("SELECT id FROM workpulse.employees WHERE contact_number = $1")
                .bind(contact_number)
                .fetch_one(pool)
                .await?
                .get("id");

        sqlx::query(
            r#"
            INSERT INTO workpulse.mood_checks (id, employee_id, mood, checked_on, comment)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(Uuid::parse_str(check_id)?)
        .bind(employee_id)
        .bind(mood)
        .bind(checked_on)
        .bind(comment)
        .execute(pool)
        .await?;
    }

    Ok(())
}

/// Resolve the employee population for a selection. Deleted employees are
/// never eligible.
pub async fn fetch_employee_ids(pool: &PgPool, selection: &Selection) -> anyhow::Result<Vec<Uuid>> {
    let rows = match selection {
        Selection::Group(group_id) => {
            sqlx::query(
                "SELECT id FROM workpulse.employees \
                 WHERE group_id = $1 AND is_deleted = FALSE ORDER BY id",
            )
            .bind(group_id)
            .fetch_all(pool)
            .await?
        }
        Selection::Companies(company_ids) => {
            sqlx::query(
                "SELECT id FROM workpulse.employees \
                 WHERE company_id = ANY($1) AND is_deleted = FALSE ORDER BY id",
            )
            .bind(company_ids)
            .fetch_all(pool)
            .await?
        }
    };

    Ok(rows.into_iter().map(|row| row.get("id")).collect())
}

/// Load mood records for the population, optionally bounded by an inclusive
/// date range. Ordered by date, then employee.
pub async fn fetch_mood_records(
    pool: &PgPool,
    employee_ids: &[Uuid],
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> anyhow::Result<Vec<MoodRecord>> {
    let mut query = String::from(
        "SELECT employee_id, mood, checked_on FROM workpulse.mood_checks \
         WHERE employee_id = ANY($1)",
    );

    if start_date.is_some() && end_date.is_some() {
        query.push_str(" AND checked_on >= $2 AND checked_on <= $3");
    } else if start_date.is_some() {
        query.push_str(" AND checked_on >= $2");
    } else if end_date.is_some() {
        query.push_str(" AND checked_on <= $2");
    }
    query.push_str(" ORDER BY checked_on, employee_id");

    let mut rows = sqlx::query(&query).bind(employee_ids);
    if let Some(start) = start_date {
        rows = rows.bind(start);
    }
    if let Some(end) = end_date {
        rows = rows.bind(end);
    }

    let fetched = rows.fetch_all(pool).await?;
    let mut records = Vec::new();

    for row in fetched {
        records.push(MoodRecord {
            employee_id: row.get("employee_id"),
            date: row.get("checked_on"),
            mood: row.get("mood"),
        });
    }

    Ok(records)
}

async fn employee_id_by_contact(pool: &PgPool, contact_number: &str) -> anyhow::Result<Uuid> {
    let normalized = normalize_contact(contact_number);
    let row = sqlx::query(
        "SELECT id FROM workpulse.employees \
         WHERE contact_number = $1 AND is_deleted = FALSE",
    )
    .bind(&normalized)
    .fetch_optional(pool)
    .await?
    .with_context(|| format!("no employee found with contact number {normalized}"))?;

    Ok(row.get("id"))
}

pub async fn record_check_in(
    pool: &PgPool,
    contact_number: &str,
    mood: &str,
    checked_on: NaiveDate,
    comment: Option<&str>,
) -> anyhow::Result<Uuid> {
    let employee_id = employee_id_by_contact(pool, contact_number).await?;
    let check_id = Uuid::new_v4();

    sqlx::query(
        r#"
        INSERT INTO workpulse.mood_checks (id, employee_id, mood, checked_on, comment)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(check_id)
    .bind(employee_id)
    .bind(mood)
    .bind(checked_on)
    .bind(comment)
    .execute(pool)
    .await?;

    Ok(check_id)
}

/// Attach a free-text comment to an employee's existing check(s) on a date.
/// Returns how many checks were annotated.
pub async fn attach_comment(
    pool: &PgPool,
    contact_number: &str,
    checked_on: NaiveDate,
    text: &str,
) -> anyhow::Result<u64> {
    let employee_id = employee_id_by_contact(pool, contact_number).await?;

    let result = sqlx::query(
        "UPDATE workpulse.mood_checks SET comment = $1 \
         WHERE employee_id = $2 AND checked_on = $3",
    )
    .bind(text)
    .bind(employee_id)
    .bind(checked_on)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        full_name: String,
        contact_number: String,
        company_id: Uuid,
        group_id: Option<Uuid>,
        mood: String,
        checked_on: NaiveDate,
        comment: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut inserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let employee_id: Uuid = sqlx::query(
            r#"
            INSERT INTO workpulse.employees
            (id, full_name, contact_number, company_id, group_id)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (contact_number) DO UPDATE
            SET full_name = EXCLUDED.full_name,
                company_id = EXCLUDED.company_id,
                group_id = EXCLUDED.group_id
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&row.full_name)
        .bind(normalize_contact(&row.contact_number))
        .bind(row.company_id)
        .bind(row.group_id)
        .fetch_one(pool)
        .await?
        .get("id");

        let result = sqlx::query(
            r#"
            INSERT INTO workpulse.mood_checks (id, employee_id, mood, checked_on, comment)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(employee_id)
        .bind(&row.mood)
        .bind(row.checked_on)
        .bind(&row.comment)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    Ok(inserted)
}
