use rusqlite::Connection;
use std::path::Path;

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join("campd.sqlite3");
    let conn = Connection::open(db_path)?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS campers(
            id TEXT PRIMARY KEY,
            person_id TEXT,
            name TEXT NOT NULL,
            age INTEGER,
            grade TEXT,
            guardian_email TEXT,
            guardian_phone TEXT,
            allergies TEXT,
            medical_notes TEXT
        )",
        [],
    )?;
    // Duplicate suppression on import looks campers up by their external id.
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_campers_person ON campers(person_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS staff(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            role TEXT NOT NULL,
            department TEXT,
            email TEXT,
            phone TEXT,
            hire_date TEXT
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS awards(
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            child_id TEXT NOT NULL,
            date TEXT NOT NULL,
            category TEXT,
            description TEXT
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_awards_child ON awards(child_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS daily_notes(
            id TEXT PRIMARY KEY,
            child_id TEXT NOT NULL,
            date TEXT NOT NULL,
            mood TEXT,
            activities TEXT,
            meals TEXT,
            nap TEXT,
            notes TEXT
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_daily_notes_child ON daily_notes(child_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS trips(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            type TEXT NOT NULL,
            date TEXT NOT NULL,
            destination TEXT,
            departure_time TEXT,
            return_time TEXT,
            capacity INTEGER,
            chaperone TEXT,
            status TEXT
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS menu_items(
            id TEXT PRIMARY KEY,
            date TEXT NOT NULL,
            meal_type TEXT NOT NULL,
            items TEXT NOT NULL,
            allergens TEXT
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS incident_reports(
            id TEXT PRIMARY KEY,
            child_id TEXT,
            date TEXT NOT NULL,
            type TEXT NOT NULL,
            description TEXT NOT NULL,
            severity TEXT,
            reported_by TEXT,
            status TEXT,
            tags TEXT
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_incident_reports_child ON incident_reports(child_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS incident_campers(
            incident_id TEXT NOT NULL,
            camper_id TEXT NOT NULL,
            PRIMARY KEY(incident_id, camper_id),
            FOREIGN KEY(incident_id) REFERENCES incident_reports(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_incident_campers_camper ON incident_campers(camper_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS medication_logs(
            id TEXT PRIMARY KEY,
            child_id TEXT NOT NULL,
            date TEXT NOT NULL,
            medication_name TEXT NOT NULL,
            scheduled_time TEXT NOT NULL,
            dosage TEXT,
            notes TEXT
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_medication_logs_child ON medication_logs(child_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS calendar_events(
            id TEXT PRIMARY KEY,
            event_date TEXT NOT NULL,
            title TEXT NOT NULL,
            type TEXT NOT NULL,
            description TEXT,
            time TEXT,
            location TEXT
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS sports_calendar_events(
            id TEXT PRIMARY KEY,
            event_date TEXT NOT NULL,
            title TEXT NOT NULL,
            sport_type TEXT NOT NULL,
            time TEXT,
            location TEXT,
            team TEXT,
            opponent TEXT
        )",
        [],
    )?;

    // The recurrence columns arrived after the original table shape; they
    // are added here rather than in the CREATE so pre-existing workspaces
    // pick them up too.
    ensure_medication_recurrence_columns(&conn)?;

    Ok(conn)
}

fn ensure_medication_recurrence_columns(conn: &Connection) -> anyhow::Result<()> {
    if !table_has_column(conn, "medication_logs", "recurrence")? {
        conn.execute("ALTER TABLE medication_logs ADD COLUMN recurrence TEXT", [])?;
    }
    if !table_has_column(conn, "medication_logs", "recurrence_end_date")? {
        conn.execute(
            "ALTER TABLE medication_logs ADD COLUMN recurrence_end_date TEXT",
            [],
        )?;
    }
    Ok(())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> anyhow::Result<bool> {
    let sql = format!("PRAGMA table_info({})", table);
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}
