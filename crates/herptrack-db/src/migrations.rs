use rusqlite::Connection;
use tracing::info;

use crate::StoreResult;

pub fn run(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            username    TEXT NOT NULL UNIQUE,
            email       TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            created_at  TEXT NOT NULL,
            updated_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS animals (
            id                      TEXT PRIMARY KEY,
            user_id                 TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            name                    TEXT NOT NULL,
            breed                   TEXT,
            morph                   TEXT,
            weight                  TEXT,
            last_feeding_date       TEXT,
            feeding_frequency_days  INTEGER NOT NULL DEFAULT 7,
            created_at              TEXT NOT NULL,
            updated_at              TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_animals_user_name
            ON animals(user_id, name);

        CREATE TABLE IF NOT EXISTS weight_history (
            id          TEXT PRIMARY KEY,
            animal_id   TEXT NOT NULL REFERENCES animals(id) ON DELETE CASCADE,
            weight      TEXT NOT NULL,
            recorded_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_weight_history_animal
            ON weight_history(animal_id, recorded_at);

        CREATE TABLE IF NOT EXISTS feeding_history (
            id           TEXT PRIMARY KEY,
            animal_id    TEXT NOT NULL REFERENCES animals(id) ON DELETE CASCADE,
            feeding_date TEXT NOT NULL,
            notes        TEXT,
            created_at   TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_feeding_history_animal
            ON feeding_history(animal_id);

        CREATE INDEX IF NOT EXISTS idx_feeding_history_date
            ON feeding_history(feeding_date);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
