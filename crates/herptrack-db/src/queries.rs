use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use rust_decimal::Decimal;
use uuid::Uuid;

use herptrack_types::models::{Animal, FeedingEvent, WeightEntry};

use crate::models::{AnimalPatch, NewAnimal, UserRow};
use crate::{Database, StoreError, StoreResult};

impl Database {
    // -- Users --

    pub fn create_user(
        &self,
        id: Uuid,
        username: &str,
        email: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, email, password, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![id.to_string(), username, email, password_hash, now, now],
            )
            .map_err(map_unique_violation)?;
            Ok(())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> StoreResult<Option<UserRow>> {
        self.with_conn(|conn| {
            let row = conn
                .prepare(
                    "SELECT id, username, email, password, created_at
                     FROM users WHERE username = ?1",
                )?
                .query_row([username], user_from_row)
                .optional()?;
            Ok(row)
        })
    }

    pub fn delete_user(&self, id: Uuid) -> StoreResult<()> {
        self.with_conn(|conn| {
            let affected = conn.execute(
                "DELETE FROM users WHERE id = ?1",
                [id.to_string()],
            )?;
            if affected == 0 {
                return Err(StoreError::NotFound("user"));
            }
            Ok(())
        })
    }

    // -- Animals --

    pub fn list_animals(
        &self,
        user_id: Uuid,
        search: Option<&str>,
    ) -> StoreResult<Vec<Animal>> {
        self.with_conn(|conn| {
            let rows = match search {
                Some(term) => {
                    let pattern = format!("%{term}%");
                    conn.prepare(
                        "SELECT id, user_id, name, breed, morph, weight, last_feeding_date,
                                feeding_frequency_days, created_at, updated_at
                         FROM animals
                         WHERE user_id = ?1 AND (name LIKE ?2 OR breed LIKE ?2)
                         ORDER BY name",
                    )?
                    .query_map(params![user_id.to_string(), pattern], animal_from_row)?
                    .collect::<Result<Vec<_>, _>>()?
                }
                None => conn
                    .prepare(
                        "SELECT id, user_id, name, breed, morph, weight, last_feeding_date,
                                feeding_frequency_days, created_at, updated_at
                         FROM animals
                         WHERE user_id = ?1
                         ORDER BY name",
                    )?
                    .query_map([user_id.to_string()], animal_from_row)?
                    .collect::<Result<Vec<_>, _>>()?,
            };
            Ok(rows)
        })
    }

    pub fn get_animal(&self, user_id: Uuid, animal_id: Uuid) -> StoreResult<Option<Animal>> {
        self.with_conn(|conn| query_animal(conn, user_id, animal_id))
    }

    /// Insert the animal and, when a weight is supplied, its first
    /// weight-history row in one transaction, all or nothing.
    pub fn create_animal(
        &self,
        user_id: Uuid,
        new: NewAnimal,
        now: DateTime<Utc>,
    ) -> StoreResult<Animal> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let id = Uuid::new_v4();

            tx.execute(
                "INSERT INTO animals (id, user_id, name, breed, morph, weight,
                                      last_feeding_date, feeding_frequency_days,
                                      created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    id.to_string(),
                    user_id.to_string(),
                    new.name,
                    new.breed,
                    new.morph,
                    new.weight.map(|w| w.to_string()),
                    new.last_feeding_date,
                    new.feeding_frequency_days,
                    now,
                    now,
                ],
            )?;

            if let Some(weight) = new.weight {
                insert_weight_entry(&tx, id, weight, now)?;
            }

            tx.commit()?;

            Ok(Animal {
                id,
                user_id,
                name: new.name,
                breed: new.breed,
                morph: new.morph,
                weight: new.weight,
                last_feeding_date: new.last_feeding_date,
                feeding_frequency_days: new.feeding_frequency_days,
                created_at: now,
                updated_at: now,
            })
        })
    }

    /// Partial update with an optimistic-concurrency check on `updated_at`.
    /// A weight change to a new value appends exactly one history row in the
    /// same transaction; an unchanged value appends none.
    pub fn update_animal(
        &self,
        user_id: Uuid,
        animal_id: Uuid,
        patch: AnimalPatch,
        now: DateTime<Utc>,
    ) -> StoreResult<Animal> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let Some(current) = query_animal(&tx, user_id, animal_id)? else {
                return Err(StoreError::NotFound("animal"));
            };
            let seen_updated_at = current.updated_at;
            let weight_changed = patch.weight.is_some_and(|w| current.weight != Some(w));

            let updated = Animal {
                id: current.id,
                user_id: current.user_id,
                name: patch.name.unwrap_or(current.name),
                breed: patch.breed.or(current.breed),
                morph: patch.morph.or(current.morph),
                weight: patch.weight.or(current.weight),
                last_feeding_date: patch.last_feeding_date.or(current.last_feeding_date),
                feeding_frequency_days: patch
                    .feeding_frequency_days
                    .unwrap_or(current.feeding_frequency_days),
                created_at: current.created_at,
                updated_at: now,
            };

            let affected = tx.execute(
                "UPDATE animals
                 SET name = ?1, breed = ?2, morph = ?3, weight = ?4,
                     last_feeding_date = ?5, feeding_frequency_days = ?6, updated_at = ?7
                 WHERE id = ?8 AND user_id = ?9 AND updated_at = ?10",
                params![
                    updated.name,
                    updated.breed,
                    updated.morph,
                    updated.weight.map(|w| w.to_string()),
                    updated.last_feeding_date,
                    updated.feeding_frequency_days,
                    updated.updated_at,
                    animal_id.to_string(),
                    user_id.to_string(),
                    seen_updated_at,
                ],
            )?;

            if affected == 0 {
                // Lost the race: another request wrote or deleted the row
                // since our read.
                return match query_animal(&tx, user_id, animal_id)? {
                    Some(_) => Err(StoreError::Conflict),
                    None => Err(StoreError::NotFound("animal")),
                };
            }

            if weight_changed {
                if let Some(weight) = patch.weight {
                    insert_weight_entry(&tx, animal_id, weight, now)?;
                }
            }

            tx.commit()?;
            Ok(updated)
        })
    }

    pub fn delete_animal(&self, user_id: Uuid, animal_id: Uuid) -> StoreResult<()> {
        self.with_conn(|conn| {
            let affected = conn.execute(
                "DELETE FROM animals WHERE id = ?1 AND user_id = ?2",
                params![animal_id.to_string(), user_id.to_string()],
            )?;
            if affected == 0 {
                return Err(StoreError::NotFound("animal"));
            }
            Ok(())
        })
    }

    pub fn weight_history(
        &self,
        user_id: Uuid,
        animal_id: Uuid,
    ) -> StoreResult<Vec<WeightEntry>> {
        self.with_conn(|conn| {
            if query_animal(conn, user_id, animal_id)?.is_none() {
                return Err(StoreError::NotFound("animal"));
            }

            let rows = conn
                .prepare(
                    "SELECT id, animal_id, weight, recorded_at
                     FROM weight_history
                     WHERE animal_id = ?1
                     ORDER BY recorded_at",
                )?
                .query_map([animal_id.to_string()], weight_entry_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn feeding_history_for_animal(
        &self,
        user_id: Uuid,
        animal_id: Uuid,
    ) -> StoreResult<Vec<FeedingEvent>> {
        self.with_conn(|conn| {
            if query_animal(conn, user_id, animal_id)?.is_none() {
                return Err(StoreError::NotFound("animal"));
            }

            let rows = conn
                .prepare(
                    "SELECT id, animal_id, feeding_date, notes, created_at
                     FROM feeding_history
                     WHERE animal_id = ?1
                     ORDER BY feeding_date DESC",
                )?
                .query_map([animal_id.to_string()], feeding_event_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Feedings --

    pub fn list_feedings(
        &self,
        user_id: Uuid,
        animal_id: Option<Uuid>,
    ) -> StoreResult<Vec<FeedingEvent>> {
        self.with_conn(|conn| {
            let rows = match animal_id {
                Some(animal_id) => conn
                    .prepare(
                        "SELECT fh.id, fh.animal_id, fh.feeding_date, fh.notes, fh.created_at
                         FROM feeding_history fh
                         JOIN animals a ON fh.animal_id = a.id
                         WHERE a.user_id = ?1 AND fh.animal_id = ?2
                         ORDER BY fh.feeding_date DESC",
                    )?
                    .query_map(
                        params![user_id.to_string(), animal_id.to_string()],
                        feeding_event_from_row,
                    )?
                    .collect::<Result<Vec<_>, _>>()?,
                None => conn
                    .prepare(
                        "SELECT fh.id, fh.animal_id, fh.feeding_date, fh.notes, fh.created_at
                         FROM feeding_history fh
                         JOIN animals a ON fh.animal_id = a.id
                         WHERE a.user_id = ?1
                         ORDER BY fh.feeding_date DESC",
                    )?
                    .query_map([user_id.to_string()], feeding_event_from_row)?
                    .collect::<Result<Vec<_>, _>>()?,
            };
            Ok(rows)
        })
    }

    /// Insert the feeding event and advance the animal's
    /// `last_feeding_date` pointer in one transaction. This method is the
    /// sole writer of that pointer: it takes the new event's date as-is,
    /// even when that date is earlier than the current value.
    pub fn record_feeding(
        &self,
        user_id: Uuid,
        animal_id: Uuid,
        feeding_date: DateTime<Utc>,
        notes: Option<&str>,
        now: DateTime<Utc>,
    ) -> StoreResult<FeedingEvent> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            if query_animal(&tx, user_id, animal_id)?.is_none() {
                return Err(StoreError::NotFound("animal"));
            }

            let id = Uuid::new_v4();
            tx.execute(
                "INSERT INTO feeding_history (id, animal_id, feeding_date, notes, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id.to_string(), animal_id.to_string(), feeding_date, notes, now],
            )?;

            tx.execute(
                "UPDATE animals SET last_feeding_date = ?1, updated_at = ?2 WHERE id = ?3",
                params![feeding_date, now, animal_id.to_string()],
            )?;

            tx.commit()?;

            Ok(FeedingEvent {
                id,
                animal_id,
                feeding_date,
                notes: notes.map(str::to_owned),
                created_at: now,
            })
        })
    }

    /// Remove one feeding event. The animal's `last_feeding_date` is left
    /// alone: the pointer tracks the most recently recorded event, not the
    /// maximum surviving date.
    pub fn delete_feeding(&self, user_id: Uuid, feeding_id: Uuid) -> StoreResult<()> {
        self.with_conn(|conn| {
            let affected = conn.execute(
                "DELETE FROM feeding_history
                 WHERE id = ?1
                   AND animal_id IN (SELECT id FROM animals WHERE user_id = ?2)",
                params![feeding_id.to_string(), user_id.to_string()],
            )?;
            if affected == 0 {
                return Err(StoreError::NotFound("feeding event"));
            }
            Ok(())
        })
    }
}

fn query_animal(
    conn: &Connection,
    user_id: Uuid,
    animal_id: Uuid,
) -> StoreResult<Option<Animal>> {
    let row = conn
        .prepare(
            "SELECT id, user_id, name, breed, morph, weight, last_feeding_date,
                    feeding_frequency_days, created_at, updated_at
             FROM animals
             WHERE id = ?1 AND user_id = ?2",
        )?
        .query_row(
            params![animal_id.to_string(), user_id.to_string()],
            animal_from_row,
        )
        .optional()?;
    Ok(row)
}

fn insert_weight_entry(
    conn: &Connection,
    animal_id: Uuid,
    weight: Decimal,
    recorded_at: DateTime<Utc>,
) -> StoreResult<()> {
    conn.execute(
        "INSERT INTO weight_history (id, animal_id, weight, recorded_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            Uuid::new_v4().to_string(),
            animal_id.to_string(),
            weight.to_string(),
            recorded_at,
        ],
    )?;
    Ok(())
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: uuid_col(row, 0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn animal_from_row(row: &Row<'_>) -> rusqlite::Result<Animal> {
    Ok(Animal {
        id: uuid_col(row, 0)?,
        user_id: uuid_col(row, 1)?,
        name: row.get(2)?,
        breed: row.get(3)?,
        morph: row.get(4)?,
        weight: weight_col(row, 5)?,
        last_feeding_date: row.get(6)?,
        feeding_frequency_days: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

fn weight_entry_from_row(row: &Row<'_>) -> rusqlite::Result<WeightEntry> {
    Ok(WeightEntry {
        id: uuid_col(row, 0)?,
        animal_id: uuid_col(row, 1)?,
        weight: weight_col(row, 2)?.ok_or_else(|| {
            rusqlite::Error::InvalidColumnType(2, "weight".into(), Type::Null)
        })?,
        recorded_at: row.get(3)?,
    })
}

fn feeding_event_from_row(row: &Row<'_>) -> rusqlite::Result<FeedingEvent> {
    Ok(FeedingEvent {
        id: uuid_col(row, 0)?,
        animal_id: uuid_col(row, 1)?,
        feeding_date: row.get(2)?,
        notes: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn uuid_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let s: String = row.get(idx)?;
    s.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn weight_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Decimal>> {
    let s: Option<String> = row.get(idx)?;
    s.map(|s| s.parse::<Decimal>())
        .transpose()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn map_unique_violation(err: rusqlite::Error) -> StoreError {
    if let rusqlite::Error::SqliteFailure(e, Some(msg)) = &err {
        if e.code == rusqlite::ErrorCode::ConstraintViolation {
            if msg.contains("users.username") {
                return StoreError::Duplicate("username");
            }
            if msg.contains("users.email") {
                return StoreError::Duplicate("email");
            }
        }
    }
    StoreError::Sqlite(err)
}
