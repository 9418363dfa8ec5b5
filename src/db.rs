//! SQLite storage for games and comments.
//!
//! The schema is two tables: `game` and `comments`, with a cascading
//! foreign key from comment to game. Game primary keys are kept
//! contiguous starting at 1: deleting a game shifts every higher id down
//! by one inside the same transaction, and comment rows follow via
//! `ON UPDATE CASCADE`. Every query here is a direct read or write; no
//! state is cached between requests.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::{Error, Result};

const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS game (
    id INTEGER PRIMARY KEY,
    gamepicture TEXT NOT NULL DEFAULT 'default.jpg',
    gamename TEXT NOT NULL,
    description TEXT NOT NULL,
    developer TEXT NOT NULL,
    publisher TEXT NOT NULL,
    releasedate TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS comments (
    commentid INTEGER PRIMARY KEY,
    commentatorsname TEXT NOT NULL,
    comment TEXT NOT NULL,
    game_id INTEGER NOT NULL REFERENCES game(id)
        ON DELETE CASCADE ON UPDATE CASCADE,
    timestamp TIMESTAMP NOT NULL
);
CREATE INDEX IF NOT EXISTS comments_game_id ON comments(game_id);
";

/// Opens a connection pool to the database at `url`, creating the file if
/// it does not exist yet.
///
/// Foreign key enforcement is switched on for every connection; the
/// comment cascade depends on it.
///
/// # Errors
///
/// Returns an error if the URL is invalid or the database is unreachable.
pub async fn connect(url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(true);

    // An in-memory database exists per connection, so the pool must keep
    // exactly one open for the database to survive.
    let mut pool_options = SqlitePoolOptions::new();
    if url.contains(":memory:") {
        pool_options = pool_options
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None);
    }

    let pool = pool_options.connect_with(options).await?;
    Ok(pool)
}

/// Creates the schema if it is not present.
///
/// # Errors
///
/// Returns an error if a DDL statement fails.
pub async fn migrate(pool: &SqlitePool) -> Result<()> {
    sqlx::raw_sql(SCHEMA).execute(pool).await?;
    Ok(())
}

/// A game row.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Game {
    pub id: i64,
    pub gamepicture: String,
    pub gamename: String,
    pub description: String,
    pub developer: String,
    pub publisher: String,
    pub releasedate: String,
}

/// The subset of a game row shown on the landing page and admin panel.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct GameSummary {
    pub id: i64,
    pub gamename: String,
    pub gamepicture: String,
}

/// Field values for a game to be inserted.
#[derive(Debug, Clone)]
pub struct NewGame {
    pub gamepicture: String,
    pub gamename: String,
    pub description: String,
    pub developer: String,
    pub publisher: String,
    pub releasedate: String,
}

/// A partial update of a game row. `None` fields keep their prior values.
#[derive(Debug, Clone, Default)]
pub struct GameUpdate {
    pub gamepicture: Option<String>,
    pub gamename: Option<String>,
    pub description: Option<String>,
    pub developer: Option<String>,
    pub publisher: Option<String>,
    pub releasedate: Option<String>,
}

/// A comment row.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Comment {
    pub commentid: i64,
    pub commentatorsname: String,
    pub comment: String,
    pub game_id: i64,
    pub timestamp: DateTime<Utc>,
}

impl Game {
    /// Returns id, name and picture of every game in ascending id order.
    pub async fn all_summaries(pool: &SqlitePool) -> Result<Vec<GameSummary>> {
        let games = sqlx::query_as::<_, GameSummary>(
            "SELECT id, gamename, gamepicture FROM game ORDER BY id",
        )
        .fetch_all(pool)
        .await?;
        Ok(games)
    }

    /// Fetches a single game by id, or `None` if it does not exist.
    pub async fn by_id(pool: &SqlitePool, id: i64) -> Result<Option<Game>> {
        let game = sqlx::query_as::<_, Game>("SELECT * FROM game WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(game)
    }

    /// Inserts a new game row, returning its assigned id.
    pub async fn insert(pool: &SqlitePool, new: &NewGame) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO game (gamepicture, gamename, description, developer, publisher, releasedate)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&new.gamepicture)
        .bind(&new.gamename)
        .bind(&new.description)
        .bind(&new.developer)
        .bind(&new.publisher)
        .bind(&new.releasedate)
        .execute(pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Applies a partial update to the game with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no game has that id; nothing is
    /// written in that case.
    pub async fn update(pool: &SqlitePool, id: i64, update: &GameUpdate) -> Result<()> {
        let Some(game) = Game::by_id(pool, id).await? else {
            return Err(Error::NotFound(format!("No game found with ID {id}")));
        };

        sqlx::query(
            "UPDATE game
             SET gamepicture = ?, gamename = ?, description = ?,
                 developer = ?, publisher = ?, releasedate = ?
             WHERE id = ?",
        )
        .bind(update.gamepicture.as_ref().unwrap_or(&game.gamepicture))
        .bind(update.gamename.as_ref().unwrap_or(&game.gamename))
        .bind(update.description.as_ref().unwrap_or(&game.description))
        .bind(update.developer.as_ref().unwrap_or(&game.developer))
        .bind(update.publisher.as_ref().unwrap_or(&game.publisher))
        .bind(update.releasedate.as_ref().unwrap_or(&game.releasedate))
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Deletes the game with the given id and renumbers every surviving
    /// game with a higher id down by one, keeping ids contiguous from 1.
    ///
    /// The delete and the shift run in a single transaction. Comments of
    /// the deleted game cascade away with it; comments of shifted games
    /// follow their new ids through `ON UPDATE CASCADE`. The shift walks
    /// ids in ascending order so no two rows ever share an id
    /// mid-transaction.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no game has that id; nothing is
    /// written in that case.
    pub async fn delete_and_renumber(pool: &SqlitePool, id: i64) -> Result<()> {
        let mut tx = pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM game WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(Error::NotFound(format!("No game found with ID {id}")));
        }

        let higher: Vec<i64> = sqlx::query_scalar("SELECT id FROM game WHERE id > ? ORDER BY id")
            .bind(id)
            .fetch_all(&mut *tx)
            .await?;
        for old_id in higher {
            sqlx::query("UPDATE game SET id = ? WHERE id = ?")
                .bind(old_id - 1)
                .bind(old_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

impl Comment {
    /// Returns every comment in ascending id order, across all games.
    pub async fn all(pool: &SqlitePool) -> Result<Vec<Comment>> {
        let comments = sqlx::query_as::<_, Comment>("SELECT * FROM comments ORDER BY commentid")
            .fetch_all(pool)
            .await?;
        Ok(comments)
    }

    /// Returns the comments of one game in insertion order.
    pub async fn for_game(pool: &SqlitePool, game_id: i64) -> Result<Vec<Comment>> {
        let comments = sqlx::query_as::<_, Comment>(
            "SELECT * FROM comments WHERE game_id = ? ORDER BY commentid",
        )
        .bind(game_id)
        .fetch_all(pool)
        .await?;
        Ok(comments)
    }

    /// Inserts a comment for the given game, stamped with the current UTC
    /// time, returning its assigned id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the game does not exist.
    pub async fn insert(pool: &SqlitePool, game_id: i64, name: &str, body: &str) -> Result<i64> {
        if Game::by_id(pool, game_id).await?.is_none() {
            return Err(Error::NotFound(format!("No game found with ID {game_id}")));
        }

        let result = sqlx::query(
            "INSERT INTO comments (commentatorsname, comment, game_id, timestamp)
             VALUES (?, ?, ?, ?)",
        )
        .bind(name)
        .bind(body)
        .bind(game_id)
        .bind(Utc::now())
        .execute(pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Deletes a single comment by id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no comment has that id.
    pub async fn delete(pool: &SqlitePool, commentid: i64) -> Result<()> {
        let deleted = sqlx::query("DELETE FROM comments WHERE commentid = ?")
            .bind(commentid)
            .execute(pool)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(Error::NotFound(format!(
                "No comment found with ID {commentid}"
            )));
        }
        Ok(())
    }
}

/// Seeds the demo catalog into an empty database.
///
/// Does nothing if any game already exists, so it is safe to run on every
/// startup.
///
/// # Errors
///
/// Returns an error if a write fails.
pub async fn seed_demo(pool: &SqlitePool) -> Result<()> {
    let existing = Game::all_summaries(pool).await?;
    if !existing.is_empty() {
        return Ok(());
    }

    for (gamename, description, developer, publisher, releasedate) in [
        (
            "Starfall Odyssey",
            "An open-world space adventure across a procedurally woven galaxy.",
            "Nova Forge",
            "Stellar Works",
            "2019-03-12",
        ),
        (
            "Iron Bastion",
            "Tower defense meets city building under permanent siege.",
            "Bastion Labs",
            "Stellar Works",
            "2017-08-01",
        ),
        (
            "Whispering Pines",
            "A narrative mystery set in a fog-bound logging town.",
            "Quiet Hill Studio",
            "Lantern Publishing",
            "2021-10-29",
        ),
        (
            "Circuit Breakers",
            "Fast-paced arcade racing on tracks that rebuild themselves mid-lap.",
            "Overdrive Interactive",
            "Overdrive Interactive",
            "2018-05-17",
        ),
        (
            "Tidebound",
            "Sail, dive and trade across a drowned archipelago.",
            "Saltwind Games",
            "Lantern Publishing",
            "2020-02-20",
        ),
        (
            "Emberfall Chronicles",
            "A party-based RPG about the last city lit by a dying sun.",
            "Cinder Court",
            "Stellar Works",
            "2016-11-11",
        ),
        (
            "Hexhollow",
            "Roguelike dungeon crawling on a shifting hexagonal board.",
            "Gridline Collective",
            "Gridline Collective",
            "2022-07-07",
        ),
        (
            "Skylark Express",
            "Run an airborne courier service between floating villages.",
            "Featherworks",
            "Lantern Publishing",
            "2023-04-18",
        ),
    ] {
        Game::insert(
            pool,
            &NewGame {
                gamepicture: "default.jpg".to_owned(),
                gamename: gamename.to_owned(),
                description: description.to_owned(),
                developer: developer.to_owned(),
                publisher: publisher.to_owned(),
                releasedate: releasedate.to_owned(),
            },
        )
        .await?;
    }

    tracing::info!("seeded demo catalog");
    Ok(())
}
