use chrono::NaiveDateTime;
use sqlrt::{sql_enum, statement, ColumnSpec, DecodeError, FromRow, ParamSpec, Row, SqlType};

/// Migration directory, applied in file-name order
pub const SCHEMA: &str = "ondeck";

sql_enum! {
    /// Venues can be either open or closed
    pub enum Status {
        Open = "op!en",
        Closed = "clo@sed",
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct City {
    pub slug: String,
    pub name: String,
}

impl FromRow for City {
    fn from_row(row: &Row<'_>) -> Result<Self, DecodeError> {
        Ok(City {
            slug: row.get(0)?,
            name: row.get(1)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Venue {
    pub id: i64,
    pub status: Status,
    pub statuses: Option<String>,
    pub slug: String,
    pub name: String,
    pub city: String,
    pub spotify_playlist: String,
    pub songkick_id: Option<String>,
    pub tags: Option<String>,
    pub created_at: NaiveDateTime,
}

impl FromRow for Venue {
    fn from_row(row: &Row<'_>) -> Result<Self, DecodeError> {
        Ok(Venue {
            id: row.get(0)?,
            status: row.get(1)?,
            statuses: row.get_opt(2)?,
            slug: row.get(3)?,
            name: row.get(4)?,
            city: row.get(5)?,
            spotify_playlist: row.get(6)?,
            songkick_id: row.get_opt(7)?,
            tags: row.get_opt(8)?,
            created_at: row.get(9)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VenueCountByCityRow {
    pub city: String,
    pub count: i64,
}

impl FromRow for VenueCountByCityRow {
    fn from_row(row: &Row<'_>) -> Result<Self, DecodeError> {
        Ok(VenueCountByCityRow {
            city: row.get(0)?,
            count: row.get(1)?,
        })
    }
}

const CITY_COLUMNS: [ColumnSpec; 2] = [
    ColumnSpec::new("slug", SqlType::Text),
    ColumnSpec::new("name", SqlType::Text),
];

const VENUE_COLUMNS: [ColumnSpec; 10] = [
    ColumnSpec::new("id", SqlType::Integer),
    ColumnSpec::new("status", SqlType::Enum("Status")),
    ColumnSpec::nullable("statuses", SqlType::Text),
    ColumnSpec::new("slug", SqlType::Text),
    ColumnSpec::new("name", SqlType::Text),
    ColumnSpec::new("city", SqlType::Text),
    ColumnSpec::new("spotify_playlist", SqlType::Text),
    ColumnSpec::nullable("songkick_id", SqlType::Text),
    ColumnSpec::nullable("tags", SqlType::Text),
    ColumnSpec::new("created_at", SqlType::Timestamp),
];

/// Join enum wire values into the comma-separated storage form
pub fn join_statuses(statuses: &[Status]) -> String {
    use sqlrt::SqlEnum;
    statuses
        .iter()
        .map(|s| s.wire_value())
        .collect::<Vec<_>>()
        .join(",")
}

statement! {
    /// Create a new city. The slug must be unique.
    pub CREATE_CITY = {
        name: "CreateCity",
        cardinality: One,
        sql: "-- name: CreateCity :one
INSERT INTO city (
    name,
    slug
) VALUES (
    ?,
    ?
) RETURNING slug, name",
        params: [
            ParamSpec::new("name", SqlType::Text),
            ParamSpec::new("slug", SqlType::Text),
        ],
        columns: [CITY_COLUMNS[0], CITY_COLUMNS[1]],
    }
}

statement! {
    pub GET_CITY = {
        name: "GetCity",
        cardinality: One,
        sql: "SELECT slug, name FROM city WHERE slug = ?",
        params: [ParamSpec::new("slug", SqlType::Text)],
        columns: [CITY_COLUMNS[0], CITY_COLUMNS[1]],
    }
}

statement! {
    pub LIST_CITIES = {
        name: "ListCities",
        cardinality: Many,
        sql: "SELECT slug, name FROM city ORDER BY name",
        params: [],
        columns: [CITY_COLUMNS[0], CITY_COLUMNS[1]],
    }
}

statement! {
    pub UPDATE_CITY_NAME = {
        name: "UpdateCityName",
        cardinality: ExecNoResult,
        sql: "UPDATE city SET name = ? WHERE slug = ?",
        params: [
            ParamSpec::new("name", SqlType::Text),
            ParamSpec::new("slug", SqlType::Text),
        ],
        columns: [],
    }
}

statement! {
    pub CREATE_VENUE = {
        name: "CreateVenue",
        cardinality: ExecReturningKey,
        sql: "-- name: CreateVenue :execlastid
INSERT INTO venue (
    slug,
    name,
    city,
    created_at,
    spotify_playlist,
    status,
    statuses,
    tags
) VALUES (
    ?,
    ?,
    ?,
    CURRENT_TIMESTAMP,
    ?,
    ?,
    ?,
    ?
) RETURNING id",
        params: [
            ParamSpec::new("slug", SqlType::Text),
            ParamSpec::new("name", SqlType::Text),
            ParamSpec::new("city", SqlType::Text),
            ParamSpec::new("spotify_playlist", SqlType::Text),
            ParamSpec::new("status", SqlType::Enum("Status")),
            ParamSpec::nullable("statuses", SqlType::Text),
            ParamSpec::nullable("tags", SqlType::Text),
        ],
        columns: [ColumnSpec::new("id", SqlType::Integer)],
    }
}

statement! {
    pub GET_VENUE = {
        name: "GetVenue",
        cardinality: One,
        sql: "SELECT id, status, statuses, slug, name, city, spotify_playlist, songkick_id, tags, created_at
FROM venue
WHERE slug = ? AND city = ?",
        params: [
            ParamSpec::new("slug", SqlType::Text),
            ParamSpec::new("city", SqlType::Text),
        ],
        columns: [
            VENUE_COLUMNS[0], VENUE_COLUMNS[1], VENUE_COLUMNS[2], VENUE_COLUMNS[3],
            VENUE_COLUMNS[4], VENUE_COLUMNS[5], VENUE_COLUMNS[6], VENUE_COLUMNS[7],
            VENUE_COLUMNS[8], VENUE_COLUMNS[9],
        ],
    }
}

statement! {
    pub LIST_VENUES = {
        name: "ListVenues",
        cardinality: Many,
        sql: "SELECT id, status, statuses, slug, name, city, spotify_playlist, songkick_id, tags, created_at
FROM venue
WHERE city = ?
ORDER BY name",
        params: [ParamSpec::new("city", SqlType::Text)],
        columns: [
            VENUE_COLUMNS[0], VENUE_COLUMNS[1], VENUE_COLUMNS[2], VENUE_COLUMNS[3],
            VENUE_COLUMNS[4], VENUE_COLUMNS[5], VENUE_COLUMNS[6], VENUE_COLUMNS[7],
            VENUE_COLUMNS[8], VENUE_COLUMNS[9],
        ],
    }
}

statement! {
    pub UPDATE_VENUE_NAME = {
        name: "UpdateVenueName",
        cardinality: One,
        sql: "UPDATE venue
SET name = ?
WHERE slug = ?
RETURNING id",
        params: [
            ParamSpec::new("name", SqlType::Text),
            ParamSpec::new("slug", SqlType::Text),
        ],
        columns: [ColumnSpec::new("id", SqlType::Integer)],
    }
}

statement! {
    pub VENUE_COUNT_BY_CITY = {
        name: "VenueCountByCity",
        cardinality: Many,
        sql: "SELECT
    city,
    count(*)
FROM venue
GROUP BY 1
ORDER BY 1",
        params: [],
        columns: [
            ColumnSpec::new("city", SqlType::Text),
            ColumnSpec::new("count", SqlType::Integer),
        ],
    }
}

statement! {
    pub DELETE_VENUE = {
        name: "DeleteVenue",
        cardinality: ExecNoResult,
        sql: "DELETE FROM venue
WHERE slug = ? AND slug = ?",
        params: [
            ParamSpec::new("slug", SqlType::Text),
            ParamSpec::new("slug", SqlType::Text),
        ],
        columns: [],
    }
}
