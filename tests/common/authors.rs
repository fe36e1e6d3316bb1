use sqlrt::{statement, ColumnSpec, DecodeError, FromRow, ParamSpec, Row, SqlType};

pub const SCHEMA: &str = "authors.sql";

#[derive(Debug, Clone, PartialEq)]
pub struct Author {
    pub id: i64,
    pub name: String,
    pub bio: Option<String>,
}

impl FromRow for Author {
    fn from_row(row: &Row<'_>) -> Result<Self, DecodeError> {
        Ok(Author {
            id: row.get(0)?,
            name: row.get(1)?,
            bio: row.get_opt(2)?,
        })
    }
}

statement! {
    pub GET_AUTHOR = {
        name: "GetAuthor",
        cardinality: One,
        sql: "-- name: GetAuthor :one\nSELECT id, name, bio FROM authors\nWHERE id = ? LIMIT 1",
        params: [ParamSpec::new("id", SqlType::Integer)],
        columns: [
            ColumnSpec::new("id", SqlType::Integer),
            ColumnSpec::new("name", SqlType::Text),
            ColumnSpec::nullable("bio", SqlType::Text),
        ],
    }
}

statement! {
    /// Deliberately non-unique lookup
    pub GET_AUTHOR_BY_NAME = {
        name: "GetAuthorByName",
        cardinality: One,
        sql: "SELECT id, name, bio FROM authors WHERE name = ?",
        params: [ParamSpec::new("name", SqlType::Text)],
        columns: [
            ColumnSpec::new("id", SqlType::Integer),
            ColumnSpec::new("name", SqlType::Text),
            ColumnSpec::nullable("bio", SqlType::Text),
        ],
    }
}

statement! {
    pub LIST_AUTHORS = {
        name: "ListAuthors",
        cardinality: Many,
        sql: "-- name: ListAuthors :many\nSELECT id, name, bio FROM authors\nORDER BY name",
        params: [],
        columns: [
            ColumnSpec::new("id", SqlType::Integer),
            ColumnSpec::new("name", SqlType::Text),
            ColumnSpec::nullable("bio", SqlType::Text),
        ],
    }
}

statement! {
    pub LIST_AUTHORS_BY_ID = {
        name: "ListAuthorsById",
        cardinality: Many,
        sql: "SELECT id, name, bio FROM authors ORDER BY id",
        params: [],
        columns: [
            ColumnSpec::new("id", SqlType::Integer),
            ColumnSpec::new("name", SqlType::Text),
            ColumnSpec::nullable("bio", SqlType::Text),
        ],
    }
}

statement! {
    pub CREATE_AUTHOR = {
        name: "CreateAuthor",
        cardinality: ExecReturningKey,
        sql: "-- name: CreateAuthor :execlastid\nINSERT INTO authors (\n  name, bio\n) VALUES (\n  ?, ?\n)",
        params: [
            ParamSpec::new("name", SqlType::Text),
            ParamSpec::nullable("bio", SqlType::Text),
        ],
        columns: [],
    }
}

statement! {
    pub CREATE_AUTHOR_RETURNING = {
        name: "CreateAuthorReturning",
        cardinality: One,
        sql: "INSERT INTO authors (name, bio) VALUES (?, ?) RETURNING id, name, bio",
        params: [
            ParamSpec::new("name", SqlType::Text),
            ParamSpec::nullable("bio", SqlType::Text),
        ],
        columns: [
            ColumnSpec::new("id", SqlType::Integer),
            ColumnSpec::new("name", SqlType::Text),
            ColumnSpec::nullable("bio", SqlType::Text),
        ],
    }
}

statement! {
    /// Inserts nothing when the id is taken
    pub CREATE_AUTHOR_WITH_ID = {
        name: "CreateAuthorWithId",
        cardinality: ExecReturningKey,
        sql: "INSERT OR IGNORE INTO authors (id, name) VALUES (?, ?)",
        params: [
            ParamSpec::new("id", SqlType::Integer),
            ParamSpec::new("name", SqlType::Text),
        ],
        columns: [],
    }
}

statement! {
    pub UPDATE_AUTHOR_BIO = {
        name: "UpdateAuthorBio",
        cardinality: ExecReturningCount,
        sql: "UPDATE authors SET bio = ? WHERE name = ?",
        params: [
            ParamSpec::nullable("bio", SqlType::Text),
            ParamSpec::new("name", SqlType::Text),
        ],
        columns: [],
    }
}

statement! {
    pub DELETE_AUTHOR = {
        name: "DeleteAuthor",
        cardinality: ExecNoResult,
        sql: "-- name: DeleteAuthor :exec\nDELETE FROM authors\nWHERE id = ?",
        params: [ParamSpec::new("id", SqlType::Integer)],
        columns: [],
    }
}
