//! Query fragments shared by the movie and music catalogs.

use sea_orm::prelude::Expr;
use sea_orm::*;

use crate::error::AppError;

#[derive(Debug, FromQueryResult)]
struct GenreRow {
    genre: String,
}

/// `genre = ANY(table.genres)`, ignoring case.
pub fn genre_matches(table: &'static str, genre: &str) -> Expr {
    Expr::cust_with_values(
        format!(
            "LOWER($1) = ANY(SELECT LOWER(g) FROM unnest(\"{table}\".\"genres\") AS g)"
        ),
        [genre.to_string()],
    )
}

/// Distinct genre names used anywhere in `table`, sorted.
pub async fn distinct_genres<C: ConnectionTrait>(
    conn: &C,
    table: &'static str,
) -> Result<Vec<String>, AppError> {
    let stmt = Statement::from_string(
        conn.get_database_backend(),
        format!("SELECT DISTINCT unnest(genres) AS genre FROM \"{table}\" ORDER BY genre"),
    );
    let rows = GenreRow::find_by_statement(stmt).all(conn).await?;
    Ok(rows.into_iter().map(|r| r.genre).collect())
}

/// `SET column = column + 1`.
pub fn increment(column: &'static str) -> Expr {
    Expr::cust(format!("\"{column}\" + 1"))
}
