//! Data cleaning stage.
//!
//! Turns the raw ratings and books tables into a [`CleanedRatingTable`]:
//!
//! 1. normalize column names to the internal schema
//! 2. keep users with more than `min_user_ratings` raw ratings
//! 3. inner-join ratings to books on ISBN
//! 4. keep titles with at least `min_book_ratings` joined ratings
//! 5. drop duplicate (user, title) pairs, keeping the first

use std::collections::{HashMap, HashSet};
use std::path::Path;

use tracing::{debug, info};

use crate::config::CleaningConfig;
use crate::data::{CleanedRatingTable, RatingRecord, RawTable};
use crate::error::{RecommenderError, Result};

pub const USER_ID: &str = "user_id";
pub const ISBN: &str = "isbn";
pub const RATING: &str = "rating";
pub const TITLE: &str = "title";
pub const AUTHOR: &str = "author";
pub const YEAR: &str = "year";
pub const PUBLISHER: &str = "publisher";
pub const IMAGE_URL: &str = "image_url";

const RATING_COLUMNS: [&str; 3] = [USER_ID, ISBN, RATING];
const BOOK_COLUMNS: [&str; 6] = [ISBN, TITLE, AUTHOR, YEAR, PUBLISHER, IMAGE_URL];

/// Map a raw dataset header to its internal column name.
pub fn normalize_column(name: &str) -> Option<&'static str> {
    match name.trim() {
        "User-ID" | "user_id" => Some(USER_ID),
        "ISBN" | "isbn" => Some(ISBN),
        "Book-Rating" | "rating" => Some(RATING),
        "Book-Title" | "title" => Some(TITLE),
        "Book-Author" | "author" => Some(AUTHOR),
        "Year-Of-Publication" | "year" => Some(YEAR),
        "Publisher" | "publisher" => Some(PUBLISHER),
        "Image-URL-L" | "image_url" => Some(IMAGE_URL),
        _ => None,
    }
}

/// Resolve the positions of `required` columns, failing with every missing name.
fn column_positions<const N: usize>(
    table: &RawTable,
    required: [&'static str; N],
    table_name: &str,
) -> Result<[usize; N]> {
    let mut positions = [0usize; N];
    let mut missing = Vec::new();

    for (slot, column) in positions.iter_mut().zip(required) {
        match table
            .headers()
            .iter()
            .position(|h| normalize_column(h) == Some(column))
        {
            Some(pos) => *slot = pos,
            None => missing.push(column),
        }
    }

    if missing.is_empty() {
        Ok(positions)
    } else {
        Err(RecommenderError::DataError(format!(
            "{} table is missing required column(s): {}",
            table_name,
            missing.join(", ")
        )))
    }
}

struct Rating {
    user_id: u64,
    isbn: String,
    rating: f32,
}

struct Book<'a> {
    title: &'a str,
    author: &'a str,
    year: &'a str,
    publisher: &'a str,
    image_url: &'a str,
}

/// Clean raw ratings and books into the rating table used for training.
pub fn clean(
    ratings: &RawTable,
    books: &RawTable,
    config: &CleaningConfig,
) -> Result<CleanedRatingTable> {
    let [user_col, isbn_col, rating_col] = column_positions(ratings, RATING_COLUMNS, "Ratings")?;
    let [b_isbn, b_title, b_author, b_year, b_publisher, b_image] =
        column_positions(books, BOOK_COLUMNS, "Books")?;

    info!(
        ratings = ratings.len(),
        books = books.len(),
        "Shape of raw input data"
    );

    let mut unparsable = 0usize;
    let parsed: Vec<Rating> = ratings
        .rows()
        .iter()
        .filter_map(|row| {
            let user_id = row[user_col].trim().parse::<u64>().ok();
            let rating = row[rating_col].trim().parse::<f32>().ok().filter(|r| r.is_finite());
            match (user_id, rating) {
                (Some(user_id), Some(rating)) => Some(Rating {
                    user_id,
                    isbn: row[isbn_col].clone(),
                    rating,
                }),
                _ => {
                    unparsable += 1;
                    None
                }
            }
        })
        .collect();
    if unparsable > 0 {
        debug!(unparsable, "Dropped ratings with unparsable user id or rating");
    }

    // Users who rated more than the threshold
    let mut activity: HashMap<u64, usize> = HashMap::new();
    for r in &parsed {
        *activity.entry(r.user_id).or_default() += 1;
    }
    let active: HashSet<u64> = activity
        .into_iter()
        .filter(|&(_, count)| count > config.min_user_ratings)
        .map(|(user, _)| user)
        .collect();
    debug!(active_users = active.len(), "Filtered users by activity");

    // ISBN -> matching books in file order; untitled books never join
    let mut catalog: HashMap<&str, Vec<Book<'_>>> = HashMap::new();
    for row in books.rows() {
        if row[b_title].is_empty() {
            continue;
        }
        catalog.entry(row[b_isbn].as_str()).or_default().push(Book {
            title: &row[b_title],
            author: &row[b_author],
            year: &row[b_year],
            publisher: &row[b_publisher],
            image_url: &row[b_image],
        });
    }

    let mut joined: Vec<RatingRecord> = Vec::new();
    for r in parsed.iter().filter(|r| active.contains(&r.user_id)) {
        let Some(matches) = catalog.get(r.isbn.as_str()) else {
            continue;
        };
        for book in matches {
            joined.push(RatingRecord {
                user_id: r.user_id,
                isbn: r.isbn.clone(),
                rating: r.rating,
                title: book.title.to_string(),
                author: book.author.to_string(),
                year: book.year.to_string(),
                publisher: book.publisher.to_string(),
                image_url: book.image_url.to_string(),
                num_of_rating: 0,
            });
        }
    }
    debug!(rows = joined.len(), "Joined ratings with books");

    let mut title_counts: HashMap<String, usize> = HashMap::new();
    for record in &joined {
        *title_counts.entry(record.title.clone()).or_default() += 1;
    }

    let mut seen: HashSet<(u64, String)> = HashSet::new();
    let records: Vec<RatingRecord> = joined
        .into_iter()
        .filter_map(|mut record| {
            let count = title_counts.get(&record.title).copied().unwrap_or(0);
            if count < config.min_book_ratings {
                return None;
            }
            if !seen.insert((record.user_id, record.title.clone())) {
                return None;
            }
            record.num_of_rating = count;
            Some(record)
        })
        .collect();

    if records.is_empty() {
        return Err(RecommenderError::DataError(format!(
            "No ratings left after filtering (users > {} ratings, titles >= {} ratings)",
            config.min_user_ratings, config.min_book_ratings
        )));
    }

    let table = CleanedRatingTable::new(records);
    info!(rows = table.len(), "Shape of the final clean dataset");
    Ok(table)
}

/// Read both CSV files and clean them.
pub fn clean_files(
    ratings_csv: &Path,
    books_csv: &Path,
    delimiter: u8,
    config: &CleaningConfig,
) -> Result<CleanedRatingTable> {
    let ratings = RawTable::from_csv_path(ratings_csv, delimiter)?;
    let books = RawTable::from_csv_path(books_csv, delimiter)?;
    clean(&ratings, &books, config)
}
