//! End-to-end training and querying from CSV files on disk.

use std::fs;
use std::path::Path;

use shelfwise_core::{
    CleaningConfig, EngineConfig, ErrorKind, QueryResult, RecommendationService,
    POSTER_PLACEHOLDER,
};
use tempfile::TempDir;

const BOOKS_CSV: &[u8] = b"\"ISBN\",\"Book-Title\",\"Book-Author\",\"Year-Of-Publication\",\"Publisher\",\"Image-URL-S\",\"Image-URL-M\",\"Image-URL-L\"
\"0001\",\"The Hobbit\",\"J. R. R. Tolkien\",\"1937\",\"Allen & Unwin\",\"s\",\"m\",\"http://covers/hobbit.jpg\"
\"0002\",\"The Fellowship of the Ring\",\"J. R. R. Tolkien\",\"1954\",\"Allen & Unwin\",\"s\",\"m\",\"http://covers/fellowship.jpg\"
\"0003\",\"Les Mis\xe9rables\",\"Victor Hugo\",\"1862\",\"Lacroix\",\"s\",\"m\",\"\"
\"0004\",\"Dune\",\"Frank Herbert\",\"1965\",\"Chilton\",\"s\",\"m\",\"http://covers/dune.jpg\"
\"0005\",\"Broken row\",\"nobody\"
";

const RATINGS_CSV: &[u8] = b"\"User-ID\",\"ISBN\",\"Book-Rating\"
\"1\",\"0001\",\"9\"
\"1\",\"0002\",\"9\"
\"1\",\"0003\",\"2\"
\"2\",\"0001\",\"8\"
\"2\",\"0002\",\"7\"
\"2\",\"0004\",\"3\"
\"3\",\"0003\",\"9\"
\"3\",\"0004\",\"8\"
\"3\",\"0001\",\"1\"
\"4\",\"0002\",\"5\"
";

fn write_inputs(dir: &Path) -> EngineConfig {
    let ratings = dir.join("Ratings.csv");
    let books = dir.join("Books.csv");
    fs::write(&ratings, RATINGS_CSV).unwrap();
    fs::write(&books, BOOKS_CSV).unwrap();

    let mut config = EngineConfig::with_artifacts_dir(dir.join("artifacts"));
    config.ratings_csv = ratings;
    config.books_csv = books;
    config.cleaning = CleaningConfig {
        min_user_ratings: 2,
        min_book_ratings: 2,
    };
    config
}

#[test]
fn test_train_query_and_reopen() {
    let dir = TempDir::new().unwrap();
    let config = write_inputs(dir.path());

    let service = RecommendationService::open(config.clone()).unwrap();
    assert!(!service.is_ready());

    let report = service.retrain().unwrap();
    // user 4 has a single rating and is dropped
    assert_eq!(report.users, 3);
    assert_eq!(report.books, 4);

    let QueryResult::Found {
        recommended_books,
        poster_urls,
    } = service.recommend("The Hobbit").unwrap()
    else {
        panic!("expected neighbors for an exact title");
    };
    assert_eq!(recommended_books.len(), 3);
    assert_eq!(recommended_books[0], "The Fellowship of the Ring");
    assert!(!recommended_books.iter().any(|t| t == "The Hobbit"));
    assert_eq!(poster_urls[0], "http://covers/fellowship.jpg");

    // Latin-1 input decodes to the proper title and has no cover
    let QueryResult::Found { .. } = service.recommend("Les Misérables").unwrap() else {
        panic!("expected the decoded title to be known");
    };
    let QueryResult::Suggestions {
        suggestions,
        poster_urls,
    } = service.recommend("misérables").unwrap()
    else {
        panic!("expected a substring suggestion");
    };
    assert_eq!(suggestions, ["Les Misérables"]);
    assert_eq!(poster_urls, [POSTER_PLACEHOLDER]);

    let before = service.recommend("Dune").unwrap();
    drop(service);

    let reopened = RecommendationService::open(config).unwrap();
    assert!(reopened.is_ready());
    assert_eq!(reopened.recommend("Dune").unwrap(), before);
}

#[test]
fn test_clean_data_csv_is_written() {
    let dir = TempDir::new().unwrap();
    let config = write_inputs(dir.path());
    let service = RecommendationService::open(config).unwrap();
    let report = service.retrain().unwrap();

    let generation = service.store().generation_dir(&report.run_id.to_string());
    let clean = fs::read_to_string(generation.join("clean_data.csv")).unwrap();
    let header = clean.lines().next().unwrap();
    assert!(header.starts_with("user_id,isbn,rating,title"));
    // leading zeros of ISBNs survive
    assert!(clean.contains(",0001,"));
    assert_eq!(clean.lines().count(), report.records + 1);
}

#[test]
fn test_thresholds_that_drop_everything_are_data_errors() {
    let dir = TempDir::new().unwrap();
    let mut config = write_inputs(dir.path());
    config.cleaning = CleaningConfig::default();

    let service = RecommendationService::open(config).unwrap();
    let err = service.retrain().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Data);
    assert!(!service.is_ready());
}

#[test]
fn test_corrupt_generation_fails_open() {
    let dir = TempDir::new().unwrap();
    let config = write_inputs(dir.path());
    let service = RecommendationService::open(config.clone()).unwrap();
    let report = service.retrain().unwrap();

    let pivot = service
        .store()
        .generation_dir(&report.run_id.to_string())
        .join("book_pivot.cbor");
    fs::write(&pivot, b"garbage").unwrap();

    let err = match RecommendationService::open(config) {
        Ok(_) => panic!("corrupt generation must not load"),
        Err(e) => e,
    };
    assert_eq!(err.kind(), ErrorKind::Io);
}
