use anyhow::{bail, Result};
use serde::Serialize;
use std::env;
use std::path::Path;
use std::process;

use bookshelf::{Catalog, CatalogError};

const USAGE: &str = "usage: bookshelf [--seed <path>] <list | isbn <id> | author <name> | title <name> | reviews <id>>";

fn main() -> Result<()> {
    let mut args: Vec<String> = env::args().skip(1).collect();

    let catalog = match args.iter().position(|a| a == "--seed") {
        Some(i) => {
            if i + 1 >= args.len() {
                bail!("--seed needs a path\n{}", USAGE);
            }
            let path = args.remove(i + 1);
            args.remove(i);
            Catalog::from_file(Path::new(&path))?
        }
        None => Catalog::seeded()?,
    };

    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        [] | ["list"] => print_json(&catalog.get_all()),
        ["isbn", isbn] => match catalog.get_by_id(isbn) {
            Ok(book) => print_json(&book),
            Err(e) => not_found(e),
        },
        ["author", name] => print_matches(catalog.find_by_author(name), "author"),
        ["title", name] => print_matches(catalog.find_by_title(name), "title"),
        ["reviews", isbn] => match catalog.get_reviews(isbn) {
            Ok(reviews) if reviews.is_empty() => {
                println!("No reviews available for this book.");
                Ok(())
            }
            Ok(reviews) => print_json(&reviews),
            Err(e) => not_found(e),
        },
        _ => bail!(USAGE),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_matches<T: Serialize>(books: Vec<T>, field: &str) -> Result<()> {
    if books.is_empty() {
        eprintln!("No books found for the given {}", field);
        process::exit(1);
    }
    print_json(&books)
}

fn not_found(e: CatalogError) -> Result<()> {
    eprintln!("{}", e);
    process::exit(1);
}
