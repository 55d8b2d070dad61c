use anyhow::{anyhow, Result};
use clap::Args;
use school_reviews::output::format_reviews;
use school_reviews::{validate, OutputFormat, ReviewCandidate, ReviewDatabase, ReviewsConfig};
use serde_json::json;

use super::print_json;

/// Arguments for the Add command
#[derive(Args)]
pub struct AddArgs {
    /// Name of the school being reviewed
    #[clap(long)]
    pub school: String,

    /// Name of the reviewer
    #[clap(long)]
    pub reviewer: String,

    /// Rating from 1 to 5
    #[clap(long)]
    pub rating: String,

    /// Review text
    #[clap(long)]
    pub comment: String,
}

pub fn run_init(config: &ReviewsConfig, output_format: OutputFormat) -> Result<()> {
    let db = ReviewDatabase::from_config(config);
    let report = db
        .ensure_schema()
        .map_err(|e| anyhow!("Database initialization failed: {}", e))?;

    if output_format.is_json() {
        print_json(
            &json!({
                "database": db.path().to_string_lossy(),
                "seeded": report.seeded,
                "reviews_count": report.review_count,
            }),
            output_format,
        )
    } else {
        println!("Database:  {}", db.path().display());
        if report.seeded {
            println!("Inserted sample reviews");
        }
        println!("Reviews:   {}", report.review_count);
        Ok(())
    }
}

pub fn run_list(config: &ReviewsConfig, output_format: OutputFormat) -> Result<()> {
    let db = ReviewDatabase::from_config(config);
    let reviews = db
        .reviews()
        .list_all()
        .map_err(|e| anyhow!("Error loading reviews: {}", e))?;

    println!("{}", format_reviews(&reviews, output_format)?);
    Ok(())
}

pub fn run_add(config: &ReviewsConfig, args: AddArgs, output_format: OutputFormat) -> Result<()> {
    let AddArgs {
        school,
        reviewer,
        rating,
        comment,
    } = args;

    let review = match validate(&ReviewCandidate::new(school, reviewer, rating, comment)) {
        Ok(review) => review,
        Err(e) => return Err(anyhow!(e.messages().join("\n"))),
    };

    let db = ReviewDatabase::from_config(config);
    let id = db
        .reviews()
        .insert(&review)
        .map_err(|e| anyhow!("Error submitting review: {}", e))?;

    if output_format.is_json() {
        print_json(&json!({ "id": id }), output_format)
    } else {
        println!("Review {} submitted for {}", id, review.school_name());
        Ok(())
    }
}

pub fn run_count(config: &ReviewsConfig, output_format: OutputFormat) -> Result<()> {
    let db = ReviewDatabase::from_config(config);
    let count = db
        .reviews()
        .count()
        .map_err(|e| anyhow!("Error counting reviews: {}", e))?;

    if output_format.is_json() {
        print_json(&json!({ "reviews_count": count }), output_format)
    } else {
        println!("{}", count);
        Ok(())
    }
}
