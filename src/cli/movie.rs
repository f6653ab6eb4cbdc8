//! `reelscan movie`

use colored::Colorize;
use log::warn;

use crate::cli::{CommandContext, GlobalOptions, MovieArgs, OutputFormat};
use crate::client::{ImageKind, MovieRecord};
use crate::error::Result;

/// Resolve a movie, print it and save any requested artwork
pub async fn run(opts: &GlobalOptions, args: MovieArgs) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let result = lookup(&ctx, &args).await;
    ctx.finish();
    result
}

async fn lookup(ctx: &CommandContext, args: &MovieArgs) -> Result<()> {
    let record = ctx
        .client
        .resolve_movie(
            args.id,
            args.title.as_deref().unwrap_or_default(),
            args.year.unwrap_or(0),
        )
        .await?;

    match ctx.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&record)?),
        OutputFormat::Pretty => print_record(&record),
    }

    let artwork = [
        (ImageKind::Poster, &args.poster, &record.poster_path),
        (ImageKind::Backdrop, &args.backdrop, &record.backdrop_path),
    ];
    for (kind, destination, fragment) in artwork {
        let Some(destination) = destination else {
            continue;
        };
        match fragment {
            Some(fragment) => {
                let bytes = ctx.client.download_image(fragment, destination, kind).await?;
                if ctx.format == OutputFormat::Pretty {
                    println!("Saved {:?} ({} bytes) to {}", kind, bytes, destination.display());
                }
            }
            None => warn!("'{}' has no {:?} image", record.title, kind),
        }
    }

    Ok(())
}

fn print_record(record: &MovieRecord) {
    let heading = if record.year > 0 {
        format!("{} ({})", record.title, record.year)
    } else {
        record.title.clone()
    };
    println!("{}", heading.bold());

    if let Some(tagline) = &record.tagline {
        println!("{}", tagline.italic());
    }
    println!("────────────────────────────────────────");

    if !record.director.is_empty() {
        println!("Director:  {}", record.director);
    }
    if !record.cast.is_empty() {
        println!("Cast:      {}", record.cast.join(", "));
    }
    if !record.genres.is_empty() {
        println!("Genres:    {}", record.genres.join(", "));
    }
    if record.runtime > 0 {
        println!("Runtime:   {} min", record.runtime);
    }
    println!("Rating:    {:.1}", record.rating);
    match &record.imdb_id {
        Some(imdb) => println!("IDs:       tmdb {} / imdb {}", record.tmdb_id, imdb),
        None => println!("IDs:       tmdb {}", record.tmdb_id),
    }

    if !record.synopsis.is_empty() {
        println!();
        println!("{}", record.synopsis);
    }
}
