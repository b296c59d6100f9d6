// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Example: hide and recover a message keyed by a reference text file.
//!
//! Set `RUST_LOG=book_stego=debug` to see the pipeline events.
use std::fs;
use std::process::ExitCode;

use book_stego::{capacity, decode, encode, BookCipher, CoverImage, EmbedParams};
use tracing_subscriber::EnvFilter;

fn usage() -> ExitCode {
    eprintln!("Usage: book_stego encode <cover> <book.txt> <message> <out.png>");
    eprintln!("       book_stego decode <stego> <book.txt>");
    eprintln!("       book_stego capacity <image>");
    eprintln!("       book_stego source <book.txt>");
    ExitCode::FAILURE
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let result = match args.get(1).map(String::as_str) {
        Some("encode") if args.len() == 6 => run_encode(&args[2], &args[3], &args[4], &args[5]),
        Some("decode") if args.len() == 4 => run_decode(&args[2], &args[3]),
        Some("capacity") if args.len() == 3 => run_capacity(&args[2]),
        Some("source") if args.len() == 3 => run_source(&args[2]),
        _ => return usage(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

type DemoResult = Result<(), Box<dyn std::error::Error>>;

fn run_encode(cover_path: &str, book_path: &str, message: &str, out_path: &str) -> DemoResult {
    let cover = fs::read(cover_path)?;
    let book = fs::read_to_string(book_path)?;
    let stego = encode(&cover, message, &book, &EmbedParams::default())?;
    fs::write(out_path, &stego)?;
    println!("Stego image written to: {out_path}");
    println!("Cover: {} bytes, Stego: {} bytes", cover.len(), stego.len());
    Ok(())
}

fn run_decode(stego_path: &str, book_path: &str) -> DemoResult {
    let stego = fs::read(stego_path)?;
    let book = fs::read_to_string(book_path)?;
    let decoded = decode(&stego, &book, &EmbedParams::default())?;
    println!("{}", serde_json::to_string_pretty(&decoded)?);
    Ok(())
}

fn run_capacity(image_path: &str) -> DemoResult {
    let img = CoverImage::from_bytes(&fs::read(image_path)?)?;
    println!("{}", serde_json::to_string_pretty(&capacity(img.width(), img.height()))?);
    Ok(())
}

fn run_source(book_path: &str) -> DemoResult {
    let book = BookCipher::new(&fs::read_to_string(book_path)?)?;
    println!("{}", serde_json::to_string_pretty(&book.stats())?);
    Ok(())
}
