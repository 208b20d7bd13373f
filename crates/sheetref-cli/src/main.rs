//! sheetref CLI - inspect and transform spreadsheet references

use anyhow::{bail, Context, Result};
use clap::{ArgGroup, Parser, Subcommand};
use sheetref::prelude::*;
use sheetref::{classify, from_r1c1_formula, rebase, to_r1c1_formula};

#[derive(Parser)]
#[command(name = "sheetref")]
#[command(
    author,
    version,
    about = "Inspect, compare and shift spreadsheet addresses"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse an address and show its normalized form
    Parse {
        /// Address text (e.g. "'My Sheet'!$A$1:B10")
        address: String,

        /// Sheet used for unqualified ranges
        #[arg(short, long)]
        sheet: Option<String>,
    },

    /// Tell whether text is an address, a defined name or a formula
    Classify {
        /// Text to classify
        text: String,
    },

    /// Compare two addresses
    Collide {
        /// First address
        a: String,

        /// Second address
        b: String,

        /// Compare bounds only, ignoring sheet qualifiers
        #[arg(long)]
        ignore_sheet: bool,
    },

    /// Apply a row or column insertion or deletion to an address
    #[command(group(ArgGroup::new("edit").required(true).multiple(false)))]
    Shift {
        /// Address to shift
        address: String,

        /// Insert rows before this row
        #[arg(long, value_name = "ROW", group = "edit")]
        insert_rows: Option<u32>,

        /// Delete rows starting at this row
        #[arg(long, value_name = "ROW", group = "edit")]
        delete_rows: Option<u32>,

        /// Insert columns before this column (number or letters)
        #[arg(long, value_name = "COL", group = "edit")]
        insert_cols: Option<String>,

        /// Delete columns starting at this column (number or letters)
        #[arg(long, value_name = "COL", group = "edit")]
        delete_cols: Option<String>,

        /// Number of rows or columns
        #[arg(short = 'n', long, default_value = "1")]
        count: u32,

        /// Keep `$`-anchored bounds in place
        #[arg(long)]
        keep_fixed: bool,

        /// Grow the range when inserting right after it
        #[arg(long)]
        extend_at_end: bool,
    },

    /// Move a formula from one cell to another
    Rebase {
        /// Formula text (e.g. "=SUM(A1:A3)*$B$1")
        formula: String,

        /// Cell the formula is written for
        #[arg(long, value_name = "CELL")]
        from: String,

        /// Cell to move the formula to
        #[arg(long, value_name = "CELL")]
        to: String,
    },

    /// Translate a formula between A1 and R1C1 notation
    R1c1 {
        /// Formula text
        formula: String,

        /// Cell the formula belongs to
        #[arg(short, long, value_name = "CELL", default_value = "A1")]
        anchor: String,

        /// Input is R1C1, output A1
        #[arg(long)]
        reverse: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Parse { address, sheet } => show_address(&address, sheet.as_deref()),
        Commands::Classify { text } => {
            println!("{:?}", classify(&text));
            Ok(())
        }
        Commands::Collide { a, b, ignore_sheet } => show_collision(&a, &b, ignore_sheet),
        Commands::Shift {
            address,
            insert_rows,
            delete_rows,
            insert_cols,
            delete_cols,
            count,
            keep_fixed,
            extend_at_end,
        } => {
            let options = ShiftOptions {
                keep_fixed,
                extend_at_end,
            };
            let addr = parse_address(&address)?;
            let shifted = if let Some(row) = insert_rows {
                addr.insert_rows(row, count, &options)
            } else if let Some(row) = delete_rows {
                addr.delete_rows(row, count, &options)
            } else if let Some(col) = insert_cols {
                addr.insert_columns(parse_column(&col)?, count, &options)
            } else if let Some(col) = delete_cols {
                addr.delete_columns(parse_column(&col)?, count, &options)
            } else {
                bail!("no edit given");
            };

            match shifted {
                Some(shifted) => println!("{}", shifted),
                None => println!("(deleted)"),
            }
            Ok(())
        }
        Commands::Rebase { formula, from, to } => {
            let (from_row, from_col) = parse_cell(&from)?;
            let (to_row, to_col) = parse_cell(&to)?;
            println!("{}", rebase(&formula, from_row, from_col, to_row, to_col));
            Ok(())
        }
        Commands::R1c1 {
            formula,
            anchor,
            reverse,
        } => {
            let (row, col) = parse_cell(&anchor)?;
            if reverse {
                println!("{}", from_r1c1_formula(&formula, row, col));
            } else {
                println!("{}", to_r1c1_formula(&formula, row, col));
            }
            Ok(())
        }
    }
}

fn parse_address(text: &str) -> Result<Address> {
    Address::parse(text).with_context(|| format!("Failed to parse address '{}'", text))
}

fn parse_cell(text: &str) -> Result<(u32, u32)> {
    let addr = parse_address(text)?;
    if !addr.is_single_cell() || addr.is_multi() {
        bail!("'{}' is not a single cell", text);
    }
    Ok((addr.from_row(), addr.from_col()))
}

fn parse_column(text: &str) -> Result<u32> {
    if let Ok(col) = text.parse::<u32>() {
        return Ok(col);
    }
    sheetref::letters_to_column(text).with_context(|| format!("Invalid column '{}'", text))
}

fn show_address(text: &str, sheet: Option<&str>) -> Result<()> {
    let addr = Address::parse_in(text, sheet)
        .with_context(|| format!("Failed to parse address '{}'", text))?;

    println!("Text:      {}", addr);
    println!("Type:      {:?}", classify(text));
    for (i, part) in addr.components().enumerate() {
        println!();
        println!("Range {}:", i + 1);
        if let Some(workbook) = part.workbook() {
            println!("  Workbook: {}", workbook);
        }
        if let Some(sheet) = part.sheet() {
            println!("  Sheet:    {}", sheet);
        }
        if let Some(table) = part.table() {
            println!("  Table:    {}", table.to_text());
            continue;
        }
        if part.is_ref_error() {
            println!("  #REF!");
            continue;
        }
        println!(
            "  Rows:     {}..{}{}",
            part.from_row(),
            part.to_row(),
            fixed_marker(part.from_row_fixed(), part.to_row_fixed())
        );
        println!(
            "  Columns:  {}..{}{}",
            part.from_col(),
            part.to_col(),
            fixed_marker(part.from_col_fixed(), part.to_col_fixed())
        );
        println!("  Cells:    {}", part.cell_count());
    }
    Ok(())
}

fn fixed_marker(from: bool, to: bool) -> &'static str {
    match (from, to) {
        (true, true) => " (fixed)",
        (true, false) => " (start fixed)",
        (false, true) => " (end fixed)",
        (false, false) => "",
    }
}

fn show_collision(a: &str, b: &str, ignore_sheet: bool) -> Result<()> {
    let a = parse_address(a)?;
    let b = parse_address(b)?;

    let collision = if ignore_sheet {
        a.collide_ignoring_sheet(&b)
    } else {
        a.collide(&b)
    };
    println!("Collision:    {:?}", collision);

    match a.intersect(&b) {
        Some(both) => println!("Intersection: {}", both),
        None => println!("Intersection: (none)"),
    }
    match a.intersect_reversed(&b) {
        Some(rest) => println!("Remainder:    {}", rest),
        None => println!("Remainder:    (none)"),
    }
    Ok(())
}
