//! Diagnostics
//!
//! Plain text test calculation output, and a terminal table of a resolved
//! BOM.

use std::io;

use rust_decimal::Decimal;
use tabled::{
    builder::Builder,
    settings::{
        Alignment, Color, Style,
        object::{Columns, Rows},
    },
};

use crate::{
    items::ItemRole,
    resolver::{ResolvedBom, ResolvedItem, Totals},
};

/// Write the test calculation lines for every item with a cutting length.
///
/// For each profile or gasket:
///
/// ```text
/// FR-01: 1160mm x 2 = 2320mm per window
/// Total for 10 windows: 23200mm
/// ```
///
/// and `FR-01: Error in formula` for any item that failed to resolve. Other
/// items produce no output.
///
/// # Errors
///
/// Returns any error from writing to `out`.
pub fn write_diagnostics(bom: &ResolvedBom, mut out: impl io::Write) -> io::Result<()> {
    for line in diagnostic_lines(bom) {
        writeln!(out, "{line}")?;
    }

    Ok(())
}

/// Diagnostic lines as a string, one per line.
pub fn diagnostics_text(bom: &ResolvedBom) -> String {
    diagnostic_lines(bom)
        .into_iter()
        .map(|line| line + "\n")
        .collect()
}

fn diagnostic_lines(bom: &ResolvedBom) -> Vec<String> {
    let windows = Decimal::from(bom.dimensions.quantity());
    let mut lines = Vec::new();

    for item in bom.items() {
        if !item.is_resolved() {
            lines.push(format!("{}: Error in formula", item.item_code));
            continue;
        }

        let Some(length) = item.per_unit_length_mm else {
            continue;
        };

        let pieces = Decimal::from(pieces_per_window(item));
        let per_window = length * pieces;

        lines.push(format!(
            "{}: {length}mm x {pieces} = {per_window}mm per window",
            item.item_code
        ));
        lines.push(format!(
            "Total for {windows} windows: {}mm",
            per_window * windows
        ));
    }

    lines
}

/// Gaskets are one continuous run per window.
fn pieces_per_window(item: &ResolvedItem) -> u32 {
    match item.role {
        ItemRole::Gasket => 1,
        _ => item.qty_per_unit,
    }
}

/// Render a resolved BOM as a table, followed by its totals.
///
/// # Errors
///
/// Returns any error from writing to `out`.
pub fn write_table(bom: &ResolvedBom, mut out: impl io::Write) -> io::Result<()> {
    let mut builder = Builder::default();

    builder.push_record([
        "Role",
        "Item",
        "Description",
        "Length (mm)",
        "Qty",
        "Total (mm)",
        "Weight (kg)",
        "Pane (mm)",
        "Area (m²)",
        "Note",
    ]);

    for group in &bom.groups {
        for item in &group.items {
            builder.push_record(item_row(item));
        }
    }

    let mut table = builder.build();

    table.with(Style::modern_rounded());
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(3..9), Alignment::right());

    writeln!(
        out,
        "{} {} ({}) {} x {}mm, {} windows",
        bom.product_code,
        bom.series,
        bom.category,
        bom.dimensions.width_mm(),
        bom.dimensions.height_mm(),
        bom.dimensions.quantity()
    )?;
    writeln!(out, "{table}")?;

    write_totals(&bom.totals, out)
}

/// Write a one-block summary of totals.
///
/// # Errors
///
/// Returns any error from writing to `out`.
pub fn write_totals(totals: &Totals, mut out: impl io::Write) -> io::Result<()> {
    writeln!(out, " Pieces:  {}", totals.piece_count)?;
    writeln!(out, " Length:  {}mm", totals.length_mm)?;
    writeln!(out, " Weight:  {}kg", totals.weight_kg)?;
    writeln!(out, " Glass:   {}m²", totals.area_m2)?;

    if totals.failed_items > 0 {
        writeln!(out, " Failed:  {} of {} items", totals.failed_items, totals.item_count)?;
    }

    Ok(())
}

fn item_row(item: &ResolvedItem) -> [String; 10] {
    let cell = |value: Option<Decimal>| value.map(|value| value.to_string()).unwrap_or_default();

    let pane = item
        .pane_width_mm
        .zip(item.pane_height_mm)
        .map(|(width, height)| format!("{width} x {height}"))
        .unwrap_or_default();

    let note = match (&item.error, item.warning) {
        (Some(error), _) => error.to_string(),
        (None, Some(_)) => "non-positive size".to_string(),
        (None, None) => String::new(),
    };

    [
        item.role.to_string(),
        item.item_code.clone(),
        item.description.clone(),
        cell(item.per_unit_length_mm),
        item.total_quantity.map(|qty| qty.to_string()).unwrap_or_default(),
        cell(item.total_length_mm),
        cell(item.weight_kg),
        pane,
        cell(item.total_area_m2),
        note,
    ]
}
