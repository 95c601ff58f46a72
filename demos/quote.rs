//! Quote Example
//!
//! Resolves every line of an order fixture against its BOM templates and
//! prints the result.
//!
//! Use `-o` to pick an order fixture by name
//! Use `-f` to choose between `table`, `diagnostics` and `json` output
//! Use `--strict` to stop at the first formula error

use std::io::{self, Write};

use anyhow::Result;
use serde::Serialize;

use fenestra::{
    diagnostics::{write_diagnostics, write_table, write_totals},
    fixtures::Fixture,
    quotation::{QuotationTotals, aggregate, aggregate_priced, format_money},
    resolver::{BomResolver, ResolutionMode, ResolvedBom},
    utils::{OutputFormat, QuoteArgs, init_logging},
};

#[derive(Debug, Serialize)]
struct QuoteOutput<'q, 'a> {
    order: &'q str,
    boms: &'q [ResolvedBom],
    quotation: &'q QuotationTotals<'a>,
}

/// Quote Example
pub fn main() -> Result<()> {
    let args = QuoteArgs::load()?;

    init_logging(&args.log_level, args.log_format).map_err(|err| anyhow::anyhow!(err))?;

    let mut fixture = Fixture::with_base_path(&args.fixtures);
    fixture.load_order(&args.order)?;

    let mode = if args.strict {
        ResolutionMode::Strict
    } else {
        fixture.mode()
    };

    let boms = BomResolver::new(mode)
        .resolve_many(fixture.line_pairs()?)
        .into_iter()
        .collect::<Result<Vec<_>, _>>()?;

    tracing::info!(order = %args.order, lines = boms.len(), ?mode, "resolved order");

    let quotation = match fixture.prices() {
        Some(prices) if !args.no_prices => aggregate_priced(&boms, prices)?,
        _ => aggregate(&boms)?,
    };

    let mut out = io::stdout().lock();

    match args.format {
        OutputFormat::Json => {
            let output = QuoteOutput {
                order: &args.order,
                boms: &boms,
                quotation: &quotation,
            };

            serde_json::to_writer_pretty(&mut out, &output)?;
            writeln!(out)?;
        }
        OutputFormat::Diagnostics => {
            for bom in &boms {
                writeln!(
                    out,
                    "{} {} x {}",
                    bom.product_code,
                    bom.dimensions.width_mm(),
                    bom.dimensions.height_mm()
                )?;
                write_diagnostics(bom, &mut out)?;
                writeln!(out)?;
            }
        }
        OutputFormat::Table => {
            for bom in &boms {
                write_table(bom, &mut out)?;
                writeln!(out)?;
            }

            writeln!(out, "Quotation ({} lines)", quotation.bom_count)?;
            write_totals(&quotation.totals, &mut out)?;

            if let Some(pricing) = &quotation.pricing {
                for subtotal in &pricing.by_role {
                    writeln!(
                        out,
                        " {:<9} {}",
                        format!("{}:", subtotal.role),
                        format_money(&subtotal.subtotal)
                    )?;
                }

                writeln!(out, " Total:    {}", format_money(&pricing.total))?;

                if !pricing.unpriced.is_empty() {
                    let codes: Vec<&str> = pricing
                        .unpriced
                        .iter()
                        .map(|item| item.item_code.as_str())
                        .collect();

                    writeln!(out, " Unpriced: {}", codes.join(", "))?;
                }
            }
        }
    }

    Ok(())
}
