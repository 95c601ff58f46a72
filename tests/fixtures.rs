//! Integration tests for loading fixtures from a directory tree.

use std::{fs, path::Path};

use fenestra::prelude::*;
use tempfile::TempDir;
use testresult::TestResult;

const TEMPLATE: &str = "
product_code: AW-10
series: Awning
category: Top hung
items:
  - { item_code: FR-01, role: profile, formula: W - 20, qty_per_unit: 2, weight_per_meter: 1.1, unit: mm }
  - { item_code: GK-01, role: gasket, qty_per_unit: 1, unit: mm }
";

fn write(root: &Path, relative: &str, contents: &str) -> TestResult {
    let path = root.join(relative);

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(path, contents)?;

    Ok(())
}

#[test]
fn order_loads_referenced_templates() -> TestResult {
    let dir = TempDir::new()?;

    write(dir.path(), "templates/awning.yml", TEMPLATE)?;
    write(
        dir.path(),
        "orders/small.yml",
        "
mode: strict
lines:
  - { template: awning, width_mm: 800, height_mm: 600, quantity: 4 }
",
    )?;

    let mut fixture = Fixture::with_base_path(dir.path());
    fixture.load_order("small")?;

    assert_eq!(fixture.mode(), ResolutionMode::Strict);
    assert!(fixture.prices().is_none());

    let boms = BomResolver::new(fixture.mode()).resolve_many(fixture.line_pairs()?);
    let bom = boms
        .into_iter()
        .next()
        .ok_or("no line")??;

    assert_eq!(
        diagnostics_text(&bom),
        "FR-01: 780mm x 2 = 1560mm per window\n\
         Total for 4 windows: 6240mm\n\
         GK-01: 2800mm x 1 = 2800mm per window\n\
         Total for 4 windows: 11200mm\n"
    );

    Ok(())
}

#[test]
fn missing_template_file_is_an_io_error() -> TestResult {
    let dir = TempDir::new()?;

    write(
        dir.path(),
        "orders/broken.yml",
        "lines: [{ template: nowhere, width_mm: 800, height_mm: 600, quantity: 1 }]",
    )?;

    let result = Fixture::with_base_path(dir.path())
        .load_order("broken")
        .map(|_| ());

    assert!(matches!(result, Err(FixtureError::Io(_))));

    Ok(())
}

#[test]
fn invalid_template_is_a_template_error() -> TestResult {
    let dir = TempDir::new()?;

    write(
        dir.path(),
        "templates/bad.yml",
        "
product_code: BAD-1
items:
  - { item_code: FR-01, role: profile, formula: W -- 40, qty_per_unit: 1, unit: mm }
",
    )?;

    let result = Fixture::with_base_path(dir.path())
        .load_template("bad")
        .map(|_| ());

    assert!(matches!(
        result,
        Err(FixtureError::Template(TemplateError::InvalidItem(_)))
    ));

    Ok(())
}

#[test]
fn malformed_yaml_is_a_yaml_error() -> TestResult {
    let dir = TempDir::new()?;

    write(dir.path(), "templates/garbled.yml", "product_code: [unclosed")?;

    let result = Fixture::with_base_path(dir.path())
        .load_template("garbled")
        .map(|_| ());

    assert!(matches!(result, Err(FixtureError::Yaml(_))));

    Ok(())
}

#[test]
fn prices_use_order_currency() -> TestResult {
    let dir = TempDir::new()?;

    write(dir.path(), "templates/awning.yml", TEMPLATE)?;
    write(
        dir.path(),
        "orders/priced.yml",
        "
currency: EUR
lines:
  - { template: awning, width_mm: 800, height_mm: 600, quantity: 1 }
prices:
  FR-01: 3.00 GBP
",
    )?;

    let result = Fixture::with_base_path(dir.path())
        .load_order("priced")
        .map(|_| ());

    assert!(matches!(
        result,
        Err(FixtureError::CurrencyMismatch(expected, found)) if expected == "EUR" && found == "GBP"
    ));

    Ok(())
}
