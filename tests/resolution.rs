//! Integration tests for BOM resolution.
//!
//! Covers the documented behaviour of the resolver end to end: cutting
//! lengths, gasket defaults, weights, rejection of malformed order lines,
//! and isolation of failing formulas.

use std::num::NonZeroU32;

use fenestra::prelude::*;
use rust_decimal::Decimal;
use testresult::TestResult;

fn template(first_formula: &str) -> Result<ProductBomTemplate, TemplateError> {
    ProductBomTemplate::new(
        "CW-100",
        "Classic",
        "Casement",
        vec![
            BomItemDefinition::new("SA-01", "Sash head", ItemRole::Profile, "mm")
                .with_formula(first_formula)
                .with_weight_per_meter(Decimal::new(95, 2)),
            BomItemDefinition::new("FR-01", "Frame head", ItemRole::Profile, "mm")
                .with_formula("W - 40")
                .with_weight_per_meter(Decimal::new(12, 1)),
            BomItemDefinition::new("GK-01", "EPDM gasket", ItemRole::Gasket, "mm"),
            BomItemDefinition::new("HW-01", "Hinge", ItemRole::Hardware, "pcs")
                .with_qty_per_unit(NonZeroU32::MIN.saturating_add(2)),
            BomItemDefinition::new("GL-01", "Glass unit", ItemRole::Glass, "m2"),
        ],
    )
}

fn request() -> DimensionRequest {
    DimensionRequest::new(1200.0, 1500.0, 10)
}

#[test]
fn profile_gasket_and_weight_values() -> TestResult {
    let bom = resolve(&template("W / 2")?, &request(), ResolutionMode::Strict)?;

    let frame = bom.item("FR-01").ok_or("missing frame")?;
    let gasket = bom.item("GK-01").ok_or("missing gasket")?;

    assert_eq!(frame.per_unit_length_mm, Some(Decimal::from(1160)));
    assert_eq!(frame.weight_kg, Some(Decimal::new(1392, 2)));
    assert_eq!(gasket.per_unit_length_mm, Some(Decimal::from(5400)));
    assert_eq!(gasket.total_quantity, Some(10));

    Ok(())
}

#[test]
fn hardware_and_glass_have_no_cutting_length() -> TestResult {
    let bom = resolve(&template("W / 2")?, &request(), ResolutionMode::Strict)?;

    let hinge = bom.item("HW-01").ok_or("missing hinge")?;
    let glass = bom.item("GL-01").ok_or("missing glass")?;

    assert_eq!(hinge.per_unit_length_mm, None);
    assert_eq!(hinge.total_quantity, Some(30));
    assert_eq!(glass.per_unit_length_mm, None);
    assert_eq!(glass.area_m2, Some(Decimal::new(18, 1)));
    assert_eq!(glass.total_area_m2, Some(Decimal::from(18)));

    Ok(())
}

#[test]
fn malformed_order_lines_are_rejected() -> TestResult {
    let template = template("W / 2")?;
    let mut fractional = request();
    fractional.quantity = 2.5;

    let cases = [
        (
            DimensionRequest::new(0.0, 1500.0, 1),
            ValidationError::InvalidWidth(0.0),
        ),
        (
            DimensionRequest::new(1200.0, -5.0, 1),
            ValidationError::InvalidHeight(-5.0),
        ),
        (
            DimensionRequest::new(1200.0, 1500.0, 0),
            ValidationError::InvalidQuantity(0.0),
        ),
        (fractional, ValidationError::InvalidQuantity(2.5)),
    ];

    for (request, expected) in cases {
        for mode in [ResolutionMode::Strict, ResolutionMode::Lenient] {
            assert_eq!(
                resolve(&template, &request, mode),
                Err(ResolveError::Validation(expected.clone()))
            );
        }
    }

    Ok(())
}

#[test]
fn lenient_mode_flags_only_the_bad_formula() -> TestResult {
    let bom = resolve(&template("W -- 40")?, &request(), ResolutionMode::Lenient)?;

    let bad = bom.item("SA-01").ok_or("missing sash")?;
    let good = bom.item("FR-01").ok_or("missing frame")?;

    assert!(bad.error.is_some());
    assert_eq!(bad.per_unit_length_mm, None);
    assert_eq!(bad.weight_kg, None);
    assert!(good.is_resolved());
    assert_eq!(good.per_unit_length_mm, Some(Decimal::from(1160)));

    assert_eq!(bom.totals.failed_items, 1);
    assert_eq!(bom.totals.weight_kg, Decimal::new(1392, 2));

    assert_eq!(
        diagnostics_text(&bom).lines().next(),
        Some("SA-01: Error in formula")
    );

    Ok(())
}

#[test]
fn strict_mode_returns_no_bom() -> TestResult {
    let result = resolve(&template("W -- 40")?, &request(), ResolutionMode::Strict);

    assert!(matches!(
        result,
        Err(ResolveError::Formula { ref item_code, .. }) if item_code == "SA-01"
    ));

    Ok(())
}

#[test]
fn identical_inputs_give_identical_output() -> TestResult {
    let template = template("(W - 40) / 2 - 40")?;

    let first = resolve(&template, &request(), ResolutionMode::Lenient)?;
    let second = resolve(&template, &request(), ResolutionMode::Lenient)?;

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first)?,
        serde_json::to_string(&second)?
    );

    Ok(())
}

#[test]
fn resolved_bom_serializes_roles_and_errors() -> TestResult {
    let bom = resolve(&template("W -- 40")?, &request(), ResolutionMode::Lenient)?;

    let json = serde_json::to_value(&bom)?;
    let groups = json
        .get("groups")
        .and_then(|groups| groups.as_array())
        .ok_or("groups missing")?;

    let roles: Vec<&str> = groups
        .iter()
        .filter_map(|group| group.get("role").and_then(|role| role.as_str()))
        .collect();

    assert_eq!(roles, vec!["profile", "hardware", "gasket", "glass"]);

    let error_kind = groups
        .first()
        .and_then(|group| group.get("items"))
        .and_then(|items| items.get(0))
        .and_then(|item| item.get("error"))
        .and_then(|error| error.get("kind"))
        .and_then(|kind| kind.get("kind"))
        .and_then(|kind| kind.as_str());

    assert_eq!(error_kind, Some("unexpected_token"));

    Ok(())
}

#[test]
fn shipped_templates_resolve_cleanly() -> TestResult {
    let fixture = Fixture::from_order("sample")?;
    let resolver = BomResolver::strict();

    let boms = resolver
        .resolve_many(fixture.line_pairs()?)
        .into_iter()
        .collect::<Result<Vec<_>, _>>()?;

    assert_eq!(boms.len(), 3);

    let casement = boms.first().ok_or("missing casement")?;

    assert_eq!(casement.totals.weight_kg, Decimal::new(13018, 2));
    assert_eq!(
        casement.item("GL-01").and_then(|item| item.total_area_m2),
        Some(Decimal::new(15151, 3))
    );

    let sliding = boms.get(1).ok_or("missing sliding")?;
    let sash = sliding.item("SA-10").ok_or("missing sash rail")?;

    assert_eq!(sash.per_unit_length_mm, Some(Decimal::from(840)));
    assert_eq!(sash.total_quantity, Some(8));
    assert_eq!(
        sliding.item("GL-10").and_then(|item| item.total_area_m2),
        Some(Decimal::new(43344, 4))
    );

    Ok(())
}

#[test]
fn shipped_templates_pass_validation() -> TestResult {
    let fixture = Fixture::from_order("sample")?;

    for (template, request) in fixture.line_pairs()? {
        let problems = validate_template(template, &request.validate()?);

        assert!(
            problems.is_empty(),
            "{} has problems: {problems:?}",
            template.product_code()
        );
    }

    Ok(())
}
