//! Spell example: Pricing a telepathic message
//!
//! This example demonstrates:
//! - Building the standard sheet
//! - Setting fields by delta, unit and text
//! - Reading the ledgers and a JSON report

use sfxcost::*;

fn main() -> Result<(), FieldError> {
    let mut model = CostModel::standard();
    model.build_all();

    println!("Setting up the spell:");
    let name = model.field("Name");
    model.apply_text(name, "Whisper on the wind")?;
    println!("  - Name: {}", model.value(name));

    let effect = model.field("Effect");
    model.apply_delta(effect, 4);
    println!("  - Effect: {}", model.cost(effect));

    let range = model.field("Range");
    model.apply_delta(range, 2);
    model.set_multiplier_index(range, 1);
    println!("  - Range: {} {}", model.value(range), model.unit(range));

    let duration = model.field("Duration");
    model.apply_text(duration, "10")?;
    model.set_multiplier_index(duration, 1);
    println!("  - Duration: {} {}", model.value(duration), model.unit(duration));

    let incantation = model.field("Incantation");
    model.apply_delta(incantation, 3);
    model.apply_text(incantation, "FV")?;
    println!("  - Incantation: {}", model.comment(incantation));

    let skill = model.field("Skill");
    model.set_multiplier_index(skill, 8);
    if let Some((attribute, roll, resist)) = model.skill_basis(skill) {
        println!("  - Skill: {} ({attribute}, {roll}, {resist})", model.unit(skill));
    }

    println!("\n=== Costs ===");
    for field in ["Mandatory", "Optional", "Modifiers", "Total", "Specific"] {
        let id = model.field(field);
        println!("{:<10} {:>4}", model.label(id), model.cost(id));
    }

    let total = model.field("Total");
    let (dn, fv) = model.ledgers(total);
    println!("\nDN {dn} / FV {fv}");
    if let Some((amount, unit)) = model.time_display(total) {
        println!("Focus lasts {amount} {unit}");
    }

    println!("\n=== Report ===");
    match serde_json::to_string_pretty(&model.report(total)) {
        Ok(json) => println!("{json}"),
        Err(e) => println!("report failed: {e}"),
    }

    model.validate()?;
    Ok(())
}
