//! List caption templates.

use addtextgif_editor_model::template::TemplateCatalog;

pub fn run(json: bool) -> anyhow::Result<()> {
    let catalog = TemplateCatalog::builtin();

    if json {
        let templates: Vec<_> = catalog.iter().collect();
        println!("{}", serde_json::to_string_pretty(&templates)?);
        return Ok(());
    }

    println!("Templates:");
    for template in catalog.iter() {
        let marker = if template.id == catalog.default_template().id {
            " (default)"
        } else {
            ""
        };
        println!("  {}{marker}", template.id);
        println!("    {}: {}", template.name, template.description);
        println!(
            "    {}px weight {} on {}, text {}",
            template.font_size,
            template.font_weight(),
            template.background_color,
            template.color
        );
        if let Some(shadow) = &template.shadow {
            println!("    shadow {shadow}");
        }
    }

    Ok(())
}
