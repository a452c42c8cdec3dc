use crate::domain::instance::Instance;
use crate::presentation::theme::Theme;
use std::fmt::Write;

/// Render instances one block per document
pub fn format_instances(instances: &[Instance], theme: &Theme) -> String {
    let mut output = String::new();

    for instance in instances {
        let id = instance.id().unwrap_or("?");
        writeln!(
            output,
            "{} {}",
            (theme.model)(instance.model_name()),
            (theme.id)(id)
        )
        .ok();

        for field in &instance.config().fields {
            // Fields excluded by --only/--without are not shown
            let Ok(value) = instance.read_attribute(&field.name) else {
                continue;
            };
            writeln!(
                output,
                "  {}: {}",
                (theme.field)(&field.name),
                (theme.value)(&value.to_string())
            )
            .ok();
        }

        for name in instance.dynamic_attribute_names() {
            let value = instance.attributes()[name].to_string();
            writeln!(
                output,
                "  {}: {}",
                (theme.dynamic)(name),
                (theme.value)(&value)
            )
            .ok();
        }
    }

    let cutoff = "⸺".repeat(40);
    writeln!(output, "{}", (theme.line)(&cutoff)).ok();
    writeln!(
        output,
        "{}",
        (theme.summary)(&format!("{} document(s)", instances.len()))
    )
    .ok();
    output
}
