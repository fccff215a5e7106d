use validator::ValidationErrors;

/// Joins every field error message into one `; `-separated string.
pub fn format_validation_errors(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .values()
        .flat_map(|errs| {
            errs.iter()
                .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
        })
        .collect();

    // Nested structs (e.g. `location`) report their own field errors.
    for kind in errors.errors().values() {
        if let validator::ValidationErrorsKind::Struct(inner) = kind {
            messages.push(format_validation_errors(inner));
        }
    }

    messages.sort();
    messages.join("; ")
}
